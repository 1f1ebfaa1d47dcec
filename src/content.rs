//! The channel content document (`content.json`) and its loader.
//!
//! The document is fetched once per session. Raw JSON is decoded item by item
//! into permissive records and validated into the typed model below, so one
//! malformed entry never takes the whole catalog down with it.

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info, warn};

// --- Model ---

#[derive(Debug, Clone, PartialEq)]
pub struct VideoItem {
  pub video_id: String,
  pub title: String,
  pub title_en: Option<String>,
  pub description: Option<String>,
  pub short_desc: Option<String>,
  pub thumb: Option<String>,
  pub published: Option<DateTime<Utc>>,
  pub short_flag: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistItem {
  pub id: String,
  pub title: String,
  pub thumb: Option<String>,
  pub count: u32,
}

/// One alphabet lesson: display names, intro text, and the videos that belong to it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LetterRecord {
  pub ar: String,
  pub en: String,
  pub intro_ar: String,
  pub intro_en: String,
  pub forms: Vec<String>,
  pub videos: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Channel {
  pub subs: u64,
}

/// A displayable entry, tagged by how it should be rendered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Item<'a> {
  Video(&'a VideoItem),
  Short(&'a VideoItem),
  Playlist(&'a PlaylistItem),
}

impl<'a> Item<'a> {
  pub fn video_id(&self) -> Option<&'a str> {
    match *self {
      Item::Video(v) | Item::Short(v) => Some(v.video_id.as_str()),
      Item::Playlist(_) => None,
    }
  }

  pub fn title(&self) -> &'a str {
    match *self {
      Item::Video(v) | Item::Short(v) => v.title.as_str(),
      Item::Playlist(p) => p.title.as_str(),
    }
  }
}

#[derive(Debug, Clone, Default)]
pub struct ContentDocument {
  pub channel: Option<Channel>,
  pub videos: Vec<VideoItem>,
  pub shorts: Vec<VideoItem>,
  pub playlists: Vec<PlaylistItem>,
  pub letters: BTreeMap<String, LetterRecord>,
  /// Ids of every entry in `shorts`, precomputed for short classification.
  pub short_ids: HashSet<String>,
}

impl ContentDocument {
  pub fn from_json(text: &str) -> Result<Self> {
    let raw: RawDocument = serde_json::from_str(text).context("content.json is not a valid content document")?;

    let videos = validate_videos("videos", raw.videos.unwrap_or_default());
    let shorts = validate_videos("shorts", raw.shorts.unwrap_or_default());
    let playlists: Vec<PlaylistItem> =
      decode_all::<RawPlaylist>("playlists", raw.playlists.unwrap_or_default()).into_iter().map(Into::into).collect();
    let letters = decode_letters(raw.letters.unwrap_or_default());
    let channel = raw.channel.and_then(|c| c.subs).and_then(|subs| parse_count(&subs)).map(|subs| Channel { subs });
    let short_ids = shorts.iter().map(|s| s.video_id.clone()).collect();

    Ok(Self { channel, videos, shorts, playlists, letters, short_ids })
  }

  pub fn letter(&self, key: &str) -> Option<&LetterRecord> {
    self.letters.get(key)
  }

  pub fn is_empty(&self) -> bool {
    self.videos.is_empty() && self.shorts.is_empty() && self.playlists.is_empty()
  }
}

// --- Raw records ---

#[derive(Deserialize)]
struct RawDocument {
  channel: Option<RawChannel>,
  videos: Option<Vec<serde_json::Value>>,
  shorts: Option<Vec<serde_json::Value>>,
  playlists: Option<Vec<serde_json::Value>>,
  letters: Option<BTreeMap<String, serde_json::Value>>,
}

#[derive(Deserialize)]
struct RawChannel {
  subs: Option<serde_json::Value>,
}

// Optional fields go through `lenient`: a value of the wrong shape becomes
// `None` instead of rejecting the whole record.

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawVideo {
  #[serde(rename = "videoId", deserialize_with = "lenient_text")]
  video_id: Option<String>,
  #[serde(deserialize_with = "lenient_text")]
  title: Option<String>,
  #[serde(deserialize_with = "lenient_text")]
  title_en: Option<String>,
  #[serde(deserialize_with = "lenient_text")]
  description: Option<String>,
  #[serde(rename = "shortDesc", deserialize_with = "lenient_text")]
  short_desc: Option<String>,
  #[serde(deserialize_with = "lenient_text")]
  thumb: Option<String>,
  #[serde(deserialize_with = "lenient")]
  published: Option<Published>,
  #[serde(rename = "shortFlag", alias = "isShort", alias = "short", deserialize_with = "lenient_flag")]
  short_flag: Option<bool>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawPlaylist {
  #[serde(deserialize_with = "lenient_text")]
  id: Option<String>,
  #[serde(deserialize_with = "lenient_text")]
  title: Option<String>,
  #[serde(deserialize_with = "lenient_text")]
  thumb: Option<String>,
  #[serde(deserialize_with = "lenient_count")]
  count: Option<i64>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawLetter {
  #[serde(deserialize_with = "lenient_text")]
  ar: Option<String>,
  #[serde(deserialize_with = "lenient_text")]
  en: Option<String>,
  #[serde(deserialize_with = "lenient_text")]
  intro_ar: Option<String>,
  #[serde(deserialize_with = "lenient_text")]
  intro_en: Option<String>,
  #[serde(deserialize_with = "lenient")]
  forms: Option<Words>,
  #[serde(alias = "videoIds", deserialize_with = "lenient")]
  videos: Option<Words>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Published {
  Millis(i64),
  FractionalMillis(f64),
  Text(String),
}

/// A word list given either as an array or as one whitespace-separated string.
#[derive(Deserialize)]
#[serde(untagged)]
enum Words {
  One(String),
  Many(Vec<serde_json::Value>),
}

impl Words {
  fn into_vec(self) -> Vec<String> {
    match self {
      Words::One(s) => s.split_whitespace().map(str::to_string).collect(),
      Words::Many(values) => values.iter().filter_map(scalar_text).collect(),
    }
  }
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
  D: serde::Deserializer<'de>,
  T: DeserializeOwned,
{
  let value = serde_json::Value::deserialize(deserializer)?;
  Ok(serde_json::from_value(value).ok())
}

/// Strings as-is; numbers and booleans by their JSON text.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
  D: serde::Deserializer<'de>,
{
  let value = serde_json::Value::deserialize(deserializer)?;
  Ok(scalar_text(&value))
}

fn lenient_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
  D: serde::Deserializer<'de>,
{
  let value = serde_json::Value::deserialize(deserializer)?;
  Ok(match value {
    serde_json::Value::Bool(b) => Some(b),
    serde_json::Value::Number(n) => n.as_i64().map(|n| n != 0),
    serde_json::Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
      "true" | "1" | "yes" => Some(true),
      "false" | "0" | "no" => Some(false),
      _ => None,
    },
    _ => None,
  })
}

fn lenient_count<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
  D: serde::Deserializer<'de>,
{
  let value = serde_json::Value::deserialize(deserializer)?;
  Ok(parse_count(&value).map(|n| n.min(i64::MAX as u64) as i64).or_else(|| value.as_i64()))
}

fn scalar_text(value: &serde_json::Value) -> Option<String> {
  match value {
    serde_json::Value::String(s) => Some(s.clone()),
    serde_json::Value::Number(n) => Some(n.to_string()),
    serde_json::Value::Bool(b) => Some(b.to_string()),
    _ => None,
  }
}

impl From<RawPlaylist> for PlaylistItem {
  fn from(raw: RawPlaylist) -> Self {
    Self {
      id: raw.id.unwrap_or_default(),
      title: raw.title.unwrap_or_default(),
      thumb: non_empty(raw.thumb),
      count: raw.count.unwrap_or(0).clamp(0, u32::MAX as i64) as u32,
    }
  }
}

impl From<RawLetter> for LetterRecord {
  fn from(raw: RawLetter) -> Self {
    Self {
      ar: raw.ar.unwrap_or_default(),
      en: raw.en.unwrap_or_default(),
      intro_ar: raw.intro_ar.unwrap_or_default(),
      intro_en: raw.intro_en.unwrap_or_default(),
      forms: raw.forms.map(Words::into_vec).unwrap_or_default(),
      videos: raw.videos.map(Words::into_vec).unwrap_or_default(),
    }
  }
}

// --- Validation ---

/// Decode each entry on its own, dropping the ones that don't fit the record shape.
fn decode_all<T: DeserializeOwned>(collection: &str, values: Vec<serde_json::Value>) -> Vec<T> {
  values
    .into_iter()
    .enumerate()
    .filter_map(|(idx, value)| match serde_json::from_value::<T>(value) {
      Ok(item) => Some(item),
      Err(e) => {
        warn!(collection, idx, err = %e, "content: dropping malformed entry");
        None
      }
    })
    .collect()
}

/// Letters are keyed, so a bad record is dropped by key rather than by index.
fn decode_letters(values: BTreeMap<String, serde_json::Value>) -> BTreeMap<String, LetterRecord> {
  values
    .into_iter()
    .filter_map(|(key, value)| {
      if !value.is_object() {
        warn!(key = %key, "content: dropping malformed letter");
        return None;
      }
      match serde_json::from_value::<RawLetter>(value) {
        Ok(letter) => Some((key, letter.into())),
        Err(e) => {
          warn!(key = %key, err = %e, "content: dropping malformed letter");
          None
        }
      }
    })
    .collect()
}

fn validate_videos(collection: &str, values: Vec<serde_json::Value>) -> Vec<VideoItem> {
  let mut seen = HashSet::new();
  let mut out = Vec::with_capacity(values.len());
  for (idx, raw) in decode_all::<RawVideo>(collection, values).into_iter().enumerate() {
    let Some(video_id) = non_empty(raw.video_id) else {
      warn!(collection, idx, "content: dropping entry without videoId");
      continue;
    };
    if !seen.insert(video_id.clone()) {
      warn!(collection, video_id = %video_id, "content: dropping duplicate videoId");
      continue;
    }
    out.push(VideoItem {
      video_id,
      title: raw.title.unwrap_or_default(),
      title_en: non_empty(raw.title_en),
      description: non_empty(raw.description),
      short_desc: non_empty(raw.short_desc),
      thumb: non_empty(raw.thumb),
      published: raw.published.and_then(parse_published),
      short_flag: raw.short_flag.unwrap_or(false),
    });
  }
  out
}

fn non_empty(s: Option<String>) -> Option<String> {
  s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn parse_published(published: Published) -> Option<DateTime<Utc>> {
  match published {
    Published::Millis(ms) => DateTime::from_timestamp_millis(ms),
    Published::FractionalMillis(ms) if ms.is_finite() => DateTime::from_timestamp_millis(ms.trunc() as i64),
    Published::FractionalMillis(_) => None,
    Published::Text(text) => parse_timestamp(&text),
  }
}

/// Accepts RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS`, or a bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
  let text = text.trim();
  if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
    return Some(dt.with_timezone(&Utc));
  }
  if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S") {
    return Some(naive.and_utc());
  }
  NaiveDate::parse_from_str(text, "%Y-%m-%d").ok().and_then(|d| d.and_hms_opt(0, 0, 0)).map(|naive| naive.and_utc())
}

fn parse_count(value: &serde_json::Value) -> Option<u64> {
  value
    .as_u64()
    .or_else(|| value.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
    .or_else(|| value.as_str().and_then(|s| s.trim().replace(',', "").parse().ok()))
}

// --- Loading ---

/// Where the content document comes from: an HTTP(S) URL or a local file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSource {
  Url(String),
  File(PathBuf),
}

impl ContentSource {
  pub fn parse(input: &str) -> Self {
    let trimmed = input.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
      ContentSource::Url(trimmed.to_string())
    } else {
      ContentSource::File(PathBuf::from(trimmed))
    }
  }
}

impl fmt::Display for ContentSource {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ContentSource::Url(url) => f.write_str(url),
      ContentSource::File(path) => write!(f, "{}", path.display()),
    }
  }
}

/// Fetch and validate the content document. No retry: a failure is reported once.
pub async fn load_content(client: &Client, source: &ContentSource) -> Result<ContentDocument> {
  info!(source = %source, "content: loading");
  let text = match source {
    ContentSource::Url(url) => fetch_text(client, url).await?,
    ContentSource::File(path) => tokio::fs::read_to_string(path)
      .await
      .with_context(|| format!("Failed to read content file {}", path.display()))?,
  };
  let doc = ContentDocument::from_json(&text)?;
  debug!(
    videos = doc.videos.len(),
    shorts = doc.shorts.len(),
    playlists = doc.playlists.len(),
    letters = doc.letters.len(),
    "content: loaded"
  );
  Ok(doc)
}

async fn fetch_text(client: &Client, url: &str) -> Result<String> {
  let response = client
    .get(url)
    .header(reqwest::header::CACHE_CONTROL, "no-cache")
    .send()
    .await
    .with_context(|| format!("Failed to fetch {}", url))?;
  let status = response.status();
  if !status.is_success() {
    return Err(anyhow!("Failed to load content.json: HTTP {}", status));
  }
  response.text().await.with_context(|| format!("Failed to read response body from {}", url))
}
