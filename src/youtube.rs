use anyhow::{Context, Result, anyhow};
use image::DynamicImage;
use reqwest::Client;

use crate::constants::constants;

/// Prefix of a player element id; the rest is the video id.
const ELEMENT_PREFIX: &str = "iframe-";

/// Embed URL for a video, with the JS API enabled and related videos suppressed.
pub fn embed_src(video_id: &str, autoplay: bool) -> String {
  let base = &constants().embed_base;
  if autoplay {
    format!("{}{}?enablejsapi=1&autoplay=1&rel=0", base, video_id)
  } else {
    format!("{}{}?enablejsapi=1&rel=0", base, video_id)
  }
}

pub fn watch_url(video_id: &str) -> String {
  format!("{}{}", constants().watch_base, video_id)
}

pub fn playlist_url(playlist_id: &str) -> String {
  format!("https://www.youtube.com/playlist?list={}", playlist_id)
}

/// Id of the player element that embeds `video_id`.
pub fn element_id(video_id: &str) -> String {
  format!("{}{}", ELEMENT_PREFIX, video_id)
}

pub fn video_id_from_element(element_id: &str) -> Option<&str> {
  element_id.strip_prefix(ELEMENT_PREFIX).filter(|id| !id.is_empty())
}

/// Recover the video id from an embed or watch URL.
pub fn video_id_from_src(src: &str) -> Option<&str> {
  let c = constants();
  let rest = src.strip_prefix(c.embed_base.as_str()).or_else(|| src.strip_prefix(c.watch_base.as_str()))?;
  let id = rest.split(['?', '&', '#']).next().unwrap_or("");
  if id.is_empty() { None } else { Some(id) }
}

/// Fetch a card thumbnail. The record's own `thumb` is tried first, then the
/// standard YouTube stills from largest to smallest.
pub async fn fetch_thumbnail(client: &Client, video_id: &str, thumb: Option<&str>) -> Result<DynamicImage> {
  let thumbnail_urls = thumb.map(str::to_string).into_iter().chain([
    format!("https://img.youtube.com/vi/{}/maxresdefault.jpg", video_id),
    format!("https://img.youtube.com/vi/{}/sddefault.jpg", video_id),
    format!("https://img.youtube.com/vi/{}/hqdefault.jpg", video_id),
    format!("https://img.youtube.com/vi/{}/0.jpg", video_id),
  ]);

  for url in thumbnail_urls {
    if let Ok(response) = client.get(&url).send().await
      && response.status().is_success()
    {
      let image_bytes = response.bytes().await.with_context(|| format!("Failed to read image bytes from {}", url))?;
      let image = image::load_from_memory(&image_bytes)
        .with_context(|| format!("Failed to decode image from memory (URL: {})", url))?;
      return Ok(image);
    }
  }
  Err(anyhow!("Failed to fetch any thumbnail for video ID: {}", video_id))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn embed_src_flags() {
    assert_eq!(embed_src("abc", false), "https://www.youtube.com/embed/abc?enablejsapi=1&rel=0");
    assert_eq!(embed_src("abc", true), "https://www.youtube.com/embed/abc?enablejsapi=1&autoplay=1&rel=0");
  }

  #[test]
  fn element_ids_round_trip() {
    assert_eq!(element_id("abc"), "iframe-abc");
    assert_eq!(video_id_from_element("iframe-abc"), Some("abc"));
    assert_eq!(video_id_from_element("iframe-"), None);
    assert_eq!(video_id_from_element("grid"), None);
  }

  #[test]
  fn video_id_from_src_handles_embed_and_watch() {
    assert_eq!(video_id_from_src(&embed_src("abc", true)), Some("abc"));
    assert_eq!(video_id_from_src(&watch_url("xyz")), Some("xyz"));
    assert_eq!(video_id_from_src("https://example.com/abc"), None);
  }

  #[test]
  fn playlist_url_uses_list_param() {
    assert_eq!(playlist_url("PL1"), "https://www.youtube.com/playlist?list=PL1");
  }
}
