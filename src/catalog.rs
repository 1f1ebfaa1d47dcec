//! Filter and paginate engine.
//!
//! Everything here is a pure function of (document, category, query, cursor):
//! calling it twice with the same arguments yields the same page.

use std::collections::HashSet;

use crate::content::{ContentDocument, Item, VideoItem};
use crate::policy;

// --- Category ---

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Category {
  #[default]
  Videos,
  Shorts,
  Playlists,
  /// A letter lesson page, keyed as in `content.json`'s `letters` map.
  Letter(String),
}

impl Category {
  pub const TABS: [Category; 3] = [Category::Videos, Category::Shorts, Category::Playlists];

  pub fn parse(key: &str) -> Self {
    match key.trim() {
      "videos" => Category::Videos,
      "shorts" => Category::Shorts,
      "playlists" => Category::Playlists,
      other => Category::Letter(other.to_string()),
    }
  }

  pub fn key(&self) -> &str {
    match self {
      Category::Videos => "videos",
      Category::Shorts => "shorts",
      Category::Playlists => "playlists",
      Category::Letter(key) => key,
    }
  }

  /// Next top-level tab, cycling. A letter page moves to the first tab.
  pub fn next_tab(&self) -> Category {
    match self {
      Category::Videos => Category::Shorts,
      Category::Shorts => Category::Playlists,
      Category::Playlists | Category::Letter(_) => Category::Videos,
    }
  }

  pub fn prev_tab(&self) -> Category {
    match self {
      Category::Videos | Category::Letter(_) => Category::Playlists,
      Category::Shorts => Category::Videos,
      Category::Playlists => Category::Shorts,
    }
  }
}

// --- Page ---

/// One render's worth of items plus the autoplay sequence behind it.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<'a> {
  /// At most `cursor` items, in collection order.
  pub items: Vec<Item<'a>>,
  /// Ids of every filtered video (not just the visible slice), in order.
  pub autoplay: Vec<String>,
  /// Size of the filtered set before truncation.
  pub total: usize,
  pub has_more: bool,
}

impl Page<'_> {
  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }
}

/// Trim and lower-case a raw query.
pub fn normalize_query(query: &str) -> String {
  query.trim().to_lowercase()
}

/// Whether `item` matches an already-normalized query. An empty query matches everything.
pub fn matches_query(item: &Item, needle: &str) -> bool {
  if needle.is_empty() {
    return true;
  }
  match *item {
    Item::Video(v) | Item::Short(v) => searchable_text(v).contains(needle) || v.video_id.contains(needle),
    Item::Playlist(p) => p.title.to_lowercase().contains(needle),
  }
}

fn searchable_text(video: &VideoItem) -> String {
  [video.title.as_str(), video.title_en.as_deref().unwrap_or(""), video.description.as_deref().unwrap_or("")]
    .join(" ")
    .to_lowercase()
}

/// The source collection for a category, with each video tagged long or short.
pub fn source<'a>(doc: &'a ContentDocument, category: &Category) -> Vec<Item<'a>> {
  let tag = |v: &'a VideoItem, in_shorts_tab: bool| {
    if policy::is_short(v, in_shorts_tab, &doc.short_ids) { Item::Short(v) } else { Item::Video(v) }
  };
  match category {
    Category::Videos => doc.videos.iter().map(|v| tag(v, false)).collect(),
    Category::Shorts => doc.shorts.iter().map(|v| tag(v, true)).collect(),
    Category::Playlists => doc.playlists.iter().map(Item::Playlist).collect(),
    Category::Letter(key) => {
      let Some(letter) = doc.letter(key) else { return Vec::new() };
      let members: HashSet<&str> = letter.videos.iter().map(String::as_str).collect();
      doc.videos.iter().filter(|v| members.contains(v.video_id.as_str())).map(|v| tag(v, false)).collect()
    }
  }
}

/// Filter a category by query, keeping collection order.
pub fn filter<'a>(doc: &'a ContentDocument, category: &Category, query: &str) -> Vec<Item<'a>> {
  let needle = normalize_query(query);
  source(doc, category).into_iter().filter(|item| matches_query(item, &needle)).collect()
}

/// Filter, then truncate to the first `cursor` items.
pub fn paginate<'a>(doc: &'a ContentDocument, category: &Category, query: &str, cursor: usize) -> Page<'a> {
  let filtered = filter(doc, category, query);
  let autoplay = filtered.iter().filter_map(|item| item.video_id()).map(str::to_string).collect();
  let total = filtered.len();
  let items = filtered.into_iter().take(cursor).collect();
  Page { items, autoplay, total, has_more: total > cursor }
}
