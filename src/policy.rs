//! Grid policies: which videos count as shorts, and where ads go.

use std::collections::HashSet;

use crate::constants::constants;
use crate::content::VideoItem;

// --- Short classification ---

/// Why a video is treated as a short. Variants are listed in precedence order;
/// classification stops at the first signal that applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortSignal {
  /// Requested through the shorts tab.
  Category,
  /// `shortFlag` set on the record.
  Flag,
  /// The id also appears in the document's shorts collection.
  KnownShortId,
  /// Title or description carries the short-form marker.
  Marker,
}

/// Classify a video, returning the first signal that marks it as a short.
pub fn classify_short(
  video: &VideoItem,
  in_shorts_tab: bool,
  short_ids: &HashSet<String>,
  marker: &str,
) -> Option<ShortSignal> {
  if in_shorts_tab {
    return Some(ShortSignal::Category);
  }
  if video.short_flag {
    return Some(ShortSignal::Flag);
  }
  if short_ids.contains(&video.video_id) {
    return Some(ShortSignal::KnownShortId);
  }
  if has_marker(video, marker) {
    return Some(ShortSignal::Marker);
  }
  None
}

/// [`classify_short`] with the marker from `constants.ron`.
pub fn is_short(video: &VideoItem, in_shorts_tab: bool, short_ids: &HashSet<String>) -> bool {
  classify_short(video, in_shorts_tab, short_ids, &constants().short_marker).is_some()
}

fn has_marker(video: &VideoItem, marker: &str) -> bool {
  if marker.is_empty() {
    return false;
  }
  let marker = marker.to_lowercase();
  [Some(video.title.as_str()), video.description.as_deref()]
    .into_iter()
    .flatten()
    .any(|text| text.to_lowercase().contains(&marker))
}

// --- Ad interleaving ---

/// Whether an ad block follows the content cell at 1-indexed `position`.
pub fn ad_after_every(position: usize, interval: usize) -> bool {
  interval > 0 && position > 0 && position % interval == 0
}

/// Content cells between ad blocks. Fixed; not a user preference.
pub const AD_INTERVAL: usize = 4;

/// [`ad_after_every`] at the fixed [`AD_INTERVAL`].
pub fn ad_after(position: usize) -> bool {
  ad_after_every(position, AD_INTERVAL)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn video(id: &str, title: &str) -> VideoItem {
    VideoItem {
      video_id: id.to_string(),
      title: title.to_string(),
      title_en: None,
      description: None,
      short_desc: None,
      thumb: None,
      published: None,
      short_flag: false,
    }
  }

  #[test]
  fn long_video_has_no_signal() {
    let ids = HashSet::new();
    assert_eq!(classify_short(&video("a", "Alif song"), false, &ids, "#shorts"), None);
  }

  #[test]
  fn category_wins_over_everything() {
    let mut v = video("a", "Alif #shorts");
    v.short_flag = true;
    let ids = HashSet::from(["a".to_string()]);
    assert_eq!(classify_short(&v, true, &ids, "#shorts"), Some(ShortSignal::Category));
  }

  #[test]
  fn flag_precedes_known_id() {
    let mut v = video("a", "Alif");
    v.short_flag = true;
    let ids = HashSet::from(["a".to_string()]);
    assert_eq!(classify_short(&v, false, &ids, "#shorts"), Some(ShortSignal::Flag));
  }

  #[test]
  fn known_id_precedes_marker() {
    let ids = HashSet::from(["a".to_string()]);
    assert_eq!(classify_short(&video("a", "Alif #Shorts"), false, &ids, "#shorts"), Some(ShortSignal::KnownShortId));
  }

  #[test]
  fn marker_is_case_insensitive_and_checks_description() {
    let ids = HashSet::new();
    assert_eq!(classify_short(&video("a", "Alif #SHORTS"), false, &ids, "#shorts"), Some(ShortSignal::Marker));

    let mut v = video("b", "Baa");
    v.description = Some("learn baa #shorts".to_string());
    assert_eq!(classify_short(&v, false, &ids, "#shorts"), Some(ShortSignal::Marker));
  }

  #[test]
  fn empty_marker_never_matches() {
    let ids = HashSet::new();
    assert_eq!(classify_short(&video("a", "anything"), false, &ids, ""), None);
  }

  #[test]
  fn ads_follow_every_fourth_cell() {
    let positions: Vec<usize> = (1..=12).filter(|p| ad_after_every(*p, 4)).collect();
    assert_eq!(positions, vec![4, 8, 12]);
    assert!(!ad_after_every(0, 4));
    assert!(!ad_after_every(4, 0));
  }

  #[test]
  fn ad_interval_is_four() {
    assert_eq!(AD_INTERVAL, 4);
    assert!(!ad_after(3));
    assert!(ad_after(4));
    assert!(ad_after(8));
  }
}
