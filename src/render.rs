//! Turns a [`Page`] into an ordered grid of cells.
//!
//! The grid is frontend-neutral: `html` serializes it to markup and `ui`
//! draws it in the terminal.

use chrono::{DateTime, Utc};

use crate::catalog::Page;
use crate::content::{Item, LetterRecord, PlaylistItem, VideoItem};
use crate::locale::{self, Label, Lang};
use crate::policy;
use crate::youtube;

/// Embed orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aspect {
  /// 16:9
  Landscape,
  /// 9:16
  Portrait,
}

impl Aspect {
  pub fn css_class(self) -> &'static str {
    match self {
      Aspect::Landscape => "video-responsive-16-9",
      Aspect::Portrait => "video-responsive-9-16",
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VideoCard {
  pub video_id: String,
  pub element_id: String,
  /// Title in the display language.
  pub title: String,
  /// The record's own title, used for the card's data attribute.
  pub raw_title: String,
  pub thumb: String,
  pub time_label: Option<String>,
  pub aspect: Aspect,
  pub embed_src: String,
  pub watch_url: String,
  pub watch_label: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistCard {
  pub id: String,
  pub title: String,
  pub thumb: String,
  pub count_label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
  Video(VideoCard),
  Playlist(PlaylistCard),
  Ad,
  NoResults(&'static str),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Grid {
  pub cells: Vec<Cell>,
  pub load_more: bool,
}

impl Grid {
  pub fn content_count(&self) -> usize {
    self.cells.iter().filter(|c| matches!(c, Cell::Video(_) | Cell::Playlist(_))).count()
  }

  pub fn ad_count(&self) -> usize {
    self.cells.iter().filter(|c| matches!(c, Cell::Ad)).count()
  }

  /// Element ids of every rendered player, in grid order.
  pub fn player_elements(&self) -> Vec<String> {
    self
      .cells
      .iter()
      .filter_map(|c| match c {
        Cell::Video(card) => Some(card.element_id.clone()),
        _ => None,
      })
      .collect()
  }
}

/// Localized title: Arabic shows `title`, English prefers `title_en`.
/// A record with neither falls back to the channel caption.
pub fn display_title(video: &VideoItem, lang: Lang) -> String {
  let preferred = match lang {
    Lang::Ar => Some(video.title.as_str()),
    Lang::En => video.title_en.as_deref().or(Some(video.title.as_str())),
  };
  preferred
    .filter(|t| !t.trim().is_empty())
    .or(video.title_en.as_deref())
    .map(str::to_string)
    .unwrap_or_else(|| Label::DefaultTitle.text(lang).to_string())
}

pub fn video_card(video: &VideoItem, short: bool, lang: Lang, now: DateTime<Utc>) -> VideoCard {
  VideoCard {
    video_id: video.video_id.clone(),
    element_id: youtube::element_id(&video.video_id),
    title: display_title(video, lang),
    raw_title: video.title.clone(),
    thumb: video.thumb.clone().unwrap_or_default(),
    time_label: video.published.map(|p| locale::time_ago(p, now, lang)),
    aspect: if short { Aspect::Portrait } else { Aspect::Landscape },
    embed_src: youtube::embed_src(&video.video_id, false),
    watch_url: youtube::watch_url(&video.video_id),
    watch_label: Label::WatchOnYouTube.text(lang),
  }
}

pub fn playlist_card(playlist: &PlaylistItem, lang: Lang) -> PlaylistCard {
  PlaylistCard {
    id: playlist.id.clone(),
    title: playlist.title.clone(),
    thumb: playlist.thumb.clone().unwrap_or_default(),
    count_label: locale::item_count(playlist.count, lang),
  }
}

/// Render a page: one cell per item, an ad block after every `AD_INTERVAL`-th
/// content cell, or a single no-results cell when the page is empty.
pub fn render_grid(page: &Page, lang: Lang, now: DateTime<Utc>) -> Grid {
  if page.is_empty() {
    return Grid { cells: vec![Cell::NoResults(Label::NoResults.text(lang))], load_more: false };
  }

  let mut cells = Vec::with_capacity(page.items.len() + page.items.len() / 4);
  for (i, item) in page.items.iter().enumerate() {
    cells.push(match *item {
      Item::Video(v) => Cell::Video(video_card(v, false, lang, now)),
      Item::Short(v) => Cell::Video(video_card(v, true, lang, now)),
      Item::Playlist(p) => Cell::Playlist(playlist_card(p, lang)),
    });
    if policy::ad_after(i + 1) {
      cells.push(Cell::Ad);
    }
  }
  Grid { cells, load_more: page.has_more }
}

// --- Letter pages ---

#[derive(Debug, Clone, PartialEq)]
pub struct LetterHeader {
  pub name: String,
  pub intro: String,
  pub forms: Vec<String>,
}

pub fn letter_header(letter: &LetterRecord, lang: Lang) -> LetterHeader {
  let (name, intro) = match lang {
    Lang::Ar => (&letter.ar, &letter.intro_ar),
    Lang::En => (&letter.en, &letter.intro_en),
  };
  LetterHeader { name: name.clone(), intro: intro.clone(), forms: letter.forms.clone() }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog::{self, Category};
  use crate::content::ContentDocument;

  fn doc(n: usize) -> ContentDocument {
    let videos: Vec<String> = (1..=n)
      .map(|i| format!(r#"{{ "videoId": "v{i}", "title": "فيديو {i}", "title_en": "Video {i}" }}"#))
      .collect();
    ContentDocument::from_json(&format!(
      r#"{{ "videos": [{}], "shorts": [{{ "videoId": "s1", "title": "قصير" }}],
           "playlists": [{{ "id": "p1", "title": "Letters", "count": 28 }}] }}"#,
      videos.join(",")
    ))
    .unwrap()
  }

  fn kinds(grid: &Grid) -> String {
    grid
      .cells
      .iter()
      .map(|c| match c {
        Cell::Video(_) | Cell::Playlist(_) => 'C',
        Cell::Ad => 'A',
        Cell::NoResults(_) => 'N',
      })
      .collect()
  }

  #[test]
  fn five_items_get_one_ad_after_the_fourth() {
    let doc = doc(5);
    let page = catalog::paginate(&doc, &Category::Videos, "", 18);
    let grid = render_grid(&page, Lang::Ar, Utc::now());
    assert_eq!(kinds(&grid), "CCCCAC");
    assert!(!grid.load_more);
  }

  #[test]
  fn content_cells_are_min_of_items_and_cursor() {
    for (n, cursor) in [(0usize, 18usize), (3, 18), (8, 18), (30, 18), (30, 12), (9, 9)] {
      let doc = doc(n);
      let page = catalog::paginate(&doc, &Category::Videos, "", cursor);
      let grid = render_grid(&page, Lang::En, Utc::now());
      let shown = n.min(cursor);
      if shown == 0 {
        assert_eq!(kinds(&grid), "N");
        continue;
      }
      assert_eq!(grid.content_count(), shown);
      assert_eq!(grid.ad_count(), shown / 4);
      assert_eq!(grid.load_more, n > cursor);
    }
  }

  #[test]
  fn ads_never_reorder_content() {
    let doc = doc(10);
    let page = catalog::paginate(&doc, &Category::Videos, "", 18);
    let grid = render_grid(&page, Lang::En, Utc::now());
    let ids: Vec<String> = grid.player_elements();
    let expected: Vec<String> = (1..=10).map(|i| format!("iframe-v{i}")).collect();
    assert_eq!(ids, expected);
  }

  #[test]
  fn empty_page_renders_localized_no_results() {
    let doc = doc(3);
    let page = catalog::paginate(&doc, &Category::Videos, "zzz", 18);
    let grid = render_grid(&page, Lang::Ar, Utc::now());
    assert_eq!(grid.cells, vec![Cell::NoResults("لا توجد نتائج.")]);
    assert!(!grid.load_more);
  }

  #[test]
  fn title_follows_language() {
    let doc = doc(1);
    let v = &doc.videos[0];
    assert_eq!(display_title(v, Lang::Ar), "فيديو 1");
    assert_eq!(display_title(v, Lang::En), "Video 1");
    assert_eq!(display_title(&doc.shorts[0], Lang::En), "قصير");

    let mut untitled = v.clone();
    untitled.title.clear();
    untitled.title_en = None;
    assert_eq!(display_title(&untitled, Lang::Ar), "KJ Kids - فيديو");
  }

  #[test]
  fn shorts_render_portrait() {
    let doc = doc(1);
    let page = catalog::paginate(&doc, &Category::Shorts, "", 18);
    let grid = render_grid(&page, Lang::Ar, Utc::now());
    let Cell::Video(card) = &grid.cells[0] else { panic!("expected a video card") };
    assert_eq!(card.aspect, Aspect::Portrait);
    assert_eq!(card.aspect.css_class(), "video-responsive-9-16");
    assert_eq!(card.embed_src, "https://www.youtube.com/embed/s1?enablejsapi=1&rel=0");
  }

  #[test]
  fn missing_published_omits_time_label() {
    let doc = doc(1);
    let card = video_card(&doc.videos[0], false, Lang::En, Utc::now());
    assert_eq!(card.time_label, None);
    assert_eq!(card.thumb, "");
    assert_eq!(card.aspect, Aspect::Landscape);
  }

  #[test]
  fn playlists_render_simplified_cards() {
    let doc = doc(1);
    let page = catalog::paginate(&doc, &Category::Playlists, "", 18);
    let grid = render_grid(&page, Lang::En, Utc::now());
    let Cell::Playlist(card) = &grid.cells[0] else { panic!("expected a playlist card") };
    assert_eq!(card.count_label, "28 items");
    assert!(grid.player_elements().is_empty());
  }

  #[test]
  fn letter_header_picks_language() {
    let letter = LetterRecord {
      ar: "الباء".into(),
      en: "Baa".into(),
      intro_ar: "حرف الباء".into(),
      intro_en: "The letter Baa".into(),
      forms: vec!["ب".into()],
      videos: vec![],
    };
    assert_eq!(letter_header(&letter, Lang::En).name, "Baa");
    assert_eq!(letter_header(&letter, Lang::Ar).intro, "حرف الباء");
  }
}
