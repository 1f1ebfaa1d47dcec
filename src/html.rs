//! Markup for the channel page and its grid cells.

use std::fmt::Write as _;

use crate::catalog::Category;
use crate::constants::constants;
use crate::content::ContentDocument;
use crate::locale::{self, Label, Lang};
use crate::render::{Cell, Grid, LetterHeader, PlaylistCard, VideoCard};
use crate::state::UiState;

/// Escape text for element content and quoted attribute values.
pub fn escape(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  for c in s.chars() {
    match c {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#39;"),
      _ => out.push(c),
    }
  }
  out
}

// --- Cells ---

pub fn video_card(card: &VideoCard) -> String {
  let id = escape(&card.video_id);
  let title = escape(&card.title);
  let watch = escape(&card.watch_url);
  format!(
    r#"<article class="card" data-video="{id}" data-title="{raw_title}">
  <a href="{watch}" target="_blank" rel="noopener"><div class="thumb" style="background-image:url('{thumb}')"></div></a>
  <div class="title">{title}</div>
  <div class="meta">{meta}</div>
  <div class="embed-wrap"><div class="{aspect}"><iframe class="video-iframe" loading="lazy" id="{element}" src="{src}" title="{title}" frameborder="0" allow="accelerometer; autoplay; clipboard-write; encrypted-media; gyroscope; picture-in-picture" allowfullscreen></iframe></div></div>
  <a class="backlink" href="{watch}" target="_blank" rel="noopener">{watch_label}</a>
</article>"#,
    raw_title = escape(&card.raw_title),
    thumb = escape(&card.thumb),
    meta = escape(card.time_label.as_deref().unwrap_or("")),
    aspect = card.aspect.css_class(),
    element = escape(&card.element_id),
    src = escape(&card.embed_src),
    watch_label = escape(card.watch_label),
  )
}

pub fn playlist_card(card: &PlaylistCard) -> String {
  format!(
    r#"<article class="card" data-playlist="{id}"><div class="thumb" style="background-image:url('{thumb}')"></div><div class="title">{title}</div><div class="meta">{count}</div></article>"#,
    id = escape(&card.id),
    thumb = escape(&card.thumb),
    title = escape(&card.title),
    count = escape(&card.count_label),
  )
}

/// Full-width ad block spanning the grid row.
pub fn ad_block() -> String {
  let c = constants();
  format!(
    r#"<div class="ad-block" style="grid-column:1/-1;text-align:center;margin:12px 0;"><ins class="adsbygoogle" style="display:block" data-ad-client="{}" data-ad-slot="{}" data-ad-format="auto" data-full-width-responsive="true"></ins></div>"#,
    escape(&c.ad_client),
    escape(&c.ad_slot)
  )
}

pub fn cell(cell: &Cell) -> String {
  match cell {
    Cell::Video(card) => video_card(card),
    Cell::Playlist(card) => playlist_card(card),
    Cell::Ad => ad_block(),
    Cell::NoResults(text) => {
      format!(r#"<div class="no-results" style="grid-column:1/-1;text-align:center;color:#6b7280">{}</div>"#, escape(text))
    }
  }
}

pub fn grid(grid: &Grid) -> String {
  grid.cells.iter().map(cell).collect::<Vec<_>>().join("\n")
}

pub fn letter_header(header: &LetterHeader) -> String {
  let forms = if header.forms.is_empty() {
    String::new()
  } else {
    format!(r#"<div class="letter-forms">{}</div>"#, escape(&header.forms.join(" ")))
  };
  format!(
    r#"<section id="letterHeader" class="letter-header"><h1>{}</h1><p>{}</p>{}</section>"#,
    escape(&header.name),
    escape(&header.intro),
    forms
  )
}

/// Links to every letter page, named in the display language.
pub fn letter_links(doc: &ContentDocument, lang: Lang, prefix: &str) -> String {
  if doc.letters.is_empty() {
    return String::new();
  }
  let mut out = String::from(r#"<nav class="letter-links">"#);
  for (key, letter) in &doc.letters {
    let name = match lang {
      Lang::Ar if !letter.ar.is_empty() => &letter.ar,
      Lang::En if !letter.en.is_empty() => &letter.en,
      _ => key,
    };
    let _ = write!(out, r#"<a class="letter-link" href="{}letters/{}.html">{}</a>"#, prefix, escape(key), escape(name));
  }
  out.push_str("</nav>");
  out
}

// --- Page ---

/// Everything a full page needs besides the rendered grid.
pub struct PageContext<'a> {
  pub doc: &'a ContentDocument,
  pub state: &'a UiState,
  pub letter: Option<LetterHeader>,
  /// Relative path back to the site root (`""` at the root, `"../"` for letter pages).
  pub root: &'a str,
}

fn tab_button(id: &str, label: Label, active: bool, lang: Lang) -> String {
  let class = if active { "tab active" } else { "tab inactive" };
  format!(r#"<button id="{}" class="{}">{}</button>"#, id, class, escape(label.text(lang)))
}

pub fn page(ctx: &PageContext, grid_cells: &Grid) -> String {
  let c = constants();
  let lang = ctx.state.lang;
  let category = &ctx.state.category;

  let stats = ctx
    .doc
    .channel
    .map(|ch| format!(r#"<span id="channelStats">{}</span>"#, escape(&locale::subscribers(ch.subs, lang))))
    .unwrap_or_default();
  let letter = ctx.letter.as_ref().map(letter_header).unwrap_or_default();
  let load_more_display = if grid_cells.load_more { "block" } else { "none" };

  format!(
    r#"<!DOCTYPE html>
<html lang="{lang}" dir="{dir}">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>{channel}</title>
  <link rel="stylesheet" href="{root}style.css">
</head>
<body>
  <header class="site-header">
    <a class="logo" href="{root}index.html">{channel}</a>
    <a class="handle" href="https://www.youtube.com/{handle}" target="_blank" rel="noopener">{handle}</a>
    {stats}
    <button id="langToggle">{lang_toggle}</button>
  </header>
  <div class="search-bar">
    <input id="q" type="search" placeholder="{placeholder}" value="{query}">
    <button id="doSearch">{search_icon}</button>
  </div>
  <nav class="tabs">
    {tab_videos}
    {tab_shorts}
    {tab_playlists}
  </nav>
  {letter_links}
  {letter}
  <div id="loading" style="display:none">{loading}</div>
  <main id="grid" class="grid">
{grid}
  </main>
  <button id="loadMore" style="display:{load_more_display}">{load_more}</button>
  <script src="{iframe_api}"></script>
  <script async src="https://pagead2.googlesyndication.com/pagead/js/adsbygoogle.js?client={ad_client}" crossorigin="anonymous"></script>
</body>
</html>
"#,
    lang = lang.code(),
    dir = lang.dir(),
    channel = escape(&c.channel_name),
    handle = escape(&c.channel_handle),
    root = ctx.root,
    lang_toggle = escape(Label::LangToggle.text(lang)),
    placeholder = escape(Label::SearchPlaceholder.text(lang)),
    query = escape(&ctx.state.query),
    search_icon = ctx.state.search_mode.icon(),
    tab_videos = tab_button("tabVideos", Label::TabVideos, *category == Category::Videos, lang),
    tab_shorts = tab_button("tabShorts", Label::TabShorts, *category == Category::Shorts, lang),
    tab_playlists = tab_button("tabPlaylists", Label::TabPlaylists, *category == Category::Playlists, lang),
    letter_links = letter_links(ctx.doc, lang, ctx.root),
    loading = escape(Label::Loading.text(lang)),
    grid = grid(grid_cells),
    load_more = escape(Label::LoadMore.text(lang)),
    iframe_api = escape(&c.iframe_api_src),
    ad_client = escape(&c.ad_client),
  )
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog;
  use crate::render;
  use chrono::Utc;

  fn doc() -> ContentDocument {
    ContentDocument::from_json(
      r#"{
        "channel": { "subs": 2048 },
        "videos": [
          { "videoId": "v1", "title": "Alif <1>", "title_en": "Alif & friends" },
          { "videoId": "v2", "title": "Baa" }
        ],
        "letters": { "alif": { "ar": "الألف", "en": "Alif", "intro_ar": "مقدمة", "intro_en": "Intro", "videos": ["v1"] } }
      }"#,
    )
    .unwrap()
  }

  #[test]
  fn escape_covers_markup_characters() {
    assert_eq!(escape(r#"<a href="x">Tom & 'Jerry'</a>"#), "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;");
    assert_eq!(escape("الألف"), "الألف");
  }

  #[test]
  fn video_card_markup_is_escaped() {
    let doc = doc();
    let card = render::video_card(&doc.videos[0], false, Lang::En, Utc::now());
    let html = video_card(&card);
    assert!(html.contains(r#"id="iframe-v1""#));
    assert!(html.contains("Alif &amp; friends"));
    assert!(html.contains(r#"data-title="Alif &lt;1&gt;""#));
    assert!(html.contains("video-responsive-16-9"));
    assert!(html.contains("enablejsapi=1&amp;rel=0"));
  }

  #[test]
  fn page_sets_language_and_direction() {
    let doc = doc();
    let mut state = UiState::new(Lang::Ar, Category::Videos);
    let page_items = state.refresh(&doc);
    let grid_cells = render::render_grid(&page_items, state.lang, Utc::now());
    let ctx = PageContext { doc: &doc, state: &state, letter: None, root: "" };
    let html = page(&ctx, &grid_cells);
    assert!(html.contains(r#"<html lang="ar" dir="rtl">"#));
    assert!(html.contains(r#"<button id="langToggle">English</button>"#));
    assert!(html.contains(r#"<span id="channelStats">2,048 مشترك</span>"#));
    assert!(html.contains(r#"id="tabVideos" class="tab active""#));
    assert!(html.contains(r#"id="loadMore" style="display:none""#));
    assert!(html.contains(r#"href="letters/alif.html">الألف</a>"#));
    assert!(!html.contains("letterHeader"));
  }

  #[test]
  fn letter_page_includes_header() {
    let doc = doc();
    let mut state = UiState::new(Lang::En, Category::Letter("alif".into()));
    let page_items = state.refresh(&doc);
    let grid_cells = render::render_grid(&page_items, state.lang, Utc::now());
    let header = doc.letter("alif").map(|l| render::letter_header(l, state.lang));
    let ctx = PageContext { doc: &doc, state: &state, letter: header, root: "../" };
    let html = page(&ctx, &grid_cells);
    assert!(html.contains(r#"<section id="letterHeader" class="letter-header"><h1>Alif</h1><p>Intro</p></section>"#));
    assert!(html.contains(r#"href="../letters/alif.html">Alif</a>"#));
    assert_eq!(catalog::filter(&doc, &state.category, "").len(), 1);
  }

  #[test]
  fn ad_block_spans_the_row() {
    let html = cell(&Cell::Ad);
    assert!(html.starts_with(r#"<div class="ad-block""#));
    assert!(html.contains("grid-column:1/-1"));
    assert!(html.contains("adsbygoogle"));
  }
}
