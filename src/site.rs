//! Static HTML output: one page on demand, or the whole site.

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::catalog::Category;
use crate::content::ContentDocument;
use crate::html::{self, PageContext};
use crate::locale::Lang;
use crate::render;
use crate::state::UiState;

/// Which page to render and in what state.
#[derive(Debug, Clone)]
pub struct PageRequest {
  pub lang: Lang,
  pub category: Category,
  pub query: String,
  /// Cursor override; defaults to the initial cursor.
  pub visible: Option<usize>,
}

impl PageRequest {
  pub fn new(lang: Lang, category: Category) -> Self {
    Self { lang, category, query: String::new(), visible: None }
  }
}

/// Render one full page. `root` is the relative path back to the site root.
pub fn render_page(doc: &ContentDocument, request: &PageRequest, root: &str) -> String {
  let mut state = UiState::new(request.lang, request.category.clone());
  if let Some(visible) = request.visible {
    state.visible = visible;
  }
  if !request.query.trim().is_empty() {
    state.press_search(&request.query);
  }

  let page = state.refresh(doc);
  let grid = render::render_grid(&page, state.lang, Utc::now());
  let letter = match &state.category {
    Category::Letter(key) => doc.letter(key).map(|l| render::letter_header(l, state.lang)),
    _ => None,
  };
  let ctx = PageContext { doc, state: &state, letter, root };
  html::page(&ctx, &grid)
}

/// Letter keys become file names; refuse anything that could escape the output dir.
fn letter_file_name(key: &str) -> Option<String> {
  let valid = !key.is_empty() && key != "." && key != ".." && !key.contains(['/', '\\', '\0']);
  valid.then(|| format!("{key}.html"))
}

async fn write_page(path: &Path, body: String) -> Result<()> {
  tokio::fs::write(path, body).await.with_context(|| format!("Failed to write {}", path.display()))
}

/// Write `index.html`, `shorts.html`, `playlists.html` and one page per letter.
pub async fn write_site(doc: &ContentDocument, lang: Lang, out_dir: &Path) -> Result<Vec<PathBuf>> {
  let letters_dir = out_dir.join("letters");
  tokio::fs::create_dir_all(&letters_dir)
    .await
    .with_context(|| format!("Failed to create {}", letters_dir.display()))?;

  let mut written = Vec::new();
  for (file, category) in
    [("index.html", Category::Videos), ("shorts.html", Category::Shorts), ("playlists.html", Category::Playlists)]
  {
    let path = out_dir.join(file);
    write_page(&path, render_page(doc, &PageRequest::new(lang, category), "")).await?;
    written.push(path);
  }

  for key in doc.letters.keys() {
    let Some(file) = letter_file_name(key) else {
      warn!(key = %key, "site: skipping letter with unusable key");
      continue;
    };
    let path = letters_dir.join(file);
    write_page(&path, render_page(doc, &PageRequest::new(lang, Category::Letter(key.clone())), "../")).await?;
    written.push(path);
  }

  info!(pages = written.len(), out = %out_dir.display(), "site: written");
  Ok(written)
}

/// Write a single page to `out`, or return it for stdout when `out` is `None`.
pub async fn write_single(doc: &ContentDocument, request: &PageRequest, out: Option<&Path>) -> Result<Option<String>> {
  let body = render_page(doc, request, "");
  match out {
    Some(path) => {
      if path.is_dir() {
        return Err(anyhow!("{} is a directory", path.display()));
      }
      write_page(path, body).await?;
      info!(out = %path.display(), tab = %request.category.key(), "site: page written");
      Ok(None)
    }
    None => Ok(Some(body)),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn doc() -> ContentDocument {
    ContentDocument::from_json(
      r#"{
        "videos": [
          { "videoId": "v1", "title": "الألف", "title_en": "Alif" },
          { "videoId": "v2", "title": "الباء", "title_en": "Baa" }
        ],
        "shorts": [{ "videoId": "s1", "title": "قصير" }],
        "playlists": [{ "id": "p1", "title": "Letters", "count": 2 }],
        "letters": {
          "alif": { "ar": "الألف", "en": "Alif", "videos": ["v1"] },
          "../evil": { "en": "Nope" }
        }
      }"#,
    )
    .unwrap()
  }

  #[test]
  fn query_puts_button_in_clear_mode() {
    let doc = doc();
    let mut request = PageRequest::new(Lang::En, Category::Videos);
    request.query = "baa".into();
    let html = render_page(&doc, &request, "");
    assert!(html.contains(r#"value="baa""#));
    assert!(html.contains("✖️"));
    assert!(html.contains(r#"data-video="v2""#));
    assert!(!html.contains(r#"data-video="v1""#));
  }

  #[test]
  fn visible_override_limits_cards() {
    let doc = doc();
    let request = PageRequest { visible: Some(1), ..PageRequest::new(Lang::Ar, Category::Videos) };
    let html = render_page(&doc, &request, "");
    assert_eq!(html.matches(r#"class="card""#).count(), 1);
    assert!(html.contains(r#"id="loadMore" style="display:block""#));
  }

  #[test]
  fn letter_keys_cannot_escape() {
    assert_eq!(letter_file_name("alif").as_deref(), Some("alif.html"));
    assert_eq!(letter_file_name("../evil"), None);
    assert_eq!(letter_file_name(".."), None);
    assert_eq!(letter_file_name(""), None);
  }

  #[tokio::test]
  async fn site_writes_tabs_and_letters() {
    let dir = tempfile::tempdir().unwrap();
    let written = write_site(&doc(), Lang::Ar, dir.path()).await.unwrap();
    assert_eq!(written.len(), 4);
    for file in ["index.html", "shorts.html", "playlists.html", "letters/alif.html"] {
      assert!(dir.path().join(file).is_file(), "{file} missing");
    }
    let letter = std::fs::read_to_string(dir.path().join("letters/alif.html")).unwrap();
    assert!(letter.contains(r#"id="letterHeader""#));
    assert!(letter.contains(r#"href="../index.html""#));
    let shorts = std::fs::read_to_string(dir.path().join("shorts.html")).unwrap();
    assert!(shorts.contains("video-responsive-9-16"));
  }

  #[tokio::test]
  async fn single_page_goes_to_stdout_without_out() {
    let body = write_single(&doc(), &PageRequest::new(Lang::En, Category::Playlists), None).await.unwrap();
    assert!(body.unwrap().contains(r#"data-playlist="p1""#));
  }
}
