use anyhow::Result;
use chrono::Utc;
use image::DynamicImage;
use ratatui::{layout::Rect, widgets::ListState};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use crate::catalog::Category;
use crate::config::{self, Config};
use crate::content::{ContentDocument, ContentSource, load_content};
use crate::display::DisplayMode;
use crate::locale::Lang;
use crate::player::{MpvPlayer, probe_mpv};
use crate::render::{self, Cell, Grid, LetterHeader};
use crate::sequencer::{Advance, Sequencer};
use crate::state::UiState;
use crate::theme::{self, THEMES};
use crate::youtube::{self, fetch_thumbnail};

// --- Types ---

pub type ThumbResult = (String, Result<DynamicImage>);

/// Progress of the one-time content load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
  Loading,
  Ready,
  Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
  /// Typing in the search box.
  Input,
  /// Moving through the grid.
  Results,
}

/// Terminal graphics protocol rendering state (Kitty/Sixel).
#[derive(Default)]
pub struct GraphicsCache {
  pub thumb_area: Option<Rect>,
  pub last_sent: Option<(String, Rect)>,
  pub resized_thumb: Option<(String, u16, u16, DynamicImage)>,
}

/// In-flight async task receivers.
#[derive(Default)]
pub(crate) struct AsyncTasks {
  pub(crate) content_rx: Option<oneshot::Receiver<Result<ContentDocument>>>,
  pub(crate) ready_rx: Option<oneshot::Receiver<Result<()>>>,
  pub(crate) thumb_rx: Option<oneshot::Receiver<ThumbResult>>,
}

pub struct App {
  pub content: Option<ContentDocument>,
  pub load_status: LoadStatus,
  pub ui: UiState,
  pub grid: Grid,
  pub letter: Option<LetterHeader>,
  pub input: String,
  pub cursor_position: usize,
  pub input_scroll: usize,
  pub mode: AppMode,
  pub theme_index: usize,
  pub list_state: ListState,
  pub sequencer: Sequencer<MpvPlayer>,
  pub display_mode: DisplayMode,
  pub http_client: reqwest::Client,
  pub last_error: Option<String>,
  pub status_message: Option<String>,
  pub should_quit: bool,
  pub gfx: GraphicsCache,
  pub thumbnails: HashMap<String, DynamicImage>,
  pub(crate) tasks: AsyncTasks,
  source: ContentSource,
  /// Where preferences are saved; `None` disables saving.
  prefs_path: Option<PathBuf>,
  /// When the last error was set, for auto-dismiss.
  error_time: Option<Instant>,
}

impl App {
  pub fn new(source: ContentSource, lang: Option<Lang>, category: Category, display_mode: DisplayMode) -> Self {
    let config = Config::load();
    let theme_index = config.theme_name.as_deref().and_then(theme::index_of).unwrap_or(0);
    let lang = lang.or_else(|| config.lang()).unwrap_or_default();

    Self {
      content: None,
      load_status: LoadStatus::Loading,
      ui: UiState::new(lang, category),
      grid: Grid::default(),
      letter: None,
      input: String::new(),
      cursor_position: 0,
      input_scroll: 0,
      mode: AppMode::Input,
      theme_index,
      list_state: ListState::default(),
      sequencer: Sequencer::new(),
      display_mode,
      http_client: reqwest::Client::new(),
      last_error: None,
      status_message: None,
      should_quit: false,
      gfx: GraphicsCache::default(),
      thumbnails: HashMap::new(),
      tasks: AsyncTasks::default(),
      source,
      prefs_path: config::prefs_path(),
      error_time: None,
    }
  }

  pub fn theme(&self) -> &'static theme::Theme {
    &THEMES[self.theme_index % THEMES.len()]
  }

  pub fn player(&self) -> Option<&MpvPlayer> {
    self.sequencer.api()
  }

  pub fn is_playing(&self) -> bool {
    self.player().is_some_and(MpvPlayer::is_playing)
  }

  /// Set an error message with auto-dismiss tracking.
  pub fn set_error(&mut self, msg: String) {
    self.last_error = Some(msg);
    self.error_time = Some(Instant::now());
  }

  pub fn clear_error(&mut self) {
    self.last_error = None;
    self.error_time = None;
  }

  /// Clear stale error messages after 5 seconds.
  pub fn expire_error(&mut self) {
    if let Some(t) = self.error_time
      && t.elapsed() >= Duration::from_secs(5)
    {
      self.clear_error();
    }
  }

  fn save_config(&self) {
    let config = Config { lang: Some(self.ui.lang.code().to_string()), theme_name: Some(self.theme().name.to_string()) };
    let Some(path) = self.prefs_path.as_deref() else { return };
    if let Err(e) = config.save_to(path) {
      warn!(err = %e, "app: failed to save preferences");
    }
  }

  pub fn next_theme(&mut self) {
    self.theme_index = (self.theme_index + 1) % THEMES.len();
    self.save_config();
  }

  // --- Startup ---

  /// Start the content load and the player probe. Both resolve in `check_pending`.
  pub fn start(&mut self) {
    let client = self.http_client.clone();
    let source = self.source.clone();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let _ = tx.send(load_content(&client, &source).await);
    });
    self.tasks.content_rx = Some(rx);

    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let _ = tx.send(probe_mpv().await);
    });
    self.tasks.ready_rx = Some(rx);
  }

  pub fn check_pending(&mut self) {
    if let Some(mut rx) = self.tasks.content_rx.take() {
      match rx.try_recv() {
        Ok(Ok(doc)) => {
          info!(videos = doc.videos.len(), shorts = doc.shorts.len(), "app: content ready");
          self.content = Some(doc);
          self.load_status = LoadStatus::Ready;
          self.rerender();
          self.select_first();
        }
        Ok(Err(e)) => {
          error!(err = %format!("{:#}", e), "app: content load failed");
          self.load_status = LoadStatus::Failed(format!("{:#}", e));
        }
        Err(oneshot::error::TryRecvError::Empty) => {
          self.tasks.content_rx = Some(rx);
        }
        Err(oneshot::error::TryRecvError::Closed) => {
          self.load_status = LoadStatus::Failed("Content task failed.".to_string());
        }
      }
    }

    if let Some(mut rx) = self.tasks.ready_rx.take() {
      match rx.try_recv() {
        Ok(Ok(())) => self.sequencer.on_ready(MpvPlayer::new()),
        Ok(Err(e)) => {
          warn!(err = %e, "app: player unavailable");
          self.set_error(format!("Player unavailable: {:#}", e));
        }
        Err(oneshot::error::TryRecvError::Empty) => {
          self.tasks.ready_rx = Some(rx);
        }
        Err(oneshot::error::TryRecvError::Closed) => {
          self.set_error("Player probe failed.".to_string());
        }
      }
    }

    if let Some(mut rx) = self.tasks.thumb_rx.take() {
      match rx.try_recv() {
        Ok((video_id, Ok(image))) => {
          self.thumbnails.insert(video_id, image);
        }
        Ok((video_id, Err(e))) => {
          debug!(video = %video_id, err = %e, "app: no thumbnail");
        }
        Err(oneshot::error::TryRecvError::Empty) => {
          self.tasks.thumb_rx = Some(rx);
        }
        Err(oneshot::error::TryRecvError::Closed) => {}
      }
    }

    self.handle_player_events();
  }

  /// Forward player state changes to the sequencer and follow autoplay hand-offs.
  pub fn handle_player_events(&mut self) {
    if let Some(player) = self.sequencer.api_mut() {
      player.check_mpv_status();
    }
    for advance in self.sequencer.pump(&self.ui.autoplay) {
      match advance {
        Advance::Played { element_id } | Advance::Loaded { element_id, .. } => {
          if let Some(idx) = self.cell_index(&element_id) {
            self.list_state.select(Some(idx));
            self.request_thumbnail();
          }
        }
        Advance::Stop => {
          self.status_message = None;
        }
      }
    }
  }

  // --- Grid ---

  /// Re-run filter/paginate for the current state and rebuild the grid.
  pub fn rerender(&mut self) {
    let Some(doc) = self.content.as_ref() else { return };
    let page = self.ui.refresh(doc);
    self.grid = render::render_grid(&page, self.ui.lang, Utc::now());
    self.letter = match &self.ui.category {
      Category::Letter(key) => doc.letter(key).map(|l| render::letter_header(l, self.ui.lang)),
      _ => None,
    };
    debug!(
      tab = %self.ui.category.key(),
      query = %self.ui.query,
      visible = self.ui.visible,
      total = page.total,
      "app: rendered"
    );
    self.sequencer.register(self.grid.player_elements());

    if let Some(selected) = self.list_state.selected()
      && selected >= self.grid.cells.len()
    {
      self.select_first();
    }
  }

  fn is_selectable(cell: &Cell) -> bool {
    matches!(cell, Cell::Video(_) | Cell::Playlist(_))
  }

  fn cell_index(&self, element_id: &str) -> Option<usize> {
    self.grid.cells.iter().position(|c| matches!(c, Cell::Video(card) if card.element_id == element_id))
  }

  pub fn selected_cell(&self) -> Option<&Cell> {
    self.list_state.selected().and_then(|i| self.grid.cells.get(i))
  }

  pub fn select_first(&mut self) {
    let first = self.grid.cells.iter().position(Self::is_selectable);
    self.list_state.select(first);
    self.request_thumbnail();
  }

  /// Move the selection to the next content cell, skipping ad rows and wrapping.
  pub fn select_next(&mut self, forward: bool) {
    let count = self.grid.cells.len();
    if count == 0 {
      return;
    }
    let start = self.list_state.selected().unwrap_or(if forward { count - 1 } else { 0 });
    for step in 1..=count {
      let i = if forward { (start + step) % count } else { (start + count - step % count) % count };
      if Self::is_selectable(&self.grid.cells[i]) {
        self.list_state.select(Some(i));
        self.request_thumbnail();
        return;
      }
    }
  }

  // --- Actions ---

  pub fn toggle_lang(&mut self) {
    let lang = self.ui.toggle_lang();
    info!(lang = %lang.code(), "app: language toggled");
    self.save_config();
    self.rerender();
  }

  pub fn switch_tab(&mut self, category: Category) {
    info!(tab = %category.key(), "app: tab switched");
    self.ui.switch_tab(category);
    self.input.clear();
    self.cursor_position = 0;
    self.input_scroll = 0;
    self.rerender();
    self.select_first();
  }

  /// Cycle through the letter lesson pages.
  pub fn next_letter(&mut self) {
    let Some(doc) = self.content.as_ref() else { return };
    let next = match &self.ui.category {
      Category::Letter(current) => doc.letters.range::<String, _>((
        std::ops::Bound::Excluded(current.clone()),
        std::ops::Bound::Unbounded,
      ))
      .next()
      .or_else(|| doc.letters.iter().next()),
      _ => doc.letters.iter().next(),
    };
    let Some((key, _)) = next else {
      self.set_error("No letter pages.".to_string());
      return;
    };
    let category = Category::Letter(key.clone());
    self.switch_tab(category);
  }

  pub fn load_more(&mut self) {
    if !self.grid.load_more {
      return;
    }
    self.ui.load_more();
    self.rerender();
  }

  /// Enter in the search box.
  pub fn submit_search(&mut self) {
    if self.ui.submit_search(&self.input) {
      info!(query = %self.ui.query, "app: search");
      self.rerender();
      self.select_first();
    }
  }

  /// The search/clear button.
  pub fn press_search(&mut self) {
    self.input = self.ui.press_search(&self.input);
    self.cursor_position = self.input.chars().count();
    self.input_scroll = 0;
    self.rerender();
    self.select_first();
  }

  pub fn play_selected(&mut self) {
    let Some(cell) = self.selected_cell() else { return };
    match cell {
      Cell::Video(card) => {
        let element_id = card.element_id.clone();
        let title = card.title.clone();
        match self.sequencer.play(&element_id) {
          Ok(true) => {
            info!(element = %element_id, "app: play");
            self.clear_error();
            if let Some(player) = self.sequencer.api_mut() {
              player.current_title = Some(title);
            }
          }
          Ok(false) => self.set_error("Player not ready.".to_string()),
          Err(e) => self.set_error(format!("Playback error: {:#}", e)),
        }
      }
      Cell::Playlist(card) => {
        let url = youtube::playlist_url(&card.id);
        self.open_url(&url);
      }
      Cell::Ad | Cell::NoResults(_) => {}
    }
  }

  /// URL of the selected card on YouTube.
  pub fn selected_url(&self) -> Option<String> {
    match self.selected_cell()? {
      Cell::Video(card) => Some(card.watch_url.clone()),
      Cell::Playlist(card) => Some(youtube::playlist_url(&card.id)),
      Cell::Ad | Cell::NoResults(_) => None,
    }
  }

  pub fn open_url(&mut self, url: &str) {
    #[cfg(target_os = "macos")]
    let cmd = "open";
    #[cfg(not(target_os = "macos"))]
    let cmd = "xdg-open";
    match std::process::Command::new(cmd)
      .arg(url)
      .stdin(std::process::Stdio::null())
      .stdout(std::process::Stdio::null())
      .stderr(std::process::Stdio::null())
      .spawn()
    {
      Ok(mut child) => {
        // Reap the child in a background thread to avoid zombie processes.
        std::thread::spawn(move || {
          let _ = child.wait();
        });
      }
      Err(e) => self.set_error(format!("Failed to open browser: {}", e)),
    }
  }

  pub async fn stop(&mut self) -> Result<()> {
    if let Some(player) = self.sequencer.api_mut()
      && player.is_playing()
    {
      player.stop().await?;
      self.gfx.last_sent = None;
    }
    Ok(())
  }

  pub async fn toggle_pause(&mut self) {
    let Some(player) = self.sequencer.api_mut() else { return };
    if !player.is_playing() {
      return;
    }
    if let Err(e) = player.toggle_pause().await {
      self.set_error(format!("Pause error: {}", e));
    }
  }

  /// Fetch the selected card's thumbnail in the background unless cached.
  pub fn request_thumbnail(&mut self) {
    let Some(Cell::Video(card)) = self.selected_cell() else { return };
    if self.thumbnails.contains_key(&card.video_id) {
      return;
    }
    let video_id = card.video_id.clone();
    let thumb = Some(card.thumb.clone()).filter(|t| !t.is_empty());
    let client = self.http_client.clone();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let result = fetch_thumbnail(&client, &video_id, thumb.as_deref()).await;
      let _ = tx.send((video_id, result));
    });
    // A newer selection supersedes the old fetch.
    self.tasks.thumb_rx = Some(rx);
  }

  pub fn selected_thumbnail(&self) -> Option<(&str, &DynamicImage)> {
    let Some(Cell::Video(card)) = self.selected_cell() else { return None };
    self.thumbnails.get(&card.video_id).map(|img| (card.video_id.as_str(), img))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn doc() -> ContentDocument {
    let videos: Vec<String> =
      (1..=20).map(|i| format!(r#"{{ "videoId": "v{i}", "title": "Video {i}" }}"#)).collect();
    ContentDocument::from_json(&format!(
      r#"{{ "videos": [{}], "letters": {{ "alif": {{ "en": "Alif", "videos": ["v1"] }}, "baa": {{ "en": "Baa", "videos": ["v2"] }} }} }}"#,
      videos.join(",")
    ))
    .unwrap()
  }

  fn ready_app() -> App {
    let mut app = App {
      content: Some(doc()),
      load_status: LoadStatus::Ready,
      ui: UiState::new(Lang::En, Category::Videos),
      grid: Grid::default(),
      letter: None,
      input: String::new(),
      cursor_position: 0,
      input_scroll: 0,
      mode: AppMode::Results,
      theme_index: 0,
      list_state: ListState::default(),
      sequencer: Sequencer::new(),
      display_mode: DisplayMode::Ascii,
      http_client: reqwest::Client::new(),
      last_error: None,
      status_message: None,
      should_quit: false,
      gfx: GraphicsCache::default(),
      thumbnails: HashMap::new(),
      tasks: AsyncTasks::default(),
      source: ContentSource::parse("content.json"),
      prefs_path: None,
      error_time: None,
    };
    app.rerender();
    app
  }

  #[test]
  fn rerender_builds_grid_and_registers_players() {
    let app = ready_app();
    assert_eq!(app.grid.content_count(), 18);
    assert_eq!(app.grid.ad_count(), 4);
    assert!(app.grid.load_more);
    assert_eq!(app.sequencer.state("iframe-v1"), Some(crate::sequencer::PlayerState::Unbound));
  }

  fn first_card(app: &App) -> &crate::render::VideoCard {
    match &app.grid.cells[0] {
      Cell::Video(card) => card,
      other => panic!("expected a video card, got {other:?}"),
    }
  }

  #[test]
  fn toggling_language_rerenders_the_grid_and_persists() {
    let dir = tempfile::tempdir().unwrap();
    let prefs = dir.path().join("prefs.toml");
    let mut app = ready_app();
    app.prefs_path = Some(prefs.clone());
    app.ui = UiState::new(Lang::Ar, Category::Videos);
    app.content = Some(
      ContentDocument::from_json(r#"{ "videos": [{ "videoId": "v1", "title": "الألف", "title_en": "Alif" }] }"#)
        .unwrap(),
    );
    app.rerender();
    assert_eq!(first_card(&app).title, "الألف");
    assert_eq!(first_card(&app).watch_label, "شاهد على يوتيوب");

    app.toggle_lang();
    assert_eq!(app.ui.lang, Lang::En);
    assert_eq!(first_card(&app).title, "Alif");
    assert_eq!(first_card(&app).watch_label, "Watch on YouTube");
    assert_eq!(Config::load_from(&prefs).lang(), Some(Lang::En));

    app.toggle_lang();
    assert_eq!(first_card(&app).title, "الألف");
    assert_eq!(Config::load_from(&prefs).lang(), Some(Lang::Ar));
  }

  #[tokio::test]
  async fn selection_skips_ad_rows() {
    let mut app = ready_app();
    app.list_state.select(Some(3));
    app.select_next(true);
    // index 4 is the ad after the fourth card
    assert_eq!(app.list_state.selected(), Some(5));
    app.select_next(false);
    assert_eq!(app.list_state.selected(), Some(3));
  }

  #[test]
  fn load_more_stops_when_everything_is_shown() {
    let mut app = ready_app();
    app.load_more();
    assert_eq!(app.ui.visible, 30);
    assert_eq!(app.grid.content_count(), 20);
    assert!(!app.grid.load_more);
    app.load_more();
    assert_eq!(app.ui.visible, 30);
  }

  #[tokio::test]
  async fn search_button_round_trip_clears_input() {
    let mut app = ready_app();
    app.input = "video 1".into();
    app.press_search();
    assert_eq!(app.ui.query, "video 1");
    assert_eq!(app.grid.content_count(), 11);
    app.press_search();
    assert!(app.input.is_empty());
    assert!(app.ui.query.is_empty());
  }

  #[tokio::test]
  async fn letters_cycle_in_key_order() {
    let mut app = ready_app();
    app.next_letter();
    assert_eq!(app.ui.category, Category::Letter("alif".into()));
    assert_eq!(app.letter.as_ref().map(|h| h.name.as_str()), Some("Alif"));
    app.next_letter();
    assert_eq!(app.ui.category, Category::Letter("baa".into()));
    app.next_letter();
    assert_eq!(app.ui.category, Category::Letter("alif".into()));
  }

  #[tokio::test]
  async fn tab_switch_resets_input_and_cursor() {
    let mut app = ready_app();
    app.input = "abc".into();
    app.cursor_position = 3;
    app.switch_tab(Category::Shorts);
    assert!(app.input.is_empty());
    assert_eq!(app.cursor_position, 0);
    assert_eq!(app.ui.visible, 12);
  }

  #[tokio::test]
  async fn play_without_player_reports_not_ready() {
    let mut app = ready_app();
    app.select_first();
    app.play_selected();
    assert_eq!(app.last_error.as_deref(), Some("Player not ready."));
  }
}
