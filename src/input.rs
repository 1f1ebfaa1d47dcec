use anyhow::{Context, Result};
use ratatui::crossterm::event::{self, KeyCode, KeyModifiers};

use crate::app::{App, AppMode};

// --- Helpers ---

/// Convert a char index to a byte offset within the string.
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
  s.char_indices().nth(char_idx).map_or(s.len(), |(i, _)| i)
}

// --- Event Handling ---

pub async fn handle_key_event(app: &mut App, key: event::KeyEvent) -> Result<()> {
  if key.modifiers.contains(KeyModifiers::CONTROL) {
    let handled = match key.code {
      KeyCode::Char('c') => {
        app.should_quit = true;
        true
      }
      KeyCode::Char('t') => {
        app.next_theme();
        true
      }
      KeyCode::Char('l') => {
        app.toggle_lang();
        true
      }
      KeyCode::Char('n') => {
        app.load_more();
        true
      }
      KeyCode::Char('f') => {
        app.press_search();
        true
      }
      KeyCode::Char('b') => {
        app.next_letter();
        true
      }
      KeyCode::Char('s') => {
        app.stop().await.context("Failed to stop playback")?;
        true
      }
      KeyCode::Char('o') => {
        if let Some(url) = app.selected_url() {
          app.open_url(&url);
        }
        true
      }
      _ => false,
    };
    if handled {
      return Ok(());
    }
  }

  match key.code {
    KeyCode::Tab => {
      let next = app.ui.category.next_tab();
      app.switch_tab(next);
      return Ok(());
    }
    KeyCode::BackTab => {
      let prev = app.ui.category.prev_tab();
      app.switch_tab(prev);
      return Ok(());
    }
    _ => {}
  }

  match app.mode {
    AppMode::Input => handle_input_key(app, key),
    AppMode::Results => handle_results_key(app, key).await.context("Failed to handle results key event")?,
  }
  Ok(())
}

fn handle_input_key(app: &mut App, key: event::KeyEvent) {
  app.clear_error();
  match key.code {
    KeyCode::Enter => {
      app.submit_search();
    }
    KeyCode::Char(c) => {
      let byte_idx = char_to_byte_index(&app.input, app.cursor_position);
      app.input.insert(byte_idx, c);
      app.cursor_position += 1;
    }
    KeyCode::Backspace => {
      if app.cursor_position > 0 {
        app.cursor_position -= 1;
        let byte_idx = char_to_byte_index(&app.input, app.cursor_position);
        app.input.remove(byte_idx);
      }
    }
    KeyCode::Delete => {
      if app.cursor_position < app.input.chars().count() {
        let byte_idx = char_to_byte_index(&app.input, app.cursor_position);
        app.input.remove(byte_idx);
      }
    }
    KeyCode::Left => {
      app.cursor_position = app.cursor_position.saturating_sub(1);
    }
    KeyCode::Right => {
      if app.cursor_position < app.input.chars().count() {
        app.cursor_position += 1;
      }
    }
    KeyCode::Home => {
      app.cursor_position = 0;
    }
    KeyCode::End => {
      app.cursor_position = app.input.chars().count();
    }
    KeyCode::Esc => {
      if !app.input.is_empty() {
        app.input.clear();
        app.cursor_position = 0;
        app.input_scroll = 0;
      } else if app.grid.content_count() > 0 {
        app.mode = AppMode::Results;
      } else {
        app.should_quit = true;
      }
    }
    KeyCode::Down => {
      if app.grid.content_count() > 0 {
        app.mode = AppMode::Results;
      }
    }
    _ => {}
  }
}

async fn handle_results_key(app: &mut App, key: event::KeyEvent) -> Result<()> {
  match key.code {
    KeyCode::Enter => {
      app.play_selected();
    }
    KeyCode::Char(' ') => {
      app.toggle_pause().await;
    }
    KeyCode::Down | KeyCode::Char('j') => {
      app.select_next(true);
    }
    KeyCode::Up | KeyCode::Char('k') => {
      app.select_next(false);
    }
    KeyCode::Char('m') => {
      app.load_more();
    }
    KeyCode::Char('/') | KeyCode::Esc => {
      app.mode = AppMode::Input;
    }
    KeyCode::Char('q') => {
      app.should_quit = true;
    }
    _ => {}
  }
  Ok(())
}
