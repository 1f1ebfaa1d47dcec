use image::imageops::FilterType;
use ratatui::{
  Frame,
  layout::{Alignment, Constraint, Layout, Rect},
  style::{Modifier, Style, Stylize},
  text::{Line, Span},
  widgets::{Block, BorderType, List, ListItem, Padding, Paragraph, Wrap},
};

use crate::app::{App, AppMode, LoadStatus};
use crate::catalog::Category;
use crate::constants::constants;
use crate::display::DisplayMode;
use crate::graphics::ThumbnailWidget;
use crate::locale::{self, Label, Lang};
use crate::render::{Aspect, Cell, VideoCard};
use crate::theme::Theme;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

// --- Helpers ---

/// Compute the display width of the first `n` chars (accounting for double-width CJK).
pub fn display_width(s: &str, n: usize) -> usize {
  s.chars().take(n).map(|c| c.width().unwrap_or(0)).sum()
}

/// Truncate a string to `max_width` terminal columns, appending "…" if truncated.
fn truncate_str(s: &str, max_width: usize) -> String {
  if s.width() <= max_width {
    return s.to_string();
  }
  let budget = max_width.saturating_sub(1);
  let mut used = 0;
  let mut truncated = String::new();
  for c in s.chars() {
    let w = c.width().unwrap_or(0);
    if used + w > budget {
      break;
    }
    used += w;
    truncated.push(c);
  }
  format!("{}…", truncated)
}

/// Fit `title` and `right` on one row of `width` columns: the truncated title and the gap between them.
fn fit_row(title: &str, right: &str, width: usize) -> (String, usize) {
  let right_w = right.width();
  let title = truncate_str(title, width.saturating_sub(right_w + 2));
  let gap = width.saturating_sub(title.width() + right_w);
  (title, gap)
}

/// Text alignment for the display language.
fn text_alignment(lang: Lang) -> Alignment {
  if lang.is_rtl() { Alignment::Right } else { Alignment::Left }
}

fn rounded(theme: &Theme) -> Block<'static> {
  Block::bordered().border_type(BorderType::Rounded).border_style(Style::default().fg(theme.border))
}

// --- UI Rendering ---

pub fn ui(frame: &mut Frame, app: &mut App) {
  let theme = app.theme();
  app.gfx.thumb_area = None;

  frame.render_widget(Block::default().style(Style::default().bg(theme.bg)), frame.area());

  let [header_area, tabs_area, main_area, status_area, input_area, footer_area] = Layout::vertical([
    Constraint::Length(1),
    Constraint::Length(1),
    Constraint::Min(3),
    Constraint::Length(1),
    Constraint::Length(3),
    Constraint::Length(1),
  ])
  .areas(frame.area());

  render_header(frame, app, header_area);
  render_tabs(frame, app, tabs_area);
  render_main(frame, app, main_area);
  render_status(frame, app, status_area);
  render_input(frame, app, input_area);
  render_footer(frame, app, footer_area);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let c = constants();
  let mut spans = vec![
    Span::styled(format!(" ▶ {} ", c.channel_name), Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)),
    Span::styled(c.channel_handle.as_str(), Style::default().fg(theme.muted)),
  ];
  if let Some(channel) = app.content.as_ref().and_then(|d| d.channel) {
    spans.push(Span::raw("  "));
    spans.push(Span::styled(locale::subscribers(channel.subs, app.ui.lang), Style::default().fg(theme.fg)));
  }
  frame.render_widget(Line::from(spans), area);

  let toggle = format!("{} ", Label::LangToggle.text(app.ui.lang));
  let toggle_w = toggle.width() as u16;
  let right = Line::from(Span::styled(toggle, Style::default().fg(theme.muted)));
  let right_area = Rect { x: area.x + area.width.saturating_sub(toggle_w), width: toggle_w.min(area.width), ..area };
  frame.render_widget(right, right_area);
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let lang = app.ui.lang;
  let tabs = [
    (Category::Videos, Label::TabVideos),
    (Category::Shorts, Label::TabShorts),
    (Category::Playlists, Label::TabPlaylists),
  ];
  let mut spans: Vec<Span> = tabs
    .iter()
    .flat_map(|(category, label)| {
      let style = if app.ui.category == *category {
        Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD)
      } else {
        Style::default().fg(theme.muted)
      };
      [Span::styled(format!(" {} ", label.text(lang)), style), Span::raw(" ")]
    })
    .collect();
  if let Some(header) = &app.letter {
    spans.push(Span::styled(format!(" ✎ {} ", header.name), Style::default().fg(theme.accent)));
  }
  frame.render_widget(Line::from(spans).alignment(text_alignment(lang)), area);
}

fn render_main(frame: &mut Frame, app: &mut App, area: Rect) {
  match &app.load_status {
    LoadStatus::Loading => render_notice(frame, app.theme(), area, Label::Loading.text(app.ui.lang), None),
    LoadStatus::Failed(reason) => {
      let reason = reason.clone();
      render_notice(frame, app.theme(), area, Label::LoadFailed.text(app.ui.lang), Some(&reason));
    }
    LoadStatus::Ready => {
      let [grid_area, detail_area] =
        Layout::horizontal([Constraint::Percentage(58), Constraint::Percentage(42)]).areas(area);
      render_grid(frame, app, grid_area);
      render_detail(frame, app, detail_area);
    }
  }
}

fn render_notice(frame: &mut Frame, theme: &Theme, area: Rect, text: &str, detail: Option<&str>) {
  let mut lines = vec![
    Line::from(""),
    Line::from(Span::styled(text.to_string(), Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))),
  ];
  if let Some(detail) = detail {
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(detail.to_string(), Style::default().fg(theme.muted))));
  }
  let paragraph = Paragraph::new(lines).alignment(Alignment::Center).wrap(Wrap { trim: true }).block(rounded(theme));
  frame.render_widget(paragraph, area);
}

fn render_grid(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let lang = app.ui.lang;
  let align = text_alignment(lang);
  // Inner width: area minus 2 borders minus 2 chars for highlight symbol ("▶ ")
  let inner_w = area.width.saturating_sub(4) as usize;

  let mut area = area;
  if let Some(header) = &app.letter {
    let intro_h = if header.intro.is_empty() { 0 } else { 1 };
    let forms_h = if header.forms.is_empty() { 0 } else { 1 };
    let [header_area, rest] =
      Layout::vertical([Constraint::Length(1 + intro_h + forms_h), Constraint::Min(3)]).areas(area);
    let mut lines =
      vec![Line::from(Span::styled(header.name.clone(), Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)))];
    if !header.intro.is_empty() {
      lines.push(Line::from(Span::styled(truncate_str(&header.intro, area.width as usize), Style::default().fg(theme.fg))));
    }
    if !header.forms.is_empty() {
      lines.push(Line::from(Span::styled(header.forms.join("  "), Style::default().fg(theme.muted))));
    }
    frame.render_widget(Paragraph::new(lines).alignment(align), header_area);
    area = rest;
  }

  let mut content_idx = 0usize;
  let items: Vec<ListItem> = app
    .grid
    .cells
    .iter()
    .map(|cell| match cell {
      Cell::Video(card) => {
        content_idx += 1;
        let bg = if content_idx % 2 == 0 { theme.stripe_bg } else { theme.bg };
        let right = card.time_label.clone().unwrap_or_default();
        let marker = if card.aspect == Aspect::Portrait { "▯ " } else { "" };
        let (title, gap) = fit_row(&format!("{}{}", marker, card.title), &right, inner_w);
        let spans = if lang.is_rtl() {
          vec![
            Span::styled(right, Style::default().fg(theme.muted)),
            Span::raw(" ".repeat(gap)),
            Span::styled(title, Style::default().fg(theme.fg)),
          ]
        } else {
          vec![
            Span::styled(title, Style::default().fg(theme.fg)),
            Span::raw(" ".repeat(gap)),
            Span::styled(right, Style::default().fg(theme.muted)),
          ]
        };
        ListItem::new(Line::from(spans)).bg(bg)
      }
      Cell::Playlist(card) => {
        content_idx += 1;
        let bg = if content_idx % 2 == 0 { theme.stripe_bg } else { theme.bg };
        let text = format!("☰ {}  ·  {}", card.title, card.count_label);
        ListItem::new(Line::from(Span::styled(truncate_str(&text, inner_w), Style::default().fg(theme.fg))).alignment(align))
          .bg(bg)
      }
      Cell::Ad => ListItem::new(
        Line::from(Span::styled(format!("── {} ──", Label::Ad.text(lang)), Style::default().fg(theme.ad_fg)))
          .alignment(Alignment::Center),
      ),
      Cell::NoResults(text) => {
        ListItem::new(Line::from(Span::styled(*text, Style::default().fg(theme.muted))).alignment(Alignment::Center))
      }
    })
    .collect();

  let mut title = format!(" {} ", app.ui.category.key());
  if !app.ui.query.is_empty() {
    title = format!(" {} · \"{}\" ", app.ui.category.key(), app.ui.query);
  }
  let block = rounded(theme).title(title).title_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD));
  let block = if app.grid.load_more {
    block.title_bottom(Line::from(format!(" ^n {} ", Label::LoadMore.text(lang))).alignment(Alignment::Center))
  } else {
    block
  };

  let border_color = if app.mode == AppMode::Results { theme.accent } else { theme.border };
  let list = List::new(items)
    .block(block.border_style(Style::default().fg(border_color)))
    .highlight_symbol("▶ ")
    .highlight_style(Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD));

  frame.render_stateful_widget(list, area, &mut app.list_state);
}

fn render_detail(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let lang = app.ui.lang;
  let block = rounded(theme).padding(Padding::horizontal(1));

  let Some(Cell::Video(card)) = app.selected_cell() else {
    frame.render_widget(block, area);
    return;
  };
  let card: VideoCard = card.clone();

  let inner = block.inner(area);
  frame.render_widget(block, area);
  let [mut thumb_area, info_area] =
    Layout::vertical([Constraint::Percentage(60), Constraint::Percentage(40)]).areas(inner);

  // Keep 16:9 (or 9:16 for shorts) inside the available cells.
  let ratio = if card.aspect == Aspect::Portrait { 16.0 / 18.0 } else { 9.0 / 32.0 };
  let ideal_h = (thumb_area.width as f32 * ratio).round() as u16;
  if ideal_h < thumb_area.height {
    thumb_area.y += (thumb_area.height - ideal_h) / 2;
    thumb_area.height = ideal_h;
  }

  let thumb_id = app.selected_thumbnail().map(|(id, _)| id.to_string());
  if let Some(video_id) = thumb_id {
    let needs_resize = match &app.gfx.resized_thumb {
      Some((id, w, h, _)) => *id != video_id || *w != thumb_area.width || *h != thumb_area.height,
      None => true,
    };
    if needs_resize && let Some(image) = app.thumbnails.get(&video_id) {
      let target_w = thumb_area.width as u32;
      let target_h = match app.display_mode {
        DisplayMode::Direct => thumb_area.height as u32 * 2,
        _ => thumb_area.height as u32,
      };
      let resized = image.resize_to_fill(target_w.max(1), target_h.max(1), FilterType::Lanczos3);
      app.gfx.resized_thumb = Some((video_id.clone(), thumb_area.width, thumb_area.height, resized));
    }
    if app.display_mode.uses_graphics_protocol() {
      app.gfx.thumb_area = Some(thumb_area);
    } else if let Some((_, _, _, ref resized)) = app.gfx.resized_thumb {
      frame.render_widget(ThumbnailWidget { image: resized, display_mode: app.display_mode }, thumb_area);
    }
  }

  let inner_w = info_area.width as usize;
  let mut lines = vec![
    Line::from(""),
    Line::from(Span::styled(truncate_str(&card.title, inner_w), Style::default().fg(theme.fg).add_modifier(Modifier::BOLD))),
  ];
  if let Some(label) = &card.time_label {
    lines.push(Line::from(Span::styled(label.clone(), Style::default().fg(theme.muted))));
  }
  let now_playing = app.player().and_then(|p| p.current_element.as_deref()) == Some(card.element_id.as_str());
  if now_playing {
    let state = if app.player().is_some_and(|p| p.paused) { "⏸" } else { "♪" };
    lines.push(Line::from(Span::styled(state, Style::default().fg(theme.status))));
  }
  lines.push(Line::from(""));
  lines.push(Line::from(Span::styled(card.watch_label, Style::default().fg(theme.muted))));
  lines.push(Line::from(Span::styled(
    truncate_str(&card.watch_url, inner_w),
    Style::default().fg(theme.accent).add_modifier(Modifier::UNDERLINED),
  )));
  frame.render_widget(Paragraph::new(lines).alignment(text_alignment(lang)), info_area);
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let (text, style) = if let Some(msg) = &app.status_message {
    (format!(" ⏳ {}", msg), Style::default().fg(theme.status))
  } else if let Some(err) = &app.last_error {
    (format!(" ⚠  {}", err), Style::default().fg(theme.error))
  } else {
    match app.player().and_then(|p| p.get_last_mpv_status()) {
      Some(status) => (format!(" ♪ {}", status), Style::default().fg(theme.status)),
      None => {
        let shown = app.grid.content_count();
        (format!(" {} · {}", app.ui.category.key(), shown), Style::default().fg(theme.muted))
      }
    }
  };
  frame.render_widget(Paragraph::new(text).style(style), area);
}

fn render_input(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let lang = app.ui.lang;
  let border_color = if app.mode == AppMode::Input { theme.accent } else { theme.border };
  let input_block = rounded(theme)
    .title(format!(" {} ", app.ui.search_mode.icon()))
    .title_style(Style::default().fg(border_color))
    .border_style(Style::default().fg(border_color))
    .padding(Padding::horizontal(1));

  let inner_w = area.width.saturating_sub(4) as usize;
  let cursor_col = display_width(&app.input, app.cursor_position);

  if cursor_col < app.input_scroll {
    app.input_scroll = cursor_col;
  } else if cursor_col >= app.input_scroll + inner_w {
    app.input_scroll = cursor_col.saturating_sub(inner_w) + 1;
  }

  let paragraph = if app.input.is_empty() {
    Paragraph::new(truncate_str(Label::SearchPlaceholder.text(lang), inner_w))
      .style(Style::default().fg(theme.muted))
      .alignment(text_alignment(lang))
  } else {
    let visible: String = app
      .input
      .chars()
      .scan(0usize, |col, c| {
        let w = c.width().unwrap_or(0);
        let start = *col;
        *col += w;
        Some((start, *col, c))
      })
      .skip_while(|(_, end, _)| *end <= app.input_scroll)
      .take_while(|(start, _, _)| *start < app.input_scroll + inner_w)
      .map(|(_, _, c)| c)
      .collect();
    Paragraph::new(visible).style(Style::default().fg(theme.fg))
  };
  frame.render_widget(paragraph.block(input_block), area);

  if app.mode == AppMode::Input {
    let cursor_x = area.x + 2 + (cursor_col - app.input_scroll) as u16;
    frame.set_cursor_position((cursor_x, area.y + 1));
  }
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let is_playing = app.is_playing();
  let mut keys: Vec<(&str, &str)> = match app.mode {
    AppMode::Input => vec![("Enter", "Search"), ("^f", "Search/Clear"), ("Tab", "Tab")],
    AppMode::Results => vec![("Enter", "Play"), ("j/k", "Navigate"), ("Tab", "Tab")],
  };
  if app.grid.load_more {
    keys.push(("^n", "More"));
  }
  if is_playing {
    let pause_label = if app.player().is_some_and(|p| p.paused) { "Resume" } else { "Pause" };
    if app.mode == AppMode::Results {
      keys.push(("Space", pause_label));
    }
    keys.push(("^s", "Stop"));
  }
  keys.extend([("^l", "Lang"), ("^b", "Letters"), ("^o", "Open"), ("^t", "Theme")]);

  let spans: Vec<Span> = keys
    .iter()
    .enumerate()
    .flat_map(|(i, (key, action))| {
      let mut s = vec![
        Span::styled(format!(" {} ", key), Style::default().fg(theme.key_fg).bg(theme.key_bg)),
        Span::styled(format!(" {} ", action), Style::default().fg(theme.muted)),
      ];
      if i < keys.len() - 1 {
        s.push(Span::raw(" "));
      }
      s
    })
    .collect();

  frame.render_widget(Line::from(spans), area);

  let theme_label = format!("{} ", theme.name);
  let right = Line::from(Span::styled(&theme_label, Style::default().fg(theme.muted)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(theme_label.len() as u16), width: theme_label.len() as u16, ..area };
  frame.render_widget(right, right_area);
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn truncate_keeps_short_strings() {
    assert_eq!(truncate_str("Alif", 10), "Alif");
    assert_eq!(truncate_str("Alphabet song", 6), "Alpha…");
    assert_eq!(truncate_str("حرف الباء", 4), "حرف…");
  }

  #[test]
  fn truncate_counts_columns_not_chars() {
    assert_eq!(truncate_str("日本語の歌", 5), "日本…");
    assert!(truncate_str("日本語の歌", 5).width() <= 5);
  }

  #[test]
  fn rows_pad_to_exact_width_with_wide_text() {
    for (title, right) in [("▯ Alif", "3 days"), ("日本語の歌", "5 min"), ("🎵 song 🎵", "منذ لحظات")] {
      let (fitted, gap) = fit_row(title, right, 30);
      assert_eq!(fitted.width() + gap + right.width(), 30, "{title}");
    }
    let (fitted, gap) = fit_row("日本語の歌日本語の歌日本語の歌", "1 hr", 16);
    assert!(fitted.ends_with('…'));
    assert_eq!(fitted.width() + gap + "1 hr".width(), 16);
  }

  #[test]
  fn display_width_counts_wide_chars() {
    assert_eq!(display_width("abc", 2), 2);
    assert_eq!(display_width("日本", 2), 4);
  }

  #[test]
  fn arabic_aligns_right() {
    assert_eq!(text_alignment(Lang::Ar), Alignment::Right);
    assert_eq!(text_alignment(Lang::En), Alignment::Left);
  }
}
