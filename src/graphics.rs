use anyhow::{Context, Result};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use color_quant::NeuQuant;
use image::{DynamicImage, ImageFormat, imageops::FilterType};
use ratatui::{
  buffer::Buffer,
  layout::Rect,
  style::{Color, Style},
  widgets::Widget,
};
use std::fmt::Write as _;
use std::io::{Cursor, Write};

use crate::display::DisplayMode;

// --- Thumbnail Widget ---

/// Draws a pre-sized thumbnail into the frame buffer. Kitty and Sixel images
/// are written to the terminal separately with [`paint`].
pub struct ThumbnailWidget<'a> {
  pub image: &'a DynamicImage,
  pub display_mode: DisplayMode,
}

const ASCII_RAMP: &[u8] = b" .:-=+*#%@";

impl Widget for ThumbnailWidget<'_> {
  fn render(self, area: Rect, buf: &mut Buffer) {
    if area.is_empty() {
      return;
    }
    match self.display_mode {
      DisplayMode::Direct => half_blocks(self.image, area, buf),
      DisplayMode::Ascii => ascii(self.image, area, buf),
      DisplayMode::Kitty | DisplayMode::Sixel => {}
    }
  }
}

/// Top-left cell that centers a `w`x`h` cell block inside `area`.
fn centered_origin(area: Rect, w: u32, h: u32) -> (u16, u16) {
  let dx = (area.width as u32).saturating_sub(w) / 2;
  let dy = (area.height as u32).saturating_sub(h) / 2;
  (area.x.saturating_add(dx as u16), area.y.saturating_add(dy as u16))
}

/// Two pixels per cell using the upper half block: fg is the top pixel, bg the bottom.
fn half_blocks(image: &DynamicImage, area: Rect, buf: &mut Buffer) {
  let rgb = image.to_rgb8();
  let w = rgb.width().min(area.width as u32);
  let rows = rgb.height().div_ceil(2).min(area.height as u32);
  let (x0, y0) = centered_origin(area, w, rows);

  for row in 0..rows {
    for x in 0..w {
      let top = rgb.get_pixel(x, row * 2);
      let bottom = if row * 2 + 1 < rgb.height() {
        let p = rgb.get_pixel(x, row * 2 + 1);
        Color::Rgb(p[0], p[1], p[2])
      } else {
        Color::Reset
      };
      buf.set_string(
        x0.saturating_add(x as u16),
        y0.saturating_add(row as u16),
        "▀",
        Style::default().fg(Color::Rgb(top[0], top[1], top[2])).bg(bottom),
      );
    }
  }
}

pub fn ascii_glyph(luma: u8) -> char {
  let idx = (luma as usize * (ASCII_RAMP.len() - 1) + 127) / 255;
  ASCII_RAMP[idx.min(ASCII_RAMP.len() - 1)] as char
}

fn ascii(image: &DynamicImage, area: Rect, buf: &mut Buffer) {
  let gray = image.to_luma8();
  let w = gray.width().min(area.width as u32);
  let h = gray.height().min(area.height as u32);
  let (x0, y0) = centered_origin(area, w, h);

  for y in 0..h {
    let line: String = (0..w).map(|x| ascii_glyph(gray.get_pixel(x, y)[0])).collect();
    buf.set_string(x0, y0.saturating_add(y as u16), line, Style::default());
  }
}

// --- Terminal graphics protocols ---
//
// Kitty: the PNG is base64'd and sent in <=4096-byte APC chunks
// (`\x1B_G<keys>;<data>\x1B\\`, `m=1` while more follow). `i=1,p=1` makes a
// re-send replace the previous thumbnail in place; `c`/`r` scale it over the
// target cells.
//
// Sixel: DCS `\x1BPq ... \x1B\\`. A palette of up to 256 registers
// (`#n;2;r;g;b`, percentages) from NeuQuant, then one band per 6 pixel rows:
// for every register used in the band, `#n` and one char per column
// (0x3F + 6-bit mask), `$` to rewind, `-` to advance. Runs over 3 use `!<n><ch>`.

const KITTY_CHUNK_SIZE: usize = 4096;
const SIXEL_COLORS: usize = 256;
/// Approximate cell size in pixels used to size sixel output.
const CELL_PX: (u32, u32) = (8, 16);

pub fn kitty_sequence(image: &DynamicImage, cols: u16, rows: u16) -> Result<String> {
  let mut png = Vec::new();
  image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png).context("Failed to encode thumbnail as PNG")?;
  let b64 = BASE64.encode(&png);

  let chunks: Vec<&str> = b64
    .as_bytes()
    .chunks(KITTY_CHUNK_SIZE)
    .map(std::str::from_utf8)
    .collect::<Result<_, _>>()
    .context("base64 chunk was not valid UTF-8")?;
  let last = chunks.len().saturating_sub(1);

  let mut out = String::with_capacity(b64.len() + chunks.len() * 16);
  for (i, chunk) in chunks.iter().enumerate() {
    let more = u8::from(i < last);
    if i == 0 {
      let _ = write!(out, "\x1B_Ga=T,f=100,t=d,i=1,p=1,c={cols},r={rows},q=2,m={more};{chunk}\x1B\\");
    } else {
      let _ = write!(out, "\x1B_Gm={more};{chunk}\x1B\\");
    }
  }
  Ok(out)
}

pub const KITTY_DELETE_ALL: &str = "\x1B_Ga=d,d=a,q=2\x1B\\";

pub fn sixel_sequence(image: &DynamicImage, cols: u16, rows: u16) -> String {
  let img = image.resize_to_fill(cols as u32 * CELL_PX.0, rows as u32 * CELL_PX.1, FilterType::Lanczos3).into_rgb8();
  let (w, h) = (img.width() as usize, img.height() as usize);

  let rgba: Vec<u8> = img.pixels().flat_map(|p| [p[0], p[1], p[2], 255]).collect();
  let nq = NeuQuant::new(3, SIXEL_COLORS, &rgba);
  let palette = nq.color_map_rgb();
  let registers = palette.len() / 3;
  let indices: Vec<usize> = img.pixels().map(|p| nq.index_of(&[p[0], p[1], p[2], 255])).collect();

  let mut out = String::with_capacity(w * h / 2);
  let _ = write!(out, "\x1BPq\"1;1;{w};{h}");
  for (n, rgb) in palette.chunks_exact(3).enumerate() {
    let pct = |c: u8| c as u32 * 100 / 255;
    let _ = write!(out, "#{n};2;{};{};{}", pct(rgb[0]), pct(rgb[1]), pct(rgb[2]));
  }

  let mut band = vec![0u8; w];
  for y0 in (0..h).step_by(6) {
    for register in 0..registers {
      band.fill(0);
      let mut used = false;
      for (bit, y) in (y0..(y0 + 6).min(h)).enumerate() {
        for (x, mask) in band.iter_mut().enumerate() {
          if indices[y * w + x] == register {
            *mask |= 1 << bit;
            used = true;
          }
        }
      }
      if !used {
        continue;
      }
      let _ = write!(out, "#{register}");
      push_sixel_runs(&mut out, &band);
      out.push('$');
    }
    out.push('-');
  }
  out.push_str("\x1B\\");
  out
}

fn push_sixel_runs(out: &mut String, band: &[u8]) {
  let mut i = 0;
  while i < band.len() {
    let mask = band[i];
    let run = band[i..].iter().take_while(|&&m| m == mask).count();
    let ch = (mask + 0x3F) as char;
    if run > 3 {
      let _ = write!(out, "!{run}{ch}");
    } else {
      out.extend(std::iter::repeat_n(ch, run));
    }
    i += run;
  }
}

/// Write a protocol image over `area`. Other modes draw through [`ThumbnailWidget`].
pub fn paint(mode: DisplayMode, image: &DynamicImage, area: Rect) -> Result<()> {
  if area.is_empty() {
    return Ok(());
  }
  let body = match mode {
    DisplayMode::Kitty => format!("{KITTY_DELETE_ALL}{}", kitty_sequence(image, area.width, area.height)?),
    DisplayMode::Sixel => sixel_sequence(image, area.width, area.height),
    DisplayMode::Direct | DisplayMode::Ascii => return Ok(()),
  };
  let mut stdout = std::io::stdout();
  write!(stdout, "\x1B[{};{}H{}", area.y.saturating_add(1), area.x.saturating_add(1), body)
    .context("Failed to write thumbnail image")?;
  stdout.flush().context("Failed to flush thumbnail image")
}

/// Remove protocol images, e.g. when the thumbnail pane goes away or on exit.
pub fn clear(mode: DisplayMode) -> Result<()> {
  if mode != DisplayMode::Kitty {
    return Ok(());
  }
  let mut stdout = std::io::stdout();
  stdout.write_all(KITTY_DELETE_ALL.as_bytes()).context("Failed to write kitty delete")?;
  stdout.flush().context("Failed to flush kitty delete")
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::{Rgb, RgbImage};

  fn solid(w: u32, h: u32, rgb: [u8; 3]) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb(rgb)))
  }

  #[test]
  fn ascii_ramp_ends() {
    assert_eq!(ascii_glyph(0), ' ');
    assert_eq!(ascii_glyph(255), '@');
  }

  #[test]
  fn half_blocks_fill_centered_cells() {
    let img = solid(4, 4, [200, 10, 10]);
    let area = Rect::new(0, 0, 8, 4);
    let mut buf = Buffer::empty(area);
    ThumbnailWidget { image: &img, display_mode: DisplayMode::Direct }.render(area, &mut buf);
    // 4 px wide, 2 rows tall, centered in 8x4
    assert_eq!(buf[(2, 1)].symbol(), "▀");
    assert_eq!(buf[(2, 1)].fg, Color::Rgb(200, 10, 10));
    assert_eq!(buf[(0, 0)].symbol(), " ");
  }

  #[test]
  fn kitty_chunks_carry_continuation_flags() {
    let img = solid(64, 64, [1, 2, 3]);
    let seq = kitty_sequence(&img, 10, 5).unwrap();
    assert!(seq.starts_with("\x1B_Ga=T,f=100,t=d,i=1,p=1,c=10,r=5,q=2,m="));
    assert!(seq.ends_with("\x1B\\"));
    let last_start = seq.rfind("\x1B_G").unwrap();
    assert!(seq[last_start..].contains("m=0;"));
  }

  #[test]
  fn sixel_sequence_is_framed_and_compressed() {
    let img = solid(16, 16, [0, 128, 255]);
    let seq = sixel_sequence(&img, 4, 2);
    assert!(seq.starts_with("\x1BPq\"1;1;32;32"));
    assert!(seq.ends_with("\x1B\\"));
    // a solid image is one long run per band
    assert!(seq.contains("!32~"));
  }

  #[test]
  fn sixel_runs_compress_only_past_three() {
    let mut out = String::new();
    push_sixel_runs(&mut out, &[1, 1, 1, 0, 0, 0, 0]);
    assert_eq!(out, "@@@!4?");
  }
}
