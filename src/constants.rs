//! Application constants loaded from `constants.ron` at compile time.
//!
//! The RON file is embedded via `include_str!` so it's always available,
//! with no runtime file I/O. Parsed once on first access via `LazyLock`.

use serde::Deserialize;
use std::sync::LazyLock;

/// All tuneable application constants.
#[derive(Debug, Deserialize)]
pub struct Constants {
  pub channel_handle: String,
  pub channel_name: String,

  // Content document
  pub content_source: String,

  // Pagination
  /// Visible-count cursor on first render.
  pub initial_visible: usize,
  /// Visible-count cursor after a tab switch.
  pub tab_visible: usize,
  pub load_more_step: usize,

  // Grid policies
  pub short_marker: String,

  // YouTube
  pub embed_base: String,
  pub watch_base: String,
  pub iframe_api_src: String,

  // Ads
  pub ad_client: String,
  pub ad_slot: String,
}

static CONSTANTS: LazyLock<Constants> = LazyLock::new(|| {
  // Safety: the RON file is embedded at compile time; if it's malformed this is a build-time error.
  ron::from_str(include_str!("../constants.ron")).expect("constants.ron must be valid RON (embedded at compile time)")
});

/// Returns a reference to the parsed application constants.
pub fn constants() -> &'static Constants {
  &CONSTANTS
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn embedded_constants_parse() {
    let c = constants();
    assert_eq!(c.initial_visible, 18);
    assert_eq!(c.tab_visible, 12);
    assert_eq!(c.load_more_step, 12);
    assert!(c.embed_base.ends_with("/embed/"));
  }
}
