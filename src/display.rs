use clap::ValueEnum;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CliDisplayMode {
  Auto,
  Kitty,
  Sixel,
  Direct,
  Ascii,
}

/// How thumbnails are drawn in the detail pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
  Ascii,
  Direct,
  Sixel,
  Kitty,
}

impl DisplayMode {
  pub fn label(self) -> &'static str {
    match self {
      DisplayMode::Ascii => "ASCII",
      DisplayMode::Direct => "Half-block",
      DisplayMode::Sixel => "Sixel",
      DisplayMode::Kitty => "Kitty",
    }
  }

  /// Drawn by writing escape sequences straight to the terminal after the frame.
  pub fn uses_graphics_protocol(self) -> bool {
    matches!(self, DisplayMode::Kitty | DisplayMode::Sixel)
  }
}

/// Pick a mode from the terminal's environment variables.
///
/// Kitty graphics > Sixel > true-color half-block > ASCII.
fn detect_from(term: &str, term_program: &str, colorterm: &str) -> DisplayMode {
  let term_program = term_program.to_lowercase();
  if term == "xterm-kitty" || matches!(term_program.as_str(), "kitty" | "wezterm" | "ghostty") {
    return DisplayMode::Kitty;
  }
  if matches!(term_program.as_str(), "foot" | "mlterm" | "contour") || term.contains("sixel") {
    return DisplayMode::Sixel;
  }
  match colorterm.to_lowercase().as_str() {
    "truecolor" | "24bit" => DisplayMode::Direct,
    _ => DisplayMode::Ascii,
  }
}

pub fn detect_display_mode() -> DisplayMode {
  let var = |name: &str| std::env::var(name).unwrap_or_default();
  detect_from(&var("TERM"), &var("TERM_PROGRAM"), &var("COLORTERM"))
}

pub fn resolve_display_mode(cli: CliDisplayMode) -> DisplayMode {
  match cli {
    CliDisplayMode::Auto => detect_display_mode(),
    CliDisplayMode::Kitty => DisplayMode::Kitty,
    CliDisplayMode::Sixel => DisplayMode::Sixel,
    CliDisplayMode::Direct => DisplayMode::Direct,
    CliDisplayMode::Ascii => DisplayMode::Ascii,
  }
}
