use ratatui::style::Color;

pub struct Theme {
  pub name: &'static str,
  pub bg: Color,
  pub fg: Color,
  pub accent: Color,
  pub muted: Color,
  pub border: Color,
  pub highlight_fg: Color,
  pub highlight_bg: Color,
  pub stripe_bg: Color,
  pub ad_fg: Color,
  pub status: Color,
  pub error: Color,
  pub key_fg: Color,
  pub key_bg: Color,
}

pub static THEMES: [Theme; 3] = [
  // Matches the page's light palette.
  Theme {
    name: "Playroom",
    bg: Color::Rgb(250, 250, 252),
    fg: Color::Rgb(31, 41, 55),
    accent: Color::Rgb(239, 68, 68),
    muted: Color::Rgb(107, 114, 128),
    border: Color::Rgb(209, 213, 219),
    highlight_fg: Color::Rgb(255, 255, 255),
    highlight_bg: Color::Rgb(239, 68, 68),
    stripe_bg: Color::Rgb(243, 244, 246),
    ad_fg: Color::Rgb(156, 163, 175),
    status: Color::Rgb(37, 99, 235),
    error: Color::Rgb(220, 38, 38),
    key_fg: Color::Rgb(255, 255, 255),
    key_bg: Color::Rgb(75, 85, 99),
  },
  Theme {
    name: "Night",
    bg: Color::Rgb(17, 24, 39),
    fg: Color::Rgb(229, 231, 235),
    accent: Color::Rgb(251, 191, 36),
    muted: Color::Rgb(156, 163, 175),
    border: Color::Rgb(55, 65, 81),
    highlight_fg: Color::Rgb(17, 24, 39),
    highlight_bg: Color::Rgb(251, 191, 36),
    stripe_bg: Color::Rgb(31, 41, 55),
    ad_fg: Color::Rgb(107, 114, 128),
    status: Color::Rgb(96, 165, 250),
    error: Color::Rgb(248, 113, 113),
    key_fg: Color::Rgb(17, 24, 39),
    key_bg: Color::Rgb(156, 163, 175),
  },
  Theme {
    name: "Crayon",
    bg: Color::Rgb(255, 251, 235),
    fg: Color::Rgb(68, 64, 60),
    accent: Color::Rgb(22, 163, 74),
    muted: Color::Rgb(120, 113, 108),
    border: Color::Rgb(253, 186, 116),
    highlight_fg: Color::Rgb(255, 255, 255),
    highlight_bg: Color::Rgb(37, 99, 235),
    stripe_bg: Color::Rgb(254, 243, 199),
    ad_fg: Color::Rgb(168, 162, 158),
    status: Color::Rgb(147, 51, 234),
    error: Color::Rgb(225, 29, 72),
    key_fg: Color::Rgb(255, 255, 255),
    key_bg: Color::Rgb(234, 88, 12),
  },
];

pub fn index_of(name: &str) -> Option<usize> {
  THEMES.iter().position(|t| t.name == name)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn theme_names_are_unique() {
    for (i, theme) in THEMES.iter().enumerate() {
      assert_eq!(index_of(theme.name), Some(i));
    }
    assert_eq!(index_of("Missing"), None);
  }
}
