//! Arabic/English strings, text direction, and relative time labels.

use chrono::{DateTime, Utc};
use clap::ValueEnum;

// --- Language ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Lang {
  #[default]
  Ar,
  En,
}

impl Lang {
  pub fn code(self) -> &'static str {
    match self {
      Lang::Ar => "ar",
      Lang::En => "en",
    }
  }

  pub fn from_code(code: &str) -> Option<Self> {
    match code.trim().to_lowercase().as_str() {
      "ar" => Some(Lang::Ar),
      "en" => Some(Lang::En),
      _ => None,
    }
  }

  pub fn toggled(self) -> Self {
    match self {
      Lang::Ar => Lang::En,
      Lang::En => Lang::Ar,
    }
  }

  pub fn is_rtl(self) -> bool {
    self == Lang::Ar
  }

  /// Value for the document's `dir` attribute.
  pub fn dir(self) -> &'static str {
    if self.is_rtl() { "rtl" } else { "ltr" }
  }
}

// --- Labels ---

/// Every translated string the UI shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
  LangToggle,
  SearchPlaceholder,
  TabVideos,
  TabShorts,
  TabPlaylists,
  LoadMore,
  Loading,
  LoadFailed,
  NoResults,
  WatchOnYouTube,
  DefaultTitle,
  Ad,
}

/// Glyphs on the search button; the same in both languages.
pub const SEARCH_ICON: &str = "🔍";
pub const CLEAR_ICON: &str = "✖️";

impl Label {
  /// Labels bound to a fixed page element, rewritten on every language toggle.
  pub const STATIC: [Label; 7] = [
    Label::LangToggle,
    Label::SearchPlaceholder,
    Label::TabVideos,
    Label::TabShorts,
    Label::TabPlaylists,
    Label::LoadMore,
    Label::Loading,
  ];

  pub fn element_id(self) -> Option<&'static str> {
    match self {
      Label::LangToggle => Some("langToggle"),
      Label::SearchPlaceholder => Some("q"),
      Label::TabVideos => Some("tabVideos"),
      Label::TabShorts => Some("tabShorts"),
      Label::TabPlaylists => Some("tabPlaylists"),
      Label::LoadMore => Some("loadMore"),
      Label::Loading => Some("loading"),
      _ => None,
    }
  }

  pub fn text(self, lang: Lang) -> &'static str {
    match (self, lang) {
      // The toggle names the language it switches to.
      (Label::LangToggle, Lang::Ar) => "English",
      (Label::LangToggle, Lang::En) => "العربية",
      (Label::SearchPlaceholder, Lang::Ar) => "ابحث عن حرف، عنوان أو وصف (مثال: الألف)",
      (Label::SearchPlaceholder, Lang::En) => "Search for letter, title or description (e.g. Alif)",
      (Label::TabVideos, Lang::Ar) => "🎬 الفيديوهات",
      (Label::TabVideos, Lang::En) => "🎬 Videos",
      (Label::TabShorts, Lang::Ar) => "📱 الشورتات",
      (Label::TabShorts, Lang::En) => "📱 Shorts",
      (Label::TabPlaylists, Lang::Ar) => "🎵 القوائم",
      (Label::TabPlaylists, Lang::En) => "🎵 Playlists",
      (Label::LoadMore, Lang::Ar) => "تحميل المزيد",
      (Label::LoadMore, Lang::En) => "Load more",
      (Label::Loading, Lang::Ar) => "جارٍ التحميل…",
      (Label::Loading, Lang::En) => "Loading…",
      (Label::LoadFailed, Lang::Ar) => "تعذر تحميل المحتوى",
      (Label::LoadFailed, Lang::En) => "Failed to load content",
      (Label::NoResults, Lang::Ar) => "لا توجد نتائج.",
      (Label::NoResults, Lang::En) => "No results found.",
      (Label::WatchOnYouTube, Lang::Ar) => "شاهد على يوتيوب",
      (Label::WatchOnYouTube, Lang::En) => "Watch on YouTube",
      (Label::DefaultTitle, Lang::Ar) => "KJ Kids - فيديو",
      (Label::DefaultTitle, Lang::En) => "KJ Kids - video",
      (Label::Ad, Lang::Ar) => "إعلان",
      (Label::Ad, Lang::En) => "Advertisement",
    }
  }
}

/// The text of every static label for `lang`, in [`Label::STATIC`] order.
pub fn static_labels(lang: Lang) -> Vec<(Label, &'static str)> {
  Label::STATIC.iter().map(|label| (*label, label.text(lang))).collect()
}

// --- Formatting ---

/// Relative "time since" label for a publish timestamp.
pub fn time_ago(published: DateTime<Utc>, now: DateTime<Utc>, lang: Lang) -> String {
  let diff = (now - published).num_seconds();
  if diff < 60 {
    return match lang {
      Lang::Ar => "منذ لحظات".to_string(),
      Lang::En => "moments ago".to_string(),
    };
  }
  let (n, unit) = if diff < 3600 {
    (diff / 60, if lang == Lang::Ar { "دقيقة" } else { "min" })
  } else if diff < 86_400 {
    (diff / 3600, if lang == Lang::Ar { "ساعة" } else { "hr" })
  } else {
    (diff / 86_400, if lang == Lang::Ar { "يوم" } else { "days" })
  };
  format!("{} {}", n, unit)
}

/// `12345` → `12,345`.
pub fn group_thousands(n: u64) -> String {
  let digits = n.to_string();
  let mut out = String::with_capacity(digits.len() + digits.len() / 3);
  for (i, c) in digits.chars().enumerate() {
    if i > 0 && (digits.len() - i) % 3 == 0 {
      out.push(',');
    }
    out.push(c);
  }
  out
}

pub fn subscribers(subs: u64, lang: Lang) -> String {
  match lang {
    Lang::Ar => format!("{} مشترك", group_thousands(subs)),
    Lang::En => format!("{} subs", group_thousands(subs)),
  }
}

pub fn item_count(count: u32, lang: Lang) -> String {
  match lang {
    Lang::Ar => format!("{} عنصر", count),
    Lang::En => format!("{} items", count),
  }
}
