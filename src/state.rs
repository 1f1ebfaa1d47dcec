//! Session UI state and the operations that move it.
//!
//! Each user action (search, tab switch, load more, language toggle) is a
//! method here; the caller re-renders afterwards with [`UiState::refresh`].

use crate::catalog::{self, Category, Page};
use crate::constants::constants;
use crate::content::ContentDocument;
use crate::locale::{CLEAR_ICON, Lang, SEARCH_ICON};

/// What the search button does when pressed next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
  Search,
  Clear,
}

impl SearchMode {
  pub fn icon(self) -> &'static str {
    match self {
      SearchMode::Search => SEARCH_ICON,
      SearchMode::Clear => CLEAR_ICON,
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UiState {
  pub lang: Lang,
  pub category: Category,
  /// The applied search text.
  pub query: String,
  /// Visible-count cursor.
  pub visible: usize,
  pub search_mode: SearchMode,
  /// Full filtered id sequence of the last refresh, used to pick what plays next.
  pub autoplay: Vec<String>,
}

impl UiState {
  pub fn new(lang: Lang, category: Category) -> Self {
    Self {
      lang,
      category,
      query: String::new(),
      visible: constants().initial_visible,
      search_mode: SearchMode::Search,
      autoplay: Vec::new(),
    }
  }

  /// Run the filter/paginate engine for the current state and record its autoplay sequence.
  pub fn refresh<'a>(&mut self, doc: &'a ContentDocument) -> Page<'a> {
    let page = catalog::paginate(doc, &self.category, &self.query, self.visible);
    self.autoplay = page.autoplay.clone();
    page
  }

  /// Activate a tab: resets the cursor to its baseline and clears the search.
  pub fn switch_tab(&mut self, category: Category) {
    self.category = category;
    self.visible = constants().tab_visible;
    self.query.clear();
    self.search_mode = SearchMode::Search;
  }

  pub fn load_more(&mut self) {
    self.visible += constants().load_more_step;
  }

  /// Press the search button with `text` in the search box.
  ///
  /// In search mode the text becomes the query; in clear mode the query is
  /// emptied. Returns the text the search box should show afterwards.
  pub fn press_search(&mut self, text: &str) -> String {
    match self.search_mode {
      SearchMode::Search => {
        self.query = text.to_string();
        self.search_mode = SearchMode::Clear;
        text.to_string()
      }
      SearchMode::Clear => {
        self.query.clear();
        self.search_mode = SearchMode::Search;
        String::new()
      }
    }
  }

  /// Enter in the search box only acts while the button is in search mode.
  pub fn submit_search(&mut self, text: &str) -> bool {
    if self.search_mode != SearchMode::Search {
      return false;
    }
    self.press_search(text);
    true
  }

  pub fn toggle_lang(&mut self) -> Lang {
    self.lang = self.lang.toggled();
    self.lang
  }
}
