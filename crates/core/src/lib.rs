//! Core domain types for Storyshelf.

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization as _;

mod story;

pub use story::{Catalog, CatalogBuilder, Chapter, Chapters, Story};

/// Category selector value meaning "no category filter".
pub const ALL_CATEGORIES: &str = "__all__";

pub const DEFAULT_DATA_SOURCE: &str = "./data/stories.json";
pub const DEFAULT_READER_BASE: &str = "reader.html";
pub const DEFAULT_PAGE_SIZE: usize = 14;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data_source: String,
    pub site_root: String,
    pub page_size: usize,
    pub updates_limit: Option<usize>,
    pub reader_base: String,
    pub open_command: Option<String>,
    pub theme: Theme,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Theme {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err("unknown theme"),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_source: DEFAULT_DATA_SOURCE.to_string(),
            site_root: ".".to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            updates_limit: None,
            reader_base: DEFAULT_READER_BASE.to_string(),
            open_command: None,
            theme: Theme::Dark,
        }
    }
}

impl Settings {
    pub fn normalize(&mut self) {
        self.page_size = self.page_size.clamp(1, 200);
        self.data_source = self.data_source.trim().to_string();
        if self.data_source.is_empty() {
            self.data_source = DEFAULT_DATA_SOURCE.to_string();
        }
        self.site_root = self.site_root.trim().to_string();
        if self.site_root.is_empty() {
            self.site_root = ".".to_string();
        }
        self.reader_base = self.reader_base.trim().to_string();
        if self.reader_base.is_empty() {
            self.reader_base = DEFAULT_READER_BASE.to_string();
        }
        self.open_command = self
            .open_command
            .take()
            .map(|cmd| cmd.trim().to_string())
            .filter(|cmd| !cmd.is_empty());
        if self.updates_limit == Some(0) {
            self.updates_limit = None;
        }
    }

    pub fn cycle_theme(&mut self) {
        self.theme = match self.theme {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        };
    }
}

/// Lower-cases `value` and strips combining diacritical marks so that
/// "Épée" and "epee" compare equal.
pub fn normalize_for_search(value: &str) -> String {
    value
        .to_lowercase()
        .nfd()
        .filter(|c| !('\u{0300}'..='\u{036f}').contains(c))
        .collect()
}

/// Target of the reader hand-off: one chapter of one story.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderLink {
    pub story: String,
    pub chapter: String,
}

impl ReaderLink {
    pub fn to_url(&self, base: &str) -> String {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("story", &self.story)
            .append_pair("chap", &self.chapter)
            .finish();
        let sep = if base.contains('?') { '&' } else { '?' };
        format!("{base}{sep}{query}")
    }
}
