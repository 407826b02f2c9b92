//! Catalog document loading and the read-only settings file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use serde_json::Value;
use storyshelf_core::{Catalog, Settings, Story};
use tracing::{error, info, warn};
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("fetch {url}")]
    Fetch {
        url: Url,
        #[source]
        source: reqwest::Error,
    },
    #[error("fetch {url}: http status {status}")]
    Status { url: Url, status: u16 },
    #[error("parse catalog document")]
    Parse(#[from] serde_json::Error),
    #[error("catalog document must be a JSON object or array, got {0}")]
    Shape(&'static str),
}

/// Where the catalog document lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    File(PathBuf),
    Remote(Url),
}

impl DataSource {
    /// `http(s)://` values are fetched; everything else is a file path.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        let lowered = value.to_ascii_lowercase();
        if (lowered.starts_with("http://") || lowered.starts_with("https://"))
            && let Ok(url) = Url::parse(value)
        {
            return Self::Remote(url);
        }
        Self::File(PathBuf::from(value))
    }
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataSource::File(path) => write!(f, "{}", path.display()),
            DataSource::Remote(url) => write!(f, "{url}"),
        }
    }
}

pub fn load_catalog(source: &DataSource) -> Result<Catalog, LoadError> {
    let text = match source {
        DataSource::File(path) => std::fs::read_to_string(path).map_err(|source| {
            LoadError::Read {
                path: path.clone(),
                source,
            }
        })?,
        DataSource::Remote(url) => fetch_document(url)?,
    };
    let catalog = parse_catalog(&text)?;
    info!(source = %source, stories = catalog.len(), "catalog loaded");
    Ok(catalog)
}

/// Loads the catalog, logging any failure and falling back to an empty one.
pub fn load_catalog_or_empty(source: &DataSource) -> Catalog {
    match load_catalog(source) {
        Ok(catalog) => catalog,
        Err(err) => {
            error!(source = %source, error = %format_chain(&err), "failed to load catalog");
            Catalog::empty()
        }
    }
}

fn fetch_document(url: &Url) -> Result<String, LoadError> {
    let fetch_err = |source: reqwest::Error| LoadError::Fetch {
        url: url.clone(),
        source,
    };
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .map_err(fetch_err)?;
    let resp = client
        .get(url.clone())
        .header(
            reqwest::header::USER_AGENT,
            concat!("storyshelf/", env!("CARGO_PKG_VERSION")),
        )
        .send()
        .map_err(fetch_err)?;
    if !resp.status().is_success() {
        return Err(LoadError::Status {
            url: url.clone(),
            status: resp.status().as_u16(),
        });
    }
    resp.text().map_err(fetch_err)
}

/// Builds a catalog from the document text. Records that are not objects are
/// skipped; a record without an id takes its document key.
pub fn parse_catalog(text: &str) -> Result<Catalog, LoadError> {
    let entries: Vec<(String, Value)> = match serde_json::from_str::<Value>(text)? {
        Value::Object(map) => map.into_iter().collect(),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(idx, value)| (idx.to_string(), value))
            .collect(),
        Value::Null => return Err(LoadError::Shape("null")),
        Value::Bool(_) => return Err(LoadError::Shape("a boolean")),
        Value::Number(_) => return Err(LoadError::Shape("a number")),
        Value::String(_) => return Err(LoadError::Shape("a string")),
    };

    let mut builder = Catalog::builder();
    for (key, value) in entries {
        if !value.is_object() {
            warn!(key = %key, "skipping story record that is not an object");
            continue;
        }
        let mut story: Story = match serde_json::from_value(value) {
            Ok(story) => story,
            Err(err) => {
                warn!(key = %key, error = %err, "skipping unreadable story record");
                continue;
            }
        };
        if story.id.is_empty() {
            story.id = key;
        }
        let id = story.id.clone();
        if !builder.push(story) {
            warn!(id = %id, "duplicate story id, keeping the first record");
        }
    }
    Ok(builder.finish())
}

fn format_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

/// `settings.json` in the config dir. Storyshelf only ever reads it.
#[derive(Debug, Clone)]
pub struct SettingsFile {
    path: PathBuf,
}

impl SettingsFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// `Ok(None)` when the file does not exist.
    pub fn try_load(&self) -> anyhow::Result<Option<Settings>> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("read settings {}", self.path.display()));
            }
        };
        let mut settings: Settings = serde_json::from_str(&text)
            .with_context(|| format!("parse settings {}", self.path.display()))?;
        settings.normalize();
        Ok(Some(settings))
    }

    pub fn load(&self) -> Settings {
        match self.try_load() {
            Ok(Some(settings)) => settings,
            Ok(None) => Settings::default(),
            Err(err) => {
                warn!(error = %format!("{err:#}"), "using default settings");
                Settings::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn write_temp(contents: &str) -> anyhow::Result<tempfile::NamedTempFile> {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(contents.as_bytes())?;
        Ok(file)
    }

    #[test]
    fn data_source_detects_urls() {
        assert_eq!(
            DataSource::parse("./data/stories.json"),
            DataSource::File(PathBuf::from("./data/stories.json"))
        );
        assert!(matches!(
            DataSource::parse("https://example.com/data/stories.json"),
            DataSource::Remote(_)
        ));
        assert!(matches!(
            DataSource::parse(" HTTP://example.com/s.json "),
            DataSource::Remote(_)
        ));
    }

    #[test]
    fn parses_object_document_in_order() -> anyhow::Result<()> {
        let catalog = parse_catalog(
            r#"{
                "b": {"id": "b", "title": "Bee", "updatedAt": 2},
                "a": {"id": "a", "title": "Ay", "category": "Fantasy"}
            }"#,
        )?;
        let ids: Vec<&str> = catalog.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(catalog.get("a").map(|s| s.category.as_str()), Some("Fantasy"));
        Ok(())
    }

    #[test]
    fn missing_id_falls_back_to_key() -> anyhow::Result<()> {
        let catalog = parse_catalog(r#"{"tien-nghich": {"title": "Tiên Nghịch"}}"#)?;
        assert!(catalog.get("tien-nghich").is_some());
        Ok(())
    }

    #[test]
    fn skips_non_object_records_and_duplicates() -> anyhow::Result<()> {
        let catalog = parse_catalog(
            r#"{
                "x": 5,
                "one": {"id": "dup", "title": "first"},
                "two": {"id": "dup", "title": "second"}
            }"#,
        )?;
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("dup").map(|s| s.title.as_str()), Some("first"));
        Ok(())
    }

    #[test]
    fn accepts_array_documents() -> anyhow::Result<()> {
        let catalog = parse_catalog(r#"[{"title": "zero"}, {"id": "named"}]"#)?;
        assert!(catalog.get("0").is_some());
        assert!(catalog.get("named").is_some());
        Ok(())
    }

    #[test]
    fn rejects_scalar_documents() {
        assert!(matches!(parse_catalog("42"), Err(LoadError::Shape(_))));
        assert!(matches!(parse_catalog("{oops"), Err(LoadError::Parse(_))));
    }

    #[test]
    fn loads_catalog_from_file() -> anyhow::Result<()> {
        let file = write_temp(r#"{"s1": {"id": "s1", "title": "One"}}"#)?;
        let catalog = load_catalog(&DataSource::File(file.path().to_path_buf()))?;
        assert_eq!(catalog.len(), 1);
        Ok(())
    }

    #[test]
    fn missing_file_yields_empty_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let source = DataSource::File(dir.path().join("absent.json"));
        assert!(matches!(load_catalog(&source), Err(LoadError::Read { .. })));
        assert!(load_catalog_or_empty(&source).is_empty());
    }

    #[test]
    fn settings_file_defaults_when_missing() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let file = SettingsFile::new(dir.path().join("settings.json"));
        assert!(file.try_load()?.is_none());
        assert_eq!(file.load(), Settings::default());
        Ok(())
    }

    #[test]
    fn settings_file_is_normalized() -> anyhow::Result<()> {
        let tmp = write_temp(r#"{"page_size": 0, "theme": "light", "open_command": "xdg-open"}"#)?;
        let settings = SettingsFile::new(tmp.path())
            .try_load()?
            .expect("settings present");
        assert_eq!(settings.page_size, 1);
        assert_eq!(settings.open_command.as_deref(), Some("xdg-open"));
        Ok(())
    }

    #[test]
    fn malformed_settings_fall_back_to_defaults() -> anyhow::Result<()> {
        let tmp = write_temp("not json")?;
        let file = SettingsFile::new(tmp.path());
        assert!(file.try_load().is_err());
        assert_eq!(file.load(), Settings::default());
        Ok(())
    }
}
