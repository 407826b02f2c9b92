use std::collections::HashMap;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// One catalog entry. Fields that are missing or of the wrong JSON type
/// deserialize to their empty value instead of failing the record.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Story {
    #[serde(deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(deserialize_with = "lenient_string")]
    pub category: String,
    #[serde(deserialize_with = "lenient_string")]
    pub cover: String,
    #[serde(deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(deserialize_with = "lenient_string")]
    pub updated: String,
    #[serde(rename = "updatedAt", deserialize_with = "lenient_timestamp")]
    pub updated_at: i64,
    pub chapters: Chapters,
}

impl Story {
    pub fn last_chapter(&self) -> Option<&str> {
        self.chapters.last_key()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chapter {
    pub key: String,
    pub data: Value,
}

/// Chapter index in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chapters(Vec<Chapter>);

impl Chapters {
    pub fn new(chapters: Vec<Chapter>) -> Self {
        Self(chapters)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|chapter| chapter.key.as_str())
    }

    pub fn last_key(&self) -> Option<&str> {
        self.0.last().map(|chapter| chapter.key.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&Chapter> {
        self.0.iter().find(|chapter| chapter.key == key)
    }
}

impl<'de> Deserialize<'de> for Chapters {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let chapters = match Value::deserialize(deserializer)? {
            Value::Object(map) => map
                .into_iter()
                .map(|(key, data)| Chapter { key, data })
                .collect(),
            _ => Vec::new(),
        };
        Ok(Self(chapters))
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        _ => String::new(),
    })
}

fn lenient_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let parsed = match &value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
        }
        _ => None,
    };
    Ok(parsed.unwrap_or(0))
}

/// Read-only id → story index that keeps document order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    stories: Vec<Story>,
    by_id: HashMap<String, usize>,
}

impl Catalog {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    pub fn get(&self, id: &str) -> Option<&Story> {
        self.by_id.get(id).and_then(|idx| self.stories.get(*idx))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Story> {
        self.stories.iter()
    }

    pub fn len(&self) -> usize {
        self.stories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stories.is_empty()
    }
}

impl FromIterator<Story> for Catalog {
    fn from_iter<I: IntoIterator<Item = Story>>(iter: I) -> Self {
        let mut builder = Catalog::builder();
        for story in iter {
            builder.push(story);
        }
        builder.finish()
    }
}

#[derive(Debug, Default)]
pub struct CatalogBuilder {
    catalog: Catalog,
}

impl CatalogBuilder {
    /// Adds `story` unless its id is already taken; returns whether it was added.
    pub fn push(&mut self, story: Story) -> bool {
        if self.catalog.by_id.contains_key(&story.id) {
            return false;
        }
        self.catalog
            .by_id
            .insert(story.id.clone(), self.catalog.stories.len());
        self.catalog.stories.push(story);
        true
    }

    pub fn finish(self) -> Catalog {
        self.catalog
    }
}
