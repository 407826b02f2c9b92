//! Test helpers and fixtures.

use serde_json::{Value, json};
use storyshelf_application::BrowseSession;
use storyshelf_core::{Catalog, Chapter, Chapters, Settings, Story};

pub fn make_settings(page_size: usize) -> Settings {
    Settings {
        page_size,
        ..Settings::default()
    }
}

pub fn make_story(id: &str, title: &str, category: &str, updated_at: i64) -> Story {
    Story {
        id: id.to_string(),
        title: title.to_string(),
        category: category.to_string(),
        updated_at,
        chapters: Chapters::new(vec![Chapter {
            key: "Chương 1".to_string(),
            data: Value::Null,
        }]),
        ..Story::default()
    }
}

/// `count` stories `s0..` titled `Story N`, all in `category`.
pub fn make_catalog(count: usize, category: &str) -> Catalog {
    (0..count)
        .map(|i| make_story(&format!("s{i}"), &format!("Story {i}"), category, i as i64))
        .collect()
}

pub fn make_session(catalog: Catalog) -> BrowseSession {
    BrowseSession::new(Settings::default()).with_catalog(catalog)
}

/// A small catalog document shaped like the ones the site publishes.
pub fn sample_document() -> Value {
    json!({
        "tien-nghich": {
            "id": "tien-nghich",
            "title": "Tiên Nghịch",
            "category": "Tiên Hiệp",
            "cover": "images/tien-nghich.jpg",
            "description": "Vương Lâm bước vào con đường tu tiên.",
            "updated": "2024-03-01",
            "updatedAt": 1709251200,
            "chapters": {
                "Chương 1": {"title": "Khởi đầu"},
                "Chương 2": {"title": "Nhập môn"},
                "Chương 3": {"title": "Trúc cơ"}
            }
        },
        "epee": {
            "id": "epee",
            "title": "Épée",
            "category": "Kiếm Hiệp",
            "updatedAt": "1709337600",
            "chapters": {"Hồi 1": {}}
        },
        "dau-pha": {
            "id": "dau-pha",
            "title": "Đấu Phá Thương Khung",
            "category": "Huyền Huyễn",
            "updatedAt": 1700000000.9,
            "chapters": {}
        },
        "no-date": {
            "id": "no-date",
            "title": "Không Ngày",
            "category": "Tiên Hiệp"
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_settings() {
        let settings = make_settings(7);
        assert_eq!(settings.page_size, 7);
    }

    #[test]
    fn builds_catalog() {
        let catalog = make_catalog(3, "Fantasy");
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.get("s2").map(|s| s.updated_at), Some(2));
    }
}
