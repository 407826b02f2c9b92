use std::io::Write as _;

use storyshelf_application::BrowseSession;
use storyshelf_core::Settings;
use storyshelf_storage::{DataSource, LoadError, load_catalog, load_catalog_or_empty, parse_catalog};
use storyshelf_test::sample_document;

fn write_document(text: &str) -> anyhow::Result<tempfile::NamedTempFile> {
    let mut file = tempfile::NamedTempFile::new()?;
    file.write_all(text.as_bytes())?;
    Ok(file)
}

#[test]
fn loads_sample_document_from_file() -> anyhow::Result<()> {
    let file = write_document(&sample_document().to_string())?;
    let catalog = load_catalog(&DataSource::File(file.path().to_path_buf()))?;

    let ids: Vec<&str> = catalog.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["tien-nghich", "epee", "dau-pha", "no-date"]);

    let story = catalog.get("tien-nghich").expect("story present");
    let chapters: Vec<&str> = story.chapters.keys().collect();
    assert_eq!(chapters, vec!["Chương 1", "Chương 2", "Chương 3"]);
    assert_eq!(story.last_chapter(), Some("Chương 3"));
    Ok(())
}

#[test]
fn updates_follow_lenient_timestamps() -> anyhow::Result<()> {
    let catalog = parse_catalog(&sample_document().to_string())?;
    assert_eq!(catalog.get("epee").map(|s| s.updated_at), Some(1709337600));
    assert_eq!(catalog.get("dau-pha").map(|s| s.updated_at), Some(1700000000));
    assert_eq!(catalog.get("no-date").map(|s| s.updated_at), Some(0));

    let session = BrowseSession::new(Settings::default()).with_catalog(catalog);
    let rows: Vec<(&str, &str)> = session
        .updates()
        .iter()
        .map(|entry| (entry.story.id.as_str(), entry.last_chapter))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("epee", "Hồi 1"),
            ("tien-nghich", "Chương 3"),
            ("dau-pha", ""),
            ("no-date", ""),
        ]
    );
    Ok(())
}

#[test]
fn categories_are_distinct_in_first_seen_order() -> anyhow::Result<()> {
    let catalog = parse_catalog(&sample_document().to_string())?;
    let session = BrowseSession::new(Settings::default()).with_catalog(catalog);
    assert_eq!(
        session.categories(),
        &["Tiên Hiệp", "Kiếm Hiệp", "Huyền Huyễn"]
    );
    Ok(())
}

#[test]
fn broken_document_leaves_views_empty() -> anyhow::Result<()> {
    let file = write_document("{ not json")?;
    let source = DataSource::File(file.path().to_path_buf());
    assert!(matches!(load_catalog(&source), Err(LoadError::Parse(_))));

    let session = BrowseSession::new(Settings::default()).with_catalog(load_catalog_or_empty(&source));
    assert!(session.hot_stories().is_empty());
    assert!(session.updates().is_empty());
    assert!(session.categories().is_empty());
    assert_eq!(session.hot_grid().page.total_pages, 1);
    Ok(())
}
