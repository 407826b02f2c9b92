use storyshelf_application::{CategoryFilter, filter_stories, paginate, recent_updates};
use storyshelf_core::{ALL_CATEGORIES, Catalog, Settings};
use storyshelf_test::{make_catalog, make_session, make_settings, make_story};

#[test]
fn fifteen_stories_split_into_two_pages() {
    let catalog = make_catalog(15, "Fantasy");
    let all = filter_stories(&catalog, "", &CategoryFilter::All);

    let first = paginate(&all, 14, 1);
    assert_eq!(first.items.len(), 14);
    assert_eq!(first.total_pages, 2);

    let second = paginate(&all, 14, 2);
    assert_eq!(second.items.len(), 1);
    assert_eq!(second.items[0].id, "s14");
}

#[test]
fn accented_query_matches_folded_title() {
    let catalog: Catalog = vec![
        make_story("epee", "Épée", "Kiếm Hiệp", 1),
        make_story("other", "Long Kiếm", "Kiếm Hiệp", 2),
        make_story("none", "Vô Danh", "Kiếm Hiệp", 3),
    ]
    .into_iter()
    .collect();

    let ids = |query: &str| -> Vec<String> {
        filter_stories(&catalog, query, &CategoryFilter::All)
            .into_iter()
            .map(|story| story.id.clone())
            .collect()
    };
    assert_eq!(ids("é"), vec!["epee", "other"]);
    assert_eq!(ids("EPEE"), vec!["epee"]);
    assert_eq!(ids("kiem"), vec!["other"]);
    assert!(ids("zzz").is_empty());
}

#[test]
fn all_sentinel_returns_whole_catalog() {
    let mut catalog_stories = make_catalog(4, "Fantasy").iter().cloned().collect::<Vec<_>>();
    catalog_stories.push(make_story("x", "Extra", "Horror", 9));
    let catalog: Catalog = catalog_stories.into_iter().collect();

    let all = filter_stories(&catalog, "", &CategoryFilter::from_value(ALL_CATEGORIES));
    assert_eq!(all.len(), 5);

    let horror = filter_stories(&catalog, "", &CategoryFilter::from_value("Horror"));
    assert_eq!(horror.len(), 1);

    // Category comparison is exact, not folded.
    let folded = filter_stories(&catalog, "", &CategoryFilter::from_value("horror"));
    assert!(folded.is_empty());
}

#[test]
fn unknown_modal_id_changes_nothing() {
    let mut session = make_session(make_catalog(3, "Fantasy"));
    assert!(!session.open_detail("missing"));
    assert!(!session.modal.is_open());
    assert!(session.modal.detail().is_none());

    assert!(session.open_detail("s1"));
    assert!(!session.open_detail("missing"));
    assert_eq!(session.modal.detail().map(|d| d.id.as_str()), Some("s1"));
}

#[test]
fn modal_confirm_builds_reader_url() {
    let mut session = make_session(make_catalog(2, "Fantasy"));
    session.open_detail("s0");
    let link = session.modal.confirm().expect("chapter selected");
    assert_eq!(
        link.to_url(&session.settings.reader_base),
        "reader.html?story=s0&chap=Ch%C6%B0%C6%A1ng+1"
    );
}

#[test]
fn updates_sort_newest_first_with_stable_ties() {
    let catalog: Catalog = vec![
        make_story("old", "Old", "A", 1),
        make_story("tie-a", "Tie A", "A", 5),
        make_story("new", "New", "B", 9),
        make_story("tie-b", "Tie B", "B", 5),
        make_story("never", "Never", "B", 0),
    ]
    .into_iter()
    .collect();

    let ids: Vec<&str> = recent_updates(&catalog, None)
        .iter()
        .map(|entry| entry.story.id.as_str())
        .collect();
    assert_eq!(ids, vec!["new", "tie-a", "tie-b", "old", "never"]);

    assert_eq!(recent_updates(&catalog, Some(2)).len(), 2);
}

#[test]
fn session_page_size_comes_from_settings() {
    let session = storyshelf_application::BrowseSession::new(make_settings(5))
        .with_catalog(make_catalog(12, "Fantasy"));
    assert_eq!(session.hot_grid().page.total_pages, 3);
    assert_eq!(session.hot_stories().len(), 5);
}

#[test]
fn filtering_narrows_pages_and_resets_to_first() {
    let mut session = storyshelf_application::BrowseSession::new(Settings::default())
        .with_catalog(make_catalog(40, "Fantasy"));
    session.set_page(3);
    assert_eq!(session.filter().page, 3);

    session.set_query("story 3");
    assert_eq!(session.filter().page, 1);
    assert_eq!(session.hot_grid().matches, 11);
    assert_eq!(session.hot_grid().page.total_pages, 1);
}
