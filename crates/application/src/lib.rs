//! Browsing session for Storyshelf: filter state plus the projections the
//! views draw from.

use storyshelf_core::{Catalog, Settings, Story};

mod detail;
mod filter;

pub use detail::{DetailModal, StoryDetail};
pub use filter::{
    CategoryFilter, FilterState, Page, UpdateEntry, categories, filter_stories, paginate,
    recent_updates, total_pages,
};

/// Current page of the hot grid plus the size of the match set it came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HotGrid {
    pub page: Page<String>,
    pub matches: usize,
}

#[derive(Debug, Clone)]
pub struct BrowseSession {
    pub settings: Settings,
    pub modal: DetailModal,
    catalog: Catalog,
    categories: Vec<String>,
    updates: Vec<String>,
    filter: FilterState,
    hot: HotGrid,
}

impl BrowseSession {
    pub fn new(settings: Settings) -> Self {
        let mut session = Self {
            settings,
            modal: DetailModal::default(),
            catalog: Catalog::empty(),
            categories: Vec::new(),
            updates: Vec::new(),
            filter: FilterState::default(),
            hot: HotGrid::default(),
        };
        session.settings.normalize();
        session.refresh_hot();
        session
    }

    /// Installs the loaded catalog and derives the category set and the
    /// updates order once.
    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.categories = categories(&catalog);
        self.updates = recent_updates(&catalog, self.settings.updates_limit)
            .into_iter()
            .map(|entry| entry.story.id.clone())
            .collect();
        self.catalog = catalog;
        self.filter = FilterState::default();
        self.modal = DetailModal::default();
        self.refresh_hot();
        self
    }

    pub fn with_filter(mut self, filter: FilterState) -> Self {
        self.filter = filter;
        self.refresh_hot();
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn story(&self, id: &str) -> Option<&Story> {
        self.catalog.get(id)
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn hot_grid(&self) -> &HotGrid {
        &self.hot
    }

    pub fn hot_stories(&self) -> Vec<&Story> {
        self.hot
            .page
            .items
            .iter()
            .filter_map(|id| self.catalog.get(id))
            .collect()
    }

    pub fn updates(&self) -> Vec<UpdateEntry<'_>> {
        self.updates
            .iter()
            .filter_map(|id| self.catalog.get(id))
            .map(|story| UpdateEntry {
                story,
                last_chapter: story.last_chapter().unwrap_or_default(),
            })
            .collect()
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        let query = query.into();
        if query != self.filter.query {
            self.filter.query = query;
            self.filter.page = 1;
        }
        self.refresh_hot();
    }

    pub fn set_category(&mut self, category: CategoryFilter) {
        if category != self.filter.category {
            self.filter.category = category;
            self.filter.page = 1;
        }
        self.refresh_hot();
    }

    pub fn set_page(&mut self, page: usize) {
        self.filter.page = page;
        self.refresh_hot();
    }

    pub fn next_page(&mut self) {
        self.set_page(self.filter.page.saturating_add(1));
    }

    pub fn prev_page(&mut self) {
        self.set_page(self.filter.page.saturating_sub(1));
    }

    pub fn clear_filters(&mut self) {
        self.filter = FilterState::default();
        self.refresh_hot();
    }

    /// Opens the detail modal for `id`; unknown ids are ignored.
    pub fn open_detail(&mut self, id: &str) -> bool {
        self.modal.open(&self.catalog, id)
    }

    fn refresh_hot(&mut self) {
        let matches: Vec<String> =
            filter_stories(&self.catalog, &self.filter.query, &self.filter.category)
                .into_iter()
                .map(|story| story.id.clone())
                .collect();
        let page = paginate(&matches, self.settings.page_size, self.filter.page);
        self.filter.page = page.page;
        self.hot = HotGrid {
            page,
            matches: matches.len(),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(count: usize) -> Catalog {
        (0..count)
            .map(|i| Story {
                id: format!("s{i}"),
                title: format!("Story {i}"),
                category: if i % 2 == 0 { "Even" } else { "Odd" }.to_string(),
                updated_at: i as i64,
                ..Story::default()
            })
            .collect()
    }

    fn session(count: usize) -> BrowseSession {
        BrowseSession::new(Settings::default()).with_catalog(catalog(count))
    }

    #[test]
    fn empty_session_has_one_empty_page() {
        let session = BrowseSession::new(Settings::default());
        assert_eq!(session.hot_grid().page.total_pages, 1);
        assert!(session.hot_stories().is_empty());
        assert!(session.updates().is_empty());
        assert!(session.categories().is_empty());
    }

    #[test]
    fn pages_clamp_after_shrinking_match_set() {
        let mut session = session(15);
        assert_eq!(session.hot_grid().page.items.len(), 14);
        assert_eq!(session.hot_grid().page.total_pages, 2);

        session.set_page(3);
        assert_eq!(session.filter().page, 2);
        assert_eq!(session.hot_stories().len(), 1);
    }

    #[test]
    fn query_change_resets_page() {
        let mut session = session(30);
        session.set_page(2);
        assert_eq!(session.filter().page, 2);
        session.set_query("story 1");
        assert_eq!(session.filter().page, 1);
        assert_eq!(session.hot_grid().matches, 11);
    }

    #[test]
    fn category_change_resets_page() {
        let mut session = session(30);
        session.set_page(3);
        session.set_category(CategoryFilter::from_value("Odd"));
        assert_eq!(session.filter().page, 1);
        assert_eq!(session.hot_grid().matches, 15);
        assert!(
            session
                .hot_stories()
                .iter()
                .all(|story| story.category == "Odd")
        );

        session.set_category(CategoryFilter::All);
        assert_eq!(session.hot_grid().matches, 30);
    }

    #[test]
    fn prev_page_never_drops_below_one() {
        let mut session = session(3);
        session.prev_page();
        session.prev_page();
        assert_eq!(session.filter().page, 1);
        session.next_page();
        assert_eq!(session.filter().page, 1);
    }

    #[test]
    fn updates_are_newest_first() {
        let session = session(5);
        let ids: Vec<&str> = session
            .updates()
            .iter()
            .map(|entry| entry.story.id.as_str())
            .collect();
        assert_eq!(ids, vec!["s4", "s3", "s2", "s1", "s0"]);
    }

    #[test]
    fn open_detail_ignores_unknown_ids() {
        let mut session = session(2);
        assert!(!session.open_detail("nope"));
        assert!(!session.modal.is_open());
        assert!(session.open_detail("s1"));
        assert!(session.modal.is_open());
    }

    #[test]
    fn clear_filters_restores_full_catalog() {
        let mut session = session(20);
        session.set_query("19");
        assert_eq!(session.hot_grid().matches, 1);
        session.clear_filters();
        assert_eq!(session.hot_grid().matches, 20);
        assert_eq!(session.filter(), &FilterState::default());
    }
}
