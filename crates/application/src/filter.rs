use storyshelf_core::{ALL_CATEGORIES, Catalog, Story, normalize_for_search};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Selected(String),
}

impl CategoryFilter {
    /// Parses a selector value; the `__all__` sentinel means no filter.
    pub fn from_value(value: &str) -> Self {
        if value == ALL_CATEGORIES {
            Self::All
        } else {
            Self::Selected(value.to_string())
        }
    }

    pub fn as_value(&self) -> &str {
        match self {
            Self::All => ALL_CATEGORIES,
            Self::Selected(name) => name,
        }
    }

    /// Exact comparison against the raw, non-normalized category.
    pub fn matches(&self, category: &str) -> bool {
        match self {
            Self::All => true,
            Self::Selected(wanted) => wanted == category,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    pub query: String,
    pub category: CategoryFilter,
    pub page: usize,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            query: String::new(),
            category: CategoryFilter::All,
            page: 1,
        }
    }
}

impl FilterState {
    pub fn is_filtering(&self) -> bool {
        !self.query.is_empty() || self.category != CategoryFilter::All
    }
}

/// Stories whose folded title contains the folded query and whose category
/// passes `category`, in catalog order.
pub fn filter_stories<'a>(
    catalog: &'a Catalog,
    query: &str,
    category: &CategoryFilter,
) -> Vec<&'a Story> {
    let query = normalize_for_search(query);
    catalog
        .iter()
        .filter(|story| {
            let title = normalize_for_search(&story.title);
            title.contains(&query) && category.matches(&story.category)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub total_pages: usize,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            page: 1,
            total_pages: 1,
        }
    }
}

pub fn total_pages(len: usize, page_size: usize) -> usize {
    len.div_ceil(page_size.max(1)).max(1)
}

/// Slices out `requested_page` (1-based), clamped into `[1, total_pages]`.
pub fn paginate<T: Clone>(items: &[T], page_size: usize, requested_page: usize) -> Page<T> {
    let page_size = page_size.max(1);
    let total_pages = total_pages(items.len(), page_size);
    let page = requested_page.clamp(1, total_pages);
    let start = (page - 1) * page_size;
    let end = (start + page_size).min(items.len());
    let items = items.get(start..end).unwrap_or_default().to_vec();
    Page {
        items,
        page,
        total_pages,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpdateEntry<'a> {
    pub story: &'a Story,
    pub last_chapter: &'a str,
}

/// Whole catalog, most recently updated first. Equal timestamps keep
/// catalog order.
pub fn recent_updates(catalog: &Catalog, limit: Option<usize>) -> Vec<UpdateEntry<'_>> {
    let mut stories: Vec<&Story> = catalog.iter().collect();
    stories.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    stories
        .into_iter()
        .take(limit.unwrap_or(usize::MAX))
        .map(|story| UpdateEntry {
            story,
            last_chapter: story.last_chapter().unwrap_or_default(),
        })
        .collect()
}

/// Distinct non-empty categories in first-seen order.
pub fn categories(catalog: &Catalog) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for story in catalog.iter() {
        if story.category.is_empty() || out.iter().any(|c| *c == story.category) {
            continue;
        }
        out.push(story.category.clone());
    }
    out
}
