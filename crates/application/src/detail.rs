use storyshelf_core::{Catalog, ReaderLink, Story};

/// Display projection of one story for the detail modal.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StoryDetail {
    pub id: String,
    pub title: String,
    pub category: String,
    pub description: String,
    pub cover: String,
    pub updated: String,
    pub chapters: Vec<String>,
}

impl StoryDetail {
    pub fn project(story: &Story) -> Self {
        Self {
            id: story.id.clone(),
            title: story.title.clone(),
            category: story.category.clone(),
            description: story.description.clone(),
            cover: story.cover.clone(),
            updated: story.updated.clone(),
            chapters: story.chapters.keys().map(str::to_string).collect(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DetailModal {
    open: bool,
    detail: Option<StoryDetail>,
    chapter_cursor: usize,
}

impl DetailModal {
    /// Shows `id`. Unknown ids leave the modal exactly as it was.
    pub fn open(&mut self, catalog: &Catalog, id: &str) -> bool {
        let Some(story) = catalog.get(id) else {
            return false;
        };
        self.detail = Some(StoryDetail::project(story));
        self.chapter_cursor = 0;
        self.open = true;
        true
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn detail(&self) -> Option<&StoryDetail> {
        self.detail.as_ref()
    }

    pub fn chapter_cursor(&self) -> usize {
        self.chapter_cursor
    }

    pub fn selected_chapter(&self) -> Option<&str> {
        self.detail
            .as_ref()
            .and_then(|d| d.chapters.get(self.chapter_cursor))
            .map(String::as_str)
    }

    pub fn select_chapter(&mut self, idx: usize) {
        let len = self.detail.as_ref().map_or(0, |d| d.chapters.len());
        if idx < len {
            self.chapter_cursor = idx;
        }
    }

    pub fn select_next_chapter(&mut self) {
        self.select_chapter(self.chapter_cursor + 1);
    }

    pub fn select_prev_chapter(&mut self) {
        if self.chapter_cursor > 0 {
            self.chapter_cursor -= 1;
        }
    }

    /// Reader target for the selected chapter; `None` when nothing is selectable.
    pub fn confirm(&self) -> Option<ReaderLink> {
        if !self.open {
            return None;
        }
        let detail = self.detail.as_ref()?;
        let chapter = self.selected_chapter()?;
        Some(ReaderLink {
            story: detail.id.clone(),
            chapter: chapter.to_string(),
        })
    }
}
