//! Non-interactive subcommands: plain-text renderings of the session views.

use std::io::Write;

use anyhow::Context as _;
use storyshelf_application::{BrowseSession, CategoryFilter, FilterState, StoryDetail};
use storyshelf_core::ReaderLink;

pub fn list(
    session: BrowseSession,
    query: &str,
    category: &str,
    page: usize,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let session = session.with_filter(FilterState {
        query: query.to_string(),
        category: CategoryFilter::from_value(category),
        page,
    });
    let hot = session.hot_grid();
    writeln!(
        out,
        "page {}/{} ({} matches)",
        hot.page.page, hot.page.total_pages, hot.matches
    )?;
    for story in session.hot_stories() {
        writeln!(out, "{}\t{}\t{}", story.id, story.title, story.category)?;
    }
    Ok(())
}

pub fn updates(
    session: &BrowseSession,
    limit: Option<usize>,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let entries = session.updates();
    let limit = limit.unwrap_or(entries.len());
    for entry in entries.into_iter().take(limit) {
        writeln!(
            out,
            "{}\t{}\t{}\t{}",
            entry.story.id, entry.story.title, entry.last_chapter, entry.story.updated
        )?;
    }
    Ok(())
}

pub fn categories(session: &BrowseSession, out: &mut impl Write) -> anyhow::Result<()> {
    for category in session.categories() {
        writeln!(out, "{category}")?;
    }
    Ok(())
}

pub fn show(session: &BrowseSession, id: &str, out: &mut impl Write) -> anyhow::Result<()> {
    let story = session
        .story(id)
        .with_context(|| format!("no story with id {id:?}"))?;
    let detail = StoryDetail::project(story);
    writeln!(out, "{}", detail.title)?;
    writeln!(out, "id: {}", detail.id)?;
    writeln!(out, "category: {}", detail.category)?;
    if !detail.updated.is_empty() {
        writeln!(out, "updated: {}", detail.updated)?;
    }
    if !detail.cover.is_empty() {
        writeln!(out, "cover: {}", detail.cover)?;
    }
    if !detail.description.is_empty() {
        writeln!(out)?;
        writeln!(out, "{}", detail.description)?;
    }
    writeln!(out)?;
    writeln!(out, "chapters ({}):", detail.chapters.len())?;
    for chapter in &detail.chapters {
        writeln!(out, "  {chapter}")?;
    }
    Ok(())
}

pub fn link(
    session: &BrowseSession,
    id: &str,
    chapter: &str,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let story = session
        .story(id)
        .with_context(|| format!("no story with id {id:?}"))?;
    anyhow::ensure!(
        story.chapters.get(chapter).is_some(),
        "story {id:?} has no chapter {chapter:?}"
    );
    let link = ReaderLink {
        story: id.to_string(),
        chapter: chapter.to_string(),
    };
    writeln!(out, "{}", link.to_url(&session.settings.reader_base))?;
    Ok(())
}
