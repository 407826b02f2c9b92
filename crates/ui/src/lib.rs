//! ratatui-based UI.

use std::io::{self, Stdout};
use std::process::Child;
use std::time::Duration;

use anyhow::Context as _;
use crossterm::event::{
    DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{event, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{
    Block, Borders, Clear, HighlightSpacing, List, ListItem, ListState, Paragraph, Wrap,
};
use ratatui_image::Image as ImageWidget;
use ratatui_image::picker::Picker;
use storyshelf_application::{BrowseSession, CategoryFilter, StoryDetail};
use storyshelf_core::{ReaderLink, Theme};
use tracing::{info, warn};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

mod cover;
mod image_protocol;
mod reader_launch;

use cover::CoverCache;
use image_protocol::TerminalHints;

const CARD_MIN_WIDTH: u16 = 24;
/// Card heights tried from roomiest to most compact.
const CARD_HEIGHTS: [u16; 4] = [5, 3, 2, 1];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiExit {
    Quit,
    /// Hand the chosen chapter to the reader view.
    Read(ReaderLink),
}

#[derive(Debug, Clone)]
pub struct UiOutcome {
    pub ctx: BrowseSession,
    pub exit: UiExit,
}

pub struct Ui {
    ctx: BrowseSession,
    focus: Focus,
    grid_cursor: usize,
    grid_columns: usize,
    grid_scroll: usize,
    updates_cursor: usize,
    search: SearchInput,
    category_panel: CategoryPanel,
    hits: HitMap,
    covers: CoverCache,
    image_picker: Picker,
    status: Option<String>,
    readers: Vec<Child>,
}

impl Ui {
    pub fn new(ctx: BrowseSession) -> Self {
        Self {
            ctx,
            focus: Focus::Grid,
            grid_cursor: 0,
            grid_columns: 1,
            grid_scroll: 0,
            updates_cursor: 0,
            search: SearchInput::default(),
            category_panel: CategoryPanel::default(),
            hits: HitMap::default(),
            covers: CoverCache::default(),
            image_picker: Picker::halfblocks(),
            status: None,
            readers: Vec::new(),
        }
    }

    pub fn run(&mut self) -> anyhow::Result<UiOutcome> {
        let mut terminal = setup_terminal()?;
        self.image_picker = image_protocol::build_picker(&TerminalHints::from_env());
        info!(
            protocol = image_protocol::protocol_label(&self.image_picker),
            "cover preview ready"
        );
        terminal.clear().ok();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            self.event_loop(&mut terminal)
        }));
        let restore_result = restore_terminal(&mut terminal);

        match (result, restore_result) {
            (Ok(Ok(outcome)), Ok(())) => Ok(outcome),
            (Ok(Ok(_)), Err(err)) => Err(err),
            (Ok(Err(err)), Ok(())) => Err(err),
            (Ok(Err(_)), Err(err)) => Err(err),
            (Err(panic), Ok(())) => Err(anyhow::anyhow!(panic_to_string(panic))),
            (Err(panic), Err(err)) => Err(anyhow::anyhow!(
                "{}\n(additionally failed to restore terminal: {err})",
                panic_to_string(panic)
            )),
        }
    }

    fn accent_color(&self) -> Color {
        match self.ctx.settings.theme {
            Theme::Light => Color::Blue,
            Theme::Dark => Color::Yellow,
        }
    }

    fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    ) -> anyhow::Result<UiOutcome> {
        let tick_rate = Duration::from_millis(250);
        let mut needs_redraw = true;

        loop {
            if needs_redraw {
                terminal.draw(|frame| self.draw(frame.area(), frame))?;
                needs_redraw = false;
            }
            reader_launch::reap_finished(&mut self.readers);

            if !event::poll(tick_rate)? {
                continue;
            }

            let exit = match event::read()? {
                Event::Resize(_, _) => {
                    needs_redraw = true;
                    None
                }
                Event::Key(key) => {
                    if key.kind == KeyEventKind::Release {
                        continue;
                    }
                    needs_redraw = true;
                    self.handle_key(key)
                }
                Event::Mouse(mouse) => {
                    if !matches!(mouse.kind, MouseEventKind::Down(MouseButton::Left)) {
                        continue;
                    }
                    needs_redraw = true;
                    self.handle_click(mouse)
                }
                _ => None,
            };

            if let Some(exit) = exit {
                return Ok(UiOutcome {
                    ctx: self.ctx.clone(),
                    exit,
                });
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Option<UiExit> {
        if self.ctx.modal.is_open() {
            self.handle_modal_key(key)
        } else if self.category_panel.open {
            self.handle_category_panel_key(key);
            None
        } else if self.search.editing {
            self.handle_search_key(key);
            None
        } else {
            self.handle_main_key(key)
        }
    }

    fn handle_main_key(&mut self, key: KeyEvent) -> Option<UiExit> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('u') {
            self.ctx.clear_filters();
            self.grid_cursor = 0;
            return None;
        }

        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return Some(UiExit::Quit),
            KeyCode::Char('/') => self.start_search(),
            KeyCode::Char('c') => self.open_category_panel(),
            KeyCode::Char('t') => self.ctx.settings.cycle_theme(),
            KeyCode::Tab | KeyCode::BackTab => {
                self.focus = match self.focus {
                    Focus::Grid => Focus::Updates,
                    Focus::Updates => Focus::Grid,
                };
            }
            KeyCode::PageDown | KeyCode::Char('n') | KeyCode::Char(']') => {
                self.ctx.next_page();
                self.grid_cursor = 0;
            }
            KeyCode::PageUp | KeyCode::Char('p') | KeyCode::Char('[') => {
                self.ctx.prev_page();
                self.grid_cursor = 0;
            }
            KeyCode::Left => self.move_grid_cursor(-1),
            KeyCode::Right => self.move_grid_cursor(1),
            KeyCode::Up => match self.focus {
                Focus::Grid => self.move_grid_cursor(-(self.grid_columns as isize)),
                Focus::Updates => self.updates_cursor = self.updates_cursor.saturating_sub(1),
            },
            KeyCode::Down => match self.focus {
                Focus::Grid => self.move_grid_cursor(self.grid_columns as isize),
                Focus::Updates => {
                    let len = self.ctx.updates().len();
                    if self.updates_cursor + 1 < len {
                        self.updates_cursor += 1;
                    }
                }
            },
            KeyCode::Enter => {
                if let Some(id) = self.focused_story_id() {
                    self.open_detail(&id);
                }
            }
            _ => {}
        }
        None
    }

    fn move_grid_cursor(&mut self, delta: isize) {
        if self.focus != Focus::Grid {
            self.focus = Focus::Grid;
        }
        let len = self.ctx.hot_grid().page.items.len();
        if len == 0 {
            self.grid_cursor = 0;
            return;
        }
        let next = self.grid_cursor as isize + delta;
        if (0..len as isize).contains(&next) {
            self.grid_cursor = next as usize;
        }
    }

    fn focused_story_id(&self) -> Option<String> {
        match self.focus {
            Focus::Grid => self.ctx.hot_grid().page.items.get(self.grid_cursor).cloned(),
            Focus::Updates => self
                .ctx
                .updates()
                .get(self.updates_cursor)
                .map(|entry| entry.story.id.clone()),
        }
    }

    fn open_detail(&mut self, id: &str) {
        if self.ctx.open_detail(id) {
            self.status = None;
        }
    }

    fn start_search(&mut self) {
        self.search.editing = true;
        self.search.snapshot = Some(self.ctx.filter().query.clone());
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        let mut query = self.ctx.filter().query.clone();
        match key.code {
            KeyCode::Esc => {
                if let Some(previous) = self.search.snapshot.take() {
                    query = previous;
                }
                self.search.editing = false;
            }
            KeyCode::Enter => {
                self.search.snapshot = None;
                self.search.editing = false;
            }
            KeyCode::Backspace => {
                query.pop();
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                query.clear();
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                query.push(c);
            }
            _ => return,
        }
        if query != self.ctx.filter().query {
            self.ctx.set_query(query);
            self.grid_cursor = 0;
        }
    }

    fn category_entries(&self) -> Vec<CategoryFilter> {
        std::iter::once(CategoryFilter::All)
            .chain(
                self.ctx
                    .categories()
                    .iter()
                    .map(|name| CategoryFilter::Selected(name.clone())),
            )
            .collect()
    }

    fn open_category_panel(&mut self) {
        let current = &self.ctx.filter().category;
        self.category_panel.cursor = self
            .category_entries()
            .iter()
            .position(|entry| entry == current)
            .unwrap_or(0);
        self.category_panel.open = true;
    }

    fn handle_category_panel_key(&mut self, key: KeyEvent) {
        let entries = self.category_entries();
        match key.code {
            KeyCode::Esc => self.category_panel.open = false,
            KeyCode::Up => {
                self.category_panel.cursor = self.category_panel.cursor.saturating_sub(1);
            }
            KeyCode::Down => {
                if self.category_panel.cursor + 1 < entries.len() {
                    self.category_panel.cursor += 1;
                }
            }
            KeyCode::Enter => {
                if let Some(entry) = entries.get(self.category_panel.cursor) {
                    self.select_category(entry.clone());
                }
                self.category_panel.open = false;
            }
            _ => {}
        }
    }

    fn select_category(&mut self, category: CategoryFilter) {
        self.ctx.set_category(category);
        self.grid_cursor = 0;
    }

    fn handle_modal_key(&mut self, key: KeyEvent) -> Option<UiExit> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('x') => self.ctx.modal.close(),
            KeyCode::Up => self.ctx.modal.select_prev_chapter(),
            KeyCode::Down => self.ctx.modal.select_next_chapter(),
            KeyCode::Enter | KeyCode::Char('r') => return self.confirm_modal(),
            _ => {}
        }
        None
    }

    /// Hands the selected chapter to the reader. With an open command the
    /// reader is spawned and browsing continues.
    fn confirm_modal(&mut self) -> Option<UiExit> {
        let link = self.ctx.modal.confirm()?;
        let Some(command) = self.ctx.settings.open_command.clone() else {
            return Some(UiExit::Read(link));
        };
        let url = link.to_url(&self.ctx.settings.reader_base);
        match reader_launch::launch(&command, &url) {
            Ok(child) => {
                info!(url = %url, pid = child.id(), "reader launched");
                self.readers.push(child);
                self.status = Some(format!("Opened {url}"));
                self.ctx.modal.close();
            }
            Err(err) => {
                warn!(command = %command, error = %err, "failed to launch reader");
                self.status = Some(format!("Could not open reader: {err}"));
            }
        }
        None
    }

    fn handle_click(&mut self, mouse: MouseEvent) -> Option<UiExit> {
        let pos = Position::new(mouse.column, mouse.row);

        if self.ctx.modal.is_open() {
            let inside = self
                .hits
                .modal_area
                .is_some_and(|area| area.contains(pos));
            if !inside {
                self.ctx.modal.close();
                return None;
            }
            match self.hits.target_at(pos) {
                Some(Target::ModalClose) => self.ctx.modal.close(),
                Some(Target::ModalChapter(idx)) => self.ctx.modal.select_chapter(idx),
                Some(Target::ModalLoad) => return self.confirm_modal(),
                _ => {}
            }
            return None;
        }

        if self.category_panel.open {
            match self.hits.target_at(pos) {
                Some(Target::CategoryOption(idx)) => {
                    if let Some(entry) = self.category_entries().get(idx).cloned() {
                        self.select_category(entry);
                    }
                    self.category_panel.open = false;
                }
                _ => {
                    let inside = self
                        .hits
                        .panel_area
                        .is_some_and(|area| area.contains(pos));
                    if !inside {
                        self.category_panel.open = false;
                    }
                }
            }
            return None;
        }

        match self.hits.target_at(pos) {
            Some(Target::Card(idx, id)) => {
                self.focus = Focus::Grid;
                self.grid_cursor = idx;
                self.open_detail(&id);
            }
            Some(Target::Update(idx, id)) => {
                self.focus = Focus::Updates;
                self.updates_cursor = idx;
                self.open_detail(&id);
            }
            Some(Target::Page(page)) => {
                self.ctx.set_page(page);
                self.grid_cursor = 0;
            }
            Some(Target::Category(category)) => self.select_category(category),
            Some(Target::Search) => self.start_search(),
            _ => {}
        }
        None
    }

    fn draw(&mut self, area: Rect, frame: &mut ratatui::Frame) {
        frame.render_widget(Clear, area);
        self.hits.clear();
        self.clamp_cursors();

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(3),
            ])
            .split(area);

        self.draw_header(frame, layout[0]);
        self.draw_category_menu(frame, layout[1]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(64), Constraint::Percentage(36)])
            .split(layout[2]);
        self.draw_hot_grid(frame, body[0]);
        self.draw_updates(frame, body[1]);

        let footer = Paragraph::new(Text::from(self.footer_lines()))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::TOP));
        frame.render_widget(footer, layout[3]);

        if self.category_panel.open {
            self.draw_category_panel(area, frame);
        }

        if self.ctx.modal.is_open() {
            self.draw_modal(area, frame);
        }
    }

    fn clamp_cursors(&mut self) {
        let grid_len = self.ctx.hot_grid().page.items.len();
        self.grid_cursor = self.grid_cursor.min(grid_len.saturating_sub(1));
        let updates_len = self.ctx.updates().len();
        self.updates_cursor = self.updates_cursor.min(updates_len.saturating_sub(1));
    }

    fn header_lines(&self) -> Vec<Line<'static>> {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let filter = self.ctx.filter();
        let mut query = filter.query.clone();
        if self.search.editing {
            query.push('▏');
        } else if query.is_empty() {
            query = "-".to_string();
        }
        let query_style = if self.search.editing {
            Style::default()
                .fg(self.accent_color())
                .add_modifier(Modifier::UNDERLINED)
        } else {
            Style::default()
        };
        let category = match &filter.category {
            CategoryFilter::All => "all".to_string(),
            CategoryFilter::Selected(name) => name.clone(),
        };
        let hot = self.ctx.hot_grid();

        vec![
            Line::from(vec![
                Span::styled("Storyshelf", bold),
                Span::raw(format!(" · {} stories", self.ctx.catalog().len())),
            ]),
            Line::from(vec![
                Span::styled("Search: ", bold),
                Span::styled(query, query_style),
                Span::raw("   "),
                Span::styled("Category: ", bold),
                Span::raw(category),
                Span::raw("   "),
                Span::styled("Page: ", bold),
                Span::raw(format!("{}/{}", hot.page.page, hot.page.total_pages)),
            ]),
        ]
    }

    fn draw_header(&mut self, frame: &mut ratatui::Frame, area: Rect) {
        let header = Paragraph::new(Text::from(self.header_lines()))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::BOTTOM));
        frame.render_widget(header, area);
        // The search line doubles as a click target for the input.
        if area.height > 1 {
            self.hits
                .add(Rect::new(area.x, area.y + 1, area.width, 1), Target::Search);
        }
    }

    fn draw_category_menu(&mut self, frame: &mut ratatui::Frame, area: Rect) {
        let active = self.ctx.filter().category.clone();
        let accent = self.accent_color();
        let mut spans = vec![Span::raw(" ")];
        let mut x = 1u16;
        for entry in self.category_entries() {
            let label = match &entry {
                CategoryFilter::All => " All ".to_string(),
                CategoryFilter::Selected(name) => format!(" {name} "),
            };
            let width = label.width() as u16;
            if x.saturating_add(width) > area.width {
                break;
            }
            let style = if entry == active {
                Style::default()
                    .fg(Color::Black)
                    .bg(accent)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            self.hits.add(
                Rect::new(area.x + x, area.y, width, 1),
                Target::Category(entry),
            );
            spans.push(Span::styled(label, style));
            spans.push(Span::raw(" "));
            x = x.saturating_add(width + 1);
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn draw_hot_grid(&mut self, frame: &mut ratatui::Frame, area: Rect) {
        let hot = self.ctx.hot_grid().clone();
        let title = if self.ctx.filter().is_filtering() {
            format!("Hot · {}/{} matches", hot.matches, self.ctx.catalog().len())
        } else {
            "Hot".to_string()
        };
        let block = Block::default().borders(Borders::ALL).title(title);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let sections = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(inner);
        self.draw_pager(frame, sections[1], hot.page.page, hot.page.total_pages);

        let cards_area = sections[0];
        if self.ctx.catalog().is_empty() {
            let lines = vec![
                Line::raw("No stories loaded."),
                Line::raw(""),
                Line::raw(format!("Source: {}", self.ctx.settings.data_source)),
            ];
            let paragraph = Paragraph::new(Text::from(lines)).wrap(Wrap { trim: true });
            frame.render_widget(paragraph, cards_area);
            return;
        }

        let cards: Vec<CardView> = self
            .ctx
            .hot_stories()
            .into_iter()
            .map(|story| CardView {
                id: story.id.clone(),
                title: story.title.clone(),
                category: story.category.clone(),
                has_cover: !story.cover.trim().is_empty(),
            })
            .collect();

        if cards.is_empty() {
            let mut lines = vec![Line::raw("No matches.")];
            let query = self.ctx.filter().query.trim();
            if !query.is_empty() {
                lines.push(Line::raw(""));
                lines.push(Line::raw(format!("Query: {query}")));
                lines.push(Line::raw("Tip: press / to edit the search, Ctrl+u to clear."));
            }
            let paragraph = Paragraph::new(Text::from(lines)).wrap(Wrap { trim: true });
            frame.render_widget(paragraph, cards_area);
            return;
        }

        let layout = GridLayout::fit(cards_area, cards.len());
        self.grid_columns = layout.columns;
        let cursor_row = self.grid_cursor / layout.columns;
        if cursor_row < self.grid_scroll {
            self.grid_scroll = cursor_row;
        } else if cursor_row >= self.grid_scroll + layout.visible_rows {
            self.grid_scroll = cursor_row + 1 - layout.visible_rows;
        }
        self.grid_scroll = self
            .grid_scroll
            .min(layout.rows.saturating_sub(layout.visible_rows));

        let card_width = cards_area.width / layout.columns as u16;
        let card_height = layout.card_height;
        let accent = self.accent_color();
        let first = self.grid_scroll * layout.columns;

        for (idx, card) in cards.into_iter().enumerate().skip(first) {
            let row = ((idx - first) / layout.columns) as u16;
            let col = (idx % layout.columns) as u16;
            let y = cards_area.y.saturating_add(row.saturating_mul(card_height));
            if y.saturating_add(card_height) > cards_area.bottom() {
                break;
            }
            let rect = Rect::new(
                cards_area.x + col * card_width,
                y,
                card_width,
                card_height,
            );
            let selected = self.focus == Focus::Grid && idx == self.grid_cursor;
            let paragraph = card_paragraph(&card, card_height, card_width, selected, accent);
            frame.render_widget(paragraph, rect);
            self.hits.add(rect, Target::Card(idx, card.id));
        }

        if layout.rows > layout.visible_rows && cards_area.width > 2 {
            let last = (self.grid_scroll + layout.visible_rows).min(layout.rows);
            let marker = format!("rows {}-{}/{}", self.grid_scroll + 1, last, layout.rows);
            let marker_width = (marker.width() as u16).min(cards_area.width);
            let marker_area = Rect::new(
                cards_area.right() - marker_width,
                area.y,
                marker_width,
                1,
            );
            frame.render_widget(
                Paragraph::new(Span::styled(marker, Style::default().fg(Color::Gray))),
                marker_area,
            );
        }
    }

    fn draw_pager(&mut self, frame: &mut ratatui::Frame, area: Rect, page: usize, total: usize) {
        let accent = self.accent_color();
        let mut spans = Vec::new();
        let mut x = 0u16;
        for slot in pager_slots(page, total, usize::from(area.width)) {
            let Some(n) = slot else {
                spans.push(Span::styled("…", Style::default().fg(Color::DarkGray)));
                spans.push(Span::raw(" "));
                x = x.saturating_add(2);
                continue;
            };
            let label = format!(" {n} ");
            let width = label.width() as u16;
            if x.saturating_add(width) > area.width {
                break;
            }
            let style = if n == page {
                Style::default()
                    .fg(Color::Black)
                    .bg(accent)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            self.hits
                .add(Rect::new(area.x + x, area.y, width, 1), Target::Page(n));
            spans.push(Span::styled(label, style));
            spans.push(Span::raw(" "));
            x = x.saturating_add(width + 1);
        }
        frame.render_widget(
            Paragraph::new(Line::from(spans)).alignment(Alignment::Left),
            area,
        );
    }

    fn draw_updates(&mut self, frame: &mut ratatui::Frame, area: Rect) {
        let rows: Vec<UpdateRow> = self
            .ctx
            .updates()
            .into_iter()
            .map(|entry| UpdateRow {
                id: entry.story.id.clone(),
                title: entry.story.title.clone(),
                category: entry.story.category.clone(),
                last_chapter: entry.last_chapter.to_string(),
                updated: entry.story.updated.clone(),
            })
            .collect();

        let block = Block::default()
            .borders(Borders::ALL)
            .title("Recently updated");
        let inner = block.inner(area);

        if rows.is_empty() {
            let paragraph = Paragraph::new(Line::raw("No updates.")).block(block);
            frame.render_widget(paragraph, area);
            return;
        }

        let text_width = usize::from(inner.width.saturating_sub(2));
        let items: Vec<ListItem> = rows
            .iter()
            .map(|row| {
                let meta = [
                    row.category.as_str(),
                    row.last_chapter.as_str(),
                    row.updated.as_str(),
                ]
                .into_iter()
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join(" · ");
                ListItem::new(Text::from(vec![
                    Line::from(Span::styled(
                        truncate_to_width(&row.title, text_width),
                        Style::default().add_modifier(Modifier::BOLD),
                    )),
                    Line::from(Span::styled(
                        truncate_to_width(&meta, text_width),
                        Style::default().fg(Color::Gray),
                    )),
                ]))
            })
            .collect();

        let highlight_style = if self.focus == Focus::Updates {
            Style::default()
                .fg(Color::Black)
                .bg(self.accent_color())
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let list = List::new(items)
            .block(block)
            .highlight_style(highlight_style)
            .highlight_symbol("> ")
            .highlight_spacing(HighlightSpacing::Always);

        let mut state = ListState::default();
        state.select(Some(self.updates_cursor));
        frame.render_stateful_widget(list, area, &mut state);

        let offset = state.offset();
        for (idx, row) in rows.into_iter().enumerate().skip(offset) {
            let y = inner.y + ((idx - offset) as u16).saturating_mul(2);
            if y.saturating_add(2) > inner.bottom() {
                break;
            }
            self.hits.add(
                Rect::new(inner.x, y, inner.width, 2),
                Target::Update(idx, row.id),
            );
        }
    }

    fn draw_category_panel(&mut self, area: Rect, frame: &mut ratatui::Frame) {
        let popup_area = centered_rect(40, 60, area);
        frame.render_widget(Clear, popup_area);
        self.hits.panel_area = Some(popup_area);

        let block = Block::default().borders(Borders::ALL).title(Span::styled(
            "Category",
            Style::default().add_modifier(Modifier::BOLD),
        ));
        let inner = block.inner(popup_area);

        let entries = self.category_entries();
        let items: Vec<ListItem> = entries
            .iter()
            .map(|entry| match entry {
                CategoryFilter::All => ListItem::new(Line::raw("All")),
                CategoryFilter::Selected(name) => ListItem::new(Line::raw(name.clone())),
            })
            .collect();
        let list = List::new(items)
            .block(block)
            .highlight_style(
                Style::default()
                    .fg(Color::Black)
                    .bg(self.accent_color())
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ")
            .highlight_spacing(HighlightSpacing::Always);

        let mut state = ListState::default();
        state.select(Some(self.category_panel.cursor));
        frame.render_stateful_widget(list, popup_area, &mut state);

        let offset = state.offset();
        for idx in offset..entries.len() {
            let y = inner.y + (idx - offset) as u16;
            if y >= inner.bottom() {
                break;
            }
            self.hits.add(
                Rect::new(inner.x, y, inner.width, 1),
                Target::CategoryOption(idx),
            );
        }
    }

    fn draw_modal(&mut self, area: Rect, frame: &mut ratatui::Frame) {
        let Some(detail) = self.ctx.modal.detail().cloned() else {
            return;
        };
        let popup_area = centered_rect(80, 84, area);
        frame.render_widget(Clear, popup_area);
        self.hits.modal_area = Some(popup_area);

        let accent = self.accent_color();
        let title = if detail.title.is_empty() {
            "(untitled)".to_string()
        } else {
            detail.title.clone()
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(accent))
            .title(Span::styled(
                title,
                Style::default().add_modifier(Modifier::BOLD),
            ));
        let inner = block.inner(popup_area);
        frame.render_widget(block, popup_area);

        if popup_area.width > 6 {
            let close_area = Rect::new(popup_area.right() - 5, popup_area.y, 3, 1);
            frame.render_widget(
                Paragraph::new(Span::styled("[x]", Style::default().fg(accent))),
                close_area,
            );
            self.hits.add(close_area, Target::ModalClose);
        }

        let chapters_height = (detail.chapters.len() as u16 + 2).clamp(3, 10);
        let sections = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(6),
                Constraint::Length(chapters_height),
                Constraint::Length(1),
            ])
            .split(inner);

        let top = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
            .split(sections[0]);
        self.draw_cover(frame, top[0], &detail);
        frame.render_widget(detail_paragraph(&detail), top[1]);

        self.draw_chapter_selector(frame, sections[1], &detail);
        self.draw_modal_actions(frame, sections[2], !detail.chapters.is_empty());
    }

    fn draw_cover(&mut self, frame: &mut ratatui::Frame, area: Rect, detail: &StoryDetail) {
        let block = Block::default().borders(Borders::ALL).title("Cover");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let drawn = self.covers.prepare(
            &self.image_picker,
            &self.ctx.settings.site_root,
            &detail.cover,
            inner,
        );
        if drawn && let Some(protocol) = self.covers.current() {
            let proto_area = protocol.area();
            let draw_width = proto_area.width.min(inner.width);
            let draw_height = proto_area.height.min(inner.height);
            let draw_area = Rect::new(
                inner.x + inner.width.saturating_sub(draw_width) / 2,
                inner.y + inner.height.saturating_sub(draw_height) / 2,
                draw_width,
                draw_height,
            );
            frame.render_widget(ImageWidget::new(protocol), draw_area);
            return;
        }

        let text = if detail.cover.trim().is_empty() {
            "(no cover)".to_string()
        } else {
            detail.cover.clone()
        };
        let paragraph = Paragraph::new(Line::styled(text, Style::default().fg(Color::Gray)))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_chapter_selector(&mut self, frame: &mut ratatui::Frame, area: Rect, detail: &StoryDetail) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!("Chapters ({})", detail.chapters.len()));
        let inner = block.inner(area);

        if detail.chapters.is_empty() {
            frame.render_widget(Paragraph::new(Line::raw("No chapters.")).block(block), area);
            return;
        }

        let items: Vec<ListItem> = detail
            .chapters
            .iter()
            .map(|key| ListItem::new(Line::raw(key.clone())))
            .collect();
        let list = List::new(items)
            .block(block)
            .highlight_style(
                Style::default()
                    .fg(Color::Black)
                    .bg(self.accent_color())
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ")
            .highlight_spacing(HighlightSpacing::Always);

        let mut state = ListState::default();
        state.select(Some(self.ctx.modal.chapter_cursor()));
        frame.render_stateful_widget(list, area, &mut state);

        let offset = state.offset();
        for idx in offset..detail.chapters.len() {
            let y = inner.y + (idx - offset) as u16;
            if y >= inner.bottom() {
                break;
            }
            self.hits
                .add(Rect::new(inner.x, y, inner.width, 1), Target::ModalChapter(idx));
        }
    }

    fn draw_modal_actions(&mut self, frame: &mut ratatui::Frame, area: Rect, can_read: bool) {
        let read_label = "[ Read chapter ]";
        let close_label = "[ Close ]";
        let read_style = if can_read {
            Style::default()
                .fg(self.accent_color())
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let line = Line::from(vec![
            Span::styled(read_label, read_style),
            Span::raw("  "),
            Span::raw(close_label),
        ]);
        frame.render_widget(Paragraph::new(line), area);

        let read_width = read_label.width() as u16;
        let close_x = read_width + 2;
        self.hits.add(
            Rect::new(area.x, area.y, read_width.min(area.width), 1),
            Target::ModalLoad,
        );
        if close_x < area.width {
            let close_width = (close_label.width() as u16).min(area.width - close_x);
            self.hits.add(
                Rect::new(area.x + close_x, area.y, close_width, 1),
                Target::ModalClose,
            );
        }
    }

    fn footer_lines(&self) -> Vec<Line<'static>> {
        let key = |label: &'static str| {
            Span::styled(label, Style::default().add_modifier(Modifier::BOLD))
        };

        let mut lines = if self.ctx.modal.is_open() {
            vec![Line::from(vec![
                key("Esc"),
                Span::raw(" close  "),
                key("↑/↓"),
                Span::raw(" chapter  "),
                key("Enter"),
                Span::raw(" read  "),
                Span::raw(format!(
                    "cover: {}",
                    image_protocol::protocol_label(&self.image_picker)
                )),
            ])]
        } else if self.category_panel.open {
            vec![Line::from(vec![
                key("Esc"),
                Span::raw(" cancel  "),
                key("↑/↓"),
                Span::raw(" move  "),
                key("Enter"),
                Span::raw(" apply"),
            ])]
        } else if self.search.editing {
            vec![Line::from(vec![
                key("Esc"),
                Span::raw(" cancel  "),
                key("Enter"),
                Span::raw(" done  "),
                key("Backspace"),
                Span::raw(" delete  "),
                key("Ctrl+u"),
                Span::raw(" clear"),
            ])]
        } else {
            vec![Line::from(vec![
                key("q"),
                Span::raw(" quit  "),
                key("/"),
                Span::raw(" search  "),
                key("c"),
                Span::raw(" category  "),
                key("n/p"),
                Span::raw(" page  "),
                key("Tab"),
                Span::raw(" focus  "),
                key("Enter"),
                Span::raw(" details"),
            ])]
        };

        if let Some(status) = &self.status {
            lines.push(Line::styled(
                status.clone(),
                Style::default().fg(Color::Gray),
            ));
        }
        lines
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Grid,
    Updates,
}

#[derive(Debug, Default)]
struct SearchInput {
    editing: bool,
    snapshot: Option<String>,
}

#[derive(Debug, Default)]
struct CategoryPanel {
    open: bool,
    cursor: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    Search,
    Card(usize, String),
    Page(usize),
    Update(usize, String),
    Category(CategoryFilter),
    CategoryOption(usize),
    ModalChapter(usize),
    ModalLoad,
    ModalClose,
}

/// Click targets recorded during the last draw. Later entries sit on top.
#[derive(Debug, Default)]
struct HitMap {
    targets: Vec<(Rect, Target)>,
    modal_area: Option<Rect>,
    panel_area: Option<Rect>,
}

impl HitMap {
    fn clear(&mut self) {
        self.targets.clear();
        self.modal_area = None;
        self.panel_area = None;
    }

    fn add(&mut self, area: Rect, target: Target) {
        if area.width > 0 && area.height > 0 {
            self.targets.push((area, target));
        }
    }

    fn target_at(&self, pos: Position) -> Option<Target> {
        self.targets
            .iter()
            .rev()
            .find(|(area, _)| area.contains(pos))
            .map(|(_, target)| target.clone())
    }
}

struct CardView {
    id: String,
    title: String,
    category: String,
    has_cover: bool,
}

struct UpdateRow {
    id: String,
    title: String,
    category: String,
    last_chapter: String,
    updated: String,
}

/// How the hot grid splits its area: the roomiest card height at which every
/// row fits, or one-line cards with scrolling when even those do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct GridLayout {
    columns: usize,
    rows: usize,
    card_height: u16,
    visible_rows: usize,
}

impl GridLayout {
    fn fit(area: Rect, cards: usize) -> Self {
        let columns = usize::from((area.width / CARD_MIN_WIDTH).max(1));
        let rows = cards.div_ceil(columns).max(1);
        let card_height = CARD_HEIGHTS
            .into_iter()
            .find(|height| rows * usize::from(*height) <= usize::from(area.height))
            .unwrap_or(1);
        let visible_rows = usize::from(area.height / card_height).clamp(1, rows);
        Self {
            columns,
            rows,
            card_height,
            visible_rows,
        }
    }
}

fn card_paragraph(
    card: &CardView,
    height: u16,
    width: u16,
    selected: bool,
    accent: Color,
) -> Paragraph<'static> {
    let title_style = Style::default().add_modifier(Modifier::BOLD);
    let meta_style = Style::default().fg(Color::Gray);

    if height >= 3 {
        let text_width = usize::from(width.saturating_sub(2));
        let mut lines = vec![Line::from(Span::styled(
            truncate_to_width(&card.title, text_width),
            title_style,
        ))];
        if height >= 5 {
            lines.push(Line::from(Span::styled(
                truncate_to_width(&card.category, text_width),
                meta_style,
            )));
            lines.push(Line::from(Span::styled(
                if card.has_cover { "▣ cover" } else { "□ no cover" },
                Style::default().fg(Color::DarkGray),
            )));
        }
        let border_style = if selected {
            Style::default().fg(accent).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        return Paragraph::new(Text::from(lines)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style),
        );
    }

    let (marker, title_style) = if selected {
        ("> ", title_style.fg(accent))
    } else {
        ("  ", title_style)
    };
    let text_width = usize::from(width.saturating_sub(3));
    let lines = if height == 2 {
        vec![
            Line::from(vec![
                Span::styled(marker, title_style),
                Span::styled(truncate_to_width(&card.title, text_width), title_style),
            ]),
            Line::from(vec![
                Span::raw("  "),
                Span::styled(truncate_to_width(&card.category, text_width), meta_style),
            ]),
        ]
    } else {
        let title_width = card.title.width().min(text_width);
        let category_width = text_width.saturating_sub(title_width + 3);
        let mut spans = vec![
            Span::styled(marker, title_style),
            Span::styled(truncate_to_width(&card.title, text_width), title_style),
        ];
        if category_width > 0 && !card.category.is_empty() {
            spans.push(Span::styled(
                format!(" · {}", truncate_to_width(&card.category, category_width)),
                meta_style,
            ));
        }
        vec![Line::from(spans)]
    };
    Paragraph::new(Text::from(lines))
}

/// Pager controls that fit in `max_width` columns. Every page is listed when
/// possible; otherwise the first, last and current pages stay, with as many
/// neighbours of the current page as fit and `None` standing for a gap.
fn pager_slots(page: usize, total: usize, max_width: usize) -> Vec<Option<usize>> {
    let total = total.max(1);
    let page = page.clamp(1, total);

    let all: Vec<Option<usize>> = (1..=total).map(Some).collect();
    if slots_width(&all) <= max_width {
        return all;
    }

    let mut best = vec![Some(page)];
    for radius in 0..total {
        let lo = page.saturating_sub(radius).max(1);
        let hi = (page + radius).min(total);
        let mut pages = vec![1];
        pages.extend(lo..=hi);
        pages.push(total);
        pages.sort_unstable();
        pages.dedup();

        let mut slots = Vec::with_capacity(pages.len() + 2);
        let mut prev = 0;
        for p in pages {
            if prev != 0 && p > prev + 1 {
                slots.push(None);
            }
            slots.push(Some(p));
            prev = p;
        }
        if slots_width(&slots) > max_width {
            break;
        }
        best = slots;
    }
    best
}

fn slots_width(slots: &[Option<usize>]) -> usize {
    slots
        .iter()
        .map(|slot| match slot {
            Some(n) => n.to_string().len() + 2,
            None => 1,
        })
        .sum::<usize>()
        + slots.len().saturating_sub(1)
}

fn detail_paragraph(detail: &StoryDetail) -> Paragraph<'static> {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let mut lines = vec![
        Line::from(vec![
            Span::styled("Name: ", bold),
            Span::raw(detail.title.clone()),
        ]),
        Line::from(vec![
            Span::styled("Category: ", bold),
            Span::raw(detail.category.clone()),
        ]),
    ];
    if !detail.updated.is_empty() {
        lines.push(Line::from(vec![
            Span::styled("Updated: ", bold),
            Span::raw(detail.updated.clone()),
        ]));
    }
    lines.push(Line::raw(""));
    lines.extend(detail.description.lines().map(|line| Line::raw(line.to_string())));

    Paragraph::new(Text::from(lines)).wrap(Wrap { trim: true })
}

fn setup_terminal() -> anyhow::Result<Terminal<CrosstermBackend<Stdout>>> {
    terminal::enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("enter alt screen")?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).context("create terminal")
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> anyhow::Result<()> {
    terminal::disable_raw_mode().context("disable raw mode")?;
    crossterm::execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen
    )
    .context("leave alt screen")?;
    Ok(())
}

fn panic_to_string(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panic: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panic: {s}")
    } else {
        "panic: (unknown payload)".to_string()
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Cuts `text` to at most `max_width` terminal columns, marking the cut with `…`.
fn truncate_to_width(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    if max_width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w + 1 > max_width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}
