//! Interactive TUI (Terminal User Interface) for Dorkfind.
//!
//! Provides a search-as-you-type interface with:
//! - Debounced searches driven by a `QueryDispatcher`
//! - Loading, error and empty-result states
//! - Navigation through results

use crate::app::App;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use dorkfind_core::{Config, Phase, QueryDispatcher};
use ratatui::{prelude::*, widgets::*};
use std::io;
use std::time::{Duration, Instant};

/// Upper bound on how long the loop waits for a key before ticking.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// TUI application state.
struct TuiApp {
    /// Debounced search state for the input field
    dispatcher: QueryDispatcher,

    /// Selection in the results list
    list_state: ListState,

    /// Where searches go (shown in the status bar)
    source: String,

    /// Whether we should quit
    should_quit: bool,
}

impl TuiApp {
    fn new(dispatcher: QueryDispatcher, source: String) -> Self {
        TuiApp {
            dispatcher,
            list_state: ListState::default(),
            source,
            should_quit: false,
        }
    }

    fn input(&self) -> &str {
        self.dispatcher.state().input()
    }

    /// Handle input character.
    fn on_char(&mut self, c: char) {
        let mut text = self.input().to_string();
        text.push(c);
        self.dispatcher.on_input(text);
    }

    /// Handle backspace.
    fn on_backspace(&mut self) {
        let mut text = self.input().to_string();
        if text.pop().is_some() {
            self.dispatcher.on_input(text);
        }
    }

    /// Clear the input field.
    fn clear_input(&mut self) {
        self.dispatcher.on_input(String::new());
    }

    /// Advance timers and responses; reset the selection when results change.
    fn tick(&mut self) {
        if self.dispatcher.tick() {
            let has_results = !self.dispatcher.state().results().is_empty();
            self.list_state.select(if has_results { Some(0) } else { None });
        }
    }

    /// Move selection up.
    fn select_previous(&mut self) {
        if let Some(selected) = self.list_state.selected() {
            self.list_state.select(Some(selected.saturating_sub(1)));
        }
    }

    /// Move selection down.
    fn select_next(&mut self) {
        let len = self.dispatcher.state().results().len();
        if let Some(selected) = self.list_state.selected() {
            if selected + 1 < len {
                self.list_state.select(Some(selected + 1));
            }
        }
    }

    /// Page down.
    fn page_down(&mut self, page_size: usize) {
        let len = self.dispatcher.state().results().len();
        if let Some(selected) = self.list_state.selected() {
            self.list_state
                .select(Some((selected + page_size).min(len.saturating_sub(1))));
        }
    }

    /// Page up.
    fn page_up(&mut self, page_size: usize) {
        if let Some(selected) = self.list_state.selected() {
            self.list_state.select(Some(selected.saturating_sub(page_size)));
        }
    }

    /// How long the event loop may block waiting for a key.
    fn poll_timeout(&self) -> Duration {
        self.dispatcher
            .state()
            .time_until_due(Instant::now())
            .map_or(POLL_INTERVAL, |due| due.min(POLL_INTERVAL))
    }
}

/// Run the TUI application.
pub fn run(config: Config, endpoint: Option<String>) -> anyhow::Result<()> {
    let app = App::new(config);
    let transport = app.transport(endpoint.as_deref())?;
    let source = endpoint
        .or_else(|| app.config.dispatch.endpoint.clone())
        .unwrap_or_else(|| format!("{} store", app.config.store.kind));
    let dispatcher = QueryDispatcher::new(transport, app.config.dispatch.quiet_interval());

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut tui_app = TuiApp::new(dispatcher, source);

    // Main loop
    let result = run_loop(&mut terminal, &mut tui_app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Main event loop.
fn run_loop<B: Backend>(terminal: &mut Terminal<B>, app: &mut TuiApp) -> anyhow::Result<()> {
    loop {
        app.tick();
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(app.poll_timeout())? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Esc => {
                            app.should_quit = true;
                        }
                        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                            app.should_quit = true;
                        }
                        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                            app.clear_input();
                        }
                        KeyCode::Char(c) => {
                            if !key.modifiers.contains(KeyModifiers::CONTROL) {
                                app.on_char(c);
                            }
                        }
                        KeyCode::Backspace => {
                            app.on_backspace();
                        }
                        KeyCode::Up => {
                            app.select_previous();
                        }
                        KeyCode::Down => {
                            app.select_next();
                        }
                        KeyCode::PageUp => {
                            app.page_up(10);
                        }
                        KeyCode::PageDown => {
                            app.page_down(10);
                        }
                        _ => {}
                    }
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

mod ui {
    use super::*;

    /// Draw the UI.
    pub fn draw(f: &mut Frame, app: &mut TuiApp) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(3), // Search box
                Constraint::Min(6),    // Results
                Constraint::Length(2), // Status bar
            ])
            .split(f.area());

        draw_search_box(f, app, chunks[0]);
        draw_results(f, app, chunks[1]);
        draw_status_bar(f, app, chunks[2]);
    }

    /// Draw the search input box.
    fn draw_search_box(f: &mut Frame, app: &TuiApp, area: Rect) {
        let title = if app.dispatcher.state().is_loading() {
            " Dork Searcher (searching...) "
        } else {
            " Dork Searcher "
        };
        let inner_width = area.width.saturating_sub(2);
        let (scroll, cursor) = input_viewport(Span::raw(app.input()).width(), inner_width);
        let input = Paragraph::new(app.input())
            .style(Style::default().fg(Color::Yellow))
            .scroll((0, scroll))
            .block(Block::default().borders(Borders::ALL).title(title));
        f.render_widget(input, area);

        f.set_cursor_position(Position::new(area.x + 1 + cursor, area.y + 1));
    }

    /// Horizontal scroll and cursor column for input `text_width` cells wide
    /// shown in a box `inner_width` cells wide.
    ///
    /// The tail of the input stays visible and the cursor never leaves the box.
    pub(super) fn input_viewport(text_width: usize, inner_width: u16) -> (u16, u16) {
        let last_column = inner_width.saturating_sub(1);
        let text_width = u16::try_from(text_width).unwrap_or(u16::MAX);
        let scroll = text_width.saturating_sub(last_column);
        (scroll, text_width.min(last_column))
    }

    /// Draw the results list, or the error / empty-state message.
    fn draw_results(f: &mut Frame, app: &mut TuiApp, area: Rect) {
        let state = app.dispatcher.state();
        let block = Block::default().borders(Borders::ALL);

        if let Some(error) = state.error() {
            let message = Paragraph::new(error.to_string())
                .style(Style::default().fg(Color::Red))
                .alignment(Alignment::Center)
                .block(block.title(" Error "));
            f.render_widget(message, area);
            return;
        }

        if state.results().is_empty() {
            let text = match state.phase() {
                Phase::Idle => "Enter a dork query",
                Phase::Pending | Phase::InFlight => "",
                Phase::Settled => "No results found.",
            };
            let message = Paragraph::new(text)
                .style(Style::default().fg(Color::Gray))
                .alignment(Alignment::Center)
                .block(block.title(" Results "));
            f.render_widget(message, area);
            return;
        }

        let items: Vec<ListItem> = state
            .results()
            .iter()
            .map(|record| {
                let mut lines = vec![Line::from(Span::styled(
                    record.query.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                ))];
                if !record.description.is_empty() {
                    lines.push(Line::from(Span::styled(
                        format!("  {}", record.description),
                        Style::default().fg(Color::Gray),
                    )));
                }
                ListItem::new(lines)
            })
            .collect();

        let title = format!(
            " Results ({} found in {:.1}ms) ",
            state.results().len(),
            app.dispatcher.last_search_time().as_secs_f64() * 1000.0
        );

        let results = List::new(items)
            .block(block.title(title))
            .highlight_style(
                Style::default()
                    .bg(Color::Blue)
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            );

        f.render_stateful_widget(results, area, &mut app.list_state);
    }

    /// Draw the status bar.
    fn draw_status_bar(f: &mut Frame, app: &TuiApp, area: Rect) {
        let status = format!(
            "Source: {} | ↑↓:Navigate Ctrl+U:Clear Esc:Quit",
            app.source
        );
        let status_bar = Paragraph::new(status).style(Style::default().fg(Color::Gray));
        f.render_widget(status_bar, area);
    }
}

#[cfg(test)]
mod tests {
    use super::ui::input_viewport;
    use ratatui::text::Span;

    #[test]
    fn test_short_input_does_not_scroll() {
        assert_eq!(input_viewport(5, 40), (0, 5));
        assert_eq!(input_viewport(0, 40), (0, 0));
    }

    #[test]
    fn test_long_input_keeps_cursor_in_box() {
        assert_eq!(input_viewport(100, 40), (61, 39));
        assert_eq!(input_viewport(100_000, 40).1, 39);
        assert_eq!(input_viewport(3, 0), (3, 0));
    }

    #[test]
    fn test_wide_characters_use_display_width() {
        let width = Span::raw("intext:日本語").width();
        assert_eq!(width, 13);
        assert_eq!(input_viewport(width, 40), (0, 13));
    }
}
