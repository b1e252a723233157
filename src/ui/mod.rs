pub mod app;
pub mod components;

use crate::ui::app::{App, AppState};
use crate::ui::components::{
    render_details, render_footer, render_header, render_popup, render_scanning, render_tree,
};
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::prelude::*;
use std::time::Duration;

pub fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.area());

    render_header(f, app, chunks[0]);

    if let AppState::Scanning = app.state {
        render_scanning(f, app, chunks[1]);
    } else {
        let main_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(chunks[1]);

        render_tree(f, app, main_chunks[0]);
        render_details(f, app, main_chunks[1]);
    }

    render_footer(f, app, chunks[2]);
    render_popup(f, app);
}

pub fn run_app(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stderr>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        app.check_installed_status();
        if let AppState::Cleaning = app.state {
            app.check_cleaning_status();
        }
        // A rescan also runs behind the completion popup.
        if app.scan_task.is_some() {
            app.check_scan_status();
        }

        if event::poll(Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            match app.state {
                AppState::Browsing => match key.code {
                    KeyCode::Char('q') => return Ok(()),
                    KeyCode::Down | KeyCode::Char('j') => app.next(),
                    KeyCode::Up | KeyCode::Char('k') => app.previous(),
                    KeyCode::Right | KeyCode::Char('l') => app.expand(),
                    KeyCode::Left | KeyCode::Char('h') => app.collapse(),
                    KeyCode::Char(' ') => app.toggle(),
                    KeyCode::Char('a') => app.select_all(),
                    KeyCode::Char('n') => app.deselect_all(),
                    KeyCode::Char('r') => {
                        app.state = AppState::Scanning;
                        app.start_scan();
                    }
                    KeyCode::Enter => {
                        if app.total_selected_size() > 0 {
                            app.state = AppState::Confirming;
                        }
                    }
                    _ => {}
                },
                AppState::Confirming => match key.code {
                    KeyCode::Char('y') | KeyCode::Enter => app.clean_selected(),
                    KeyCode::Char('n' | 'q') | KeyCode::Esc => {
                        app.state = AppState::Browsing;
                    }
                    _ => {}
                },
                // Deletion is not interruptible.
                AppState::Cleaning => {}
                AppState::Scanning => {
                    if let KeyCode::Char('q') | KeyCode::Esc = key.code {
                        return Ok(());
                    }
                }
                AppState::Done(_) => match key.code {
                    KeyCode::Esc | KeyCode::Enter | KeyCode::Char(' ' | 'q') => {
                        app.state = if app.scan_task.is_some() {
                            AppState::Scanning
                        } else {
                            AppState::Browsing
                        };
                    }
                    _ => {}
                },
            }
        }
    }
}
