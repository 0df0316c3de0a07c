//! Terminal User Interface module for shelf.
//!
//! Provides a filter bar, link list and detail view (with markdown summaries)
//! using ratatui for rendering and crossterm for terminal management.

use std::io;
use std::panic;

use anyhow::{Context, Result};
use crossterm::{
    event::{self as crossterm_event, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::metadata::{MetadataFetcher, analyze_link};
use crate::models::BulkAction;
use crate::service::LinkService;

mod app;
pub mod event;
mod ui;

pub use app::{App, Focus};
use event::Action;

/// Initializes the terminal for TUI rendering.
///
/// # Errors
///
/// Returns an error if terminal initialization fails.
fn init_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).context("failed to create terminal")?;
    Ok(terminal)
}

/// Restores the terminal to its original state.
///
/// Always called before exiting the TUI, including on error.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;
    Ok(())
}

/// Minimal terminal restoration for the panic hook. Errors are ignored.
fn restore_terminal_panic() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen);
}

/// Installs a panic hook that restores the terminal before the original hook runs.
fn init_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        restore_terminal_panic();
        original_hook(panic_info);
    }));
}

/// Runs the main event loop for the TUI.
///
/// # Errors
///
/// Returns an error if event polling, rendering, a database operation or
/// terminal handling fails. Terminal state is always restored.
pub fn run_event_loop(
    app: &mut App,
    service: &LinkService,
    fetcher: &MetadataFetcher,
) -> Result<()> {
    let mut terminal = init_terminal()?;

    let result = run_event_loop_internal(app, service, fetcher, &mut terminal);

    if let Err(e) = restore_terminal(&mut terminal) {
        eprintln!("Error restoring terminal: {e}");
    }

    result
}

fn run_event_loop_internal(
    app: &mut App,
    service: &LinkService,
    fetcher: &MetadataFetcher,
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
) -> Result<()> {
    loop {
        terminal.draw(|frame| {
            ui::draw(frame, app);
        })?;

        if crossterm_event::poll(std::time::Duration::from_millis(100))?
            && let Event::Key(key) = crossterm_event::read()?
            && key.kind == KeyEventKind::Press
        {
            let Some(action) = event::handle_key_event(app, key) else {
                continue;
            };
            if action == Action::Quit {
                break;
            }
            if matches!(action, Action::Analyze(_)) {
                // Analysis blocks for a while; show feedback first.
                app.set_status_message("Running deep analysis...");
                terminal.draw(|frame| ui::draw(frame, app))?;
            }
            apply_action(app, service, fetcher, action)?;
        }
    }

    Ok(())
}

/// Carries out an action against the service and reloads the app state.
///
/// # Errors
///
/// Returns an error if a database operation fails.
fn apply_action(
    app: &mut App,
    service: &LinkService,
    fetcher: &MetadataFetcher,
    action: Action,
) -> Result<()> {
    let message = match action {
        Action::Quit => return Ok(()),
        Action::ToggleStatus(id) => match service.toggle_status(id)? {
            Some(link) => format!("Marked '{}' {}", link.title(), link.status()),
            None => format!("Link {id} no longer exists"),
        },
        Action::Delete(id) => {
            service.delete_link(id)?;
            "Link deleted".to_string()
        }
        Action::BulkSetStatus(ids, status) => {
            let count = service.bulk_apply(&ids, &BulkAction::SetStatus(status))?;
            app.clear_marks();
            format!("Marked {count} link(s) {status}")
        }
        Action::BulkDelete(ids) => {
            let count = service.bulk_apply(&ids, &BulkAction::Delete)?;
            app.clear_marks();
            format!("Deleted {count} link(s)")
        }
        Action::ClearCompleted => {
            let count = service.clear_completed()?;
            format!("Removed {count} completed link(s)")
        }
        Action::Analyze(id) => match analyze_link(service, fetcher, id)? {
            Some(link) => {
                app.reset_detail_scroll();
                format!("Analysis saved for '{}'", link.title())
            }
            None => format!("Link {id} no longer exists"),
        },
        Action::SaveSort => {
            service.set_sort_config(app.sort())?;
            format!("Sorted by {}", app.sort_label())
        }
    };

    load_links(app, service)?;
    app.set_status_message(message);
    Ok(())
}

/// Loads links, categories and stats from the database into the App.
///
/// # Errors
///
/// Returns an error if loading fails.
fn load_links(app: &mut App, service: &LinkService) -> Result<()> {
    let links = service.all_links().context("Failed to load links")?;
    let categories = service
        .list_categories()
        .context("Failed to load categories")?;
    let stats = service.stats().context("Failed to load stats")?;
    app.set_data(links, categories, stats);
    Ok(())
}

/// Entry point for the TUI application.
///
/// Opens the database, restores the saved sort order, loads links and starts
/// the event loop.
///
/// # Errors
///
/// Returns an error if the database cannot be opened, loading fails, or the
/// terminal cannot be driven.
pub fn run(config: &crate::Config) -> Result<()> {
    init_panic_hook();

    let db_path = config.database_path().context("Failed to get database path")?;
    crate::utils::ensure_database_directory(&db_path)
        .context("Failed to ensure database directory")?;
    let db = crate::Database::open(&db_path).context("Failed to open database")?;
    let service = LinkService::new(db);
    let fetcher = MetadataFetcher::from_config(config)?;

    let mut app = App::new();
    app.set_sort(service.sort_config()?);
    load_links(&mut app, &service).context("Failed to load links from database")?;

    run_event_loop(&mut app, &service, &fetcher).context("TUI event loop failed")?;

    Ok(())
}
