//! Keyboard event handling for the TUI.
//!
//! Maps crossterm keyboard events to application state changes. Pure view
//! changes (focus, cursor, filters, marks) are applied to `App` directly;
//! anything that touches the database or the AI is returned as an `Action`
//! for the event loop to carry out.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::app::{App, Focus};
use crate::models::{LinkId, LinkStatus};

/// Work requested by a key press that needs the service layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Quit,
    ToggleStatus(LinkId),
    Delete(LinkId),
    BulkSetStatus(Vec<LinkId>, LinkStatus),
    BulkDelete(Vec<LinkId>),
    ClearCompleted,
    Analyze(LinkId),
    /// Persist the current sort order.
    SaveSort,
}

/// Handles a keyboard event and updates the app state accordingly.
///
/// # Event Handling
///
/// - `Ctrl+C`: quit from anywhere; `q` quits outside the filter bar
/// - `Tab` / `Shift+Tab`: cycle focus between panels
/// - `Esc`: return to the filter bar
/// - Filter bar: typing narrows the list
/// - Link list: `j`/`k` move, `Space` marks, `a` marks all visible,
///   `t`/`Enter` toggle status, `d` delete, `m`/`u`/`x` mark done, mark
///   pending or delete the marked links, `C` clear completed, `A` deep
///   analysis, `s`/`c` cycle status/category filter, `o`/`r` cycle sort
///   key/reverse, `S` stats dashboard
/// - Detail view: `j`/`k` scroll
///
/// # Examples
///
/// ```
/// use shelf::tui::{App, event::{Action, handle_key_event}};
/// use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
///
/// let mut app = App::new();
/// let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
/// assert_eq!(handle_key_event(&mut app, key), Some(Action::Quit));
/// ```
pub fn handle_key_event(app: &mut App, key: KeyEvent) -> Option<Action> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(Action::Quit);
    }
    if key.code == KeyCode::Char('q') && key.modifiers.is_empty() && app.focus() != Focus::FilterInput
    {
        return Some(Action::Quit);
    }

    match key.code {
        KeyCode::Tab => {
            app.next_focus();
            return None;
        }
        KeyCode::BackTab => {
            app.prev_focus();
            return None;
        }
        KeyCode::Esc => {
            app.reset_focus();
            app.clear_cursor();
            return None;
        }
        _ => {}
    }

    match app.focus() {
        Focus::FilterInput => {
            handle_filter_input(app, key);
            None
        }
        Focus::LinkList => handle_link_list(app, key),
        Focus::DetailView => handle_detail_view(app, key),
    }
}

fn handle_filter_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char(c) if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT => {
            app.push_search_char(c);
        }
        KeyCode::Backspace => app.pop_search_char(),
        KeyCode::Enter | KeyCode::Down => app.next_focus(),
        _ => {}
    }
}

fn handle_link_list(app: &mut App, key: KeyEvent) -> Option<Action> {
    let current = app.selected_link().map(|link| link.id());
    let marked = app.selection().ids();

    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.select_next(),
        KeyCode::Char('k') | KeyCode::Up => app.select_previous(),
        KeyCode::Char(' ') => app.toggle_mark_selected(),
        KeyCode::Char('a') => app.toggle_mark_all_visible(),
        KeyCode::Char('t') | KeyCode::Enter => return current.map(Action::ToggleStatus),
        KeyCode::Char('d') => return current.map(Action::Delete),
        KeyCode::Char('A') => return current.map(Action::Analyze),
        KeyCode::Char('m') if !marked.is_empty() => {
            return Some(Action::BulkSetStatus(marked, LinkStatus::Done));
        }
        KeyCode::Char('u') if !marked.is_empty() => {
            return Some(Action::BulkSetStatus(marked, LinkStatus::Pending));
        }
        KeyCode::Char('x') if !marked.is_empty() => return Some(Action::BulkDelete(marked)),
        KeyCode::Char('C') => return Some(Action::ClearCompleted),
        KeyCode::Char('s') => app.cycle_status_filter(),
        KeyCode::Char('c') => app.cycle_category_filter(),
        KeyCode::Char('o') => {
            app.cycle_sort_key();
            return Some(Action::SaveSort);
        }
        KeyCode::Char('r') => {
            app.toggle_sort_direction();
            return Some(Action::SaveSort);
        }
        KeyCode::Char('S') => app.toggle_stats(),
        _ => {}
    }
    None
}

fn handle_detail_view(app: &mut App, key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.scroll_detail_down(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_detail_up(1),
        KeyCode::PageDown => app.scroll_detail_down(10),
        KeyCode::PageUp => app.scroll_detail_up(10),
        KeyCode::Char('A') => return app.selected_link().map(|link| Action::Analyze(link.id())),
        _ => {}
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LinkBuilder, LinkStats};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn char_key(c: char) -> KeyEvent {
        key(KeyCode::Char(c))
    }

    fn app_with_links() -> App {
        let mut app = App::new();
        let links = (1..=3)
            .map(|id| {
                LinkBuilder::new()
                    .id(LinkId::new(id))
                    .url(format!("https://example.com/{id}"))
                    .title(format!("Link {id}"))
                    .build()
            })
            .collect();
        app.set_data(links, vec!["News".into()], LinkStats::default());
        app
    }

    fn focus_list(app: &mut App) {
        handle_key_event(app, key(KeyCode::Tab));
        assert_eq!(app.focus(), Focus::LinkList);
    }

    #[test]
    fn ctrl_c_quits_from_any_focus() {
        let mut app = App::new();
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(handle_key_event(&mut app, ctrl_c), Some(Action::Quit));

        app.next_focus();
        assert_eq!(handle_key_event(&mut app, ctrl_c), Some(Action::Quit));
    }

    #[test]
    fn q_types_into_filter_but_quits_from_list() {
        let mut app = App::new();
        assert_eq!(handle_key_event(&mut app, char_key('q')), None);
        assert_eq!(app.search_input(), "q");

        app.next_focus();
        assert_eq!(handle_key_event(&mut app, char_key('q')), Some(Action::Quit));
    }

    #[test]
    fn tab_key_cycles_focus() {
        let mut app = App::new();
        handle_key_event(&mut app, key(KeyCode::Tab));
        assert_eq!(app.focus(), Focus::LinkList);
        handle_key_event(&mut app, key(KeyCode::Tab));
        assert_eq!(app.focus(), Focus::DetailView);
        handle_key_event(&mut app, key(KeyCode::Tab));
        assert_eq!(app.focus(), Focus::FilterInput);
    }

    #[test]
    fn shift_tab_cycles_focus_backwards() {
        let mut app = App::new();
        let back_tab = KeyEvent::new(KeyCode::BackTab, KeyModifiers::SHIFT);
        handle_key_event(&mut app, back_tab);
        assert_eq!(app.focus(), Focus::DetailView);
        handle_key_event(&mut app, back_tab);
        assert_eq!(app.focus(), Focus::LinkList);
    }

    #[test]
    fn esc_returns_to_filter_and_clears_cursor() {
        let mut app = app_with_links();
        focus_list(&mut app);
        assert_eq!(app.selected_index(), Some(0));

        handle_key_event(&mut app, key(KeyCode::Esc));
        assert_eq!(app.focus(), Focus::FilterInput);
        assert_eq!(app.selected_index(), None);
    }

    #[test]
    fn typing_filters_and_backspace_restores() {
        let mut app = app_with_links();
        for c in "link 2".chars() {
            handle_key_event(&mut app, char_key(c));
        }
        assert_eq!(app.links().len(), 1);

        handle_key_event(&mut app, key(KeyCode::Backspace));
        assert_eq!(app.links().len(), 3);
    }

    #[test]
    fn list_keys_request_link_actions() {
        let mut app = app_with_links();
        focus_list(&mut app);
        let first = app.selected_link().unwrap().id();

        assert_eq!(
            handle_key_event(&mut app, char_key('t')),
            Some(Action::ToggleStatus(first))
        );
        assert_eq!(
            handle_key_event(&mut app, key(KeyCode::Enter)),
            Some(Action::ToggleStatus(first))
        );
        assert_eq!(handle_key_event(&mut app, char_key('d')), Some(Action::Delete(first)));
        assert_eq!(handle_key_event(&mut app, char_key('A')), Some(Action::Analyze(first)));
        assert_eq!(handle_key_event(&mut app, char_key('C')), Some(Action::ClearCompleted));
    }

    #[test]
    fn bulk_keys_need_marked_links() {
        let mut app = app_with_links();
        focus_list(&mut app);
        assert_eq!(handle_key_event(&mut app, char_key('m')), None);

        handle_key_event(&mut app, char_key(' '));
        handle_key_event(&mut app, char_key('j'));
        handle_key_event(&mut app, char_key(' '));
        let marked = app.selection().ids();
        assert_eq!(marked.len(), 2);

        assert_eq!(
            handle_key_event(&mut app, char_key('m')),
            Some(Action::BulkSetStatus(marked.clone(), LinkStatus::Done))
        );
        assert_eq!(
            handle_key_event(&mut app, char_key('u')),
            Some(Action::BulkSetStatus(marked.clone(), LinkStatus::Pending))
        );
        assert_eq!(handle_key_event(&mut app, char_key('x')), Some(Action::BulkDelete(marked)));
    }

    #[test]
    fn select_all_key_marks_every_visible_link() {
        let mut app = app_with_links();
        focus_list(&mut app);
        handle_key_event(&mut app, char_key('a'));
        assert!(app.all_visible_marked());

        handle_key_event(&mut app, char_key('a'));
        assert!(app.selection().is_empty());
    }

    #[test]
    fn sort_keys_request_persisting() {
        let mut app = app_with_links();
        focus_list(&mut app);
        assert_eq!(handle_key_event(&mut app, char_key('o')), Some(Action::SaveSort));
        assert_eq!(handle_key_event(&mut app, char_key('r')), Some(Action::SaveSort));
    }

    #[test]
    fn filter_keys_update_view_only() {
        let mut app = app_with_links();
        focus_list(&mut app);

        assert_eq!(handle_key_event(&mut app, char_key('s')), None);
        assert_eq!(app.status_filter().to_string(), "pending");

        assert_eq!(handle_key_event(&mut app, char_key('S')), None);
        assert!(app.show_stats());
    }

    #[test]
    fn detail_view_scrolls() {
        let mut app = app_with_links();
        app.prev_focus();
        assert_eq!(app.focus(), Focus::DetailView);

        handle_key_event(&mut app, char_key('j'));
        handle_key_event(&mut app, char_key('j'));
        assert_eq!(app.detail_scroll(), 2);

        handle_key_event(&mut app, char_key('k'));
        assert_eq!(app.detail_scroll(), 1);
    }
}
