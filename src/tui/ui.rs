//! UI rendering functions for the TUI.
//!
//! Filter bar on top, link list and detail view side by side, an optional
//! stats dashboard, and a status line plus shortcut bar at the bottom.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Gauge, List, ListItem, ListState, Paragraph, Wrap},
};
use time::OffsetDateTime;

use super::app::{App, Focus};
use crate::models::Link;
use crate::utils::format_date;

/// Height of the stats dashboard when expanded.
const STATS_HEIGHT: u16 = 8;

/// Main rendering function for the TUI.
pub fn draw(frame: &mut Frame, app: &App) {
    let stats_height = if app.show_stats() { STATS_HEIGHT } else { 0 };

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),            // Filter bar
            Constraint::Length(stats_height), // Stats dashboard
            Constraint::Min(0),               // Content area
            Constraint::Length(1),            // Status line
            Constraint::Length(1),            // Shortcut bar
        ])
        .split(frame.area());

    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(main_chunks[2]);

    render_filter_bar(frame, app, main_chunks[0]);
    if app.show_stats() {
        render_stats(frame, app, main_chunks[1]);
    }
    render_link_list(frame, app, content_chunks[0]);
    render_detail_view(frame, app, content_chunks[1]);
    render_status_line(frame, app, main_chunks[3]);
    render_shortcut_bar(frame, app, main_chunks[4]);
}

fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    }
}

/// Renders the filter bar: text filter plus the active status, category and
/// sort settings in the title.
fn render_filter_bar(frame: &mut Frame, app: &App, area: Rect) {
    let is_focused = app.focus() == Focus::FilterInput;

    let title = format!(
        "Filter [{} | {} | {}]",
        app.status_filter(),
        app.category_filter(),
        app.sort_label()
    );
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(border_style(is_focused));

    let mut content = app.search_input().to_string();
    if is_focused {
        content.push('█');
    }

    frame.render_widget(Paragraph::new(content).block(block), area);
}

fn render_stats(frame: &mut Frame, app: &App, area: Rect) {
    let stats = app.stats();
    let block = Block::default().borders(Borders::ALL).title("Stats");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Min(0)])
        .split(inner);

    let totals = Line::from(vec![
        Span::styled("Total ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(stats.total.to_string()),
        Span::raw("   "),
        Span::styled("Pending ", Style::default().fg(Color::Yellow)),
        Span::raw(stats.pending.to_string()),
        Span::raw("   "),
        Span::styled("Completed ", Style::default().fg(Color::Green)),
        Span::raw(stats.completed.to_string()),
    ]);
    frame.render_widget(Paragraph::new(totals), rows[0]);

    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(Color::Green))
        .percent(u16::from(stats.completion_percent()));
    frame.render_widget(gauge, rows[1]);

    let categories: Vec<Line> = stats
        .categories
        .iter()
        .map(|(name, count)| {
            Line::from(vec![
                Span::styled(format!("{count:>4} "), Style::default().fg(Color::Cyan)),
                Span::raw(name.clone()),
            ])
        })
        .collect();
    frame.render_widget(Paragraph::new(categories), rows[2]);
}

/// Renders one row of the link list: marker, checkbox, title, category and
/// due date.
fn link_item(link: &Link, marked: bool, now: OffsetDateTime) -> ListItem<'static> {
    let marker = if marked { "● " } else { "  " };
    let check = if link.status().is_done() { "[x] " } else { "[ ] " };

    let title_style = if link.status().is_done() {
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::CROSSED_OUT)
    } else if link.is_error() {
        Style::default().fg(Color::Red)
    } else {
        Style::default()
    };

    let mut spans = vec![
        Span::styled(marker, Style::default().fg(Color::Magenta)),
        Span::raw(check),
        Span::styled(link.title().to_string(), title_style),
        Span::raw(" "),
        Span::styled(
            format!("[{}]", link.category()),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        ),
    ];

    if let Some(due) = link.due_date() {
        let style = if link.is_overdue(now) {
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Yellow)
        };
        spans.push(Span::styled(format!(" due {}", format_date(due)), style));
    }

    ListItem::new(Line::from(spans))
}

fn render_link_list(frame: &mut Frame, app: &App, area: Rect) {
    let is_focused = app.focus() == Focus::LinkList;

    let mut title = format!("Links ({}/{})", app.links().len(), app.all_links().len());
    if !app.selection().is_empty() {
        title.push_str(&format!(" - {} marked", app.selection().len()));
    }
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(border_style(is_focused));

    if app.links().is_empty() {
        let message = if app.all_links().is_empty() {
            "No links saved yet. Add one with `shelf add <URL>`."
        } else {
            "No links match the current filters."
        };
        let paragraph = Paragraph::new(message)
            .block(block)
            .style(Style::default().fg(Color::DarkGray))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
        return;
    }

    let now = OffsetDateTime::now_utc();
    let items: Vec<ListItem> = app
        .links()
        .iter()
        .map(|link| link_item(link, app.selection().contains(link.id()), now))
        .collect();

    let list = List::new(items).block(block).highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::REVERSED),
    );

    let mut list_state = ListState::default();
    list_state.select(app.selected_index());

    frame.render_stateful_widget(list, area, &mut list_state);
}

/// Builds the detail text for a link: header fields, the summary rendered
/// as markdown and grounding sources.
fn detail_text(link: &Link) -> Text<'_> {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let muted = Style::default().fg(Color::DarkGray);

    let mut text = Text::default();
    text.lines.push(Line::from(Span::styled(link.title(), bold)));
    text.lines.push(Line::from(Span::styled(
        link.url(),
        Style::default()
            .fg(Color::Blue)
            .add_modifier(Modifier::UNDERLINED),
    )));
    text.lines.push(Line::from(""));

    let mut fields = vec![
        ("Category:", link.category().to_string()),
        ("Status:", link.status().to_string()),
        ("Saved:", format_date(link.created_at())),
    ];
    if let Some(due) = link.due_date() {
        fields.push(("Due:", format_date(due)));
    }
    for (label, value) in fields {
        text.lines.push(Line::from(vec![
            Span::styled(label, bold),
            Span::raw(" "),
            Span::styled(value, muted),
        ]));
    }

    if !link.summary().is_empty() {
        text.lines.push(Line::from(""));
        text.lines
            .extend(tui_markdown::from_str(link.summary()).lines);
    }

    if !link.sources().is_empty() {
        text.lines.push(Line::from(""));
        text.lines.push(Line::from(Span::styled("Sources:", bold)));
        for source in link.sources() {
            text.lines.push(Line::from(vec![
                Span::raw("  - "),
                Span::styled(source.title.as_str(), Style::default().fg(Color::Cyan)),
                Span::raw(" "),
                Span::styled(source.uri.as_str(), muted),
            ]));
        }
    }

    text
}

fn render_detail_view(frame: &mut Frame, app: &App, area: Rect) {
    let is_focused = app.focus() == Focus::DetailView;

    let block = Block::default()
        .borders(Borders::ALL)
        .title("Detail")
        .border_style(border_style(is_focused));

    let content = match app.selected_link() {
        Some(link) => detail_text(link),
        None => Text::from("No link selected"),
    };

    let paragraph = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.detail_scroll(), 0));

    frame.render_widget(paragraph, area);
}

fn render_status_line(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(message) = app.status_message() {
        let line = Line::from(Span::styled(message, Style::default().fg(Color::Yellow)));
        frame.render_widget(Paragraph::new(line), area);
    }
}

/// Renders the shortcut bar at the bottom of the screen.
///
/// Shows context-aware keyboard shortcuts based on current focus state.
fn render_shortcut_bar(frame: &mut Frame, app: &App, area: Rect) {
    let key_style = Style::default().fg(Color::Cyan);
    let sep_style = Style::default().fg(Color::DarkGray);

    let mut shortcuts = vec![("Tab", "next panel"), ("Esc", "filter")];
    match app.focus() {
        Focus::FilterInput => shortcuts.push(("Ctrl+C", "quit")),
        Focus::LinkList => {
            shortcuts.extend([
                ("q", "quit"),
                ("t", "toggle"),
                ("d", "delete"),
                ("Space/a", "mark"),
                ("s/c", "filter"),
                ("o/r", "sort"),
                ("A", "analyze"),
                ("S", "stats"),
                ("C", "clear done"),
            ]);
            if !app.selection().is_empty() {
                shortcuts.extend([("m/u", "mark done/pending"), ("x", "delete marked")]);
            }
        }
        Focus::DetailView => shortcuts.extend([("q", "quit"), ("j/k", "scroll"), ("A", "analyze")]),
    }

    let mut spans = Vec::new();
    for (i, (key, action)) in shortcuts.into_iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", sep_style));
        }
        spans.push(Span::styled(key, key_style));
        spans.push(Span::raw(format!(": {action}")));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
