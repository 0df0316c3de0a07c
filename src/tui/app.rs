use crate::models::{
    CategoryFilter, Link, LinkId, LinkStats, SortConfig, SortDirection, StatusFilter,
};
use crate::selection::Selection;

/// Application state for the TUI.
///
/// Holds every loaded link plus the view state that projects them: text
/// filter, status and category filters, sort order, cursor and multi-select.
#[derive(Debug, Clone)]
pub struct App {
    /// All loaded links (unfiltered)
    all_links: Vec<Link>,
    /// Links currently displayed after filtering and sorting
    links: Vec<Link>,
    /// Known categories, used for category filter cycling
    categories: Vec<String>,
    stats: LinkStats,
    /// Cursor position in `links`
    selected_index: Option<usize>,
    /// Text filter buffer
    search_input: String,
    focus: Focus,
    status_filter: StatusFilter,
    category_filter: CategoryFilter,
    sort: SortConfig,
    /// Links marked for bulk actions
    selection: Selection,
    /// Scroll offset for detail view
    detail_scroll: u16,
    show_stats: bool,
    /// One-line feedback shown above the shortcut bar
    status_message: Option<String>,
}

/// Panel focus state for keyboard navigation.
///
/// Determines which panel receives keyboard input and how keys are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    /// Filter bar is focused (typing narrows the list)
    FilterInput,
    /// Link list panel is focused (navigation and link actions)
    LinkList,
    /// Detail view panel is focused (scrolling)
    DetailView,
}

impl App {
    /// Creates a new App with default state.
    ///
    /// # Examples
    ///
    /// ```
    /// use shelf::tui::{App, Focus};
    ///
    /// let app = App::new();
    /// assert!(app.links().is_empty());
    /// assert_eq!(app.selected_index(), None);
    /// assert_eq!(app.focus(), Focus::FilterInput);
    /// ```
    pub fn new() -> Self {
        Self {
            all_links: Vec::new(),
            links: Vec::new(),
            categories: Vec::new(),
            stats: LinkStats::default(),
            selected_index: None,
            search_input: String::new(),
            focus: Focus::FilterInput,
            status_filter: StatusFilter::All,
            category_filter: CategoryFilter::All,
            sort: SortConfig::default(),
            selection: Selection::new(),
            detail_scroll: 0,
            show_stats: false,
            status_message: None,
        }
    }

    /// Returns the currently displayed (filtered and sorted) links.
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn all_links(&self) -> &[Link] {
        &self.all_links
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn stats(&self) -> &LinkStats {
        &self.stats
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected_index
    }

    pub fn search_input(&self) -> &str {
        &self.search_input
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn status_filter(&self) -> StatusFilter {
        self.status_filter
    }

    pub fn category_filter(&self) -> &CategoryFilter {
        &self.category_filter
    }

    pub fn sort(&self) -> SortConfig {
        self.sort
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn show_stats(&self) -> bool {
        self.show_stats
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    /// Replaces the loaded data after a reload from the database.
    ///
    /// The cursor stays on the same link when it is still visible. Links
    /// that no longer exist are dropped from the multi-select.
    pub fn set_data(&mut self, links: Vec<Link>, categories: Vec<String>, stats: LinkStats) {
        let current = self.selected_link().map(Link::id);

        for id in self.selection.ids() {
            if !links.iter().any(|link| link.id() == id) {
                self.selection.remove(id);
            }
        }

        self.all_links = links;
        self.categories = categories;
        self.stats = stats;
        self.refresh_view();

        self.selected_index = current
            .and_then(|id| self.links.iter().position(|link| link.id() == id))
            .or_else(|| {
                self.selected_index
                    .filter(|_| !self.links.is_empty())
                    .map(|i| i.min(self.links.len() - 1))
            });
    }

    /// Sets the sort order without clearing the selection (used at startup).
    pub fn set_sort(&mut self, sort: SortConfig) {
        self.sort = sort;
        self.refresh_view();
    }

    /// Recomputes the displayed links: status filter, then category filter,
    /// then the text filter, then sorting.
    fn refresh_view(&mut self) {
        let query = self.search_input.to_lowercase();

        let mut links: Vec<Link> = self
            .all_links
            .iter()
            .filter(|link| self.status_filter.matches(link))
            .filter(|link| self.category_filter.matches(link))
            .filter(|link| query.is_empty() || matches_query(link, &query))
            .cloned()
            .collect();
        self.sort.sort(&mut links);
        self.links = links;
    }

    /// Applies a filter or sort change: clears the multi-select and the cursor.
    fn view_changed(&mut self) {
        self.selection.clear();
        self.refresh_view();
        self.selected_index = None;
        self.detail_scroll = 0;
    }

    /// Cycles the status filter All -> Pending -> Done -> All.
    pub fn cycle_status_filter(&mut self) {
        self.status_filter = self.status_filter.next();
        self.view_changed();
    }

    /// Cycles the category filter through All and each known category.
    pub fn cycle_category_filter(&mut self) {
        self.category_filter = self.category_filter.next(&self.categories);
        self.view_changed();
    }

    /// Advances to the next sort key, keeping the direction.
    pub fn cycle_sort_key(&mut self) {
        self.sort.key = self.sort.key.next();
        self.view_changed();
    }

    /// Flips ascending/descending.
    ///
    /// # Examples
    ///
    /// ```
    /// use shelf::SortDirection;
    /// use shelf::tui::App;
    ///
    /// let mut app = App::new();
    /// assert_eq!(app.sort().direction, SortDirection::Desc);
    ///
    /// app.toggle_sort_direction();
    /// assert_eq!(app.sort().direction, SortDirection::Asc);
    /// ```
    pub fn toggle_sort_direction(&mut self) {
        self.sort.direction = self.sort.direction.toggled();
        self.view_changed();
    }

    /// Returns the link under the cursor, if any.
    pub fn selected_link(&self) -> Option<&Link> {
        self.selected_index.and_then(|i| self.links.get(i))
    }

    /// Marks or unmarks the link under the cursor for bulk actions.
    pub fn toggle_mark_selected(&mut self) {
        if let Some(id) = self.selected_link().map(Link::id) {
            self.selection.toggle(id);
        }
    }

    /// Marks every visible link, or unmarks them if all are already marked.
    pub fn toggle_mark_all_visible(&mut self) {
        let visible = self.visible_ids();
        self.selection.toggle_all(&visible);
    }

    /// Returns `true` when every visible link is marked.
    pub fn all_visible_marked(&self) -> bool {
        self.selection.covers(&self.visible_ids())
    }

    pub fn clear_marks(&mut self) {
        self.selection.clear();
    }

    fn visible_ids(&self) -> Vec<LinkId> {
        self.links.iter().map(Link::id).collect()
    }

    /// Toggles the stats dashboard.
    pub fn toggle_stats(&mut self) {
        self.show_stats = !self.show_stats;
    }

    /// Resets the detail view to its top, e.g. after the summary changed.
    pub fn reset_detail_scroll(&mut self) {
        self.detail_scroll = 0;
    }

    /// Cycles focus to the next panel in Tab order.
    ///
    /// Order: `FilterInput` -> `LinkList` -> `DetailView` -> `FilterInput`
    ///
    /// # Examples
    ///
    /// ```
    /// use shelf::tui::{App, Focus};
    ///
    /// let mut app = App::new();
    /// app.next_focus();
    /// assert_eq!(app.focus(), Focus::LinkList);
    ///
    /// app.next_focus();
    /// assert_eq!(app.focus(), Focus::DetailView);
    ///
    /// app.next_focus();
    /// assert_eq!(app.focus(), Focus::FilterInput);
    /// ```
    pub fn next_focus(&mut self) {
        self.focus = match self.focus {
            Focus::FilterInput => Focus::LinkList,
            Focus::LinkList => Focus::DetailView,
            Focus::DetailView => Focus::FilterInput,
        };
        self.auto_select_on_link_list_focus();
    }

    /// Cycles focus to the previous panel in reverse Tab order.
    pub fn prev_focus(&mut self) {
        self.focus = match self.focus {
            Focus::FilterInput => Focus::DetailView,
            Focus::LinkList => Focus::FilterInput,
            Focus::DetailView => Focus::LinkList,
        };
        self.auto_select_on_link_list_focus();
    }

    /// Auto-selects first link when entering LinkList focus with no cursor.
    fn auto_select_on_link_list_focus(&mut self) {
        if self.focus == Focus::LinkList && self.selected_index.is_none() && !self.links.is_empty()
        {
            self.selected_index = Some(0);
        }
    }

    /// Moves the cursor down, wrapping to the top.
    ///
    /// # Examples
    ///
    /// ```
    /// use shelf::tui::App;
    /// use shelf::{LinkBuilder, LinkId, LinkStats};
    ///
    /// let mut app = App::new();
    /// let links = vec![
    ///     LinkBuilder::new().id(LinkId::new(1)).url("https://a.example").build(),
    ///     LinkBuilder::new().id(LinkId::new(2)).url("https://b.example").build(),
    /// ];
    /// app.set_data(links, Vec::new(), LinkStats::default());
    ///
    /// app.select_next();
    /// assert_eq!(app.selected_index(), Some(0));
    /// app.select_next();
    /// assert_eq!(app.selected_index(), Some(1));
    /// app.select_next();
    /// assert_eq!(app.selected_index(), Some(0));
    /// ```
    pub fn select_next(&mut self) {
        if self.links.is_empty() {
            self.selected_index = None;
            return;
        }

        self.selected_index = Some(match self.selected_index {
            None => 0,
            Some(i) if i + 1 >= self.links.len() => 0,
            Some(i) => i + 1,
        });
        self.detail_scroll = 0;
    }

    /// Moves the cursor up, wrapping to the bottom.
    pub fn select_previous(&mut self) {
        if self.links.is_empty() {
            self.selected_index = None;
            return;
        }

        self.selected_index = Some(match self.selected_index {
            None | Some(0) => self.links.len() - 1,
            Some(i) => i - 1,
        });
        self.detail_scroll = 0;
    }

    pub fn detail_scroll(&self) -> u16 {
        self.detail_scroll
    }

    pub fn scroll_detail_down(&mut self, amount: u16) {
        self.detail_scroll = self.detail_scroll.saturating_add(amount);
    }

    pub fn scroll_detail_up(&mut self, amount: u16) {
        self.detail_scroll = self.detail_scroll.saturating_sub(amount);
    }

    /// Adds a character to the text filter.
    pub fn push_search_char(&mut self, c: char) {
        self.search_input.push(c);
        self.view_changed();
    }

    /// Removes the last character from the text filter.
    pub fn pop_search_char(&mut self) {
        if self.search_input.pop().is_some() {
            self.view_changed();
        }
    }

    /// Clears the cursor (Esc key behavior).
    pub fn clear_cursor(&mut self) {
        self.selected_index = None;
    }

    /// Returns focus to the filter bar (Esc key behavior).
    pub fn reset_focus(&mut self) {
        self.focus = Focus::FilterInput;
    }

    /// Label for the current sort, e.g. `Title ↑`.
    pub fn sort_label(&self) -> String {
        let arrow = match self.sort.direction {
            SortDirection::Asc => '↑',
            SortDirection::Desc => '↓',
        };
        format!("{} {arrow}", self.sort.key.label())
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

fn matches_query(link: &Link, query: &str) -> bool {
    [link.title(), link.url(), link.summary(), link.category()]
        .iter()
        .any(|field| field.to_lowercase().contains(query))
}
