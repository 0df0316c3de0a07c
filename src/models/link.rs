use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::{LinkId, LinkStatus};

/// Category assigned to links that have no other home.
///
/// It always exists and cannot be deleted.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Category used for links whose metadata could not be fetched.
pub const ERROR_CATEGORY: &str = "Error";

/// A web page the AI cited while summarizing a link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub uri: String,
    pub title: String,
}

impl Source {
    pub fn new(uri: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            title: title.into(),
        }
    }
}

/// Descriptive metadata for a URL, normally produced by the AI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkMetadata {
    pub title: String,
    pub summary: String,
    pub category: String,
    #[serde(default)]
    pub sources: Vec<Source>,
}

impl LinkMetadata {
    /// Creates metadata without sources.
    pub fn new(
        title: impl Into<String>,
        summary: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            summary: summary.into(),
            category: category.into(),
            sources: Vec::new(),
        }
    }

    /// Attaches grounding sources.
    pub fn with_sources(mut self, sources: Vec<Source>) -> Self {
        self.sources = sources;
        self
    }
}

/// Payload for saving a new link.
///
/// The ID, status and creation time are assigned by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLink {
    pub url: String,
    pub metadata: LinkMetadata,
    pub due_date: Option<OffsetDateTime>,
}

impl NewLink {
    pub fn new(url: impl Into<String>, metadata: LinkMetadata) -> Self {
        Self {
            url: url.into(),
            metadata,
            due_date: None,
        }
    }

    pub fn due_date(mut self, due_date: Option<OffsetDateTime>) -> Self {
        self.due_date = due_date;
        self
    }
}

/// Partial update of a link's editable fields.
///
/// `None` leaves a field untouched. For `due_date`, `Some(None)` clears it.
/// The URL, ID and creation time are never editable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkUpdate {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub category: Option<String>,
    pub status: Option<LinkStatus>,
    pub due_date: Option<Option<OffsetDateTime>>,
}

impl LinkUpdate {
    /// Returns `true` when no field would change.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.summary.is_none()
            && self.category.is_none()
            && self.status.is_none()
            && self.due_date.is_none()
    }
}

/// A saved link with its metadata and tracking state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    id: LinkId,
    url: String,
    title: String,
    summary: String,
    category: String,
    status: LinkStatus,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    due_date: Option<OffsetDateTime>,
    #[serde(default)]
    sources: Vec<Source>,
}

impl Link {
    pub fn id(&self) -> LinkId {
        self.id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn status(&self) -> LinkStatus {
        self.status
    }

    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    pub fn due_date(&self) -> Option<OffsetDateTime> {
        self.due_date
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    /// Returns `true` if the metadata fetch for this link failed.
    pub fn is_error(&self) -> bool {
        self.category == ERROR_CATEGORY
    }

    /// Returns `true` if the link is pending and its due date has passed.
    pub fn is_overdue(&self, now: OffsetDateTime) -> bool {
        !self.status.is_done() && self.due_date.is_some_and(|due| due < now)
    }
}

/// Builder for constructing `Link` instances.
///
/// # Examples
///
/// ```
/// use shelf::{LinkBuilder, LinkId, LinkStatus};
///
/// let link = LinkBuilder::new()
///     .id(LinkId::new(1))
///     .url("https://example.com")
///     .title("Example")
///     .build();
///
/// assert_eq!(link.title(), "Example");
/// assert_eq!(link.status(), LinkStatus::Pending);
/// assert_eq!(link.category(), "Uncategorized");
/// ```
#[derive(Debug, Default)]
pub struct LinkBuilder {
    id: Option<LinkId>,
    url: Option<String>,
    title: Option<String>,
    summary: Option<String>,
    category: Option<String>,
    status: Option<LinkStatus>,
    created_at: Option<OffsetDateTime>,
    due_date: Option<OffsetDateTime>,
    sources: Option<Vec<Source>>,
}

impl LinkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: LinkId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn status(mut self, status: LinkStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn created_at(mut self, created_at: OffsetDateTime) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn due_date(mut self, due_date: Option<OffsetDateTime>) -> Self {
        self.due_date = due_date;
        self
    }

    pub fn sources(mut self, sources: Vec<Source>) -> Self {
        self.sources = Some(sources);
        self
    }

    /// Builds the `Link`, using defaults for optional fields.
    ///
    /// # Panics
    ///
    /// Panics if `id` or `url` have not been set.
    pub fn build(self) -> Link {
        Link {
            id: self.id.expect("id is required"),
            url: self.url.expect("url is required"),
            title: self.title.unwrap_or_default(),
            summary: self.summary.unwrap_or_default(),
            category: self
                .category
                .unwrap_or_else(|| UNCATEGORIZED.to_string()),
            status: self.status.unwrap_or_default(),
            created_at: self.created_at.unwrap_or_else(OffsetDateTime::now_utc),
            due_date: self.due_date,
            sources: self.sources.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn sample() -> LinkBuilder {
        LinkBuilder::new()
            .id(LinkId::new(3))
            .url("https://blog.rust-lang.org")
            .title("Rust Blog")
            .summary("News from the Rust project.")
            .category("Programming")
    }

    #[test]
    fn builder_applies_defaults() {
        let link = LinkBuilder::new()
            .id(LinkId::new(1))
            .url("https://example.com")
            .build();

        assert_eq!(link.status(), LinkStatus::Pending);
        assert_eq!(link.category(), UNCATEGORIZED);
        assert!(link.due_date().is_none());
        assert!(link.sources().is_empty());
    }

    #[test]
    fn error_category_marks_failed_fetch() {
        let link = sample().category(ERROR_CATEGORY).build();
        assert!(link.is_error());
        assert!(!sample().build().is_error());
    }

    #[test]
    fn overdue_only_applies_to_pending_links_past_due() {
        let now = OffsetDateTime::now_utc();
        let yesterday = now - Duration::days(1);

        let overdue = sample().due_date(Some(yesterday)).build();
        assert!(overdue.is_overdue(now));

        let finished = sample()
            .due_date(Some(yesterday))
            .status(LinkStatus::Done)
            .build();
        assert!(!finished.is_overdue(now));

        let upcoming = sample().due_date(Some(now + Duration::days(2))).build();
        assert!(!upcoming.is_overdue(now));

        assert!(!sample().build().is_overdue(now));
    }

    #[test]
    fn link_json_uses_rfc3339_timestamps() {
        let created = time::macros::datetime!(2025-03-01 12:00 UTC);
        let link = sample()
            .created_at(created)
            .sources(vec![Source::new("https://rust-lang.org", "Rust")])
            .build();

        let json = serde_json::to_value(&link).unwrap();
        assert_eq!(json["created_at"], "2025-03-01T12:00:00Z");
        assert_eq!(json["status"], "PENDING");
        assert!(json["due_date"].is_null());

        let back: Link = serde_json::from_value(json).unwrap();
        assert_eq!(back, link);
    }

    #[test]
    fn link_update_reports_emptiness() {
        assert!(LinkUpdate::default().is_empty());

        let update = LinkUpdate {
            due_date: Some(None),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }
}
