use std::collections::HashMap;

use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row};
use time::OffsetDateTime;

use crate::{
    BulkAction, CategoryFilter, Database, Link, LinkBuilder, LinkError, LinkId, LinkStats,
    LinkStatus, LinkUpdate, NewLink, SortConfig, Source, StatusFilter, UNCATEGORIZED,
};

/// Settings key holding the persisted sort configuration as JSON.
const SORT_CONFIG_KEY: &str = "sort_config";

const LINK_COLUMNS: &str = "id, url, title, summary, category, status, created_at, due_date";

/// Options for listing links.
///
/// Filters by status, then by category, then sorts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListLinksOptions {
    pub status: StatusFilter,
    pub category: CategoryFilter,
    pub sort: SortConfig,
}

/// Service layer providing link management operations.
///
/// LinkService owns a Database instance and keeps the link collection and the
/// category list consistent: every category a link points at is present in
/// the category list. It is UI-independent and shared by the CLI and TUI.
///
/// # Examples
///
/// ```
/// use shelf::{Database, LinkMetadata, LinkService, NewLink};
///
/// # fn main() -> anyhow::Result<()> {
/// let service = LinkService::new(Database::in_memory()?);
///
/// let metadata = LinkMetadata::new("Rust", "The Rust language.", "Programming");
/// let link = service
///     .add_link(NewLink::new("https://www.rust-lang.org", metadata))?
///     .expect("first insert is not a duplicate");
///
/// assert_eq!(link.title(), "Rust");
/// # Ok(())
/// # }
/// ```
pub struct LinkService {
    db: Database,
}

impl LinkService {
    /// Creates a new LinkService with the given database.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Returns a reference to the underlying database.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Saves a new link.
    ///
    /// The URL is trimmed and must parse as an absolute URL. The link starts
    /// out `Pending` with the current time as `created_at`. A blank category
    /// becomes `Uncategorized`, and an unknown category is added to the
    /// category list.
    ///
    /// Returns `Ok(None)` without touching the store if a link with the same
    /// URL already exists.
    pub fn add_link(&self, new_link: NewLink) -> Result<Option<Link>> {
        let url = validate_url(&new_link.url)?;

        if let Some(existing) = self.find_by_url(&url)? {
            tracing::info!(url = %url, id = %existing.id(), "link already saved, skipping");
            return Ok(None);
        }

        let metadata = new_link.metadata;
        let created_at = now_millis();
        let conn = self.db.connection();
        let tx = conn.unchecked_transaction()?;

        let category = resolve_category(&tx, &metadata.category)?;
        tx.execute(
            "INSERT INTO links (url, title, summary, category, status, created_at, due_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                url,
                metadata.title.trim(),
                metadata.summary.trim(),
                category,
                LinkStatus::Pending.as_str(),
                to_millis(created_at),
                new_link.due_date.map(to_millis),
            ],
        )?;
        let id = LinkId::new(tx.last_insert_rowid());
        insert_sources(&tx, id, &metadata.sources)?;
        tx.commit()?;

        tracing::debug!(%id, url = %url, category = %category, "link saved");
        self.get_link(id)
    }

    /// Retrieves a link by its ID. Returns `None` if it does not exist.
    pub fn get_link(&self, id: LinkId) -> Result<Option<Link>> {
        let query = format!("SELECT {LINK_COLUMNS} FROM links WHERE id = ?1");
        self.query_one(&query, id.get())
    }

    /// Retrieves a link by its exact (trimmed) URL.
    pub fn find_by_url(&self, url: &str) -> Result<Option<Link>> {
        let query = format!("SELECT {LINK_COLUMNS} FROM links WHERE url = ?1");
        self.query_one(&query, url.trim())
    }

    /// Returns `true` if a link with this URL is already saved.
    pub fn contains_url(&self, url: &str) -> Result<bool> {
        let exists: bool = self.db.connection().query_row(
            "SELECT EXISTS(SELECT 1 FROM links WHERE url = ?1)",
            [url.trim()],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Lists links matching the options.
    ///
    /// The base order is newest first, so ties under the requested sort key
    /// keep that order.
    ///
    /// # Examples
    ///
    /// ```
    /// use shelf::{Database, LinkService, ListLinksOptions, LinkStatus, StatusFilter};
    ///
    /// # fn main() -> anyhow::Result<()> {
    /// let service = LinkService::new(Database::in_memory()?);
    /// let pending = service.list_links(&ListLinksOptions {
    ///     status: StatusFilter::Only(LinkStatus::Pending),
    ///     ..Default::default()
    /// })?;
    /// assert!(pending.is_empty());
    /// # Ok(())
    /// # }
    /// ```
    pub fn list_links(&self, options: &ListLinksOptions) -> Result<Vec<Link>> {
        let mut links: Vec<Link> = self
            .all_links()?
            .into_iter()
            .filter(|link| options.status.matches(link))
            .filter(|link| options.category.matches(link))
            .collect();

        options.sort.sort(&mut links);
        Ok(links)
    }

    /// Returns every link, newest first.
    pub fn all_links(&self) -> Result<Vec<Link>> {
        let conn = self.db.connection();
        let mut sources = load_all_sources(conn)?;

        let query = format!("SELECT {LINK_COLUMNS} FROM links ORDER BY created_at DESC, id DESC");
        let mut stmt = conn.prepare(&query)?;
        let rows = stmt.query_map([], read_link_row)?;

        let mut links = Vec::new();
        for row_result in rows {
            let row = row_result?;
            let link_sources = sources.remove(&row.id).unwrap_or_default();
            links.push(row.into_link(link_sources)?);
        }

        Ok(links)
    }

    /// Flips a link between `Pending` and `Done`.
    ///
    /// Returns the updated link, or `None` if the ID does not exist.
    pub fn toggle_status(&self, id: LinkId) -> Result<Option<Link>> {
        let changed = self.db.connection().execute(
            "UPDATE links
             SET status = CASE status WHEN 'DONE' THEN 'PENDING' ELSE 'DONE' END
             WHERE id = ?1",
            [id.get()],
        )?;

        if changed == 0 {
            return Ok(None);
        }
        self.get_link(id)
    }

    /// Applies a partial update to a link.
    ///
    /// Only fields present in `update` change. Titles are trimmed and may not
    /// be blank. A blank category becomes `Uncategorized`, and a new category
    /// is added to the category list.
    ///
    /// Returns the updated link, or `None` if the ID does not exist.
    pub fn update_link(&self, id: LinkId, update: LinkUpdate) -> Result<Option<Link>> {
        if self.get_link(id)?.is_none() {
            return Ok(None);
        }

        let conn = self.db.connection();
        let tx = conn.unchecked_transaction()?;

        if let Some(title) = &update.title {
            let title = title.trim();
            if title.is_empty() {
                return Err(LinkError::EmptyTitle.into());
            }
            tx.execute("UPDATE links SET title = ?1 WHERE id = ?2", (title, id.get()))?;
        }
        if let Some(summary) = &update.summary {
            tx.execute(
                "UPDATE links SET summary = ?1 WHERE id = ?2",
                (summary.trim(), id.get()),
            )?;
        }
        if let Some(category) = &update.category {
            let category = resolve_category(&tx, category)?;
            tx.execute(
                "UPDATE links SET category = ?1 WHERE id = ?2",
                (category, id.get()),
            )?;
        }
        if let Some(status) = update.status {
            tx.execute(
                "UPDATE links SET status = ?1 WHERE id = ?2",
                (status.as_str(), id.get()),
            )?;
        }
        if let Some(due_date) = update.due_date {
            tx.execute(
                "UPDATE links SET due_date = ?1 WHERE id = ?2",
                (due_date.map(to_millis), id.get()),
            )?;
        }

        tx.commit()?;
        self.get_link(id)
    }

    /// Deletes a link by its ID.
    ///
    /// Idempotent: returns `false` if nothing was deleted.
    pub fn delete_link(&self, id: LinkId) -> Result<bool> {
        let deleted = self
            .db
            .connection()
            .execute("DELETE FROM links WHERE id = ?1", [id.get()])?;
        Ok(deleted > 0)
    }

    /// Removes every link marked `Done`. Returns how many were removed.
    pub fn clear_completed(&self) -> Result<usize> {
        let removed = self
            .db
            .connection()
            .execute("DELETE FROM links WHERE status = 'DONE'", [])?;
        tracing::info!(removed, "cleared completed links");
        Ok(removed)
    }

    /// Applies one action to every listed link.
    ///
    /// Unknown IDs are ignored. Returns the number of links affected.
    pub fn bulk_apply(&self, ids: &[LinkId], action: &BulkAction) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        let conn = self.db.connection();
        let tx = conn.unchecked_transaction()?;
        let mut affected = 0;

        match action {
            BulkAction::Delete => {
                for id in ids {
                    affected += tx.execute("DELETE FROM links WHERE id = ?1", [id.get()])?;
                }
            }
            BulkAction::SetStatus(status) => {
                for id in ids {
                    affected += tx.execute(
                        "UPDATE links SET status = ?1 WHERE id = ?2",
                        (status.as_str(), id.get()),
                    )?;
                }
            }
            BulkAction::SetCategory(category) => {
                let category = resolve_category(&tx, category)?;
                for id in ids {
                    affected += tx.execute(
                        "UPDATE links SET category = ?1 WHERE id = ?2",
                        (&category, id.get()),
                    )?;
                }
            }
        }

        tx.commit()?;
        tracing::info!(?action, affected, "bulk action applied");
        Ok(affected)
    }

    /// Returns the category list sorted by name.
    pub fn list_categories(&self) -> Result<Vec<String>> {
        let conn = self.db.connection();
        let mut stmt = conn.prepare("SELECT name FROM categories ORDER BY name COLLATE NOCASE")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut names = Vec::new();
        for row_result in rows {
            names.push(row_result?);
        }
        Ok(names)
    }

    /// Adds a category to the list.
    ///
    /// The name is trimmed. Blank names and names already present (ignoring
    /// case) are a no-op. Returns `true` if a category was added.
    pub fn add_category(&self, name: &str) -> Result<bool> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(false);
        }

        let added = self.db.connection().execute(
            "INSERT OR IGNORE INTO categories (name) VALUES (?1)",
            [name],
        )?;
        Ok(added > 0)
    }

    /// Renames a category and relabels every link that used it.
    ///
    /// Matching of the old name ignores case. Renaming to a name that only
    /// differs in case is a no-op. Returns the number of links relabeled.
    ///
    /// # Errors
    ///
    /// Fails if the new name is blank, already taken, or the old name does
    /// not exist.
    pub fn rename_category(&self, old_name: &str, new_name: &str) -> Result<usize> {
        let old_name = old_name.trim();
        let new_name = new_name.trim();

        if new_name.is_empty() {
            return Err(LinkError::EmptyCategory.into());
        }
        if old_name.eq_ignore_ascii_case(new_name) {
            return Ok(0);
        }

        let conn = self.db.connection();
        if find_category(conn, old_name)?.is_none() {
            return Err(LinkError::UnknownCategory(old_name.to_string()).into());
        }
        if let Some(existing) = find_category(conn, new_name)? {
            return Err(LinkError::CategoryExists(existing).into());
        }

        let tx = conn.unchecked_transaction()?;
        let relabeled = tx.execute(
            "UPDATE links SET category = ?1 WHERE category = ?2 COLLATE NOCASE",
            (new_name, old_name),
        )?;
        tx.execute(
            "UPDATE categories SET name = ?1 WHERE name = ?2 COLLATE NOCASE",
            (new_name, old_name),
        )?;
        tx.commit()?;

        tracing::info!(from = old_name, to = new_name, relabeled, "category renamed");
        Ok(relabeled)
    }

    /// Deletes a category, moving its links to `Uncategorized`.
    ///
    /// Returns the number of links reassigned. Deleting a category that does
    /// not exist is a no-op.
    ///
    /// # Errors
    ///
    /// `Uncategorized` itself cannot be deleted.
    pub fn delete_category(&self, name: &str) -> Result<usize> {
        let name = name.trim();
        if name.eq_ignore_ascii_case(UNCATEGORIZED) {
            return Err(LinkError::ProtectedCategory.into());
        }

        let conn = self.db.connection();
        let tx = conn.unchecked_transaction()?;
        tx.execute(
            "INSERT OR IGNORE INTO categories (name) VALUES (?1)",
            [UNCATEGORIZED],
        )?;
        let reassigned = tx.execute(
            "UPDATE links SET category = ?1 WHERE category = ?2 COLLATE NOCASE",
            (UNCATEGORIZED, name),
        )?;
        tx.execute("DELETE FROM categories WHERE name = ?1 COLLATE NOCASE", [name])?;
        tx.commit()?;

        Ok(reassigned)
    }

    /// Computes dashboard statistics over all links.
    pub fn stats(&self) -> Result<LinkStats> {
        let conn = self.db.connection();
        let mut stmt = conn.prepare("SELECT category, status FROM links")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut stats = LinkStats::default();
        let mut counts: HashMap<String, usize> = HashMap::new();
        for row_result in rows {
            let (category, status) = row_result?;
            stats.total += 1;
            if status == LinkStatus::Done.as_str() {
                stats.completed += 1;
            } else {
                stats.pending += 1;
            }

            let category = if category.trim().is_empty() {
                UNCATEGORIZED.to_string()
            } else {
                category
            };
            *counts.entry(category).or_default() += 1;
        }

        let mut categories: Vec<(String, usize)> = counts.into_iter().collect();
        categories.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        stats.categories = categories;

        Ok(stats)
    }

    /// Returns the persisted sort configuration, or the default.
    ///
    /// An unreadable stored value falls back to the default.
    pub fn sort_config(&self) -> Result<SortConfig> {
        let Some(raw) = self.db.setting(SORT_CONFIG_KEY)? else {
            return Ok(SortConfig::default());
        };

        match serde_json::from_str(&raw) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable sort configuration");
                Ok(SortConfig::default())
            }
        }
    }

    /// Persists the sort configuration.
    pub fn set_sort_config(&self, config: SortConfig) -> Result<()> {
        let raw = serde_json::to_string(&config)?;
        self.db.set_setting(SORT_CONFIG_KEY, &raw)
    }

    /// Serializes every link as a pretty-printed JSON array, newest first.
    pub fn export_json(&self) -> Result<String> {
        let links = self.all_links()?;
        Ok(serde_json::to_string_pretty(&links)?)
    }

    /// Imports links from a JSON array produced by `export_json`.
    ///
    /// IDs in the file are ignored. URLs that are already saved are skipped,
    /// as are rows with an invalid URL or a blank title. Status, creation
    /// time and due date are preserved. Returns the number of links imported.
    pub fn import_json(&self, json: &str) -> Result<usize> {
        let links: Vec<Link> = serde_json::from_str(json)?;

        let conn = self.db.connection();
        let tx = conn.unchecked_transaction()?;
        let mut imported = 0;

        for link in links {
            let url = match validate_url(link.url()) {
                Ok(url) => url,
                Err(e) => {
                    tracing::warn!(url = link.url(), error = %e, "skipping invalid link during import");
                    continue;
                }
            };
            let title = link.title().trim();
            if title.is_empty() {
                tracing::warn!(url = %url, "skipping untitled link during import");
                continue;
            }

            let exists: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM links WHERE url = ?1)",
                [&url],
                |row| row.get(0),
            )?;
            if exists {
                tracing::debug!(url = %url, "skipping already saved link during import");
                continue;
            }

            let category = resolve_category(&tx, link.category())?;
            tx.execute(
                "INSERT INTO links (url, title, summary, category, status, created_at, due_date)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    url,
                    title,
                    link.summary().trim(),
                    category,
                    link.status().as_str(),
                    to_millis(link.created_at()),
                    link.due_date().map(to_millis),
                ],
            )?;
            let id = LinkId::new(tx.last_insert_rowid());
            insert_sources(&tx, id, link.sources())?;
            imported += 1;
        }

        tx.commit()?;
        Ok(imported)
    }

    fn query_one<P: rusqlite::ToSql>(&self, query: &str, param: P) -> Result<Option<Link>> {
        let conn = self.db.connection();
        let row = conn.query_row(query, [param], read_link_row).optional()?;

        match row {
            Some(row) => {
                let sources = load_sources(conn, row.id)?;
                Ok(Some(row.into_link(sources)?))
            }
            None => Ok(None),
        }
    }
}

/// Raw `links` row before timestamp conversion.
struct LinkRow {
    id: i64,
    url: String,
    title: String,
    summary: String,
    category: String,
    status: String,
    created_at: i64,
    due_date: Option<i64>,
}

impl LinkRow {
    fn into_link(self, sources: Vec<Source>) -> Result<Link> {
        let status = self
            .status
            .parse::<LinkStatus>()
            .map_err(|e| anyhow::anyhow!("corrupt status for link {}: {e}", self.id))?;

        Ok(LinkBuilder::new()
            .id(LinkId::new(self.id))
            .url(self.url)
            .title(self.title)
            .summary(self.summary)
            .category(self.category)
            .status(status)
            .created_at(from_millis(self.created_at)?)
            .due_date(self.due_date.map(from_millis).transpose()?)
            .sources(sources)
            .build())
    }
}

fn read_link_row(row: &Row<'_>) -> rusqlite::Result<LinkRow> {
    Ok(LinkRow {
        id: row.get(0)?,
        url: row.get(1)?,
        title: row.get(2)?,
        summary: row.get(3)?,
        category: row.get(4)?,
        status: row.get(5)?,
        created_at: row.get(6)?,
        due_date: row.get(7)?,
    })
}

fn load_sources(conn: &Connection, link_id: i64) -> Result<Vec<Source>> {
    let mut stmt =
        conn.prepare("SELECT uri, title FROM link_sources WHERE link_id = ?1 ORDER BY position")?;
    let rows = stmt.query_map([link_id], |row| {
        Ok(Source::new(row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut sources = Vec::new();
    for row_result in rows {
        sources.push(row_result?);
    }
    Ok(sources)
}

fn load_all_sources(conn: &Connection) -> Result<HashMap<i64, Vec<Source>>> {
    let mut stmt =
        conn.prepare("SELECT link_id, uri, title FROM link_sources ORDER BY link_id, position")?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            Source::new(row.get::<_, String>(1)?, row.get::<_, String>(2)?),
        ))
    })?;

    let mut sources: HashMap<i64, Vec<Source>> = HashMap::new();
    for row_result in rows {
        let (link_id, source) = row_result?;
        sources.entry(link_id).or_default().push(source);
    }
    Ok(sources)
}

fn insert_sources(conn: &Connection, id: LinkId, sources: &[Source]) -> Result<()> {
    for (position, source) in sources.iter().enumerate() {
        conn.execute(
            "INSERT INTO link_sources (link_id, position, uri, title) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![id.get(), position as i64, source.uri, source.title],
        )?;
    }
    Ok(())
}

fn find_category(conn: &Connection, name: &str) -> Result<Option<String>> {
    let existing = conn
        .query_row(
            "SELECT name FROM categories WHERE name = ?1 COLLATE NOCASE",
            [name],
            |row| row.get(0),
        )
        .optional()?;
    Ok(existing)
}

/// Returns the stored spelling of a category, creating it if needed.
///
/// Blank names resolve to `Uncategorized`.
fn resolve_category(conn: &Connection, name: &str) -> Result<String> {
    let name = name.trim();
    let name = if name.is_empty() { UNCATEGORIZED } else { name };

    if let Some(existing) = find_category(conn, name)? {
        return Ok(existing);
    }

    conn.execute("INSERT INTO categories (name) VALUES (?1)", [name])?;
    tracing::debug!(category = name, "category created");
    Ok(name.to_string())
}

/// Trims `url` and checks that it parses as an absolute URL.
///
/// # Errors
///
/// Returns `LinkError::EmptyUrl` or `LinkError::InvalidUrl`.
pub fn validate_url(url: &str) -> Result<String> {
    let url = url.trim();
    if url.is_empty() {
        return Err(LinkError::EmptyUrl.into());
    }
    reqwest::Url::parse(url).map_err(|_| LinkError::InvalidUrl(url.to_string()))?;
    Ok(url.to_string())
}

fn now_millis() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();
    // Truncate so a stored value reads back identical.
    now.replace_nanosecond(now.millisecond() as u32 * 1_000_000)
        .unwrap_or(now)
}

fn to_millis(timestamp: OffsetDateTime) -> i64 {
    (timestamp.unix_timestamp_nanos() / 1_000_000) as i64
}

fn from_millis(millis: i64) -> Result<OffsetDateTime> {
    Ok(OffsetDateTime::from_unix_timestamp_nanos(
        i128::from(millis) * 1_000_000,
    )?)
}

#[cfg(test)]
mod tests;
