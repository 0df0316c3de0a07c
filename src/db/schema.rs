/// Complete database schema for the link store.
///
/// Uses CREATE TABLE/INDEX IF NOT EXISTS for idempotent execution.
/// Timestamps are unix milliseconds.
pub const INITIAL_SCHEMA: &str = r#"
-- Links table: one row per saved URL
CREATE TABLE IF NOT EXISTS links (
    id INTEGER PRIMARY KEY,
    url TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    summary TEXT NOT NULL DEFAULT '',
    category TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'PENDING' CHECK (status IN ('PENDING', 'DONE')),
    created_at INTEGER NOT NULL,
    due_date INTEGER
);

-- Grounding sources cited by the AI when summarizing a link
CREATE TABLE IF NOT EXISTS link_sources (
    link_id INTEGER NOT NULL,
    position INTEGER NOT NULL,
    uri TEXT NOT NULL,
    title TEXT NOT NULL,
    PRIMARY KEY (link_id, position),
    FOREIGN KEY (link_id) REFERENCES links(id) ON DELETE CASCADE
);

-- Categories table: unique names (case-insensitive)
CREATE TABLE IF NOT EXISTS categories (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE COLLATE NOCASE
);

-- Key/value preferences such as the persisted sort order
CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_links_created ON links(created_at);
CREATE INDEX IF NOT EXISTS idx_links_category ON links(category COLLATE NOCASE);
CREATE INDEX IF NOT EXISTS idx_links_status ON links(status);
"#;

/// Categories available before the user creates any.
pub const DEFAULT_CATEGORIES: [&str; 6] = [
    "Technology",
    "News",
    "Productivity",
    "Lifestyle",
    "Programming",
    "Uncategorized",
];

/// Settings key recording that the default categories were seeded.
pub const SEEDED_KEY: &str = "categories_seeded";
