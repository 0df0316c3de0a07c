pub mod config;
pub mod db;
mod error;
pub mod gemini;
pub mod metadata;
pub mod models;
pub mod selection;
pub mod service;
pub mod share;
pub mod tui;
pub mod utils;

pub use config::Config;
pub use db::Database;
pub use error::LinkError;
pub use models::{
    BulkAction, CategoryFilter, ERROR_CATEGORY, Link, LinkBuilder, LinkId, LinkMetadata,
    LinkStats, LinkStatus, LinkUpdate, NewLink, SortConfig, SortDirection, SortKey, Source,
    StatusFilter, UNCATEGORIZED,
};
pub use selection::Selection;
pub use service::{LinkService, ListLinksOptions};
