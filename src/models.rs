mod filter;
mod ids;
mod link;
mod link_status;
mod sort;

pub use filter::{BulkAction, CategoryFilter, LinkStats, StatusFilter};
pub use ids::LinkId;
pub use link::{
    ERROR_CATEGORY, Link, LinkBuilder, LinkMetadata, LinkUpdate, NewLink, Source, UNCATEGORIZED,
};
pub use link_status::LinkStatus;
pub use sort::{SortConfig, SortDirection, SortKey};
