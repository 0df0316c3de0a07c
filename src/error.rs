use thiserror::Error;

use crate::LinkId;

/// Errors caused by invalid user input rather than by the system.
///
/// The CLI maps these to exit code 1; anything else exits with 2.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LinkError {
    #[error("URL cannot be empty")]
    EmptyUrl,

    #[error("Please enter a valid URL: {0}")]
    InvalidUrl(String),

    #[error("Title cannot be empty")]
    EmptyTitle,

    #[error("Link {0} not found")]
    NotFound(LinkId),

    #[error("Category name cannot be empty")]
    EmptyCategory,

    #[error("Category \"{0}\" already exists")]
    CategoryExists(String),

    #[error("Category \"{0}\" does not exist")]
    UnknownCategory(String),

    #[error("The \"Uncategorized\" category cannot be deleted")]
    ProtectedCategory,
}
