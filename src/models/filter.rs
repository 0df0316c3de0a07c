use std::fmt;
use std::str::FromStr;

use super::{Link, LinkStatus};

/// Status restriction applied to a link listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(LinkStatus),
}

impl StatusFilter {
    pub fn matches(&self, link: &Link) -> bool {
        match self {
            Self::All => true,
            Self::Only(status) => link.status() == *status,
        }
    }

    /// Cycles All -> Pending -> Done -> All.
    pub fn next(self) -> Self {
        match self {
            Self::All => Self::Only(LinkStatus::Pending),
            Self::Only(LinkStatus::Pending) => Self::Only(LinkStatus::Done),
            Self::Only(LinkStatus::Done) => Self::All,
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Only(status) => write!(f, "{status}"),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        s.parse::<LinkStatus>().map(Self::Only)
    }
}

/// Category restriction applied to a link listing.
///
/// Category matching is exact, the same way the category dropdown works.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Named(String),
}

impl CategoryFilter {
    pub fn matches(&self, link: &Link) -> bool {
        match self {
            Self::All => true,
            Self::Named(name) => link.category() == name,
        }
    }

    /// Cycles All -> each category in order -> All.
    ///
    /// A filter naming a category that no longer exists restarts at All.
    pub fn next(&self, categories: &[String]) -> Self {
        let position = match self {
            Self::All => None,
            Self::Named(name) => match categories.iter().position(|c| c == name) {
                Some(idx) => Some(idx),
                None => return Self::All,
            },
        };
        let next = position.map_or(0, |idx| idx + 1);
        categories
            .get(next)
            .map_or(Self::All, |name| Self::Named(name.clone()))
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "All Categories"),
            Self::Named(name) => write!(f, "{name}"),
        }
    }
}

/// Operation applied to every selected link at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkAction {
    Delete,
    SetStatus(LinkStatus),
    SetCategory(String),
}

/// Summary counts shown on the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkStats {
    pub total: usize,
    pub pending: usize,
    pub completed: usize,
    /// Category name and link count, most used first.
    pub categories: Vec<(String, usize)>,
}

impl LinkStats {
    /// Percentage of links marked done, rounded down.
    pub fn completion_percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        ((self.completed * 100) / self.total) as u8
    }
}
