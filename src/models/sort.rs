use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use super::{Link, LinkStatus};

/// Field a link listing is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    #[default]
    CreatedAt,
    Title,
    Status,
    DueDate,
}

impl SortKey {
    /// All keys in the order the TUI cycles through them.
    pub const ALL: [SortKey; 4] = [Self::CreatedAt, Self::Title, Self::Status, Self::DueDate];

    /// Returns the next key in cycling order.
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|k| *k == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// Human readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::CreatedAt => "Date",
            Self::Title => "Title",
            Self::Status => "Status",
            Self::DueDate => "Due date",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::CreatedAt => "created",
            Self::Title => "title",
            Self::Status => "status",
            Self::DueDate => "due",
        };
        write!(f, "{s}")
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "created" | "createdat" | "created_at" | "date" => Ok(Self::CreatedAt),
            "title" => Ok(Self::Title),
            "status" => Ok(Self::Status),
            "due" | "duedate" | "due_date" => Ok(Self::DueDate),
            other => Err(format!(
                "unknown sort key '{other}' (expected created, title, status or due)"
            )),
        }
    }
}

/// Ascending or descending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => write!(f, "ascending"),
            Self::Desc => write!(f, "descending"),
        }
    }
}

/// Sort key plus direction. Defaults to newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SortConfig {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortConfig {
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    /// Compares two links under this configuration.
    ///
    /// Links without a due date always sort last under `DueDate`, whatever
    /// the direction. Equal links compare `Equal` so a stable sort keeps
    /// their relative order.
    pub fn compare(&self, a: &Link, b: &Link) -> Ordering {
        let ordering = match self.key {
            SortKey::CreatedAt => a.created_at().cmp(&b.created_at()),
            SortKey::Title => a.title().to_lowercase().cmp(&b.title().to_lowercase()),
            SortKey::Status => status_rank(a.status()).cmp(&status_rank(b.status())),
            SortKey::DueDate => match (a.due_date(), b.due_date()) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => return Ordering::Less,
                (None, Some(_)) => return Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
        };

        match self.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }

    /// Sorts links in place (stable).
    pub fn sort(&self, links: &mut [Link]) {
        links.sort_by(|a, b| self.compare(a, b));
    }
}

fn status_rank(status: LinkStatus) -> u8 {
    match status {
        LinkStatus::Pending => 0,
        LinkStatus::Done => 1,
    }
}
