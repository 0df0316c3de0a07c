use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Completion state of a saved link.
///
/// Every link starts out `Pending` and is flipped to `Done` once read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LinkStatus {
    /// Saved but not yet read.
    #[default]
    Pending,
    /// Read or otherwise dealt with.
    Done,
}

impl LinkStatus {
    /// Returns the opposite status.
    pub fn toggled(self) -> Self {
        match self {
            Self::Pending => Self::Done,
            Self::Done => Self::Pending,
        }
    }

    /// Returns the value stored in the `links.status` column.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Done => "DONE",
        }
    }

    /// Returns `true` for `Done`.
    pub fn is_done(self) -> bool {
        matches!(self, Self::Done)
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Done => write!(f, "done"),
        }
    }
}

impl FromStr for LinkStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "done" => Ok(Self::Done),
            other => Err(format!("unknown status '{other}' (expected pending or done)")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_in_uppercase() {
        assert_eq!(
            serde_json::to_string(&LinkStatus::Pending).unwrap(),
            r#""PENDING""#
        );
        assert_eq!(serde_json::to_string(&LinkStatus::Done).unwrap(), r#""DONE""#);

        let parsed: LinkStatus = serde_json::from_str(r#""DONE""#).unwrap();
        assert_eq!(parsed, LinkStatus::Done);
    }

    #[test]
    fn status_deserialization_fails_on_unknown_variant() {
        let result: Result<LinkStatus, _> = serde_json::from_str(r#""ARCHIVED""#);
        assert!(result.is_err());
    }

    #[test]
    fn toggled_flips_between_pending_and_done() {
        assert_eq!(LinkStatus::Pending.toggled(), LinkStatus::Done);
        assert_eq!(LinkStatus::Done.toggled(), LinkStatus::Pending);
    }

    #[test]
    fn from_str_is_case_insensitive() {
        assert_eq!("Pending".parse::<LinkStatus>(), Ok(LinkStatus::Pending));
        assert_eq!("DONE".parse::<LinkStatus>(), Ok(LinkStatus::Done));
        assert!("later".parse::<LinkStatus>().is_err());
    }

    #[test]
    fn default_status_is_pending() {
        assert_eq!(LinkStatus::default(), LinkStatus::Pending);
    }
}
