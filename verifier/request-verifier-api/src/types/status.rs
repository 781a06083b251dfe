//! The verification status reported for every request

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// The status of a request, derived from the current onchain state on every
/// read and never stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    /// No transaction (or signature) is observable for the request yet
    Pending,
    /// The observed transaction (or signature) fulfills the request
    Success,
    /// The observed transaction (or signature) does not fulfill the request
    Failed,
}

impl Status {
    /// Whether the status is final
    pub fn is_final(&self) -> bool {
        !matches!(self, Status::Pending)
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Pending => "PENDING",
            Status::Success => "SUCCESS",
            Status::Failed => "FAILED",
        };

        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::Status;

    /// Statuses serialize to their upper-case names
    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&Status::Success).unwrap();
        assert_eq!(json, "\"SUCCESS\"");

        let status: Status = serde_json::from_str("\"PENDING\"").unwrap();
        assert_eq!(status, Status::Pending);
        assert!(!status.is_final());
    }
}
