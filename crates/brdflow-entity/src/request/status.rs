//! BRD request workflow status.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Workflow status of a BRD request.
///
/// Stored as its display string. Unknown values are preserved verbatim in
/// [`RequestStatus::Other`] so a newer writer never breaks an older reader.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RequestStatus {
    /// Freshly submitted, no analyst work yet.
    New,
    /// An analyst has started on the document.
    InProgress,
    /// The document content has been generated.
    AlreadyGenerated,
    /// Processing finished.
    Completed,
    /// The request was rejected.
    Rejected,
    /// Any other status string.
    Other(String),
}

impl RequestStatus {
    /// Return the status as stored in the document.
    pub fn as_str(&self) -> &str {
        match self {
            Self::New => "New",
            Self::InProgress => "In Progress",
            Self::AlreadyGenerated => "Already Generated",
            Self::Completed => "Completed",
            Self::Rejected => "Rejected",
            Self::Other(s) => s,
        }
    }

    /// Whether this is the initial status of a freshly created request.
    pub fn is_initial(&self) -> bool {
        matches!(self, Self::New)
    }
}

impl From<String> for RequestStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "New" => Self::New,
            "In Progress" => Self::InProgress,
            "Already Generated" => Self::AlreadyGenerated,
            "Completed" => Self::Completed,
            "Rejected" => Self::Rejected,
            _ => Self::Other(s),
        }
    }
}

impl From<&str> for RequestStatus {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<RequestStatus> for String {
    fn from(status: RequestStatus) -> Self {
        match status {
            RequestStatus::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
