//! BRD request document model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use brdflow_core::types::id::{RequestId, UserId};

use super::status::RequestStatus;

/// A document in the `brd_requests` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrdRequest {
    /// Document key.
    pub id: RequestId,
    /// Display name of the project.
    #[serde(rename = "namaProject")]
    pub project_name: String,
    /// The business requester who created the request.
    pub created_by: UserId,
    /// The analyst the request is assigned to, once assigned.
    #[serde(default)]
    pub assigned_analyst_id: Option<UserId>,
    /// Current workflow status.
    pub status: RequestStatus,
    /// When the request document was last modified.
    pub updated_at: DateTime<Utc>,
}

impl BrdRequest {
    /// Create a new request in the initial status.
    pub fn new(id: RequestId, project_name: impl Into<String>, created_by: UserId) -> Self {
        Self {
            id,
            project_name: project_name.into(),
            created_by,
            assigned_analyst_id: None,
            status: RequestStatus::New,
            updated_at: Utc::now(),
        }
    }
}
