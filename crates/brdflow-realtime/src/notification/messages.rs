//! Status → message table for status notifications.

use brdflow_entity::request::RequestStatus;

/// Human-readable message shown for a status change.
pub fn status_message(status: &RequestStatus) -> &'static str {
    match status {
        RequestStatus::InProgress => "Analyst has started work on the BRD",
        RequestStatus::AlreadyGenerated => "BRD has finished generation",
        RequestStatus::Completed => "BRD has finished processing",
        RequestStatus::Rejected => "BRD has been rejected",
        RequestStatus::New | RequestStatus::Other(_) => "BRD status has been updated",
    }
}
