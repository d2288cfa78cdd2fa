//! Navigation collaborator.

use crate::types::id::RequestId;

/// Routes the user interface to a request's workspace view.
///
/// Implemented by the surrounding application shell. The notification
/// subsystem only issues the call and never consumes a result.
pub trait Navigator: Send + Sync + 'static {
    /// Open the workspace view of the given BRD request.
    fn open_request(&self, request_id: &RequestId);
}

/// Navigator that ignores every call. Used by headless tools.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn open_request(&self, _request_id: &RequestId) {}
}
