//! Newtype wrappers around document-store keys.
//!
//! The document store addresses every document by an opaque string key.
//! Distinct types prevent passing a `UserId` where a `RequestId` is
//! expected.

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Macro to define a newtype ID wrapper around a document key.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an existing document key.
            pub fn new(key: impl Into<String>) -> Self {
                Self(key.into())
            }

            /// Return the key as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::convert::Infallible;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.to_string()))
            }
        }

        impl From<String> for $name {
            fn from(key: String) -> Self {
                Self(key)
            }
        }

        impl From<&str> for $name {
            fn from(key: &str) -> Self {
                Self(key.to_string())
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(
    /// Identifier of an authenticated user.
    UserId
);

define_id!(
    /// Identifier of a BRD request document.
    RequestId
);

define_id!(
    /// Identifier of a comment document under a BRD request.
    CommentId
);

define_id!(
    /// Key of a reconciled notification: `comment_<commentId>` or
    /// `status_<requestId>`.
    NotificationId
);

impl NotificationId {
    /// Key of the notification derived from a comment.
    pub fn for_comment(comment_id: &CommentId) -> Self {
        Self(format!("comment_{comment_id}"))
    }

    /// Key of the notification derived from a request's status.
    pub fn for_status(request_id: &RequestId) -> Self {
        Self(format!("status_{request_id}"))
    }
}
