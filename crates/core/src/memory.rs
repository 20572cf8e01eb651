//! Session notes supplied by the caller.

use serde::{Deserialize, Serialize};

/// A `(key, text)` note owned by the caller's request or session state.
///
/// Notes are never stored by ContextKit; they are scored per call and
/// discarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionNote {
    pub key: String,
    pub text: String,
}

impl SessionNote {
    pub fn new(key: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            text: text.into(),
        }
    }
}
