/*!
 * Session management for on-device AI sessions.
 *
 * This module provides:
 * - `SessionKey`: the configuration signature a cached session is stored under
 * - `SessionRegistry`: one cache of live sessions for a single capability
 * - `SessionManager`: the application-owned set of registries
 */

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod manager;
pub mod registry;

// Re-export main types
pub use manager::SessionManager;
pub use registry::SessionRegistry;

/// Deterministic identifier of a session configuration
///
/// Two configurations with equal keys share one session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionKey(String);

impl SessionKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Key of the conversational session of a chat
    pub fn chat(chat_id: u64) -> Self {
        Self(format!("chat-{}", chat_id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for SessionKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}
