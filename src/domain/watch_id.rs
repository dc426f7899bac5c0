//! Type-safe watch-session identifier.
//!
//! [`WatchId`] is a newtype wrapper around [`uuid::Uuid`] (v4) providing
//! type safety so that session identifiers cannot be confused with other
//! UUIDs. Ids are generated once at `start` time and never reused.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for a watch session.
///
/// Wraps a UUID v4. Generated by the protocol engine when a `start` command
/// is accepted and immutable thereafter. Used as the dictionary key in
/// [`super::SessionRegistry`] and as the `watchId` tag on every outbound
/// wire message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WatchId(uuid::Uuid);

impl WatchId {
    /// Creates a new random `WatchId` (UUID v4).
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Creates a `WatchId` from an existing [`uuid::Uuid`].
    #[must_use]
    pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner [`uuid::Uuid`].
    #[must_use]
    pub const fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for WatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
