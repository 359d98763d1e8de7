//! Connection identifiers.
//!
//! Ids are opaque fixed-length alphanumeric strings. [`IdGenerator`] re-rolls
//! until the candidate is free in the registry, within a bounded number of
//! attempts.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::error::{HubError, HubResult};

/// A unique identifier for a connection.
///
/// Cheap to clone; the string is shared.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(Arc<str>);

impl ConnectionId {
    /// Create an id from an arbitrary string.
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length of the id in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the id is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ConnectionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ConnectionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ConnectionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ConnectionId {
    fn from(id: String) -> Self {
        Self(Arc::from(id))
    }
}

impl From<&ConnectionId> for ConnectionId {
    fn from(id: &ConnectionId) -> Self {
        id.clone()
    }
}

/// Produces random connection ids that are free at generation time.
#[derive(Debug, Clone, Copy)]
pub struct IdGenerator {
    length: usize,
    max_attempts: usize,
}

impl IdGenerator {
    /// Create a generator for ids of `length` characters.
    pub fn new(length: usize, max_attempts: usize) -> Self {
        Self {
            length: length.max(1),
            max_attempts: max_attempts.max(1),
        }
    }

    /// Id length in characters.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Generate an id for which `taken` returns false.
    ///
    /// Returns [`HubError::IdentifierExhausted`] when every attempt collided,
    /// which means the id space is too small for the connection volume.
    pub fn generate(&self, taken: impl Fn(&str) -> bool) -> HubResult<ConnectionId> {
        for _ in 0..self.max_attempts {
            let candidate = random_id(self.length);
            if !taken(&candidate) {
                return Ok(ConnectionId::from(candidate));
            }
        }
        Err(HubError::exhausted(self.max_attempts))
    }
}

/// A random alphanumeric string of `length` characters.
pub fn random_id(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}
