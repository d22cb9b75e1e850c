//! Short, printable identifiers for stored images.
//!
//! Four characters drawn from a 62-symbol alphabet give roughly 14.8M
//! possible IDs. That is small on purpose: entries live for minutes and the
//! store holds a handful of them. The store resolves collisions, the
//! generator does not.

use std::borrow::Borrow;
use std::fmt;

use rand::Rng;
use serde::{Serialize, Serializer};

const ALPHANUM: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Number of characters in a generated ID.
pub const IMAGE_ID_LEN: usize = 4;

/// Opaque token naming one live entry in the session store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageId(String);

impl ImageId {
    /// Draw a fresh ID. Not cryptographically secure, and not meant to be.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let id = (0..IMAGE_ID_LEN)
            .map(|_| ALPHANUM[rng.random_range(0..ALPHANUM.len())] as char)
            .collect();
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Serializes as the bare string.
impl Serialize for ImageId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Lets the store look entries up by the raw query-string value.
impl Borrow<str> for ImageId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ImageId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
