//! Content-addressable checksums for page source, screenshots and element markup.
//!
//! A [`Checksum`] is only ever compared for equality. It answers "has this
//! exact content already been processed for this audit scope", never "which
//! node is this within the document" (that is what locators are for).

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Lowercase hex SHA-256 of a payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Checksum(String);

impl Checksum {
    /// Hash an arbitrary byte payload.
    pub fn of(payload: impl AsRef<[u8]>) -> Self {
        let digest = Sha256::digest(payload.as_ref());
        Checksum(hex::encode(digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Checksum of a page's raw HTML source.
pub fn page_source_checksum(source: &str) -> Checksum {
    Checksum::of(source)
}

/// Checksum of encoded screenshot bytes.
pub fn screenshot_checksum(image_bytes: &[u8]) -> Checksum {
    Checksum::of(image_bytes)
}

/// Checksum of an element's outer markup; this is the element identity key.
pub fn element_checksum(outer_html: &str) -> Checksum {
    Checksum::of(outer_html)
}
