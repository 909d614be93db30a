use std::fmt;

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const DATA_URL_PREFIX: &str = "data:";

/// Encoded raster of the whole surface at one instant, kept in the browser's
/// native `data:` URL form so it can be handed straight back to an image
/// decoder.
#[derive(Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Snapshot(String);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("snapshot is not a data URL")]
    NotDataUrl,
    #[error("snapshot data URL has no payload")]
    EmptyPayload,
}

impl Snapshot {
    pub fn from_data_url(value: impl Into<String>) -> Result<Self, SnapshotError> {
        let value = value.into();
        let trimmed = value.trim();
        if !trimmed.starts_with(DATA_URL_PREFIX) {
            return Err(SnapshotError::NotDataUrl);
        }
        match trimmed.split_once(',') {
            Some((_, payload)) if !payload.is_empty() => {}
            _ => return Err(SnapshotError::EmptyPayload),
        }
        if trimmed.len() == value.len() {
            Ok(Self(value))
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }

    pub fn as_data_url(&self) -> &str {
        &self.0
    }

    pub fn into_data_url(self) -> String {
        self.0
    }

    /// Media type between `data:` and the first `;` or `,`.
    pub fn media_type(&self) -> &str {
        let rest = &self.0[DATA_URL_PREFIX.len()..];
        let end = rest.find([';', ',']).unwrap_or(rest.len());
        &rest[..end]
    }
}

impl TryFrom<String> for Snapshot {
    type Error = SnapshotError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_data_url(value)
    }
}

impl From<Snapshot> for String {
    fn from(snapshot: Snapshot) -> Self {
        snapshot.0
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Canvas snapshots run to hundreds of kilobytes.
        const SHOWN: usize = 32;
        let head: String = self.0.chars().take(SHOWN).collect();
        if self.0.len() > head.len() {
            write!(f, "Snapshot({head}... {} bytes)", self.0.len())
        } else {
            write!(f, "Snapshot({head})")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_png_data_url() {
        let snapshot = Snapshot::from_data_url("data:image/png;base64,iVBORw0KGgo=").unwrap();
        assert_eq!(snapshot.media_type(), "image/png");
    }

    #[test]
    fn rejects_plain_text() {
        assert_eq!(
            Snapshot::from_data_url("hello"),
            Err(SnapshotError::NotDataUrl)
        );
        assert_eq!(
            Snapshot::from_data_url("data:image/png;base64,"),
            Err(SnapshotError::EmptyPayload)
        );
    }

    #[test]
    fn trims_surrounding_whitespace() {
        let snapshot = Snapshot::from_data_url("  data:image/png;base64,AAAA\n").unwrap();
        assert_eq!(snapshot.as_data_url(), "data:image/png;base64,AAAA");
    }

    #[test]
    fn debug_output_is_truncated() {
        let long = format!("data:image/png;base64,{}", "A".repeat(500));
        let snapshot = Snapshot::from_data_url(long).unwrap();
        let shown = format!("{snapshot:?}");
        assert!(shown.len() < 80);
        assert!(shown.contains("522 bytes"));
    }
}
