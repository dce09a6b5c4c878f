//! Quality definitions and the serialized quality blob.
//!
//! A file's quality is persisted as a small JSON document inside its owning
//! row rather than as a normalized column. Listing queries that need to filter
//! by quality match a text fragment of that document instead of decoding every
//! row, so the serializer and the fragment formatter below must agree:
//!
//! ```text
//! {"quality":7,"revision":{"version":1,"real":0}}
//!  ^^^^^^^^^^^ quality_fragment(7)
//! ```
//!
//! Bump [`QUALITY_BLOB_VERSION`] whenever the layout changes; any stored rows
//! written with an older layout stop matching cutoff queries until migrated.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Layout version of the serialized [`QualityModel`] blob.
pub const QUALITY_BLOB_VERSION: u32 = 1;

/// A stored quality blob could not be decoded.
#[derive(Debug, Error)]
#[error("Invalid quality blob '{blob}': {source}")]
pub struct QualityParseError {
    pub blob: String,
    #[source]
    pub source: serde_json::Error,
}

// ── Quality Definitions ─────────────────────────────────────────────────────

/// A known quality level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality {
    pub id: i32,
    pub name: &'static str,
    /// Vertical resolution, 0 when not applicable.
    pub resolution: u32,
}

impl Quality {
    pub const UNKNOWN: Quality = Quality::new(0, "Unknown", 0);
    pub const SDTV: Quality = Quality::new(1, "SDTV", 480);
    pub const DVD: Quality = Quality::new(2, "DVD", 480);
    pub const WEBDL_1080P: Quality = Quality::new(3, "WEBDL-1080p", 1080);
    pub const HDTV_720P: Quality = Quality::new(4, "HDTV-720p", 720);
    pub const WEBDL_720P: Quality = Quality::new(5, "WEBDL-720p", 720);
    pub const BLURAY_720P: Quality = Quality::new(6, "Bluray-720p", 720);
    pub const BLURAY_1080P: Quality = Quality::new(7, "Bluray-1080p", 1080);
    pub const WEBDL_480P: Quality = Quality::new(8, "WEBDL-480p", 480);
    pub const HDTV_1080P: Quality = Quality::new(9, "HDTV-1080p", 1080);
    pub const HDTV_2160P: Quality = Quality::new(16, "HDTV-2160p", 2160);
    pub const WEBDL_2160P: Quality = Quality::new(18, "WEBDL-2160p", 2160);
    pub const BLURAY_2160P: Quality = Quality::new(19, "Bluray-2160p", 2160);
    pub const REMUX_1080P: Quality = Quality::new(30, "Remux-1080p", 1080);
    pub const REMUX_2160P: Quality = Quality::new(31, "Remux-2160p", 2160);

    /// Every known quality, lowest first.
    pub const ALL: &'static [Quality] = &[
        Self::UNKNOWN,
        Self::SDTV,
        Self::WEBDL_480P,
        Self::DVD,
        Self::HDTV_720P,
        Self::WEBDL_720P,
        Self::BLURAY_720P,
        Self::HDTV_1080P,
        Self::WEBDL_1080P,
        Self::BLURAY_1080P,
        Self::REMUX_1080P,
        Self::HDTV_2160P,
        Self::WEBDL_2160P,
        Self::BLURAY_2160P,
        Self::REMUX_2160P,
    ];

    const fn new(id: i32, name: &'static str, resolution: u32) -> Self {
        Self {
            id,
            name,
            resolution,
        }
    }

    /// Look up a quality by id.
    pub fn find(id: i32) -> Option<Quality> {
        Self::ALL.iter().copied().find(|q| q.id == id)
    }

    /// Display name for an id, falling back to "Unknown".
    pub fn name_of(id: i32) -> &'static str {
        Self::find(id).map(|q| q.name).unwrap_or(Self::UNKNOWN.name)
    }
}

// ── Quality Model ───────────────────────────────────────────────────────────

/// The quality of a specific file or grab, as persisted.
///
/// Field order matters: `quality` must serialize first and be followed by a
/// comma so that [`quality_fragment`] cannot match a prefix of a longer id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityModel {
    pub quality: i32,
    #[serde(default)]
    pub revision: Revision,
}

/// Release revision (repacks/propers bump `version`, REAL releases bump `real`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    pub version: i32,
    #[serde(default)]
    pub real: i32,
}

impl Default for Revision {
    fn default() -> Self {
        Self {
            version: 1,
            real: 0,
        }
    }
}

impl QualityModel {
    pub fn new(quality: Quality) -> Self {
        Self {
            quality: quality.id,
            revision: Revision::default(),
        }
    }

    pub fn with_revision(mut self, version: i32, real: i32) -> Self {
        self.revision = Revision { version, real };
        self
    }

    /// Serialize to the compact blob stored in the database.
    pub fn to_blob(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decode a stored blob. Whitespace and key order are not significant here,
    /// only for the fragment matcher.
    pub fn from_blob(blob: &str) -> Result<Self, QualityParseError> {
        serde_json::from_str(blob).map_err(|source| QualityParseError {
            blob: blob.to_string(),
            source,
        })
    }

    pub fn name(&self) -> &'static str {
        Quality::name_of(self.quality)
    }
}

// ── Fragment Matching ───────────────────────────────────────────────────────

/// The text fragment a serialized blob contains for quality `id`.
pub fn quality_fragment(id: i32) -> String {
    format!("\"quality\":{id},")
}

/// In-memory counterpart of the substring match listing queries run against
/// the stored blob.
pub fn blob_has_quality(blob: &str, id: i32) -> bool {
    blob.contains(&quality_fragment(id))
}
