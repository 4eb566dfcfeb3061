use super::identity::{compute_id, TrackId};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A raw entry of the catalog metadata file.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct MetadataEntry {
    pub path: String,
    pub timestamp: i64,

    /// Microseconds.
    #[serde(default)]
    pub loop_start: i64,

    /// Microseconds.
    #[serde(default)]
    pub loop_end: i64,

    /// Seconds.
    #[serde(default)]
    pub duration: f64,

    /// Bytes.
    #[serde(default)]
    pub size: u64,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub game_title: Option<String>,

    #[serde(default)]
    pub error: bool,
}

#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct TrackRecord {
    pub id: TrackId,
    pub relative_path: String,
    pub absolute_path: PathBuf,
    pub title: Option<String>,
    pub game_title: Option<String>,
    pub duration_seconds: f64,
    pub loop_start_micros: i64,
    pub loop_end_micros: i64,
    pub size_bytes: u64,
    pub timestamp: i64,
    pub has_load_error: bool,
}

impl TrackRecord {
    pub fn from_entry(entry: MetadataEntry, catalog_root: &Path) -> TrackRecord {
        TrackRecord {
            id: compute_id(&entry.path),
            absolute_path: catalog_root.join(&entry.path),
            relative_path: entry.path,
            title: entry.title,
            game_title: entry.game_title,
            duration_seconds: entry.duration,
            loop_start_micros: entry.loop_start,
            loop_end_micros: entry.loop_end,
            size_bytes: entry.size,
            timestamp: entry.timestamp,
            has_load_error: entry.error,
        }
    }
}
