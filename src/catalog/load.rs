//! Catalog metadata file loading

use super::track::MetadataEntry;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum CatalogLoadError {
    #[error("Could not read catalog metadata {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed catalog metadata {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Reads every entry of a metadata file, failing the whole load on the first
/// malformed one.
pub fn read_metadata_file(path: &Path) -> Result<Vec<MetadataEntry>, CatalogLoadError> {
    let content = std::fs::read_to_string(path).map_err(|source| CatalogLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let entries: Vec<MetadataEntry> =
        serde_json::from_str(&content).map_err(|source| CatalogLoadError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;

    let errored = entries.iter().filter(|e| e.error).count();
    info!(
        "Read {} catalog entries from {} ({} flagged with load errors)",
        entries.len(),
        path.display(),
        errored
    );
    Ok(entries)
}
