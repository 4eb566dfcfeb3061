use super::backup::rotate_backups;
use super::load::read_ledger_file;
use super::models::{Play, PlayedTrack, Rating};
use crate::catalog::{compute_id, RatingOracle, TrackId};
use std::collections::HashMap;
use std::fs::{self, Permissions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};

pub const DEFAULT_BACKUP_COUNT: usize = 10;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Malformed ratings file {}: {source}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error on ratings file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not serialize ratings: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Per-user table of plays keyed by track id.
///
/// Entries keep their insertion order so that saving and exporting are
/// deterministic; ids are never stored, they are recomputed from paths.
#[derive(Debug)]
pub struct Ledger {
    entries: Vec<PlayedTrack>,
    index: HashMap<TrackId, usize>,
    file: Option<PathBuf>,
    backup_count: usize,
}

impl Default for Ledger {
    fn default() -> Self {
        Ledger::unbound(vec![])
    }
}

impl Ledger {
    /// A ledger that lives only in memory, `save` does nothing.
    pub fn unbound(entries: Vec<PlayedTrack>) -> Ledger {
        let mut ledger = Ledger {
            entries: vec![],
            index: HashMap::new(),
            file: None,
            backup_count: DEFAULT_BACKUP_COUNT,
        };
        ledger.replace(entries);
        ledger
    }

    /// Loads the ledger stored at `path`, or an empty one bound to `path` if
    /// the file does not exist yet.
    pub fn load<P: AsRef<Path>>(path: P, backup_count: usize) -> Result<Ledger, LedgerError> {
        let path = path.as_ref();
        let entries = match read_ledger_file(path)? {
            Some(entries) => {
                info!("Loaded {} rated tracks from {}", entries.len(), path.display());
                entries
            }
            None => {
                info!("No ratings file at {}, starting empty", path.display());
                vec![]
            }
        };
        let mut ledger = Ledger::unbound(entries);
        ledger.file = Some(path.to_path_buf());
        ledger.backup_count = backup_count;
        Ok(ledger)
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    pub fn backup_count(&self) -> usize {
        self.backup_count
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[PlayedTrack] {
        &self.entries
    }

    pub fn get(&self, id: &TrackId) -> Option<&PlayedTrack> {
        self.index.get(id).map(|&position| &self.entries[position])
    }

    /// Replaces the whole in-memory state. A path seen twice keeps its first
    /// position and its last value.
    pub fn replace(&mut self, entries: Vec<PlayedTrack>) {
        self.entries.clear();
        self.index.clear();
        for entry in entries {
            let id = compute_id(&entry.relative_path);
            match self.index.get(&id) {
                Some(&position) => self.entries[position] = entry,
                None => {
                    self.index.insert(id, self.entries.len());
                    self.entries.push(entry);
                }
            }
        }
    }

    /// Records a play in memory. Call `save` to persist it.
    pub fn add_play(&mut self, id: &TrackId, relative_path: &str, timestamp: i64, rating: Rating) {
        let play = Play { timestamp, rating };
        match self.index.get(id) {
            Some(&position) => self.entries[position].plays.push(play),
            None => {
                self.index.insert(id.clone(), self.entries.len());
                self.entries.push(PlayedTrack {
                    relative_path: relative_path.to_owned(),
                    plays: vec![play],
                });
            }
        }
    }

    /// Persists the ledger, rotating the previous versions into backups first.
    ///
    /// The new content is fully written to a sibling temporary file before
    /// any rotation happens; a failure after rotation leaves the live path
    /// missing and the previous content in `.bak1`.
    pub fn save(&self) -> Result<(), LedgerError> {
        let Some(path) = self.file.as_deref() else {
            return Ok(());
        };
        let staged = self.stage(path)?;
        rotate_backups(path, self.backup_count).map_err(|source| LedgerError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::commit(staged, path)?;
        debug!("Saved {} rated tracks to {}", self.len(), path.display());
        Ok(())
    }

    /// Overwrites the bound file with the current state without touching
    /// the backups.
    pub fn write_unrotated(&self) -> Result<(), LedgerError> {
        let Some(path) = self.file.as_deref() else {
            return Ok(());
        };
        let staged = self.stage(path)?;
        Self::commit(staged, path)
    }

    fn stage(&self, path: &Path) -> Result<NamedTempFile, LedgerError> {
        let io_error = |source| LedgerError::Io {
            path: path.to_path_buf(),
            source,
        };
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut staged = NamedTempFile::new_in(dir).map_err(io_error)?;
        {
            let mut writer = BufWriter::new(staged.as_file_mut());
            serde_json::to_writer_pretty(&mut writer, &self.entries)?;
            writer.flush().map_err(io_error)?;
        }
        if let Some(permissions) = live_permissions(path).map_err(io_error)? {
            staged.as_file().set_permissions(permissions).map_err(io_error)?;
        }
        staged.as_file().sync_all().map_err(io_error)?;
        Ok(staged)
    }

    fn commit(staged: NamedTempFile, path: &Path) -> Result<(), LedgerError> {
        staged.persist(path).map_err(|err| LedgerError::Io {
            path: path.to_path_buf(),
            source: err.error,
        })?;
        Ok(())
    }
}

/// Temporary files are private to their owner, the live file keeps the mode
/// it had before the save.
fn live_permissions(path: &Path) -> io::Result<Option<Permissions>> {
    match fs::metadata(path) {
        Ok(metadata) => Ok(Some(metadata.permissions())),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(new_file_permissions()),
        Err(err) => Err(err),
    }
}

#[cfg(unix)]
fn new_file_permissions() -> Option<Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn new_file_permissions() -> Option<Permissions> {
    None
}

impl RatingOracle for Ledger {
    fn get_rating(&self, id: &TrackId) -> Option<f64> {
        self.get(id).and_then(PlayedTrack::rating)
    }
}
