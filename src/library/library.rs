use crate::catalog::{Catalog, RatingOracle, TrackFileError, TrackFilters, TrackId, TrackRecord};
use crate::ratings::{Ledger, LedgerError, PlayedTrack, Rating};
use crate::server::metrics;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

const RATINGS_FILE_NAME: &str = "ratings.json";

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Track {0} not found")]
    NotFound(TrackId),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<TrackFileError> for LibraryError {
    fn from(err: TrackFileError) -> Self {
        match err {
            TrackFileError::NotFound(id) => LibraryError::NotFound(id),
            TrackFileError::Io { path, source } => LibraryError::Io { path, source },
        }
    }
}

/// The shared catalog plus one lazily loaded ledger per user.
pub struct Library {
    catalog: Arc<Catalog>,
    ratings_dir: PathBuf,
    backup_count: usize,
    ledgers: Mutex<HashMap<String, Arc<Mutex<Ledger>>>>,
}

impl Library {
    pub fn new<P: AsRef<Path>>(catalog: Arc<Catalog>, ratings_dir: P, backup_count: usize) -> Library {
        Library {
            catalog,
            ratings_dir: ratings_dir.as_ref().to_path_buf(),
            backup_count,
            ledgers: Mutex::new(HashMap::new()),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn ledger_path_for_user(&self, username: &str) -> PathBuf {
        self.ratings_dir.join(username).join(RATINGS_FILE_NAME)
    }

    /// Returns the cached ledger of `username`, loading it on first use.
    /// The cache lock is held while loading so a user never gets two ledgers.
    /// Failed loads are not cached.
    pub fn ledger_for_user(&self, username: &str) -> Result<Arc<Mutex<Ledger>>, LibraryError> {
        let mut ledgers = self.ledgers.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(ledger) = ledgers.get(username) {
            return Ok(ledger.clone());
        }

        let path = self.ledger_path_for_user(username);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|source| LibraryError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        let ledger = Arc::new(Mutex::new(Ledger::load(&path, self.backup_count)?));
        info!("Opened ratings ledger of {} at {}", username, path.display());
        ledgers.insert(username.to_owned(), ledger.clone());
        Ok(ledger)
    }

    pub fn get_random_track(
        &self,
        username: &str,
        filters: &TrackFilters,
    ) -> Result<Option<TrackRecord>, LibraryError> {
        let ledger = self.ledger_for_user(username)?;
        let ledger = ledger.lock().unwrap_or_else(PoisonError::into_inner);
        let selected = self.catalog.select_random(filters, &*ledger).cloned();
        metrics::record_selection(selected.is_some());
        Ok(selected)
    }

    pub fn get_track_bytes(&self, id: &TrackId) -> Result<Vec<u8>, LibraryError> {
        Ok(self.catalog.get_file_bytes(id)?)
    }

    /// Appends a play to the user's ledger and persists it. Returns the new
    /// aggregate rating of the track.
    pub fn record_play(
        &self,
        username: &str,
        id: &TrackId,
        timestamp: i64,
        rating: Rating,
    ) -> Result<Option<f64>, LibraryError> {
        let track = self
            .catalog
            .get_by_id(id)
            .ok_or_else(|| LibraryError::NotFound(id.clone()))?;
        let ledger = self.ledger_for_user(username)?;
        let mut ledger = ledger.lock().unwrap_or_else(PoisonError::into_inner);
        ledger.add_play(id, &track.relative_path, timestamp, rating);

        let start = Instant::now();
        ledger.save()?;
        metrics::record_ledger_save(start.elapsed());
        metrics::record_play();

        debug!("{} played {} with rating {}", username, id, rating.value());
        Ok(ledger.get_rating(id))
    }

    pub fn export_ratings(&self, username: &str) -> Result<Vec<PlayedTrack>, LibraryError> {
        let ledger = self.ledger_for_user(username)?;
        let ledger = ledger.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(ledger.entries().to_vec())
    }

    /// Replaces the user's whole ledger and overwrites its file. Backups are
    /// left untouched.
    pub fn import_ratings(&self, username: &str, entries: Vec<PlayedTrack>) -> Result<(), LibraryError> {
        let ledger = self.ledger_for_user(username)?;
        let mut ledger = ledger.lock().unwrap_or_else(PoisonError::into_inner);
        ledger.replace(entries);
        ledger.write_unrotated()?;
        info!("Imported {} rated tracks for {}", ledger.len(), username);
        Ok(())
    }
}
