use super::identity::TrackId;
use super::load::{read_metadata_file, CatalogLoadError};
use super::track::TrackRecord;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;
use tracing::debug;

/// Answers rating questions about catalog tracks during selection.
pub trait RatingOracle {
    fn get_rating(&self, id: &TrackId) -> Option<f64>;

    fn has_rating(&self, id: &TrackId) -> bool {
        self.get_rating(id).is_some()
    }

    fn has_no_rating(&self, id: &TrackId) -> bool {
        !self.has_rating(id)
    }
}

/// Oracle for callers that have no ratings at hand.
pub struct NoRatings;

impl RatingOracle for NoRatings {
    fn get_rating(&self, _id: &TrackId) -> Option<f64> {
        None
    }
}

#[derive(Clone, Default, Debug, Deserialize, PartialEq)]
pub struct TrackFilters {
    pub min_duration: Option<f64>,
    pub title_contains: Option<String>,
    pub game_title_contains: Option<String>,
    pub min_rating: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub only_has_rating: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub only_has_no_rating: Option<bool>,
}

/// Query flags take the usual spellings of a boolean, case-insensitive:
/// `true`/`false`, `1`/`0`, `yes`/`no`, `on`/`off`, `t`/`f`, `y`/`n`.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(value) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "t" | "y" => Ok(Some(true)),
        "false" | "0" | "no" | "off" | "f" | "n" => Ok(Some(false)),
        other => Err(serde::de::Error::custom(format!(
            "invalid boolean flag {:?}",
            other
        ))),
    }
}

impl TrackFilters {
    fn accepts(&self, track: &TrackRecord, ratings: &dyn RatingOracle) -> bool {
        if let Some(min_duration) = self.min_duration {
            if track.duration_seconds < min_duration {
                return false;
            }
        }
        if !field_passes(&track.title, &self.title_contains) {
            return false;
        }
        if !field_passes(&track.game_title, &self.game_title_contains) {
            return false;
        }
        if self.only_has_rating == Some(true) && ratings.has_no_rating(&track.id) {
            return false;
        }
        if self.only_has_no_rating == Some(true) && ratings.has_rating(&track.id) {
            return false;
        }
        if let Some(min_rating) = self.min_rating {
            if let Some(rating) = ratings.get_rating(&track.id) {
                if rating < min_rating {
                    return false;
                }
            }
        }
        true
    }
}

/// Tracks missing the field are never excluded by a substring filter.
fn field_passes(field: &Option<String>, needle: &Option<String>) -> bool {
    match (field, needle) {
        (Some(value), Some(needle)) => value.contains(needle.as_str()),
        _ => true,
    }
}

#[derive(Error, Debug)]
pub enum TrackFileError {
    #[error("Track {0} not found")]
    NotFound(TrackId),

    #[error("Could not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub struct Catalog {
    tracks: Vec<TrackRecord>,
    index: HashMap<TrackId, usize>,
    rng: Mutex<StdRng>,
}

impl Catalog {
    /// Builds a catalog from records in load order; a later record with an
    /// already seen id replaces the earlier one in place.
    pub fn new(records: Vec<TrackRecord>, rng: StdRng) -> Catalog {
        let mut tracks: Vec<TrackRecord> = Vec::with_capacity(records.len());
        let mut index = HashMap::with_capacity(records.len());
        for record in records {
            match index.get(&record.id) {
                Some(&position) => tracks[position] = record,
                None => {
                    index.insert(record.id.clone(), tracks.len());
                    tracks.push(record);
                }
            }
        }
        Catalog {
            tracks,
            index,
            rng: Mutex::new(rng),
        }
    }

    pub fn from_file<P: AsRef<Path>>(
        metadata_path: P,
        seed: Option<u64>,
    ) -> Result<Catalog, CatalogLoadError> {
        let metadata_path = metadata_path.as_ref();
        let entries = read_metadata_file(metadata_path)?;
        let root = metadata_path.parent().unwrap_or_else(|| Path::new(""));
        let records = entries
            .into_iter()
            .map(|entry| TrackRecord::from_entry(entry, root))
            .collect();
        Ok(Catalog::new(records, make_rng(seed)))
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackRecord> {
        self.tracks.iter()
    }

    pub fn get_by_id(&self, id: &TrackId) -> Option<&TrackRecord> {
        self.index.get(id).map(|&position| &self.tracks[position])
    }

    pub fn get_file_bytes(&self, id: &TrackId) -> Result<Vec<u8>, TrackFileError> {
        let track = self
            .get_by_id(id)
            .ok_or_else(|| TrackFileError::NotFound(id.clone()))?;
        std::fs::read(&track.absolute_path).map_err(|source| TrackFileError::Io {
            path: track.absolute_path.clone(),
            source,
        })
    }

    /// Shuffles the whole catalog and returns the first track accepted by
    /// `filters`, which is a uniform pick among all accepted tracks.
    pub fn select_random(
        &self,
        filters: &TrackFilters,
        ratings: &dyn RatingOracle,
    ) -> Option<&TrackRecord> {
        let mut order: Vec<usize> = (0..self.tracks.len()).collect();
        {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            order.shuffle(&mut *rng);
        }

        let found = order
            .into_iter()
            .map(|position| &self.tracks[position])
            .find(|track| filters.accepts(track, ratings));
        debug!(
            "Random selection with {:?} -> {:?}",
            filters,
            found.map(|t| &t.relative_path)
        );
        found
    }
}

pub fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}
