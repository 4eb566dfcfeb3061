mod catalog;
pub mod identity;
mod load;
mod track;

pub use catalog::{make_rng, Catalog, NoRatings, RatingOracle, TrackFileError, TrackFilters};
pub use identity::{compute_id, TrackId};
pub use load::CatalogLoadError;
pub use track::{MetadataEntry, TrackRecord};
