pub mod backup;
mod ledger;
mod load;
mod models;

pub use backup::rotate_backups;
pub use ledger::{Ledger, LedgerError, DEFAULT_BACKUP_COUNT};
pub use models::{Play, PlayedTrack, Rating, RatingError, MAX_RATING, MIN_PLAY_RATING};
