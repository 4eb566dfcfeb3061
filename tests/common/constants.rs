//! Shared constants for end-to-end tests
//!
//! When test data changes (user credentials, catalog paths, etc.),
//! update only this file.

// ============================================================================
// Test User Credentials
// ============================================================================

/// User with a pre-populated ratings ledger
pub const TEST_USER: &str = "testuser";

pub const TEST_PASS: &str = "testpass123";

/// User without any ratings file
pub const OTHER_USER: &str = "otheruser";

pub const OTHER_PASS: &str = "otherpass123";

// ============================================================================
// Test Catalog
// ============================================================================

/// MP3 file, no title, rated 1 and 2 by TEST_USER
pub const TRACK_ONE_PATH: &str = "abc/one";

/// Plain bytes, titled, rated 4 and 5 by TEST_USER
pub const TRACK_TWO_PATH: &str = "abc/two";

pub const TRACK_TWO_TITLE: &str = "song two";

pub const TRACK_TWO_GAME_TITLE: &str = "game two";

pub const TRACK_TWO_DURATION: f64 = 21.2;

pub const TRACK_TWO_LOOP_START: i64 = 13;

/// Flagged as a load error, present in TEST_USER's ledger without plays
pub const TRACK_THREE_PATH: &str = "abc/three";

/// Seed used for the catalog RNG
pub const TEST_RANDOM_SEED: u64 = 1234;

/// Backups kept per ratings file
pub const TEST_BACKUP_COUNT: usize = 3;

// ============================================================================
// Test Timeouts and Configuration
// ============================================================================

/// Maximum time to wait for server to become ready (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Timeout for individual HTTP requests (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Polling interval when waiting for server ready (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;
