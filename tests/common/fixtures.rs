//! Test fixture creation
//!
//! Lays out a catalog directory, a users file and a ratings directory in a
//! temporary directory.

use super::constants::*;
use anyhow::Result;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Algorithm, Argon2, Params, Version,
};
use serde_json::json;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use vgs_server::catalog::compute_id;
use vgs_server::user::UserRecord;

/// An ID3 tag header, enough for content sniffing
pub const MP3_BYTES: &[u8] = b"ID3\x04\x00\x00\x00\x00\x00\x00fake audio";

pub const PLAIN_BYTES: &[u8] = b"not really audio";

pub struct TestLayout {
    pub dir: TempDir,
    pub metadata_path: PathBuf,
    pub users_path: PathBuf,
    pub ratings_dir: PathBuf,
}

pub fn track_id(path: &str) -> String {
    compute_id(path).to_string()
}

/// Argon2id with minimal cost so that every request doesn't pay for a
/// production-strength hash. Verification reads the cost from the hash.
fn cheap_password_hash(password: &str) -> Result<String> {
    let params = Params::new(8, 1, 1, None).map_err(|e| anyhow::anyhow!("{}", e))?;
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("{}", e))?
        .to_string())
}

pub fn create_test_layout() -> Result<TestLayout> {
    let dir = TempDir::new()?;

    let music_dir = dir.path().join("music");
    fs::create_dir_all(music_dir.join("abc"))?;
    fs::write(music_dir.join(TRACK_ONE_PATH), MP3_BYTES)?;
    fs::write(music_dir.join(TRACK_TWO_PATH), PLAIN_BYTES)?;
    let metadata = json!([
        {"path": TRACK_ONE_PATH, "timestamp": 1, "duration": 5.0},
        {
            "path": TRACK_TWO_PATH,
            "timestamp": 2,
            "title": TRACK_TWO_TITLE,
            "game_title": TRACK_TWO_GAME_TITLE,
            "loop_start": TRACK_TWO_LOOP_START,
            "duration": TRACK_TWO_DURATION
        },
        {"path": TRACK_THREE_PATH, "timestamp": 3, "error": true}
    ]);
    let metadata_path = music_dir.join("metadata.json");
    fs::write(&metadata_path, serde_json::to_string_pretty(&metadata)?)?;

    let users = vec![
        UserRecord {
            username: TEST_USER.to_string(),
            password_hash: cheap_password_hash(TEST_PASS)?,
        },
        UserRecord {
            username: OTHER_USER.to_string(),
            password_hash: cheap_password_hash(OTHER_PASS)?,
        },
    ];
    let users_path = dir.path().join("users.json");
    fs::write(&users_path, serde_json::to_string_pretty(&users)?)?;

    let ratings_dir = dir.path().join("ratings");
    fs::create_dir_all(ratings_dir.join(TEST_USER))?;
    let ratings = json!([
        {"path": TRACK_ONE_PATH, "plays": [{"timestamp": 123, "rating": 1}, {"timestamp": 456, "rating": 2}]},
        {"path": TRACK_TWO_PATH, "plays": [{"timestamp": 789, "rating": 4}, {"timestamp": 101, "rating": 5}]},
        {"path": TRACK_THREE_PATH, "plays": []}
    ]);
    fs::write(
        ratings_dir.join(TEST_USER).join("ratings.json"),
        serde_json::to_string_pretty(&ratings)?,
    )?;

    Ok(TestLayout {
        dir,
        metadata_path,
        users_path,
        ratings_dir,
    })
}
