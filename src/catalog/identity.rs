//! Content addressing for catalog tracks.
//!
//! A track id is the lowercase hex SHA-256 digest of its relative path in
//! normal form: empty and `.` components are dropped, so `abc//one`,
//! `./abc/one` and `abc/one/` all name the same track. `..` is kept as is.
//! Ledger files only store paths, so ids are recomputed with this same
//! function every time a ledger is loaded: changing it would orphan every
//! stored rating.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt::Write;

#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Debug)]
#[serde(transparent)]
pub struct TrackId(pub String);

impl TrackId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TrackId {
    fn from(value: &str) -> Self {
        TrackId(value.to_owned())
    }
}

impl From<String> for TrackId {
    fn from(value: String) -> Self {
        TrackId(value)
    }
}

fn normalize_path(path: &str) -> String {
    let components: Vec<&str> = path
        .split('/')
        .filter(|component| !component.is_empty() && *component != ".")
        .collect();
    let joined = components.join("/");
    if path.starts_with('/') {
        format!("/{}", joined)
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

pub fn compute_id<T: AsRef<str>>(relative_path: T) -> TrackId {
    let digest = Sha256::digest(normalize_path(relative_path.as_ref()).as_bytes());
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest.iter() {
        // Writing into a String cannot fail.
        let _ = write!(hex, "{:02x}", byte);
    }
    TrackId(hex)
}
