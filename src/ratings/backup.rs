//! Rotating backups of ledger files.
//!
//! Generation 0 is the live file, generation `n >= 1` lives at `<path>.bak<n>`.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

pub fn backup_path(path: &Path, generation: usize) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(format!(".bak{}", generation));
    PathBuf::from(name)
}

fn generation_path(path: &Path, generation: usize) -> PathBuf {
    if generation == 0 {
        path.to_path_buf()
    } else {
        backup_path(path, generation)
    }
}

/// Shifts every generation one step older, keeping at most `count` backups.
/// Missing generations are skipped. Not atomic: a crash between two renames
/// leaves a gap in the chain.
pub fn rotate_backups(path: &Path, count: usize) -> io::Result<()> {
    for generation in (0..count).rev() {
        let source = generation_path(path, generation);
        let target = backup_path(path, generation + 1);
        if target.exists() {
            std::fs::remove_file(&target)?;
        }
        if source.exists() {
            debug!("Rotating {} -> {}", source.display(), target.display());
            std::fs::rename(&source, &target)?;
        }
    }
    Ok(())
}
