use super::ledger::LedgerError;
use super::models::PlayedTrack;
use std::path::Path;

/// Reads a ledger file. A missing file is not an error: it is a user that
/// never played anything.
pub fn read_ledger_file(path: &Path) -> Result<Option<Vec<PlayedTrack>>, LedgerError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(LedgerError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let entries = serde_json::from_str(&content).map_err(|source| LedgerError::Load {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(entries))
}
