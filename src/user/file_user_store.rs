use super::auth::VgsHasher;
use super::user_models::{is_valid_username, User, UserRecord};
use super::user_store::UserStore;
use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Read-only users backed by a JSON file, loaded once at startup.
pub struct FileUserStore {
    file_path: PathBuf,
    users: HashMap<String, UserRecord>,
    /// Checked for unknown usernames so they cost as much as a wrong password.
    decoy_hash: Option<String>,
}

impl FileUserStore {
    fn load_records(file_path: &Path) -> Result<Vec<UserRecord>> {
        let content = std::fs::read_to_string(file_path)
            .with_context(|| format!("Could not read users file {}", file_path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Malformed users file {}", file_path.display()))
    }

    pub fn load<P: AsRef<Path>>(file_path: P) -> Result<FileUserStore> {
        let file_path = file_path.as_ref();
        let store = Self::from_records(Self::load_records(file_path)?)?;
        info!(
            "Loaded {} users from {}",
            store.users.len(),
            file_path.display()
        );
        Ok(FileUserStore {
            file_path: file_path.to_path_buf(),
            ..store
        })
    }

    pub fn from_records(records: Vec<UserRecord>) -> Result<FileUserStore> {
        let mut users = HashMap::with_capacity(records.len());
        for record in records {
            if !is_valid_username(&record.username) {
                bail!("Invalid username {:?}", record.username);
            }
            VgsHasher::for_hash(&record.password_hash)
                .with_context(|| format!("Invalid password hash for user {}", record.username))?;
            if users.contains_key(&record.username) {
                bail!("Duplicate user {}", record.username);
            }
            users.insert(record.username.clone(), record);
        }
        let decoy_hash = users
            .values()
            .min_by(|a, b| a.username.cmp(&b.username))
            .map(|record| record.password_hash.clone());
        Ok(FileUserStore {
            file_path: PathBuf::new(),
            users,
            decoy_hash,
        })
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl UserStore for FileUserStore {
    fn resolve_user(&self, username: &str, password: &str) -> Result<Option<User>> {
        let Some(record) = self.users.get(username) else {
            debug!("Unknown user {}", username);
            if let Some(decoy_hash) = &self.decoy_hash {
                VgsHasher::for_hash(decoy_hash)?.verify(password, decoy_hash.as_str())?;
            }
            return Ok(None);
        };
        let hasher = VgsHasher::for_hash(&record.password_hash)?;
        if hasher.verify(password, record.password_hash.as_str())? {
            Ok(Some(User {
                username: record.username.clone(),
            }))
        } else {
            debug!("Wrong password for {}", username);
            Ok(None)
        }
    }
}
