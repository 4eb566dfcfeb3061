use serde::{Deserialize, Serialize};

/// An authenticated user.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct User {
    pub username: String,
}

/// An entry of the users file.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct UserRecord {
    pub username: String,
    /// PHC string.
    pub password_hash: String,
}

/// Usernames name per-user directories, so they must be a single plain path
/// component.
pub fn is_valid_username(username: &str) -> bool {
    !username.is_empty()
        && username != "."
        && username != ".."
        && !username.contains(['/', '\\', ':', '\0'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_validation() {
        assert!(is_valid_username("alice"));
        assert!(is_valid_username("bob.smith"));
        assert!(!is_valid_username(""));
        assert!(!is_valid_username(".."));
        assert!(!is_valid_username("a/b"));
        assert!(!is_valid_username("a\\b"));
        assert!(!is_valid_username("a:b"));
    }
}
