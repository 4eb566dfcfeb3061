use super::user_models::User;
use anyhow::Result;

pub trait UserStore: Send + Sync {
    /// Returns the user if `password` is the user's password.
    /// Returns Ok(None) for unknown users and wrong passwords alike.
    /// Returns Err if the stored credentials are unusable.
    fn resolve_user(&self, username: &str, password: &str) -> Result<Option<User>>;
}
