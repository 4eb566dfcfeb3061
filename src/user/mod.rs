pub mod auth;
mod file_user_store;
mod user_models;
mod user_store;

pub use auth::VgsHasher;
pub use file_user_store::FileUserStore;
pub use user_models::{is_valid_username, User, UserRecord};
pub use user_store::UserStore;
