mod library;

pub use library::{Library, LibraryError};
