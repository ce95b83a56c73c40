//! Auth queries (read operations)

pub mod me;

pub use me::{GetProfileError, GetProfileQuery};
