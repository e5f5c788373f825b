//! SQLite content store
//!
//! The import tool writes through [`save`]; the web service reads through
//! [`queries`] on a read-only pool.

pub mod init;
pub mod queries;
pub mod save;

pub use init::*;
pub use queries::*;
pub use save::*;
