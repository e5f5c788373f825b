//! # Radix Vitri Common Library
//!
//! Shared code for the Radix Vitri site and its tools:
//! - Content model (glassworks, people, engagements, places, stories)
//! - Rich-text rendering and plain-text extraction
//! - Slug and name hooks applied when records are saved
//! - Approximate-date formatting
//! - Engagement grouping and sorting for detail pages
//! - SQLite content store
//! - Configuration loading
//! - Revalidation client

pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod dates;
pub mod engagements;
pub mod error;
pub mod models;
pub mod revalidate;
pub mod richtext;
pub mod slug;

pub use error::{Error, Result};
pub use richtext::RichTextRenderer;
