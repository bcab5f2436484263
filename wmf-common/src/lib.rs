//! # WMF Common Library
//!
//! Shared code for the WMF data crates including:
//! - Database initialization and schema
//! - Key-value settings store
//! - Configuration loading and root folder resolution
//! - Wiki project references
//! - Date utilities

pub mod config;
pub mod db;
pub mod error;
pub mod project;
pub mod settings;
pub mod time;

pub use error::{Error, Result};
pub use project::Project;
pub use settings::SettingsStore;
