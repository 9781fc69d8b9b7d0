//! Configuration module for Glimt.
//!
//! Handles loading and managing application settings.

mod settings;

pub use settings::{ApiSettings, GeneralSettings, JobSettings, PagingSettings, Settings};
