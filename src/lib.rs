//! Glimt - video understanding tools for AI assistants
//!
//! Glimt exposes a hosted video-understanding platform as a set of Model
//! Context Protocol tools. An assistant can list collections and videos,
//! read transcripts and descriptions, extract structured entities, split a
//! video into shots or chapters and search across a collection.
//!
//! The name "Glimt" is Norwegian for "glimpse."
//!
//! # Architecture
//!
//! - `config` - Configuration management
//! - `api` - Remote platform client and its in-memory double
//! - `source` - Content reference parsing (platform files, web videos)
//! - `paging` - Time-window and item pagination
//! - `jobs` - Job request building and the poll-until-done driver
//! - `resolve` - Reuse of collection results and completed jobs
//! - `normalize` - Result envelopes and derived metadata
//! - `tools` - The ten tool operations
//! - `mcp` - JSON-RPC stdio server
//!
//! # Example
//!
//! ```rust,no_run
//! use glimt::config::Settings;
//! use glimt::tools::ToolContext;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let context = ToolContext::from_settings(settings)?;
//!
//!     let output = context
//!         .call("list_collections", Some(serde_json::json!({ "page": 0 })))
//!         .await?;
//!     println!("{}", output.to_pretty_json()?);
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod jobs;
pub mod mcp;
pub mod normalize;
pub mod paging;
pub mod resolve;
pub mod source;
pub mod tools;

pub use error::{GlimtError, Result};
