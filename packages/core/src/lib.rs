//! PageBridge Core
//!
//! Two-way conversion between a remote block-structured page store and
//! Markdown files with front matter, plus the batch machinery that exports
//! or imports many pages at once.
//!
//! # Architecture
//!
//! - **Closed block model**: every block has a [`models::BlockType`], with
//!   `Unknown` as the catch-all so unexpected content degrades to text
//! - **Non-failing decoders**: Markdown parsing never errors; problems
//!   surface as validation issues
//! - **Per-item failure isolation**: a batch always completes with a tally
//!   of successes and failures
//! - **Service seam**: the remote store sits behind the
//!   [`services::DocumentService`] trait
//!
//! # Modules
//!
//! - [`models`] - Data structures (blocks, page properties, filters, batch records)
//! - [`markdown`] - Rich text, block, front matter and document transcoders
//! - [`services`] - Orchestrator, filtering, validation, property mapping, caching, errors
//! - [`config`] - Batch tuning knobs

pub mod config;
pub mod markdown;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use config::{BatchConfig, ConfigError};
pub use markdown::{DocumentTranscoder, TranscodeOptions};
pub use models::*;
pub use services::*;
