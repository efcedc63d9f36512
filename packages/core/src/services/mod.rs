//! Business Services
//!
//! - `BatchOrchestrator` - bulk export/import with bounded concurrency
//! - `DocumentService` - trait over the remote page and block store
//! - `MetadataCache` - TTL cache of page listings
//! - `filter` - page predicate used to select export candidates
//! - `validation` - pre-import checks on Markdown files
//! - `export_writer` - writes exported documents to disk
//! - `property_mapping` - typed remote properties from extra front matter keys
//!
//! Services coordinate between the remote store and the Markdown
//! transcoders; none of them hold state beyond the metadata cache.

pub mod batch;
pub mod document_service;
pub mod error;
pub mod export_writer;
pub mod filter;
pub mod metadata_cache;
pub mod property_mapping;
pub mod validation;

pub use batch::{BatchOrchestrator, ExportRequest, ImportOptions, ImportRequest, PageListing};
pub use document_service::{CreatedPage, DocumentService};
pub use error::{ErrorKind, SyncError};
pub use export_writer::{export_file_name, sanitize_file_stem, write_exports};
pub use metadata_cache::{CacheStats, MetadataCache};
pub use property_mapping::{map_custom_properties, PropertyKind, PropertyMapping};
