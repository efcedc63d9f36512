//! Remote Document Service Abstraction
//!
//! The `DocumentService` trait is the only way this crate talks to the
//! page/block store. Implementations wrap whatever SDK or HTTP client the
//! host application uses; the batch orchestrator only sees this trait.
//!
//! # Contract
//!
//! - `list_page_metadata` returns every page in scope (drafts included or not
//!   as the scope says), in the service's own order
//! - `fetch_block_tree` returns the full tree rooted at the page id, or
//!   `SyncError::NotFound` when the page does not exist
//! - `create_or_update_page` writes properties plus a flat list of top-level
//!   blocks and reports the created page's id and URL
//!
//! Transport failures map to `SyncError::Unavailable`; writes the service
//! refuses map to `SyncError::RemoteRejected`. Timeouts are applied by the
//! caller, so implementations need not enforce their own.
//!
//! # Example
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use pagebridge_core::models::{BlockNode, BlockTree, PageProperties, QueryScope};
//! use pagebridge_core::services::{CreatedPage, DocumentService, SyncError};
//!
//! struct Offline;
//!
//! #[async_trait]
//! impl DocumentService for Offline {
//!     async fn list_page_metadata(
//!         &self,
//!         _scope: &QueryScope,
//!     ) -> Result<Vec<PageProperties>, SyncError> {
//!         Err(SyncError::unavailable("offline"))
//!     }
//!
//!     async fn fetch_block_tree(&self, page_id: &str) -> Result<BlockTree, SyncError> {
//!         Err(SyncError::not_found(page_id))
//!     }
//!
//!     async fn create_or_update_page(
//!         &self,
//!         _properties: &PageProperties,
//!         _blocks: &[BlockNode],
//!     ) -> Result<CreatedPage, SyncError> {
//!         Err(SyncError::unavailable("offline"))
//!     }
//! }
//! ```

use crate::models::{BlockNode, BlockTree, PageProperties, QueryScope};
use crate::services::error::SyncError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Identity of a page written by `create_or_update_page`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedPage {
    pub page_id: String,
    pub url: String,
}

/// Remote page and block store
#[async_trait]
pub trait DocumentService: Send + Sync {
    /// Metadata for every page in `scope`
    async fn list_page_metadata(&self, scope: &QueryScope)
        -> Result<Vec<PageProperties>, SyncError>;

    /// Full block tree of one page; the tree's root id is `page_id`
    async fn fetch_block_tree(&self, page_id: &str) -> Result<BlockTree, SyncError>;

    /// Create (or update) a page with the given top-level blocks
    async fn create_or_update_page(
        &self,
        properties: &PageProperties,
        blocks: &[BlockNode],
    ) -> Result<CreatedPage, SyncError>;
}
