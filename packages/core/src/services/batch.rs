//! Batch Orchestrator
//!
//! Runs bulk export and import against a [`DocumentService`].
//!
//! # Pipeline
//!
//! Export: list metadata (cached per scope) → filter → per page fetch the
//! block tree and transcode. Import: per file validate → transcode → write
//! the page.
//!
//! Items run through a bounded stream (`futures::stream::buffered`) so at
//! most `max_concurrency` external calls are in flight while results keep
//! input order. Every external call is wrapped in the configured timeout.
//! A failing item is recorded in the batch result and never stops its
//! siblings; the only `Err` a batch returns is a malformed request.

use crate::config::{BatchConfig, ConfigError};
use crate::markdown::{DocumentTranscoder, TranscodeOptions};
use crate::models::time::{SystemTimeProvider, TimeProvider};
use crate::models::{
    BatchResult, BatchRun, BlockNode, Document, ExportedDocument, FilterCriteria, ImportedPage,
    MarkdownFile, PageProperties, QueryScope, ValidationReport,
};
use crate::services::document_service::DocumentService;
use crate::services::error::SyncError;
use crate::services::export_writer::export_file_name;
use crate::services::metadata_cache::MetadataCache;
use crate::services::property_mapping::{map_custom_properties, PropertyMapping};
use crate::services::{filter, validation};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

/// Pages to export
#[derive(Debug, Clone, Default)]
pub struct ExportRequest {
    /// Explicit page ids; when empty, ids come from listing `scope` and
    /// applying `criteria`
    pub page_ids: Vec<String>,
    pub scope: Option<QueryScope>,
    pub criteria: FilterCriteria,
    pub options: TranscodeOptions,
}

impl ExportRequest {
    /// Export specific pages, looking their metadata up in `scope`
    pub fn pages(scope: QueryScope, page_ids: Vec<String>) -> Self {
        Self {
            page_ids,
            scope: Some(scope),
            ..Default::default()
        }
    }

    /// Export every page in `scope` matching `criteria`
    pub fn matching(scope: QueryScope, criteria: FilterCriteria) -> Self {
        Self {
            scope: Some(scope),
            criteria,
            ..Default::default()
        }
    }

    pub fn with_options(mut self, options: TranscodeOptions) -> Self {
        self.options = options;
        self
    }
}

/// Import-side knobs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOptions {
    /// Status given to pages whose front matter has none
    #[serde(default)]
    pub default_status: Option<String>,

    /// Front matter key to typed remote property
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub property_mapping: BTreeMap<String, PropertyMapping>,
}

/// Markdown files to import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRequest {
    pub files: Vec<MarkdownFile>,

    /// Database the pages are written into
    pub database_id: String,

    #[serde(default)]
    pub options: ImportOptions,
}

impl ImportRequest {
    pub fn new(database_id: impl Into<String>, files: Vec<MarkdownFile>) -> Self {
        Self {
            files,
            database_id: database_id.into(),
            options: ImportOptions::default(),
        }
    }

    pub fn with_default_status(mut self, status: impl Into<String>) -> Self {
        self.options.default_status = Some(status.into());
        self
    }

    pub fn with_property_mapping(mut self, key: impl Into<String>, mapping: PropertyMapping) -> Self {
        self.options.property_mapping.insert(key.into(), mapping);
        self
    }
}

/// Result of a listing call
///
/// A service failure yields no pages and the error, never an `Err`.
#[derive(Debug, Clone, Default)]
pub struct PageListing {
    pub pages: Vec<PageProperties>,
    pub error: Option<SyncError>,
}

/// Coordinates export and import batches
pub struct BatchOrchestrator {
    service: Arc<dyn DocumentService>,
    config: BatchConfig,
    cache: MetadataCache,
}

impl BatchOrchestrator {
    pub fn new(service: Arc<dyn DocumentService>, config: BatchConfig) -> Result<Self, ConfigError> {
        Self::with_clock(service, config, Arc::new(SystemTimeProvider))
    }

    /// Orchestrator whose metadata cache reads time from `clock`
    pub fn with_clock(
        service: Arc<dyn DocumentService>,
        config: BatchConfig,
        clock: Arc<dyn TimeProvider>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let cache = MetadataCache::with_clock(config.metadata_cache_ttl(), clock);

        Ok(Self {
            service,
            config,
            cache,
        })
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    pub fn cache(&self) -> &MetadataCache {
        &self.cache
    }

    /// Run `future` under the per-call timeout
    async fn call<T, Fut>(&self, operation: &str, future: Fut) -> Result<T, SyncError>
    where
        Fut: Future<Output = Result<T, SyncError>>,
    {
        let timeout = self.config.call_timeout();
        match tokio::time::timeout(timeout, future).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!("{} timed out after {:?}", operation, timeout);
                Err(SyncError::timed_out(operation, timeout))
            }
        }
    }

    /// Cached page listing for `scope`
    async fn page_metadata(&self, scope: &QueryScope) -> Result<Vec<PageProperties>, SyncError> {
        self.cache
            .get_or_fetch(&scope.signature(), || {
                self.call("list_page_metadata", self.service.list_page_metadata(scope))
            })
            .await
    }

    /// Pages in `scope` matching `criteria`
    pub async fn list_pages(&self, scope: &QueryScope, criteria: &FilterCriteria) -> PageListing {
        match self.page_metadata(scope).await {
            Ok(pages) => PageListing {
                pages: filter::filter(pages, criteria),
                error: None,
            },
            Err(error) => {
                tracing::warn!("Listing pages for {} failed: {}", scope.signature(), error);
                PageListing {
                    pages: Vec::new(),
                    error: Some(error),
                }
            }
        }
    }

    /// Export a single page
    pub async fn export_page(
        &self,
        scope: &QueryScope,
        page_id: &str,
        options: &TranscodeOptions,
    ) -> Result<ExportedDocument, SyncError> {
        let pages = self.page_metadata(scope).await?;
        let properties = pages
            .into_iter()
            .find(|page| page.id == page_id)
            .ok_or_else(|| SyncError::not_found(page_id))?;

        let transcoder = DocumentTranscoder::new(options.clone());
        self.export_one(properties, &transcoder).await
    }

    async fn export_one(
        &self,
        properties: PageProperties,
        transcoder: &DocumentTranscoder,
    ) -> Result<ExportedDocument, SyncError> {
        tracing::debug!("Exporting page {}", properties.id);
        let blocks = self
            .call("fetch_block_tree", self.service.fetch_block_tree(&properties.id))
            .await?;

        let document = Document { properties, blocks };
        let markdown = transcoder.to_markdown(&document);
        let word_count = transcoder.body_to_markdown(&document.blocks).chars().count();
        let file_name = export_file_name(&document.properties);
        let slug = document.properties.slug_or_id().to_string();
        let PageProperties { id, title, .. } = document.properties;

        Ok(ExportedDocument {
            page_id: id,
            title,
            slug,
            file_name,
            markdown,
            word_count,
        })
    }

    /// Export a batch of pages
    ///
    /// Returns `Err(InvalidRequest)` only when there are no explicit page ids
    /// and no scope to derive them from.
    pub async fn export_batch(
        &self,
        request: ExportRequest,
    ) -> Result<BatchResult<ExportedDocument>, SyncError> {
        let ExportRequest {
            page_ids,
            scope,
            criteria,
            options,
        } = request;

        if page_ids.is_empty() && scope.is_none() {
            return Err(SyncError::invalid_request(
                "No page ids provided and no scope to list pages from",
            ));
        }
        let scope = scope.unwrap_or_default();
        let listing = self.page_metadata(&scope).await;

        let page_ids = if page_ids.is_empty() {
            match &listing {
                Ok(pages) => filter::filter(pages.clone(), &criteria)
                    .into_iter()
                    .map(|page| page.id)
                    .collect(),
                Err(error) => {
                    tracing::warn!("Export listing failed, nothing to export: {}", error);
                    return Ok(BatchResult::empty()
                        .with_warning(format!("Failed to list pages: {}", error)));
                }
            }
        } else {
            page_ids
        };

        let metadata: Result<HashMap<String, PageProperties>, SyncError> = listing.map(|pages| {
            pages
                .into_iter()
                .map(|page| (page.id.clone(), page))
                .collect()
        });
        let transcoder = DocumentTranscoder::new(options);

        let items = page_ids.into_iter().map(|id| (id.clone(), id)).collect();
        self.run_batch("export", items, |page_id: String| {
            let lookup = match &metadata {
                Ok(pages) => pages
                    .get(&page_id)
                    .cloned()
                    .ok_or_else(|| SyncError::not_found(page_id.as_str())),
                Err(error) => Err(error.clone()),
            };
            let transcoder = &transcoder;
            async move { self.export_one(lookup?, transcoder).await }
        })
        .await
    }

    /// Validate one file and write it as a page
    pub async fn import_page(
        &self,
        file: &MarkdownFile,
        options: &ImportOptions,
    ) -> Result<ImportedPage, SyncError> {
        let outcome = validation::validate(&file.file_name, &file.content);
        if outcome.blocking {
            return Err(SyncError::validation_failure(outcome.issues));
        }
        if !outcome.valid {
            tracing::warn!(
                "Importing {} despite warnings: {}",
                file.file_name,
                outcome.issues.join("; ")
            );
        }

        let (mut document, extra) =
            DocumentTranscoder::default().from_markdown_with_extra(&file.content, &file.file_name);
        if document.properties.status.is_none() {
            document.properties.status = options.default_status.clone();
        }
        document.properties.custom_properties = map_custom_properties(&extra, &options.property_mapping);

        let blocks: Vec<BlockNode> = document
            .blocks
            .children(&document.blocks.root_id)
            .into_iter()
            .cloned()
            .collect();

        let created = self
            .call(
                "create_or_update_page",
                self.service.create_or_update_page(&document.properties, &blocks),
            )
            .await?;

        tracing::debug!("Imported {} as page {}", file.file_name, created.page_id);
        Ok(ImportedPage {
            file_name: file.file_name.clone(),
            page_id: created.page_id,
            url: created.url,
            title: document.properties.title,
            blocks_count: blocks.len(),
            word_count: outcome.parsed_content_length,
        })
    }

    /// Import a batch of Markdown files
    ///
    /// Returns `Err(InvalidRequest)` for an empty file list or a blank
    /// database id.
    pub async fn import_batch(
        &self,
        request: ImportRequest,
    ) -> Result<BatchResult<ImportedPage>, SyncError> {
        if request.files.is_empty() {
            return Err(SyncError::invalid_request("No files provided"));
        }
        if request.database_id.trim().is_empty() {
            return Err(SyncError::invalid_request("Database ID is required"));
        }

        tracing::info!(
            "Importing {} files into database {}",
            request.files.len(),
            request.database_id
        );

        let options = &request.options;
        let items = request
            .files
            .iter()
            .map(|file| (file.file_name.clone(), file))
            .collect();
        self.run_batch("import", items, |file| self.import_page(file, options))
            .await
    }

    /// Validate files without importing them
    pub fn validate_files(&self, files: &[MarkdownFile]) -> ValidationReport {
        validation::validate_all(files)
    }

    /// Drive `work` over `items` with bounded concurrency, in input order
    async fn run_batch<I, T, F, Fut>(
        &self,
        label: &str,
        items: Vec<(String, I)>,
        work: F,
    ) -> Result<BatchResult<T>, SyncError>
    where
        F: Fn(I) -> Fut,
        Fut: Future<Output = Result<T, SyncError>>,
    {
        let start = Instant::now();
        let mut run = BatchRun::new(items.len());
        run.start()?;

        tracing::info!(
            "Starting {} batch of {} items (concurrency {})",
            label,
            run.total(),
            self.config.max_concurrency
        );

        let outcomes: Vec<(String, Result<T, SyncError>)> = stream::iter(items)
            .map(|(item_id, item)| {
                let future = work(item);
                async move {
                    let outcome = future.await;
                    match &outcome {
                        Ok(_) => tracing::debug!("{} item {} succeeded", label, item_id),
                        Err(error) => tracing::warn!("{} item {} failed: {}", label, item_id, error),
                    }
                    (item_id, outcome)
                }
            })
            .buffered(self.config.max_concurrency)
            .collect()
            .await;

        run.complete()?;
        let result = BatchResult::from_outcomes(outcomes, start.elapsed().as_millis());

        tracing::info!(
            "Finished {} batch: {} succeeded, {} failed in {}ms",
            label,
            result.succeeded,
            result.failed,
            result.duration_ms
        );
        Ok(result)
    }
}
