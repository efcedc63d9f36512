//! Shared helpers for integration tests
//!
//! `MockDocumentService` is an in-memory page store with switches for the
//! failure modes the orchestrator has to survive.

#![allow(dead_code)]

use async_trait::async_trait;
use pagebridge_core::models::{BlockNode, BlockTree, BlockType, PageProperties, QueryScope, RichTextRun};
use pagebridge_core::services::{CreatedPage, DocumentService, SyncError};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Install a test subscriber once; `RUST_LOG` controls verbosity
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Default)]
pub struct MockDocumentService {
    pages: Mutex<Vec<PageProperties>>,
    trees: Mutex<HashMap<String, BlockTree>>,
    unavailable_pages: HashSet<String>,
    slow_pages: HashSet<String>,
    rejected_titles: HashSet<String>,
    listing_fails: AtomicBool,
    fetch_delay: Option<Duration>,
    slow_delay: Duration,

    pub list_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,
    pub created: Mutex<Vec<(PageProperties, Vec<BlockNode>)>>,

    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl MockDocumentService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a page whose body is one paragraph with `body` as text
    pub fn with_page(self, properties: PageProperties, body: &str) -> Self {
        let tree = BlockTree::from_blocks(
            properties.id.clone(),
            vec![BlockNode::with_generated_id(BlockType::Paragraph)
                .with_runs(vec![RichTextRun::plain(body)])],
        );
        self.with_tree(properties, tree)
    }

    pub fn with_tree(self, properties: PageProperties, tree: BlockTree) -> Self {
        self.trees
            .lock()
            .unwrap()
            .insert(properties.id.clone(), tree);
        self.pages.lock().unwrap().push(properties);
        self
    }

    /// Listed page whose block tree is gone
    pub fn with_listed_only(self, properties: PageProperties) -> Self {
        self.pages.lock().unwrap().push(properties);
        self
    }

    pub fn with_unavailable_page(mut self, page_id: &str) -> Self {
        self.unavailable_pages.insert(page_id.to_string());
        self
    }

    /// Fetching this page sleeps for `delay`
    pub fn with_slow_page(mut self, page_id: &str, delay: Duration) -> Self {
        self.slow_pages.insert(page_id.to_string());
        self.slow_delay = delay;
        self
    }

    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = Some(delay);
        self
    }

    pub fn with_rejected_title(mut self, title: &str) -> Self {
        self.rejected_titles.insert(title.to_string());
        self
    }

    pub fn fail_listing(&self, fail: bool) {
        self.listing_fails.store(fail, Ordering::SeqCst);
    }

    pub fn rename_page(&self, page_id: &str, title: &str) {
        for page in self.pages.lock().unwrap().iter_mut() {
            if page.id == page_id {
                page.title = title.to_string();
            }
        }
    }

    pub fn created_titles(&self) -> Vec<String> {
        self.created
            .lock()
            .unwrap()
            .iter()
            .map(|(props, _)| props.title.clone())
            .collect()
    }
}

#[async_trait]
impl DocumentService for MockDocumentService {
    async fn list_page_metadata(
        &self,
        scope: &QueryScope,
    ) -> Result<Vec<PageProperties>, SyncError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.listing_fails.load(Ordering::SeqCst) {
            return Err(SyncError::unavailable("listing endpoint down"));
        }

        let pages = self.pages.lock().unwrap().clone();
        Ok(pages
            .into_iter()
            .filter(|page| scope.include_drafts || page.status.as_deref() != Some("Draft"))
            .collect())
    }

    async fn fetch_block_tree(&self, page_id: &str) -> Result<BlockTree, SyncError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.fetch_delay {
            tokio::time::sleep(delay).await;
        }
        if self.slow_pages.contains(page_id) {
            tokio::time::sleep(self.slow_delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.unavailable_pages.contains(page_id) {
            return Err(SyncError::unavailable(format!("fetch of {} failed", page_id)));
        }
        self.trees
            .lock()
            .unwrap()
            .get(page_id)
            .cloned()
            .ok_or_else(|| SyncError::not_found(page_id))
    }

    async fn create_or_update_page(
        &self,
        properties: &PageProperties,
        blocks: &[BlockNode],
    ) -> Result<CreatedPage, SyncError> {
        if self.rejected_titles.contains(&properties.title) {
            return Err(SyncError::remote_rejected(format!(
                "property schema mismatch for {}",
                properties.title
            )));
        }

        let mut created = self.created.lock().unwrap();
        created.push((properties.clone(), blocks.to_vec()));
        let page_id = format!("created-{}", created.len());

        Ok(CreatedPage {
            url: format!("https://pages.example.com/{}", page_id),
            page_id,
        })
    }
}

/// Published page with a slug derived from the id
pub fn published(id: &str, title: &str) -> PageProperties {
    let mut props = PageProperties::new(id, title);
    props.status = Some("Published".to_string());
    props.slug = Some(format!("{}-slug", id));
    props
}
