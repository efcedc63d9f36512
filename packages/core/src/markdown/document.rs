//! Document Transcoder
//!
//! Whole-document conversion: front matter header plus the block tree
//! rendered depth-first, and the reverse parse of a Markdown file into a
//! [`Document`] with a flat list of top-level blocks.

use crate::markdown::block::{self, ImageUrlHook, ParseContext};
use crate::markdown::front_matter;
use crate::models::{BlockTree, Document};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use uuid::Uuid;

/// Maximum block nesting followed during export
pub const DEFAULT_MAX_DEPTH: usize = 20;

/// Export-side knobs
#[derive(Clone)]
pub struct TranscodeOptions {
    pub image_url_hook: Option<ImageUrlHook>,

    /// Extra front matter keys written after the page properties
    pub custom_fields: BTreeMap<String, Value>,

    pub max_depth: usize,
}

impl Default for TranscodeOptions {
    fn default() -> Self {
        Self {
            image_url_hook: None,
            custom_fields: BTreeMap::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl std::fmt::Debug for TranscodeOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranscodeOptions")
            .field("image_url_hook", &self.image_url_hook.is_some())
            .field("custom_fields", &self.custom_fields)
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

impl TranscodeOptions {
    pub fn with_image_url_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.image_url_hook = Some(std::sync::Arc::new(hook));
        self
    }

    pub fn with_custom_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.custom_fields.insert(key.into(), value);
        self
    }
}

/// Converts whole documents to and from Markdown
#[derive(Debug, Clone, Default)]
pub struct DocumentTranscoder {
    options: TranscodeOptions,
}

impl DocumentTranscoder {
    pub fn new(options: TranscodeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &TranscodeOptions {
        &self.options
    }

    /// Front matter, a blank line, then the blocks separated by blank lines
    ///
    /// A document with no renderable blocks is just the header and a newline.
    pub fn to_markdown(&self, document: &Document) -> String {
        let header = front_matter::encode_with(&document.properties, &self.options.custom_fields);
        let body = self.body_to_markdown(&document.blocks);

        if body.is_empty() {
            format!("{}\n", header)
        } else {
            format!("{}\n\n{}\n", header, body)
        }
    }

    /// Render only the block tree
    pub fn body_to_markdown(&self, tree: &BlockTree) -> String {
        let mut rendered = Vec::new();
        let mut visited = HashSet::new();
        visited.insert(tree.root_id.clone());

        self.render_children(tree, &tree.root_id, 0, &mut visited, &mut rendered);
        rendered.join("\n\n")
    }

    fn render_children(
        &self,
        tree: &BlockTree,
        parent_id: &str,
        depth: usize,
        visited: &mut HashSet<String>,
        rendered: &mut Vec<String>,
    ) {
        if depth >= self.options.max_depth {
            tracing::warn!(
                "Maximum block depth {} reached under {}, skipping deeper blocks",
                self.options.max_depth,
                parent_id
            );
            return;
        }

        for child in tree.children(parent_id) {
            if !visited.insert(child.id.clone()) {
                tracing::warn!("Block {} appears twice in the tree, skipping", child.id);
                continue;
            }

            let markdown = block::to_markdown_with(child, self.options.image_url_hook.as_ref());
            if !markdown.is_empty() {
                rendered.push(markdown);
            }

            self.render_children(tree, &child.id, depth + 1, visited, rendered);
        }
    }

    /// Parse a Markdown file into a new document
    ///
    /// The page gets a fresh id. With no `title` in the header the title is
    /// taken from `file_name`. Never fails; size limits and header issues
    /// are the validator's concern.
    pub fn from_markdown(&self, raw: &str, file_name: &str) -> Document {
        self.from_markdown_with_extra(raw, file_name).0
    }

    /// [`Self::from_markdown`] plus the front matter keys that have no page
    /// property, as JSON
    pub fn from_markdown_with_extra(
        &self,
        raw: &str,
        file_name: &str,
    ) -> (Document, BTreeMap<String, Value>) {
        let parsed = front_matter::decode(raw);
        let page_id = Uuid::new_v4().to_string();
        let properties = parsed
            .fields
            .into_properties(page_id.clone(), &title_from_file_name(file_name));

        let mut context = ParseContext::new();
        let mut blocks: Vec<_> = parsed
            .body
            .lines()
            .filter_map(|line| block::from_markdown(line, &mut context))
            .collect();
        if context.in_code_fence() {
            tracing::warn!("Unterminated code fence in {}, closing it at end of file", file_name);
        }
        blocks.extend(context.finish());

        let document = Document {
            properties,
            blocks: BlockTree::from_blocks(page_id, blocks),
        };
        (document, parsed.extra)
    }
}

/// File name without directories and without a `.md`/`.markdown` extension
pub fn title_from_file_name(file_name: &str) -> String {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name);
    let stem = base
        .strip_suffix(".md")
        .or_else(|| base.strip_suffix(".markdown"))
        .unwrap_or(base);
    stem.to_string()
}

#[cfg(test)]
#[path = "document_test.rs"]
mod document_test;
