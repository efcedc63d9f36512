//! Block Tree Data Structures
//!
//! A page's content is a tree of [`BlockNode`]s. Every node carries a closed
//! [`BlockType`] tag, its inline [`RichTextRun`]s and an ordered list of child
//! ids. The tree itself lives in a [`BlockTree`], keyed by node id, whose root
//! id equals the page id.
//!
//! # Examples
//!
//! ```rust
//! use pagebridge_core::models::{BlockNode, BlockTree, BlockType, RichTextRun};
//!
//! let mut tree = BlockTree::new("page-1");
//! tree.append_child(
//!     "page-1",
//!     BlockNode::new("b1", BlockType::Heading1).with_runs(vec![RichTextRun::plain("Hi")]),
//! );
//!
//! assert_eq!(tree.children("page-1").len(), 1);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Independent inline formatting flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Annotations {
    pub bold: bool,
    pub italic: bool,
    pub code: bool,
    pub strikethrough: bool,
}

impl Annotations {
    pub fn is_plain(&self) -> bool {
        *self == Self::default()
    }
}

/// A span of text with its formatting
///
/// A run with `link_url` renders as a Markdown link whose label carries all
/// the other active annotations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RichTextRun {
    pub text: String,

    #[serde(default)]
    pub annotations: Annotations,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_url: Option<String>,
}

impl RichTextRun {
    /// Unformatted run
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            annotations: Annotations::default(),
            link_url: None,
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self::plain(text).with_annotations(Annotations {
            bold: true,
            ..Default::default()
        })
    }

    pub fn italic(text: impl Into<String>) -> Self {
        Self::plain(text).with_annotations(Annotations {
            italic: true,
            ..Default::default()
        })
    }

    pub fn code(text: impl Into<String>) -> Self {
        Self::plain(text).with_annotations(Annotations {
            code: true,
            ..Default::default()
        })
    }

    pub fn link(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self::plain(text).with_link(url)
    }

    pub fn with_annotations(mut self, annotations: Annotations) -> Self {
        self.annotations = annotations;
        self
    }

    pub fn with_link(mut self, url: impl Into<String>) -> Self {
        self.link_url = Some(url.into());
        self
    }

    /// True when two runs can be merged without changing the rendering
    pub fn same_format(&self, other: &RichTextRun) -> bool {
        self.annotations == other.annotations && self.link_url == other.link_url
    }
}

/// Closed set of block kinds
///
/// `Unknown` is the catch-all for anything the remote service reports that
/// this crate has no mapping for; every consumer must handle it without
/// failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BlockType {
    Paragraph,
    Heading1,
    Heading2,
    Heading3,
    BulletItem,
    NumberItem,
    Quote,
    Code,
    Divider,
    Image,
    #[serde(other)]
    Unknown,
}

impl BlockType {
    /// Heading type for a `#` count, clamping deeper levels to `Heading3`
    pub fn heading(level: usize) -> Self {
        match level {
            0 | 1 => BlockType::Heading1,
            2 => BlockType::Heading2,
            _ => BlockType::Heading3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BlockType::Paragraph => "paragraph",
            BlockType::Heading1 => "heading1",
            BlockType::Heading2 => "heading2",
            BlockType::Heading3 => "heading3",
            BlockType::BulletItem => "bulletItem",
            BlockType::NumberItem => "numberItem",
            BlockType::Quote => "quote",
            BlockType::Code => "code",
            BlockType::Divider => "divider",
            BlockType::Image => "image",
            BlockType::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for BlockType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One structural unit of a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockNode {
    pub id: String,

    #[serde(rename = "type")]
    pub block_type: BlockType,

    #[serde(default)]
    pub runs: Vec<RichTextRun>,

    /// Fence language for code blocks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    /// Image caption; empty means no caption
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub caption: Vec<RichTextRun>,

    /// Ordered child ids
    #[serde(default)]
    pub child_ids: Vec<String>,
}

impl BlockNode {
    pub fn new(id: impl Into<String>, block_type: BlockType) -> Self {
        Self {
            id: id.into(),
            block_type,
            runs: Vec::new(),
            language: None,
            image_url: None,
            caption: Vec::new(),
            child_ids: Vec::new(),
        }
    }

    /// Node with a freshly generated UUID
    pub fn with_generated_id(block_type: BlockType) -> Self {
        Self::new(Uuid::new_v4().to_string(), block_type)
    }

    pub fn with_runs(mut self, runs: Vec<RichTextRun>) -> Self {
        self.runs = runs;
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_image(mut self, url: impl Into<String>, caption: Vec<RichTextRun>) -> Self {
        self.image_url = Some(url.into());
        self.caption = caption;
        self
    }

    /// Concatenated run text with no markup
    pub fn plain_text(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }
}

/// A page's block tree
///
/// The root node is a container: its id is the page id and its own type and
/// runs are never rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockTree {
    pub root_id: String,
    pub nodes: HashMap<String, BlockNode>,
}

impl BlockTree {
    /// Tree containing only an empty root
    pub fn new(root_id: impl Into<String>) -> Self {
        let root_id = root_id.into();
        let mut nodes = HashMap::new();
        nodes.insert(
            root_id.clone(),
            BlockNode::new(root_id.clone(), BlockType::Unknown),
        );
        Self { root_id, nodes }
    }

    /// Tree whose root has `blocks` as direct children, in order
    pub fn from_blocks(root_id: impl Into<String>, blocks: Vec<BlockNode>) -> Self {
        let mut tree = Self::new(root_id);
        let root_id = tree.root_id.clone();
        for block in blocks {
            tree.append_child(&root_id, block);
        }
        tree
    }

    pub fn root(&self) -> Option<&BlockNode> {
        self.nodes.get(&self.root_id)
    }

    pub fn get(&self, id: &str) -> Option<&BlockNode> {
        self.nodes.get(id)
    }

    /// Insert or replace a node without linking it to a parent
    pub fn insert(&mut self, node: BlockNode) {
        self.nodes.insert(node.id.clone(), node);
    }

    /// Insert `node` and append its id to `parent_id`'s children
    ///
    /// Returns false (and leaves the tree unchanged) if the parent is missing.
    pub fn append_child(&mut self, parent_id: &str, node: BlockNode) -> bool {
        let Some(parent) = self.nodes.get_mut(parent_id) else {
            return false;
        };
        parent.child_ids.push(node.id.clone());
        self.nodes.insert(node.id.clone(), node);
        true
    }

    /// Children of `id` in order; ids that point nowhere are skipped
    pub fn children(&self, id: &str) -> Vec<&BlockNode> {
        self.nodes
            .get(id)
            .map(|node| {
                node.child_ids
                    .iter()
                    .filter_map(|child_id| self.nodes.get(child_id))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of content blocks, excluding the root
    pub fn len(&self) -> usize {
        self.nodes.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_block_type_serializes_camel_case() {
        assert_eq!(
            serde_json::to_value(BlockType::BulletItem).unwrap(),
            json!("bulletItem")
        );
        assert_eq!(
            serde_json::to_value(BlockType::Heading2).unwrap(),
            json!("heading2")
        );
    }

    #[test]
    fn test_unrecognized_block_type_deserializes_as_unknown() {
        let node: BlockNode = serde_json::from_value(json!({
            "id": "b1",
            "type": "table_of_contents",
            "runs": [{"text": "x"}]
        }))
        .unwrap();

        assert_eq!(node.block_type, BlockType::Unknown);
        assert_eq!(node.plain_text(), "x");
    }

    #[test]
    fn test_heading_levels_clamp() {
        assert_eq!(BlockType::heading(1), BlockType::Heading1);
        assert_eq!(BlockType::heading(2), BlockType::Heading2);
        assert_eq!(BlockType::heading(3), BlockType::Heading3);
        assert_eq!(BlockType::heading(6), BlockType::Heading3);
    }

    #[test]
    fn test_tree_preserves_child_order() {
        let tree = BlockTree::from_blocks(
            "page",
            vec![
                BlockNode::new("a", BlockType::Paragraph),
                BlockNode::new("b", BlockType::Divider),
                BlockNode::new("c", BlockType::Quote),
            ],
        );

        let ids: Vec<&str> = tree.children("page").iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn test_append_to_missing_parent_is_rejected() {
        let mut tree = BlockTree::new("page");
        assert!(!tree.append_child("nope", BlockNode::new("a", BlockType::Paragraph)));
        assert!(tree.is_empty());
    }

    #[test]
    fn test_dangling_child_ids_are_skipped() {
        let mut tree = BlockTree::new("page");
        tree.append_child("page", BlockNode::new("a", BlockType::Paragraph));
        if let Some(root) = tree.nodes.get_mut("page") {
            root.child_ids.push("ghost".to_string());
        }

        assert_eq!(tree.children("page").len(), 1);
    }
}
