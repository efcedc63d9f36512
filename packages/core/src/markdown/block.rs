//! Block Transcoder
//!
//! Maps one [`BlockNode`] to its Markdown rendering and, in the other
//! direction, classifies Markdown lines into blocks. Parsing is
//! line-oriented; a [`ParseContext`] carries the only multi-line state,
//! an open code fence.

use crate::markdown::rich_text;
use crate::models::{BlockNode, BlockType, RichTextRun};
use regex::Regex;
use std::sync::{Arc, LazyLock};

/// Rewrites image URLs during export (e.g. to a CDN or local asset path)
pub type ImageUrlHook = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// `1. item`, `23. item`
static NUMBER_ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\s+(.*)$").unwrap());

/// A line that is exactly one image: `![alt](url)` with an optional title
static IMAGE_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^!\[([^\]]*)\]\(\s*([^)\s]*)(?:\s+"[^"]*")?\s*\)$"#).unwrap()
});

const FENCE: &str = "```";

/// Render one block as Markdown
///
/// Children are not rendered here; the document transcoder walks the tree.
/// An empty string means the block produces no output.
pub fn to_markdown(node: &BlockNode) -> String {
    to_markdown_with(node, None)
}

/// Render one block, passing image URLs through `image_url_hook`
pub fn to_markdown_with(node: &BlockNode, image_url_hook: Option<&ImageUrlHook>) -> String {
    match node.block_type {
        BlockType::Paragraph => rich_text::encode(&node.runs),
        BlockType::Heading1 => format!("# {}", rich_text::encode(&node.runs)),
        BlockType::Heading2 => format!("## {}", rich_text::encode(&node.runs)),
        BlockType::Heading3 => format!("### {}", rich_text::encode(&node.runs)),
        BlockType::BulletItem => format!("- {}", rich_text::encode(&node.runs)),
        BlockType::NumberItem => format!("1. {}", rich_text::encode(&node.runs)),
        BlockType::Quote => format!("> {}", rich_text::encode(&node.runs)),
        BlockType::Code => {
            // Code content is raw: no inline markup is applied or escaped
            let language = node.language.as_deref().unwrap_or("");
            format!("{}{}\n{}\n{}", FENCE, language, node.plain_text(), FENCE)
        }
        BlockType::Divider => "---".to_string(),
        BlockType::Image => render_image(node, image_url_hook),
        BlockType::Unknown => node.plain_text(),
    }
}

fn render_image(node: &BlockNode, image_url_hook: Option<&ImageUrlHook>) -> String {
    let url = node.image_url.as_deref().unwrap_or("").trim();
    if url.is_empty() {
        return String::new();
    }

    let url = match image_url_hook {
        Some(hook) => hook(url),
        None => url.to_string(),
    };

    format!("![{}]({})", rich_text::plain_text(&node.caption), url)
}

struct OpenFence {
    language: Option<String>,
    lines: Vec<String>,
}

/// Multi-line state for [`from_markdown`]
///
/// Feed every line of a body through the same context, then call
/// [`ParseContext::finish`] to flush a code fence left open at the end.
#[derive(Default)]
pub struct ParseContext {
    fence: Option<OpenFence>,
}

impl ParseContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while inside an unterminated code fence
    pub fn in_code_fence(&self) -> bool {
        self.fence.is_some()
    }

    /// Close any open fence, returning its code block
    ///
    /// An unterminated fence runs to the end of the input.
    pub fn finish(&mut self) -> Option<BlockNode> {
        self.fence.take().map(|fence| {
            let mut node = BlockNode::with_generated_id(BlockType::Code);
            let content = fence.lines.join("\n");
            if !content.is_empty() {
                node.runs = vec![RichTextRun::plain(content)];
            }
            node.language = fence.language;
            node
        })
    }
}

/// Classify one Markdown line
///
/// Returns `None` for blank lines and for lines absorbed into an open code
/// fence. Classification order: fence, heading, list item, quote, divider,
/// image, paragraph.
pub fn from_markdown(line: &str, context: &mut ParseContext) -> Option<BlockNode> {
    let trimmed = line.trim();

    if let Some(fence) = context.fence.as_mut() {
        if trimmed.starts_with(FENCE) {
            return context.finish();
        }
        fence.lines.push(line.trim_end_matches('\r').to_string());
        return None;
    }

    if let Some(info) = trimmed.strip_prefix(FENCE) {
        let language = info.trim();
        context.fence = Some(OpenFence {
            language: (!language.is_empty()).then(|| language.to_string()),
            lines: Vec::new(),
        });
        return None;
    }

    if trimmed.is_empty() {
        return None;
    }

    if let Some((level, text)) = parse_heading(trimmed) {
        return Some(text_block(BlockType::heading(level), text));
    }

    if let Some(text) = trimmed
        .strip_prefix("- ")
        .or_else(|| trimmed.strip_prefix("* "))
    {
        return Some(text_block(BlockType::BulletItem, text.trim_start()));
    }

    if let Some(caps) = NUMBER_ITEM_RE.captures(trimmed) {
        let text = caps.get(1).map_or("", |m| m.as_str());
        return Some(text_block(BlockType::NumberItem, text));
    }

    if let Some(text) = trimmed.strip_prefix('>') {
        return Some(text_block(BlockType::Quote, text.trim_start()));
    }

    if trimmed == "---" || trimmed == "***" {
        return Some(BlockNode::with_generated_id(BlockType::Divider));
    }

    if let Some(caps) = IMAGE_LINE_RE.captures(trimmed) {
        let alt = caps.get(1).map_or("", |m| m.as_str());
        let url = caps.get(2).map_or("", |m| m.as_str());
        let caption = if alt.is_empty() {
            Vec::new()
        } else {
            vec![RichTextRun::plain(alt)]
        };
        return Some(BlockNode::with_generated_id(BlockType::Image).with_image(url, caption));
    }

    Some(text_block(BlockType::Paragraph, trimmed))
}

/// `#`..`######` followed by a space; deeper than three clamps to heading 3
fn parse_heading(line: &str) -> Option<(usize, &str)> {
    let level = line.chars().take_while(|&c| c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }

    let rest = &line[level..];
    if rest.is_empty() {
        return Some((level, ""));
    }
    rest.strip_prefix(' ').map(|text| (level, text.trim()))
}

fn text_block(block_type: BlockType, text: &str) -> BlockNode {
    BlockNode::with_generated_id(block_type).with_runs(rich_text::decode(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_line(line: &str) -> BlockNode {
        let mut context = ParseContext::new();
        from_markdown(line, &mut context).unwrap()
    }

    fn parse_all(lines: &[&str]) -> Vec<BlockNode> {
        let mut context = ParseContext::new();
        let mut blocks: Vec<BlockNode> = lines
            .iter()
            .filter_map(|line| from_markdown(line, &mut context))
            .collect();
        blocks.extend(context.finish());
        blocks
    }

    #[test]
    fn test_render_every_block_type() {
        let text = vec![RichTextRun::plain("t")];
        let cases = [
            (BlockType::Paragraph, "t"),
            (BlockType::Heading1, "# t"),
            (BlockType::Heading2, "## t"),
            (BlockType::Heading3, "### t"),
            (BlockType::BulletItem, "- t"),
            (BlockType::NumberItem, "1. t"),
            (BlockType::Quote, "> t"),
            (BlockType::Divider, "---"),
            (BlockType::Unknown, "t"),
        ];

        for (block_type, expected) in cases {
            let node = BlockNode::new("b", block_type).with_runs(text.clone());
            assert_eq!(to_markdown(&node), expected, "{}", block_type);
        }
    }

    #[test]
    fn test_render_code_block_keeps_content_raw() {
        let node = BlockNode::new("b", BlockType::Code)
            .with_runs(vec![RichTextRun::bold("let x = **y**;")])
            .with_language("rust");

        assert_eq!(to_markdown(&node), "```rust\nlet x = **y**;\n```");
    }

    #[test]
    fn test_render_unknown_uses_plain_text() {
        let node = BlockNode::new("b", BlockType::Unknown)
            .with_runs(vec![RichTextRun::bold("callout")]);
        assert_eq!(to_markdown(&node), "callout");
    }

    #[test]
    fn test_render_image_with_and_without_url() {
        let image = BlockNode::new("b", BlockType::Image)
            .with_image("https://img/x.png", vec![RichTextRun::italic("Cap")]);
        assert_eq!(to_markdown(&image), "![Cap](https://img/x.png)");

        let missing = BlockNode::new("b", BlockType::Image);
        assert_eq!(to_markdown(&missing), "");
    }

    #[test]
    fn test_render_image_hook_rewrites_url() {
        let hook: ImageUrlHook = Arc::new(|url: &str| url.replace("https://img", "/assets"));
        let image =
            BlockNode::new("b", BlockType::Image).with_image("https://img/x.png", Vec::new());

        assert_eq!(to_markdown_with(&image, Some(&hook)), "![](/assets/x.png)");
    }

    #[test]
    fn test_parse_headings() {
        let h1 = parse_line("# Title");
        assert_eq!(h1.block_type, BlockType::Heading1);
        assert_eq!(h1.plain_text(), "Title");

        assert_eq!(parse_line("## Two").block_type, BlockType::Heading2);
        assert_eq!(parse_line("#### Four").block_type, BlockType::Heading3);
        assert_eq!(parse_line("#hashtag").block_type, BlockType::Paragraph);
    }

    #[test]
    fn test_parse_list_items() {
        let bullet = parse_line("- item **one**");
        assert_eq!(bullet.block_type, BlockType::BulletItem);
        assert_eq!(
            bullet.runs,
            vec![RichTextRun::plain("item "), RichTextRun::bold("one")]
        );

        assert_eq!(parse_line("* star").block_type, BlockType::BulletItem);

        let numbered = parse_line("12. twelfth");
        assert_eq!(numbered.block_type, BlockType::NumberItem);
        assert_eq!(numbered.plain_text(), "twelfth");
    }

    #[test]
    fn test_parse_quote_divider_image() {
        let quote = parse_line("> wise words");
        assert_eq!(quote.block_type, BlockType::Quote);
        assert_eq!(quote.plain_text(), "wise words");

        assert_eq!(parse_line("---").block_type, BlockType::Divider);
        assert_eq!(parse_line("***").block_type, BlockType::Divider);

        let image = parse_line("![A cat](https://img/cat.png)");
        assert_eq!(image.block_type, BlockType::Image);
        assert_eq!(image.image_url.as_deref(), Some("https://img/cat.png"));
        assert_eq!(image.caption, vec![RichTextRun::plain("A cat")]);
    }

    #[test]
    fn test_inline_image_in_text_is_a_paragraph() {
        let node = parse_line("see ![x](y.png) here");
        assert_eq!(node.block_type, BlockType::Paragraph);
    }

    #[test]
    fn test_blank_lines_produce_nothing() {
        let mut context = ParseContext::new();
        assert!(from_markdown("", &mut context).is_none());
        assert!(from_markdown("   ", &mut context).is_none());
    }

    #[test]
    fn test_parse_code_fence() {
        let blocks = parse_all(&["```python", "def f():", "    return **1**", "```", "after"]);

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].block_type, BlockType::Code);
        assert_eq!(blocks[0].language.as_deref(), Some("python"));
        assert_eq!(blocks[0].plain_text(), "def f():\n    return **1**");
        assert_eq!(blocks[1].block_type, BlockType::Paragraph);
    }

    #[test]
    fn test_unterminated_fence_runs_to_end() {
        let blocks = parse_all(&["```", "# not a heading", "- not a list"]);

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].block_type, BlockType::Code);
        assert_eq!(blocks[0].language, None);
        assert_eq!(blocks[0].plain_text(), "# not a heading\n- not a list");
    }

    #[test]
    fn test_render_then_parse_preserves_type_and_text() {
        let nodes = vec![
            BlockNode::new("a", BlockType::Heading2).with_runs(vec![RichTextRun::plain("Sub")]),
            BlockNode::new("b", BlockType::BulletItem)
                .with_runs(vec![RichTextRun::plain("x "), RichTextRun::italic("y")]),
            BlockNode::new("c", BlockType::NumberItem).with_runs(vec![RichTextRun::plain("n")]),
            BlockNode::new("d", BlockType::Quote).with_runs(vec![RichTextRun::code("q")]),
            BlockNode::new("e", BlockType::Paragraph)
                .with_runs(vec![RichTextRun::link("site", "https://s.io")]),
        ];

        for node in nodes {
            let parsed = parse_line(&to_markdown(&node));
            assert_eq!(parsed.block_type, node.block_type);
            assert_eq!(parsed.runs, node.runs);
        }
    }
}
