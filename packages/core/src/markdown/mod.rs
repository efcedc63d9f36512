//! Markdown Transcoding
//!
//! - `rich_text` - inline runs ⇄ `**bold**`, `*italic*`, `` `code` ``, `~~strike~~`, links
//! - `block` - one block ⇄ one Markdown construct
//! - `front_matter` - page properties ⇄ `---` header
//! - `document` - whole documents, built on the three above

pub mod block;
pub mod document;
pub mod front_matter;
pub mod rich_text;

pub use block::{ImageUrlHook, ParseContext};
pub use document::{title_from_file_name, DocumentTranscoder, TranscodeOptions, DEFAULT_MAX_DEPTH};
pub use front_matter::{ParsedFrontMatter, MAX_DOCUMENT_SIZE};
