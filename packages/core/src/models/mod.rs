//! Data Models
//!
//! - `block` - Block tree: `BlockNode`, `BlockType`, `RichTextRun`
//! - `page` - Page metadata, front matter fields and `Document`
//! - `filter` - Listing scope and filter criteria
//! - `batch` - Batch lifecycle and result records
//! - `time` - Clock abstraction used for cache expiry

mod batch;
mod block;
mod filter;
mod page;
pub mod time;

pub use batch::{
    BatchResult, BatchRun, BatchState, ExportedDocument, ImportedPage, ItemError, MarkdownFile,
    ValidationOutcome, ValidationReport,
};
pub use block::{Annotations, BlockNode, BlockTree, BlockType, RichTextRun};
pub use filter::{DateRange, FilterCriteria, QueryScope};
pub use page::{parse_page_date, Document, FrontMatterFields, PageProperties, PropertyValue};
