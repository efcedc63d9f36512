//! Import Validation
//!
//! Checks Markdown files before they are imported. Validation never fails;
//! every problem becomes an issue string on the [`ValidationOutcome`].
//!
//! An empty body is reported but does not block import. Every other issue
//! (missing title, unparsable date, malformed YAML header, oversized input)
//! does.

use crate::markdown::{front_matter, title_from_file_name};
use crate::models::{FrontMatterFields, MarkdownFile, ValidationOutcome, ValidationReport};

pub const MISSING_TITLE: &str = "Missing title";
pub const EMPTY_CONTENT: &str = "Content is empty";

/// Validate one file
pub fn validate(file_name: &str, content: &str) -> ValidationOutcome {
    let parsed = match front_matter::decode_checked(content) {
        Ok(parsed) => parsed,
        Err(error) => {
            return ValidationOutcome {
                file_name: file_name.to_string(),
                valid: false,
                issues: vec![error.to_string()],
                parsed_properties: FrontMatterFields::default(),
                parsed_content_length: 0,
                blocking: true,
            };
        }
    };

    let mut issues = Vec::new();
    let mut blocking = false;

    let has_title = parsed
        .fields
        .title
        .as_deref()
        .is_some_and(|title| !title.trim().is_empty());
    if !has_title && title_from_file_name(file_name).trim().is_empty() {
        issues.push(MISSING_TITLE.to_string());
        blocking = true;
    }

    if !parsed.issues.is_empty() {
        issues.extend(parsed.issues);
        blocking = true;
    }

    let body = parsed.body.trim();
    if body.is_empty() {
        issues.push(EMPTY_CONTENT.to_string());
    }

    ValidationOutcome {
        file_name: file_name.to_string(),
        valid: issues.is_empty(),
        issues,
        parsed_properties: parsed.fields,
        parsed_content_length: body.chars().count(),
        blocking,
    }
}

/// Validate several files, keeping input order
pub fn validate_all(files: &[MarkdownFile]) -> ValidationReport {
    let results: Vec<ValidationOutcome> = files
        .iter()
        .map(|file| validate(&file.file_name, &file.content))
        .collect();
    let valid_files = results.iter().filter(|outcome| outcome.valid).count();

    ValidationReport {
        total_files: results.len(),
        valid_files,
        invalid_files: results.len() - valid_files,
        results,
    }
}
