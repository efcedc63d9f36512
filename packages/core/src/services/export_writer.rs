//! Export File Writer
//!
//! Writes exported documents to a directory, one `<slug>.md` file per page.

use crate::models::{ExportedDocument, PageProperties};
use anyhow::Context;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

const FALLBACK_STEM: &str = "untitled";

/// `<slug or id>.md`, safe for any filesystem
pub fn export_file_name(properties: &PageProperties) -> String {
    format!("{}.md", sanitize_file_stem(properties.slug_or_id()))
}

/// Replace filesystem-unsafe characters with hyphens and drop control
/// characters
pub fn sanitize_file_stem(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '<' | '>' | '|' | '"' => '-',
            _ => c,
        })
        .collect();

    let trimmed = sanitized.trim().trim_matches('.');
    if trimmed.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Write every document into `dir`, creating it if needed
///
/// Returns the written paths in input order. Two documents with the same
/// file name get `-2`, `-3`, ... suffixes instead of overwriting each other.
pub async fn write_exports(
    dir: impl AsRef<Path>,
    documents: &[ExportedDocument],
) -> anyhow::Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create export directory {}", dir.display()))?;

    let mut used = HashSet::new();
    let mut written = Vec::with_capacity(documents.len());

    for document in documents {
        let file_name = unique_file_name(&document.file_name, &mut used);
        let path = dir.join(&file_name);

        tokio::fs::write(&path, document.markdown.as_bytes())
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        tracing::debug!("Wrote {} ({} bytes)", path.display(), document.markdown.len());
        written.push(path);
    }

    tracing::info!("Wrote {} exported files to {}", written.len(), dir.display());
    Ok(written)
}

fn unique_file_name(file_name: &str, used: &mut HashSet<String>) -> String {
    let file_name = match file_name.strip_suffix(".md") {
        Some(stem) => format!("{}.md", sanitize_file_stem(stem)),
        None => format!("{}.md", sanitize_file_stem(file_name)),
    };

    if used.insert(file_name.clone()) {
        return file_name;
    }

    let stem = file_name.trim_end_matches(".md");
    let mut counter = 2;
    loop {
        let candidate = format!("{}-{}.md", stem, counter);
        if used.insert(candidate.clone()) {
            tracing::warn!("Duplicate export file name {}, writing {}", file_name, candidate);
            return candidate;
        }
        counter += 1;
    }
}
