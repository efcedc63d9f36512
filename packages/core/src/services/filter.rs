//! Page Filtering
//!
//! Pure predicate over [`PageProperties`]. Every criterion that is set must
//! hold (logical AND); unset criteria match everything. Blank strings and
//! empty tag lists count as unset.
//!
//! | Criterion    | Match rule                                              |
//! |--------------|---------------------------------------------------------|
//! | `status`     | exact, case-sensitive                                   |
//! | `page_type`  | exact, case-sensitive                                   |
//! | `category`   | exact, case-sensitive                                   |
//! | `tags`       | page has at least one of the listed tags                |
//! | `date_range` | inclusive bounds; a missing or bad date never matches   |
//! | `keyword`    | case-insensitive substring of title, summary or category |

use crate::models::{FilterCriteria, PageProperties};

/// True when `page` satisfies every set criterion
pub fn matches(page: &PageProperties, criteria: &FilterCriteria) -> bool {
    let exact = [
        (criteria.status.as_deref(), page.status.as_deref()),
        (criteria.page_type.as_deref(), page.page_type.as_deref()),
        (criteria.category.as_deref(), page.category.as_deref()),
    ];
    for (wanted, actual) in exact {
        if let Some(wanted) = wanted.filter(|v| !v.trim().is_empty()) {
            if actual != Some(wanted) {
                return false;
            }
        }
    }

    if let Some(tags) = criteria.tags.as_ref().filter(|tags| !tags.is_empty()) {
        if !page.tags.iter().any(|tag| tags.contains(tag)) {
            return false;
        }
    }

    if let Some(range) = criteria.date_range.as_ref().filter(|r| !r.is_unbounded()) {
        match page.parsed_date() {
            Some(date) if range.contains(date) => {}
            _ => return false,
        }
    }

    if let Some(keyword) = criteria.keyword.as_deref().map(str::trim) {
        if !keyword.is_empty() && !contains_keyword(page, keyword) {
            return false;
        }
    }

    true
}

fn contains_keyword(page: &PageProperties, keyword: &str) -> bool {
    let needle = keyword.to_lowercase();
    std::iter::once(Some(page.title.as_str()))
        .chain([page.summary.as_deref(), page.category.as_deref()])
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
}

/// Pages satisfying `criteria`, in input order
pub fn filter(pages: Vec<PageProperties>, criteria: &FilterCriteria) -> Vec<PageProperties> {
    if criteria.is_empty() {
        return pages;
    }
    pages
        .into_iter()
        .filter(|page| matches(page, criteria))
        .collect()
}
