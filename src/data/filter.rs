use std::path::Path;

use super::loader::list_plots;
use super::model::{PageResult, PlotRecord};
use crate::error::{BrowseError, Result};

// ---------------------------------------------------------------------------
// Query: filters plus the requested page
// ---------------------------------------------------------------------------

/// Filter predicates applied to the plots of one use case.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlotFilter {
    /// Case-insensitive substring of the file name. Empty means no filter.
    pub search: Option<String>,
    pub hide_no_outlier: bool,
    pub hide_zero_std: bool,
}

/// A page request. Sizes are signed so out-of-range input can be clamped or
/// rejected here instead of failing at extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct PageQuery {
    pub page_size: i64,
    pub page_number: i64,
    pub filter: PlotFilter,
}

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

/// Keep the records passing every active predicate, preserving order.
///
/// Predicates run in a fixed order: search, then the outlier flag, then the
/// zero-spread flag.
pub fn filter_records(records: Vec<PlotRecord>, filter: &PlotFilter) -> Vec<PlotRecord> {
    let needle = filter
        .search
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    records
        .into_iter()
        .filter(|r| match &needle {
            Some(needle) => r.file_name.to_lowercase().contains(needle.as_str()),
            None => true,
        })
        .filter(|r| !filter.hide_no_outlier || r.has_outlier)
        .filter(|r| !filter.hide_zero_std || !r.is_zero_std())
        .collect()
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

/// Number of pages needed for `count` records; never less than one.
pub fn total_pages(count: usize, page_size: usize) -> usize {
    count.div_ceil(page_size).max(1)
}

/// Clamp a requested page into `[0, total_pages - 1]`.
pub fn clamp_page(page_number: i64, total_pages: usize) -> usize {
    let last = total_pages.saturating_sub(1);
    usize::try_from(page_number).map_or(0, |p| p.min(last))
}

/// Slice one page out of an already filtered sequence.
pub fn paginate(records: Vec<PlotRecord>, page_size: usize, page_number: i64) -> PageResult {
    let total_pages = total_pages(records.len(), page_size);
    let page_number = clamp_page(page_number, total_pages);
    let offset = page_number * page_size;

    let records = records.into_iter().skip(offset).take(page_size).collect();

    PageResult {
        records,
        total_pages,
        page_number,
        offset,
    }
}

/// Filter and paginate the plots of `use_case`.
pub fn get_page(root: &Path, use_case: &str, query: &PageQuery) -> Result<PageResult> {
    let page_size = usize::try_from(query.page_size)
        .ok()
        .filter(|&size| size > 0)
        .ok_or_else(|| {
            BrowseError::InvalidArgument(format!(
                "page size must be positive, got {}",
                query.page_size
            ))
        })?;

    let records = list_plots(root, use_case)?;
    let listed = records.len();
    let filtered = filter_records(records, &query.filter);
    log::debug!(
        "{use_case}: {} of {listed} plots pass {:?}",
        filtered.len(),
        query.filter
    );

    Ok(paginate(filtered, page_size, query.page_number))
}
