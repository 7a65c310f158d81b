//! Page-throughput arithmetic shared by the scheduler and the progress classifier.

/// Days needed to work `pages` at `pages_per_week`, rounded up to whole days.
///
/// `pages_per_week` must be at least 1; zero or negative page counts take no time.
pub fn days_for_pages(pages: i64, pages_per_week: i64) -> i64 {
    if pages <= 0 {
        return 0;
    }
    let rate = pages_per_week.max(1);
    let day_pages = pages.saturating_mul(7);
    day_pages / rate + i64::from(day_pages % rate != 0)
}

/// Number of batches needed to move `pages` in batches of `batch`.
pub fn batch_count(pages: i64, batch: i64) -> i64 {
    if pages <= 0 {
        return 0;
    }
    let batch = batch.max(1);
    (pages + batch - 1) / batch
}

/// Size of the final, possibly partial, batch.
pub fn last_batch_pages(pages: i64, batch: i64) -> i64 {
    if pages <= 0 {
        return 0;
    }
    let batch = batch.max(1);
    pages - batch * (batch_count(pages, batch) - 1)
}
