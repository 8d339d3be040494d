//! Multi-region paginated collection
//!
//! Vendor list APIs are walked region by region, then scope by scope
//! (resource groups and the like), then page by page at a fixed page size.
//! A failed page ends its scope only; cancellation is honoured between
//! regions and never discards what was already collected.

use crate::progress::ProgressReporter;
use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::io::Write;
use tokio_util::sync::CancellationToken;

/// Fixed page size requested from every page-numbered API
pub const PAGE_SIZE: u32 = 100;

/// Position of a single page request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationCursor {
    pub region: String,

    /// Sub-partition of the region, `None` for an unfiltered listing
    pub scope: Option<String>,

    /// 1-based page number
    pub page_number: u32,

    pub page_size: u32,
}

impl PaginationCursor {
    pub fn first(region: impl Into<String>, scope: Option<&str>) -> Self {
        Self {
            region: region.into(),
            scope: scope.map(str::to_string),
            page_number: 1,
            page_size: PAGE_SIZE,
        }
    }
}

/// One page of results together with the total the API reported
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total_count: u64) -> Self {
        Self { items, total_count }
    }
}

/// A vendor list API addressed by page number
#[async_trait]
pub trait PageSource: Send + Sync {
    type Item: Send;
    type Error: fmt::Display + Send;

    async fn fetch_page(
        &self,
        cursor: &PaginationCursor,
    ) -> std::result::Result<Page<Self::Item>, Self::Error>;
}

/// Number of pages needed for `total` items
pub fn page_count(total: u64, page_size: u32) -> u64 {
    total.div_ceil(u64::from(page_size.max(1)))
}

/// Lazy page sequence for a single region and scope.
///
/// Each call to [`ScopePages::next_batch`] performs at most one fetch. The
/// sequence ends after the last page, on an empty listing, or right after
/// yielding an error, and cannot be restarted.
pub struct ScopePages<'a, S: PageSource + ?Sized> {
    source: &'a S,
    cursor: PaginationCursor,
    done: bool,
}

impl<'a, S: PageSource + ?Sized> ScopePages<'a, S> {
    pub fn new(source: &'a S, region: &str, scope: Option<&str>) -> Self {
        Self {
            source,
            cursor: PaginationCursor::first(region, scope),
            done: false,
        }
    }

    pub async fn next_batch(&mut self) -> Option<std::result::Result<Vec<S::Item>, S::Error>> {
        if self.done {
            return None;
        }

        match self.source.fetch_page(&self.cursor).await {
            Ok(page) => {
                let pages = page_count(page.total_count, self.cursor.page_size);
                if pages == 0 || u64::from(self.cursor.page_number) >= pages {
                    self.done = true;
                } else {
                    self.cursor.page_number += 1;
                }
                Some(Ok(page.items))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Walks regions and scopes, accumulating items in region, scope, page order
#[derive(Debug, Clone)]
pub struct PaginatedCollector {
    regions: Vec<String>,
    scopes: Vec<Option<String>>,
    cancel: CancellationToken,
}

impl PaginatedCollector {
    pub fn new(regions: Vec<String>) -> Self {
        Self {
            regions,
            scopes: vec![None],
            cancel: CancellationToken::new(),
        }
    }

    /// Restrict each region to the given scopes; an empty list means unfiltered
    pub fn with_scopes(mut self, scopes: Vec<Option<String>>) -> Self {
        self.scopes = if scopes.is_empty() { vec![None] } else { scopes };
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    /// Collect every page of every scope of every region
    pub async fn collect<S, W>(&self, source: &S, progress: &mut ProgressReporter<W>) -> Vec<S::Item>
    where
        S: PageSource + ?Sized,
        W: Write + Send,
    {
        let scopes = &self.scopes;
        self.walk_regions(progress, move |region| async move {
            let mut items = Vec::new();
            for scope in scopes {
                items.extend(collect_scope(source, &region, scope.as_deref()).await);
            }
            items
        })
        .await
    }

    /// Run `per_region` for each region, reporting progress after each one.
    ///
    /// Cancellation is checked before starting a region; items from regions
    /// that already ran are always returned.
    pub async fn walk_regions<T, F, Fut, W>(
        &self,
        progress: &mut ProgressReporter<W>,
        mut per_region: F,
    ) -> Vec<T>
    where
        T: Send,
        F: FnMut(String) -> Fut + Send,
        Fut: Future<Output = Vec<T>> + Send,
        W: Write + Send,
    {
        let mut list = Vec::new();
        for region in &self.regions {
            if self.cancel.is_cancelled() {
                tracing::info!("Enumeration cancelled, skipping remaining regions from {}", region);
                break;
            }

            let batch = per_region(region.clone()).await;
            let delta = batch.len();
            list.extend(batch);

            if let Err(e) = progress.region_done(region, delta) {
                tracing::debug!("Failed to print progress: {}", e);
            }
        }

        if let Err(e) = progress.finish() {
            tracing::debug!("Failed to print progress: {}", e);
        }
        list
    }
}

async fn collect_scope<S>(source: &S, region: &str, scope: Option<&str>) -> Vec<S::Item>
where
    S: PageSource + ?Sized,
{
    let mut pages = ScopePages::new(source, region, scope);
    let mut items = Vec::new();
    while let Some(batch) = pages.next_batch().await {
        match batch {
            Ok(batch) => items.extend(batch),
            Err(e) => {
                tracing::warn!(
                    "Page fetch failed in {} (scope: {}): {}",
                    region,
                    scope.unwrap_or("-"),
                    e
                );
                break;
            }
        }
    }
    items
}

/// Drain every page of a single unscoped listing.
///
/// For global APIs that are not walked region by region. A failure on the
/// first page is returned; a later failure keeps the pages already fetched.
pub async fn drain_scope<S>(
    source: &S,
    region: &str,
) -> std::result::Result<Vec<S::Item>, S::Error>
where
    S: PageSource + ?Sized,
{
    let mut pages = ScopePages::new(source, region, None);
    let mut items = Vec::new();
    let mut fetched = 0usize;
    while let Some(batch) = pages.next_batch().await {
        match batch {
            Ok(batch) => {
                fetched += 1;
                items.extend(batch);
            }
            Err(e) if fetched == 0 => return Err(e),
            Err(e) => {
                tracing::warn!("Page fetch failed after {} pages: {}", fetched, e);
                break;
            }
        }
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves `totals[(region, scope)]` items, failing scopes listed in `fail`
    struct MockSource {
        totals: HashMap<(String, Option<String>), u64>,
        fail: Vec<(String, Option<String>)>,
        calls: Mutex<Vec<PaginationCursor>>,
        cancel_on: Option<(String, CancellationToken)>,
    }

    impl MockSource {
        fn new() -> Self {
            Self {
                totals: HashMap::new(),
                fail: Vec::new(),
                calls: Mutex::new(Vec::new()),
                cancel_on: None,
            }
        }

        fn total(mut self, region: &str, scope: Option<&str>, total: u64) -> Self {
            self.totals
                .insert((region.to_string(), scope.map(str::to_string)), total);
            self
        }

        fn failing(mut self, region: &str, scope: Option<&str>) -> Self {
            self.fail.push((region.to_string(), scope.map(str::to_string)));
            self
        }

        fn pages_fetched(&self) -> Vec<u32> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .map(|c| c.page_number)
                .collect()
        }
    }

    #[async_trait]
    impl PageSource for MockSource {
        type Item = String;
        type Error = String;

        async fn fetch_page(
            &self,
            cursor: &PaginationCursor,
        ) -> std::result::Result<Page<String>, String> {
            self.calls.lock().unwrap().push(cursor.clone());
            if let Some((region, token)) = &self.cancel_on {
                if *region == cursor.region {
                    token.cancel();
                }
            }

            let key = (cursor.region.clone(), cursor.scope.clone());
            if self.fail.contains(&key) {
                return Err(format!("denied in {}", cursor.region));
            }

            let total = self.totals.get(&key).copied().unwrap_or(0);
            let start = u64::from(cursor.page_number - 1) * u64::from(cursor.page_size);
            let end = (start + u64::from(cursor.page_size)).min(total);
            let items = (start..end)
                .map(|i| {
                    format!(
                        "{}/{}/{}",
                        cursor.region,
                        cursor.scope.as_deref().unwrap_or("-"),
                        i
                    )
                })
                .collect();
            Ok(Page::new(items, total))
        }
    }

    fn regions(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(0, 100), 0);
        assert_eq!(page_count(1, 100), 1);
        assert_eq!(page_count(100, 100), 1);
        assert_eq!(page_count(250, 100), 3);
    }

    #[tokio::test]
    async fn test_empty_listing_fetches_once() {
        let source = MockSource::new().total("cn-1", None, 0);
        let collector = PaginatedCollector::new(regions(&["cn-1"]));

        let items = collector.collect(&source, &mut ProgressReporter::silent()).await;
        assert!(items.is_empty());
        assert_eq!(source.pages_fetched(), vec![1]);
    }

    #[tokio::test]
    async fn test_walks_all_pages_in_order() {
        let source = MockSource::new().total("cn-1", None, 250);
        let collector = PaginatedCollector::new(regions(&["cn-1"]));

        let items = collector.collect(&source, &mut ProgressReporter::silent()).await;
        assert_eq!(source.pages_fetched(), vec![1, 2, 3]);
        assert_eq!(items.len(), 250);
        let expected: Vec<String> = (0..250).map(|i| format!("cn-1/-/{}", i)).collect();
        assert_eq!(items, expected);
    }

    #[tokio::test]
    async fn test_failed_scope_does_not_abort_region() {
        let source = MockSource::new()
            .failing("cn-1", Some("rg-a"))
            .total("cn-1", Some("rg-b"), 2);
        let collector = PaginatedCollector::new(regions(&["cn-1"]))
            .with_scopes(vec![Some("rg-a".into()), Some("rg-b".into())]);

        let items = collector.collect(&source, &mut ProgressReporter::silent()).await;
        assert_eq!(items, vec!["cn-1/rg-b/0", "cn-1/rg-b/1"]);
    }

    #[tokio::test]
    async fn test_region_scope_page_order() {
        let source = MockSource::new()
            .total("cn-1", Some("rg-a"), 1)
            .total("cn-1", Some("rg-b"), 101)
            .total("cn-2", Some("rg-a"), 1)
            .failing("cn-3", Some("rg-a"))
            .total("cn-3", Some("rg-b"), 1);
        let collector = PaginatedCollector::new(regions(&["cn-1", "cn-2", "cn-3"]))
            .with_scopes(vec![Some("rg-a".into()), Some("rg-b".into())]);

        let items = collector.collect(&source, &mut ProgressReporter::silent()).await;
        assert_eq!(items.len(), 1 + 101 + 1 + 1);
        assert_eq!(items[0], "cn-1/rg-a/0");
        assert_eq!(items[1], "cn-1/rg-b/0");
        assert_eq!(items[101], "cn-1/rg-b/100");
        assert_eq!(items[102], "cn-2/rg-a/0");
        assert_eq!(items[103], "cn-3/rg-b/0");
    }

    #[tokio::test]
    async fn test_empty_scopes_means_unfiltered() {
        let source = MockSource::new().total("cn-1", None, 3);
        let collector = PaginatedCollector::new(regions(&["cn-1"])).with_scopes(Vec::new());

        let items = collector.collect(&source, &mut ProgressReporter::silent()).await;
        assert_eq!(items.len(), 3);
    }

    #[tokio::test]
    async fn test_cancellation_stops_at_region_boundary() {
        let token = CancellationToken::new();
        let mut source = MockSource::new()
            .total("cn-1", None, 1)
            .total("cn-2", None, 150)
            .total("cn-3", None, 1);
        source.cancel_on = Some(("cn-2".to_string(), token.clone()));
        let collector =
            PaginatedCollector::new(regions(&["cn-1", "cn-2", "cn-3"])).with_cancel(token);

        let items = collector.collect(&source, &mut ProgressReporter::silent()).await;
        // cn-2 finishes every page once started; cn-3 is never fetched
        assert_eq!(items.len(), 151);
        assert!(source
            .calls
            .lock()
            .unwrap()
            .iter()
            .all(|c| c.region != "cn-3"));
    }

    #[tokio::test]
    async fn test_progress_reported_per_region() {
        let source = MockSource::new()
            .total("cn-1", None, 0)
            .total("cn-2", None, 2);
        let collector = PaginatedCollector::new(regions(&["cn-1", "cn-2"]));
        let mut progress = ProgressReporter::new(Vec::new());

        collector.collect(&source, &mut progress).await;
        let out = String::from_utf8(progress.into_inner()).unwrap();
        assert_eq!(out, "\r[cn-1] 0 found.\r[cn-2] 2 found.\n");
    }

    #[tokio::test]
    async fn test_scope_pages_is_not_restartable() {
        let source = MockSource::new().failing("cn-1", None);
        let mut pages = ScopePages::new(&source, "cn-1", None);

        assert!(matches!(pages.next_batch().await, Some(Err(_))));
        assert!(pages.next_batch().await.is_none());
        assert!(pages.next_batch().await.is_none());
        assert_eq!(source.pages_fetched(), vec![1]);
    }

    #[tokio::test]
    async fn test_drain_scope() {
        let source = MockSource::new().total("global", None, 150);
        let items = drain_scope(&source, "global").await.unwrap();
        assert_eq!(items.len(), 150);
        assert_eq!(source.pages_fetched(), vec![1, 2]);

        let denied = MockSource::new().failing("global", None);
        assert!(drain_scope(&denied, "global").await.is_err());
    }
}
