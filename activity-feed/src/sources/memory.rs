use crate::traits::ContentSource;
use crate::types::{Chunk, ContentItem, FeedFilter, SourceError, SourceKind};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

/// In-process source over a snapshot of items.
///
/// Items are kept in feed order (newest first, id ascending on ties) unless
/// built with [`MemorySource::unordered`]. Failure injection and call counters
/// make it usable for exercising the merge without a database.
pub struct MemorySource {
    kind: SourceKind,
    items: RwLock<Vec<ContentItem>>,
    sorted: bool,
    fail_fetch_at: Option<usize>,
    fail_count: bool,
    fetch_calls: AtomicUsize,
    count_calls: AtomicUsize,
}

impl MemorySource {
    pub fn new(kind: SourceKind, mut items: Vec<ContentItem>) -> Self {
        sort_feed_order(&mut items);
        Self::build(kind, items, true)
    }

    /// Keep items exactly in the given order, even if it breaks feed order.
    pub fn unordered(kind: SourceKind, items: Vec<ContentItem>) -> Self {
        Self::build(kind, items, false)
    }

    fn build(kind: SourceKind, items: Vec<ContentItem>, sorted: bool) -> Self {
        Self {
            kind,
            items: RwLock::new(items),
            sorted,
            fail_fetch_at: None,
            fail_count: false,
            fetch_calls: AtomicUsize::new(0),
            count_calls: AtomicUsize::new(0),
        }
    }

    /// Fail the `n`-th call to `fetch_chunk` (1-based) and every call after it.
    pub fn failing_fetch_at(mut self, n: usize) -> Self {
        self.fail_fetch_at = Some(n);
        self
    }

    pub fn failing_count(mut self) -> Self {
        self.fail_count = true;
        self
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn count_calls(&self) -> usize {
        self.count_calls.load(Ordering::SeqCst)
    }

    /// Add an item, as a concurrent write would.
    pub async fn insert(&self, item: ContentItem) {
        let mut items = self.items.write().await;
        items.push(item);
        if self.sorted {
            sort_feed_order(&mut items);
        }
    }
}

#[async_trait]
impl ContentSource for MemorySource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn count(&self, filter: &FeedFilter) -> Result<u64, SourceError> {
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_count {
            return Err(SourceError::Unavailable(format!("{} count failed", self.kind)));
        }
        let items = self.items.read().await;
        Ok(items.iter().filter(|item| filter.matches(item)).count() as u64)
    }

    async fn fetch_chunk(
        &self,
        filter: &FeedFilter,
        cursor: u64,
        chunk_size: usize,
    ) -> Result<Chunk, SourceError> {
        let call = self.fetch_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if matches!(self.fail_fetch_at, Some(n) if call >= n) {
            return Err(SourceError::Unavailable(format!("{} fetch {} failed", self.kind, call)));
        }

        let items = self.items.read().await;
        let chunk: Vec<ContentItem> = items
            .iter()
            .filter(|item| filter.matches(item))
            .skip(cursor as usize)
            .take(chunk_size)
            .cloned()
            .collect();

        debug!(kind = %self.kind, cursor, returned = chunk.len(), "Served chunk from memory");
        Ok(Chunk::new(chunk, cursor))
    }
}

/// Newest first, id ascending among equal timestamps.
pub fn sort_feed_order(items: &mut [ContentItem]) {
    items.sort_by(|a, b| {
        b.created_at()
            .cmp(&a.created_at())
            .then_with(|| a.id().cmp(&b.id()))
    });
}
