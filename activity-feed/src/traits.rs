use crate::events::FeedEvent;
use crate::types::{Chunk, FeedFilter, SourceError, SourceKind};
use async_trait::async_trait;

/// A content collection the feed can draw from (reviews, complaints, ...).
///
/// Implementations must order items descending by `created_at` with `id`
/// ascending among equal timestamps, and must apply `filter` the same way in
/// both methods.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Which collection this source reads
    fn kind(&self) -> SourceKind;

    /// Total items matching the filter, independent of pagination
    async fn count(&self, filter: &FeedFilter) -> std::result::Result<u64, SourceError>;

    /// Fetch up to `chunk_size` items starting at `cursor`.
    /// An empty chunk means the source is exhausted for this filter.
    async fn fetch_chunk(
        &self,
        filter: &FeedFilter,
        cursor: u64,
        chunk_size: usize,
    ) -> std::result::Result<Chunk, SourceError>;
}

/// Receiver of real-time notifications emitted by the write path.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: FeedEvent);
}
