use crate::traits::ContentSource;
use crate::types::{ContentItem, FeedError, FeedFilter, Result, SourceKind};
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Lazy window over one source: items fetched but not yet consumed by the merge.
///
/// The buffer is capped at the source's count taken at request time, so it
/// never asks for more than `count - cursor` items and always terminates even
/// if the underlying collection keeps growing.
pub struct ChunkBuffer {
    source: Arc<dyn ContentSource>,
    filter: FeedFilter,
    kind: SourceKind,
    priority: usize,
    chunk_size: usize,
    cursor: u64,
    cap: u64,
    pending: VecDeque<ContentItem>,
    exhausted: bool,
    last_seen: Option<DateTime<Utc>>,
    fetches: usize,
    cancel: watch::Receiver<bool>,
}

impl ChunkBuffer {
    pub fn new(
        source: Arc<dyn ContentSource>,
        filter: FeedFilter,
        priority: usize,
        cap: u64,
        chunk_size: usize,
        cancel: watch::Receiver<bool>,
    ) -> Self {
        let kind = source.kind();
        Self {
            source,
            filter,
            kind,
            priority,
            chunk_size: chunk_size.max(1),
            cursor: 0,
            cap,
            pending: VecDeque::new(),
            exhausted: cap == 0,
            last_seen: None,
            fetches: 0,
            cancel,
        }
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    /// Position in the merge's source order; lower wins timestamp ties.
    pub fn priority(&self) -> usize {
        self.priority
    }

    /// Items of this source fetched so far.
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Physical fetches issued against the source.
    pub fn fetches(&self) -> usize {
        self.fetches
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted && self.pending.is_empty()
    }

    /// Next unconsumed item, refilling from the source if the window is empty.
    pub async fn peek(&mut self) -> Result<Option<&ContentItem>> {
        if self.pending.is_empty() {
            self.fill().await?;
        }
        Ok(self.pending.front())
    }

    /// Remove the item last returned by `peek`.
    pub fn pop(&mut self) -> Option<ContentItem> {
        self.pending.pop_front()
    }

    /// Fetch the next chunk if the window is empty and the source is not exhausted.
    pub async fn fill(&mut self) -> Result<()> {
        if self.exhausted || !self.pending.is_empty() {
            return Ok(());
        }

        let remaining = self.cap.saturating_sub(self.cursor);
        if remaining == 0 {
            debug!(
                kind = %self.kind,
                cursor = self.cursor,
                "Source reached its request-time count"
            );
            self.exhausted = true;
            return Ok(());
        }

        let want = (self.chunk_size as u64).min(remaining) as usize;
        let kind = self.kind;
        let cursor = self.cursor;
        debug!(kind = %kind, cursor, chunk_size = want, "Refilling chunk buffer");

        let source = Arc::clone(&self.source);
        let fetch = source.fetch_chunk(&self.filter, cursor, want);
        let chunk = until_cancelled(&mut self.cancel, fetch)
            .await?
            .map_err(|e| FeedError::source_unavailable(kind, e))?;
        self.fetches += 1;

        let mut items = chunk.items;
        if items.is_empty() {
            debug!(kind = %kind, cursor, "Source exhausted");
            self.exhausted = true;
            return Ok(());
        }
        if items.len() > want {
            warn!(
                kind = %kind,
                requested = want,
                returned = items.len(),
                "Source returned more items than requested, truncating"
            );
            items.truncate(want);
        }

        let expected = cursor + items.len() as u64;
        if chunk.cursor != expected {
            debug!(
                kind = %kind,
                reported = chunk.cursor,
                expected,
                "Source cursor disagrees with item count"
            );
        }
        self.cursor = expected;

        for item in &items {
            let created_at = item.created_at();
            if let Some(previous) = self.last_seen {
                if created_at > previous {
                    warn!(
                        kind = %kind,
                        id = %item.id(),
                        "Source returned an item newer than the previous one"
                    );
                }
            }
            self.last_seen = Some(created_at);
        }
        self.pending.extend(items);

        Ok(())
    }
}

/// Race `fut` against the cancellation signal.
///
/// A dropped sender means the request can no longer be cancelled.
pub(crate) async fn until_cancelled<F: Future>(
    cancel: &mut watch::Receiver<bool>,
    fut: F,
) -> Result<F::Output> {
    if *cancel.borrow() {
        return Err(FeedError::Cancelled);
    }
    tokio::select! {
        output = fut => Ok(output),
        _ = cancelled(cancel) => Err(FeedError::Cancelled),
    }
}

async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    loop {
        if *cancel.borrow_and_update() {
            return;
        }
        if cancel.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
