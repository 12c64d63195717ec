use crate::buffer::ChunkBuffer;
use crate::types::{ContentItem, Result};
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use std::cmp::Ordering;
use tracing::debug;
use uuid::Uuid;

/// Total order used to pick the next item of the merged feed.
///
/// Newer items come first. Equal timestamps are ordered by source priority
/// (registration order of the source), then by id ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeKey {
    pub created_at: DateTime<Utc>,
    pub priority: usize,
    pub id: Uuid,
}

impl MergeKey {
    pub fn of(item: &ContentItem, priority: usize) -> Self {
        Self {
            created_at: item.created_at(),
            priority,
            id: item.id(),
        }
    }
}

impl Ord for MergeKey {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .created_at
            .cmp(&self.created_at)
            .then_with(|| self.priority.cmp(&other.priority))
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for MergeKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Single-pass k-way merge over one chunk buffer per source.
///
/// Each instance serves exactly one feed request. Steps are sequential since
/// the choice at step N depends on what step N-1 consumed; the only awaits
/// are chunk refills.
pub struct MergeEngine {
    buffers: Vec<ChunkBuffer>,
    yielded: u64,
}

impl MergeEngine {
    pub fn new(buffers: Vec<ChunkBuffer>) -> Self {
        Self { buffers, yielded: 0 }
    }

    /// Items produced so far.
    pub fn yielded(&self) -> u64 {
        self.yielded
    }

    pub fn buffers(&self) -> &[ChunkBuffer] {
        &self.buffers
    }

    /// Load the first chunk of every source concurrently.
    pub async fn prime(&mut self) -> Result<()> {
        try_join_all(self.buffers.iter_mut().map(|buffer| buffer.fill())).await?;
        Ok(())
    }

    /// Produce the next item of the merged sequence, or `None` once every
    /// source is exhausted.
    pub async fn next_item(&mut self) -> Result<Option<ContentItem>> {
        let mut best: Option<(usize, MergeKey)> = None;

        for (idx, buffer) in self.buffers.iter_mut().enumerate() {
            if buffer.is_exhausted() {
                continue;
            }
            let priority = buffer.priority();
            let key = match buffer.peek().await? {
                Some(item) => MergeKey::of(item, priority),
                None => continue,
            };
            let better = match &best {
                Some((_, current)) => key < *current,
                None => true,
            };
            if better {
                best = Some((idx, key));
            }
        }

        let Some((idx, _)) = best else {
            return Ok(None);
        };
        let item = self.buffers[idx].pop();
        if item.is_some() {
            self.yielded += 1;
        }
        Ok(item)
    }

    /// Discard up to `n` items, returning how many were actually skipped.
    pub async fn skip(&mut self, n: u64) -> Result<u64> {
        let mut skipped = 0;
        while skipped < n {
            if self.next_item().await?.is_none() {
                break;
            }
            skipped += 1;
        }
        Ok(skipped)
    }

    /// Collect up to `n` items. Fewer are returned once the sources run dry.
    pub async fn take(&mut self, n: usize) -> Result<Vec<ContentItem>> {
        let mut items = Vec::with_capacity(n.min(1024));
        while items.len() < n {
            match self.next_item().await? {
                Some(item) => items.push(item),
                None => break,
            }
        }
        Ok(items)
    }

    /// Collect everything left in the merged sequence.
    pub async fn drain(&mut self) -> Result<Vec<ContentItem>> {
        let mut items = Vec::new();
        while let Some(item) = self.next_item().await? {
            items.push(item);
        }
        debug!(yielded = self.yielded, "Merge drained");
        Ok(items)
    }
}
