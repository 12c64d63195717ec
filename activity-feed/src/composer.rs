use crate::buffer::{until_cancelled, ChunkBuffer};
use crate::config::FeedConfig;
use crate::merge::MergeEngine;
use crate::sources::PgContentSource;
use crate::traits::ContentSource;
use crate::types::{FeedError, FeedFilter, MergedPage, Pagination, Result, SourceKind};
use futures::future::try_join_all;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info};

/// Builds globally time-ordered, paginated pages over several content sources.
///
/// Holds no per-request state: every call to [`FeedComposer::get_feed`]
/// builds its own buffers and merge engine, so one composer can serve
/// concurrent requests.
pub struct FeedComposer {
    sources: Vec<Arc<dyn ContentSource>>,
    config: FeedConfig,
}

impl FeedComposer {
    pub fn new(config: FeedConfig) -> Self {
        Self {
            sources: Vec::new(),
            config,
        }
    }

    /// Reviews and complaints backed by Postgres, reviews first.
    pub fn platform(pool: PgPool, config: FeedConfig) -> Self {
        Self::new(config)
            .with_source(Arc::new(PgContentSource::reviews(pool.clone())))
            .with_source(Arc::new(PgContentSource::complaints(pool)))
    }

    /// Register a source. Earlier sources win exact timestamp ties.
    pub fn with_source(mut self, source: Arc<dyn ContentSource>) -> Self {
        self.add_source(source);
        self
    }

    pub fn add_source(&mut self, source: Arc<dyn ContentSource>) {
        info!("Adding source to feed composer: {}", source.kind());
        self.sources.push(source);
    }

    pub fn source_kinds(&self) -> Vec<SourceKind> {
        self.sources.iter().map(|source| source.kind()).collect()
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    pub async fn get_feed(&self, page: u32, limit: u32, filter: &FeedFilter) -> Result<MergedPage> {
        let (_sender, cancel) = watch::channel(false);
        self.get_feed_with_cancel(page, limit, filter, cancel).await
    }

    /// Same as [`FeedComposer::get_feed`], aborting with [`FeedError::Cancelled`]
    /// as soon as `cancel` turns `true`.
    pub async fn get_feed_with_cancel(
        &self,
        page: u32,
        limit: u32,
        filter: &FeedFilter,
        cancel: watch::Receiver<bool>,
    ) -> Result<MergedPage> {
        if page < 1 {
            return Err(FeedError::InvalidArgument(format!("page must be >= 1, got {}", page)));
        }
        if limit < 1 {
            return Err(FeedError::InvalidArgument(format!("limit must be >= 1, got {}", limit)));
        }

        let result = self.compose(page, limit, filter, cancel).await;
        match &result {
            Err(FeedError::Cancelled) => {
                info!(page, limit, "Feed request cancelled");
            }
            Err(e) => {
                error!(
                    page,
                    limit,
                    category = ?filter.category,
                    "Failed to compose feed page: {}",
                    e
                );
            }
            Ok(_) => {}
        }
        result
    }

    async fn compose(
        &self,
        page: u32,
        limit: u32,
        filter: &FeedFilter,
        cancel: watch::Receiver<bool>,
    ) -> Result<MergedPage> {
        let counts = self.count_sources(filter, &cancel).await?;
        let total: u64 = counts.iter().sum();
        if total == 0 {
            debug!(page, limit, "No items match the filter");
            return Ok(MergedPage::empty(page, limit));
        }

        let pagination = Pagination {
            page,
            limit,
            total,
            total_pages: total.div_ceil(limit as u64),
        };
        let skip = (page as u64 - 1) * limit as u64;
        if skip >= total {
            debug!(page, limit, total, "Page lies past the end of the feed");
            return Ok(MergedPage {
                items: Vec::new(),
                pagination,
            });
        }

        let mut engine = self.open_merge(filter, &counts, &cancel);
        if self.config.prefetch {
            engine.prime().await?;
        }

        let skipped = engine.skip(skip).await?;
        let items = engine.take(limit as usize).await?;

        debug!(
            page,
            limit,
            total,
            skipped,
            returned = items.len(),
            "Composed feed page"
        );
        Ok(MergedPage { items, pagination })
    }

    /// Count every source concurrently under `filter`, in registration order.
    pub async fn count_sources(
        &self,
        filter: &FeedFilter,
        cancel: &watch::Receiver<bool>,
    ) -> Result<Vec<u64>> {
        try_join_all(self.sources.iter().map(|source| {
            let mut cancel = cancel.clone();
            async move {
                let kind = source.kind();
                until_cancelled(&mut cancel, source.count(filter))
                    .await?
                    .map_err(|e| FeedError::source_unavailable(kind, e))
            }
        }))
        .await
    }

    /// Fresh merge engine over all sources, each capped at its count.
    pub fn open_merge(
        &self,
        filter: &FeedFilter,
        counts: &[u64],
        cancel: &watch::Receiver<bool>,
    ) -> MergeEngine {
        let buffers = self
            .sources
            .iter()
            .zip(counts)
            .enumerate()
            .map(|(priority, (source, &count))| {
                ChunkBuffer::new(
                    Arc::clone(source),
                    filter.clone(),
                    priority,
                    count,
                    self.config.chunk_size,
                    cancel.clone(),
                )
            })
            .collect();
        MergeEngine::new(buffers)
    }
}
