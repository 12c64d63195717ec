use serde::{Deserialize, Serialize};
// Use the interfaces crate for the shared item shapes
pub use interfaces::defs::{
    AuthorSummary, CompanySummary, Complaint, ComplaintStatus, ContentItem, Review, SourceKind,
};
pub use interfaces::defs::{FeedResponse, Pagination};

/// Predicate applied identically by `count` and `fetch_chunk` on a source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeedFilter {
    pub category: Option<String>,
}

impl FeedFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
        }
    }

    pub fn matches(&self, item: &ContentItem) -> bool {
        match &self.category {
            Some(category) => item.category() == category,
            None => true,
        }
    }
}

/// A batch of items from one source plus the position after it.
#[derive(Debug, Clone, Default)]
pub struct Chunk {
    pub items: Vec<ContentItem>,
    pub cursor: u64,
}

impl Chunk {
    pub fn new(items: Vec<ContentItem>, start: u64) -> Self {
        let cursor = start + items.len() as u64;
        Self { items, cursor }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Result of one feed request. Built fresh per call and never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedPage {
    pub items: Vec<ContentItem>,
    pub pagination: Pagination,
}

impl MergedPage {
    pub fn empty(page: u32, limit: u32) -> Self {
        Self {
            items: Vec::new(),
            pagination: Pagination {
                page,
                limit,
                total: 0,
                total_pages: 0,
            },
        }
    }

    pub fn into_response(self) -> FeedResponse {
        FeedResponse {
            items: self.items,
            pagination: self.pagination,
        }
    }
}

impl From<MergedPage> for FeedResponse {
    fn from(page: MergedPage) -> Self {
        page.into_response()
    }
}

/// Failure raised by a content source adapter.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Source unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed row: {0}")]
    Malformed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("Source {kind} unavailable: {source}")]
    SourceUnavailable {
        kind: SourceKind,
        #[source]
        source: SourceError,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Feed request cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl FeedError {
    pub fn source_unavailable(kind: SourceKind, source: SourceError) -> Self {
        FeedError::SourceUnavailable { kind, source }
    }
}

pub type Result<T> = std::result::Result<T, FeedError>;
