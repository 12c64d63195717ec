#![allow(dead_code)]

use activity_feed::{
    AuthorSummary, Complaint, ComplaintStatus, ContentItem, FeedComposer, FeedConfig, MemorySource,
    Review, SourceKind,
};
use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Test instant `secs` seconds after a fixed epoch.
pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

pub fn author() -> AuthorSummary {
    AuthorSummary {
        id: Uuid::from_u128(0xfeed),
        username: "tester".to_string(),
        avatar_url: None,
    }
}

pub fn review(id: u128, secs: i64, category: &str) -> ContentItem {
    ContentItem::Review(Review {
        id: Uuid::from_u128(id),
        created_at: at(secs),
        title: format!("review {}", id),
        content: "content".to_string(),
        rating: 4,
        category: category.to_string(),
        author: author(),
        company: None,
        comment_count: 0,
        like_count: 0,
    })
}

pub fn complaint(id: u128, secs: i64, category: &str) -> ContentItem {
    ContentItem::Complaint(Complaint {
        id: Uuid::from_u128(id),
        created_at: at(secs),
        title: format!("complaint {}", id),
        content: "content".to_string(),
        category: category.to_string(),
        status: ComplaintStatus::Open,
        author: author(),
        company: None,
        comment_count: 0,
        upvote_count: 0,
    })
}

pub fn config(chunk_size: usize) -> FeedConfig {
    FeedConfig {
        chunk_size,
        ..FeedConfig::default()
    }
}

/// Composer over the two platform sources, reviews registered first.
pub fn composer_with(
    reviews: Arc<MemorySource>,
    complaints: Arc<MemorySource>,
    config: FeedConfig,
) -> FeedComposer {
    FeedComposer::new(config)
        .with_source(reviews)
        .with_source(complaints)
}

pub fn composer(
    reviews: Vec<ContentItem>,
    complaints: Vec<ContentItem>,
    chunk_size: usize,
) -> FeedComposer {
    composer_with(
        Arc::new(MemorySource::new(SourceKind::Review, reviews)),
        Arc::new(MemorySource::new(SourceKind::Complaint, complaints)),
        config(chunk_size),
    )
}

pub fn ids(items: &[ContentItem]) -> Vec<u128> {
    items.iter().map(|item| item.id().as_u128()).collect()
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}
