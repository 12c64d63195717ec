mod common;

use activity_feed::types::*;
use activity_feed::{ChunkBuffer, ContentSource, MemorySource, MergeEngine, MergeKey};
use common::*;
use std::sync::Arc;
use tokio::sync::watch;
use uuid::Uuid;

fn buffer(
    source: Arc<dyn ContentSource>,
    priority: usize,
    cap: u64,
    chunk_size: usize,
    cancel: &watch::Receiver<bool>,
) -> ChunkBuffer {
    ChunkBuffer::new(source, FeedFilter::all(), priority, cap, chunk_size, cancel.clone())
}

#[test]
fn test_merge_key_order() {
    let newer = MergeKey {
        created_at: at(10),
        priority: 1,
        id: Uuid::from_u128(9),
    };
    let older = MergeKey {
        created_at: at(5),
        priority: 0,
        id: Uuid::from_u128(1),
    };
    assert!(newer < older);

    let first_source = MergeKey {
        created_at: at(5),
        priority: 0,
        id: Uuid::from_u128(50),
    };
    let second_source = MergeKey {
        created_at: at(5),
        priority: 1,
        id: Uuid::from_u128(1),
    };
    assert!(first_source < second_source);

    let low_id = MergeKey {
        created_at: at(5),
        priority: 0,
        id: Uuid::from_u128(2),
    };
    assert!(low_id < first_source);
}

#[tokio::test]
async fn test_chunk_buffer_peek_pop_refill() -> Result<()> {
    init_tracing();
    let source = Arc::new(MemorySource::new(
        SourceKind::Review,
        (0..5).map(|n| review(n, 50 - n as i64, "x")).collect(),
    ));
    let (_tx, cancel) = watch::channel(false);
    let mut buf = buffer(source.clone(), 0, 5, 2, &cancel);

    assert_eq!(source.fetch_calls(), 0);
    let first = buf.peek().await?.map(|item| item.id().as_u128());
    assert_eq!(first, Some(0));
    // Peeking again does not consume or refetch
    let again = buf.peek().await?.map(|item| item.id().as_u128());
    assert_eq!(again, Some(0));
    assert_eq!(source.fetch_calls(), 1);

    let mut popped = Vec::new();
    while buf.peek().await?.is_some() {
        popped.push(buf.pop().map(|item| item.id().as_u128()));
    }
    assert_eq!(popped, vec![Some(0), Some(1), Some(2), Some(3), Some(4)]);
    assert!(buf.is_exhausted());
    assert_eq!(buf.cursor(), 5);
    // 2 + 2 + 1, then the cap stops further requests
    assert_eq!(source.fetch_calls(), 3);
    assert_eq!(buf.fetches(), 3);

    assert!(buf.peek().await?.is_none());
    assert_eq!(source.fetch_calls(), 3);
    assert_eq!(buf.fetches(), 3);
    Ok(())
}

#[tokio::test]
async fn test_empty_chunk_marks_source_exhausted() -> Result<()> {
    // Count said 4 but the rows vanished before the fetch
    let source = Arc::new(MemorySource::new(SourceKind::Complaint, vec![complaint(1, 1, "x")]));
    let (_tx, cancel) = watch::channel(false);
    let mut buf = buffer(source.clone(), 0, 4, 10, &cancel);

    assert!(buf.peek().await?.is_some());
    buf.pop();
    assert!(buf.peek().await?.is_none());
    assert!(buf.is_exhausted());
    assert!(buf.peek().await?.is_none());
    assert_eq!(source.fetch_calls(), 2);
    assert_eq!(buf.fetches(), 2);

    // Reading past the stored rows yields an empty chunk
    let past = source.fetch_chunk(&FeedFilter::all(), 1, 10).await.unwrap();
    assert!(past.is_empty());
    assert_eq!(past.cursor, 1);
    Ok(())
}

#[tokio::test]
async fn test_engine_merges_three_sources() -> Result<()> {
    let (_tx, cancel) = watch::channel(false);
    let a: Arc<dyn ContentSource> = Arc::new(MemorySource::new(
        SourceKind::Review,
        vec![review(1, 30, "x"), review(2, 10, "x")],
    ));
    let b: Arc<dyn ContentSource> = Arc::new(MemorySource::new(
        SourceKind::Complaint,
        vec![complaint(3, 20, "x"), complaint(4, 10, "x")],
    ));
    let c: Arc<dyn ContentSource> = Arc::new(MemorySource::new(
        SourceKind::Review,
        vec![review(5, 40, "x"), review(6, 10, "x")],
    ));

    let mut engine = MergeEngine::new(vec![
        buffer(a, 0, 2, 1, &cancel),
        buffer(b, 1, 2, 1, &cancel),
        buffer(c, 2, 2, 1, &cancel),
    ]);
    engine.prime().await?;

    let first = engine.next_item().await?.map(|item| item.id().as_u128());
    assert_eq!(first, Some(5));
    let rest = engine.drain().await?;
    assert_eq!(ids(&rest), vec![1, 3, 2, 4, 6]);
    assert_eq!(engine.yielded(), 6);
    assert!(engine.next_item().await?.is_none());
    assert!(engine.buffers().iter().all(|buf| buf.is_exhausted()));
    Ok(())
}

#[tokio::test]
async fn test_engine_skip_and_take() -> Result<()> {
    let (_tx, cancel) = watch::channel(false);
    let reviews: Arc<dyn ContentSource> = Arc::new(MemorySource::new(
        SourceKind::Review,
        (0..6).map(|n| review(n, 100 - n as i64 * 2, "x")).collect(),
    ));
    let complaints: Arc<dyn ContentSource> = Arc::new(MemorySource::new(
        SourceKind::Complaint,
        (0..6).map(|n| complaint(10 + n, 99 - n as i64 * 2, "x")).collect(),
    ));

    let mut engine = MergeEngine::new(vec![
        buffer(reviews, 0, 6, 4, &cancel),
        buffer(complaints, 1, 6, 4, &cancel),
    ]);
    assert_eq!(engine.skip(3).await?, 3);
    let taken = engine.take(4).await?;
    assert_eq!(ids(&taken), vec![11, 2, 12, 3]);

    assert_eq!(engine.skip(100).await?, 5);
    assert!(engine.take(3).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_engine_without_sources_is_empty() -> Result<()> {
    let mut engine = MergeEngine::new(Vec::new());
    assert!(engine.next_item().await?.is_none());
    assert!(engine.drain().await?.is_empty());
    Ok(())
}
