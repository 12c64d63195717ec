use crate::traits::ContentSource;
use crate::types::{
    AuthorSummary, Chunk, CompanySummary, Complaint, ComplaintStatus, ContentItem, FeedFilter,
    Review, SourceError, SourceKind,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::{debug, info};
use uuid::Uuid;

const COUNT_REVIEWS: &str = r#"
    SELECT COUNT(*) FROM reviews
    WHERE ($1::TEXT IS NULL OR category = $1)
"#;

const COUNT_COMPLAINTS: &str = r#"
    SELECT COUNT(*) FROM complaints
    WHERE ($1::TEXT IS NULL OR category = $1)
"#;

const FETCH_REVIEWS: &str = r#"
    SELECT r.id, r.created_at, r.title, r.content, r.rating, r.category,
           r.comment_count, r.like_count,
           u.id AS author_id, u.username AS author_username, u.avatar_url AS author_avatar_url,
           c.id AS company_id, c.name AS company_name, c.slug AS company_slug
    FROM reviews r
    JOIN users u ON u.id = r.author_id
    LEFT JOIN companies c ON c.id = r.company_id
    WHERE ($1::TEXT IS NULL OR r.category = $1)
    ORDER BY r.created_at DESC, r.id ASC
    LIMIT $2 OFFSET $3
"#;

const FETCH_COMPLAINTS: &str = r#"
    SELECT p.id, p.created_at, p.title, p.content, p.category, p.status,
           p.comment_count, p.upvote_count,
           u.id AS author_id, u.username AS author_username, u.avatar_url AS author_avatar_url,
           c.id AS company_id, c.name AS company_name, c.slug AS company_slug
    FROM complaints p
    JOIN users u ON u.id = p.author_id
    LEFT JOIN companies c ON c.id = p.company_id
    WHERE ($1::TEXT IS NULL OR p.category = $1)
    ORDER BY p.created_at DESC, p.id ASC
    LIMIT $2 OFFSET $3
"#;

/// Reviews or complaints read from Postgres over a shared pool.
#[derive(Clone)]
pub struct PgContentSource {
    db: PgPool,
    kind: SourceKind,
}

impl PgContentSource {
    pub fn new(db: PgPool, kind: SourceKind) -> Self {
        Self { db, kind }
    }

    pub fn reviews(db: PgPool) -> Self {
        Self::new(db, SourceKind::Review)
    }

    pub fn complaints(db: PgPool) -> Self {
        Self::new(db, SourceKind::Complaint)
    }

    fn count_sql(&self) -> &'static str {
        match self.kind {
            SourceKind::Review => COUNT_REVIEWS,
            SourceKind::Complaint => COUNT_COMPLAINTS,
        }
    }

    fn fetch_sql(&self) -> &'static str {
        match self.kind {
            SourceKind::Review => FETCH_REVIEWS,
            SourceKind::Complaint => FETCH_COMPLAINTS,
        }
    }

    fn item_from_row(&self, row: &PgRow) -> Result<ContentItem, SourceError> {
        match self.kind {
            SourceKind::Review => review_from_row(row).map(ContentItem::Review),
            SourceKind::Complaint => complaint_from_row(row).map(ContentItem::Complaint),
        }
    }
}

#[async_trait]
impl ContentSource for PgContentSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn count(&self, filter: &FeedFilter) -> Result<u64, SourceError> {
        let count: i64 = sqlx::query_scalar(self.count_sql())
            .bind(filter.category.as_deref())
            .fetch_one(&self.db)
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn fetch_chunk(
        &self,
        filter: &FeedFilter,
        cursor: u64,
        chunk_size: usize,
    ) -> Result<Chunk, SourceError> {
        let rows = sqlx::query(self.fetch_sql())
            .bind(filter.category.as_deref())
            .bind(chunk_size as i64)
            .bind(cursor as i64)
            .fetch_all(&self.db)
            .await?;

        let mut items = Vec::with_capacity(rows.len());
        for row in &rows {
            items.push(self.item_from_row(row)?);
        }

        debug!(kind = %self.kind, cursor, returned = items.len(), "Fetched chunk from database");
        Ok(Chunk::new(items, cursor))
    }
}

fn review_from_row(row: &PgRow) -> Result<Review, SourceError> {
    let rating: i16 = row.try_get("rating")?;
    let rating = u8::try_from(rating)
        .map_err(|_| SourceError::Malformed(format!("review rating out of range: {}", rating)))?;

    Ok(Review {
        id: row.try_get("id")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        rating,
        category: row.try_get("category")?,
        author: author_from_row(row)?,
        company: company_from_row(row)?,
        comment_count: counter(row, "comment_count")?,
        like_count: counter(row, "like_count")?,
    })
}

fn complaint_from_row(row: &PgRow) -> Result<Complaint, SourceError> {
    let status: String = row.try_get("status")?;
    let status = ComplaintStatus::parse(&status)
        .ok_or_else(|| SourceError::Malformed(format!("unknown complaint status: {}", status)))?;

    Ok(Complaint {
        id: row.try_get("id")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        category: row.try_get("category")?,
        status,
        author: author_from_row(row)?,
        company: company_from_row(row)?,
        comment_count: counter(row, "comment_count")?,
        upvote_count: counter(row, "upvote_count")?,
    })
}

fn author_from_row(row: &PgRow) -> Result<AuthorSummary, SourceError> {
    Ok(AuthorSummary {
        id: row.try_get("author_id")?,
        username: row.try_get("author_username")?,
        avatar_url: row.try_get("author_avatar_url")?,
    })
}

fn company_from_row(row: &PgRow) -> Result<Option<CompanySummary>, SourceError> {
    let id: Option<Uuid> = row.try_get("company_id")?;
    match id {
        Some(id) => Ok(Some(CompanySummary {
            id,
            name: row.try_get("company_name")?,
            slug: row.try_get("company_slug")?,
        })),
        None => Ok(None),
    }
}

fn counter(row: &PgRow, column: &str) -> Result<u32, SourceError> {
    let value: i32 = row.try_get(column)?;
    Ok(value.max(0) as u32)
}

/// Create the tables the feed reads from if they are missing.
pub async fn setup_schema(db: &PgPool) -> Result<(), SourceError> {
    let statements = [
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id UUID PRIMARY KEY,
            username TEXT NOT NULL,
            avatar_url TEXT
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS companies (
            id UUID PRIMARY KEY,
            name TEXT NOT NULL,
            slug TEXT NOT NULL UNIQUE
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS reviews (
            id UUID PRIMARY KEY,
            author_id UUID NOT NULL REFERENCES users(id),
            company_id UUID REFERENCES companies(id),
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            rating SMALLINT NOT NULL CHECK (rating BETWEEN 1 AND 5),
            category TEXT NOT NULL,
            comment_count INTEGER NOT NULL DEFAULT 0,
            like_count INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS complaints (
            id UUID PRIMARY KEY,
            author_id UUID NOT NULL REFERENCES users(id),
            company_id UUID REFERENCES companies(id),
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            category TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'open',
            comment_count INTEGER NOT NULL DEFAULT 0,
            upvote_count INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        )
        "#,
        "CREATE INDEX IF NOT EXISTS reviews_feed_idx ON reviews (category, created_at DESC, id)",
        r#"
        CREATE INDEX IF NOT EXISTS complaints_feed_idx
            ON complaints (category, created_at DESC, id)
        "#,
    ];

    for statement in statements {
        sqlx::query(statement).execute(db).await?;
    }

    info!("Feed schema ready");
    Ok(())
}
