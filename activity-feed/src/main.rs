use activity_feed::sources::postgres::setup_schema;
use activity_feed::{
    AuthorSummary, CompanySummary, Complaint, ComplaintStatus, ContentItem, FeedComposer,
    FeedConfig, FeedFilter, FeedResponse, MemorySource, Review, SourceKind,
};
use anyhow::Context;
use chrono::{Duration, TimeZone, Utc};
use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Print one page of the unified review/complaint activity feed as JSON.
#[derive(Debug, Parser)]
#[command(name = "activity-feed", version)]
struct Args {
    #[arg(long, default_value_t = 1)]
    page: i64,

    #[arg(long, default_value_t = 20)]
    limit: i64,

    /// Only include items in this category
    #[arg(long)]
    category: Option<String>,

    #[arg(long)]
    database_url: Option<String>,

    #[arg(long)]
    chunk_size: Option<usize>,

    /// Create the feed tables before querying
    #[arg(long)]
    setup_schema: bool,

    /// Serve from a built-in sample dataset instead of the database
    #[arg(long)]
    demo: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = FeedConfig::from_env()?;
    if let Some(url) = args.database_url.clone() {
        config.database_url = Some(url);
    }
    if let Some(chunk_size) = args.chunk_size {
        config.chunk_size = chunk_size;
    }
    config.validate()?;

    let composer = if args.demo {
        info!("Serving feed from the sample dataset");
        demo_composer(config.clone())
    } else {
        let url = config
            .database_url
            .clone()
            .context("DATABASE_URL is not set; pass --database-url or use --demo")?;
        let pool = PgPoolOptions::new()
            .max_connections(4)
            .connect(&url)
            .await
            .context("Failed to connect to database")?;
        info!("Connected to database");
        if args.setup_schema {
            setup_schema(&pool).await?;
        }
        FeedComposer::platform(pool, config.clone())
    };

    let (page, limit) = config.clamp(args.page, args.limit);
    if i64::from(page) != args.page || i64::from(limit) != args.limit {
        warn!(page, limit, "Clamped request parameters");
    }
    let filter = FeedFilter {
        category: args.category,
    };

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = cancel_tx.send(true);
        }
    });

    let merged = composer.get_feed_with_cancel(page, limit, &filter, cancel_rx).await?;
    info!(
        total = merged.pagination.total,
        total_pages = merged.pagination.total_pages,
        returned = merged.items.len(),
        "Feed page ready"
    );

    let response: FeedResponse = merged.into();
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn demo_composer(config: FeedConfig) -> FeedComposer {
    let base = Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).single().unwrap_or_else(Utc::now);
    let author = AuthorSummary {
        id: Uuid::from_u128(0xa1),
        username: "demo".to_string(),
        avatar_url: None,
    };
    let company = CompanySummary {
        id: Uuid::from_u128(0xc1),
        name: "Northwind Traders".to_string(),
        slug: "northwind".to_string(),
    };
    let categories = ["shipping", "support", "billing"];

    let reviews = (0..12u32)
        .map(|n| {
            ContentItem::Review(Review {
                id: Uuid::from_u128(0x1000 + n as u128),
                created_at: base - Duration::minutes(7 * n as i64),
                title: format!("Review #{}", n + 1),
                content: "Sample review".to_string(),
                rating: (n % 5 + 1) as u8,
                category: categories[n as usize % categories.len()].to_string(),
                author: author.clone(),
                company: Some(company.clone()),
                comment_count: n,
                like_count: n * 2,
            })
        })
        .collect();

    let complaints = (0..9u32)
        .map(|n| {
            ContentItem::Complaint(Complaint {
                id: Uuid::from_u128(0x2000 + n as u128),
                created_at: base - Duration::minutes(11 * n as i64),
                title: format!("Complaint #{}", n + 1),
                content: "Sample complaint".to_string(),
                category: categories[(n as usize + 1) % categories.len()].to_string(),
                status: if n % 3 == 0 { ComplaintStatus::Resolved } else { ComplaintStatus::Open },
                author: author.clone(),
                company: Some(company.clone()),
                comment_count: n,
                upvote_count: n + 1,
            })
        })
        .collect();

    FeedComposer::new(config)
        .with_source(Arc::new(MemorySource::new(SourceKind::Review, reviews)))
        .with_source(Arc::new(MemorySource::new(SourceKind::Complaint, complaints)))
}
