use crate::types::{FeedError, Result};
use std::env;
use std::str::FromStr;

pub const DEFAULT_CHUNK_SIZE: usize = 20;
pub const DEFAULT_MAX_LIMIT: u32 = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    /// Items requested from a source per physical fetch
    pub chunk_size: usize,
    /// Upper bound callers clamp `limit` to before asking for a page
    pub max_limit: u32,
    /// Fetch the first chunk of every source concurrently before merging
    pub prefetch: bool,
    pub database_url: Option<String>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_limit: DEFAULT_MAX_LIMIT,
            prefetch: true,
            database_url: None,
        }
    }
}

impl FeedConfig {
    /// Load from `DATABASE_URL`, `FEED_CHUNK_SIZE`, `FEED_MAX_LIMIT` and `FEED_PREFETCH`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()) {
            config.database_url = Some(url);
        }
        if let Some(value) = lookup("FEED_CHUNK_SIZE") {
            config.chunk_size = parse_var("FEED_CHUNK_SIZE", &value)?;
        }
        if let Some(value) = lookup("FEED_MAX_LIMIT") {
            config.max_limit = parse_var("FEED_MAX_LIMIT", &value)?;
        }
        if let Some(value) = lookup("FEED_PREFETCH") {
            config.prefetch = parse_bool("FEED_PREFETCH", &value)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(FeedError::Config("chunk_size must be at least 1".to_string()));
        }
        if self.max_limit == 0 {
            return Err(FeedError::Config("max_limit must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Clamp raw request parameters into the range the composer accepts:
    /// `page >= 1` and `1 <= limit <= max_limit`.
    pub fn clamp(&self, page: i64, limit: i64) -> (u32, u32) {
        let page = page.clamp(1, u32::MAX as i64) as u32;
        let limit = limit.clamp(1, self.max_limit as i64) as u32;
        (page, limit)
    }
}

fn parse_var<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| FeedError::Config(format!("{} has invalid value '{}'", key, value)))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(FeedError::Config(format!("{} has invalid value '{}'", key, value))),
    }
}
