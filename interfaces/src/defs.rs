use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Review,
    Complaint,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Review => "review",
            SourceKind::Complaint => "complaint",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorSummary {
    pub id: Uuid,
    pub username: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanySummary {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub content: String,
    pub rating: u8,
    pub category: String,
    pub author: AuthorSummary,
    pub company: Option<CompanySummary>,
    pub comment_count: u32,
    pub like_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplaintStatus {
    Open,
    InProgress,
    Resolved,
    Rejected,
}

impl ComplaintStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplaintStatus::Open => "open",
            ComplaintStatus::InProgress => "in_progress",
            ComplaintStatus::Resolved => "resolved",
            ComplaintStatus::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "open" => Some(ComplaintStatus::Open),
            "in_progress" => Some(ComplaintStatus::InProgress),
            "resolved" => Some(ComplaintStatus::Resolved),
            "rejected" => Some(ComplaintStatus::Rejected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Complaint {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub content: String,
    pub category: String,
    pub status: ComplaintStatus,
    pub author: AuthorSummary,
    pub company: Option<CompanySummary>,
    pub comment_count: u32,
    pub upvote_count: u32,
}

/// One entry of the activity feed, tagged with the collection it came from.
///
/// Serializes as a flat object carrying `sourceKind` next to the variant's own
/// fields, which is the item shape handed to feed clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "sourceKind", rename_all = "lowercase")]
pub enum ContentItem {
    Review(Review),
    Complaint(Complaint),
}

impl ContentItem {
    pub fn id(&self) -> Uuid {
        match self {
            ContentItem::Review(review) => review.id,
            ContentItem::Complaint(complaint) => complaint.id,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            ContentItem::Review(review) => review.created_at,
            ContentItem::Complaint(complaint) => complaint.created_at,
        }
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            ContentItem::Review(_) => SourceKind::Review,
            ContentItem::Complaint(_) => SourceKind::Complaint,
        }
    }

    pub fn category(&self) -> &str {
        match self {
            ContentItem::Review(review) => &review.category,
            ContentItem::Complaint(complaint) => &complaint.category,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedResponse {
    pub items: Vec<ContentItem>,
    pub pagination: Pagination,
}

// Wire note:
// These are the shapes the request-handling layer serializes back to feed
// clients. Field order is fixed by declaration order, so serializing the same
// response twice yields identical bytes.
