//! Collaborator seams
//!
//! The retriever never talks to a database or a model directly. It goes
//! through these traits, which a host application implements over its own
//! storage engine and model runtime.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::temporal::{ScheduleQueryMode, TimeRange};

pub mod memory;

#[cfg(feature = "local-models")]
pub mod local;

/// A free-form note
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memo {
    pub id: i64,
    pub creator_id: i32,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A calendar entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: i64,
    pub creator_id: i32,
    pub title: String,
    pub description: String,
    pub start: DateTime<Utc>,
    /// Open-ended schedules have no end
    pub end: Option<DateTime<Utc>>,
}

impl Schedule {
    /// End instant used for range checks; an open-ended schedule is a point in time
    pub fn effective_end(&self) -> DateTime<Utc> {
        self.end.unwrap_or(self.start)
    }
}

/// Anything the vector index can return
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Entity {
    Memo(Memo),
    Schedule(Schedule),
}

impl Entity {
    pub fn id(&self) -> i64 {
        match self {
            Self::Memo(memo) => memo.id,
            Self::Schedule(schedule) => schedule.id,
        }
    }

    /// Text used for display and reranking
    pub fn content(&self) -> &str {
        match self {
            Self::Memo(memo) => &memo.content,
            Self::Schedule(schedule) => &schedule.title,
        }
    }
}

/// Vector search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredEntity {
    pub entity: Entity,
    pub score: f32,
}

/// Reranker output: position in the submitted document list plus its new score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RerankHit {
    pub index: usize,
    pub score: f32,
}

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    #[error("Provider call failed: {0}")]
    Failed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Schedule listing and vector search over the knowledge base
#[async_trait]
pub trait Storage: Send + Sync {
    /// List a user's schedules, optionally restricted to a time range
    ///
    /// # Arguments
    /// * `creator_id` - Owner of the schedules
    /// * `range` - Time window, or `None` for every schedule
    /// * `mode` - Overlap (`Standard`, `Auto`) or containment (`Strict`) matching
    async fn list_schedules(
        &self,
        creator_id: i32,
        range: Option<&TimeRange>,
        mode: ScheduleQueryMode,
    ) -> Result<Vec<Schedule>, ProviderError>;

    /// Nearest neighbours of `vector` among a user's memos and schedules,
    /// sorted by descending score
    async fn vector_search(
        &self,
        user_id: i32,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredEntity>, ProviderError>;
}

/// Text to vector
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError>;
}

/// Cross-encoder reranking
#[async_trait]
pub trait Reranker: Send + Sync {
    /// Whether the reranker is ready to take calls
    fn is_enabled(&self) -> bool;

    /// Score `documents` against `query`, best first, at most `top_k` hits
    async fn rerank(
        &self,
        query: &str,
        documents: &[String],
        top_k: usize,
    ) -> Result<Vec<RerankHit>, ProviderError>;
}
