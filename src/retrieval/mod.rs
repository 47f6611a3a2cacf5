//! Adaptive retrieval
//!
//! Executes the strategy chosen by the router: schedule listing, semantic note
//! search with optional expansion, weighted hybrid search, or the full
//! pipeline with cross-encoder reranking.

mod adaptive;
mod merge;
mod quality;
mod rerank_policy;

pub use adaptive::AdaptiveRetriever;
pub use merge::merge_results;
pub use quality::{QualityEvaluator, QualityLevel};
pub use rerank_policy::RerankDecisionPolicy;

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::config::Config;
use crate::providers::{Entity, ProviderError, Schedule, ScoredEntity};
use crate::routing::{RouteDecision, Strategy};
use crate::temporal::{ScheduleQueryMode, TimeRange, TimeRangeError};

/// Collaborator call a failure is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Embedding,
    VectorSearch,
    ScheduleList,
    Rerank,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Embedding => "embedding",
            Self::VectorSearch => "vector-search",
            Self::ScheduleList => "schedule-list",
            Self::Rerank => "rerank",
        })
    }
}

#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("Query too long: {length} characters (max {max})")]
    QueryTooLong { length: usize, max: usize },

    #[error("Invalid time range: {0}")]
    InvalidTimeRange(#[from] TimeRangeError),

    #[error("{stage} failed: {source}")]
    Provider {
        stage: Stage,
        #[source]
        source: ProviderError,
    },

    #[error("{stage} timed out after {timeout_ms}ms")]
    Timeout { stage: Stage, timeout_ms: u64 },

    #[error("{stage} cancelled")]
    Cancelled { stage: Stage },
}

impl RetrievalError {
    /// Stage the error happened in, if it came from a collaborator call
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Provider { stage, .. } | Self::Timeout { stage, .. } | Self::Cancelled { stage } => {
                Some(*stage)
            }
            Self::QueryTooLong { .. } | Self::InvalidTimeRange(_) => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultKind {
    Memo,
    Schedule,
}

/// One ranked retrieval result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub id: i64,
    pub kind: ResultKind,
    pub score: f32,
    /// Memo content or schedule title
    pub content: String,
    /// The backing memo or schedule
    pub entity: Entity,
}

impl SearchResult {
    pub(crate) fn from_scored(hit: ScoredEntity) -> Self {
        let kind = match &hit.entity {
            Entity::Memo(_) => ResultKind::Memo,
            Entity::Schedule(_) => ResultKind::Schedule,
        };
        Self {
            id: hit.entity.id(),
            kind,
            score: hit.score,
            content: hit.entity.content().to_string(),
            entity: hit.entity,
        }
    }

    pub(crate) fn from_schedule(schedule: Schedule, score: f32) -> Self {
        Self {
            id: schedule.id,
            kind: ResultKind::Schedule,
            score,
            content: schedule.title.clone(),
            entity: Entity::Schedule(schedule),
        }
    }

    /// Schedule start, for schedule results
    pub fn schedule_start(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        match &self.entity {
            Entity::Schedule(schedule) => Some(schedule.start),
            Entity::Memo(_) => None,
        }
    }
}

/// Everything the retriever needs to execute one request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalOptions {
    pub query: String,
    pub user_id: i32,
    pub strategy: Strategy,
    pub time_range: Option<TimeRange>,
    pub min_score: f32,
    /// 0 means the configured maximum
    pub limit: usize,
    pub schedule_query_mode: ScheduleQueryMode,
    pub request_id: String,
}

impl RetrievalOptions {
    /// Build options for a routed query
    ///
    /// # Arguments
    /// * `decision` - Router output
    /// * `original_query` - Text the decision was made for; used when the
    ///   decision carries no semantic query
    /// * `user_id` - Owner of the data to search
    /// * `config` - Source of the default limit and minimum score
    pub fn from_decision(
        decision: &RouteDecision,
        original_query: &str,
        user_id: i32,
        config: &Config,
    ) -> Self {
        let query = if decision.semantic_query.is_empty() {
            original_query.trim().to_string()
        } else {
            decision.semantic_query.clone()
        };

        Self {
            query,
            user_id,
            strategy: decision.strategy,
            time_range: decision.time_range.clone(),
            min_score: config.query_limits.min_score,
            limit: config.query_limits.default_limit,
            schedule_query_mode: decision.schedule_query_mode,
            request_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_from_decision() {
        let config = Config::default();
        let mut decision = RouteDecision::standard();

        let options = RetrievalOptions::from_decision(&decision, "  rust traits ", 7, &config);
        assert_eq!(options.query, "rust traits");
        assert_eq!(options.user_id, 7);
        assert_eq!(options.limit, 10);
        assert_eq!(options.min_score, 0.5);
        assert_eq!(options.request_id.len(), 36);

        decision.semantic_query = "traits".to_string();
        let options = RetrievalOptions::from_decision(&decision, "rust traits", 7, &config);
        assert_eq!(options.query, "traits");
    }

    #[test]
    fn test_request_ids_are_unique() {
        let config = Config::default();
        let decision = RouteDecision::standard();
        let a = RetrievalOptions::from_decision(&decision, "q", 1, &config);
        let b = RetrievalOptions::from_decision(&decision, "q", 1, &config);
        assert_ne!(a.request_id, b.request_id);
    }

    #[test]
    fn test_error_stage() {
        let err = RetrievalError::Timeout {
            stage: Stage::Rerank,
            timeout_ms: 50,
        };
        assert_eq!(err.stage(), Some(Stage::Rerank));
        assert_eq!(err.to_string(), "rerank timed out after 50ms");

        let err = RetrievalError::QueryTooLong {
            length: 2000,
            max: 1000,
        };
        assert_eq!(err.stage(), None);
    }
}
