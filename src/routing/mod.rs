//! Query routing
//!
//! Classifies a natural-language query into one of a fixed set of retrieval
//! strategies, extracting the time range and the semantic content on the way.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::temporal::{ScheduleQueryMode, TimeRange};

mod classifier;

pub use classifier::QueryClassifier;

/// Retrieval strategy chosen for a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Time-only query: list schedules in the range
    ScheduleBm25Only,
    /// Note lookup by meaning
    MemoSemanticOnly,
    /// Note lookup dominated by proper nouns
    HybridBm25Weighted,
    /// Content query restricted to a time range
    HybridWithTimeFilter,
    /// Anything else
    HybridStandard,
    /// Open question that benefits from reranking
    FullPipelineWithReranker,
}

impl Strategy {
    pub const ALL: [Strategy; 6] = [
        Strategy::ScheduleBm25Only,
        Strategy::MemoSemanticOnly,
        Strategy::HybridBm25Weighted,
        Strategy::HybridWithTimeFilter,
        Strategy::HybridStandard,
        Strategy::FullPipelineWithReranker,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ScheduleBm25Only => "schedule_bm25_only",
            Self::MemoSemanticOnly => "memo_semantic_only",
            Self::HybridBm25Weighted => "hybrid_bm25_weighted",
            Self::HybridWithTimeFilter => "hybrid_with_time_filter",
            Self::HybridStandard => "hybrid_standard",
            Self::FullPipelineWithReranker => "full_pipeline_with_reranker",
        }
    }

    /// Human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::ScheduleBm25Only => "Schedules only (BM25 + time filter)",
            Self::MemoSemanticOnly => "Notes only (semantic vectors)",
            Self::HybridBm25Weighted => "Hybrid retrieval (BM25 weighted)",
            Self::HybridWithTimeFilter => "Hybrid retrieval (time filtered)",
            Self::HybridStandard => "Standard hybrid retrieval (BM25 + semantic)",
            Self::FullPipelineWithReranker => "Full pipeline (hybrid retrieval + reranker)",
        }
    }

    /// Whether the strategy blends lexical and semantic scores
    pub fn is_hybrid(&self) -> bool {
        matches!(
            self,
            Self::HybridBm25Weighted
                | Self::HybridWithTimeFilter
                | Self::HybridStandard
                | Self::FullPipelineWithReranker
        )
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == s)
            .ok_or_else(|| format!("Unknown strategy: {}", s))
    }
}

/// Outcome of routing a single query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteDecision {
    pub strategy: Strategy,
    /// Confidence in [0, 1]
    pub confidence: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_range: Option<TimeRange>,
    /// Content left after time phrases and stop words are removed
    pub semantic_query: String,
    pub needs_reranker: bool,
    pub schedule_query_mode: ScheduleQueryMode,
}

impl RouteDecision {
    /// The fallback decision: standard hybrid retrieval with no time range
    pub fn standard() -> Self {
        Self {
            strategy: Strategy::HybridStandard,
            confidence: 0.80,
            time_range: None,
            semantic_query: String::new(),
            needs_reranker: false,
            schedule_query_mode: ScheduleQueryMode::Auto,
        }
    }
}
