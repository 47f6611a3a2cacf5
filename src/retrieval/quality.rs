//! Result-set quality evaluation

use serde::Serialize;
use std::fmt;

use crate::config::ScoringConfig;
use crate::retrieval::SearchResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityLevel {
    Low,
    Medium,
    High,
}

impl QualityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Judges a ranked result set from its top two scores
#[derive(Debug, Clone, Copy)]
pub struct QualityEvaluator {
    high_threshold: f32,
    medium_threshold: f32,
    gap_threshold: f32,
}

impl QualityEvaluator {
    pub fn new(scoring: &ScoringConfig) -> Self {
        Self {
            high_threshold: scoring.high_quality_threshold,
            medium_threshold: scoring.medium_quality_threshold,
            gap_threshold: scoring.quality_gap_threshold,
        }
    }

    /// Quality of `results`, which must be sorted by descending score
    pub fn evaluate(&self, results: &[SearchResult]) -> QualityLevel {
        let scores: Vec<f32> = results.iter().take(2).map(|r| r.score).collect();
        self.evaluate_scores(&scores)
    }

    /// Quality from raw descending scores
    pub fn evaluate_scores(&self, scores: &[f32]) -> QualityLevel {
        let Some(&top) = scores.first() else {
            return QualityLevel::Low;
        };

        // A clear winner is as good as a high absolute score.
        if let Some(&second) = scores.get(1) {
            if top - second > self.gap_threshold {
                return QualityLevel::High;
            }
        }

        if top > self.high_threshold {
            QualityLevel::High
        } else if top > self.medium_threshold {
            QualityLevel::Medium
        } else {
            QualityLevel::Low
        }
    }
}

impl Default for QualityEvaluator {
    fn default() -> Self {
        Self::new(&ScoringConfig::default())
    }
}
