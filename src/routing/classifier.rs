//! Rule-based query classifier
//!
//! Rules are checked in order and the first one that applies wins:
//! 1. a time expression routes to schedule listing or time-filtered hybrid search
//! 2. a note keyword routes to note retrieval
//! 3. a question keyword routes to the full pipeline with reranking
//! 4. everything else gets standard hybrid retrieval

use chrono::{DateTime, Utc};

use super::{RouteDecision, Strategy};
use crate::config::{Config, LexiconConfig};
use crate::temporal::{ScheduleQueryMode, TimeExpressionResolver};
use crate::text;

/// Routes queries to retrieval strategies
#[derive(Debug, Clone)]
pub struct QueryClassifier {
    lexicon: LexiconConfig,
    resolver: TimeExpressionResolver,
}

impl QueryClassifier {
    /// Create a classifier from an explicit lexicon
    pub fn new(mut lexicon: LexiconConfig) -> Self {
        // Longer stop words go first so "有什么" is removed before any shorter
        // word it contains.
        lexicon
            .stop_words
            .sort_by_key(|w| std::cmp::Reverse(w.chars().count()));
        lexicon
            .schedule_words
            .sort_by_key(|w| std::cmp::Reverse(w.chars().count()));

        Self {
            lexicon,
            resolver: TimeExpressionResolver::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.lexicon.clone())
    }

    /// Route a query relative to the current instant
    pub fn route(&self, query: &str) -> RouteDecision {
        self.route_at(query, Utc::now())
    }

    /// Route a query relative to `now`
    ///
    /// # Arguments
    /// * `query` - Raw user query
    /// * `now` - Reference instant for relative time expressions
    ///
    /// # Returns
    /// The routing decision; routing never fails
    pub fn route_at(&self, query: &str, now: DateTime<Utc>) -> RouteDecision {
        let trimmed = query.trim();
        let decision = if trimmed.is_empty() {
            RouteDecision::standard()
        } else {
            self.classify(trimmed, now)
        };

        tracing::debug!(
            "Routed query '{}' to {} (confidence {:.2}, semantic '{}')",
            trimmed,
            decision.strategy,
            decision.confidence,
            decision.semantic_query
        );

        decision
    }

    fn classify(&self, query: &str, now: DateTime<Utc>) -> RouteDecision {
        if let Some(resolved) = self.resolver.resolve_at(query, now) {
            let content = self.strip_stop_words(&self.resolver.strip(query));
            let mode = ScheduleQueryMode::from(Some(resolved.source));

            if self.is_schedule_only(&content) {
                return RouteDecision {
                    strategy: Strategy::ScheduleBm25Only,
                    confidence: 0.95,
                    time_range: Some(resolved.range),
                    semantic_query: String::new(),
                    needs_reranker: false,
                    schedule_query_mode: mode,
                };
            }

            return RouteDecision {
                strategy: Strategy::HybridWithTimeFilter,
                confidence: 0.90,
                time_range: Some(resolved.range),
                semantic_query: content,
                needs_reranker: false,
                schedule_query_mode: mode,
            };
        }

        if contains_any(query, &self.lexicon.memo_keywords) {
            let content = self.strip_stop_words(query);
            let tokens = content.split_whitespace().count();
            let proper_nouns = text::count_capitalized_words(&content);

            let (strategy, confidence) = if tokens > 0 && proper_nouns * 2 > tokens {
                (Strategy::HybridBm25Weighted, 0.85)
            } else {
                (Strategy::MemoSemanticOnly, 0.90)
            };

            return RouteDecision {
                strategy,
                confidence,
                time_range: None,
                semantic_query: content,
                needs_reranker: false,
                schedule_query_mode: ScheduleQueryMode::Auto,
            };
        }

        if contains_any(query, &self.lexicon.question_keywords) {
            return RouteDecision {
                strategy: Strategy::FullPipelineWithReranker,
                confidence: 0.70,
                time_range: None,
                semantic_query: query.to_string(),
                needs_reranker: true,
                schedule_query_mode: ScheduleQueryMode::Auto,
            };
        }

        RouteDecision::standard()
    }

    /// Remove stop words and punctuation, keeping the original case
    fn strip_stop_words(&self, query: &str) -> String {
        let mut content = text::strip_punctuation(query);
        for word in &self.lexicon.stop_words {
            content = text::remove_term(&content, word);
        }
        text::collapse_whitespace(&content)
    }

    /// True when nothing but schedule words remain
    fn is_schedule_only(&self, content: &str) -> bool {
        let mut rest = content.to_string();
        for word in &self.lexicon.schedule_words {
            rest = text::remove_term(&rest, word);
        }
        rest.trim().is_empty()
    }
}

impl Default for QueryClassifier {
    fn default() -> Self {
        Self::new(LexiconConfig::default())
    }
}

fn contains_any(query: &str, terms: &[String]) -> bool {
    terms.iter().any(|term| text::contains_term(query, term))
}
