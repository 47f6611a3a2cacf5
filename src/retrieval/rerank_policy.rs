//! Decides whether a result set is worth sending to the reranker

use crate::config::Config;
use crate::retrieval::SearchResult;
use crate::text;

/// Queries shorter than this many characters count as simple
const SIMPLE_QUERY_CHARS: usize = 10;

#[derive(Debug, Clone)]
pub struct RerankDecisionPolicy {
    available: bool,
    min_results: usize,
    gap_threshold: f32,
    complex_markers: Vec<String>,
}

impl RerankDecisionPolicy {
    /// # Arguments
    /// * `config` - Source of the thresholds and the complex-syntax markers
    /// * `reranker_available` - A reranker is attached and reports itself enabled
    pub fn new(config: &Config, reranker_available: bool) -> Self {
        Self {
            available: reranker_available && config.retrieval.enable_reranker,
            min_results: config.scoring.min_rerank_results,
            gap_threshold: config.scoring.score_gap_threshold,
            complex_markers: config.lexicon.complex_markers.clone(),
        }
    }

    /// Whether reranking `results` for `query` is worth a model call
    pub fn should_rerank(&self, query: &str, results: &[SearchResult]) -> bool {
        if !self.available {
            return false;
        }

        if results.len() < self.min_results {
            return false;
        }

        if self.is_simple_query(query) {
            return false;
        }

        // A clear leader will not move.
        if let [first, second, ..] = results {
            if first.score - second.score > self.gap_threshold {
                return false;
            }
        }

        true
    }

    /// Short queries and queries without any complex-syntax marker
    fn is_simple_query(&self, query: &str) -> bool {
        if query.chars().count() < SIMPLE_QUERY_CHARS {
            return true;
        }

        !self
            .complex_markers
            .iter()
            .any(|marker| text::contains_term(query, marker))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{Entity, Memo, ScoredEntity};
    use chrono::Utc;

    fn results(scores: &[f32]) -> Vec<SearchResult> {
        scores
            .iter()
            .enumerate()
            .map(|(i, &score)| {
                SearchResult::from_scored(ScoredEntity {
                    entity: Entity::Memo(Memo {
                        id: i as i64,
                        creator_id: 1,
                        content: String::new(),
                        created_at: Utc::now(),
                    }),
                    score,
                })
            })
            .collect()
    }

    const COMPLEX: &str = "如何使用Python和Django构建Web应用";

    #[test]
    fn test_too_few_results() {
        let policy = RerankDecisionPolicy::new(&Config::default(), true);
        assert!(!policy.should_rerank(COMPLEX, &results(&[0.8, 0.79, 0.78])));
    }

    #[test]
    fn test_simple_queries() {
        let policy = RerankDecisionPolicy::new(&Config::default(), true);
        let close = results(&[0.80, 0.79, 0.78, 0.77, 0.76]);

        assert!(!policy.should_rerank("AI", &close));
        assert!(!policy.should_rerank("machine learning basics", &close));
    }

    #[test]
    fn test_clear_leader() {
        let policy = RerankDecisionPolicy::new(&Config::default(), true);
        assert!(!policy.should_rerank(COMPLEX, &results(&[0.9, 0.7, 0.6, 0.5, 0.4])));
    }

    #[test]
    fn test_close_scores_complex_query() {
        let policy = RerankDecisionPolicy::new(&Config::default(), true);
        let close = results(&[0.80, 0.79, 0.78, 0.77, 0.76]);

        assert!(policy.should_rerank(COMPLEX, &close));
        assert!(policy.should_rerank("how do lifetimes and traits interact", &close));
    }

    #[test]
    fn test_unavailable_or_disabled() {
        let close = results(&[0.80, 0.79, 0.78, 0.77, 0.76]);

        let policy = RerankDecisionPolicy::new(&Config::default(), false);
        assert!(!policy.should_rerank(COMPLEX, &close));

        let mut config = Config::default();
        config.retrieval.enable_reranker = false;
        let policy = RerankDecisionPolicy::new(&config, true);
        assert!(!policy.should_rerank(COMPLEX, &close));
    }
}
