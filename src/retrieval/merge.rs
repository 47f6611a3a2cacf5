//! Result merging and deduplication by ID

use ahash::AHashSet;
use std::cmp::Ordering;

use crate::retrieval::SearchResult;

/// Merge two result lists
///
/// # Arguments
/// * `first` - Results that win on duplicate IDs
/// * `second` - Additional results
/// * `top_k` - Maximum results to keep; 0 keeps everything
///
/// # Returns
/// Results deduplicated by ID (first occurrence kept), sorted by descending
/// score with ties in their original order
pub fn merge_results(
    first: Vec<SearchResult>,
    second: Vec<SearchResult>,
    top_k: usize,
) -> Vec<SearchResult> {
    let mut seen: AHashSet<i64> = AHashSet::new();

    let mut merged: Vec<SearchResult> = first
        .into_iter()
        .chain(second)
        .filter(|result| seen.insert(result.id))
        .collect();

    // Vec::sort_by is stable
    merged.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

    if top_k > 0 {
        merged.truncate(top_k);
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{Entity, Memo, ScoredEntity};
    use chrono::Utc;

    fn result(id: i64, score: f32) -> SearchResult {
        SearchResult::from_scored(ScoredEntity {
            entity: Entity::Memo(Memo {
                id,
                creator_id: 1,
                content: format!("memo {}", id),
                created_at: Utc::now(),
            }),
            score,
        })
    }

    fn ids(results: &[SearchResult]) -> Vec<i64> {
        results.iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_merge_dedupes_and_sorts() {
        let first = vec![result(1, 0.9), result(2, 0.7), result(3, 0.5)];
        let second = vec![result(2, 0.8), result(4, 0.85), result(5, 0.6)];

        let merged = merge_results(first, second, 10);

        assert_eq!(merged.len(), 5);
        assert_eq!(ids(&merged), vec![1, 4, 2, 5, 3]);
        assert!(merged.windows(2).all(|w| w[0].score >= w[1].score));

        let entity_two = merged.iter().find(|r| r.id == 2).unwrap();
        assert_eq!(entity_two.score, 0.7);
    }

    #[test]
    fn test_merge_keeps_first_pass_score_for_duplicates() {
        let first = vec![result(1, 0.9), result(2, 0.7), result(3, 0.5)];
        let second = vec![result(2, 0.8), result(4, 0.6), result(5, 0.4)];

        let merged = merge_results(first, second, 10);

        assert_eq!(ids(&merged), vec![1, 2, 4, 3, 5]);
        assert_eq!(merged[1].score, 0.7);
    }

    #[test]
    fn test_merge_truncates() {
        let first = vec![result(1, 0.9), result(2, 0.7)];
        let second = vec![result(3, 0.8)];

        assert_eq!(ids(&merge_results(first.clone(), second.clone(), 2)), vec![1, 3]);
        assert_eq!(merge_results(first, second, 0).len(), 3);
    }

    #[test]
    fn test_merge_ties_keep_input_order() {
        let first = vec![result(1, 0.5), result(2, 0.5)];
        let second = vec![result(3, 0.5)];

        assert_eq!(ids(&merge_results(first, second, 0)), vec![1, 2, 3]);
    }

    #[test]
    fn test_merge_empty() {
        assert!(merge_results(Vec::new(), Vec::new(), 5).is_empty());
    }
}
