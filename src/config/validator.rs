use crate::config::{Config, SCHEMA_VERSION};
use crate::error::{RecallError, Result, ValidationError};

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration
    ///
    /// Every violation is collected, so a single call reports all bad keys.
    pub fn validate(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        Self::validate_schema_version(config, &mut errors);
        Self::validate_time_range(config, &mut errors);
        Self::validate_query_limits(config, &mut errors);
        Self::validate_retrieval(config, &mut errors);
        Self::validate_scoring(config, &mut errors);
        Self::validate_lexicon(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(RecallError::ConfigValidation { errors })
        }
    }

    fn validate_schema_version(config: &Config, errors: &mut Vec<ValidationError>) {
        let version = &config.meta.schema_version;
        if version != SCHEMA_VERSION {
            errors.push(ValidationError::new(
                "_meta.schema_version",
                format!("Unsupported schema version: {}", version),
            ));
        }
    }

    fn validate_time_range(config: &Config, errors: &mut Vec<ValidationError>) {
        let limits = &config.time_range;

        if limits.max_future_days > 365 {
            errors.push(ValidationError::new(
                "time_range.max_future_days",
                format!(
                    "Must be between 0 and 365, got {}",
                    limits.max_future_days
                ),
            ));
        }

        if !(1..=366).contains(&limits.max_range_days) {
            errors.push(ValidationError::new(
                "time_range.max_range_days",
                format!("Must be between 1 and 366, got {}", limits.max_range_days),
            ));
        }
    }

    fn validate_query_limits(config: &Config, errors: &mut Vec<ValidationError>) {
        let limits = &config.query_limits;

        if !(10..=10_000).contains(&limits.max_query_length) {
            errors.push(ValidationError::new(
                "query_limits.max_query_length",
                format!(
                    "Must be between 10 and 10000, got {}",
                    limits.max_query_length
                ),
            ));
        }

        check_limit("query_limits.max_results", limits.max_results, errors);
        check_limit("query_limits.default_limit", limits.default_limit, errors);
        check_unit("query_limits.min_score", limits.min_score, errors);
    }

    fn validate_retrieval(config: &Config, errors: &mut Vec<ValidationError>) {
        let retrieval = &config.retrieval;

        check_limit("retrieval.vector_limit", retrieval.vector_limit, errors);
        check_limit("retrieval.hybrid_limit", retrieval.hybrid_limit, errors);
        check_limit("retrieval.expand_limit", retrieval.expand_limit, errors);

        if retrieval.expand_limit < retrieval.vector_limit {
            errors.push(ValidationError::new(
                "retrieval.expand_limit",
                format!(
                    "Expand limit ({}) must not be smaller than vector limit ({})",
                    retrieval.expand_limit, retrieval.vector_limit
                ),
            ));
        }

        if !(100..=100_000).contains(&retrieval.max_doc_length) {
            errors.push(ValidationError::new(
                "retrieval.max_doc_length",
                format!(
                    "Must be between 100 and 100000, got {}",
                    retrieval.max_doc_length
                ),
            ));
        }

        if retrieval.max_description_length < 100 {
            errors.push(ValidationError::new(
                "retrieval.max_description_length",
                format!(
                    "Must be at least 100, got {}",
                    retrieval.max_description_length
                ),
            ));
        }

        if retrieval.call_timeout_ms == 0 {
            errors.push(ValidationError::new(
                "retrieval.call_timeout_ms",
                "Call timeout must be greater than 0",
            ));
        }
    }

    fn validate_scoring(config: &Config, errors: &mut Vec<ValidationError>) {
        let scoring = &config.scoring;

        check_unit("scoring.bm25_weight_min", scoring.bm25_weight_min, errors);
        check_unit("scoring.bm25_weight_max", scoring.bm25_weight_max, errors);
        check_unit("scoring.semantic_weight", scoring.semantic_weight, errors);
        check_unit(
            "scoring.high_quality_threshold",
            scoring.high_quality_threshold,
            errors,
        );
        check_unit(
            "scoring.medium_quality_threshold",
            scoring.medium_quality_threshold,
            errors,
        );
        check_unit(
            "scoring.quality_gap_threshold",
            scoring.quality_gap_threshold,
            errors,
        );
        check_unit(
            "scoring.score_gap_threshold",
            scoring.score_gap_threshold,
            errors,
        );

        if scoring.bm25_weight_min > scoring.bm25_weight_max {
            errors.push(ValidationError::new(
                "scoring.bm25_weight_min",
                format!(
                    "BM25 weight min ({}) exceeds max ({})",
                    scoring.bm25_weight_min, scoring.bm25_weight_max
                ),
            ));
        } else {
            // The balanced hybrid weight has to sit inside the configured BM25 band.
            let bm25_share = 1.0 - scoring.semantic_weight;
            if bm25_share < scoring.bm25_weight_min - f32::EPSILON
                || bm25_share > scoring.bm25_weight_max + f32::EPSILON
            {
                errors.push(ValidationError::new(
                    "scoring.semantic_weight",
                    format!(
                        "Semantic weight {} leaves a BM25 share outside [{}, {}]",
                        scoring.semantic_weight, scoring.bm25_weight_min, scoring.bm25_weight_max
                    ),
                ));
            }
        }

        if scoring.medium_quality_threshold > scoring.high_quality_threshold {
            errors.push(ValidationError::new(
                "scoring.medium_quality_threshold",
                format!(
                    "Medium threshold ({}) exceeds high threshold ({})",
                    scoring.medium_quality_threshold, scoring.high_quality_threshold
                ),
            ));
        }

        if scoring.min_rerank_results == 0 {
            errors.push(ValidationError::new(
                "scoring.min_rerank_results",
                "Minimum rerank results must be greater than 0",
            ));
        }
    }

    fn validate_lexicon(config: &Config, errors: &mut Vec<ValidationError>) {
        let lexicon = &config.lexicon;
        let lists = [
            ("lexicon.stop_words", &lexicon.stop_words),
            ("lexicon.schedule_words", &lexicon.schedule_words),
            ("lexicon.memo_keywords", &lexicon.memo_keywords),
            ("lexicon.question_keywords", &lexicon.question_keywords),
            ("lexicon.complex_markers", &lexicon.complex_markers),
        ];

        for (path, list) in lists {
            if list.is_empty() {
                errors.push(ValidationError::new(path, "List cannot be empty"));
            } else if list.iter().any(|w| w.trim().is_empty()) {
                errors.push(ValidationError::new(path, "Entries cannot be blank"));
            }
        }
    }
}

fn check_limit(path: &str, value: usize, errors: &mut Vec<ValidationError>) {
    if !(1..=1000).contains(&value) {
        errors.push(ValidationError::new(
            path,
            format!("Must be between 1 and 1000, got {}", value),
        ));
    }
}

fn check_unit(path: &str, value: f32, errors: &mut Vec<ValidationError>) {
    if !(0.0..=1.0).contains(&value) {
        errors.push(ValidationError::new(
            path,
            format!("Must be between 0.0 and 1.0, got {}", value),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error_paths(config: &Config) -> Vec<String> {
        match ConfigValidator::validate(config) {
            Err(RecallError::ConfigValidation { errors }) => {
                errors.into_iter().map(|e| e.path).collect()
            }
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_config() {
        let config = Config::default();
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_invalid_schema_version() {
        let mut config = Config::default();
        config.meta.schema_version = "0.9.0".to_string();
        assert_eq!(error_paths(&config), vec!["_meta.schema_version"]);
    }

    #[test]
    fn test_collects_every_violation() {
        let mut config = Config::default();
        config.query_limits.min_score = -0.1;
        config.retrieval.call_timeout_ms = 0;
        config.time_range.max_range_days = 0;

        let paths = error_paths(&config);
        assert_eq!(paths.len(), 3);
        assert!(paths.contains(&"query_limits.min_score".to_string()));
        assert!(paths.contains(&"retrieval.call_timeout_ms".to_string()));
        assert!(paths.contains(&"time_range.max_range_days".to_string()));
    }

    #[test]
    fn test_threshold_ordering() {
        let mut config = Config::default();
        config.scoring.medium_quality_threshold = 0.95;
        assert_eq!(
            error_paths(&config),
            vec!["scoring.medium_quality_threshold"]
        );
    }

    #[test]
    fn test_semantic_weight_outside_bm25_band() {
        let mut config = Config::default();
        config.scoring.semantic_weight = 0.9;
        assert_eq!(error_paths(&config), vec!["scoring.semantic_weight"]);
    }

    #[test]
    fn test_expand_limit_below_vector_limit() {
        let mut config = Config::default();
        config.retrieval.vector_limit = 30;
        config.retrieval.expand_limit = 10;
        assert_eq!(error_paths(&config), vec!["retrieval.expand_limit"]);
    }

    #[test]
    fn test_empty_lexicon_list() {
        let mut config = Config::default();
        config.lexicon.memo_keywords.clear();
        config.lexicon.stop_words.push("  ".to_string());

        let paths = error_paths(&config);
        assert!(paths.contains(&"lexicon.memo_keywords".to_string()));
        assert!(paths.contains(&"lexicon.stop_words".to_string()));
    }
}
