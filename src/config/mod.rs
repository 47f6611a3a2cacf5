//! Configuration management for recall
//!
//! Every tunable of the router and the retriever lives here: time-range limits,
//! query limits, per-strategy retrieval limits, scoring thresholds and the routing
//! lexicon. A `Config` is only ever handed to the pipeline after `ConfigValidator`
//! accepted it.

use crate::error::{RecallError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod shared;
mod validator;

pub use shared::SharedConfig;
pub use validator::ConfigValidator;

/// Schema version understood by this build
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "_meta")]
    pub meta: MetaConfig,
    #[serde(default)]
    pub time_range: TimeRangeConfig,
    #[serde(default)]
    pub query_limits: QueryLimitsConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub lexicon: LexiconConfig,
}

/// Metadata about the configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaConfig {
    pub schema_version: String,
    #[serde(default = "current_timestamp")]
    pub created_at: String,
    #[serde(default = "current_timestamp")]
    pub last_modified: String,
}

fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Limits applied to time ranges before they reach the schedule store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeRangeConfig {
    /// How far in the future a range may start, in days
    pub max_future_days: u32,
    /// Longest accepted range, in days
    pub max_range_days: u32,
}

impl Default for TimeRangeConfig {
    fn default() -> Self {
        Self {
            max_future_days: 31,
            max_range_days: 92,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryLimitsConfig {
    /// Maximum query length, in characters
    pub max_query_length: usize,
    /// Upper bound for any requested result limit
    pub max_results: usize,
    /// Minimum score kept by the semantic-only strategy
    pub min_score: f32,
    /// Limit used when options are built from a route decision
    pub default_limit: usize,
}

impl Default for QueryLimitsConfig {
    fn default() -> Self {
        Self {
            max_query_length: 1000,
            max_results: 20,
            min_score: 0.5,
            default_limit: 10,
        }
    }
}

/// Per-strategy retrieval limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// First-pass size for semantic-only retrieval
    pub vector_limit: usize,
    /// Candidate pool size for the hybrid strategies
    pub hybrid_limit: usize,
    /// Second-pass size when a medium-quality result set is expanded
    pub expand_limit: usize,
    pub enable_reranker: bool,
    /// Documents sent to the reranker are cut to this many characters
    pub max_doc_length: usize,
    /// Schedule descriptions are cut to this many characters
    pub max_description_length: usize,
    /// Upper bound for a single collaborator call
    pub call_timeout_ms: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            vector_limit: 5,
            hybrid_limit: 20,
            expand_limit: 20,
            enable_reranker: true,
            max_doc_length: 5000,
            max_description_length: 10_000,
            call_timeout_ms: 10_000,
        }
    }
}

/// Weights and thresholds used to judge and combine scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub bm25_weight_min: f32,
    pub bm25_weight_max: f32,
    /// Semantic share of the balanced hybrid strategies
    pub semantic_weight: f32,
    pub high_quality_threshold: f32,
    pub medium_quality_threshold: f32,
    /// Top-two gap above which a result set counts as high quality
    pub quality_gap_threshold: f32,
    /// Top-two gap above which reranking is skipped
    pub score_gap_threshold: f32,
    pub min_rerank_results: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            bm25_weight_min: 0.3,
            bm25_weight_max: 0.7,
            semantic_weight: 0.5,
            high_quality_threshold: 0.90,
            medium_quality_threshold: 0.70,
            quality_gap_threshold: 0.20,
            score_gap_threshold: 0.15,
            min_rerank_results: 5,
        }
    }
}

/// Word lists driving the query classifier and the rerank policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LexiconConfig {
    /// Removed from queries before the remaining content is used
    pub stop_words: Vec<String>,
    /// Words that do not turn a time query into a content query
    pub schedule_words: Vec<String>,
    /// Words that mark a query as a note lookup
    pub memo_keywords: Vec<String>,
    /// Words that mark a query as an open question
    pub question_keywords: Vec<String>,
    /// Question words, conjunctions and contrast markers that make a query complex
    pub complex_markers: Vec<String>,
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
}

impl Default for LexiconConfig {
    fn default() -> Self {
        Self {
            stop_words: words(&[
                "的", "有什么", "查询", "搜索", "查找", "关于", "安排", "呢", "吗", "啊", "呀",
                "内容", "笔记", "备忘", "记录", "about", "the", "my", "any", "me", "show", "a",
                "an", "on", "of", "for", "find", "search", "note", "notes", "memo", "memos",
                "what's", "what", "is", "are", "do", "i", "have",
            ]),
            schedule_words: words(&[
                "日程", "安排", "事", "计划", "schedule", "schedules", "plan", "plans", "agenda",
                "calendar", "events",
            ]),
            memo_keywords: words(&[
                "笔记", "备忘", "记录", "搜索", "查找", "内容", "memo", "memos", "note", "notes",
                "search", "find", "content",
            ]),
            question_keywords: words(&[
                "是什么", "怎么做", "如何", "为什么", "总结", "是什么意思", "what", "how", "why",
                "summarize", "explain",
            ]),
            complex_markers: words(&[
                "如何", "怎么", "为什么", "和", "或者", "但是", "how", "why", "and", "or", "but",
                "versus",
            ]),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RecallError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| RecallError::Io {
            source: e,
            context: format!("Failed to read config file: {:?}", path),
        })?;
        let mut config: Config = toml::from_str(&content)?;

        config.apply_env_overrides()?;

        ConfigValidator::validate(&config)?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| RecallError::Io {
            source: e,
            context: format!("Failed to write config file: {:?}", path),
        })?;
        Ok(())
    }

    /// Apply environment variable overrides
    /// Environment variables in format: RECALL_SECTION__KEY=value
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(std::env::vars())
    }

    /// Apply `RECALL_`-prefixed key/value overrides from any source
    pub fn apply_overrides<I>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if let Some(config_key) = key.strip_prefix("RECALL_") {
                self.set_value_from_env(config_key, &value)?;
            }
        }
        Ok(())
    }

    fn set_value_from_env(&mut self, path: &str, value: &str) -> Result<()> {
        match path {
            "TIME_RANGE__MAX_FUTURE_DAYS" => {
                self.time_range.max_future_days = parse_value(path, value)?;
            }
            "TIME_RANGE__MAX_RANGE_DAYS" => {
                self.time_range.max_range_days = parse_value(path, value)?;
            }
            "QUERY_LIMITS__MAX_QUERY_LENGTH" => {
                self.query_limits.max_query_length = parse_value(path, value)?;
            }
            "QUERY_LIMITS__MAX_RESULTS" => {
                self.query_limits.max_results = parse_value(path, value)?;
            }
            "QUERY_LIMITS__MIN_SCORE" => {
                self.query_limits.min_score = parse_value(path, value)?;
            }
            "RETRIEVAL__ENABLE_RERANKER" => {
                self.retrieval.enable_reranker = parse_value(path, value)?;
            }
            "RETRIEVAL__CALL_TIMEOUT_MS" => {
                self.retrieval.call_timeout_ms = parse_value(path, value)?;
            }
            "RETRIEVAL__MAX_DOC_LENGTH" => {
                self.retrieval.max_doc_length = parse_value(path, value)?;
            }
            _ => {
                tracing::debug!("Unknown env config key: {}", path);
            }
        }
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| RecallError::Config("Cannot determine config directory".to_string()))?;

        Ok(config_dir.join("recall").join("config.toml"))
    }
}

fn parse_value<T: std::str::FromStr>(path: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| RecallError::InvalidConfigValue {
            path: path.to_string(),
            message: format!("Cannot parse '{}'", value),
        })
}

impl Default for Config {
    fn default() -> Self {
        Self {
            meta: MetaConfig {
                schema_version: SCHEMA_VERSION.to_string(),
                created_at: current_timestamp(),
                last_modified: current_timestamp(),
            },
            time_range: TimeRangeConfig::default(),
            query_limits: QueryLimitsConfig::default(),
            retrieval: RetrievalConfig::default(),
            scoring: ScoringConfig::default(),
            lexicon: LexiconConfig::default(),
        }
    }
}
