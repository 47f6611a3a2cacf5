//! Strategy execution against the storage, embedding and reranking collaborators

use ahash::AHashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

use crate::cancel::CancellationToken;
use crate::config::{Config, SharedConfig};
use crate::providers::{Embedder, Entity, ProviderError, Reranker, Storage};
use crate::retrieval::{
    merge_results, QualityEvaluator, QualityLevel, RerankDecisionPolicy, RetrievalError,
    RetrievalOptions, SearchResult, Stage,
};
use crate::routing::Strategy;
use crate::temporal::{TimeRange, TimeRangeError};
use crate::text;

/// Per-request state: one config snapshot for the whole request
struct Request<'a> {
    options: &'a RetrievalOptions,
    config: Arc<Config>,
    cancel: &'a CancellationToken,
    limit: usize,
}

/// Executes routed queries
pub struct AdaptiveRetriever {
    storage: Arc<dyn Storage>,
    embedder: Arc<dyn Embedder>,
    reranker: Option<Arc<dyn Reranker>>,
    config: SharedConfig,
}

impl AdaptiveRetriever {
    /// Create a retriever without a reranker
    pub fn new(storage: Arc<dyn Storage>, embedder: Arc<dyn Embedder>, config: SharedConfig) -> Self {
        Self {
            storage,
            embedder,
            reranker: None,
            config,
        }
    }

    pub fn with_reranker(mut self, reranker: Arc<dyn Reranker>) -> Self {
        self.reranker = Some(reranker);
        self
    }

    /// Handle to the live configuration; updates apply to later requests
    pub fn config(&self) -> &SharedConfig {
        &self.config
    }

    /// Execute a request
    pub async fn retrieve(
        &self,
        options: &RetrievalOptions,
    ) -> Result<Vec<SearchResult>, RetrievalError> {
        self.retrieve_with_cancel(options, &CancellationToken::new())
            .await
    }

    /// Execute a request that the caller may cancel
    ///
    /// # Arguments
    /// * `options` - Query, strategy and limits for this request
    /// * `cancel` - Cancelling the token aborts the collaborator call in flight
    ///
    /// # Returns
    /// Ranked results, or the first error from a collaborator other than the reranker
    pub async fn retrieve_with_cancel(
        &self,
        options: &RetrievalOptions,
        cancel: &CancellationToken,
    ) -> Result<Vec<SearchResult>, RetrievalError> {
        let span = tracing::info_span!(
            "retrieve",
            request_id = %options.request_id,
            strategy = %options.strategy,
            user_id = options.user_id
        );

        self.execute(options, cancel).instrument(span).await
    }

    async fn execute(
        &self,
        options: &RetrievalOptions,
        cancel: &CancellationToken,
    ) -> Result<Vec<SearchResult>, RetrievalError> {
        let config = self.config.snapshot();

        let length = options.query.chars().count();
        let max = config.query_limits.max_query_length;
        if length > max {
            return Err(RetrievalError::QueryTooLong { length, max });
        }

        let limit = effective_limit(options.limit, config.query_limits.max_results);
        let semantic_weight = config.scoring.semantic_weight;
        let bm25_weighted = 1.0 - config.scoring.bm25_weight_max;

        let request = Request {
            options,
            config,
            cancel,
            limit,
        };

        tracing::info!("Using retrieval strategy {}", options.strategy);

        let results = match options.strategy {
            Strategy::ScheduleBm25Only => self.schedule_only(&request).await?,
            Strategy::MemoSemanticOnly => self.memo_semantic(&request).await?,
            Strategy::HybridBm25Weighted => self.hybrid(&request, bm25_weighted, None).await?,
            Strategy::HybridWithTimeFilter => {
                let range = options.time_range.as_ref();
                self.hybrid(&request, semantic_weight, range).await?
            }
            Strategy::HybridStandard => self.hybrid(&request, semantic_weight, None).await?,
            Strategy::FullPipelineWithReranker => self.full_pipeline(&request).await?,
        };

        tracing::info!("Retrieval completed with {} results", results.len());
        Ok(results)
    }

    /// Every schedule in the range, unranked
    async fn schedule_only(&self, req: &Request<'_>) -> Result<Vec<SearchResult>, RetrievalError> {
        let range = req.options.time_range.as_ref();

        if let Some(range) = range {
            if let Err(e) = range.validate(chrono::Utc::now(), &req.config.time_range) {
                tracing::warn!("Rejecting time range {}: {}", range, e);
                return Err(e.into());
            }
        }

        let schedules = guarded(
            req,
            Stage::ScheduleList,
            self.storage
                .list_schedules(req.options.user_id, range, req.options.schedule_query_mode),
        )
        .await?;

        let max_description = req.config.retrieval.max_description_length;
        let results = schedules
            .into_iter()
            .map(|mut schedule| {
                if schedule.description.chars().count() > max_description {
                    schedule.description = text::truncate_chars(&schedule.description, max_description);
                }
                SearchResult::from_schedule(schedule, 1.0)
            })
            .collect();

        Ok(results)
    }

    /// Note search with a second, wider pass when the first one is only medium quality
    async fn memo_semantic(&self, req: &Request<'_>) -> Result<Vec<SearchResult>, RetrievalError> {
        let vector = self.embed(req).await?;
        let retrieval = &req.config.retrieval;

        let first_pass = retrieval.vector_limit.max(req.limit);
        let mut results = self.memo_search(req, &vector, first_pass).await?;

        let quality = QualityEvaluator::new(&req.config.scoring).evaluate(&results);
        tracing::debug!(
            "Result quality {} for {} first-pass results",
            quality,
            results.len()
        );

        if quality == QualityLevel::Medium && req.limit > retrieval.vector_limit {
            let more = self.memo_search(req, &vector, retrieval.expand_limit).await?;
            results = merge_results(results, more, req.limit);
            tracing::debug!("Expanded to {} results", results.len());
        }

        let min_score = req.options.min_score;
        results.retain(|r| r.score >= min_score);
        results.truncate(req.limit);
        Ok(results)
    }

    async fn memo_search(
        &self,
        req: &Request<'_>,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchResult>, RetrievalError> {
        let hits = guarded(
            req,
            Stage::VectorSearch,
            self.storage.vector_search(req.options.user_id, vector, limit),
        )
        .await?;

        Ok(hits
            .into_iter()
            .filter(|hit| matches!(hit.entity, Entity::Memo(_)))
            .map(SearchResult::from_scored)
            .collect())
    }

    /// Weighted hybrid search, cut to the request limit
    async fn hybrid(
        &self,
        req: &Request<'_>,
        semantic_weight: f32,
        time_filter: Option<&TimeRange>,
    ) -> Result<Vec<SearchResult>, RetrievalError> {
        if let Some(range) = time_filter {
            if !range.is_well_formed() {
                tracing::warn!("Rejecting time range {}", range);
                return Err(TimeRangeError::EndNotAfterStart {
                    start: range.start,
                    end: range.end,
                }
                .into());
            }
        }

        let mut results = self.hybrid_candidates(req, semantic_weight).await?;

        if let Some(range) = time_filter {
            results.retain(|r| r.schedule_start().map_or(true, |start| range.contains(start)));
        }

        results.truncate(req.limit);
        Ok(results)
    }

    /// Candidate pool for the hybrid strategies, scaled by the semantic weight
    async fn hybrid_candidates(
        &self,
        req: &Request<'_>,
        semantic_weight: f32,
    ) -> Result<Vec<SearchResult>, RetrievalError> {
        let vector = self.embed(req).await?;

        let hits = guarded(
            req,
            Stage::VectorSearch,
            self.storage.vector_search(
                req.options.user_id,
                &vector,
                req.config.retrieval.hybrid_limit,
            ),
        )
        .await?;

        Ok(hits
            .into_iter()
            .map(|hit| {
                let mut result = SearchResult::from_scored(hit);
                result.score *= semantic_weight;
                result
            })
            .collect())
    }

    /// Hybrid pass followed by cross-encoder reranking when the policy allows it
    async fn full_pipeline(&self, req: &Request<'_>) -> Result<Vec<SearchResult>, RetrievalError> {
        let mut candidates = self
            .hybrid_candidates(req, req.config.scoring.semantic_weight)
            .await?;

        let reranker = match &self.reranker {
            Some(reranker) if reranker.is_enabled() => Arc::clone(reranker),
            _ => {
                candidates.truncate(req.limit);
                return Ok(candidates);
            }
        };

        let policy = RerankDecisionPolicy::new(&req.config, true);
        if !policy.should_rerank(&req.options.query, &candidates) {
            tracing::debug!("Skipping rerank for {} candidates", candidates.len());
            candidates.truncate(req.limit);
            return Ok(candidates);
        }

        let max_doc = req.config.retrieval.max_doc_length;
        let documents: Vec<String> = candidates
            .iter()
            .map(|r| text::truncate_chars(&r.content, max_doc))
            .collect();

        let outcome = guarded(
            req,
            Stage::Rerank,
            reranker.rerank(&req.options.query, &documents, req.limit),
        )
        .await;

        let hits = match outcome {
            Ok(hits) => hits,
            Err(e) if e.is_cancelled() => return Err(e),
            Err(e) => {
                tracing::warn!("Reranking failed, keeping hybrid order: {}", e);
                candidates.truncate(req.limit);
                return Ok(candidates);
            }
        };

        let mut used = AHashSet::new();
        let mut reranked = Vec::with_capacity(hits.len());
        for hit in hits {
            if hit.index >= candidates.len() || !used.insert(hit.index) {
                continue;
            }
            let mut result = candidates[hit.index].clone();
            result.score = hit.score;
            reranked.push(result);
        }

        reranked.truncate(req.limit);
        tracing::debug!("Reranked {} candidates", reranked.len());
        Ok(reranked)
    }

    async fn embed(&self, req: &Request<'_>) -> Result<Vec<f32>, RetrievalError> {
        guarded(req, Stage::Embedding, self.embedder.embed(&req.options.query)).await
    }
}

/// Requested limit clamped to the configured maximum; 0 means the maximum
fn effective_limit(requested: usize, max_results: usize) -> usize {
    if requested == 0 {
        max_results
    } else {
        requested.min(max_results)
    }
}

/// Run a collaborator call under the request's cancellation token and the
/// configured per-call timeout
async fn guarded<T, F>(req: &Request<'_>, stage: Stage, call: F) -> Result<T, RetrievalError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    let timeout_ms = req.config.retrieval.call_timeout_ms;

    tokio::select! {
        biased;

        _ = req.cancel.cancelled() => {
            tracing::debug!("{} cancelled", stage);
            Err(RetrievalError::Cancelled { stage })
        }
        outcome = tokio::time::timeout(Duration::from_millis(timeout_ms), call) => match outcome {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(source)) => {
                tracing::error!("{} failed: {}", stage, source);
                Err(RetrievalError::Provider { stage, source })
            }
            Err(_) => {
                tracing::error!("{} timed out after {}ms", stage, timeout_ms);
                Err(RetrievalError::Timeout { stage, timeout_ms })
            }
        },
    }
}
