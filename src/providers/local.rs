//! Local embedding and cross-encoder reranking using FastEmbed
//!
//! Models are downloaded on first use to the Hugging Face cache. Inference is
//! CPU-bound, so every call runs on tokio's blocking pool.

use async_trait::async_trait;
use fastembed::{
    EmbeddingModel, InitOptions, RerankInitOptions, RerankerModel, TextEmbedding, TextRerank,
};
use std::cmp::Ordering;
use std::sync::Arc;

use super::{Embedder, ProviderError, RerankHit, Reranker};

/// FastEmbed text embedder
pub struct FastEmbedEmbedder {
    model: Arc<TextEmbedding>,
    model_name: String,
}

impl FastEmbedEmbedder {
    /// Create an embedder for the named model
    ///
    /// Supported: multilingual-e5-small (default, handles Chinese and
    /// English), all-MiniLM-L6-v2, bge-small-en-v1.5, bge-base-en-v1.5
    pub fn new(model_name: &str) -> Result<Self, ProviderError> {
        let embedding_model = match model_name {
            "multilingual-e5-small" => EmbeddingModel::MultilingualE5Small,
            "all-MiniLM-L6-v2" | "all-minilm-l6-v2" => EmbeddingModel::AllMiniLML6V2,
            "bge-small-en-v1.5" => EmbeddingModel::BGESmallENV15,
            "bge-base-en-v1.5" => EmbeddingModel::BGEBaseENV15,
            _ => {
                return Err(ProviderError::Unavailable(format!(
                    "Unsupported embedding model: {}",
                    model_name
                )));
            }
        };

        tracing::info!("Initializing embedding model: {}", model_name);

        let init_options = InitOptions::new(embedding_model).with_show_download_progress(true);
        let model = TextEmbedding::try_new(init_options)
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;

        Ok(Self {
            model: Arc::new(model),
            model_name: model_name.to_string(),
        })
    }

    pub fn with_default_model() -> Result<Self, ProviderError> {
        Self::new("multilingual-e5-small")
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[async_trait]
impl Embedder for FastEmbedEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        if text.trim().is_empty() {
            return Err(ProviderError::InvalidInput("Empty text".to_string()));
        }

        let model = Arc::clone(&self.model);
        let input = text.to_string();

        let embeddings = tokio::task::spawn_blocking(move || model.embed(vec![input], None))
            .await
            .map_err(|e| ProviderError::Failed(format!("Embedding task failed: {}", e)))?
            .map_err(|e| ProviderError::Failed(e.to_string()))?;

        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Failed("No embedding generated".to_string()))
    }
}

/// FastEmbed cross-encoder reranker
pub struct FastEmbedReranker {
    model: Arc<TextRerank>,
    model_name: String,
}

impl FastEmbedReranker {
    /// Create a reranker for the named model
    ///
    /// Supported: bge-reranker-v2-m3 (default, multilingual), bge-reranker-base
    pub fn new(model_name: &str) -> Result<Self, ProviderError> {
        let reranker_model = match model_name {
            "bge-reranker-v2-m3" => RerankerModel::BGERerankerV2M3,
            "bge-reranker-base" => RerankerModel::BGERerankerBase,
            _ => {
                return Err(ProviderError::Unavailable(format!(
                    "Unsupported reranker model: {}",
                    model_name
                )));
            }
        };

        tracing::info!("Initializing reranker model: {}", model_name);

        let init_options =
            RerankInitOptions::new(reranker_model).with_show_download_progress(true);
        let model = TextRerank::try_new(init_options)
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;

        Ok(Self {
            model: Arc::new(model),
            model_name: model_name.to_string(),
        })
    }

    pub fn with_default_model() -> Result<Self, ProviderError> {
        Self::new("bge-reranker-v2-m3")
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[async_trait]
impl Reranker for FastEmbedReranker {
    fn is_enabled(&self) -> bool {
        true
    }

    async fn rerank(
        &self,
        query: &str,
        documents: &[String],
        top_k: usize,
    ) -> Result<Vec<RerankHit>, ProviderError> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        if query.is_empty() {
            return Err(ProviderError::InvalidInput(
                "Query cannot be empty".to_string(),
            ));
        }

        let model = Arc::clone(&self.model);
        let query = query.to_string();
        let documents = documents.to_vec();

        let results = tokio::task::spawn_blocking(move || {
            let docs: Vec<&str> = documents.iter().map(|s| s.as_str()).collect();
            model.rerank(query.as_str(), docs, false, None)
        })
        .await
        .map_err(|e| ProviderError::Failed(format!("Rerank task failed: {}", e)))?
        .map_err(|e| ProviderError::Failed(e.to_string()))?;

        let mut hits: Vec<RerankHit> = results
            .into_iter()
            .map(|r| RerankHit {
                index: r.index,
                score: r.score,
            })
            .collect();

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        hits.truncate(top_k);

        Ok(hits)
    }
}
