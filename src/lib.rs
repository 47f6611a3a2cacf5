//! Recall - query routing and adaptive retrieval for a personal knowledge base
//!
//! A query like "明天下午的会议" or "notes about Rust traits" is classified into a
//! retrieval strategy, its time expressions are resolved into UTC ranges, and the
//! chosen strategy is executed against pluggable storage, embedding and reranking
//! collaborators.
//!
//! ```no_run
//! use recall::config::{Config, SharedConfig};
//! use recall::providers::memory::InMemoryStore;
//! use recall::retrieval::{AdaptiveRetriever, RetrievalOptions};
//! use recall::routing::QueryClassifier;
//! # use std::sync::Arc;
//! # async fn run(embedder: Arc<dyn recall::providers::Embedder>) -> recall::Result<()> {
//! let config = Config::default();
//! let classifier = QueryClassifier::from_config(&config);
//! let retriever = AdaptiveRetriever::new(
//!     Arc::new(InMemoryStore::new()),
//!     embedder,
//!     SharedConfig::new(config.clone())?,
//! );
//!
//! let query = "今天关于Python的笔记";
//! let decision = classifier.route(query);
//! let options = RetrievalOptions::from_decision(&decision, query, 1, &config);
//! let results = retriever.retrieve(&options).await?;
//! # Ok(())
//! # }
//! ```

pub mod cancel;
pub mod cli;
pub mod config;
pub mod error;
pub mod providers;
pub mod retrieval;
pub mod routing;
pub mod temporal;

mod text;

pub use error::{RecallError, Result};
