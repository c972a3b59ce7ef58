//! Client Priority Ranking Engine
//!
//! Turns a read-only snapshot of an advisor's client facts into a short,
//! explainable list of clients that need attention:
//! - Fans out to independent signal sources and tolerates any of them failing
//! - Scores profiles with a deterministic rule table
//! - Optionally lets a chat model rerank, with strict validation
//! - Falls back to the rule table whenever the model path fails
//!
//! FLOW:
//! ROSTER → SOURCES → PROFILES → (AI RERANK | RULE SCORE) → TOP 10

pub mod aggregator;
pub mod api;
pub mod audit;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod llm;
pub mod models;
pub mod reranker;
pub mod scorer;
pub mod sources;

pub use error::Result;

// Re-export common types
pub use models::*;
pub use aggregator::SignalAggregator;
pub use coordinator::{RankingCoordinator, RankingReport};
pub use scorer::{rank_deterministically, score_profile};
