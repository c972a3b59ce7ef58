//! Reranker trait and implementations
//!
//! A reranker replaces the deterministic ranking with an external model's
//! ordering. Its output is untrusted and always goes through
//! [`validate_ai_ranking`] before the coordinator accepts it.

use crate::models::{ClientSignalProfile, RankedClient};
use crate::scorer::{compare_ranked, score_profile};
use crate::Result;
use async_trait::async_trait;

pub mod llm;
pub mod validate;

pub use llm::LlmReranker;
pub use validate::{extract_json_array, validate_ai_ranking};

/// Most profiles handed to a reranker in one call.
pub const MAX_AI_PROFILES: usize = 20;

/// Trait for model-backed ranking
#[async_trait]
pub trait Reranker: Send + Sync {
    /// Rank the given profiles. Any error means the caller should fall back
    /// to deterministic scoring.
    async fn rerank(&self, profiles: &[ClientSignalProfile]) -> Result<Vec<RankedClient>>;
}

/// The best `MAX_AI_PROFILES` profiles by deterministic order.
pub fn select_candidates(profiles: &[ClientSignalProfile]) -> Vec<ClientSignalProfile> {
    let mut scored: Vec<(RankedClient, &ClientSignalProfile)> = profiles
        .iter()
        .map(|profile| (score_profile(profile), profile))
        .collect();

    scored.sort_by(|(a, _), (b, _)| compare_ranked(a, b));

    scored
        .into_iter()
        .take(MAX_AI_PROFILES)
        .map(|(_, profile)| profile.clone())
        .collect()
}
