//! Model-backed reranker
//!
//! Sends compact signal profiles to the chat model and validates the
//! ranking it returns.

use super::{select_candidates, validate_ai_ranking, Reranker};
use crate::llm::ChatClient;
use crate::models::{ClientSignalProfile, RankedClient, RawSignals, SuggestedAction};
use crate::scorer::MAX_RANKED_CLIENTS;
use crate::Result;
use async_trait::async_trait;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

const SYSTEM_PROMPT: &str = r#"You are a prioritisation engine for a wealth-management advisor.
You rank clients by how urgently the advisor should act on them.
You reply with JSON only."#;

pub struct LlmReranker {
    client: ChatClient,
}

/// Compact per-client view sent to the model.
#[derive(Debug, Serialize)]
struct PromptProfile<'a> {
    client_id: Uuid,
    name: &'a str,
    total_assets: f64,
    signals: &'a [String],
    raw: &'a RawSignals,
}

impl LlmReranker {
    pub fn new(client: ChatClient) -> Self {
        Self { client }
    }

    /// Build the ranking instruction for the given candidates
    fn build_prompt(candidates: &[ClientSignalProfile]) -> Result<String> {
        let compact: Vec<PromptProfile<'_>> = candidates
            .iter()
            .map(|p| PromptProfile {
                client_id: p.client_id,
                name: &p.client_name,
                total_assets: p.total_assets,
                signals: &p.signals,
                raw: &p.raw,
            })
            .collect();

        let actions: Vec<&str> = SuggestedAction::ALL.iter().map(|a| a.label()).collect();

        Ok(format!(
            r#"Rank the following clients by how urgently their advisor should act.

CLIENTS:
{}

Rules:
- Return ONLY a JSON array, no explanation text
- At most {} entries, sorted by priority_score descending
- client_id must be copied exactly from the input
- priority_score is an integer from 0 to 100
- reason is at most 10 words
- suggested_action is one of: {}
- urgency is one of: critical, high, medium
- JSON format:

[
  {{
    "client_id": "...",
    "priority_score": 85,
    "reason": "...",
    "suggested_action": "...",
    "urgency": "critical"
  }}
]
"#,
            serde_json::to_string(&compact)?,
            MAX_RANKED_CLIENTS,
            actions.join(", "),
        ))
    }
}

#[async_trait]
impl Reranker for LlmReranker {
    async fn rerank(&self, profiles: &[ClientSignalProfile]) -> Result<Vec<RankedClient>> {
        let candidates = select_candidates(profiles);
        let prompt = Self::build_prompt(&candidates)?;

        let reply = self.client.complete(SYSTEM_PROMPT, &prompt).await?;
        let ranked = validate_ai_ranking(&reply, &candidates)?;

        info!(
            candidate_count = candidates.len(),
            ranked_count = ranked.len(),
            "AI ranking validated"
        );

        Ok(ranked)
    }
}
