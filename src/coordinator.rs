//! Ranking coordinator
//!
//! AGGREGATING → RANKING → DONE
//!
//! Single attempt per request. The AI path is optional and any failure on
//! it falls through to the deterministic scorer, so RANKING → DONE cannot
//! fail.

use crate::aggregator::SignalAggregator;
use crate::audit::ranking_fingerprint;
use crate::config::EngineConfig;
use crate::error::RankingError;
use crate::llm::ChatClient;
use crate::models::{ClientSignalProfile, PrioritizedClients, RankedClient};
use crate::reranker::{LlmReranker, Reranker};
use crate::scorer::rank_deterministically;
use crate::sources::{SignalSources, SourceKind};
use crate::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingPhase {
    Aggregating,
    Ranking,
    Done,
}

/// Which branch produced the final list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingPath {
    NoAttentionNeeded,
    Ai,
    Deterministic,
}

/// Diagnostics for one ranking call. Never part of the API payload.
#[derive(Debug, Clone, Serialize)]
pub struct RankingReport {
    pub ranking: PrioritizedClients,
    pub path: RankingPath,
    pub unavailable_sources: Vec<SourceKind>,
    pub fingerprint: String,
    pub phases: Vec<RankingPhase>,
    pub elapsed_ms: u64,
}

pub struct RankingCoordinator {
    aggregator: SignalAggregator,
    reranker: Option<Box<dyn Reranker>>,
    ai_timeout: Duration,
}

impl RankingCoordinator {
    pub fn new(
        aggregator: SignalAggregator,
        reranker: Option<Box<dyn Reranker>>,
        ai_timeout: Duration,
    ) -> Self {
        Self {
            aggregator,
            reranker,
            ai_timeout,
        }
    }

    /// Wire the aggregator and, when a key is configured, the model reranker.
    pub fn from_config(config: &EngineConfig, sources: SignalSources) -> Result<Self> {
        let reranker: Option<Box<dyn Reranker>> = match &config.ai {
            Some(ai) => {
                let client =
                    ChatClient::new(ai.api_key.clone(), ai.base_url.clone(), ai.model.clone())?;
                Some(Box::new(LlmReranker::new(client)))
            }
            None => {
                info!("No ranking model configured, using deterministic scoring only");
                None
            }
        };

        Ok(Self::new(
            SignalAggregator::new(sources, config.source_timeout),
            reranker,
            config.ai_timeout,
        ))
    }

    /// Rank the clients of `advisor_id` that need attention at `now`.
    pub async fn rank(&self, advisor_id: Uuid, now: DateTime<Utc>) -> Result<PrioritizedClients> {
        Ok(self.rank_with_report(advisor_id, now).await?.ranking)
    }

    /// Same as [`rank`](Self::rank) but also reports how the list was made.
    pub async fn rank_with_report(
        &self,
        advisor_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<RankingReport> {
        let start_time = Instant::now();
        let mut phases = vec![RankingPhase::Aggregating];

        info!(advisor_id = %advisor_id, %now, "Ranking: aggregating signals");

        let aggregation = self.aggregator.aggregate(advisor_id, now).await?;
        let fingerprint = ranking_fingerprint(advisor_id, now, &aggregation.profiles);

        if aggregation.profiles.is_empty() {
            phases.push(RankingPhase::Done);
            info!(advisor_id = %advisor_id, "Ranking: no clients need attention");

            return Ok(RankingReport {
                ranking: PrioritizedClients::default(),
                path: RankingPath::NoAttentionNeeded,
                unavailable_sources: aggregation.unavailable,
                fingerprint,
                phases,
                elapsed_ms: start_time.elapsed().as_millis() as u64,
            });
        }

        // === RANKING ===
        phases.push(RankingPhase::Ranking);
        debug!(profile_count = aggregation.profiles.len(), "Ranking: scoring profiles");

        let (prioritized_clients, path) = match self.try_rerank(&aggregation.profiles).await {
            Some(ranked) => (ranked, RankingPath::Ai),
            None => (
                rank_deterministically(&aggregation.profiles),
                RankingPath::Deterministic,
            ),
        };

        // === DONE ===
        phases.push(RankingPhase::Done);
        let elapsed_ms = start_time.elapsed().as_millis() as u64;

        info!(
            advisor_id = %advisor_id,
            path = ?path,
            ranked_count = prioritized_clients.len(),
            fingerprint = %fingerprint,
            elapsed_ms,
            "Ranking completed"
        );

        Ok(RankingReport {
            ranking: PrioritizedClients { prioritized_clients },
            path,
            unavailable_sources: aggregation.unavailable,
            fingerprint,
            phases,
            elapsed_ms,
        })
    }

    /// One bounded attempt at the AI path. `None` means fall back.
    async fn try_rerank(&self, profiles: &[ClientSignalProfile]) -> Option<Vec<RankedClient>> {
        let reranker = self.reranker.as_ref()?;

        let outcome = match timeout(self.ai_timeout, reranker.rerank(profiles)).await {
            Ok(result) => result,
            Err(_) => Err(RankingError::AiTimeout),
        };

        match outcome {
            Ok(ranked) => Some(ranked),
            Err(e) => {
                warn!(error = %e, "AI reranking failed, falling back to deterministic scoring");
                None
            }
        }
    }
}
