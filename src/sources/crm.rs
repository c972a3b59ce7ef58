//! HTTP-backed readers for the CRM service
//!
//! One pooled reqwest client serves every reader trait.

use super::{ActivityLog, ClientRoster, CommunicationLog, GoalReader, OrderReader, SourceKind};
use crate::error::RankingError;
use crate::models::{ClientRecord, ContactEvent, GoalProgress, OrderRecord};
use crate::Result;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

#[derive(Clone)]
pub struct CrmApiClient {
    client: Client,
    base_url: String,
}

impl CrmApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(60))
            .pool_max_idle_per_host(8)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, kind: SourceKind, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!(source = %kind, %url, "CRM GET");

        let response = self
            .client
            .get(url)
            .query(&[("active", "true")])
            .send()
            .await
            .map_err(|e| source_error(kind, format!("request failed for {}: {}", path, e)))?;

        decode(kind, path, response).await
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        kind: SourceKind,
        path: &str,
        client_ids: &[Uuid],
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!(source = %kind, %url, client_count = client_ids.len(), "CRM POST");

        let response = self
            .client
            .post(url)
            .json(&json!({ "client_ids": client_ids }))
            .send()
            .await
            .map_err(|e| source_error(kind, format!("request failed for {}: {}", path, e)))?;

        decode(kind, path, response).await
    }
}

fn source_error(kind: SourceKind, message: String) -> RankingError {
    RankingError::Source { kind, message }
}

async fn decode<T: DeserializeOwned>(
    kind: SourceKind,
    path: &str,
    response: reqwest::Response,
) -> Result<T> {
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(source_error(
            kind,
            format!("CRM returned {} for {}: {}", status, path, body),
        ));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| source_error(kind, format!("invalid JSON from {}: {}", path, e)))
}

#[async_trait::async_trait]
impl ClientRoster for CrmApiClient {
    async fn active_clients(&self, advisor_id: Uuid) -> Result<Vec<ClientRecord>> {
        self.get_json(
            SourceKind::Roster,
            &format!("/advisors/{}/clients", advisor_id),
        )
        .await
    }
}

#[async_trait::async_trait]
impl ActivityLog for CrmApiClient {
    async fn activities(&self, client_ids: &[Uuid]) -> Result<Vec<ContactEvent>> {
        self.post_json(SourceKind::Activity, "/clients/activities", client_ids)
            .await
    }
}

#[async_trait::async_trait]
impl CommunicationLog for CrmApiClient {
    async fn communications(&self, client_ids: &[Uuid]) -> Result<Vec<ContactEvent>> {
        self.post_json(SourceKind::Communication, "/clients/communications", client_ids)
            .await
    }
}

#[async_trait::async_trait]
impl GoalReader for CrmApiClient {
    async fn open_goals(&self, client_ids: &[Uuid]) -> Result<Vec<GoalProgress>> {
        let mut goals: Vec<GoalProgress> = self
            .post_json(SourceKind::Goals, "/clients/goals", client_ids)
            .await?;
        goals.retain(|g| !g.is_completed());
        Ok(goals)
    }
}

#[async_trait::async_trait]
impl OrderReader for CrmApiClient {
    async fn orders(&self, client_ids: &[Uuid]) -> Result<Vec<OrderRecord>> {
        self.post_json(SourceKind::Orders, "/clients/orders", client_ids)
            .await
    }
}
