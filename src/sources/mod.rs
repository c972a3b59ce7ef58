//! Signal source adapters
//!
//! Read-only collaborators the aggregator pulls client facts from.
//! Every reader is independent; only the roster is mandatory.

use crate::models::{ClientRecord, ContactEvent, GoalProgress, OrderRecord};
use crate::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

pub mod crm;
pub mod memory;

pub use crm::CrmApiClient;
pub use memory::InMemoryCrm;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Roster,
    Activity,
    Communication,
    Goals,
    Orders,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SourceKind::Roster => "roster",
            SourceKind::Activity => "activity",
            SourceKind::Communication => "communication",
            SourceKind::Goals => "goals",
            SourceKind::Orders => "orders",
        };
        write!(f, "{}", s)
    }
}

/// Result of one secondary fetch. `Unavailable` is kept distinct from an
/// empty `Loaded` so the aggregator can skip the check instead of treating
/// missing data as "nothing to report".
#[derive(Debug, Clone)]
pub enum SourceOutcome<T> {
    Loaded(Vec<T>),
    Unavailable { source: SourceKind, reason: String },
}

impl<T> SourceOutcome<T> {
    pub fn records(&self) -> Option<&[T]> {
        match self {
            SourceOutcome::Loaded(records) => Some(records),
            SourceOutcome::Unavailable { .. } => None,
        }
    }

    /// The failed source and why, if the fetch did not succeed.
    pub fn failure(&self) -> Option<(SourceKind, &str)> {
        match self {
            SourceOutcome::Loaded(_) => None,
            SourceOutcome::Unavailable { source, reason } => Some((*source, reason.as_str())),
        }
    }
}

/// Active clients of an advisor.
#[async_trait]
pub trait ClientRoster: Send + Sync {
    async fn active_clients(&self, advisor_id: Uuid) -> Result<Vec<ClientRecord>>;
}

#[async_trait]
pub trait ActivityLog: Send + Sync {
    async fn activities(&self, client_ids: &[Uuid]) -> Result<Vec<ContactEvent>>;
}

#[async_trait]
pub trait CommunicationLog: Send + Sync {
    async fn communications(&self, client_ids: &[Uuid]) -> Result<Vec<ContactEvent>>;
}

/// Goals that are not completed.
#[async_trait]
pub trait GoalReader: Send + Sync {
    async fn open_goals(&self, client_ids: &[Uuid]) -> Result<Vec<GoalProgress>>;
}

#[async_trait]
pub trait OrderReader: Send + Sync {
    async fn orders(&self, client_ids: &[Uuid]) -> Result<Vec<OrderRecord>>;
}

/// The full set of readers one aggregator fans out to.
#[derive(Clone)]
pub struct SignalSources {
    pub roster: Arc<dyn ClientRoster>,
    pub activity: Arc<dyn ActivityLog>,
    pub communication: Arc<dyn CommunicationLog>,
    pub goals: Arc<dyn GoalReader>,
    pub orders: Arc<dyn OrderReader>,
}

impl SignalSources {
    /// Use a single backend for every reader.
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: ClientRoster + ActivityLog + CommunicationLog + GoalReader + OrderReader + 'static,
    {
        Self {
            roster: backend.clone(),
            activity: backend.clone(),
            communication: backend.clone(),
            goals: backend.clone(),
            orders: backend,
        }
    }
}
