//! In-memory CRM snapshot
//!
//! Serves every reader from fixed vectors. Used in development and tests.

use super::{ActivityLog, ClientRoster, CommunicationLog, GoalReader, OrderReader};
use crate::models::{ClientRecord, ContactEvent, GoalProgress, OrderRecord};
use crate::Result;
use std::collections::HashMap;
use uuid::Uuid;

/// In-memory snapshot keyed by advisor
#[derive(Debug, Clone, Default)]
pub struct InMemoryCrm {
    rosters: HashMap<Uuid, Vec<ClientRecord>>,
    activities: Vec<ContactEvent>,
    communications: Vec<ContactEvent>,
    goals: Vec<GoalProgress>,
    orders: Vec<OrderRecord>,
}

impl InMemoryCrm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(mut self, advisor_id: Uuid, client: ClientRecord) -> Self {
        self.rosters.entry(advisor_id).or_default().push(client);
        self
    }

    pub fn with_activity(mut self, event: ContactEvent) -> Self {
        self.activities.push(event);
        self
    }

    pub fn with_communication(mut self, event: ContactEvent) -> Self {
        self.communications.push(event);
        self
    }

    pub fn with_goal(mut self, goal: GoalProgress) -> Self {
        self.goals.push(goal);
        self
    }

    pub fn with_order(mut self, order: OrderRecord) -> Self {
        self.orders.push(order);
        self
    }
}

fn scoped<T: Clone>(records: &[T], client_ids: &[Uuid], key: impl Fn(&T) -> Uuid) -> Vec<T> {
    records
        .iter()
        .filter(|record| client_ids.contains(&key(record)))
        .cloned()
        .collect()
}

#[async_trait::async_trait]
impl ClientRoster for InMemoryCrm {
    async fn active_clients(&self, advisor_id: Uuid) -> Result<Vec<ClientRecord>> {
        Ok(self.rosters.get(&advisor_id).cloned().unwrap_or_default())
    }
}

#[async_trait::async_trait]
impl ActivityLog for InMemoryCrm {
    async fn activities(&self, client_ids: &[Uuid]) -> Result<Vec<ContactEvent>> {
        Ok(scoped(&self.activities, client_ids, |e| e.client_id))
    }
}

#[async_trait::async_trait]
impl CommunicationLog for InMemoryCrm {
    async fn communications(&self, client_ids: &[Uuid]) -> Result<Vec<ContactEvent>> {
        Ok(scoped(&self.communications, client_ids, |e| e.client_id))
    }
}

#[async_trait::async_trait]
impl GoalReader for InMemoryCrm {
    async fn open_goals(&self, client_ids: &[Uuid]) -> Result<Vec<GoalProgress>> {
        let mut goals = scoped(&self.goals, client_ids, |g| g.client_id);
        goals.retain(|g| !g.is_completed());
        Ok(goals)
    }
}

#[async_trait::async_trait]
impl OrderReader for InMemoryCrm {
    async fn orders(&self, client_ids: &[Uuid]) -> Result<Vec<OrderRecord>> {
        Ok(scoped(&self.orders, client_ids, |o| o.client_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_readers_scope_to_requested_clients() {
        let advisor = Uuid::new_v4();
        let mine = Uuid::new_v4();
        let other = Uuid::new_v4();

        let crm = InMemoryCrm::new()
            .with_client(
                advisor,
                ClientRecord {
                    id: mine,
                    name: "Mine".to_string(),
                    total_assets: None,
                    kyc_expiry_date: None,
                    date_of_birth: None,
                },
            )
            .with_order(OrderRecord { client_id: mine, status: "pending".to_string() })
            .with_order(OrderRecord { client_id: other, status: "pending".to_string() })
            .with_goal(GoalProgress {
                client_id: mine,
                current_amount: 10.0,
                target_amount: 100.0,
                status: "completed".to_string(),
            });

        assert_eq!(crm.active_clients(advisor).await.unwrap().len(), 1);
        assert!(crm.active_clients(Uuid::new_v4()).await.unwrap().is_empty());
        assert_eq!(crm.orders(&[mine]).await.unwrap().len(), 1);
        assert!(crm.open_goals(&[mine]).await.unwrap().is_empty());
    }
}
