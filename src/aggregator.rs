//! Signal aggregation
//!
//! Fetches the roster, fans out to the secondary readers concurrently and
//! reduces everything to one `ClientSignalProfile` per client that needs
//! attention. A failing secondary reader only disables its own check.

use crate::error::RankingError;
use crate::models::{
    ClientRecord, ClientSignalProfile, ContactEvent, GoalProgress, OrderRecord, RawSignals,
    NEVER_CONTACTED_DAYS,
};
use crate::sources::{SignalSources, SourceKind, SourceOutcome};
use crate::Result;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

const STALE_CONTACT_DAYS: i64 = 60;
const OVERDUE_CONTACT_DAYS: i64 = 30;
const KYC_URGENT_DAYS: i64 = 7;
const KYC_SOON_DAYS: i64 = 30;
const GOAL_BEHIND_PCT: f64 = 50.0;
const BIRTHDAY_WINDOW_DAYS: i64 = 7;

/// Profiles plus the sources that could not be read.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    pub profiles: Vec<ClientSignalProfile>,
    pub unavailable: Vec<SourceKind>,
}

pub struct SignalAggregator {
    sources: SignalSources,
    source_timeout: Duration,
}

impl SignalAggregator {
    pub fn new(sources: SignalSources, source_timeout: Duration) -> Self {
        Self {
            sources,
            source_timeout,
        }
    }

    /// Build the signal profiles for every active client of `advisor_id`.
    ///
    /// Fails only when the roster itself cannot be read.
    pub async fn aggregate(&self, advisor_id: Uuid, now: DateTime<Utc>) -> Result<Aggregation> {
        let roster = self
            .sources
            .roster
            .active_clients(advisor_id)
            .await
            .map_err(|e| RankingError::Roster(e.to_string()))?;

        if roster.is_empty() {
            info!(advisor_id = %advisor_id, "Advisor has no active clients");
            return Ok(Aggregation::default());
        }

        let client_ids: Vec<Uuid> = roster.iter().map(|c| c.id).collect();
        let limit = self.source_timeout;

        let (activity, communication, goals, orders) = tokio::join!(
            fetch(
                SourceKind::Activity,
                limit,
                self.sources.activity.activities(&client_ids)
            ),
            fetch(
                SourceKind::Communication,
                limit,
                self.sources.communication.communications(&client_ids)
            ),
            fetch(
                SourceKind::Goals,
                limit,
                self.sources.goals.open_goals(&client_ids)
            ),
            fetch(
                SourceKind::Orders,
                limit,
                self.sources.orders.orders(&client_ids)
            ),
        );

        let unavailable: Vec<SourceKind> = [
            activity.failure(),
            communication.failure(),
            goals.failure(),
            orders.failure(),
        ]
        .into_iter()
        .flatten()
        .map(|(kind, reason)| {
            debug!(source = %kind, reason, "Check disabled for this request");
            kind
        })
        .collect();

        let facts = ClientFacts::index(&activity, &communication, &goals, &orders);

        let profiles: Vec<ClientSignalProfile> = roster
            .iter()
            .filter_map(|client| evaluate_client(client, &facts, now))
            .collect();

        info!(
            advisor_id = %advisor_id,
            client_count = roster.len(),
            profile_count = profiles.len(),
            unavailable = ?unavailable,
            "Signal aggregation completed"
        );

        Ok(Aggregation {
            profiles,
            unavailable,
        })
    }
}

/// Run one secondary reader under its own timeout.
async fn fetch<T, F>(kind: SourceKind, limit: Duration, call: F) -> SourceOutcome<T>
where
    F: Future<Output = Result<Vec<T>>>,
{
    match timeout(limit, call).await {
        Ok(Ok(records)) => {
            if records.is_empty() {
                debug!(source = %kind, "Source returned no records");
            } else {
                debug!(source = %kind, count = records.len(), "Source loaded");
            }
            SourceOutcome::Loaded(records)
        }
        Ok(Err(e)) => {
            warn!(source = %kind, error = %e, "Source unavailable, skipping its checks");
            SourceOutcome::Unavailable {
                source: kind,
                reason: e.to_string(),
            }
        }
        Err(_) => {
            let e = RankingError::SourceTimeout(kind);
            warn!(
                source = %kind,
                timeout_ms = limit.as_millis() as u64,
                "Source timed out, skipping its checks"
            );
            SourceOutcome::Unavailable {
                source: kind,
                reason: e.to_string(),
            }
        }
    }
}

enum LastContact {
    /// Neither contact source could be read.
    Unknown,
    Never,
    At(DateTime<Utc>),
}

/// Secondary facts joined by client id. `None` maps mean the source was
/// unavailable.
struct ClientFacts<'a> {
    last_activity: Option<HashMap<Uuid, DateTime<Utc>>>,
    last_communication: Option<HashMap<Uuid, DateTime<Utc>>>,
    goals: Option<HashMap<Uuid, Vec<&'a GoalProgress>>>,
    pending_orders: Option<HashMap<Uuid, u32>>,
}

impl<'a> ClientFacts<'a> {
    fn index(
        activity: &SourceOutcome<ContactEvent>,
        communication: &SourceOutcome<ContactEvent>,
        goals: &'a SourceOutcome<GoalProgress>,
        orders: &SourceOutcome<OrderRecord>,
    ) -> Self {
        Self {
            last_activity: activity.records().map(latest_by_client),
            last_communication: communication.records().map(latest_by_client),
            goals: goals.records().map(|records| {
                let mut by_client: HashMap<Uuid, Vec<&GoalProgress>> = HashMap::new();
                for goal in records.iter().filter(|g| !g.is_completed()) {
                    by_client.entry(goal.client_id).or_default().push(goal);
                }
                by_client
            }),
            pending_orders: orders.records().map(|records| {
                let mut counts: HashMap<Uuid, u32> = HashMap::new();
                for order in records.iter().filter(|o| o.is_pending()) {
                    *counts.entry(order.client_id).or_insert(0) += 1;
                }
                counts
            }),
        }
    }

    fn last_contact(&self, client_id: Uuid) -> LastContact {
        if self.last_activity.is_none() && self.last_communication.is_none() {
            return LastContact::Unknown;
        }

        let latest = [&self.last_activity, &self.last_communication]
            .into_iter()
            .filter_map(|source| source.as_ref()?.get(&client_id).copied())
            .max();

        match latest {
            Some(at) => LastContact::At(at),
            None => LastContact::Never,
        }
    }
}

fn latest_by_client(events: &[ContactEvent]) -> HashMap<Uuid, DateTime<Utc>> {
    let mut latest: HashMap<Uuid, DateTime<Utc>> = HashMap::new();
    for event in events {
        latest
            .entry(event.client_id)
            .and_modify(|at| *at = (*at).max(event.timestamp))
            .or_insert(event.timestamp);
    }
    latest
}

/// Evaluate the checks for one client in their fixed order. Returns `None`
/// when nothing about the client needs attention.
fn evaluate_client(
    client: &ClientRecord,
    facts: &ClientFacts<'_>,
    now: DateTime<Utc>,
) -> Option<ClientSignalProfile> {
    let today = now.date_naive();
    let mut signals = Vec::new();
    let mut raw = RawSignals::default();

    // a. contact recency
    match facts.last_contact(client.id) {
        LastContact::Unknown => {}
        LastContact::Never => {
            signals.push("Never contacted".to_string());
            raw.days_since_contact = Some(NEVER_CONTACTED_DAYS);
        }
        LastContact::At(at) => {
            let days = (now - at).num_days().max(0);
            if days > STALE_CONTACT_DAYS {
                signals.push(format!("No contact in {} days", days));
            } else if days > OVERDUE_CONTACT_DAYS {
                signals.push(format!("Last contact {} days ago", days));
            }
            raw.days_since_contact = Some(days);
        }
    }

    // b. KYC expiry
    if let Some(expiry) = client.kyc_expiry_date {
        let days_until = (expiry - today).num_days();
        if days_until < 0 {
            signals.push("KYC expired".to_string());
        } else if days_until <= KYC_URGENT_DAYS {
            signals.push(format!("KYC expires in {} days", days_until));
        } else if days_until <= KYC_SOON_DAYS {
            signals.push("KYC expiring soon".to_string());
        }
        raw.kyc_days_until_expiry = Some(days_until);
    }

    // c. goal shortfall
    if let Some(goals) = facts.goals.as_ref().and_then(|g| g.get(&client.id)) {
        let (shortfall, behind) = goal_shortfall(goals);
        if behind {
            if let Some(pct) = shortfall {
                signals.push(format!("Goal {}% behind target", pct));
            }
        }
        raw.goal_shortfall_pct = shortfall;
    }

    // d. pending orders
    if let Some(counts) = facts.pending_orders.as_ref() {
        let pending = counts.get(&client.id).copied().unwrap_or(0);
        if pending == 1 {
            signals.push("1 pending order".to_string());
        } else if pending > 1 {
            signals.push(format!("{} pending orders", pending));
        }
        raw.pending_orders = pending;
    }

    // e. upcoming birthday
    if let Some(days) = client
        .date_of_birth
        .and_then(|dob| days_until_birthday(dob, today))
        .filter(|days| *days <= BIRTHDAY_WINDOW_DAYS)
    {
        if days == 0 {
            signals.push("Birthday today!".to_string());
        } else {
            signals.push(format!("Birthday in {} days", days));
        }
        raw.has_upcoming_event = true;
    }

    if signals.is_empty() {
        return None;
    }

    Some(ClientSignalProfile {
        client_id: client.id,
        client_name: client.name.clone(),
        total_assets: client.total_assets.unwrap_or(0.0),
        signals,
        raw,
    })
}

/// Shortfall of the first goal under half funded, or of the first eligible
/// goal when none is behind. The flag reports whether a goal was behind.
fn goal_shortfall(goals: &[&GoalProgress]) -> (Option<i64>, bool) {
    let mut first_eligible = None;

    for goal in goals.iter().filter(|g| g.target_amount > 0.0) {
        let progress = goal.current_amount / goal.target_amount * 100.0;
        let shortfall = (100.0 - progress).round() as i64;

        if progress < GOAL_BEHIND_PCT {
            return (Some(shortfall), true);
        }
        first_eligible.get_or_insert(shortfall);
    }

    (first_eligible, false)
}

/// Days until the birthday's occurrence in the current year. `None` once it
/// has passed this year, or for Feb 29 outside leap years.
fn days_until_birthday(date_of_birth: NaiveDate, today: NaiveDate) -> Option<i64> {
    let this_year =
        NaiveDate::from_ymd_opt(today.year(), date_of_birth.month(), date_of_birth.day())?;
    let days = (this_year - today).num_days();
    (days >= 0).then_some(days)
}
