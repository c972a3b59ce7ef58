//! Core data models for the priority engine

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use uuid::Uuid;

/// Sentinel for `days_since_contact` when a client has no recorded contact.
pub const NEVER_CONTACTED_DAYS: i64 = 999;

//
// ================= Enums =================
//

/// Urgency tier of a ranked client. Ordered `Critical > High > Medium`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Medium,
    High,
    Critical,
}

impl Urgency {
    fn rank(&self) -> u8 {
        match self {
            Urgency::Medium => 1,
            Urgency::High => 2,
            Urgency::Critical => 3,
        }
    }

    /// Lenient parse used for untrusted model output.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "critical" => Some(Urgency::Critical),
            "high" => Some(Urgency::High),
            "medium" => Some(Urgency::Medium),
            _ => None,
        }
    }
}

impl PartialOrd for Urgency {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Urgency {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Urgency::Medium => "medium",
            Urgency::High => "high",
            Urgency::Critical => "critical",
        };
        write!(f, "{}", s)
    }
}

/// The fixed set of follow-ups an advisor can be pointed to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SuggestedAction {
    #[serde(rename = "Update KYC")]
    UpdateKyc,
    #[serde(rename = "Process orders")]
    ProcessOrders,
    #[serde(rename = "Goal review meeting")]
    GoalReviewMeeting,
    #[serde(rename = "Send birthday wishes")]
    SendBirthdayWishes,
    #[serde(rename = "Schedule call")]
    ScheduleCall,
}

impl SuggestedAction {
    pub const ALL: [SuggestedAction; 5] = [
        SuggestedAction::UpdateKyc,
        SuggestedAction::ProcessOrders,
        SuggestedAction::GoalReviewMeeting,
        SuggestedAction::SendBirthdayWishes,
        SuggestedAction::ScheduleCall,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SuggestedAction::UpdateKyc => "Update KYC",
            SuggestedAction::ProcessOrders => "Process orders",
            SuggestedAction::GoalReviewMeeting => "Goal review meeting",
            SuggestedAction::SendBirthdayWishes => "Send birthday wishes",
            SuggestedAction::ScheduleCall => "Schedule call",
        }
    }

    /// Case-insensitive match against the display labels.
    pub fn from_label(label: &str) -> Option<Self> {
        let wanted = label.trim();
        Self::ALL
            .into_iter()
            .find(|action| action.label().eq_ignore_ascii_case(wanted))
    }
}

impl fmt::Display for SuggestedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

//
// ================= Source Facts =================
//

/// Active client as returned by the roster reader.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientRecord {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub total_assets: Option<f64>,
    #[serde(default)]
    pub kyc_expiry_date: Option<NaiveDate>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
}

/// A timestamped touchpoint from the activity or communication log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContactEvent {
    pub client_id: Uuid,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GoalProgress {
    pub client_id: Uuid,
    pub current_amount: f64,
    pub target_amount: f64,
    pub status: String,
}

impl GoalProgress {
    pub fn is_completed(&self) -> bool {
        self.status.eq_ignore_ascii_case("completed")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderRecord {
    pub client_id: Uuid,
    pub status: String,
}

impl OrderRecord {
    pub fn is_pending(&self) -> bool {
        self.status.eq_ignore_ascii_case("pending")
    }
}

//
// ================= Profile =================
//

/// Numeric facts behind a profile's signal strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawSignals {
    /// `NEVER_CONTACTED_DAYS` when no contact exists; `None` when neither
    /// contact source could be read.
    pub days_since_contact: Option<i64>,
    /// Negative once expired.
    pub kyc_days_until_expiry: Option<i64>,
    pub goal_shortfall_pct: Option<i64>,
    pub pending_orders: u32,
    pub has_upcoming_event: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientSignalProfile {
    pub client_id: Uuid,
    pub client_name: String,
    pub total_assets: f64,
    pub signals: Vec<String>,
    pub raw: RawSignals,
}

//
// ================= Output =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankedClient {
    #[serde(rename = "id")]
    pub client_id: Uuid,
    pub client_name: String,
    pub total_assets: f64,
    pub priority_score: u8,
    pub reason: String,
    pub suggested_action: SuggestedAction,
    pub urgency: Urgency,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PrioritizedClients {
    pub prioritized_clients: Vec<RankedClient>,
}

impl PrioritizedClients {
    pub fn is_empty(&self) -> bool {
        self.prioritized_clients.is_empty()
    }

    pub fn len(&self) -> usize {
        self.prioritized_clients.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urgency_ordering() {
        assert!(Urgency::Critical > Urgency::High);
        assert!(Urgency::High > Urgency::Medium);
        assert_eq!(Urgency::Medium.max(Urgency::High), Urgency::High);
    }

    #[test]
    fn test_ranked_client_wire_shape() {
        let client = RankedClient {
            client_id: Uuid::nil(),
            client_name: "Asha Rao".to_string(),
            total_assets: 1_234_567.0,
            priority_score: 85,
            reason: "KYC expired".to_string(),
            suggested_action: SuggestedAction::UpdateKyc,
            urgency: Urgency::Critical,
        };

        let json = serde_json::to_value(PrioritizedClients {
            prioritized_clients: vec![client],
        })
        .unwrap();

        let entry = &json["prioritized_clients"][0];
        assert_eq!(entry["id"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(entry["suggested_action"], "Update KYC");
        assert_eq!(entry["urgency"], "critical");
        assert_eq!(entry["priority_score"], 85);
    }

    #[test]
    fn test_action_labels_parse_leniently() {
        assert_eq!(
            SuggestedAction::from_label(" process ORDERS "),
            Some(SuggestedAction::ProcessOrders)
        );
        assert_eq!(SuggestedAction::from_label("Call the client"), None);
        assert_eq!(Urgency::from_label("HIGH"), Some(Urgency::High));
        assert_eq!(Urgency::from_label("urgent"), None);
    }
}
