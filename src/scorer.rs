//! Deterministic priority scorer
//!
//! Rule table that maps a signal profile to a score, a reason, a follow-up
//! and an urgency tier. Pure: no clock, no I/O. It is also the fallback
//! whenever the AI reranker cannot be used, so its output must be stable.

use crate::models::{ClientSignalProfile, RankedClient, SuggestedAction, Urgency};
use std::cmp::Ordering;

/// Most clients returned by any ranking.
pub const MAX_RANKED_CLIENTS: usize = 10;

const MAX_SCORE: u32 = 100;
const KYC_EXPIRED_POINTS: u32 = 40;
const KYC_URGENT_POINTS: u32 = 30;
const KYC_URGENT_DAYS: i64 = 7;
const DORMANT_POINTS: u32 = 35;
const DORMANT_DAYS: i64 = 90;
const STALE_POINTS: u32 = 25;
const STALE_DAYS: i64 = 60;
const PENDING_ORDER_POINTS: u32 = 25;
const GOAL_SHORTFALL_POINTS: u32 = 20;
const GOAL_SHORTFALL_PCT: i64 = 50;
const UPCOMING_EVENT_POINTS: u32 = 15;

/// Score one profile.
pub fn score_profile(profile: &ClientSignalProfile) -> RankedClient {
    let raw = &profile.raw;
    let mut score: u32 = 0;
    let mut reason: Option<&str> = None;
    let mut action: Option<SuggestedAction> = None;
    let mut urgency = Urgency::Medium;

    match raw.kyc_days_until_expiry {
        Some(days) if days < 0 => {
            score += KYC_EXPIRED_POINTS;
            reason = Some("KYC expired");
            action.get_or_insert(SuggestedAction::UpdateKyc);
            urgency = urgency.max(Urgency::Critical);
        }
        Some(days) if days <= KYC_URGENT_DAYS => {
            score += KYC_URGENT_POINTS;
            action.get_or_insert(SuggestedAction::UpdateKyc);
            urgency = urgency.max(Urgency::High);
        }
        _ => {}
    }

    match raw.days_since_contact {
        Some(days) if days > DORMANT_DAYS => {
            score += DORMANT_POINTS;
            urgency = urgency.max(Urgency::High);
        }
        Some(days) if days > STALE_DAYS => score += STALE_POINTS,
        _ => {}
    }

    if raw.pending_orders > 0 {
        score += PENDING_ORDER_POINTS;
        action.get_or_insert(SuggestedAction::ProcessOrders);
        urgency = urgency.max(Urgency::High);
    }

    if raw.goal_shortfall_pct.is_some_and(|pct| pct > GOAL_SHORTFALL_PCT) {
        score += GOAL_SHORTFALL_POINTS;
        action.get_or_insert(SuggestedAction::GoalReviewMeeting);
    }

    if raw.has_upcoming_event {
        score += UPCOMING_EVENT_POINTS;
        action.get_or_insert(SuggestedAction::SendBirthdayWishes);
    }

    let reason = reason
        .map(str::to_string)
        .or_else(|| profile.signals.first().cloned())
        .unwrap_or_default();

    RankedClient {
        client_id: profile.client_id,
        client_name: profile.client_name.clone(),
        total_assets: profile.total_assets,
        priority_score: score.min(MAX_SCORE) as u8,
        reason,
        suggested_action: action.unwrap_or(SuggestedAction::ScheduleCall),
        urgency,
    }
}

/// Score, order and truncate every profile.
pub fn rank_deterministically(profiles: &[ClientSignalProfile]) -> Vec<RankedClient> {
    let mut ranked: Vec<RankedClient> = profiles.iter().map(score_profile).collect();
    sort_ranked(&mut ranked);
    ranked.truncate(MAX_RANKED_CLIENTS);
    ranked
}

/// Score descending, then assets descending, then client id ascending.
pub fn sort_ranked(ranked: &mut [RankedClient]) {
    ranked.sort_by(compare_ranked);
}

pub(crate) fn compare_ranked(a: &RankedClient, b: &RankedClient) -> Ordering {
    b.priority_score
        .cmp(&a.priority_score)
        .then_with(|| b.total_assets.total_cmp(&a.total_assets))
        .then_with(|| a.client_id.cmp(&b.client_id))
}
