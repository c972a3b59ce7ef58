//! Validation of model rankings
//!
//! Converts loosely-typed model output into `RankedClient`s. Lenient on
//! the prose around the array, strict on what goes into each entry.

use crate::error::RankingError;
use crate::models::{ClientSignalProfile, RankedClient, Urgency};
use crate::scorer::{score_profile, sort_ranked, MAX_RANKED_CLIENTS};
use crate::Result;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use tracing::debug;
use uuid::Uuid;

const MAX_REASON_WORDS: usize = 10;

/// Locate the first balanced JSON array in `text` that parses.
pub fn extract_json_array(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let mut search_from = 0;

    while let Some(offset) = text[search_from..].find('[') {
        let start = search_from + offset;

        if let Some(end) = matching_bracket(bytes, start) {
            let candidate = &text[start..=end];
            let is_array = serde_json::from_str::<Value>(candidate)
                .map(|v| v.is_array())
                .unwrap_or(false);
            if is_array {
                return Some(candidate);
            }
        }

        search_from = start + 1;
    }

    None
}

/// Index of the `]` closing the `[` at `start`, skipping string contents.
fn matching_bracket(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }

        match b {
            b'"' => in_string = true,
            b'[' => depth += 1,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }

    None
}

/// Validate a raw model reply against the profiles it was asked to rank.
///
/// Unknown or malformed entries are dropped, scores are clamped, bad
/// urgencies become `medium` and bad actions fall back to the rule-based
/// action. An empty result is an error.
pub fn validate_ai_ranking(
    response: &str,
    profiles: &[ClientSignalProfile],
) -> Result<Vec<RankedClient>> {
    let array_text = extract_json_array(response).ok_or_else(|| {
        RankingError::InvalidAiResponse("no JSON array found in model reply".to_string())
    })?;

    let entries: Vec<Value> = serde_json::from_str(array_text)?;

    let by_id: HashMap<Uuid, &ClientSignalProfile> =
        profiles.iter().map(|p| (p.client_id, p)).collect();
    let mut seen: HashSet<Uuid> = HashSet::new();
    let mut ranked = Vec::with_capacity(entries.len());

    for entry in &entries {
        let Some(object) = entry.as_object() else {
            debug!("Dropping non-object ranking entry");
            continue;
        };

        let Some(client_id) = object
            .get("client_id")
            .and_then(Value::as_str)
            .and_then(|s| Uuid::parse_str(s.trim()).ok())
        else {
            debug!("Dropping ranking entry without a valid client_id");
            continue;
        };

        let Some(profile) = by_id.get(&client_id) else {
            debug!(%client_id, "Dropping ranking entry for unknown client");
            continue;
        };

        let Some(priority_score) = object.get("priority_score").and_then(parse_score) else {
            debug!(%client_id, "Dropping ranking entry with non-numeric score");
            continue;
        };

        // Only usable entries claim the client id.
        if !seen.insert(client_id) {
            debug!(%client_id, "Dropping duplicate ranking entry");
            continue;
        }

        let urgency = object
            .get("urgency")
            .and_then(Value::as_str)
            .and_then(Urgency::from_label)
            .unwrap_or(Urgency::Medium);

        let suggested_action = object
            .get("suggested_action")
            .and_then(Value::as_str)
            .and_then(crate::models::SuggestedAction::from_label)
            .unwrap_or_else(|| score_profile(profile).suggested_action);

        let reason = object
            .get("reason")
            .and_then(Value::as_str)
            .map(limit_words)
            .filter(|r| !r.is_empty())
            .or_else(|| profile.signals.first().cloned())
            .unwrap_or_default();

        ranked.push(RankedClient {
            client_id,
            client_name: profile.client_name.clone(),
            total_assets: profile.total_assets,
            priority_score,
            reason,
            suggested_action,
            urgency,
        });
    }

    if ranked.is_empty() {
        return Err(RankingError::EmptyAiRanking);
    }

    sort_ranked(&mut ranked);
    ranked.truncate(MAX_RANKED_CLIENTS);

    Ok(ranked)
}

fn parse_score(value: &Value) -> Option<u8> {
    let n = value.as_f64().filter(|n| n.is_finite())?;
    Some(n.round().clamp(0.0, 100.0) as u8)
}

fn limit_words(text: &str) -> String {
    text.split_whitespace()
        .take(MAX_REASON_WORDS)
        .collect::<Vec<_>>()
        .join(" ")
}
