//! Ranking fingerprints
//!
//! Lets two ranking runs be compared: identical inputs hash identically.

use crate::models::ClientSignalProfile;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::io::Write;
use uuid::Uuid;

#[derive(Serialize)]
struct FingerprintInput<'a> {
    advisor_id: Uuid,
    now: DateTime<Utc>,
    profiles: &'a [ClientSignalProfile],
}

/// Compute SHA256 over the advisor, the ranking time and the aggregated
/// profiles. Streams JSON straight into the hasher.
pub fn ranking_fingerprint(
    advisor_id: Uuid,
    now: DateTime<Utc>,
    profiles: &[ClientSignalProfile],
) -> String {
    let mut hasher = Sha256::new();
    let input = FingerprintInput {
        advisor_id,
        now,
        profiles,
    };

    if serde_json::to_writer(&mut HashWriter(&mut hasher), &input).is_err() {
        return String::new();
    }

    hex::encode(hasher.finalize())
}

/// Adapter to allow writing into Sha256 via std::io::Write
struct HashWriter<'a, H: Digest>(&'a mut H);

impl<'a, H: Digest> Write for HashWriter<'a, H> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
