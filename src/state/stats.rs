// src/state/stats.rs
use serde::{Deserialize, Serialize};

use crate::model::{ApplicationRecord, ApplicationStatus};

/// Counts of cached applications by status. Pure function of the local
/// cache, recomputed on demand; the field names match the wire shape
/// the dashboard-insights endpoint accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusCounts {
    pub applied: u32,
    pub interview: u32,
    pub accepted: u32,
    pub rejected: u32,
}

impl StatusCounts {
    /// Tally recognized statuses. Records whose status is unknown are
    /// not counted anywhere.
    pub fn count(records: &[ApplicationRecord]) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for record in records {
            match record.status {
                Some(ApplicationStatus::Applied) => counts.applied += 1,
                Some(ApplicationStatus::Interview) => counts.interview += 1,
                Some(ApplicationStatus::Accepted) => counts.accepted += 1,
                Some(ApplicationStatus::Rejected) => counts.rejected += 1,
                None => {}
            }
        }
        counts
    }

    pub fn total(&self) -> u32 {
        self.applied + self.interview + self.accepted + self.rejected
    }

    /// Accepted share of all counted applications, rounded percentage.
    pub fn success_rate(&self) -> u32 {
        percentage(self.accepted, self.total())
    }

    /// Interview count relative to the applied count, rounded
    /// percentage.
    pub fn interview_rate(&self) -> u32 {
        percentage(self.interview, self.applied)
    }
}

/// `round(100 * numerator / denominator)`, 0 for a 0 denominator.
fn percentage(numerator: u32, denominator: u32) -> u32 {
    if denominator == 0 {
        return 0;
    }
    (100.0 * f64::from(numerator) / f64::from(denominator)).round() as u32
}
