// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use crate::id::TrainId;
use chrono::{DateTime, Utc};
use rail_alloc_core::readiness::ReadinessScore;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CleaningStatus {
    #[default]
    Clean,
    NeedsCleaning,
    InProgress,
}

impl Display for CleaningStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CleaningStatus::Clean => write!(f, "CLEAN"),
            CleaningStatus::NeedsCleaning => write!(f, "NEEDS_CLEANING"),
            CleaningStatus::InProgress => write!(f, "IN_PROGRESS"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobCardStatus {
    Open,
    InProgress,
    #[default]
    Closed,
}

impl Display for JobCardStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobCardStatus::Open => write!(f, "OPEN"),
            JobCardStatus::InProgress => write!(f, "IN_PROGRESS"),
            JobCardStatus::Closed => write!(f, "CLOSED"),
        }
    }
}

/// Externally reported readiness facts that override what the train record implies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReadinessSignal {
    pub cleaning_status: Option<CleaningStatus>,
    pub job_card_status: Option<JobCardStatus>,
    pub is_ready: Option<bool>,
}

impl ReadinessSignal {
    pub fn with_cleaning(mut self, status: CleaningStatus) -> Self {
        self.cleaning_status = Some(status);
        self
    }

    pub fn with_job_card(mut self, status: JobCardStatus) -> Self {
        self.job_card_status = Some(status);
        self
    }

    pub fn with_ready(mut self, ready: bool) -> Self {
        self.is_ready = Some(ready);
        self
    }
}

/// Current readiness of one train. Only the latest value is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainReadiness {
    pub id: TrainId,
    pub is_ready: bool,
    pub readiness_score: f64,
    pub cleaning_status: CleaningStatus,
    pub branding_hours: f64,
    /// Total mileage the balance penalty was computed from.
    pub runtime_balance: f64,
    pub job_card_status: JobCardStatus,
    pub last_updated: DateTime<Utc>,
    pub issues: Vec<String>,
}

impl TrainReadiness {
    #[inline]
    pub fn score(&self) -> ReadinessScore {
        ReadinessScore::new(self.readiness_score)
    }

    /// Ready flag set and score at or above `threshold`.
    #[inline]
    pub fn qualifies(&self, threshold: ReadinessScore) -> bool {
        self.is_ready && self.score().meets(threshold)
    }
}

impl Display for TrainReadiness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} ({})",
            self.id,
            self.score(),
            if self.is_ready { "ready" } else { "not ready" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn readiness(score: f64, ready: bool) -> TrainReadiness {
        TrainReadiness {
            id: "T01".into(),
            is_ready: ready,
            readiness_score: score,
            cleaning_status: CleaningStatus::Clean,
            branding_hours: 8.0,
            runtime_balance: 250_000.0,
            job_card_status: JobCardStatus::Closed,
            last_updated: Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap(),
            issues: vec![],
        }
    }

    #[test]
    fn test_qualifies_needs_flag_and_score() {
        let threshold = ReadinessScore::new(70.0);
        assert!(readiness(70.0, true).qualifies(threshold));
        assert!(!readiness(69.9, true).qualifies(threshold));
        assert!(!readiness(95.0, false).qualifies(threshold));
    }

    #[test]
    fn test_display() {
        assert_eq!(readiness(85.0, true).to_string(), "T01: 85.0 (ready)");
    }

    #[test]
    fn test_signal_deserializes_partially() {
        let s: ReadinessSignal = serde_json::from_str(r#"{ "jobCardStatus": "OPEN" }"#).unwrap();
        assert_eq!(s.job_card_status, Some(JobCardStatus::Open));
        assert_eq!(s.cleaning_status, None);
        assert_eq!(s.is_ready, None);
    }
}
