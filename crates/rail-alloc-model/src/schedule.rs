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

use crate::{id::TrainId, train::Train};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Daily operational role of a train.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Assignment {
    InService,
    Standby,
    /// Inspection bay line.
    Ibl,
    Workshop,
}

impl Assignment {
    /// Sort rank of the role in a schedule, lowest first.
    #[inline]
    pub const fn priority(self) -> u8 {
        match self {
            Assignment::InService => 0,
            Assignment::Standby => 1,
            Assignment::Ibl => 2,
            Assignment::Workshop => 3,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Assignment::InService => "IN_SERVICE",
            Assignment::Standby => "STANDBY",
            Assignment::Ibl => "IBL",
            Assignment::Workshop => "WORKSHOP",
        }
    }
}

impl Display for Assignment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleResult {
    id: TrainId,
    assignment: Assignment,
    reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    slot: Option<u32>,
    train: Train,
}

impl ScheduleResult {
    /// A result decided by a hard constraint, without a score.
    pub fn constrained(train: &Train, assignment: Assignment, reason: impl Into<String>) -> Self {
        Self {
            id: train.id().clone(),
            assignment,
            reason: reason.into(),
            score: None,
            slot: None,
            train: train.clone(),
        }
    }

    pub fn scored(
        train: &Train,
        assignment: Assignment,
        reason: impl Into<String>,
        score: f64,
        slot: Option<u32>,
    ) -> Self {
        Self {
            id: train.id().clone(),
            assignment,
            reason: reason.into(),
            score: Some(score),
            slot,
            train: train.clone(),
        }
    }

    #[inline]
    pub fn id(&self) -> &TrainId {
        &self.id
    }

    #[inline]
    pub fn assignment(&self) -> Assignment {
        self.assignment
    }

    #[inline]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    #[inline]
    pub fn score(&self) -> Option<f64> {
        self.score
    }

    /// Departure sequence number, set for in-service trains only.
    #[inline]
    pub fn slot(&self) -> Option<u32> {
        self.slot
    }

    #[inline]
    pub fn train(&self) -> &Train {
        &self.train
    }
}

impl Display for ScheduleResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {} ({})", self.id, self.assignment, self.reason)
    }
}

/// Result counts per role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSummary {
    pub in_service: usize,
    pub standby: usize,
    pub ibl: usize,
    pub workshop: usize,
}

impl ScheduleSummary {
    pub fn from_results<'a>(results: impl IntoIterator<Item = &'a ScheduleResult>) -> Self {
        let mut summary = Self::default();
        for r in results {
            summary.record(r.assignment());
        }
        summary
    }

    #[inline]
    pub fn record(&mut self, assignment: Assignment) {
        match assignment {
            Assignment::InService => self.in_service += 1,
            Assignment::Standby => self.standby += 1,
            Assignment::Ibl => self.ibl += 1,
            Assignment::Workshop => self.workshop += 1,
        }
    }

    #[inline]
    pub fn total(&self) -> usize {
        self.in_service + self.standby + self.ibl + self.workshop
    }

    #[inline]
    pub fn count(&self, assignment: Assignment) -> usize {
        match assignment {
            Assignment::InService => self.in_service,
            Assignment::Standby => self.standby,
            Assignment::Ibl => self.ibl,
            Assignment::Workshop => self.workshop,
        }
    }
}

impl Display for ScheduleSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "in service: {}, standby: {}, IBL: {}, workshop: {}",
            self.in_service, self.standby, self.ibl, self.workshop
        )
    }
}

/// Observations about a schedule that do not alter any assignment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleDiagnostics {
    /// Missing in-service trains against the required count.
    pub in_service_shortfall: usize,
    /// Missing standby trains against the minimum reserve.
    pub reserve_shortfall: usize,
    /// Trains kept in the yard beyond the number of stabling slots.
    pub stabling_overflow: usize,
    /// Trains in state OK whose total mileage passed the IOH threshold.
    pub ioh_due: Vec<TrainId>,
    /// Trains in state OK whose total mileage passed the POH threshold.
    pub poh_due: Vec<TrainId>,
    /// `W_SHORT_IN_SERVICE` times the in-service shortfall.
    pub shortfall_penalty: f64,
}

impl ScheduleDiagnostics {
    /// True when nothing in the schedule needs a planner's attention.
    pub fn is_clean(&self) -> bool {
        self.in_service_shortfall == 0
            && self.reserve_shortfall == 0
            && self.stabling_overflow == 0
            && self.ioh_due.is_empty()
            && self.poh_due.is_empty()
    }
}

/// Output of one scheduling run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    results: Vec<ScheduleResult>,
    summary: ScheduleSummary,
    #[serde(default)]
    diagnostics: ScheduleDiagnostics,
}

impl Schedule {
    /// Builds a schedule, deriving the summary from `results`.
    pub fn new(results: Vec<ScheduleResult>, diagnostics: ScheduleDiagnostics) -> Self {
        let summary = ScheduleSummary::from_results(&results);
        Self {
            results,
            summary,
            diagnostics,
        }
    }

    #[inline]
    pub fn empty() -> Self {
        Self::default()
    }

    #[inline]
    pub fn results(&self) -> &[ScheduleResult] {
        &self.results
    }

    #[inline]
    pub fn into_results(self) -> Vec<ScheduleResult> {
        self.results
    }

    #[inline]
    pub fn summary(&self) -> &ScheduleSummary {
        &self.summary
    }

    #[inline]
    pub fn diagnostics(&self) -> &ScheduleDiagnostics {
        &self.diagnostics
    }

    pub fn get(&self, id: &TrainId) -> Option<&ScheduleResult> {
        self.results.iter().find(|r| r.id() == id)
    }

    pub fn with_assignment(&self, assignment: Assignment) -> impl Iterator<Item = &ScheduleResult> {
        self.results
            .iter()
            .filter(move |r| r.assignment() == assignment)
    }
}
