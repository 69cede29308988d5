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

use crate::{
    bay::BayType,
    err::PlanValidationError,
    id::{BayId, PlanId, TrainId},
};
use chrono::{DateTime, Utc};
use rail_alloc_core::position::ShuntingSteps;
use serde::{Deserialize, Serialize};
use std::{
    collections::{HashMap, HashSet},
    fmt::Display,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanMode {
    DailyForecast,
    RealTime,
}

impl Display for PlanMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanMode::DailyForecast => write!(f, "DAILY_FORECAST"),
            PlanMode::RealTime => write!(f, "REAL_TIME"),
        }
    }
}

/// One physical bay and its current occupant, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BayAssignment {
    bay_id: BayId,
    train_id: Option<TrainId>,
    bay_type: BayType,
    assigned_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    departure_time: Option<DateTime<Utc>>,
    reason: String,
}

impl BayAssignment {
    pub fn occupied(
        bay_id: BayId,
        bay_type: BayType,
        train_id: TrainId,
        assigned_at: DateTime<Utc>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            bay_id,
            train_id: Some(train_id),
            bay_type,
            assigned_at,
            departure_time: None,
            reason: reason.into(),
        }
    }

    pub fn available(
        bay_id: BayId,
        bay_type: BayType,
        assigned_at: DateTime<Utc>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            bay_id,
            train_id: None,
            bay_type,
            assigned_at,
            departure_time: None,
            reason: reason.into(),
        }
    }

    pub fn with_departure(mut self, departure: DateTime<Utc>) -> Self {
        self.departure_time = Some(departure);
        self
    }

    #[inline]
    pub fn bay_id(&self) -> &BayId {
        &self.bay_id
    }

    #[inline]
    pub fn train_id(&self) -> Option<&TrainId> {
        self.train_id.as_ref()
    }

    #[inline]
    pub fn bay_type(&self) -> BayType {
        self.bay_type
    }

    #[inline]
    pub fn assigned_at(&self) -> DateTime<Utc> {
        self.assigned_at
    }

    #[inline]
    pub fn departure_time(&self) -> Option<DateTime<Utc>> {
        self.departure_time
    }

    #[inline]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    #[inline]
    pub fn is_occupied(&self) -> bool {
        self.train_id.is_some()
    }

    /// Restamps the bay without changing its occupant.
    pub fn annotate(&mut self, at: DateTime<Utc>, reason: impl Into<String>) {
        self.assigned_at = at;
        self.reason = reason.into();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeKind {
    Assignment,
    Replacement,
    Swap,
}

/// Entry of a plan's append-only audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationChange {
    timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    kind: ChangeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    from_bay: Option<BayId>,
    to_bay: BayId,
    train_id: TrainId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    replaced_train_id: Option<TrainId>,
    reason: String,
    shunting_steps: u32,
}

impl AllocationChange {
    /// A train placed into a bay on a fresh plan.
    pub fn assignment(
        timestamp: DateTime<Utc>,
        to_bay: BayId,
        train_id: TrainId,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            kind: ChangeKind::Assignment,
            from_bay: None,
            to_bay,
            train_id,
            replaced_train_id: None,
            reason: reason.into(),
            shunting_steps: 0,
        }
    }

    /// `train_id` moved from `from_bay` into `to_bay`, displacing `replaced`.
    pub fn replacement(
        timestamp: DateTime<Utc>,
        from_bay: BayId,
        to_bay: BayId,
        train_id: TrainId,
        replaced: TrainId,
        reason: impl Into<String>,
        steps: ShuntingSteps,
    ) -> Self {
        Self {
            timestamp,
            kind: ChangeKind::Replacement,
            from_bay: Some(from_bay),
            to_bay,
            train_id,
            replaced_train_id: Some(replaced),
            reason: reason.into(),
            shunting_steps: steps.value(),
        }
    }

    #[inline]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    #[inline]
    pub fn kind(&self) -> ChangeKind {
        self.kind
    }

    #[inline]
    pub fn from_bay(&self) -> Option<&BayId> {
        self.from_bay.as_ref()
    }

    #[inline]
    pub fn to_bay(&self) -> &BayId {
        &self.to_bay
    }

    #[inline]
    pub fn train_id(&self) -> &TrainId {
        &self.train_id
    }

    #[inline]
    pub fn replaced_train_id(&self) -> Option<&TrainId> {
        self.replaced_train_id.as_ref()
    }

    #[inline]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    #[inline]
    pub fn shunting_steps(&self) -> ShuntingSteps {
        ShuntingSteps::new(self.shunting_steps)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSummary {
    pub primary_bays_occupied: usize,
    pub standby_bays_occupied: usize,
    pub overflow_bays_occupied: usize,
    pub total_shunting_steps: u32,
}

impl PlanSummary {
    #[inline]
    pub fn total_shunting_steps(&self) -> ShuntingSteps {
        ShuntingSteps::new(self.total_shunting_steps)
    }

    #[inline]
    pub fn add_shunting_steps(&mut self, steps: ShuntingSteps) {
        self.total_shunting_steps = self.total_shunting_steps.saturating_add(steps.value());
    }
}

/// Physical layout of trains onto bays plus the history of how it got there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationPlan {
    plan_id: PlanId,
    created_at: DateTime<Utc>,
    mode: PlanMode,
    bays: Vec<BayAssignment>,
    changes: Vec<AllocationChange>,
    summary: PlanSummary,
}

impl AllocationPlan {
    /// Assembles a plan and derives the occupancy counters from `bays`.
    pub fn new(
        plan_id: PlanId,
        created_at: DateTime<Utc>,
        mode: PlanMode,
        bays: Vec<BayAssignment>,
        changes: Vec<AllocationChange>,
    ) -> Self {
        let mut plan = Self {
            plan_id,
            created_at,
            mode,
            bays,
            changes,
            summary: PlanSummary::default(),
        };
        plan.recompute_occupancy();
        plan
    }

    #[inline]
    pub fn plan_id(&self) -> &PlanId {
        &self.plan_id
    }

    #[inline]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[inline]
    pub fn mode(&self) -> PlanMode {
        self.mode
    }

    #[inline]
    pub fn set_mode(&mut self, mode: PlanMode) {
        self.mode = mode;
    }

    #[inline]
    pub fn bays(&self) -> &[BayAssignment] {
        &self.bays
    }

    #[inline]
    pub fn bays_mut(&mut self) -> &mut [BayAssignment] {
        &mut self.bays
    }

    #[inline]
    pub fn changes(&self) -> &[AllocationChange] {
        &self.changes
    }

    #[inline]
    pub fn summary(&self) -> &PlanSummary {
        &self.summary
    }

    #[inline]
    pub fn summary_mut(&mut self) -> &mut PlanSummary {
        &mut self.summary
    }

    pub fn record(&mut self, change: AllocationChange) {
        self.changes.push(change);
    }

    pub fn bay(&self, id: &BayId) -> Option<&BayAssignment> {
        self.bays.iter().find(|b| &b.bay_id == id)
    }

    /// Bay currently holding `train`.
    pub fn bay_of(&self, train: &TrainId) -> Option<&BayAssignment> {
        self.bays.iter().find(|b| b.train_id.as_ref() == Some(train))
    }

    pub fn occupied(&self) -> impl Iterator<Item = &BayAssignment> {
        self.bays.iter().filter(|b| b.is_occupied())
    }

    /// Swaps the occupants of two bays and returns them as `(now_in_a, now_in_b)`.
    /// Reasons and timestamps are left for the caller to set.
    pub fn swap_occupants(&mut self, a: usize, b: usize) -> (Option<&TrainId>, Option<&TrainId>) {
        if a != b {
            let taken = self.bays[a].train_id.take();
            self.bays[a].train_id = self.bays[b].train_id.take();
            self.bays[b].train_id = taken;
        }
        (self.bays[a].train_id.as_ref(), self.bays[b].train_id.as_ref())
    }

    /// Recounts occupied bays per tier; shunting steps are left untouched.
    pub fn recompute_occupancy(&mut self) {
        let mut primary = 0;
        let mut standby = 0;
        let mut overflow = 0;
        for bay in self.bays.iter().filter(|b| b.is_occupied()) {
            match bay.bay_type {
                BayType::Primary => primary += 1,
                BayType::Standby => standby += 1,
                BayType::Overflow => overflow += 1,
            }
        }
        self.summary.primary_bays_occupied = primary;
        self.summary.standby_bays_occupied = standby;
        self.summary.overflow_bays_occupied = overflow;
    }

    /// Checks that bays are unique, no train sits in two bays and every change
    /// refers to a bay of this plan.
    pub fn validate(&self) -> Result<(), PlanValidationError> {
        let mut seen_bays: HashSet<&BayId> = HashSet::with_capacity(self.bays.len());
        let mut occupants: HashMap<&TrainId, &BayId> = HashMap::with_capacity(self.bays.len());
        for bay in &self.bays {
            if !seen_bays.insert(&bay.bay_id) {
                return Err(PlanValidationError::DuplicateBay(bay.bay_id.clone()));
            }
            if let Some(train) = &bay.train_id {
                if let Some(first) = occupants.insert(train, &bay.bay_id) {
                    return Err(PlanValidationError::DuplicateOccupant {
                        train: train.clone(),
                        first: first.clone(),
                        second: bay.bay_id.clone(),
                    });
                }
            }
        }
        for change in &self.changes {
            let referenced = std::iter::once(&change.to_bay).chain(change.from_bay.as_ref());
            for bay in referenced {
                if !seen_bays.contains(bay) {
                    return Err(PlanValidationError::UnknownBay(bay.clone()));
                }
            }
        }
        Ok(())
    }
}

impl Display for AllocationPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Plan({}, mode: {}, bays: {}, changes: {}, shunting steps: {})",
            self.plan_id,
            self.mode,
            self.bays.len(),
            self.changes.len(),
            self.summary.total_shunting_steps
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 22, 0, 0).unwrap()
    }

    fn plan() -> AllocationPlan {
        AllocationPlan::new(
            PlanId::new("DAILY_2025-03-01"),
            at(),
            PlanMode::DailyForecast,
            vec![
                BayAssignment::occupied("A1".into(), BayType::Primary, "T01".into(), at(), "p"),
                BayAssignment::occupied("A2".into(), BayType::Standby, "T02".into(), at(), "s"),
                BayAssignment::available("A3".into(), BayType::Overflow, at(), "free"),
            ],
            vec![AllocationChange::assignment(at(), "A1".into(), "T01".into(), "p")],
        )
    }

    #[test]
    fn test_new_derives_occupancy() {
        let p = plan();
        assert_eq!(p.summary().primary_bays_occupied, 1);
        assert_eq!(p.summary().standby_bays_occupied, 1);
        assert_eq!(p.summary().overflow_bays_occupied, 0);
        assert_eq!(p.summary().total_shunting_steps(), ShuntingSteps::zero());
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_swap_occupants_moves_both_trains() {
        let mut p = plan();
        let (a, b) = p.swap_occupants(0, 1);
        assert_eq!(a.map(TrainId::as_str), Some("T02"));
        assert_eq!(b.map(TrainId::as_str), Some("T01"));
        assert_eq!(p.bay_of(&"T01".into()).map(|b| b.bay_id().as_str()), Some("A2"));
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_swap_with_empty_bay_moves_train() {
        let mut p = plan();
        p.swap_occupants(1, 2);
        p.recompute_occupancy();
        assert!(!p.bays()[1].is_occupied());
        assert_eq!(p.summary().overflow_bays_occupied, 1);
        assert_eq!(p.summary().standby_bays_occupied, 0);
    }

    #[test]
    fn test_validate_rejects_duplicate_occupant() {
        let mut p = plan();
        let bay = &mut p.bays_mut()[2];
        *bay = BayAssignment::occupied(
            bay.bay_id().clone(),
            bay.bay_type(),
            "T01".into(),
            at(),
            "dup",
        );
        assert!(matches!(
            p.validate(),
            Err(PlanValidationError::DuplicateOccupant { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_change_to_unknown_bay() {
        let mut p = plan();
        p.record(AllocationChange::assignment(at(), "Z9".into(), "T09".into(), "x"));
        assert_eq!(p.validate(), Err(PlanValidationError::UnknownBay("Z9".into())));
    }

    #[test]
    fn test_plan_serializes_with_camel_case_and_type_tag() {
        let v = serde_json::to_value(plan()).unwrap();
        assert_eq!(v["mode"], "DAILY_FORECAST");
        assert_eq!(v["bays"][0]["bayId"], "A1");
        assert_eq!(v["bays"][2]["trainId"], serde_json::Value::Null);
        assert_eq!(v["changes"][0]["type"], "ASSIGNMENT");
        assert_eq!(v["summary"]["totalShuntingSteps"], 0);
    }
}
