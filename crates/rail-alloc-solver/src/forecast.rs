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

use crate::clock::{Clock, SystemClock};
use rail_alloc_model::prelude::*;
use std::cmp::Ordering;
use tracing::{debug, info, instrument};

/// Builds the overnight bay layout from a schedule.
///
/// Primary bays take in-service trains in slot order, standby bays take the
/// standby trains best score first, and in-service trains beyond primary
/// capacity spill into the overflow bays. Trains that fit nowhere are left out
/// of the plan.
#[derive(Debug, Clone)]
pub struct BayPlanner<C = SystemClock> {
    layout: BayConfiguration,
    params: ForecastParameters,
    clock: C,
}

impl Default for BayPlanner<SystemClock> {
    fn default() -> Self {
        Self::new(
            BayConfiguration::default(),
            ForecastParameters::default(),
            SystemClock,
        )
    }
}

fn by_slot(a: &&ScheduleResult, b: &&ScheduleResult) -> Ordering {
    a.slot()
        .unwrap_or(0)
        .cmp(&b.slot().unwrap_or(0))
        .then_with(|| a.id().cmp(b.id()))
}

fn by_score_desc(a: &&ScheduleResult, b: &&ScheduleResult) -> Ordering {
    match (a.score(), b.score()) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.id().cmp(b.id()))
}

impl<C: Clock> BayPlanner<C> {
    #[inline]
    pub fn new(layout: BayConfiguration, params: ForecastParameters, clock: C) -> Self {
        Self {
            layout,
            params,
            clock,
        }
    }

    #[inline]
    pub fn layout(&self) -> &BayConfiguration {
        &self.layout
    }

    #[inline]
    pub fn params(&self) -> &ForecastParameters {
        &self.params
    }

    #[instrument(
        level = "info",
        skip_all,
        fields(results = results.len(), bays = self.layout.len())
    )]
    pub fn generate_daily_forecast(&self, results: &[ScheduleResult]) -> AllocationPlan {
        let now = self.clock.now();

        let mut in_service: Vec<&ScheduleResult> = results
            .iter()
            .filter(|r| r.assignment() == Assignment::InService)
            .collect();
        in_service.sort_by(by_slot);
        let mut standby: Vec<&ScheduleResult> = results
            .iter()
            .filter(|r| r.assignment() == Assignment::Standby)
            .collect();
        standby.sort_by(by_score_desc);

        let primary_count = self.layout.iter_tier(BayType::Primary).count();
        let overflow_trains = in_service.get(primary_count..).unwrap_or_default();

        let mut bays = Vec::with_capacity(self.layout.len());
        let mut changes = Vec::new();

        for (i, def) in self.layout.iter_tier(BayType::Primary).enumerate() {
            let bay = match in_service.get(i) {
                Some(r) => {
                    let slot = r.slot().map_or_else(|| "?".to_owned(), |s| s.to_string());
                    changes.push(AllocationChange::assignment(
                        now,
                        def.id().clone(),
                        r.id().clone(),
                        "Daily forecast: Primary bay assignment",
                    ));
                    BayAssignment::occupied(
                        def.id().clone(),
                        BayType::Primary,
                        r.id().clone(),
                        now,
                        format!("Primary bay assignment for slot {slot} departure"),
                    )
                    .with_departure(now + self.params.primary_departure(i))
                }
                None => BayAssignment::available(
                    def.id().clone(),
                    BayType::Primary,
                    now,
                    "Available primary bay",
                ),
            };
            bays.push(bay);
        }

        for (i, def) in self.layout.iter_tier(BayType::Standby).enumerate() {
            let bay = match standby.get(i) {
                Some(r) => {
                    let reason = match r.score() {
                        Some(s) => format!("Standby backup with score {s:.1}"),
                        None => "Standby backup without score".to_owned(),
                    };
                    changes.push(AllocationChange::assignment(
                        now,
                        def.id().clone(),
                        r.id().clone(),
                        "Daily forecast: Standby bay assignment",
                    ));
                    BayAssignment::occupied(
                        def.id().clone(),
                        BayType::Standby,
                        r.id().clone(),
                        now,
                        reason,
                    )
                }
                None => BayAssignment::available(
                    def.id().clone(),
                    BayType::Standby,
                    now,
                    "Available standby bay",
                ),
            };
            bays.push(bay);
        }

        for (i, def) in self.layout.iter_tier(BayType::Overflow).enumerate() {
            let bay = match overflow_trains.get(i) {
                Some(r) => {
                    changes.push(AllocationChange::assignment(
                        now,
                        def.id().clone(),
                        r.id().clone(),
                        "Daily forecast: Overflow bay assignment",
                    ));
                    BayAssignment::occupied(
                        def.id().clone(),
                        BayType::Overflow,
                        r.id().clone(),
                        now,
                        "Overflow assignment for later departure",
                    )
                    .with_departure(now + self.params.overflow_departure(i))
                }
                None => BayAssignment::available(
                    def.id().clone(),
                    BayType::Overflow,
                    now,
                    "Available overflow bay",
                ),
            };
            bays.push(bay);
        }

        let placed = changes.len();
        let unplaced = in_service.len() + standby.len() - placed;
        if unplaced > 0 {
            debug!(unplaced, "Trains left without a bay");
        }

        let plan_id = PlanId::new(format!("DAILY_{}", now.format("%Y-%m-%d")));
        let plan = AllocationPlan::new(plan_id, now, PlanMode::DailyForecast, bays, changes);
        info!(
            plan = %plan.plan_id(),
            primary = plan.summary().primary_bays_occupied,
            standby = plan.summary().standby_bays_occupied,
            overflow = plan.summary().overflow_bays_occupied,
            "Daily forecast generated"
        );
        plan
    }
}
