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
    clock::{Clock, SystemClock},
    readiness::ReadinessMonitor,
};
use rail_alloc_core::position::ShuntingSteps;
use rail_alloc_model::prelude::*;
use std::{
    cmp::Ordering,
    collections::{HashMap, HashSet},
};
use tracing::{debug, info, instrument, warn};

/// How ready a bay's occupant looks for the current tick.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Outlook {
    score: f64,
    /// Ready flag set and score at or above the threshold.
    qualifies: bool,
}

/// A train that could take over a primary bay.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplacementCandidate {
    pub bay_index: usize,
    pub bay_id: BayId,
    pub train_id: TrainId,
    pub readiness_score: f64,
    pub shunting_steps: ShuntingSteps,
    /// Readiness score less the shunting penalty; the ranking key.
    pub total_score: f64,
}

fn candidate_order(a: &ReplacementCandidate, b: &ReplacementCandidate) -> Ordering {
    b.total_score
        .total_cmp(&a.total_score)
        .then_with(|| a.shunting_steps.cmp(&b.shunting_steps))
        .then_with(|| a.bay_id.cmp(&b.bay_id))
}

/// Lookups shared by every bay inspected during one pass.
struct TickView<'a> {
    readiness: HashMap<&'a TrainId, &'a TrainReadiness>,
    trains: HashMap<&'a TrainId, &'a Train>,
}

impl<'a> TickView<'a> {
    fn new(readiness: &'a [TrainReadiness], results: &'a [ScheduleResult]) -> Self {
        Self {
            readiness: readiness.iter().map(|r| (&r.id, r)).collect(),
            trains: results.iter().map(|r| (r.id(), r.train())).collect(),
        }
    }
}

/// Swaps unready primary-bay occupants for ready trains parked elsewhere.
///
/// The engine holds no plan of its own. Each call takes the current plan and
/// returns the next one, leaving the input untouched.
#[derive(Debug, Clone)]
pub struct ReallocationEngine<C = SystemClock> {
    layout: BayConfiguration,
    monitor: ReadinessMonitor<C>,
}

impl Default for ReallocationEngine<SystemClock> {
    fn default() -> Self {
        Self::new(BayConfiguration::default(), ReadinessMonitor::default())
    }
}

impl<C: Clock> ReallocationEngine<C> {
    #[inline]
    pub fn new(layout: BayConfiguration, monitor: ReadinessMonitor<C>) -> Self {
        Self { layout, monitor }
    }

    #[inline]
    pub fn layout(&self) -> &BayConfiguration {
        &self.layout
    }

    #[inline]
    pub fn monitor(&self) -> &ReadinessMonitor<C> {
        &self.monitor
    }

    /// Readiness of `train_id`; without a reported record the score is computed
    /// from the train and it counts as ready.
    fn outlook(&self, view: &TickView<'_>, train_id: &TrainId) -> Option<Outlook> {
        let threshold = self.monitor.params().readiness_threshold();
        if let Some(r) = view.readiness.get(train_id) {
            return Some(Outlook {
                score: r.readiness_score,
                qualifies: r.qualifies(threshold),
            });
        }
        let train = view.trains.get(train_id)?;
        let score = self.monitor.score(train, None);
        Some(Outlook {
            score: score.value(),
            qualifies: score.meets(threshold),
        })
    }

    /// Best ready train in any other occupied bay for the bay at `target`.
    pub fn find_best_replacement(
        &self,
        plan: &AllocationPlan,
        target: usize,
        readiness: &[TrainReadiness],
        results: &[ScheduleResult],
    ) -> Option<ReplacementCandidate> {
        let view = TickView::new(readiness, results);
        self.best_replacement(plan, target, &view, &HashSet::new())
    }

    /// Bays in `locked` have already taken part in a swap this pass and are
    /// not offered as sources.
    fn best_replacement(
        &self,
        plan: &AllocationPlan,
        target: usize,
        view: &TickView<'_>,
        locked: &HashSet<usize>,
    ) -> Option<ReplacementCandidate> {
        let params = self.monitor.params();
        let max_distance = self.layout.max_shunting_distance();
        let target_bay = plan.bays().get(target)?;

        plan.bays()
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != target && !locked.contains(i))
            .filter_map(|(i, bay)| {
                let train_id = bay.train_id()?;
                // Trains absent from the schedule cannot be judged.
                view.trains.get(train_id)?;
                let outlook = self.outlook(view, train_id)?;
                if !outlook.qualifies {
                    return None;
                }
                let steps = self.layout.shunting_steps(bay.bay_id(), target_bay.bay_id());
                if let Some(max) = max_distance
                    && steps > max
                {
                    return None;
                }
                Some(ReplacementCandidate {
                    bay_index: i,
                    bay_id: bay.bay_id().clone(),
                    train_id: train_id.clone(),
                    readiness_score: outlook.score,
                    shunting_steps: steps,
                    total_score: outlook.score - f64::from(steps.value()) * params.shunting_penalty,
                })
            })
            .min_by(candidate_order)
    }

    /// One reallocation pass over the primary bays in ascending bay id.
    ///
    /// A primary occupant below the readiness threshold, or flagged not ready,
    /// trades places with the best candidate from any other occupied bay. The
    /// displaced train moves into the candidate's former bay. When nothing
    /// qualifies the occupant stays. A bay swaps at most once per pass, so a
    /// train moved in this pass is not moved again until the next one.
    #[instrument(
        level = "info",
        skip_all,
        fields(plan = %plan.plan_id(), readiness = readiness.len())
    )]
    pub fn update_real_time_allocation(
        &self,
        plan: &AllocationPlan,
        readiness: &[TrainReadiness],
        results: &[ScheduleResult],
    ) -> AllocationPlan {
        let view = TickView::new(readiness, results);
        let mut next = plan.clone();
        next.set_mode(PlanMode::RealTime);

        let mut primary: Vec<usize> = next
            .bays()
            .iter()
            .enumerate()
            .filter(|(_, b)| b.bay_type() == BayType::Primary && b.is_occupied())
            .map(|(i, _)| i)
            .collect();
        primary.sort_by(|&a, &b| next.bays()[a].bay_id().cmp(next.bays()[b].bay_id()));

        let mut locked = HashSet::new();
        let mut replacements = 0usize;
        for target in primary {
            if locked.contains(&target) {
                continue;
            }
            let bay = &next.bays()[target];
            let Some(occupant) = bay.train_id().cloned() else {
                continue;
            };
            let Some(outlook) = view
                .trains
                .contains_key(&occupant)
                .then(|| self.outlook(&view, &occupant))
                .flatten()
            else {
                debug!(bay = %bay.bay_id(), train = %occupant, "Occupant missing from schedule");
                continue;
            };
            if outlook.qualifies {
                continue;
            }

            let target_id = bay.bay_id().clone();
            let Some(candidate) = self.best_replacement(&next, target, &view, &locked) else {
                warn!(
                    bay = %target_id,
                    train = %occupant,
                    score = outlook.score,
                    "No replacement for unready train"
                );
                continue;
            };

            let now = self.monitor.clock().now();
            let reason = format!(
                "Train {occupant} not ready: replaced by Train {} from {} with {} shunting step(s)",
                candidate.train_id,
                candidate.bay_id,
                candidate.shunting_steps.value()
            );
            next.swap_occupants(target, candidate.bay_index);
            next.bays_mut()[target].annotate(now, format!("Real-time replacement: {reason}"));
            next.bays_mut()[candidate.bay_index]
                .annotate(now, format!("Moved from {target_id} due to readiness issues"));
            next.summary_mut().add_shunting_steps(candidate.shunting_steps);
            locked.insert(target);
            locked.insert(candidate.bay_index);
            info!(
                bay = %target_id,
                from = %candidate.bay_id,
                train = %candidate.train_id,
                replaced = %occupant,
                steps = candidate.shunting_steps.value(),
                "Replacement made"
            );
            next.record(AllocationChange::replacement(
                now,
                candidate.bay_id,
                target_id,
                candidate.train_id,
                occupant,
                reason,
                candidate.shunting_steps,
            ));
            replacements += 1;
        }

        next.recompute_occupancy();
        debug!(
            replacements,
            total_steps = next.summary().total_shunting_steps,
            "Reallocation pass finished"
        );
        next
    }
}
