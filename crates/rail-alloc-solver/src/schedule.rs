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
    allocate::{RoleAllocator, result_order},
    classify::Classifier,
    score::{Scorer, WeightedCostScorer},
};
use rail_alloc_model::prelude::*;
use tracing::{info, instrument, warn};

/// Classifier, scorer and role allocator chained into one scheduling run.
#[derive(Debug, Clone, Default)]
pub struct FleetScheduler<S = WeightedCostScorer> {
    scorer: S,
}

impl<S: Scorer> FleetScheduler<S> {
    #[inline]
    pub fn new(scorer: S) -> Self {
        Self { scorer }
    }

    #[inline]
    pub fn scorer(&self) -> &S {
        &self.scorer
    }

    /// Assigns every train exactly one role. Never fails; an empty fleet
    /// yields an empty schedule.
    #[instrument(
        level = "info",
        skip_all,
        fields(trains = trains.len(), scorer = self.scorer.name())
    )]
    pub fn schedule(&self, trains: &[Train], config: &SchedulingConfig) -> Schedule {
        if trains.is_empty() {
            return Schedule::empty();
        }

        let classified = Classifier::new(config).classify(trains);
        let ranked = self.scorer.rank(&classified.eligible, trains, config);
        let mut results = RoleAllocator::from_config(config).allocate(&ranked);
        results.extend(classified.decided);
        results.sort_by(result_order);

        let diagnostics = diagnose(&results, trains, config);
        let schedule = Schedule::new(results, diagnostics);
        let summary = schedule.summary();
        info!(
            in_service = summary.in_service,
            standby = summary.standby,
            ibl = summary.ibl,
            workshop = summary.workshop,
            "Schedule built"
        );
        if schedule.diagnostics().in_service_shortfall > 0 {
            warn!(
                shortfall = schedule.diagnostics().in_service_shortfall,
                required = config.required_in_service,
                "In-service quota not met"
            );
        }
        schedule
    }
}

/// Schedules `trains` with the weighted cost model.
pub fn schedule_trains(trains: &[Train], config: &SchedulingConfig) -> Schedule {
    FleetScheduler::<WeightedCostScorer>::default().schedule(trains, config)
}

fn diagnose(
    results: &[ScheduleResult],
    trains: &[Train],
    config: &SchedulingConfig,
) -> ScheduleDiagnostics {
    let summary = ScheduleSummary::from_results(results);
    let in_service_shortfall = config.required_in_service.saturating_sub(summary.in_service);
    let stabled = summary.in_service + summary.standby;

    let mut ioh_due = Vec::new();
    let mut poh_due = Vec::new();
    for t in trains.iter().filter(|t| t.state() == MaintenanceState::Ok) {
        let km = t.mileage_total().value();
        if km >= config.poh_threshold_km {
            poh_due.push(t.id().clone());
        } else if km >= config.ioh_threshold_km {
            ioh_due.push(t.id().clone());
        }
    }

    ScheduleDiagnostics {
        in_service_shortfall,
        reserve_shortfall: config.min_reserve.saturating_sub(summary.standby),
        stabling_overflow: stabled.saturating_sub(config.num_stabling_slots),
        ioh_due,
        poh_due,
        shortfall_penalty: config.w_short_in_service * in_service_shortfall as f64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::CandidatePoolScorer;
    use rail_alloc_model::generator::{FleetGenConfig, FleetGenerator, sample_fleet};
    use std::collections::HashSet;

    fn generated(seed: u64, size: usize) -> Vec<Train> {
        FleetGenerator::new(FleetGenConfig {
            fleet_size: size,
            seed,
            ..FleetGenConfig::default()
        })
        .generate()
    }

    #[test]
    fn test_three_train_example() {
        let config = SchedulingConfig {
            required_in_service: 1,
            ..SchedulingConfig::default()
        };
        let fleet = vec![
            Train::builder("T01").state(MaintenanceState::Poh).build(),
            Train::builder("T02").since_a(5_500.0).build(),
            Train::builder("T03").build(),
        ];
        let schedule = schedule_trains(&fleet, &config);
        let s = schedule.summary();
        assert_eq!((s.in_service, s.standby, s.ibl, s.workshop), (1, 0, 1, 1));

        let first = &schedule.results()[0];
        assert_eq!(first.id().as_str(), "T03");
        assert_eq!(first.assignment(), Assignment::InService);
        assert_eq!(first.slot(), Some(1));
        assert!(first.score().is_some());
        assert_eq!(schedule.results()[1].assignment(), Assignment::Ibl);
        assert_eq!(schedule.results()[2].assignment(), Assignment::Workshop);
    }

    #[test]
    fn test_empty_fleet_gives_empty_schedule() {
        let schedule = schedule_trains(&[], &SchedulingConfig::default());
        assert!(schedule.results().is_empty());
        assert_eq!(*schedule.summary(), ScheduleSummary::default());
    }

    #[test]
    fn test_every_train_appears_exactly_once() {
        let config = SchedulingConfig::default();
        for seed in [1, 2, 3, 4] {
            let fleet = generated(seed, 60);
            let schedule = schedule_trains(&fleet, &config);
            assert_eq!(schedule.results().len(), fleet.len());
            let ids: HashSet<_> = schedule.results().iter().map(|r| r.id()).collect();
            assert_eq!(ids.len(), fleet.len());
            assert_eq!(schedule.summary().total(), fleet.len());
        }
    }

    #[test]
    fn test_hard_constraints_and_capacity_hold() {
        let config = SchedulingConfig {
            num_workshop_bays: 2,
            num_inspection_bays: 1,
            ..SchedulingConfig::default()
        };
        let fleet = FleetGenerator::new(FleetGenConfig {
            fleet_size: 80,
            certificate_failure_rate: 0.3,
            maintenance_rate: 0.2,
            seed: 42,
            ..FleetGenConfig::default()
        })
        .generate();
        let schedule = schedule_trains(&fleet, &config);

        let mut fitness_workshop = 0;
        let mut fitness_ibl = 0;
        for r in schedule.results() {
            if r.train().state().requires_workshop() {
                assert_eq!(r.assignment(), Assignment::Workshop);
            }
            if r.reason().starts_with("Fitness certificate issues") {
                match r.assignment() {
                    Assignment::Workshop => fitness_workshop += 1,
                    Assignment::Ibl => fitness_ibl += 1,
                    other => panic!("unexpected {other}"),
                }
            }
        }
        assert!(fitness_workshop <= config.num_workshop_bays);
        assert!(fitness_ibl <= config.num_inspection_bays);
    }

    #[test]
    fn test_quota_bound_and_slots() {
        let config = SchedulingConfig::default();
        let fleet = generated(9, 30);
        let schedule = schedule_trains(&fleet, &config);
        let in_service: Vec<_> = schedule.with_assignment(Assignment::InService).collect();
        assert!(in_service.len() <= config.required_in_service);
        let slots: Vec<_> = in_service.iter().filter_map(|r| r.slot()).collect();
        let expected: Vec<u32> = (1..=in_service.len() as u32).collect();
        assert_eq!(slots, expected);
    }

    #[test]
    fn test_deterministic() {
        let config = SchedulingConfig::default();
        let fleet = generated(5, 40);
        assert_eq!(schedule_trains(&fleet, &config), schedule_trains(&fleet, &config));
    }

    #[test]
    fn test_ties_broken_by_id() {
        let config = SchedulingConfig {
            required_in_service: 1,
            shunt_cost_by_pos: ShuntCostTable::empty(),
            ..SchedulingConfig::default()
        };
        let fleet = vec![Train::builder("T02").build(), Train::builder("T01").build()];
        let schedule = schedule_trains(&fleet, &config);
        assert_eq!(schedule.results()[0].id().as_str(), "T01");
        assert_eq!(schedule.results()[1].id().as_str(), "T02");
    }

    #[test]
    fn test_sample_fleet_schedule() {
        let schedule = schedule_trains(&sample_fleet(), &SchedulingConfig::default());
        let s = schedule.summary();
        // T04, T06, T09 by state, T02 by fitness.
        assert_eq!(s.workshop, 4);
        // T03, T05, T07 overdue for inspection.
        assert_eq!(s.ibl, 3);
        assert_eq!(s.in_service, 2);
        assert_eq!(s.standby, 1);
        let t08 = schedule.get(&"T08".into()).map(|r| (r.assignment(), r.reason()));
        assert_eq!(
            t08,
            Some((Assignment::Standby, "Fitness issues but no bays available"))
        );
        assert_eq!(schedule.diagnostics().in_service_shortfall, 8);
        assert_eq!(schedule.diagnostics().reserve_shortfall, 1);
        assert_eq!(schedule.diagnostics().shortfall_penalty, 8.0 * 500_000.0);
    }

    #[test]
    fn test_diagnostics_report_overhaul_due() {
        let config = SchedulingConfig::default();
        let fleet = vec![
            Train::builder("T01").mileage_total(500_000.0).build(),
            Train::builder("T02").mileage_total(900_000.0).build(),
            Train::builder("T03")
                .mileage_total(900_000.0)
                .state(MaintenanceState::Poh)
                .build(),
        ];
        let d = schedule_trains(&fleet, &config).diagnostics().clone();
        assert_eq!(d.ioh_due, vec![TrainId::from("T01")]);
        assert_eq!(d.poh_due, vec![TrainId::from("T02")]);
    }

    #[test]
    fn test_candidate_pool_scheduler_is_exhaustive() {
        let config = SchedulingConfig {
            candidate_pool_size: 5,
            ..SchedulingConfig::default()
        };
        let fleet = generated(21, 40);
        let schedule = FleetScheduler::new(CandidatePoolScorer::new(WeightedCostScorer))
            .schedule(&fleet, &config);
        assert_eq!(schedule.results().len(), fleet.len());
    }
}
