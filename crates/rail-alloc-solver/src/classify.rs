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

use rail_alloc_model::prelude::*;
use tracing::{debug, instrument};

/// Running count of workshop and inspection bay assignments in one pass.
///
/// Every WORKSHOP or IBL result counts, including the ones forced by
/// maintenance state or overdue inspections. Only the fitness rule consults
/// the remaining capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityLedger {
    workshop_capacity: usize,
    ibl_capacity: usize,
    workshop_used: usize,
    ibl_used: usize,
}

impl CapacityLedger {
    #[inline]
    pub fn new(workshop_capacity: usize, ibl_capacity: usize) -> Self {
        Self {
            workshop_capacity,
            ibl_capacity,
            workshop_used: 0,
            ibl_used: 0,
        }
    }

    #[inline]
    pub fn from_config(config: &SchedulingConfig) -> Self {
        Self::new(config.num_workshop_bays, config.num_inspection_bays)
    }

    #[inline]
    pub fn workshop_used(&self) -> usize {
        self.workshop_used
    }

    #[inline]
    pub fn ibl_used(&self) -> usize {
        self.ibl_used
    }

    #[inline]
    pub fn workshop_available(&self) -> bool {
        self.workshop_used < self.workshop_capacity
    }

    #[inline]
    pub fn ibl_available(&self) -> bool {
        self.ibl_used < self.ibl_capacity
    }

    /// Returns the ledger after recording `assignment`.
    #[inline]
    pub fn with(mut self, assignment: Assignment) -> Self {
        match assignment {
            Assignment::Workshop => self.workshop_used += 1,
            Assignment::Ibl => self.ibl_used += 1,
            Assignment::InService | Assignment::Standby => {}
        }
        self
    }
}

/// Outcome of the hard constraints for a single train.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// The train's role is fixed and it takes no part in scoring.
    Decided(ScheduleResult),
    Eligible,
}

/// Trains split into decided results and the eligible remainder.
#[derive(Debug, Clone)]
pub struct ClassifiedFleet<'t> {
    pub decided: Vec<ScheduleResult>,
    pub eligible: Vec<&'t Train>,
    pub ledger: CapacityLedger,
}

/// Applies the hard constraints in priority order: maintenance state, overdue
/// inspection, then fitness certificates.
#[derive(Debug, Clone, Copy)]
pub struct Classifier<'c> {
    config: &'c SchedulingConfig,
}

impl<'c> Classifier<'c> {
    #[inline]
    pub fn new(config: &'c SchedulingConfig) -> Self {
        Self { config }
    }

    /// Classifies one train against the capacity consumed so far.
    pub fn classify_one(
        &self,
        train: &Train,
        ledger: CapacityLedger,
    ) -> (Classification, CapacityLedger) {
        let state = train.state();
        if state.requires_workshop() {
            return Self::decide(
                train,
                Assignment::Workshop,
                format!("Required maintenance: {state}"),
                ledger,
            );
        }

        let since_a = train.since_a().value();
        let since_b = train.since_b().value();
        if since_a >= self.config.a_threshold_km || since_b >= self.config.b_threshold_km {
            return Self::decide(
                train,
                Assignment::Ibl,
                format!("Overdue inspection - A: {since_a}km, B: {since_b}km"),
                ledger,
            );
        }

        let fitness = train.fitness();
        if fitness.all_passed() {
            return (Classification::Eligible, ledger);
        }
        let failed = fitness
            .failures()
            .map(Certificate::code)
            .collect::<Vec<_>>()
            .join(", ");
        if ledger.workshop_available() {
            Self::decide(
                train,
                Assignment::Workshop,
                format!("Fitness certificate issues: {failed}"),
                ledger,
            )
        } else if ledger.ibl_available() {
            Self::decide(
                train,
                Assignment::Ibl,
                format!("Fitness certificate issues: {failed} - Workshop full"),
                ledger,
            )
        } else {
            Self::decide(
                train,
                Assignment::Standby,
                "Fitness issues but no bays available",
                ledger,
            )
        }
    }

    fn decide(
        train: &Train,
        assignment: Assignment,
        reason: impl Into<String>,
        ledger: CapacityLedger,
    ) -> (Classification, CapacityLedger) {
        let result = ScheduleResult::constrained(train, assignment, reason);
        debug!(
            train = %train.id(),
            %assignment,
            reason = result.reason(),
            "Hard constraint applied"
        );
        (Classification::Decided(result), ledger.with(assignment))
    }

    /// Runs the whole fleet through the hard constraints in input order.
    #[instrument(level = "debug", skip_all, fields(trains = trains.len()))]
    pub fn classify<'t>(&self, trains: &'t [Train]) -> ClassifiedFleet<'t> {
        let initial = ClassifiedFleet {
            decided: Vec::new(),
            eligible: Vec::with_capacity(trains.len()),
            ledger: CapacityLedger::from_config(self.config),
        };
        trains.iter().fold(initial, |mut acc, train| {
            let (classification, ledger) = self.classify_one(train, acc.ledger);
            acc.ledger = ledger;
            match classification {
                Classification::Decided(result) => acc.decided.push(result),
                Classification::Eligible => acc.eligible.push(train),
            }
            acc
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(workshop: usize, ibl: usize) -> SchedulingConfig {
        SchedulingConfig {
            num_workshop_bays: workshop,
            num_inspection_bays: ibl,
            ..SchedulingConfig::default()
        }
    }

    fn unfit(id: &str) -> Train {
        Train::builder(id)
            .certificate(Certificate::Telecom, false)
            .build()
    }

    #[test]
    fn test_maintenance_state_wins_over_everything() {
        let config = cfg(0, 0);
        let t = Train::builder("T01")
            .state(MaintenanceState::Poh)
            .since_a(99_999.0)
            .certificate(Certificate::RollingStock, false)
            .build();
        let out = Classifier::new(&config).classify(std::slice::from_ref(&t));
        assert_eq!(out.decided.len(), 1);
        assert_eq!(out.decided[0].assignment(), Assignment::Workshop);
        assert_eq!(out.decided[0].reason(), "Required maintenance: POH");
        assert_eq!(out.ledger.workshop_used(), 1);
    }

    #[test]
    fn test_overdue_inspection_reason_cites_both_counters() {
        let config = SchedulingConfig::default();
        let t = Train::builder("T02").since_a(6_000.0).since_b(10_000.0).build();
        let out = Classifier::new(&config).classify(std::slice::from_ref(&t));
        assert_eq!(out.decided[0].assignment(), Assignment::Ibl);
        assert_eq!(
            out.decided[0].reason(),
            "Overdue inspection - A: 6000km, B: 10000km"
        );
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let config = SchedulingConfig::default();
        let t = Train::builder("T03").since_b(15_000.0).build();
        let out = Classifier::new(&config).classify(std::slice::from_ref(&t));
        assert_eq!(out.decided[0].assignment(), Assignment::Ibl);
    }

    #[test]
    fn test_fitness_failures_spill_from_workshop_to_ibl_to_standby() {
        let config = cfg(1, 1);
        let fleet = vec![unfit("T01"), unfit("T02"), unfit("T03")];
        let out = Classifier::new(&config).classify(&fleet);
        let roles: Vec<_> = out.decided.iter().map(|r| r.assignment()).collect();
        assert_eq!(
            roles,
            vec![Assignment::Workshop, Assignment::Ibl, Assignment::Standby]
        );
        assert_eq!(out.decided[0].reason(), "Fitness certificate issues: TEL");
        assert_eq!(
            out.decided[1].reason(),
            "Fitness certificate issues: TEL - Workshop full"
        );
        assert_eq!(out.decided[2].reason(), "Fitness issues but no bays available");
        assert!(out.decided[2].score().is_none());
    }

    #[test]
    fn test_state_driven_workshop_consumes_capacity() {
        let config = cfg(1, 0);
        let fleet = vec![
            Train::builder("T01").state(MaintenanceState::Ioh).build(),
            unfit("T02"),
        ];
        let out = Classifier::new(&config).classify(&fleet);
        assert_eq!(out.decided[1].assignment(), Assignment::Standby);
    }

    #[test]
    fn test_lists_all_failed_certificates() {
        let config = SchedulingConfig::default();
        let t = Train::builder("T04")
            .certificate(Certificate::RollingStock, false)
            .certificate(Certificate::Telecom, false)
            .build();
        let (c, ledger) =
            Classifier::new(&config).classify_one(&t, CapacityLedger::from_config(&config));
        match c {
            Classification::Decided(r) => {
                assert_eq!(r.reason(), "Fitness certificate issues: RS, TEL")
            }
            Classification::Eligible => panic!("expected a decided result"),
        }
        assert_eq!(ledger.workshop_used(), 1);
    }

    #[test]
    fn test_fit_train_is_eligible() {
        let config = SchedulingConfig::default();
        let fleet = vec![Train::builder("T05").build()];
        let out = Classifier::new(&config).classify(&fleet);
        assert!(out.decided.is_empty());
        assert_eq!(out.eligible.len(), 1);
        assert_eq!(out.ledger, CapacityLedger::from_config(&config));
    }
}
