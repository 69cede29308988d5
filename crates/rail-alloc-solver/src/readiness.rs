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
use rail_alloc_core::{mileage::Kilometers, readiness::ReadinessScore};
use rail_alloc_model::prelude::*;
use rayon::prelude::*;
use std::collections::HashMap;
use tracing::{instrument, trace};

pub const CERTIFICATE_PENALTY: f64 = 50.0;
pub const OVERDUE_CLEANING_PENALTY: f64 = 20.0;
pub const NEEDS_CLEANING_PENALTY: f64 = 25.0;
pub const CLEANING_IN_PROGRESS_PENALTY: f64 = 10.0;
pub const JOB_CARD_OPEN_PENALTY: f64 = 30.0;
pub const JOB_CARD_IN_PROGRESS_PENALTY: f64 = 15.0;
pub const BRANDING_BONUS: f64 = 10.0;

/// Scores how fit each train is to depart.
///
/// A train starts at 100 and loses points for failed certificates, cleaning,
/// open job cards and distance from the assumed average mileage. Meeting the
/// branding minimum earns points back. The result is clamped to `[0, 100]`.
#[derive(Debug, Clone)]
pub struct ReadinessMonitor<C = SystemClock> {
    params: ForecastParameters,
    clock: C,
}

impl Default for ReadinessMonitor<SystemClock> {
    fn default() -> Self {
        Self::new(ForecastParameters::default(), SystemClock)
    }
}

impl<C: Clock> ReadinessMonitor<C> {
    #[inline]
    pub fn new(params: ForecastParameters, clock: C) -> Self {
        Self { params, clock }
    }

    #[inline]
    pub fn params(&self) -> &ForecastParameters {
        &self.params
    }

    #[inline]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn overdue_for_cleaning(&self, train: &Train) -> bool {
        train.days_since_clean() > self.params.cleaning_threshold_days
    }

    pub fn score(&self, train: &Train, signal: Option<&ReadinessSignal>) -> ReadinessScore {
        let mut score = 100.0;

        if !train.fitness().all_passed() {
            score -= CERTIFICATE_PENALTY;
        }

        match signal.and_then(|s| s.cleaning_status) {
            Some(CleaningStatus::NeedsCleaning) => score -= NEEDS_CLEANING_PENALTY,
            Some(CleaningStatus::InProgress) => score -= CLEANING_IN_PROGRESS_PENALTY,
            Some(CleaningStatus::Clean) | None => {
                if self.overdue_for_cleaning(train) {
                    score -= OVERDUE_CLEANING_PENALTY;
                }
            }
        }

        if train.branding_hours() >= self.params.min_branding_hours {
            score += BRANDING_BONUS;
        }

        match signal.and_then(|s| s.job_card_status) {
            Some(JobCardStatus::Open) => score -= JOB_CARD_OPEN_PENALTY,
            Some(JobCardStatus::InProgress) => score -= JOB_CARD_IN_PROGRESS_PENALTY,
            Some(JobCardStatus::Closed) | None => {}
        }

        let deviation = train
            .mileage_total()
            .abs_diff(Kilometers::new(self.params.assumed_average_mileage_km));
        if self.params.mileage_deviation_unit_km > 0.0 {
            score -= deviation.value() / self.params.mileage_deviation_unit_km
                * self.params.runtime_balance_weight;
        }

        ReadinessScore::new(score)
    }

    /// Full readiness record for `train`. Without a ready flag in `signal`
    /// the train counts as ready.
    pub fn assess(&self, train: &Train, signal: Option<&ReadinessSignal>) -> TrainReadiness {
        let score = self.score(train, signal);
        let cleaning_status = signal.and_then(|s| s.cleaning_status).unwrap_or(
            if self.overdue_for_cleaning(train) {
                CleaningStatus::NeedsCleaning
            } else {
                CleaningStatus::Clean
            },
        );
        let job_card_status = signal
            .and_then(|s| s.job_card_status)
            .unwrap_or_default();

        let mut issues: Vec<String> = train
            .fitness()
            .failures()
            .map(|c| format!("{} certificate expired", c.code()))
            .collect();
        match cleaning_status {
            CleaningStatus::NeedsCleaning => issues.push("Overdue for cleaning".to_owned()),
            CleaningStatus::InProgress => issues.push("Cleaning in progress".to_owned()),
            CleaningStatus::Clean => {}
        }
        match job_card_status {
            JobCardStatus::Open => issues.push("Job card open".to_owned()),
            JobCardStatus::InProgress => issues.push("Job card in progress".to_owned()),
            JobCardStatus::Closed => {}
        }

        let readiness = TrainReadiness {
            id: train.id().clone(),
            is_ready: signal.and_then(|s| s.is_ready).unwrap_or(true),
            readiness_score: score.value(),
            cleaning_status,
            branding_hours: train.branding_hours(),
            runtime_balance: train.mileage_total().value(),
            job_card_status,
            last_updated: self.clock.now(),
            issues,
        };
        trace!(
            train = %readiness.id,
            score = readiness.readiness_score,
            ready = readiness.is_ready,
            "Assessed"
        );
        readiness
    }

    /// Assesses every train in parallel. Output order follows `trains`.
    #[instrument(level = "debug", skip_all, fields(trains = trains.len()))]
    pub fn assess_fleet(
        &self,
        trains: &[Train],
        signals: &HashMap<TrainId, ReadinessSignal>,
    ) -> Vec<TrainReadiness> {
        trains
            .par_iter()
            .map(|t| self.assess(t, signals.get(t.id())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::{TimeZone, Utc};

    fn monitor() -> ReadinessMonitor<FixedClock> {
        ReadinessMonitor::new(
            ForecastParameters::default(),
            FixedClock::new(Utc.with_ymd_and_hms(2025, 3, 1, 23, 0, 0).unwrap()),
        )
    }

    /// Average mileage, branding below minimum, clean: exactly 100.
    fn neutral(id: &str) -> Train {
        Train::builder(id)
            .mileage_total(250_000.0)
            .branding_hours(0.0)
            .days_since_clean(0)
            .build()
    }

    #[test]
    fn test_neutral_train_scores_full() {
        assert_eq!(monitor().score(&neutral("T01"), None).value(), 100.0);
    }

    #[test]
    fn test_certificate_and_cleaning_penalties() {
        let t = neutral("T01")
            .edit()
            .certificate(Certificate::Signalling, false)
            .days_since_clean(31)
            .build();
        assert_eq!(monitor().score(&t, None).value(), 30.0);
    }

    #[test]
    fn test_cleaning_override_replaces_day_rule() {
        let m = monitor();
        let t = neutral("T01").edit().days_since_clean(40).build();
        let needs = ReadinessSignal::default().with_cleaning(CleaningStatus::NeedsCleaning);
        let in_progress = ReadinessSignal::default().with_cleaning(CleaningStatus::InProgress);
        let clean = ReadinessSignal::default().with_cleaning(CleaningStatus::Clean);
        assert_eq!(m.score(&t, Some(&needs)).value(), 75.0);
        assert_eq!(m.score(&t, Some(&in_progress)).value(), 90.0);
        assert_eq!(m.score(&t, Some(&clean)).value(), 80.0);
    }

    #[test]
    fn test_job_card_penalties() {
        let m = monitor();
        let t = neutral("T01");
        let open = ReadinessSignal::default().with_job_card(JobCardStatus::Open);
        let wip = ReadinessSignal::default().with_job_card(JobCardStatus::InProgress);
        assert_eq!(m.score(&t, Some(&open)).value(), 70.0);
        assert_eq!(m.score(&t, Some(&wip)).value(), 85.0);
    }

    #[test]
    fn test_mileage_balance_and_branding() {
        let m = monitor();
        let t = neutral("T01")
            .edit()
            .mileage_total(350_000.0)
            .branding_hours(8.0)
            .build();
        // 100 - 10 * 0.1 + 10, clamped.
        assert_eq!(m.score(&t, None).value(), 100.0);
        let far = neutral("T02").edit().mileage_total(0.0).build();
        assert!((m.score(&far, None).value() - 97.5).abs() < 1e-9);
    }

    #[test]
    fn test_score_is_clamped_at_zero() {
        let t = neutral("T01")
            .edit()
            .certificate(Certificate::RollingStock, false)
            .mileage_total(5_000_000.0)
            .build();
        let signal = ReadinessSignal::default()
            .with_job_card(JobCardStatus::Open)
            .with_cleaning(CleaningStatus::NeedsCleaning);
        assert_eq!(monitor().score(&t, Some(&signal)).value(), 0.0);
    }

    #[test]
    fn test_assess_lists_issues_and_defaults_ready() {
        let t = neutral("T01")
            .edit()
            .certificate(Certificate::RollingStock, false)
            .certificate(Certificate::Telecom, false)
            .days_since_clean(31)
            .build();
        let r = monitor().assess(&t, None);
        assert!(r.is_ready);
        assert_eq!(r.cleaning_status, CleaningStatus::NeedsCleaning);
        assert_eq!(r.job_card_status, JobCardStatus::Closed);
        assert_eq!(
            r.issues,
            vec![
                "RS certificate expired",
                "TEL certificate expired",
                "Overdue for cleaning"
            ]
        );
        assert_eq!(r.last_updated, monitor().clock().now());
    }

    #[test]
    fn test_assess_honours_ready_flag() {
        let signal = ReadinessSignal::default()
            .with_ready(false)
            .with_job_card(JobCardStatus::Open);
        let r = monitor().assess(&neutral("T01"), Some(&signal));
        assert!(!r.is_ready);
        assert_eq!(r.issues, vec!["Job card open"]);
    }

    #[test]
    fn test_assess_fleet_keeps_input_order() {
        let trains: Vec<Train> = (1..=50).map(|i| neutral(&format!("T{i:02}"))).collect();
        let mut signals = HashMap::new();
        signals.insert(
            TrainId::from("T07"),
            ReadinessSignal::default().with_job_card(JobCardStatus::Open),
        );
        let out = monitor().assess_fleet(&trains, &signals);
        assert_eq!(out.len(), 50);
        for (t, r) in trains.iter().zip(&out) {
            assert_eq!(t.id(), &r.id);
        }
        assert_eq!(out[6].readiness_score, 70.0);
        assert_eq!(out[5].readiness_score, 100.0);
    }
}
