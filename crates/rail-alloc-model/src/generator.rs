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
    config::ShuntCostTable,
    train::{Certificate, MaintenanceState, Train},
};
use rand::{Rng, SeedableRng, rngs::SmallRng};
use rand_distr::{Distribution, Normal, Uniform};
use std::{collections::BTreeMap, fmt::Display};

/// Configuration for generating a synthetic fleet.
///
/// # Notes
/// - Mileages are drawn from a normal distribution around `mileage_mean_km`
///   and clamped at zero.
/// - Inspection counters are uniform in `[0, max]`; with the default maxima a
///   share of the fleet ends up overdue for A or B inspection.
/// - Each certificate fails independently with `certificate_failure_rate`.
#[derive(Debug, Clone, PartialEq)]
pub struct FleetGenConfig {
    pub fleet_size: usize,
    pub mileage_mean_km: f64,
    pub mileage_sigma_km: f64,
    pub max_since_a_km: f64,
    pub max_since_b_km: f64,
    pub max_p_fail: f64,
    pub max_days_since_clean: u32,
    pub max_branding_hours: f64,
    /// Share of trains drawn into IOH, POH or heavy repair.
    pub maintenance_rate: f64,
    pub certificate_failure_rate: f64,
    pub seed: u64,
}

impl Default for FleetGenConfig {
    fn default() -> Self {
        Self {
            fleet_size: 25,
            mileage_mean_km: 250_000.0,
            mileage_sigma_km: 90_000.0,
            max_since_a_km: 6_000.0,
            max_since_b_km: 16_000.0,
            max_p_fail: 0.08,
            max_days_since_clean: 45,
            max_branding_hours: 12.0,
            maintenance_rate: 0.1,
            certificate_failure_rate: 0.05,
            seed: rand::rng().random(),
        }
    }
}

impl Display for FleetGenConfig {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "FleetGenConfig {{ fleet_size: {}, mileage: N({:.0}, {:.0}), max_since_A: {:.0}, \
             max_since_B: {:.0}, max_p_fail: {:.3}, maintenance_rate: {:.2}, \
             certificate_failure_rate: {:.2}, seed: {} }}",
            self.fleet_size,
            self.mileage_mean_km,
            self.mileage_sigma_km,
            self.max_since_a_km,
            self.max_since_b_km,
            self.max_p_fail,
            self.maintenance_rate,
            self.certificate_failure_rate,
            self.seed
        )
    }
}

pub struct FleetGenerator {
    config: FleetGenConfig,
    rng: SmallRng,
    mileage_distribution: Option<Normal<f64>>,
    next_index: usize,
}

impl From<FleetGenConfig> for FleetGenerator {
    fn from(config: FleetGenConfig) -> Self {
        Self::new(config)
    }
}

impl FleetGenerator {
    pub fn new(config: FleetGenConfig) -> Self {
        let seed = config.seed;
        Self {
            mileage_distribution: Normal::new(config.mileage_mean_km, config.mileage_sigma_km).ok(),
            config,
            rng: SmallRng::seed_from_u64(seed),
            next_index: 0,
        }
    }

    #[inline]
    pub fn config(&self) -> &FleetGenConfig {
        &self.config
    }

    /// Generates `fleet_size` trains with ids `T01`, `T02`, ... and positions
    /// `0..fleet_size`.
    pub fn generate(&mut self) -> Vec<Train> {
        (0..self.config.fleet_size)
            .map(|_| self.sample_train())
            .collect()
    }

    fn sample_train(&mut self) -> Train {
        let index = self.next_index;
        self.next_index += 1;

        let mileage = match &self.mileage_distribution {
            Some(d) => d.sample(&mut self.rng).max(0.0).round(),
            None => self.config.mileage_mean_km.max(0.0),
        };
        let since_a = self.uniform_km(self.config.max_since_a_km);
        let since_b = self.uniform_km(self.config.max_since_b_km).max(since_a);
        let state = self.sample_state();
        let p_fail = self.rng.random_range(0.0..=self.config.max_p_fail.clamp(0.0, 1.0));
        let days = self.rng.random_range(0..=self.config.max_days_since_clean);
        let branding = self
            .rng
            .random_range(0.0..=self.config.max_branding_hours.max(0.0))
            .round();

        let mut builder = Train::builder(format!("T{:02}", index + 1))
            .mileage_total(mileage)
            .since_a(since_a)
            .since_b(since_b)
            .state(state)
            .p_fail((p_fail * 1000.0).round() / 1000.0)
            .pos(index as u32)
            .days_since_clean(days)
            .branding_hours(branding);
        for certificate in Certificate::ALL {
            let failed = self.rng.random_bool(self.config.certificate_failure_rate.clamp(0.0, 1.0));
            builder = builder.certificate(certificate, !failed);
        }
        builder.build()
    }

    fn uniform_km(&mut self, max: f64) -> f64 {
        if max <= 0.0 {
            return 0.0;
        }
        self.rng.random_range(0.0..=max).round()
    }

    fn sample_state(&mut self) -> MaintenanceState {
        if !self.rng.random_bool(self.config.maintenance_rate.clamp(0.0, 1.0)) {
            return MaintenanceState::Ok;
        }
        match self.rng.random_range(0..3u8) {
            0 => MaintenanceState::Ioh,
            1 => MaintenanceState::Poh,
            _ => MaintenanceState::HeavyRepair,
        }
    }

    /// Random table mapping `0..positions` to one of the discrete cost levels.
    pub fn shunt_cost_table(&mut self, positions: u32) -> ShuntCostTable {
        let levels = ShuntCostTable::COST_LEVELS;
        let Ok(pick) = Uniform::new(0, levels.len()) else {
            return ShuntCostTable::empty();
        };
        let costs: BTreeMap<u32, f64> = (0..positions)
            .map(|p| (p, levels[pick.sample(&mut self.rng)]))
            .collect();
        ShuntCostTable::new(costs, ShuntCostTable::DEFAULT_FALLBACK)
    }
}

/// The ten-train reference fleet used by the demo and documentation.
pub fn sample_fleet() -> Vec<Train> {
    use MaintenanceState as S;
    #[rustfmt::skip]
    let rows: [(&str, f64, f64, f64, MaintenanceState, f64, u32, [bool; 3], f64); 10] = [
        ("T01", 120_000.0, 4_000.0, 12_000.0, S::Ok, 0.01, 15, [true, true, true], 8.0),
        ("T02", 150_000.0, 3_000.0, 14_000.0, S::Ok, 0.02, 32, [true, true, false], 10.0),
        ("T03", 180_000.0, 6_000.0, 10_000.0, S::Ok, 0.03, 20, [true, true, true], 6.0),
        ("T04", 220_000.0, 2_000.0, 12_000.0, S::Ioh, 0.05, 40, [true, true, true], 12.0),
        ("T05", 250_000.0, 7_000.0, 15_000.0, S::Ok, 0.01, 10, [true, true, true], 7.0),
        ("T06", 300_000.0, 1_000.0, 5_000.0, S::Poh, 0.06, 5, [true, true, true], 9.0),
        ("T07", 320_000.0, 4_000.0, 16_000.0, S::Ok, 0.02, 35, [true, true, true], 8.0),
        ("T08", 350_000.0, 3_000.0, 8_000.0, S::Ok, 0.01, 25, [true, false, true], 11.0),
        ("T09", 400_000.0, 5_000.0, 10_000.0, S::HeavyRepair, 0.07, 45, [true, true, true], 5.0),
        ("T10", 420_000.0, 2_500.0, 12_000.0, S::Ok, 0.015, 12, [true, true, true], 10.0),
    ];
    rows.into_iter()
        .enumerate()
        .map(|(pos, (id, mileage, a, b, state, p, days, [rs, sig, tel], brand))| {
            Train::builder(id)
                .mileage_total(mileage)
                .since_a(a)
                .since_b(b)
                .state(state)
                .p_fail(p)
                .pos(pos as u32)
                .days_since_clean(days)
                .certificate(Certificate::RollingStock, rs)
                .certificate(Certificate::Signalling, sig)
                .certificate(Certificate::Telecom, tel)
                .branding_hours(brand)
                .build()
        })
        .collect()
}
