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

use chrono::TimeDelta;
use rail_alloc_core::{cost::Cost, readiness::ReadinessScore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Discrete shunting cost per stabling position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShuntCostTable {
    costs: BTreeMap<u32, f64>,
    fallback: f64,
}

impl Default for ShuntCostTable {
    fn default() -> Self {
        Self::cycling(25)
    }
}

impl ShuntCostTable {
    pub const DEFAULT_FALLBACK: f64 = 300.0;

    /// Cost levels a stabling position can fall into.
    pub const COST_LEVELS: [f64; 7] = [120.0, 180.0, 240.0, 300.0, 420.0, 600.0, 900.0];

    pub fn new(costs: BTreeMap<u32, f64>, fallback: f64) -> Self {
        Self { costs, fallback }
    }

    /// An empty table; every position costs the fallback.
    pub fn empty() -> Self {
        Self::new(BTreeMap::new(), Self::DEFAULT_FALLBACK)
    }

    /// Deterministic table assigning `COST_LEVELS` round-robin to `0..positions`.
    pub fn cycling(positions: u32) -> Self {
        let costs = (0..positions)
            .map(|p| (p, Self::COST_LEVELS[p as usize % Self::COST_LEVELS.len()]))
            .collect();
        Self::new(costs, Self::DEFAULT_FALLBACK)
    }

    #[inline]
    pub fn get(&self, pos: u32) -> Option<Cost> {
        self.costs.get(&pos).copied().map(Cost::new)
    }

    /// Cost of `pos`, or the fallback when unmapped.
    #[inline]
    pub fn cost_of(&self, pos: u32) -> Cost {
        self.get(pos).unwrap_or(Cost::new(self.fallback))
    }

    #[inline]
    pub fn fallback(&self) -> Cost {
        Cost::new(self.fallback)
    }

    pub fn insert(&mut self, pos: u32, cost: f64) -> Option<f64> {
        self.costs.insert(pos, cost)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.costs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.costs.is_empty()
    }
}

/// Parameters of one fleet scheduling run.
///
/// Field names serialize in the upper-case form used by planners' config
/// sheets, e.g. `A_THRESHOLD_KM`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct SchedulingConfig {
    pub a_threshold_km: f64,
    pub b_threshold_km: f64,
    pub ioh_threshold_km: f64,
    pub poh_threshold_km: f64,

    pub num_inspection_bays: usize,
    pub num_workshop_bays: usize,
    pub num_stabling_slots: usize,

    pub required_in_service: usize,
    pub min_reserve: usize,
    pub candidate_pool_size: usize,

    pub w_shunt: f64,
    pub w_mileage: f64,
    pub w_expected_failure: f64,
    pub w_over_ibl: f64,
    pub w_over_workshop: f64,
    pub w_short_in_service: f64,
    pub w_cleaning_miss: f64,
    /// Multiplies branding hours into the branding term, which is subtracted
    /// from the cost. Configured negative.
    pub w_branding: f64,
    pub unscheduled_withdrawal_cost: f64,

    /// Days without cleaning after which the cleaning-miss penalty applies.
    pub cleaning_miss_days: u32,

    #[serde(rename = "shunt_cost_by_pos")]
    pub shunt_cost_by_pos: ShuntCostTable,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            a_threshold_km: 5_000.0,
            b_threshold_km: 15_000.0,
            ioh_threshold_km: 420_000.0,
            poh_threshold_km: 840_000.0,

            num_inspection_bays: 3,
            num_workshop_bays: 2,
            num_stabling_slots: 25,

            required_in_service: 10,
            min_reserve: 2,
            candidate_pool_size: 15,

            w_shunt: 1.0,
            w_mileage: 0.0001,
            w_expected_failure: 0.00001,
            w_over_ibl: 200_000.0,
            w_over_workshop: 250_000.0,
            w_short_in_service: 500_000.0,
            w_cleaning_miss: 20_000.0,
            w_branding: -1_000.0,
            unscheduled_withdrawal_cost: 100_000.0,

            cleaning_miss_days: 30,

            shunt_cost_by_pos: ShuntCostTable::default(),
        }
    }
}

/// Tuning of readiness scoring, replacement search and projected departures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastParameters {
    pub cleaning_threshold_days: u32,
    pub min_branding_hours: f64,
    /// Readiness points lost per `mileage_deviation_unit_km` away from the assumed average.
    pub runtime_balance_weight: f64,
    pub assumed_average_mileage_km: f64,
    pub mileage_deviation_unit_km: f64,
    /// Readiness points a candidate loses per shunting step.
    pub shunting_penalty: f64,
    pub readiness_threshold: f64,
    pub primary_departure_offset_minutes: i64,
    pub overflow_departure_offset_minutes: i64,
    pub departure_interval_minutes: i64,
}

impl Default for ForecastParameters {
    fn default() -> Self {
        Self {
            cleaning_threshold_days: 30,
            min_branding_hours: 8.0,
            runtime_balance_weight: 0.1,
            assumed_average_mileage_km: 250_000.0,
            mileage_deviation_unit_km: 10_000.0,
            shunting_penalty: 10.0,
            readiness_threshold: 70.0,
            primary_departure_offset_minutes: 6 * 60,
            overflow_departure_offset_minutes: 10 * 60,
            departure_interval_minutes: 30,
        }
    }
}

impl ForecastParameters {
    #[inline]
    pub fn readiness_threshold(&self) -> ReadinessScore {
        ReadinessScore::new(self.readiness_threshold)
    }

    /// Projected departure offset of the `index`-th primary bay occupant.
    #[inline]
    pub fn primary_departure(&self, index: usize) -> TimeDelta {
        self.staggered(self.primary_departure_offset_minutes, index)
    }

    /// Projected departure offset of the `index`-th overflow bay occupant.
    #[inline]
    pub fn overflow_departure(&self, index: usize) -> TimeDelta {
        self.staggered(self.overflow_departure_offset_minutes, index)
    }

    fn staggered(&self, base_minutes: i64, index: usize) -> TimeDelta {
        let idx = i64::try_from(index).unwrap_or(i64::MAX);
        let minutes =
            base_minutes.saturating_add(idx.saturating_mul(self.departure_interval_minutes));
        TimeDelta::try_minutes(minutes).unwrap_or(TimeDelta::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shunt_cost_falls_back_for_unmapped_position() {
        let mut table = ShuntCostTable::empty();
        table.insert(2, 180.0);
        assert_eq!(table.cost_of(2), Cost::new(180.0));
        assert_eq!(table.cost_of(99), Cost::new(300.0));
        assert_eq!(table.get(99), None);
    }

    #[test]
    fn test_cycling_table_uses_cost_levels() {
        let t = ShuntCostTable::cycling(9);
        assert_eq!(t.len(), 9);
        assert_eq!(t.cost_of(0), Cost::new(120.0));
        assert_eq!(t.cost_of(6), Cost::new(900.0));
        assert_eq!(t.cost_of(7), Cost::new(120.0));
    }

    #[test]
    fn test_default_scheduling_config_matches_yard_defaults() {
        let c = SchedulingConfig::default();
        assert_eq!(c.a_threshold_km, 5_000.0);
        assert_eq!(c.num_workshop_bays, 2);
        assert_eq!(c.required_in_service, 10);
        assert!(c.w_branding < 0.0);
    }

    #[test]
    fn test_scheduling_config_uses_upper_case_keys_and_defaults() {
        let json = r#"{ "A_THRESHOLD_KM": 4000, "REQUIRED_IN_SERVICE": 3 }"#;
        let c: SchedulingConfig = serde_json::from_str(json).unwrap();
        assert_eq!(c.a_threshold_km, 4_000.0);
        assert_eq!(c.required_in_service, 3);
        assert_eq!(c.b_threshold_km, 15_000.0);

        let v = serde_json::to_value(&c).unwrap();
        assert!(v.get("W_CLEANING_MISS").is_some());
        assert!(v.get("shunt_cost_by_pos").is_some());
    }

    #[test]
    fn test_departures_are_staggered() {
        let p = ForecastParameters::default();
        assert_eq!(p.primary_departure(0), TimeDelta::hours(6));
        assert_eq!(p.primary_departure(2), TimeDelta::hours(7));
        assert_eq!(p.overflow_departure(1), TimeDelta::minutes(630));
    }
}
