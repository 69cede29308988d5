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

use rail_alloc_core::{
    cost::{Cost, Score},
    mileage::Kilometers,
};
use rail_alloc_model::prelude::*;
use std::{cmp::Ordering, collections::HashSet, fmt::Display};
use tracing::{debug, instrument, trace};

/// Weighted terms of one train's cost. `total` is what the ranking uses.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CostBreakdown {
    pub shunt: Cost,
    pub mileage_variance: Cost,
    pub expected_failure: Cost,
    pub cleaning_penalty: Cost,
    pub branding_reward: Cost,
}

impl CostBreakdown {
    #[inline]
    pub fn total(&self) -> Cost {
        self.shunt + self.mileage_variance + self.expected_failure + self.cleaning_penalty
            - self.branding_reward
    }
}

impl Display for CostBreakdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "shunt: {}, mileage: {}, failure: {}, cleaning: {}, branding: {}",
            self.shunt.value(),
            self.mileage_variance.value(),
            self.expected_failure.value(),
            self.cleaning_penalty.value(),
            self.branding_reward.value()
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredTrain<'t> {
    pub train: &'t Train,
    pub breakdown: CostBreakdown,
}

impl<'t> ScoredTrain<'t> {
    #[inline]
    pub fn cost(&self) -> Cost {
        self.breakdown.total()
    }

    #[inline]
    pub fn score(&self) -> Score {
        self.cost().to_score()
    }
}

/// Score descending, train id ascending.
#[inline]
pub fn rank_order(a: &ScoredTrain<'_>, b: &ScoredTrain<'_>) -> Ordering {
    b.score()
        .total_cmp(&a.score())
        .then_with(|| a.train.id().cmp(b.train.id()))
}

/// Orders eligible trains from most to least preferred for service.
pub trait Scorer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Ranks `eligible`; `fleet` is the full train list the mileage mean is
    /// taken over. Every eligible train appears exactly once in the output.
    fn rank<'t>(
        &self,
        eligible: &[&'t Train],
        fleet: &[Train],
        config: &SchedulingConfig,
    ) -> Vec<ScoredTrain<'t>>;
}

impl<S: Scorer + ?Sized> Scorer for Box<S> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn rank<'t>(
        &self,
        eligible: &[&'t Train],
        fleet: &[Train],
        config: &SchedulingConfig,
    ) -> Vec<ScoredTrain<'t>> {
        (**self).rank(eligible, fleet, config)
    }
}

/// Linear weighted sum of shunting, mileage balance, expected failure,
/// cleaning and branding terms.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedCostScorer;

impl WeightedCostScorer {
    pub fn breakdown(
        train: &Train,
        mean_mileage: Kilometers,
        config: &SchedulingConfig,
    ) -> CostBreakdown {
        let table = &config.shunt_cost_by_pos;
        let shunt_cost = match table.get(train.pos()) {
            Some(c) => c,
            None => {
                debug!(
                    train = %train.id(),
                    pos = train.pos(),
                    fallback = table.fallback().value(),
                    "Unmapped stabling position"
                );
                table.fallback()
            }
        };
        let deviation = train.mileage_total() - mean_mileage;
        let expected_failure = train.p_fail() * config.unscheduled_withdrawal_cost;
        let cleaning_penalty = if train.days_since_clean() >= config.cleaning_miss_days {
            config.w_cleaning_miss
        } else {
            0.0
        };

        CostBreakdown {
            shunt: shunt_cost.weighted(config.w_shunt),
            mileage_variance: Cost::new(deviation * deviation).weighted(config.w_mileage),
            expected_failure: Cost::new(expected_failure).weighted(config.w_expected_failure),
            cleaning_penalty: Cost::new(cleaning_penalty),
            branding_reward: Cost::new(train.branding_hours()).weighted(config.w_branding),
        }
    }
}

impl Scorer for WeightedCostScorer {
    fn name(&self) -> &'static str {
        "WeightedCost"
    }

    #[instrument(level = "debug", skip_all, fields(eligible = eligible.len()))]
    fn rank<'t>(
        &self,
        eligible: &[&'t Train],
        fleet: &[Train],
        config: &SchedulingConfig,
    ) -> Vec<ScoredTrain<'t>> {
        let Some(mean) = Kilometers::mean(fleet.iter().map(Train::mileage_total)) else {
            return Vec::new();
        };
        let mut scored: Vec<ScoredTrain<'t>> = eligible
            .iter()
            .map(|&train| {
                let breakdown = Self::breakdown(train, mean, config);
                trace!(train = %train.id(), %breakdown, "Scored");
                ScoredTrain { train, breakdown }
            })
            .collect();
        scored.sort_by(rank_order);
        scored
    }
}

/// Restricts the contest for service to a pool of the most reliable trains.
///
/// The pool holds the `CANDIDATE_POOL_SIZE` eligible trains with the lowest
/// failure probability, ties broken by shunt cost and then id. The pool is
/// ranked by the inner scorer and the rest follows behind it in the inner
/// scorer's order.
#[derive(Debug, Clone, Copy, Default)]
pub struct CandidatePoolScorer<S = WeightedCostScorer> {
    inner: S,
}

impl<S: Scorer> CandidatePoolScorer<S> {
    #[inline]
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    fn pool<'t>(eligible: &[&'t Train], config: &SchedulingConfig) -> HashSet<&'t TrainId> {
        let mut by_reliability: Vec<&'t Train> = eligible.to_vec();
        by_reliability.sort_by(|a, b| {
            a.p_fail()
                .total_cmp(&b.p_fail())
                .then_with(|| {
                    let ca = config.shunt_cost_by_pos.cost_of(a.pos()).value();
                    let cb = config.shunt_cost_by_pos.cost_of(b.pos()).value();
                    ca.total_cmp(&cb)
                })
                .then_with(|| a.id().cmp(b.id()))
        });
        by_reliability
            .into_iter()
            .take(config.candidate_pool_size)
            .map(Train::id)
            .collect()
    }
}

impl<S: Scorer> Scorer for CandidatePoolScorer<S> {
    fn name(&self) -> &'static str {
        "CandidatePool"
    }

    #[instrument(
        level = "debug",
        skip_all,
        fields(eligible = eligible.len(), pool = config.candidate_pool_size)
    )]
    fn rank<'t>(
        &self,
        eligible: &[&'t Train],
        fleet: &[Train],
        config: &SchedulingConfig,
    ) -> Vec<ScoredTrain<'t>> {
        let pool = Self::pool(eligible, config);
        let (mut ranked, rest): (Vec<_>, Vec<_>) = self
            .inner
            .rank(eligible, fleet, config)
            .into_iter()
            .partition(|s| pool.contains(s.train.id()));
        debug!(in_pool = ranked.len(), outside = rest.len(), "Candidate pool formed");
        ranked.extend(rest);
        ranked
    }
}
