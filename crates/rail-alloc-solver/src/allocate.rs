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

use crate::score::ScoredTrain;
use rail_alloc_model::prelude::*;
use std::cmp::Ordering;
use tracing::{debug, instrument};

/// Splits a ranked candidate list into the in-service quota and standby.
#[derive(Debug, Clone, Copy)]
pub struct RoleAllocator {
    required_in_service: usize,
}

impl RoleAllocator {
    #[inline]
    pub fn new(required_in_service: usize) -> Self {
        Self {
            required_in_service,
        }
    }

    #[inline]
    pub fn from_config(config: &SchedulingConfig) -> Self {
        Self::new(config.required_in_service)
    }

    /// The first `min(required, ranked.len())` trains go into service with slots
    /// `1..=k` in ranking order; the remainder stands by.
    #[instrument(
        level = "debug",
        skip_all,
        fields(ranked = ranked.len(), required = self.required_in_service)
    )]
    pub fn allocate(&self, ranked: &[ScoredTrain<'_>]) -> Vec<ScheduleResult> {
        let k = self.required_in_service.min(ranked.len());
        let results: Vec<ScheduleResult> = ranked
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let score = s.score().value();
                if i < k {
                    ScheduleResult::scored(
                        s.train,
                        Assignment::InService,
                        format!("Selected for service - Score: {score:.1}"),
                        score,
                        u32::try_from(i + 1).ok(),
                    )
                } else {
                    ScheduleResult::scored(
                        s.train,
                        Assignment::Standby,
                        format!("Reserve candidate - Score: {score:.1}"),
                        score,
                        None,
                    )
                }
            })
            .collect();
        debug!(in_service = k, standby = ranked.len() - k, "Roles allocated");
        results
    }
}

/// Final presentation order of a schedule: role priority, then slot for
/// in-service trains, then score descending with unscored results last, then id.
pub fn result_order(a: &ScheduleResult, b: &ScheduleResult) -> Ordering {
    a.assignment()
        .priority()
        .cmp(&b.assignment().priority())
        .then_with(|| match (a.slot(), b.slot()) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| match (a.score(), b.score()) {
            (Some(x), Some(y)) => y.total_cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.id().cmp(b.id()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::{CostBreakdown, rank_order};
    use rail_alloc_core::cost::Cost;

    fn scored(train: &Train, cost: f64) -> ScoredTrain<'_> {
        ScoredTrain {
            train,
            breakdown: CostBreakdown {
                shunt: Cost::new(cost),
                ..CostBreakdown::default()
            },
        }
    }

    #[test]
    fn test_quota_takes_top_ranked_with_slots() {
        let fleet: Vec<Train> = ["T01", "T02", "T03"]
            .into_iter()
            .map(|id| Train::builder(id).build())
            .collect();
        let mut ranked = vec![
            scored(&fleet[0], 300.0),
            scored(&fleet[1], 120.0),
            scored(&fleet[2], 180.0),
        ];
        ranked.sort_by(rank_order);
        let results = RoleAllocator::new(2).allocate(&ranked);

        assert_eq!(results[0].id().as_str(), "T02");
        assert_eq!(results[0].slot(), Some(1));
        assert_eq!(results[0].reason(), "Selected for service - Score: -120.0");
        assert_eq!(results[1].id().as_str(), "T03");
        assert_eq!(results[1].slot(), Some(2));
        assert_eq!(results[2].assignment(), Assignment::Standby);
        assert_eq!(results[2].slot(), None);
        assert_eq!(results[2].reason(), "Reserve candidate - Score: -300.0");
    }

    #[test]
    fn test_quota_larger_than_pool() {
        let t = Train::builder("T01").build();
        let results = RoleAllocator::new(10).allocate(&[scored(&t, 1.0)]);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].assignment(), Assignment::InService);
    }

    #[test]
    fn test_result_order() {
        let a = Train::builder("A").build();
        let b = Train::builder("B").build();
        let c = Train::builder("C").build();
        let mut results = vec![
            ScheduleResult::constrained(&a, Assignment::Workshop, "w"),
            ScheduleResult::constrained(&b, Assignment::Standby, "no bays"),
            ScheduleResult::scored(&c, Assignment::Standby, "r", -5.0, None),
            ScheduleResult::scored(&b, Assignment::InService, "s", -9.0, Some(2)),
            ScheduleResult::scored(&a, Assignment::InService, "s", -1.0, Some(1)),
            ScheduleResult::constrained(&c, Assignment::Ibl, "i"),
        ];
        results.sort_by(result_order);
        let order: Vec<_> = results
            .iter()
            .map(|r| (r.assignment(), r.id().as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                (Assignment::InService, "A"),
                (Assignment::InService, "B"),
                (Assignment::Standby, "C"),
                (Assignment::Standby, "B"),
                (Assignment::Ibl, "C"),
                (Assignment::Workshop, "A"),
            ]
        );
    }
}
