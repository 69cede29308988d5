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
    monitor::ReadinessSource,
    readiness::ReadinessMonitor,
};
use parking_lot::Mutex;
use rail_alloc_core::readiness::ReadinessScore;
use rail_alloc_model::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, instrument};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatorConfig {
    pub seed: u64,
    /// Largest change of a readiness score in one step, either direction.
    pub drift: f64,
    /// Probability that a train reports ready on a given step.
    pub ready_rate: f64,
    /// Probability that a train starts with an open job card.
    pub open_job_card_rate: f64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            drift: 5.0,
            ready_rate: 0.9,
            open_job_card_rate: 0.2,
        }
    }
}

struct SimState {
    rng: ChaCha8Rng,
    current: Vec<TrainReadiness>,
}

/// Seeded stand-in for a live readiness feed.
///
/// The first call assesses every scheduled train, opening job cards at random
/// and marking trains ready when they meet the threshold. Every later call
/// lets scores drift and redraws the ready flags.
pub struct ReadinessSimulator<C = SystemClock> {
    monitor: ReadinessMonitor<C>,
    config: SimulatorConfig,
    state: Mutex<SimState>,
}

impl<C: Clock> ReadinessSimulator<C> {
    pub fn new(monitor: ReadinessMonitor<C>, config: SimulatorConfig) -> Self {
        Self {
            monitor,
            state: Mutex::new(SimState {
                rng: ChaCha8Rng::seed_from_u64(config.seed),
                current: Vec::new(),
            }),
            config,
        }
    }

    #[inline]
    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// The readiness reported by the last call.
    pub fn current(&self) -> Vec<TrainReadiness> {
        self.state.lock().current.clone()
    }

    fn baseline(&self, rng: &mut ChaCha8Rng, results: &[ScheduleResult]) -> Vec<TrainReadiness> {
        let open_rate = self.config.open_job_card_rate.clamp(0.0, 1.0);
        let threshold = self.monitor.params().readiness_threshold();
        results
            .iter()
            .map(|r| {
                let job_card = if rng.random_bool(open_rate) {
                    JobCardStatus::Open
                } else {
                    JobCardStatus::Closed
                };
                let signal = ReadinessSignal::default().with_job_card(job_card);
                let mut readiness = self.monitor.assess(r.train(), Some(&signal));
                readiness.is_ready = readiness.score().meets(threshold);
                readiness
            })
            .collect()
    }

    fn drift(&self, rng: &mut ChaCha8Rng, current: &mut [TrainReadiness]) {
        let drift = self.config.drift.abs();
        let ready_rate = self.config.ready_rate.clamp(0.0, 1.0);
        let now = self.monitor.clock().now();
        for r in current.iter_mut() {
            let delta = if drift > 0.0 {
                rng.random_range(-drift..=drift)
            } else {
                0.0
            };
            r.readiness_score = ReadinessScore::new(r.readiness_score + delta).value();
            r.is_ready = rng.random_bool(ready_rate);
            r.last_updated = now;
        }
    }

    /// Advances the simulation by one step. A change in the scheduled trains
    /// restarts it from a fresh baseline.
    #[instrument(level = "debug", skip_all, fields(trains = results.len()))]
    pub fn step(&self, results: &[ScheduleResult]) -> Vec<TrainReadiness> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let same_trains = state.current.len() == results.len()
            && state.current.iter().zip(results).all(|(c, r)| &c.id == r.id());
        if same_trains && !results.is_empty() {
            self.drift(&mut state.rng, &mut state.current);
        } else {
            state.current = self.baseline(&mut state.rng, results);
            debug!("Readiness baseline drawn");
        }
        state.current.clone()
    }
}

impl<C: Clock> ReadinessSource for ReadinessSimulator<C> {
    fn readiness(&self, results: &[ScheduleResult]) -> Vec<TrainReadiness> {
        self.step(results)
    }
}
