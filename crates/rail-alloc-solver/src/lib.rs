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

//! # Rail Allocation Solver (`rail-alloc-solver`)
//!
//! Engines that turn a fleet snapshot into a nightly role schedule and a
//! stabling bay plan, and keep that plan current while trains report their
//! readiness.
//!
//! ## Pipeline
//!
//! 1. [`classify`] applies the hard constraints (maintenance state, overdue
//!    inspections, fitness certificates) under workshop and inspection bay
//!    capacity.
//! 2. [`score`] ranks the remaining trains through a pluggable [`score::Scorer`].
//! 3. [`allocate`] fills the in-service quota and leaves the rest on standby.
//!    [`schedule`] chains these steps.
//! 4. [`forecast`] lays the schedule out on the yard's bays.
//! 5. [`realloc`] swaps unready primary-bay trains for ready ones on each tick,
//!    and [`monitor`] runs those ticks on a timer.
//!
//! [`readiness`] scores how fit a train is to depart, and [`simulate`]
//! provides a seeded readiness feed for demos and tests.

pub mod allocate;
pub mod classify;
pub mod clock;
pub mod forecast;
pub mod monitor;
pub mod readiness;
pub mod realloc;
pub mod schedule;
pub mod score;
pub mod simulate;

pub mod prelude {
    pub use crate::clock::{Clock, FixedClock, SystemClock};
    pub use crate::forecast::BayPlanner;
    pub use crate::monitor::{
        MonitorConfig, MonitorError, ReadinessSource, RealTimeMonitor, SharedPlan,
    };
    pub use crate::readiness::ReadinessMonitor;
    pub use crate::realloc::{ReallocationEngine, ReplacementCandidate};
    pub use crate::schedule::{FleetScheduler, schedule_trains};
    pub use crate::score::{CandidatePoolScorer, Scorer, WeightedCostScorer};
    pub use crate::simulate::{ReadinessSimulator, SimulatorConfig};
}
