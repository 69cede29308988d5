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

//! # Rail Allocation Model (`rail-alloc-model`)
//!
//! Data model for nightly fleet role scheduling and stabling bay allocation.
//! It builds on the typed primitives of `rail-alloc-core` to describe the
//! inputs and outputs of the engines in `rail-alloc-solver`.
//!
//! ## Key Data Structures
//!
//! - **`Train`**: per-cycle snapshot of one vehicle, covering mileage counters,
//!   maintenance state, failure probability, stabling position, cleaning age,
//!   fitness certificates and branding exposure.
//!
//! - **`SchedulingConfig`**: thresholds, capacities, quotas and cost weights of
//!   one scheduling run, plus the shunt cost table per stabling position.
//!
//! - **`ScheduleResult` / `Schedule`**: one role per train (`IN_SERVICE`,
//!   `STANDBY`, `IBL`, `WORKSHOP`) with the reason, score and departure slot,
//!   together with counts and non-binding diagnostics.
//!
//! - **`BayConfiguration`**: the fixed yard layout of primary, standby and
//!   overflow bays with their physical positions.
//!
//! - **`AllocationPlan`**: bays with their occupants, an append-only change
//!   log and occupancy and shunting counters.
//!
//! - **`TrainReadiness`**: the latest readiness assessment of a train.
//!
//! Raw tabular input is turned into trains by [`ingest`]; [`generator`]
//! produces seeded synthetic fleets.

pub mod bay;
pub mod config;
pub mod err;
pub mod generator;
pub mod id;
pub mod ingest;
pub mod plan;
pub mod readiness;
pub mod schedule;
pub mod train;

pub mod prelude {
    pub use crate::bay::{BayConfiguration, BayDefinition, BayType};
    pub use crate::config::{ForecastParameters, SchedulingConfig, ShuntCostTable};
    pub use crate::err::{BayConfigurationError, IngestError, PlanValidationError};
    pub use crate::id::{BayId, PlanId, TrainId};
    pub use crate::plan::{
        AllocationChange, AllocationPlan, BayAssignment, ChangeKind, PlanMode, PlanSummary,
    };
    pub use crate::readiness::{CleaningStatus, JobCardStatus, ReadinessSignal, TrainReadiness};
    pub use crate::schedule::{
        Assignment, Schedule, ScheduleDiagnostics, ScheduleResult, ScheduleSummary,
    };
    pub use crate::train::{Certificate, FitnessCertificates, MaintenanceState, Train};
}
