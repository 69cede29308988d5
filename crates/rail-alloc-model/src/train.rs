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

use crate::{err::UnknownMaintenanceStateError, id::TrainId};
use rail_alloc_core::mileage::Kilometers;
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

/// Maintenance state reported for a vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaintenanceState {
    #[default]
    Ok,
    /// Intermediate overhaul.
    Ioh,
    /// Periodic overhaul.
    Poh,
    HeavyRepair,
}

impl MaintenanceState {
    /// States that pin the vehicle to the workshop regardless of anything else.
    #[inline]
    pub fn requires_workshop(self) -> bool {
        matches!(
            self,
            MaintenanceState::Ioh | MaintenanceState::Poh | MaintenanceState::HeavyRepair
        )
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            MaintenanceState::Ok => "OK",
            MaintenanceState::Ioh => "IOH",
            MaintenanceState::Poh => "POH",
            MaintenanceState::HeavyRepair => "HEAVY_REPAIR",
        }
    }
}

impl Display for MaintenanceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MaintenanceState {
    type Err = UnknownMaintenanceStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OK" => Ok(MaintenanceState::Ok),
            "IOH" => Ok(MaintenanceState::Ioh),
            "POH" => Ok(MaintenanceState::Poh),
            "HEAVY_REPAIR" => Ok(MaintenanceState::HeavyRepair),
            _ => Err(UnknownMaintenanceStateError::new(s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Certificate {
    RollingStock,
    Signalling,
    Telecom,
}

impl Certificate {
    pub const ALL: [Certificate; 3] = [
        Certificate::RollingStock,
        Certificate::Signalling,
        Certificate::Telecom,
    ];

    pub const fn code(self) -> &'static str {
        match self {
            Certificate::RollingStock => "RS",
            Certificate::Signalling => "SIG",
            Certificate::Telecom => "TEL",
        }
    }
}

impl Display for Certificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// The three independent clearances a train needs before entering service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FitnessCertificates {
    #[serde(rename = "RS")]
    rolling_stock: bool,
    #[serde(rename = "SIG")]
    signalling: bool,
    #[serde(rename = "TEL")]
    telecom: bool,
}

impl Default for FitnessCertificates {
    fn default() -> Self {
        Self::all_valid()
    }
}

impl FitnessCertificates {
    #[inline]
    pub const fn new(rolling_stock: bool, signalling: bool, telecom: bool) -> Self {
        Self {
            rolling_stock,
            signalling,
            telecom,
        }
    }

    #[inline]
    pub const fn all_valid() -> Self {
        Self::new(true, true, true)
    }

    #[inline]
    pub fn is_valid(&self, certificate: Certificate) -> bool {
        match certificate {
            Certificate::RollingStock => self.rolling_stock,
            Certificate::Signalling => self.signalling,
            Certificate::Telecom => self.telecom,
        }
    }

    #[inline]
    pub fn all_passed(&self) -> bool {
        self.rolling_stock && self.signalling && self.telecom
    }

    /// Failed certificates in RS, SIG, TEL order.
    pub fn failures(&self) -> impl Iterator<Item = Certificate> + '_ {
        Certificate::ALL
            .into_iter()
            .filter(move |c| !self.is_valid(*c))
    }

    pub fn with(mut self, certificate: Certificate, valid: bool) -> Self {
        match certificate {
            Certificate::RollingStock => self.rolling_stock = valid,
            Certificate::Signalling => self.signalling = valid,
            Certificate::Telecom => self.telecom = valid,
        }
        self
    }
}

/// Snapshot of one vehicle for a single scheduling cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Train {
    id: TrainId,
    mileage_total: f64,
    #[serde(rename = "since_A")]
    since_a: f64,
    #[serde(rename = "since_B")]
    since_b: f64,
    state: MaintenanceState,
    p_fail: f64,
    pos: u32,
    days_since_clean: u32,
    fitness: FitnessCertificates,
    branding_hours: f64,
}

impl Train {
    #[inline]
    pub fn builder(id: impl Into<TrainId>) -> TrainBuilder {
        TrainBuilder::new(id)
    }

    #[inline]
    pub fn id(&self) -> &TrainId {
        &self.id
    }

    #[inline]
    pub fn mileage_total(&self) -> Kilometers {
        Kilometers::new(self.mileage_total)
    }

    /// Distance since the last A-type inspection.
    #[inline]
    pub fn since_a(&self) -> Kilometers {
        Kilometers::new(self.since_a)
    }

    /// Distance since the last B-type inspection.
    #[inline]
    pub fn since_b(&self) -> Kilometers {
        Kilometers::new(self.since_b)
    }

    #[inline]
    pub fn state(&self) -> MaintenanceState {
        self.state
    }

    /// Probability of an in-service failure during the next operating day.
    #[inline]
    pub fn p_fail(&self) -> f64 {
        self.p_fail
    }

    /// Stabling position index, key into the shunt cost table.
    #[inline]
    pub fn pos(&self) -> u32 {
        self.pos
    }

    #[inline]
    pub fn days_since_clean(&self) -> u32 {
        self.days_since_clean
    }

    #[inline]
    pub fn fitness(&self) -> &FitnessCertificates {
        &self.fitness
    }

    #[inline]
    pub fn branding_hours(&self) -> f64 {
        self.branding_hours
    }

    /// Starts an edit of this record. The original is left untouched.
    #[inline]
    pub fn edit(&self) -> TrainBuilder {
        TrainBuilder { train: self.clone() }
    }
}

impl Display for Train {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Train({}, state: {}, mileage: {}, pos: {})",
            self.id,
            self.state,
            self.mileage_total(),
            self.pos
        )
    }
}

/// Builds a [`Train`], starting from the defaults used for missing input fields.
#[derive(Debug, Clone)]
pub struct TrainBuilder {
    train: Train,
}

impl TrainBuilder {
    pub const DEFAULT_MILEAGE_TOTAL: f64 = 100_000.0;
    pub const DEFAULT_SINCE_A: f64 = 1_000.0;
    pub const DEFAULT_SINCE_B: f64 = 8_000.0;
    pub const DEFAULT_P_FAIL: f64 = 0.01;
    pub const DEFAULT_DAYS_SINCE_CLEAN: u32 = 10;
    pub const DEFAULT_BRANDING_HOURS: f64 = 8.0;

    pub fn new(id: impl Into<TrainId>) -> Self {
        Self {
            train: Train {
                id: id.into(),
                mileage_total: Self::DEFAULT_MILEAGE_TOTAL,
                since_a: Self::DEFAULT_SINCE_A,
                since_b: Self::DEFAULT_SINCE_B,
                state: MaintenanceState::Ok,
                p_fail: Self::DEFAULT_P_FAIL,
                pos: 0,
                days_since_clean: Self::DEFAULT_DAYS_SINCE_CLEAN,
                fitness: FitnessCertificates::all_valid(),
                branding_hours: Self::DEFAULT_BRANDING_HOURS,
            },
        }
    }

    pub fn mileage_total(mut self, km: f64) -> Self {
        self.train.mileage_total = km;
        self
    }

    pub fn since_a(mut self, km: f64) -> Self {
        self.train.since_a = km;
        self
    }

    pub fn since_b(mut self, km: f64) -> Self {
        self.train.since_b = km;
        self
    }

    pub fn state(mut self, state: MaintenanceState) -> Self {
        self.train.state = state;
        self
    }

    pub fn p_fail(mut self, p: f64) -> Self {
        self.train.p_fail = p;
        self
    }

    pub fn pos(mut self, pos: u32) -> Self {
        self.train.pos = pos;
        self
    }

    pub fn days_since_clean(mut self, days: u32) -> Self {
        self.train.days_since_clean = days;
        self
    }

    pub fn fitness(mut self, fitness: FitnessCertificates) -> Self {
        self.train.fitness = fitness;
        self
    }

    pub fn certificate(mut self, certificate: Certificate, valid: bool) -> Self {
        self.train.fitness = self.train.fitness.with(certificate, valid);
        self
    }

    pub fn branding_hours(mut self, hours: f64) -> Self {
        self.train.branding_hours = hours;
        self
    }

    #[inline]
    pub fn build(self) -> Train {
        self.train
    }
}
