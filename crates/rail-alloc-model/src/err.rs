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

use crate::id::{BayId, TrainId};
use rail_alloc_core::position::BayPosition;
use std::fmt::Display;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnknownMaintenanceStateError {
    value: String,
}

impl UnknownMaintenanceStateError {
    #[inline]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    #[inline]
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl Display for UnknownMaintenanceStateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Unknown maintenance state '{}' (expected OK, IOH, POH or HEAVY_REPAIR)",
            self.value
        )
    }
}

impl std::error::Error for UnknownMaintenanceStateError {}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldOutOfRangeError {
    row: usize,
    field: &'static str,
    value: f64,
}

impl FieldOutOfRangeError {
    #[inline]
    pub fn new(row: usize, field: &'static str, value: f64) -> Self {
        Self { row, field, value }
    }

    #[inline]
    pub fn row(&self) -> usize {
        self.row
    }

    #[inline]
    pub fn field(&self) -> &'static str {
        self.field
    }

    #[inline]
    pub fn value(&self) -> f64 {
        self.value
    }
}

impl Display for FieldOutOfRangeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Row {}: field '{}' has out-of-range value {}",
            self.row, self.field, self.value
        )
    }
}

impl std::error::Error for FieldOutOfRangeError {}

#[derive(Debug, Clone, PartialEq)]
pub enum IngestError {
    /// No header or no data rows survived parsing.
    Empty,
    UnknownState {
        row: usize,
        source: UnknownMaintenanceStateError,
    },
    /// A field that must be numeric held text.
    NotANumber {
        row: usize,
        field: &'static str,
        value: String,
    },
    OutOfRange(FieldOutOfRangeError),
}

impl Display for IngestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestError::Empty => write!(f, "No valid train rows found in input"),
            IngestError::UnknownState { row, source } => write!(f, "Row {row}: {source}"),
            IngestError::NotANumber { row, field, value } => {
                write!(f, "Row {row}: field '{field}' is not a number: '{value}'")
            }
            IngestError::OutOfRange(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for IngestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IngestError::UnknownState { source, .. } => Some(source),
            IngestError::OutOfRange(e) => Some(e),
            _ => None,
        }
    }
}

impl From<FieldOutOfRangeError> for IngestError {
    fn from(value: FieldOutOfRangeError) -> Self {
        IngestError::OutOfRange(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BayConfigurationError {
    DuplicateBayId(BayId),
    DuplicatePosition {
        position: BayPosition,
        first: BayId,
        second: BayId,
    },
}

impl Display for BayConfigurationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BayConfigurationError::DuplicateBayId(id) => write!(f, "Duplicate bay id: {id}"),
            BayConfigurationError::DuplicatePosition {
                position,
                first,
                second,
            } => write!(f, "Bays {first} and {second} share {position}"),
        }
    }
}

impl std::error::Error for BayConfigurationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanValidationError {
    /// The same train occupies two bays at once.
    DuplicateOccupant {
        train: TrainId,
        first: BayId,
        second: BayId,
    },
    /// A bay appears more than once in the plan.
    DuplicateBay(BayId),
    /// A change record references a bay the plan does not contain.
    UnknownBay(BayId),
}

impl Display for PlanValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanValidationError::DuplicateOccupant {
                train,
                first,
                second,
            } => write!(f, "Train {train} occupies both {first} and {second}"),
            PlanValidationError::DuplicateBay(id) => write!(f, "Bay {id} listed twice"),
            PlanValidationError::UnknownBay(id) => write!(f, "Change references unknown bay {id}"),
        }
    }
}

impl std::error::Error for PlanValidationError {}
