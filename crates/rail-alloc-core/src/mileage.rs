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

use std::{
    cmp::Ordering,
    iter::Sum,
    ops::{Add, AddAssign, Sub},
};

/// Distance run by a vehicle, in kilometres.
#[repr(transparent)]
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug, Default)]
pub struct Kilometers(f64);

impl Kilometers {
    #[inline]
    pub const fn new(km: f64) -> Self {
        Kilometers(km)
    }

    #[inline]
    pub const fn zero() -> Self {
        Kilometers(0.0)
    }

    #[inline]
    pub const fn value(self) -> f64 {
        self.0
    }

    #[inline]
    pub fn is_non_negative(self) -> bool {
        self.0 >= 0.0
    }

    /// Absolute distance between two odometer readings.
    #[inline]
    pub fn abs_diff(self, other: Kilometers) -> Kilometers {
        Kilometers((self.0 - other.0).abs())
    }

    #[inline]
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }

    /// Arithmetic mean, or `None` for an empty input.
    pub fn mean<I>(iter: I) -> Option<Kilometers>
    where
        I: IntoIterator<Item = Kilometers>,
    {
        let (sum, n) = iter
            .into_iter()
            .fold((0.0, 0usize), |(s, n), km| (s + km.0, n + 1));
        if n == 0 {
            None
        } else {
            Some(Kilometers(sum / n as f64))
        }
    }
}

impl std::fmt::Display for Kilometers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}km", self.0)
    }
}

impl From<f64> for Kilometers {
    #[inline]
    fn from(v: f64) -> Self {
        Kilometers(v)
    }
}

impl Add for Kilometers {
    type Output = Kilometers;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Kilometers(self.0 + rhs.0)
    }
}

impl AddAssign for Kilometers {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

/// Signed difference; use [`Kilometers::abs_diff`] for a distance.
impl Sub for Kilometers {
    type Output = f64;

    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        self.0 - rhs.0
    }
}

impl Sum for Kilometers {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Kilometers::zero(), |a, b| a + b)
    }
}
