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
    iter::Sum,
    ops::{Add, AddAssign, Sub},
};

/// Fixed physical index of a bay along the stabling yard.
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct BayPosition(u32);

impl BayPosition {
    #[inline]
    pub const fn new(v: u32) -> Self {
        BayPosition(v)
    }

    #[inline]
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for BayPosition {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BayPosition({})", self.0)
    }
}

impl From<u32> for BayPosition {
    #[inline]
    fn from(v: u32) -> Self {
        BayPosition(v)
    }
}

/// Moving between two bays costs one shunting step per position crossed.
impl Sub<BayPosition> for BayPosition {
    type Output = ShuntingSteps;

    #[inline]
    fn sub(self, rhs: BayPosition) -> Self::Output {
        ShuntingSteps::new(self.0.abs_diff(rhs.0))
    }
}

/// Units of physical bay-to-bay movement, used as a disruption cost proxy.
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct ShuntingSteps(u32);

impl ShuntingSteps {
    #[inline]
    pub const fn new(v: u32) -> Self {
        ShuntingSteps(v)
    }

    #[inline]
    pub const fn zero() -> Self {
        ShuntingSteps(0)
    }

    #[inline]
    pub const fn value(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn saturating_add(self, rhs: ShuntingSteps) -> Self {
        ShuntingSteps(self.0.saturating_add(rhs.0))
    }
}

impl std::fmt::Display for ShuntingSteps {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for ShuntingSteps {
    type Output = ShuntingSteps;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        ShuntingSteps(
            self.0
                .checked_add(rhs.0)
                .expect("overflow in ShuntingSteps + ShuntingSteps"),
        )
    }
}

impl AddAssign for ShuntingSteps {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for ShuntingSteps {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(ShuntingSteps::zero(), |a, b| a + b)
    }
}
