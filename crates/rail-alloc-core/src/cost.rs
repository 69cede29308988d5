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

use num_traits::{Float, Zero};
use std::{
    cmp::Ordering,
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign},
};

/// A scalar cost term of the fleet scoring model.
///
/// Lower is better. A [`Score`] is the negated cost, so higher scores are
/// preferred when ranking candidates.
#[repr(transparent)]
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug, Default)]
pub struct Cost<T = f64>(T);

impl<T: Float> Cost<T> {
    #[inline]
    pub const fn new(value: T) -> Self {
        Cost(value)
    }

    #[inline]
    pub fn zero() -> Self {
        Cost(T::zero())
    }

    #[inline]
    pub fn value(self) -> T {
        self.0
    }

    /// Scales the cost by a model weight. Weights may be negative.
    #[inline]
    pub fn weighted(self, weight: T) -> Self {
        Cost(self.0 * weight)
    }

    #[inline]
    pub fn to_score(self) -> Score<T> {
        Score(-self.0)
    }

    #[inline]
    pub fn total_cmp(&self, other: &Self) -> Ordering
    where
        T: Into<f64>,
    {
        self.0.into().total_cmp(&other.0.into())
    }
}

impl<T: Float + Display> Display for Cost<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Cost({})", self.0)
    }
}

impl<T: Float> Add for Cost<T> {
    type Output = Cost<T>;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Cost(self.0 + rhs.0)
    }
}

impl<T: Float> AddAssign for Cost<T> {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.0 = self.0 + rhs.0;
    }
}

impl<T: Float> Sub for Cost<T> {
    type Output = Cost<T>;

    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        Cost(self.0 - rhs.0)
    }
}

impl<T: Float> SubAssign for Cost<T> {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        self.0 = self.0 - rhs.0;
    }
}

impl<T: Float> Mul<T> for Cost<T> {
    type Output = Cost<T>;

    #[inline]
    fn mul(self, rhs: T) -> Self::Output {
        Cost(self.0 * rhs)
    }
}

impl<T: Float> Neg for Cost<T> {
    type Output = Cost<T>;

    #[inline]
    fn neg(self) -> Self::Output {
        Cost(-self.0)
    }
}

impl<T: Float> Sum for Cost<T> {
    #[inline]
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Cost::zero(), |a, b| a + b)
    }
}

impl<'a, T: Float> Sum<&'a Cost<T>> for Cost<T> {
    #[inline]
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.fold(Cost::zero(), |a, b| a + *b)
    }
}

impl<T: Float> Zero for Cost<T> {
    fn zero() -> Self {
        Cost(T::zero())
    }

    fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

/// Preference value of a candidate; the negation of its [`Cost`].
#[repr(transparent)]
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug, Default)]
pub struct Score<T = f64>(T);

impl<T: Float> Score<T> {
    #[inline]
    pub const fn new(value: T) -> Self {
        Score(value)
    }

    #[inline]
    pub fn value(self) -> T {
        self.0
    }

    #[inline]
    pub fn to_cost(self) -> Cost<T> {
        Cost(-self.0)
    }
}

impl Score<f64> {
    /// Total order over scores, NaN included, so rankings stay deterministic.
    #[inline]
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl<T: Float + Display> Display for Score<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Score({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_creation_and_value() {
        let cost = Cost::new(100.0);
        assert_eq!(cost.value(), 100.0);
    }

    #[test]
    fn test_cost_display() {
        let cost = Cost::new(100.5);
        assert_eq!(format!("{}", cost), "Cost(100.5)");
    }

    #[test]
    fn test_cost_arithmetic() {
        let a = Cost::new(100.0);
        let b = Cost::new(50.0);
        assert_eq!((a + b).value(), 150.0);
        assert_eq!((a - b).value(), 50.0);
        assert_eq!((a * 2.0).value(), 200.0);
        assert_eq!((-a).value(), -100.0);
    }

    #[test]
    fn test_cost_assign_ops() {
        let mut cost = Cost::new(100.0);
        cost += Cost::new(50.0);
        assert_eq!(cost.value(), 150.0);
        cost -= Cost::new(25.0);
        assert_eq!(cost.value(), 125.0);
    }

    #[test]
    fn test_cost_weighted_accepts_negative_weights() {
        let branding = Cost::new(8.0).weighted(-1000.0);
        assert_eq!(branding.value(), -8000.0);
    }

    #[test]
    fn test_cost_sum() {
        let costs = [Cost::new(1.0), Cost::new(2.0), Cost::new(3.5)];
        let total: Cost<f64> = costs.iter().sum();
        assert_eq!(total.value(), 6.5);
        let owned: Cost<f64> = costs.into_iter().sum();
        assert_eq!(owned.value(), 6.5);
    }

    #[test]
    fn test_score_is_negated_cost() {
        let cost = Cost::new(420.0);
        let score = cost.to_score();
        assert_eq!(score.value(), -420.0);
        assert_eq!(score.to_cost(), cost);
    }

    #[test]
    fn test_score_total_cmp_orders_higher_first_when_reversed() {
        let mut scores = vec![Score::new(-10.0), Score::new(5.0), Score::new(-1.0)];
        scores.sort_by(|a, b| b.total_cmp(a));
        assert_eq!(
            scores.iter().map(|s| s.value()).collect::<Vec<_>>(),
            vec![5.0, -1.0, -10.0]
        );
    }
}
