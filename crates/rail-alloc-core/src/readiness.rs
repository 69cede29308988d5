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

use std::cmp::Ordering;

/// Composite 0..=100 estimate of how fit a train is to depart right now.
#[repr(transparent)]
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug)]
pub struct ReadinessScore(f64);

impl ReadinessScore {
    pub const MIN: ReadinessScore = ReadinessScore(0.0);
    pub const MAX: ReadinessScore = ReadinessScore(100.0);

    /// Creates a score, clamping into `[0, 100]`. NaN maps to zero.
    #[inline]
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self::MIN;
        }
        ReadinessScore(value.clamp(Self::MIN.0, Self::MAX.0))
    }

    #[inline]
    pub const fn value(self) -> f64 {
        self.0
    }

    #[inline]
    pub fn meets(self, threshold: ReadinessScore) -> bool {
        self.0 >= threshold.0
    }

    #[inline]
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Default for ReadinessScore {
    fn default() -> Self {
        Self::MAX
    }
}

impl std::fmt::Display for ReadinessScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

impl From<f64> for ReadinessScore {
    #[inline]
    fn from(v: f64) -> Self {
        ReadinessScore::new(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_readiness_score_clamps() {
        assert_eq!(ReadinessScore::new(150.0).value(), 100.0);
        assert_eq!(ReadinessScore::new(-3.0).value(), 0.0);
        assert_eq!(ReadinessScore::new(42.5).value(), 42.5);
    }

    #[test]
    fn test_readiness_score_nan_is_zero() {
        assert_eq!(ReadinessScore::new(f64::NAN), ReadinessScore::MIN);
    }

    #[test]
    fn test_readiness_score_meets_threshold_inclusive() {
        let threshold = ReadinessScore::new(70.0);
        assert!(ReadinessScore::new(70.0).meets(threshold));
        assert!(!ReadinessScore::new(69.9).meets(threshold));
    }

    #[test]
    fn test_readiness_score_display() {
        assert_eq!(format!("{}", ReadinessScore::new(85.26)), "85.3");
    }
}
