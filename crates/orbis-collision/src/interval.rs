//! Closed 1-D intervals used for separating-axis tests.

/// Tolerance used by overlap and degeneracy checks.
pub const EPSILON: f64 = 1e-5;

/// A closed interval `[min, max]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Interval {
    /// Lower bound.
    pub min: f64,
    /// Upper bound.
    pub max: f64,
}

impl Interval {
    /// Create an interval from two bounds in any order.
    #[must_use]
    pub fn new(a: f64, b: f64) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// The interval `[center - radius, center + radius]`.
    #[must_use]
    pub fn around(center: f64, radius: f64) -> Self {
        Self::new(center - radius, center + radius)
    }

    /// Whether the two intervals overlap, allowing [`EPSILON`] of slack.
    #[must_use]
    pub fn intersects(&self, other: &Interval) -> bool {
        self.min - EPSILON < other.max && other.min - EPSILON < self.max
    }

    /// Distance from `value` to the interval (zero inside).
    #[must_use]
    pub fn distance_to(&self, value: f64) -> f64 {
        (self.min - value).max(value - self.max).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_orders_bounds() {
        let i = Interval::new(3.0, -1.0);
        assert_eq!(i.min, -1.0);
        assert_eq!(i.max, 3.0);
    }

    #[test]
    fn test_overlap_and_separation() {
        let a = Interval::new(0.0, 1.0);
        assert!(a.intersects(&Interval::new(0.5, 2.0)));
        assert!(a.intersects(&Interval::new(-5.0, 5.0)));
        assert!(!a.intersects(&Interval::new(1.1, 2.0)));
        assert!(!Interval::new(1.1, 2.0).intersects(&a));
    }

    /// Touching intervals count as overlapping thanks to the epsilon slack.
    #[test]
    fn test_touching_intervals_overlap() {
        let a = Interval::new(0.0, 1.0);
        assert!(a.intersects(&Interval::new(1.0, 2.0)));
        assert!(a.intersects(&Interval::new(1.0 + EPSILON * 0.5, 2.0)));
        assert!(!a.intersects(&Interval::new(1.0 + EPSILON * 2.0, 2.0)));
    }

    #[test]
    fn test_distance_to_value() {
        let a = Interval::around(0.0, 1.0);
        assert_eq!(a.distance_to(0.5), 0.0);
        assert_eq!(a.distance_to(3.0), 2.0);
        assert_eq!(a.distance_to(-4.0), 3.0);
    }
}
