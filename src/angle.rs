// angle.rs: degree/radian value type with precomputed trig

use std::fmt;

/// Unit of the raw number handed to [`Angle::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Degrees,
    Radians,
}

/// Inputs further out than this many turns are folded with a remainder
/// before the normalization loop runs.
const LOOP_LIMIT: f64 = 360.0 * 1.0e4;

/// An angle with its trig values computed once at construction.
///
/// The degree value is unbounded: continuous spins produce angles such as
/// 1080°, and [`Angle::normalized`] maps them back into (-180, 180].
/// Equality compares degrees only.
#[derive(Debug, Clone, Copy)]
pub struct Angle {
    degrees: f64,
    radians: f64,
    sin: f64,
    cos: f64,
    tan: f64,
}

impl Angle {
    pub const ZERO: Angle = Angle {
        degrees: 0.0,
        radians: 0.0,
        sin: 0.0,
        cos: 1.0,
        tan: 0.0,
    };

    pub fn new(value: f64, unit: Unit) -> Self {
        match unit {
            Unit::Degrees => Self::from_degrees(value),
            Unit::Radians => Self::from_radians(value),
        }
    }

    pub fn from_degrees(degrees: f64) -> Self {
        Self::build(degrees, degrees.to_radians())
    }

    pub fn from_radians(radians: f64) -> Self {
        Self::build(radians.to_degrees(), radians)
    }

    fn build(degrees: f64, radians: f64) -> Self {
        Self {
            degrees,
            radians,
            sin: radians.sin(),
            cos: radians.cos(),
            tan: radians.tan(),
        }
    }

    /// Assignment in degrees; every derived field is recomputed.
    pub fn with_degrees(self, degrees: f64) -> Self {
        Self::from_degrees(degrees)
    }

    /// Assignment in radians; every derived field is recomputed.
    pub fn with_radians(self, radians: f64) -> Self {
        Self::from_radians(radians)
    }

    pub fn to_degrees(self) -> f64 {
        self.degrees
    }

    pub fn to_radians(self) -> f64 {
        self.radians
    }

    pub fn sin(self) -> f64 {
        self.sin
    }

    pub fn cos(self) -> f64 {
        self.cos
    }

    pub fn tan(self) -> f64 {
        self.tan
    }

    /// The same direction expressed in (-180, 180].
    ///
    /// Full turns are peeled off one at a time, so values a few turns out
    /// keep their exact fractional part. Non-finite input stays non-finite
    /// (±Infinity becomes NaN, like `inf % 360`).
    pub fn normalized(self) -> Self {
        let mut norm = self.degrees;
        if !norm.is_finite() {
            return Self::from_degrees(norm % 360.0);
        }
        if norm.abs() > LOOP_LIMIT {
            norm %= 360.0;
        }
        while norm > 180.0 {
            norm -= 360.0;
        }
        while norm <= -180.0 {
            norm += 360.0;
        }
        if norm == self.degrees {
            self
        } else {
            Self::from_degrees(norm)
        }
    }

    pub fn negated(self) -> Self {
        Self::from_degrees(-self.degrees)
    }

    /// Returns `self` untouched when already non-negative.
    pub fn absolute(self) -> Self {
        if self.degrees >= 0.0 {
            self
        } else {
            Self::from_degrees(self.degrees.abs())
        }
    }

    /// Offset by a plain number of degrees.
    pub fn add_degrees(self, delta: f64) -> Self {
        Self::from_degrees(self.degrees + delta)
    }
}

impl Default for Angle {
    fn default() -> Self {
        Self::ZERO
    }
}

impl PartialEq for Angle {
    fn eq(&self, other: &Self) -> bool {
        self.degrees == other.degrees
    }
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.degrees)
    }
}

impl serde::Serialize for Angle {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.degrees)
    }
}

impl<'de> serde::Deserialize<'de> for Angle {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        <f64 as serde::Deserialize>::deserialize(deserializer).map(Angle::from_degrees)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    #[test]
    fn derived_values_follow_degrees() {
        let a = Angle::from_degrees(90.0);
        assert_abs_diff_eq!(a.to_radians(), std::f64::consts::FRAC_PI_2, epsilon = 1e-12);
        assert_abs_diff_eq!(a.sin(), 1.0);
        assert_abs_diff_eq!(a.cos(), 0.0, epsilon = 1e-12);

        let b = Angle::new(std::f64::consts::PI, Unit::Radians);
        assert_abs_diff_eq!(b.to_degrees(), 180.0, epsilon = 1e-9);
        assert_abs_diff_eq!(b.tan(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn assignment_recomputes_everything() {
        let a = Angle::from_degrees(30.0).with_degrees(60.0);
        assert_abs_diff_eq!(a.cos(), 0.5, epsilon = 1e-12);
        let b = a.with_radians(0.0);
        assert_eq!(b.to_degrees(), 0.0);
        assert_eq!(b.sin(), 0.0);
    }

    #[test]
    fn normalizes_many_turns() {
        assert_eq!(Angle::from_degrees(1080.0).normalized().to_degrees(), 0.0);
        assert_eq!(Angle::from_degrees(370.0).normalized().to_degrees(), 10.0);
        assert_eq!(Angle::from_degrees(-190.0).normalized().to_degrees(), 170.0);
        assert_eq!(Angle::from_degrees(180.0).normalized().to_degrees(), 180.0);
        assert_eq!(Angle::from_degrees(-180.0).normalized().to_degrees(), 180.0);
    }

    #[test]
    fn non_finite_values_propagate() {
        assert!(Angle::from_degrees(f64::NAN).normalized().to_degrees().is_nan());
        assert!(Angle::from_degrees(f64::INFINITY).normalized().to_degrees().is_nan());
        assert!(Angle::from_degrees(f64::NEG_INFINITY).sin().is_nan());
        assert!(Angle::from_degrees(f64::NAN).absolute().to_degrees().is_nan());
    }

    #[test]
    fn absolute_short_circuits() {
        let a = Angle::from_degrees(12.5);
        assert_eq!(a.absolute(), a);
        assert_eq!(Angle::from_degrees(-12.5).absolute().to_degrees(), 12.5);
    }

    #[test]
    fn equality_is_by_degrees() {
        assert_eq!(Angle::from_degrees(45.0), Angle::new(45.0, Unit::Degrees));
        assert_ne!(Angle::from_degrees(10.0), Angle::from_degrees(370.0));
    }

    proptest! {
        #[test]
        fn normalized_lands_in_half_open_range(x in -1.0e6f64..1.0e6) {
            let n = Angle::from_degrees(x).normalized().to_degrees();
            prop_assert!(n > -180.0 && n <= 180.0);
            let turns = (x - n) / 360.0;
            prop_assert!((turns - turns.round()).abs() < 1e-6);
        }

        #[test]
        fn double_negation_is_identity(x in any::<f64>().prop_filter("finite", |v| v.is_finite())) {
            prop_assert_eq!(Angle::from_degrees(x).negated().negated().to_degrees(), x);
        }

        #[test]
        fn absolute_matches_abs(x in -1.0e9f64..1.0e9) {
            prop_assert_eq!(Angle::from_degrees(x).absolute().to_degrees(), x.abs());
        }
    }
}
