//! Cold-resistance classification.
//!
//! Maps a plant's minimum tolerated temperature (°C) to a hardiness bucket.
//! The mapping is total: every input, including an absent value, yields a
//! label, and colder inputs never yield a more lenient bucket.
//!
//! | minimum temperature | bucket |
//! |---|---|
//! | none | unspecified |
//! | ≥ 5 | indoor only |
//! | 0 to 4 | outdoor with winter protection |
//! | −5 to −1 | tolerates light frost |
//! | −10 to −6 | tolerates moderate cold |
//! | −15 to −11 | highly cold-tolerant |
//! | < −15 | extremely cold-tolerant |

use core::fmt;

use serde::{Deserialize, Serialize};

/// A hardiness bucket.
///
/// Variants after `Unspecified` are declared from hardiest to most tender, so
/// the derived `Ord` agrees with [`ColdResistance::bucket_index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColdResistance {
    Unspecified,
    ExtremelyColdTolerant,
    HighlyColdTolerant,
    ModerateCold,
    LightFrost,
    WinterProtection,
    IndoorOnly,
}

impl ColdResistance {
    /// Classify a minimum temperature in whole degrees Celsius.
    #[must_use]
    pub const fn classify(min_temperature: Option<i32>) -> Self {
        match min_temperature {
            None => Self::Unspecified,
            Some(t) if t >= 5 => Self::IndoorOnly,
            Some(t) if t >= 0 => Self::WinterProtection,
            Some(t) if t >= -5 => Self::LightFrost,
            Some(t) if t >= -10 => Self::ModerateCold,
            Some(t) if t >= -15 => Self::HighlyColdTolerant,
            Some(_) => Self::ExtremelyColdTolerant,
        }
    }

    /// Classify a fractional temperature.
    ///
    /// Bucket edges are the same as for [`ColdResistance::classify`], read as
    /// half-open intervals, so `-0.5` tolerates light frost. `NaN` is treated
    /// as unspecified.
    #[must_use]
    pub fn classify_celsius(min_temperature: Option<f64>) -> Self {
        match min_temperature {
            None => Self::Unspecified,
            Some(t) if t.is_nan() => Self::Unspecified,
            Some(t) if t >= 5.0 => Self::IndoorOnly,
            Some(t) if t >= 0.0 => Self::WinterProtection,
            Some(t) if t >= -5.0 => Self::LightFrost,
            Some(t) if t >= -10.0 => Self::ModerateCold,
            Some(t) if t >= -15.0 => Self::HighlyColdTolerant,
            Some(_) => Self::ExtremelyColdTolerant,
        }
    }

    /// Position on the hardiness scale: `0` is hardiest, `5` most tender.
    ///
    /// `None` for [`ColdResistance::Unspecified`], which has no place on the scale.
    #[must_use]
    pub const fn bucket_index(&self) -> Option<u8> {
        match self {
            Self::Unspecified => None,
            Self::ExtremelyColdTolerant => Some(0),
            Self::HighlyColdTolerant => Some(1),
            Self::ModerateCold => Some(2),
            Self::LightFrost => Some(3),
            Self::WinterProtection => Some(4),
            Self::IndoorOnly => Some(5),
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Unspecified => "unspecified",
            Self::IndoorOnly => "indoor only",
            Self::WinterProtection => "outdoor with winter protection",
            Self::LightFrost => "tolerates light frost",
            Self::ModerateCold => "tolerates moderate cold",
            Self::HighlyColdTolerant => "highly cold-tolerant",
            Self::ExtremelyColdTolerant => "extremely cold-tolerant",
        }
    }
}

impl fmt::Display for ColdResistance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_boundaries() {
        let cases = [
            (5, "indoor only"),
            (30, "indoor only"),
            (4, "outdoor with winter protection"),
            (0, "outdoor with winter protection"),
            (-1, "tolerates light frost"),
            (-5, "tolerates light frost"),
            (-6, "tolerates moderate cold"),
            (-10, "tolerates moderate cold"),
            (-11, "highly cold-tolerant"),
            (-15, "highly cold-tolerant"),
            (-16, "extremely cold-tolerant"),
            (-40, "extremely cold-tolerant"),
        ];
        for (temperature, label) in cases {
            assert_eq!(
                ColdResistance::classify(Some(temperature)).label(),
                label,
                "temperature {temperature}"
            );
        }
    }

    #[test]
    fn test_absent_temperature_is_unspecified() {
        assert_eq!(ColdResistance::classify(None).label(), "unspecified");
        assert_eq!(ColdResistance::classify(None).bucket_index(), None);
        assert_eq!(ColdResistance::classify_celsius(Some(f64::NAN)).label(), "unspecified");
    }

    #[test]
    fn test_integer_classification_is_monotonic() {
        let mut previous = ColdResistance::classify(Some(-60)).bucket_index();
        for t in -59..=60 {
            let current = ColdResistance::classify(Some(t)).bucket_index();
            assert!(
                previous <= current,
                "bucket at {t} is more lenient than at {}",
                t - 1
            );
            previous = current;
        }
    }

    #[test]
    fn test_fractional_classification_is_monotonic() {
        let mut previous = ColdResistance::classify_celsius(Some(-30.0)).bucket_index();
        // Step by a quarter degree, which lands on and between every edge.
        for step in 1..=240 {
            let t = f64::from(step).mul_add(0.25, -30.0);
            let current = ColdResistance::classify_celsius(Some(t)).bucket_index();
            assert!(previous <= current, "bucket regressed at {t}");
            previous = current;
        }
    }

    #[test]
    fn test_fractional_agrees_with_integer_on_whole_degrees() {
        for t in -30..=30 {
            assert_eq!(
                ColdResistance::classify(Some(t)),
                ColdResistance::classify_celsius(Some(f64::from(t)))
            );
        }
        assert_eq!(
            ColdResistance::classify_celsius(Some(-0.5)),
            ColdResistance::LightFrost
        );
    }

    #[test]
    fn test_ord_follows_bucket_index() {
        assert!(ColdResistance::ExtremelyColdTolerant < ColdResistance::IndoorOnly);
        assert!(ColdResistance::LightFrost < ColdResistance::WinterProtection);
    }
}
