use std::fmt;

use serde::{Deserialize, Serialize};

use super::model::{Band, MagnitudeObservation, ValidatedObservation};

// ---------------------------------------------------------------------------
// Interval – closed range for one band
// ---------------------------------------------------------------------------

/// Closed interval `[low, high]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub low: f64,
    pub high: f64,
}

impl Interval {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// Inclusive on both ends. NaN is never contained.
    pub fn contains(&self, value: f64) -> bool {
        self.low <= value && value <= self.high
    }

    pub fn is_well_formed(&self) -> bool {
        self.low.is_finite() && self.high.is_finite() && self.low <= self.high
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Whole-number bounds render as `14-25`, the rest keep their decimals.
        write!(f, "{}-{}", self.low, self.high)
    }
}

/// The magnitude range the shipped model was trained on.
pub const DEFAULT_INTERVAL: Interval = Interval::new(14.0, 25.0);

// ---------------------------------------------------------------------------
// MagnitudeBounds – the validation gate
// ---------------------------------------------------------------------------

/// Per-band acceptable ranges. Fixed configuration, never learned from data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MagnitudeBounds {
    pub u: Interval,
    pub g: Interval,
    pub r: Interval,
    pub i: Interval,
    pub z: Interval,
}

impl Default for MagnitudeBounds {
    fn default() -> Self {
        Self::uniform(DEFAULT_INTERVAL)
    }
}

impl MagnitudeBounds {
    /// Same interval for every band.
    pub const fn uniform(interval: Interval) -> Self {
        Self {
            u: interval,
            g: interval,
            r: interval,
            i: interval,
            z: interval,
        }
    }

    pub fn interval(&self, band: Band) -> Interval {
        match band {
            Band::U => self.u,
            Band::G => self.g,
            Band::R => self.r,
            Band::I => self.i,
            Band::Z => self.z,
        }
    }

    /// First band whose interval is empty or non-finite, if any.
    pub fn first_malformed(&self) -> Option<(Band, Interval)> {
        Band::ALL
            .into_iter()
            .map(|band| (band, self.interval(band)))
            .find(|(_, interval)| !interval.is_well_formed())
    }

    /// Check every band and report all offenders at once.
    ///
    /// Fails closed: any violation means no [`ValidatedObservation`] is
    /// produced, so the classifier can never see the input.
    pub fn validate(
        &self,
        obs: &MagnitudeObservation,
    ) -> Result<ValidatedObservation, ValidationFailure> {
        let violations: Vec<BandViolation> = Band::ALL
            .into_iter()
            .filter_map(|band| {
                let value = obs.get(band);
                let interval = self.interval(band);
                (!interval.contains(value)).then_some(BandViolation {
                    band,
                    value,
                    interval,
                })
            })
            .collect();

        if violations.is_empty() {
            Ok(ValidatedObservation(*obs))
        } else {
            Err(ValidationFailure { violations })
        }
    }
}

// ---------------------------------------------------------------------------
// Failure reporting
// ---------------------------------------------------------------------------

/// One out-of-range band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BandViolation {
    pub band: Band,
    pub value: f64,
    pub interval: Interval,
}

impl fmt::Display for BandViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.band, self.interval)
    }
}

/// Every band that failed the gate, in wavelength order. Never empty.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[error("The following inputs are out of range: {}. Prediction not allowed.", self.listed())]
pub struct ValidationFailure {
    pub violations: Vec<BandViolation>,
}

impl ValidationFailure {
    pub fn bands(&self) -> Vec<Band> {
        self.violations.iter().map(|v| v.band).collect()
    }

    fn listed(&self) -> String {
        let listed: Vec<String> = self.violations.iter().map(|v| v.to_string()).collect();
        listed.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn in_range() -> MagnitudeObservation {
        MagnitudeObservation::new(19.5, 18.0, 17.2, 16.9, 16.5)
    }

    fn with_band(band: Band, value: f64) -> MagnitudeObservation {
        let mut obs = in_range();
        match band {
            Band::U => obs.u = value,
            Band::G => obs.g = value,
            Band::R => obs.r = value,
            Band::I => obs.i = value,
            Band::Z => obs.z = value,
        }
        obs
    }

    #[test]
    fn bounds_are_inclusive_on_both_ends() {
        let bounds = MagnitudeBounds::default();
        for band in Band::ALL {
            assert!(bounds.validate(&with_band(band, 14.0)).is_ok(), "{band} at 14");
            assert!(bounds.validate(&with_band(band, 25.0)).is_ok(), "{band} at 25");
        }
        let all_low = MagnitudeObservation::new(14.0, 14.0, 14.0, 14.0, 14.0);
        let all_high = MagnitudeObservation::new(25.0, 25.0, 25.0, 25.0, 25.0);
        assert!(bounds.validate(&all_low).is_ok());
        assert!(bounds.validate(&all_high).is_ok());
    }

    #[test]
    fn values_just_outside_fail_for_that_band_only() {
        let bounds = MagnitudeBounds::default();
        for band in Band::ALL {
            for value in [13.999_999, 25.001] {
                let err = bounds.validate(&with_band(band, value)).unwrap_err();
                assert_eq!(err.bands(), vec![band]);
                assert_eq!(err.violations[0].value, value);
            }
        }
    }

    #[test]
    fn every_offending_band_is_reported() {
        let bounds = MagnitudeBounds::default();
        let obs = MagnitudeObservation::new(10.0, 18.0, 17.2, 16.9, 30.0);
        let err = bounds.validate(&obs).unwrap_err();
        assert_eq!(err.bands(), vec![Band::U, Band::Z]);
        assert!(err.violations.iter().all(|v| v.interval == DEFAULT_INTERVAL));
        assert_eq!(
            err.to_string(),
            "The following inputs are out of range: u (14-25), z (14-25). Prediction not allowed."
        );
    }

    #[test]
    fn nan_never_passes() {
        let err = MagnitudeBounds::default()
            .validate(&with_band(Band::R, f64::NAN))
            .unwrap_err();
        assert_eq!(err.bands(), vec![Band::R]);
    }

    #[test]
    fn validated_observation_keeps_the_input() {
        let obs = in_range();
        let validated = MagnitudeBounds::default().validate(&obs).unwrap();
        assert_eq!(validated.observation(), &obs);
    }

    #[test]
    fn per_band_intervals_are_respected() {
        let bounds = MagnitudeBounds {
            z: Interval::new(15.5, 20.0),
            ..MagnitudeBounds::default()
        };
        let err = bounds.validate(&with_band(Band::Z, 15.0)).unwrap_err();
        assert_eq!(err.violations[0].to_string(), "z (15.5-20)");
        assert!(bounds.validate(&with_band(Band::U, 15.0)).is_ok());
    }

    #[test]
    fn malformed_intervals_are_detected() {
        assert_eq!(MagnitudeBounds::default().first_malformed(), None);
        let bounds = MagnitudeBounds {
            g: Interval::new(25.0, 14.0),
            ..MagnitudeBounds::default()
        };
        assert_eq!(bounds.first_malformed().map(|(b, _)| b), Some(Band::G));
    }
}
