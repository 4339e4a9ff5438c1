use std::ops::RangeInclusive;

pub const DEFAULT_SELF_SUFFICIENCY_FACTOR: f64 = 1.2;
pub const DEFAULT_HOUSEHOLD_DIVISOR: u64 = 2_000_000;
pub const DEFAULT_REGIONAL_FRACTION: f64 = 0.001;
pub const SELF_SUFFICIENCY_RANGE: RangeInclusive<f64> = 0.5..=2.0;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("self_sufficiency_factor {value} outside accepted range [{min}, {max}]")]
    SelfSufficiencyOutOfRange { value: f64, min: f64, max: f64 },
    #[error("household_divisor must be at least 1")]
    HouseholdDivisor,
    #[error("regional_fraction {0} must be a finite value in (0, 1]")]
    RegionalFraction(f64),
}

/// Factors that turn real plant output and regional demand into community
/// and household figures.
///
/// The value is `Copy` so each computation works on its own snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ScalingConfig {
    pub self_sufficiency_factor: f64,
    pub household_divisor: u64,
    pub regional_fraction: f64,
}

impl Default for ScalingConfig {
    fn default() -> Self {
        Self {
            self_sufficiency_factor: DEFAULT_SELF_SUFFICIENCY_FACTOR,
            household_divisor: DEFAULT_HOUSEHOLD_DIVISOR,
            regional_fraction: DEFAULT_REGIONAL_FRACTION,
        }
    }
}

impl ScalingConfig {
    /// Out-of-range factors are rejected, never clamped.
    pub fn validate_self_sufficiency(value: f64) -> Result<f64, ValidationError> {
        if value.is_finite() && SELF_SUFFICIENCY_RANGE.contains(&value) {
            Ok(value)
        } else {
            Err(ValidationError::SelfSufficiencyOutOfRange {
                value,
                min: *SELF_SUFFICIENCY_RANGE.start(),
                max: *SELF_SUFFICIENCY_RANGE.end(),
            })
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        Self::validate_self_sufficiency(self.self_sufficiency_factor)?;
        if self.household_divisor == 0 {
            return Err(ValidationError::HouseholdDivisor);
        }
        let fraction = self.regional_fraction;
        if !(fraction.is_finite() && fraction > 0.0 && fraction <= 1.0) {
            return Err(ValidationError::RegionalFraction(fraction));
        }
        Ok(())
    }

    pub fn with_self_sufficiency_factor(self, value: f64) -> Result<Self, ValidationError> {
        Ok(Self {
            self_sufficiency_factor: Self::validate_self_sufficiency(value)?,
            ..self
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = ScalingConfig::default();
        assert_eq!(cfg.self_sufficiency_factor, 1.2);
        assert_eq!(cfg.household_divisor, 2_000_000);
        assert_eq!(cfg.regional_fraction, 0.001);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn self_sufficiency_bounds_are_inclusive() {
        let cfg = ScalingConfig::default();
        assert_eq!(cfg.with_self_sufficiency_factor(0.5).unwrap().self_sufficiency_factor, 0.5);
        assert_eq!(cfg.with_self_sufficiency_factor(2.0).unwrap().self_sufficiency_factor, 2.0);
    }

    #[test]
    fn self_sufficiency_out_of_range_is_rejected_not_clamped() {
        let cfg = ScalingConfig::default();
        for bad in [0.49, 2.01, -1.0, f64::NAN, f64::INFINITY] {
            let res = cfg.with_self_sufficiency_factor(bad);
            assert!(
                matches!(res, Err(ValidationError::SelfSufficiencyOutOfRange { .. })),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn validate_rejects_bad_divisor_and_fraction() {
        let zero_divisor = ScalingConfig {
            household_divisor: 0,
            ..ScalingConfig::default()
        };
        assert_eq!(zero_divisor.validate(), Err(ValidationError::HouseholdDivisor));

        let big_fraction = ScalingConfig {
            regional_fraction: 1.5,
            ..ScalingConfig::default()
        };
        assert!(matches!(big_fraction.validate(), Err(ValidationError::RegionalFraction(_))));
    }
}
