//! Height estimation parameter types

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::dem_pipeline::common::error::{DemError, Result};

/// Caller-supplied knobs for the height estimator.
///
/// Values are validated for type only. Zero or negative values are accepted:
/// a non-positive radius disables pre-smoothing, and the output range is
/// always `elevation_range * scale_factor` whatever its sign.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProcessingParameters {
    /// Multiplier applied on top of `elevation_range`
    pub scale_factor: f64,
    /// Pre-smoothing kernel radius, kernel size is `2 * radius + 1`
    pub smoothing_radius: i64,
    /// Elevation of the brightest normalized sample before scaling
    pub elevation_range: f64,
}

impl Default for ProcessingParameters {
    fn default() -> Self {
        Self {
            scale_factor: 1.0,
            smoothing_radius: 3,
            elevation_range: 255.0,
        }
    }
}

impl ProcessingParameters {
    pub const SCALE_FACTOR_KEY: &'static str = "scale_factor";
    pub const SMOOTHING_KEY: &'static str = "smoothing";
    pub const ELEVATION_RANGE_KEY: &'static str = "elevation_range";

    pub fn builder() -> ProcessingParametersBuilder {
        ProcessingParametersBuilder::default()
    }

    /// Upper end of the output elevation interval.
    pub fn vertical_extent(&self) -> f64 {
        self.elevation_range * self.scale_factor
    }

    /// Rejects `NaN` and infinite values. Zero and negative values pass.
    pub fn check_finite(&self) -> Result<()> {
        let fields = [
            (Self::SCALE_FACTOR_KEY, self.scale_factor),
            (Self::ELEVATION_RANGE_KEY, self.elevation_range),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(DemError::InvalidParameter {
                    name: name.to_string(),
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Builds parameters from untyped form fields, falling back to defaults
    /// for missing keys. Any value that does not parse as a finite number is
    /// rejected with [`DemError::InvalidParameter`].
    pub fn from_form(fields: &HashMap<String, String>) -> Result<Self> {
        let default = Self::default();
        Ok(Self {
            scale_factor: parse_field(fields, Self::SCALE_FACTOR_KEY, default.scale_factor)?,
            smoothing_radius: parse_field(fields, Self::SMOOTHING_KEY, default.smoothing_radius)?,
            elevation_range: parse_field(
                fields,
                Self::ELEVATION_RANGE_KEY,
                default.elevation_range,
            )?,
        })
    }
}

trait FiniteCheck {
    fn is_finite_value(&self) -> bool;
}

impl FiniteCheck for f64 {
    fn is_finite_value(&self) -> bool {
        self.is_finite()
    }
}

impl FiniteCheck for i64 {
    fn is_finite_value(&self) -> bool {
        true
    }
}

fn parse_field<T>(fields: &HashMap<String, String>, name: &str, default: T) -> Result<T>
where
    T: FromStr + FiniteCheck,
{
    let Some(raw) = fields.get(name) else {
        return Ok(default);
    };
    let invalid = || DemError::InvalidParameter {
        name: name.to_string(),
        value: raw.clone(),
    };
    let value = raw.trim().parse::<T>().map_err(|_| invalid())?;
    if !value.is_finite_value() {
        return Err(invalid());
    }
    Ok(value)
}

/// Builder for ProcessingParameters
#[derive(Default)]
pub struct ProcessingParametersBuilder {
    scale_factor: Option<f64>,
    smoothing_radius: Option<i64>,
    elevation_range: Option<f64>,
}

impl ProcessingParametersBuilder {
    pub fn scale_factor(mut self, scale_factor: f64) -> Self {
        self.scale_factor = Some(scale_factor);
        self
    }

    pub fn smoothing_radius(mut self, radius: i64) -> Self {
        self.smoothing_radius = Some(radius);
        self
    }

    pub fn elevation_range(mut self, range: f64) -> Self {
        self.elevation_range = Some(range);
        self
    }

    pub fn build(self) -> ProcessingParameters {
        let default = ProcessingParameters::default();
        ProcessingParameters {
            scale_factor: self.scale_factor.unwrap_or(default.scale_factor),
            smoothing_radius: self.smoothing_radius.unwrap_or(default.smoothing_radius),
            elevation_range: self.elevation_range.unwrap_or(default.elevation_range),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_builder_defaults() {
        let params = ProcessingParameters::builder().scale_factor(2.0).build();
        assert_eq!(params.scale_factor, 2.0);
        assert_eq!(params.smoothing_radius, 3);
        assert_eq!(params.elevation_range, 255.0);
        assert_eq!(params.vertical_extent(), 510.0);
    }

    #[test]
    fn test_from_form_missing_keys_use_defaults() {
        let params = ProcessingParameters::from_form(&form(&[("smoothing", "0")])).unwrap();
        assert_eq!(params.smoothing_radius, 0);
        assert_eq!(params.scale_factor, 1.0);
        assert_eq!(params.elevation_range, 255.0);
    }

    #[test]
    fn test_from_form_accepts_negative_values() {
        let params = ProcessingParameters::from_form(&form(&[
            ("scale_factor", "-0.5"),
            ("smoothing", "-2"),
            ("elevation_range", " 100 "),
        ]))
        .unwrap();
        assert_eq!(params.scale_factor, -0.5);
        assert_eq!(params.smoothing_radius, -2);
        assert_eq!(params.elevation_range, 100.0);
    }

    #[test]
    fn test_from_form_rejects_non_numeric() {
        let err = ProcessingParameters::from_form(&form(&[("scale_factor", "tall")])).unwrap_err();
        match err {
            DemError::InvalidParameter { name, value } => {
                assert_eq!(name, "scale_factor");
                assert_eq!(value, "tall");
            }
            other => panic!("unexpected error: {other}"),
        }

        assert!(ProcessingParameters::from_form(&form(&[("smoothing", "2.5")])).is_err());
        assert!(ProcessingParameters::from_form(&form(&[("elevation_range", "inf")])).is_err());
    }

    #[test]
    fn test_check_finite() {
        assert!(ProcessingParameters::default().check_finite().is_ok());
        assert!(
            ProcessingParameters::builder()
                .scale_factor(-2.0)
                .elevation_range(0.0)
                .build()
                .check_finite()
                .is_ok()
        );

        let err = ProcessingParameters::builder()
            .elevation_range(f64::NEG_INFINITY)
            .build()
            .check_finite()
            .unwrap_err();
        assert!(matches!(err, DemError::InvalidParameter { ref name, .. } if name == "elevation_range"));

        assert!(
            ProcessingParameters::builder()
                .scale_factor(f64::NAN)
                .build()
                .check_finite()
                .is_err()
        );
    }

    #[test]
    fn test_serde_roundtrip() {
        let params = ProcessingParameters::builder().smoothing_radius(5).build();
        let json = serde_json::to_string(&params).unwrap();
        let back: ProcessingParameters = serde_json::from_str(&json).unwrap();
        assert_eq!(params, back);
    }
}
