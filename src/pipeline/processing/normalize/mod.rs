use serde::{Deserialize, Serialize};

use crate::domain::MetricRecord;

pub mod tables;
pub mod units;

pub use tables::ConversionType;

/// How a normalized value was obtained
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ConversionOutcome {
    /// Value or unit was missing; both are returned exactly as given
    PassThrough,
    /// Neither the metric nor the unit resolved to a conversion type
    UnrecognizedUnit,
    /// The unit already is the standard unit of its conversion type
    AlreadyStandard { conversion_type: ConversionType },
    /// The value was scaled into the standard unit
    Converted {
        conversion_type: ConversionType,
        factor: f64,
    },
    /// The conversion type resolved but no rule links the unit to the standard unit
    NoRule { conversion_type: ConversionType },
}

impl ConversionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversionOutcome::PassThrough => "pass_through",
            ConversionOutcome::UnrecognizedUnit => "unrecognized_unit",
            ConversionOutcome::AlreadyStandard { .. } => "already_standard",
            ConversionOutcome::Converted { .. } => "converted",
            ConversionOutcome::NoRule { .. } => "no_rule",
        }
    }

    /// Whether the returned value is expressed in a standard unit
    pub fn is_standard(&self) -> bool {
        matches!(
            self,
            ConversionOutcome::AlreadyStandard { .. } | ConversionOutcome::Converted { .. }
        )
    }
}

/// Result of normalizing one (value, unit, metric) triple
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedValue {
    pub value: Option<f64>,
    pub unit: Option<String>,
    #[serde(flatten)]
    pub outcome: ConversionOutcome,
}

/// Converts raw metric values into the standard unit of their conversion type.
///
/// Normalization is total: unknown metrics, unknown units and missing inputs all come
/// back as a tagged, unconverted [`NormalizedValue`] instead of an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnitNormalizer;

impl UnitNormalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, value: Option<f64>, from_unit: Option<&str>, metric_name_internal: &str) -> NormalizedValue {
        let (value, raw_unit) = match (value, from_unit) {
            (Some(value), Some(unit)) if !unit.is_empty() => (value, unit),
            _ => {
                return NormalizedValue {
                    value,
                    unit: from_unit.map(|u| u.to_string()),
                    outcome: ConversionOutcome::PassThrough,
                };
            }
        };

        let unit = units::canonical_unit(raw_unit);

        let Some(conversion_type) = self.conversion_type(metric_name_internal, &unit) else {
            return NormalizedValue {
                value: Some(value),
                unit: Some(unit),
                outcome: ConversionOutcome::UnrecognizedUnit,
            };
        };

        let standard_unit = conversion_type.standard_unit();
        if unit == standard_unit {
            return NormalizedValue {
                value: Some(value),
                unit: Some(unit),
                outcome: ConversionOutcome::AlreadyStandard { conversion_type },
            };
        }

        match tables::scale_factor(conversion_type, &unit, standard_unit) {
            Some(factor) => NormalizedValue {
                value: Some(round_to(value * factor, 6)),
                unit: Some(standard_unit.to_string()),
                outcome: ConversionOutcome::Converted { conversion_type, factor },
            },
            None => NormalizedValue {
                value: Some(value),
                unit: Some(unit),
                outcome: ConversionOutcome::NoRule { conversion_type },
            },
        }
    }

    /// Normalize the value carried by a record
    pub fn normalize_record(&self, record: &MetricRecord) -> NormalizedValue {
        self.normalize(record.value, record.unit.as_deref(), &record.metric_name_internal)
    }

    /// Conversion type for a metric, falling back to inference from its canonical unit
    pub fn conversion_type(&self, metric_name_internal: &str, unit: &str) -> Option<ConversionType> {
        tables::metric_conversion_type(metric_name_internal).or_else(|| units::infer_conversion_type(unit))
    }
}

/// Round half away from zero to `places` decimal places.
///
/// The scaled value is first cut to 15 significant digits so that a tie such as
/// `1.005 * 100 == 100.49999999999999` is still treated as a tie.
pub fn round_to(value: f64, places: i32) -> f64 {
    if !value.is_finite() {
        return value;
    }

    let scale = 10f64.powi(places);
    let scaled = value * scale;
    let pre_rounded = format!("{:.14e}", scaled).parse::<f64>().unwrap_or(scaled);
    pre_rounded.round() / scale
}

/// Value to display for a record: the normalized pair when a normalized value exists,
/// otherwise the original pair
pub fn display_value(
    original_value: Option<f64>,
    original_unit: Option<&str>,
    normalized_value: Option<f64>,
    normalized_unit: Option<&str>,
) -> (Option<f64>, Option<String>) {
    match normalized_value {
        Some(value) => (Some(value), normalized_unit.or(original_unit).map(|u| u.to_string())),
        None => (original_value, original_unit.map(|u| u.to_string())),
    }
}
