//! Static conversion tables.
//!
//! All tables are built once on first use and never mutated afterwards, so they can be
//! read from any number of threads without synchronization.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::constants::*;

/// Family of units a metric is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionType {
    /// Liquid volumes, standard unit mbbl
    Volume,
    /// Natural gas volumes, standard unit mmcf
    Gas,
    /// Barrels of oil equivalent, standard unit mboe
    Boe,
    /// Lateral lengths, standard unit ft
    Length,
    /// Realized oil price in $/bbl
    PricePerBarrel,
    /// Realized gas price in $/mcf
    PricePerMcf,
    /// Well counts; there is no conversion rule, values pass through
    Count,
    /// Percentages; there is no conversion rule, values pass through
    Percentage,
    /// Dollar amounts; there is no conversion rule, values pass through
    Dollars,
}

impl ConversionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversionType::Volume => "volume",
            ConversionType::Gas => "gas",
            ConversionType::Boe => "boe",
            ConversionType::Length => "length",
            ConversionType::PricePerBarrel => "price_per_barrel",
            ConversionType::PricePerMcf => "price_per_mcf",
            ConversionType::Count => "count",
            ConversionType::Percentage => "percentage",
            ConversionType::Dollars => "dollars",
        }
    }

    /// Canonical unit every value of this type is reported in
    pub fn standard_unit(&self) -> &'static str {
        match self {
            ConversionType::Volume => "mbbl",
            ConversionType::Gas => "mmcf",
            ConversionType::Boe => "mboe",
            ConversionType::Length => "ft",
            ConversionType::PricePerBarrel => "$/bbl",
            ConversionType::PricePerMcf => "$/mcf",
            ConversionType::Count => "#",
            ConversionType::Percentage => "%",
            ConversionType::Dollars => "$000",
        }
    }
}

impl fmt::Display for ConversionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type UnitTable = HashMap<&'static str, HashMap<&'static str, f64>>;

fn unit_table(rows: Vec<(&'static str, Vec<(&'static str, f64)>)>) -> UnitTable {
    rows.into_iter()
        .map(|(from, targets)| (from, targets.into_iter().collect()))
        .collect()
}

/// Scale factors keyed by conversion type, then from-unit, then to-unit.
/// Count, percentage and dollar amounts have no rules and are never scaled.
static CONVERSION_RULES: Lazy<HashMap<ConversionType, UnitTable>> = Lazy::new(|| {
    let mut rules = HashMap::new();

    rules.insert(
        ConversionType::Volume,
        unit_table(vec![
            ("bbl", vec![("bbl", 1.0), ("mbbl", 0.001), ("mmbbl", 0.000001)]),
            ("mbbl", vec![("bbl", 1000.0), ("mbbl", 1.0), ("mmbbl", 0.001)]),
            ("mmbbl", vec![("bbl", 1_000_000.0), ("mbbl", 1000.0), ("mmbbl", 1.0)]),
        ]),
    );
    rules.insert(
        ConversionType::Gas,
        unit_table(vec![
            ("mcf", vec![("mcf", 1.0), ("mmcf", 0.001), ("bcf", 0.000001)]),
            ("mmcf", vec![("mcf", 1000.0), ("mmcf", 1.0), ("bcf", 0.001)]),
            ("bcf", vec![("mcf", 1_000_000.0), ("mmcf", 1000.0), ("bcf", 1.0)]),
        ]),
    );
    rules.insert(
        ConversionType::Boe,
        unit_table(vec![
            ("boe", vec![("boe", 1.0), ("mboe", 0.001), ("mmboe", 0.000001)]),
            ("mboe", vec![("boe", 1000.0), ("mboe", 1.0), ("mmboe", 0.001)]),
            ("mmboe", vec![("boe", 1_000_000.0), ("mboe", 1000.0), ("mmboe", 1.0)]),
        ]),
    );
    rules.insert(
        ConversionType::Length,
        unit_table(vec![
            ("ft", vec![("ft", 1.0), ("m", 0.3048)]),
            ("m", vec![("ft", 3.28084), ("m", 1.0)]),
        ]),
    );
    rules.insert(
        ConversionType::PricePerBarrel,
        unit_table(vec![("$/bbl", vec![("$/bbl", 1.0)]), ("usd/bbl", vec![("$/bbl", 1.0)])]),
    );
    rules.insert(
        ConversionType::PricePerMcf,
        unit_table(vec![("$/mcf", vec![("$/mcf", 1.0)]), ("usd/mcf", vec![("$/mcf", 1.0)])]),
    );

    rules
});

/// Metrics whose conversion type is fixed regardless of the unit they arrive in
static METRIC_TYPES: Lazy<HashMap<&'static str, ConversionType>> = Lazy::new(|| {
    HashMap::from([
        (OIL_PRODUCTION, ConversionType::Volume),
        (NGL_PRODUCTION, ConversionType::Volume),
        (GAS_PRODUCTION, ConversionType::Gas),
        (BOE_PRODUCTION, ConversionType::Boe),
        (TOTAL_LATERAL_LENGTH_DRILLED, ConversionType::Length),
        (TOTAL_LATERAL_LENGTH_COMPLETED, ConversionType::Length),
        (TOTAL_LATERAL_LENGTH_TILED, ConversionType::Length),
        (AVG_REALIZED_OIL_PRICE, ConversionType::PricePerBarrel),
        (AVG_REALIZED_GAS_PRICE, ConversionType::PricePerMcf),
    ])
});

/// Conversion type registered for a metric name, if any
pub fn metric_conversion_type(metric_name_internal: &str) -> Option<ConversionType> {
    METRIC_TYPES.get(metric_name_internal).copied()
}

/// Scale factor taking `from_unit` to `to_unit` within a conversion type
pub fn scale_factor(conversion_type: ConversionType, from_unit: &str, to_unit: &str) -> Option<f64> {
    CONVERSION_RULES
        .get(&conversion_type)
        .and_then(|table| table.get(from_unit))
        .and_then(|targets| targets.get(to_unit))
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_units() {
        assert_eq!(ConversionType::Volume.standard_unit(), "mbbl");
        assert_eq!(ConversionType::Gas.standard_unit(), "mmcf");
        assert_eq!(ConversionType::Boe.standard_unit(), "mboe");
        assert_eq!(ConversionType::Dollars.standard_unit(), "$000");
    }

    #[test]
    fn test_scale_factor_lookup() {
        assert_eq!(scale_factor(ConversionType::Volume, "bbl", "mbbl"), Some(0.001));
        assert_eq!(scale_factor(ConversionType::Gas, "bcf", "mmcf"), Some(1000.0));
        assert_eq!(scale_factor(ConversionType::Length, "m", "ft"), Some(3.28084));
        assert_eq!(scale_factor(ConversionType::Volume, "mcf", "mbbl"), None);
        assert_eq!(scale_factor(ConversionType::Count, "#", "#"), None);
    }

    #[test]
    fn test_metric_type_map() {
        assert_eq!(metric_conversion_type("gas_production"), Some(ConversionType::Gas));
        assert_eq!(metric_conversion_type("avg_realized_oil_price"), Some(ConversionType::PricePerBarrel));
        assert_eq!(metric_conversion_type("gross_wells_drilled"), None);
    }
}
