use super::tables::ConversionType;

/// Lowercase and trim a unit string, then map common spellings onto their short form
pub fn canonical_unit(unit: &str) -> String {
    let unit = unit.trim().to_lowercase();

    let mapped = match unit.as_str() {
        "barrel" | "barrels" => "bbl",
        "mbarrel" => "mbbl",
        "mmbarrel" => "mmbbl",
        "feet" => "ft",
        "meter" | "meters" => "m",
        "usd" => "$",
        "well" | "wells" => "#",
        "percent" => "%",
        _ => return unit,
    };

    mapped.to_string()
}

/// Guess the conversion type from an already canonical unit
pub fn infer_conversion_type(unit: &str) -> Option<ConversionType> {
    match unit {
        "bbl" | "mbbl" | "mmbbl" => Some(ConversionType::Volume),
        "mcf" | "mmcf" | "bcf" => Some(ConversionType::Gas),
        "boe" | "mboe" | "mmboe" => Some(ConversionType::Boe),
        "ft" | "m" => Some(ConversionType::Length),
        "#" | "wells" => Some(ConversionType::Count),
        "%" | "percent" => Some(ConversionType::Percentage),
        _ if unit.contains('$') => {
            if unit.contains("bbl") {
                Some(ConversionType::PricePerBarrel)
            } else if unit.contains("mcf") {
                Some(ConversionType::PricePerMcf)
            } else {
                Some(ConversionType::Dollars)
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_unit_synonyms() {
        assert_eq!(canonical_unit("Barrels"), "bbl");
        assert_eq!(canonical_unit("  MBarrel "), "mbbl");
        assert_eq!(canonical_unit("METERS"), "m");
        assert_eq!(canonical_unit("USD"), "$");
        assert_eq!(canonical_unit("Wells"), "#");
        assert_eq!(canonical_unit("percent"), "%");
        assert_eq!(canonical_unit("MMcf"), "mmcf");
    }

    #[test]
    fn test_infer_conversion_type() {
        assert_eq!(infer_conversion_type("mmbbl"), Some(ConversionType::Volume));
        assert_eq!(infer_conversion_type("bcf"), Some(ConversionType::Gas));
        assert_eq!(infer_conversion_type("mmboe"), Some(ConversionType::Boe));
        assert_eq!(infer_conversion_type("#"), Some(ConversionType::Count));
        assert_eq!(infer_conversion_type("$/bbl"), Some(ConversionType::PricePerBarrel));
        assert_eq!(infer_conversion_type("$/mcf"), Some(ConversionType::PricePerMcf));
        assert_eq!(infer_conversion_type("$000"), Some(ConversionType::Dollars));
        assert_eq!(infer_conversion_type("usd/bbl"), None);
        assert_eq!(infer_conversion_type("tonnes"), None);
    }
}
