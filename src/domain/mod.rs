use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::MetricsError;

pub mod period;
pub mod sort;

pub use period::QuarterPeriod;
pub use sort::{SortDirection, SortField, SortSpec};

/// A single extracted data point, joined with its metric definition, company and source document.
///
/// Records are produced by the ingestion side and are read-only here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub metric_value_id: i64,
    pub company_id: i64,
    #[serde(default)]
    pub company_name: Option<String>,
    pub metric_name_internal: String,
    #[serde(default)]
    pub metric_name_display: Option<String>,
    /// Unit declared on the metric definition, used when a record carries no unit of its own
    #[serde(default)]
    pub metric_unit: Option<String>,
    #[serde(default, alias = "extracted_metric_value")]
    pub value: Option<f64>,
    #[serde(default, alias = "extracted_metric_unit")]
    pub unit: Option<String>,
    #[serde(default)]
    pub period_start_date: Option<NaiveDate>,
    #[serde(default)]
    pub period_end_date: Option<NaiveDate>,
    #[serde(default)]
    pub basin_name: Option<String>,
    #[serde(default)]
    pub segment_name: Option<String>,
    #[serde(alias = "confidence_score")]
    pub extraction_confidence_score: f64,
    #[serde(default)]
    pub extraction_method: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
}

impl MetricRecord {
    pub fn new(
        metric_value_id: i64,
        company_id: i64,
        metric_name_internal: impl Into<String>,
        value: Option<f64>,
        unit: Option<&str>,
    ) -> Self {
        Self {
            metric_value_id,
            company_id,
            company_name: None,
            metric_name_internal: metric_name_internal.into(),
            metric_name_display: None,
            metric_unit: None,
            value,
            unit: unit.map(|u| u.to_string()),
            period_start_date: None,
            period_end_date: None,
            basin_name: None,
            segment_name: None,
            extraction_confidence_score: 1.0,
            extraction_method: None,
            source_url: None,
        }
    }

    pub fn with_company_name(mut self, name: &str) -> Self {
        self.company_name = Some(name.to_string());
        self
    }

    pub fn with_period(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.period_start_date = start;
        self.period_end_date = end;
        self
    }

    pub fn with_confidence(mut self, score: f64) -> Self {
        self.extraction_confidence_score = score;
        self
    }

    pub fn with_method(mut self, method: &str) -> Self {
        self.extraction_method = Some(method.to_string());
        self
    }

    pub fn with_source_url(mut self, url: &str) -> Self {
        self.source_url = Some(url.to_string());
        self
    }

    pub fn with_basin(mut self, basin: &str) -> Self {
        self.basin_name = Some(basin.to_string());
        self
    }

    pub fn with_segment(mut self, segment: &str) -> Self {
        self.segment_name = Some(segment.to_string());
        self
    }
}

/// Dimension used to group records in a summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    #[default]
    Company,
    Basin,
    Segment,
}

impl GroupBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupBy::Company => "company",
            GroupBy::Basin => "basin",
            GroupBy::Segment => "segment",
        }
    }
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupBy {
    type Err = MetricsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "company" => Ok(GroupBy::Company),
            "basin" => Ok(GroupBy::Basin),
            "segment" => Ok(GroupBy::Segment),
            other => Err(MetricsError::InvalidGroupBy(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_deserializes_with_source_column_names() {
        let record: MetricRecord = serde_json::from_value(json!({
            "metric_value_id": 7,
            "company_id": 3,
            "metric_name_internal": "oil_production",
            "extracted_metric_value": 1250.5,
            "extracted_metric_unit": "bbl",
            "period_end_date": "2024-12-31",
            "extraction_confidence_score": 0.91
        }))
        .unwrap();

        assert_eq!(record.value, Some(1250.5));
        assert_eq!(record.unit.as_deref(), Some("bbl"));
        assert_eq!(record.period_end_date, NaiveDate::from_ymd_opt(2024, 12, 31));
        assert!(record.source_url.is_none());
    }

    #[test]
    fn test_record_rejects_non_numeric_value() {
        let result: Result<MetricRecord, _> = serde_json::from_value(json!({
            "metric_value_id": 1,
            "company_id": 1,
            "metric_name_internal": "oil_production",
            "value": "lots",
            "extraction_confidence_score": 0.9
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_group_by_parsing() {
        assert_eq!("Basin".parse::<GroupBy>().unwrap(), GroupBy::Basin);
        assert_eq!("segment".parse::<GroupBy>().unwrap(), GroupBy::Segment);
        assert!("region".parse::<GroupBy>().is_err());
    }
}
