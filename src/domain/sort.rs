use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

use crate::domain::MetricRecord;
use crate::error::{MetricsError, Result};

static SORT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z_]+:(asc|desc)$").expect("sort pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// Record columns a listing can be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    ExtractionConfidenceScore,
    PeriodEndDate,
    PeriodStartDate,
    MetricNameInternal,
    MetricNameDisplay,
    CompanyName,
    BasinName,
    SegmentName,
    ExtractedMetricValue,
}

impl SortField {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "extraction_confidence_score" => Some(SortField::ExtractionConfidenceScore),
            "period_end_date" => Some(SortField::PeriodEndDate),
            "period_start_date" => Some(SortField::PeriodStartDate),
            "metric_name_internal" => Some(SortField::MetricNameInternal),
            "metric_name_display" => Some(SortField::MetricNameDisplay),
            "company_name" => Some(SortField::CompanyName),
            "basin_name" => Some(SortField::BasinName),
            "segment_name" => Some(SortField::SegmentName),
            "extracted_metric_value" => Some(SortField::ExtractedMetricValue),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::ExtractionConfidenceScore => "extraction_confidence_score",
            SortField::PeriodEndDate => "period_end_date",
            SortField::PeriodStartDate => "period_start_date",
            SortField::MetricNameInternal => "metric_name_internal",
            SortField::MetricNameDisplay => "metric_name_display",
            SortField::CompanyName => "company_name",
            SortField::BasinName => "basin_name",
            SortField::SegmentName => "segment_name",
            SortField::ExtractedMetricValue => "extracted_metric_value",
        }
    }

    /// Ascending order of two records on this column; missing values sort first
    pub fn compare(&self, a: &MetricRecord, b: &MetricRecord) -> Ordering {
        match self {
            SortField::ExtractionConfidenceScore => a
                .extraction_confidence_score
                .total_cmp(&b.extraction_confidence_score),
            SortField::PeriodEndDate => a.period_end_date.cmp(&b.period_end_date),
            SortField::PeriodStartDate => a.period_start_date.cmp(&b.period_start_date),
            SortField::MetricNameInternal => a.metric_name_internal.cmp(&b.metric_name_internal),
            SortField::MetricNameDisplay => a.metric_name_display.cmp(&b.metric_name_display),
            SortField::CompanyName => a.company_name.cmp(&b.company_name),
            SortField::BasinName => a.basin_name.cmp(&b.basin_name),
            SortField::SegmentName => a.segment_name.cmp(&b.segment_name),
            SortField::ExtractedMetricValue => match (a.value, b.value) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                (x, y) => x.is_some().cmp(&y.is_some()),
            },
        }
    }
}

/// Columns accepted by the main metric listing
pub const LISTING_SORT_FIELDS: [SortField; 6] = [
    SortField::PeriodEndDate,
    SortField::PeriodStartDate,
    SortField::ExtractionConfidenceScore,
    SortField::MetricNameInternal,
    SortField::BasinName,
    SortField::SegmentName,
];

/// Columns accepted by the review queue
pub const REVIEW_SORT_FIELDS: [SortField; 5] = [
    SortField::ExtractionConfidenceScore,
    SortField::PeriodEndDate,
    SortField::MetricNameDisplay,
    SortField::CompanyName,
    SortField::ExtractedMetricValue,
];

/// A parsed `field:direction` ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortSpec {
    pub const LISTING_DEFAULT: SortSpec = SortSpec {
        field: SortField::PeriodEndDate,
        direction: SortDirection::Desc,
    };

    pub const REVIEW_DEFAULT: SortSpec = SortSpec {
        field: SortField::ExtractionConfidenceScore,
        direction: SortDirection::Asc,
    };

    /// Parse `field:asc|desc`.
    ///
    /// Input that does not have that shape is an error. A well-formed field name that is not in
    /// `allowed` falls back to the default field while keeping the requested direction.
    pub fn parse(input: &str, allowed: &[SortField], default: SortSpec) -> Result<Self> {
        if !SORT_PATTERN.is_match(input) {
            return Err(MetricsError::InvalidSort(input.to_string()));
        }

        let Some((name, direction)) = input.split_once(':') else {
            return Ok(default);
        };

        let field = SortField::from_name(name)
            .filter(|f| allowed.contains(f))
            .unwrap_or(default.field);
        let direction = SortDirection::from_name(direction).unwrap_or(default.direction);

        Ok(Self { field, direction })
    }

    /// Ordering for the metric listing, `period_end_date:desc` by default
    pub fn for_listing(input: &str) -> Result<Self> {
        Self::parse(input, &LISTING_SORT_FIELDS, Self::LISTING_DEFAULT)
    }

    /// Ordering for the review queue; `confidence` is shorthand for the confidence score
    pub fn for_review(input: &str) -> Result<Self> {
        match input.strip_prefix("confidence:") {
            Some(direction) => Self::parse(
                &format!("{}:{}", SortField::ExtractionConfidenceScore.as_str(), direction),
                &REVIEW_SORT_FIELDS,
                Self::REVIEW_DEFAULT,
            ),
            None => Self::parse(input, &REVIEW_SORT_FIELDS, Self::REVIEW_DEFAULT),
        }
    }

    /// Compare two records, breaking ties by ascending metric value id
    pub fn compare(&self, a: &MetricRecord, b: &MetricRecord) -> Ordering {
        let ordering = self.field.compare(a, b);
        let ordering = match self.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        };
        ordering.then_with(|| a.metric_value_id.cmp(&b.metric_value_id))
    }

    pub fn sort(&self, records: &mut [MetricRecord]) {
        records.sort_by(|a, b| self.compare(a, b));
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.field.as_str(), self.direction.as_str())
    }
}
