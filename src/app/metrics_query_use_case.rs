use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::app::normalize_use_case::NormalizeUseCase;
use crate::app::ports::MetricSource;
use crate::domain::{MetricRecord, QuarterPeriod, SortSpec};
use crate::error::{ensure_unit_interval, Result};

/// Filters for the main metric listing of one company
#[derive(Debug, Clone, Default)]
pub struct MetricsFilter {
    pub company_id: i64,
    /// Takes precedence over `quarter` when both are set
    pub period_end_date: Option<NaiveDate>,
    pub quarter: Option<QuarterPeriod>,
    /// Empty means every metric
    pub metric_names: Vec<String>,
    pub basin: Option<String>,
    pub segment: Option<String>,
    /// Inclusive lower bound on confidence, within `0.0..=1.0`
    pub confidence_min: Option<f64>,
    /// Defaults to `period_end_date:desc`
    pub sort: Option<SortSpec>,
}

impl MetricsFilter {
    pub fn for_company(company_id: i64) -> Self {
        Self {
            company_id,
            ..Self::default()
        }
    }

    fn period_end(&self) -> Result<Option<NaiveDate>> {
        match (self.period_end_date, self.quarter) {
            (Some(date), _) => Ok(Some(date)),
            (None, Some(quarter)) => quarter.end_date().map(Some),
            (None, None) => Ok(None),
        }
    }

    fn matches(&self, record: &MetricRecord, period_end: Option<NaiveDate>) -> bool {
        if record.company_id != self.company_id {
            return false;
        }
        if period_end.is_some() && record.period_end_date != period_end {
            return false;
        }
        if !self.metric_names.is_empty() && !self.metric_names.contains(&record.metric_name_internal) {
            return false;
        }
        // Empty strings are treated as no filter
        if let Some(basin) = self.basin.as_deref().filter(|b| !b.is_empty()) {
            if record.basin_name.as_deref() != Some(basin) {
                return false;
            }
        }
        if let Some(segment) = self.segment.as_deref().filter(|s| !s.is_empty()) {
            if record.segment_name.as_deref() != Some(segment) {
                return false;
            }
        }
        self.confidence_min
            .map_or(true, |min| record.extraction_confidence_score >= min)
    }
}

/// One row of the metric listing, with the value shown both as extracted and normalized
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRow {
    pub metric_value_id: i64,
    pub company_id: i64,
    pub company_name: Option<String>,
    pub metric_name_internal: String,
    pub metric_name_display: Option<String>,
    pub original_value: Option<f64>,
    pub original_unit: Option<String>,
    pub normalized_value: Option<f64>,
    pub normalized_unit: Option<String>,
    pub period_start_date: Option<NaiveDate>,
    pub period_end_date: Option<NaiveDate>,
    pub basin_name: Option<String>,
    pub segment_name: Option<String>,
    pub extraction_confidence_score: f64,
    pub extraction_method: Option<String>,
    pub source_url: Option<String>,
}

/// Use case behind the main metric listing
#[derive(Debug, Clone, Default)]
pub struct MetricsQueryUseCase {
    normalize: NormalizeUseCase,
}

impl MetricsQueryUseCase {
    pub fn new(normalize: NormalizeUseCase) -> Self {
        Self { normalize }
    }

    pub fn list<S>(&self, source: &S, filter: &MetricsFilter) -> Result<Vec<MetricRow>>
    where
        S: MetricSource + ?Sized,
    {
        if let Some(min) = filter.confidence_min {
            ensure_unit_interval("confidence_min", min)?;
        }
        let period_end = filter.period_end()?;
        let sort = filter.sort.unwrap_or(SortSpec::LISTING_DEFAULT);

        let mut records: Vec<MetricRecord> = source
            .all_records()
            .into_iter()
            .filter(|r| filter.matches(r, period_end))
            .collect();
        sort.sort(&mut records);

        let rows: Vec<MetricRow> = records.into_iter().map(|r| self.row(r)).collect();

        info!(
            company_id = filter.company_id,
            period_end = ?period_end,
            %sort,
            rows = rows.len(),
            "Listed metric values"
        );
        Ok(rows)
    }

    fn row(&self, record: MetricRecord) -> MetricRow {
        let normalized = self.normalize.normalize_record(&record).normalized;

        MetricRow {
            metric_value_id: record.metric_value_id,
            company_id: record.company_id,
            company_name: record.company_name,
            metric_name_internal: record.metric_name_internal,
            metric_name_display: record.metric_name_display,
            original_value: record.value,
            original_unit: record.unit,
            normalized_value: normalized.value,
            normalized_unit: normalized.unit,
            period_start_date: record.period_start_date,
            period_end_date: record.period_end_date,
            basin_name: record.basin_name,
            segment_name: record.segment_name,
            extraction_confidence_score: record.extraction_confidence_score,
            extraction_method: record.extraction_method,
            source_url: record.source_url,
        }
    }
}
