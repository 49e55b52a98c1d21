use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::info;

use crate::app::ports::MetricSource;
use crate::constants::DEFAULT_SUMMARY_METRICS;
use crate::domain::{GroupBy, MetricRecord, QuarterPeriod};
use crate::error::ensure_unit_interval;
use crate::pipeline::processing::aggregate::{Aggregator, GroupSummary};

/// Which reporting period a summary covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryPeriod {
    EndDate(NaiveDate),
    Quarter(QuarterPeriod),
}

impl SummaryPeriod {
    pub fn end_date(&self) -> Result<NaiveDate> {
        match self {
            SummaryPeriod::EndDate(date) => Ok(*date),
            SummaryPeriod::Quarter(quarter) => quarter
                .end_date()
                .with_context(|| format!("Invalid quarter {}", quarter)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SummaryRequest {
    pub period: SummaryPeriod,
    /// Empty selects the default production metrics
    pub metric_names: Vec<String>,
    pub group_by: GroupBy,
    /// Empty means every company
    pub company_ids: Vec<i64>,
    /// Inclusive lower bound on confidence, within `0.0..=1.0`
    pub confidence_min: Option<f64>,
}

impl SummaryRequest {
    pub fn new(period: SummaryPeriod) -> Self {
        Self {
            period,
            metric_names: Vec::new(),
            group_by: GroupBy::default(),
            company_ids: Vec::new(),
            confidence_min: None,
        }
    }

    fn metric_names(&self) -> Vec<&str> {
        if self.metric_names.is_empty() {
            DEFAULT_SUMMARY_METRICS.to_vec()
        } else {
            self.metric_names.iter().map(String::as_str).collect()
        }
    }
}

/// Use case producing per-company, per-basin or per-segment totals for one period
#[derive(Debug, Clone, Copy, Default)]
pub struct SummaryUseCase {
    aggregator: Aggregator,
}

impl SummaryUseCase {
    pub fn new(aggregator: Aggregator) -> Self {
        Self { aggregator }
    }

    pub fn summarize<S>(&self, source: &S, request: &SummaryRequest) -> Result<Vec<GroupSummary>>
    where
        S: MetricSource + ?Sized,
    {
        let period_end = request.period.end_date()?;
        if let Some(min) = request.confidence_min {
            ensure_unit_interval("confidence_min", min)?;
        }
        let metric_names = request.metric_names();

        let records: Vec<MetricRecord> = source
            .all_records()
            .into_iter()
            .filter(|r| r.period_end_date == Some(period_end))
            .filter(|r| metric_names.contains(&r.metric_name_internal.as_str()))
            .filter(|r| request.company_ids.is_empty() || request.company_ids.contains(&r.company_id))
            .filter(|r| {
                request
                    .confidence_min
                    .map_or(true, |min| r.extraction_confidence_score >= min)
            })
            .collect();

        let summaries = self.aggregator.aggregate(&records, request.group_by);
        let mixed = summaries.iter().filter(|s| s.mixed_units).count();

        crate::observability::metrics::aggregate::batch_aggregated(records.len(), summaries.len(), mixed);
        info!(
            %period_end,
            group_by = %request.group_by,
            records = records.len(),
            groups = summaries.len(),
            "Built metric summary"
        );

        Ok(summaries)
    }
}
