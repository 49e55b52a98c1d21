use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::app::ports::MetricSource;
use crate::config::ReviewConfig;
use crate::domain::{MetricRecord, SortSpec};
use crate::error::{ensure_unit_interval, Result};
use crate::pipeline::processing::normalize::UnitNormalizer;
use crate::pipeline::processing::quality_gate::{ReviewHintBuilder, Severity};

/// Filters for the low-confidence review queue
#[derive(Debug, Clone, Default)]
pub struct ReviewFilter {
    /// Upper bound (exclusive) on confidence, within `0.0..=1.0`; the configured default applies when unset
    pub threshold: Option<f64>,
    pub company_id: Option<i64>,
    pub period_end_date: Option<NaiveDate>,
    /// Empty means every metric
    pub metric_names: Vec<String>,
    /// Defaults to `confidence:asc`
    pub sort: Option<SortSpec>,
}

impl ReviewFilter {
    fn matches(&self, record: &MetricRecord, threshold: f64) -> bool {
        if record.extraction_confidence_score >= threshold {
            return false;
        }
        if self.company_id.is_some_and(|id| id != record.company_id) {
            return false;
        }
        if self.period_end_date.is_some() && self.period_end_date != record.period_end_date {
            return false;
        }
        self.metric_names.is_empty() || self.metric_names.iter().any(|m| *m == record.metric_name_internal)
    }
}

/// One row of the review queue
#[derive(Debug, Clone, Serialize)]
pub struct ReviewItem {
    #[serde(flatten)]
    pub record: MetricRecord,
    pub normalized_value: Option<f64>,
    pub normalized_unit: Option<String>,
    pub severity: Severity,
    pub review_hint: String,
}

/// Use case listing records whose extraction confidence calls for a human look
#[derive(Debug, Clone, Default)]
pub struct ReviewQueueUseCase {
    config: ReviewConfig,
    hints: ReviewHintBuilder,
    normalizer: UnitNormalizer,
}

impl ReviewQueueUseCase {
    pub fn new(config: ReviewConfig) -> Self {
        Self {
            hints: ReviewHintBuilder::with_config(config.clone()),
            config,
            normalizer: UnitNormalizer::new(),
        }
    }

    /// Matching records in the requested order, least confident first by default
    pub fn queue<S>(&self, source: &S, filter: &ReviewFilter) -> Result<Vec<ReviewItem>>
    where
        S: MetricSource + ?Sized,
    {
        let threshold = match filter.threshold {
            Some(threshold) => ensure_unit_interval("threshold", threshold)?,
            None => self.config.default_threshold,
        };
        let sort = filter.sort.unwrap_or(SortSpec::REVIEW_DEFAULT);

        let mut records: Vec<MetricRecord> = source
            .all_records()
            .into_iter()
            .filter(|r| filter.matches(r, threshold))
            .collect();
        sort.sort(&mut records);

        let items: Vec<ReviewItem> = records.into_iter().map(|r| self.review_item(r)).collect();

        info!(threshold, %sort, items = items.len(), "Built review queue");
        Ok(items)
    }

    fn review_item(&self, record: MetricRecord) -> ReviewItem {
        let normalized = self.normalizer.normalize_record(&record);
        let severity = self.hints.severity(&record);
        let review_hint = self.hints.build(&record);

        crate::observability::metrics::review::hint_generated(severity.as_str());

        ReviewItem {
            normalized_value: normalized.value,
            normalized_unit: normalized.unit,
            severity,
            review_hint,
            record,
        }
    }
}
