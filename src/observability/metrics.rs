//! Metrics for the normalization and data-quality pipeline
//!
//! Recording goes through the `metrics` facade; nothing is collected unless a recorder
//! has been installed with [`init`].

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::fmt;
use std::sync::OnceLock;
use tracing::info;

use crate::error::{MetricsError, Result};

/// Enum representing all metric names used in the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Normalize metrics
    NormalizeConversions,

    // Quality metrics
    QualityChecksEvaluated,
    QualityRecordsEvaluated,
    QualityEvaluationErrors,
    QualityBatchSize,

    // Review metrics
    ReviewHintsGenerated,

    // Aggregate metrics
    AggregateGroupsProduced,
    AggregateMixedUnitGroups,
    AggregateBatchSize,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::NormalizeConversions => "ogm_normalize_conversions_total",

            MetricName::QualityChecksEvaluated => "ogm_quality_checks_evaluated_total",
            MetricName::QualityRecordsEvaluated => "ogm_quality_records_evaluated_total",
            MetricName::QualityEvaluationErrors => "ogm_quality_evaluation_errors_total",
            MetricName::QualityBatchSize => "ogm_quality_batch_size",

            MetricName::ReviewHintsGenerated => "ogm_review_hints_generated_total",

            MetricName::AggregateGroupsProduced => "ogm_aggregate_groups_produced_total",
            MetricName::AggregateMixedUnitGroups => "ogm_aggregate_mixed_unit_groups_total",
            MetricName::AggregateBatchSize => "ogm_aggregate_batch_size",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder. Calling it again is a no-op.
pub fn init() -> Result<()> {
    if METRICS_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| MetricsError::Config(format!("Failed to install Prometheus recorder: {}", e)))?;

    let _ = METRICS_HANDLE.set(handle);
    info!("Metrics recorder installed");
    Ok(())
}

/// Prometheus exposition text for everything recorded so far
pub fn render() -> Option<String> {
    METRICS_HANDLE.get().map(|handle| handle.render())
}

pub mod normalize {
    use super::MetricName;

    pub fn conversion_recorded(outcome: &'static str) {
        ::metrics::counter!(MetricName::NormalizeConversions.as_str(), "outcome" => outcome).increment(1);
    }
}

pub mod quality {
    use super::MetricName;

    pub fn check_recorded(check: &str, status: &'static str) {
        ::metrics::counter!(
            MetricName::QualityChecksEvaluated.as_str(),
            "check" => check.to_string(),
            "status" => status
        )
        .increment(1);
    }

    pub fn record_evaluated() {
        ::metrics::counter!(MetricName::QualityRecordsEvaluated.as_str()).increment(1);
    }

    pub fn evaluation_failed() {
        ::metrics::counter!(MetricName::QualityEvaluationErrors.as_str()).increment(1);
    }

    pub fn batch_processed(total_records: usize) {
        ::metrics::histogram!(MetricName::QualityBatchSize.as_str()).record(total_records as f64);
    }
}

pub mod review {
    use super::MetricName;

    pub fn hint_generated(severity: &'static str) {
        ::metrics::counter!(MetricName::ReviewHintsGenerated.as_str(), "severity" => severity).increment(1);
    }
}

pub mod aggregate {
    use super::MetricName;

    pub fn batch_aggregated(records: usize, groups: usize, mixed_unit_groups: usize) {
        ::metrics::histogram!(MetricName::AggregateBatchSize.as_str()).record(records as f64);
        ::metrics::counter!(MetricName::AggregateGroupsProduced.as_str()).increment(groups as u64);
        if mixed_unit_groups > 0 {
            ::metrics::counter!(MetricName::AggregateMixedUnitGroups.as_str()).increment(mixed_unit_groups as u64);
        }
    }
}
