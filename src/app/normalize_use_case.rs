use serde::Serialize;
use tracing::debug;

use crate::domain::MetricRecord;
use crate::pipeline::processing::normalize::{NormalizedValue, UnitNormalizer};

/// A record's original value next to its normalized value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedMetric {
    pub metric_value_id: i64,
    pub company_id: i64,
    pub metric_name_internal: String,
    pub original_value: Option<f64>,
    pub original_unit: Option<String>,
    #[serde(flatten)]
    pub normalized: NormalizedValue,
}

/// Use case for normalizing metric records into their standard units
#[derive(Debug, Clone, Default)]
pub struct NormalizeUseCase {
    normalizer: UnitNormalizer,
}

impl NormalizeUseCase {
    pub fn new(normalizer: UnitNormalizer) -> Self {
        Self { normalizer }
    }

    pub fn normalize_record(&self, record: &MetricRecord) -> NormalizedMetric {
        let normalized = self.normalizer.normalize_record(record);

        crate::observability::metrics::normalize::conversion_recorded(normalized.outcome.as_str());
        debug!(
            metric_value_id = record.metric_value_id,
            metric = %record.metric_name_internal,
            outcome = normalized.outcome.as_str(),
            "Normalized metric value"
        );

        NormalizedMetric {
            metric_value_id: record.metric_value_id,
            company_id: record.company_id,
            metric_name_internal: record.metric_name_internal.clone(),
            original_value: record.value,
            original_unit: record.unit.clone(),
            normalized,
        }
    }

    pub fn normalize_batch(&self, records: &[MetricRecord]) -> Vec<NormalizedMetric> {
        records.iter().map(|r| self.normalize_record(r)).collect()
    }
}
