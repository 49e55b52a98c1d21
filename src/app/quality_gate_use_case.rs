use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use crate::app::ports::{MetricSource, SiblingFetcher};
use crate::domain::MetricRecord;
use crate::error::MetricsError;
use crate::pipeline::processing::normalize::{display_value, UnitNormalizer};
use crate::pipeline::processing::quality_gate::{DataQualityEvaluator, QualityCheck};

/// Full view of one metric row: the record, its normalized value and its derived checks
#[derive(Debug, Clone, Serialize)]
pub struct MetricDetail {
    #[serde(flatten)]
    pub record: MetricRecord,
    pub normalized_value: Option<f64>,
    pub normalized_unit: Option<String>,
    pub display_value: Option<f64>,
    pub display_unit: Option<String>,
    pub derived_checks: Vec<QualityCheck>,
}

/// Evaluation outcome for one record of a batch
#[derive(Debug)]
pub struct RecordEvaluation {
    pub metric_value_id: i64,
    pub checks: std::result::Result<Vec<QualityCheck>, MetricsError>,
}

/// Use case for running data-quality checks on stored metric records
#[derive(Debug, Clone, Default)]
pub struct QualityGateUseCase {
    evaluator: DataQualityEvaluator,
    normalizer: UnitNormalizer,
}

impl QualityGateUseCase {
    pub fn new(evaluator: DataQualityEvaluator) -> Self {
        Self {
            evaluator,
            normalizer: UnitNormalizer::new(),
        }
    }

    /// Evaluate one record and emit metrics for each resulting check
    pub fn assess_record<F>(&self, record: &MetricRecord, siblings: &F) -> std::result::Result<Vec<QualityCheck>, MetricsError>
    where
        F: SiblingFetcher + ?Sized,
    {
        let checks = match self.evaluator.evaluate(record, siblings) {
            Ok(checks) => checks,
            Err(e) => {
                crate::observability::metrics::quality::evaluation_failed();
                warn!(metric_value_id = record.metric_value_id, error = %e, "Quality evaluation failed");
                return Err(e);
            }
        };

        crate::observability::metrics::quality::record_evaluated();
        for check in &checks {
            crate::observability::metrics::quality::check_recorded(&check.name, check.status.as_str());
        }

        Ok(checks)
    }

    /// Evaluate every record independently; a failure for one record leaves the others intact
    pub fn assess_batch<F>(&self, records: &[MetricRecord], siblings: &F) -> Vec<RecordEvaluation>
    where
        F: SiblingFetcher + ?Sized,
    {
        let evaluations: Vec<RecordEvaluation> = records
            .iter()
            .map(|record| RecordEvaluation {
                metric_value_id: record.metric_value_id,
                checks: self.assess_record(record, siblings),
            })
            .collect();

        let failed = evaluations.iter().filter(|e| e.checks.is_err()).count();
        crate::observability::metrics::quality::batch_processed(records.len());
        info!(records = records.len(), failed, "Quality batch evaluated");

        evaluations
    }

    /// Build the detail view for one stored record
    pub fn describe<S>(&self, store: &S, metric_value_id: i64) -> Result<MetricDetail>
    where
        S: MetricSource + SiblingFetcher,
    {
        let record = store
            .record_by_id(metric_value_id)
            .ok_or(MetricsError::RecordNotFound(metric_value_id))?;

        let normalized = self.normalizer.normalize_record(&record);
        let (display_value, display_unit) = display_value(
            record.value,
            record.unit.as_deref(),
            normalized.value,
            normalized.unit.as_deref(),
        );
        let derived_checks = self
            .assess_record(&record, store)
            .with_context(|| format!("Failed to run derived checks for metric value {}", metric_value_id))?;

        Ok(MetricDetail {
            record,
            normalized_value: normalized.value,
            normalized_unit: normalized.unit,
            display_value,
            display_unit,
            derived_checks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::processing::quality_gate::{CheckStatus, BOE_CONSISTENCY_CHECK};
    use crate::storage::InMemoryMetricStore;
    use chrono::NaiveDate;

    fn q4_record(id: i64, company_id: i64, metric: &str, value: f64, unit: &str) -> MetricRecord {
        MetricRecord::new(id, company_id, metric, Some(value), Some(unit))
            .with_period(NaiveDate::from_ymd_opt(2024, 10, 1), NaiveDate::from_ymd_opt(2024, 12, 31))
            .with_confidence(0.9)
    }

    struct FlakyStore {
        inner: InMemoryMetricStore,
        failing_company: i64,
    }

    impl SiblingFetcher for FlakyStore {
        fn fetch_siblings(
            &self,
            company_id: i64,
            period_end_date: NaiveDate,
            metric_names: &[&str],
        ) -> crate::error::Result<Vec<MetricRecord>> {
            if company_id == self.failing_company {
                return Err(MetricsError::SiblingLookup {
                    company_id,
                    message: "timeout".to_string(),
                });
            }
            self.inner.fetch_siblings(company_id, period_end_date, metric_names)
        }
    }

    #[test]
    fn test_describe_includes_normalized_value_and_checks() {
        let store = InMemoryMetricStore::from_records(vec![
            q4_record(1, 7, "oil_production", 100_000.0, "bbl"),
            q4_record(2, 7, "gas_production", 600.0, "mmcf"),
            q4_record(3, 7, "boe_production", 200.0, "mboe"),
        ]);

        let detail = QualityGateUseCase::default().describe(&store, 1).unwrap();
        assert_eq!(detail.normalized_value, Some(100.0));
        assert_eq!(detail.normalized_unit.as_deref(), Some("mbbl"));
        assert_eq!(detail.display_unit.as_deref(), Some("mbbl"));

        let boe = detail
            .derived_checks
            .iter()
            .find(|c| c.name == BOE_CONSISTENCY_CHECK)
            .unwrap();
        assert_eq!(boe.status, CheckStatus::Ok);
    }

    #[test]
    fn test_describe_unknown_record() {
        let store = InMemoryMetricStore::new();
        let err = QualityGateUseCase::default().describe(&store, 42).unwrap_err();
        assert!(err.to_string().contains("42"));
    }

    #[test]
    fn test_batch_isolates_failures() {
        let records = vec![
            q4_record(1, 1, "oil_production", 10.0, "mbbl"),
            q4_record(2, 2, "oil_production", 10.0, "mbbl"),
        ];
        let store = FlakyStore {
            inner: InMemoryMetricStore::from_records(records.clone()),
            failing_company: 1,
        };

        let evaluations = QualityGateUseCase::default().assess_batch(&records, &store);
        assert_eq!(evaluations.len(), 2);
        assert!(evaluations[0].checks.is_err());
        assert_eq!(evaluations[1].metric_value_id, 2);
        assert_eq!(evaluations[1].checks.as_ref().unwrap().len(), 3);
    }
}
