use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

use crate::app::ports::{MetricSource, SiblingFetcher};
use crate::domain::MetricRecord;
use crate::error::{MetricsError, Result};

/// In-memory metric store for development, the CLI and tests.
///
/// Records are keyed by `metric_value_id`; inserting an existing id replaces the record.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMetricStore {
    records: Arc<RwLock<BTreeMap<i64, MetricRecord>>>,
}

impl InMemoryMetricStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = MetricRecord>) -> Self {
        let store = Self::new();
        for record in records {
            store.insert(record);
        }
        store
    }

    /// Load a JSON array of metric records
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let records: Vec<MetricRecord> = serde_json::from_str(&content)?;

        info!(path = %path.display(), records = records.len(), "Loaded metric records");
        Ok(Self::from_records(records))
    }

    pub fn insert(&self, record: MetricRecord) {
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        debug!(metric_value_id = record.metric_value_id, metric = %record.metric_name_internal, "Stored metric record");
        records.insert(record.metric_value_id, record);
    }

    pub fn len(&self) -> usize {
        self.records.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, metric_value_id: i64) -> Result<MetricRecord> {
        self.record_by_id(metric_value_id)
            .ok_or(MetricsError::RecordNotFound(metric_value_id))
    }
}

impl MetricSource for InMemoryMetricStore {
    fn all_records(&self) -> Vec<MetricRecord> {
        self.records
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .cloned()
            .collect()
    }

    fn record_by_id(&self, metric_value_id: i64) -> Option<MetricRecord> {
        self.records
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&metric_value_id)
            .cloned()
    }
}

impl SiblingFetcher for InMemoryMetricStore {
    fn fetch_siblings(
        &self,
        company_id: i64,
        period_end_date: NaiveDate,
        metric_names: &[&str],
    ) -> Result<Vec<MetricRecord>> {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        let siblings: Vec<MetricRecord> = records
            .values()
            .filter(|r| {
                r.company_id == company_id
                    && r.period_end_date == Some(period_end_date)
                    && metric_names.contains(&r.metric_name_internal.as_str())
            })
            .cloned()
            .collect();

        debug!(company_id, %period_end_date, siblings = siblings.len(), "Fetched sibling metrics");
        Ok(siblings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::PRODUCTION_METRICS;
    use std::io::Write;

    fn q4() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()
    }

    #[test]
    fn test_fetch_siblings_filters_company_period_and_metric() {
        let store = InMemoryMetricStore::from_records(vec![
            MetricRecord::new(1, 1, "oil_production", Some(1.0), Some("mbbl")).with_period(None, Some(q4())),
            MetricRecord::new(2, 1, "boe_production", Some(1.0), Some("mboe")).with_period(None, Some(q4())),
            MetricRecord::new(3, 1, "gross_wells_drilled", Some(4.0), Some("#")).with_period(None, Some(q4())),
            MetricRecord::new(4, 2, "oil_production", Some(1.0), Some("mbbl")).with_period(None, Some(q4())),
            MetricRecord::new(5, 1, "gas_production", Some(1.0), Some("mmcf")),
        ]);

        let siblings = store.fetch_siblings(1, q4(), &PRODUCTION_METRICS).unwrap();
        let ids: Vec<i64> = siblings.iter().map(|r| r.metric_value_id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_insert_replaces_existing_id() {
        let store = InMemoryMetricStore::new();
        store.insert(MetricRecord::new(1, 1, "oil_production", Some(1.0), Some("mbbl")));
        store.insert(MetricRecord::new(1, 1, "oil_production", Some(2.0), Some("mbbl")));

        assert_eq!(store.len(), 1);
        assert_eq!(store.get(1).unwrap().value, Some(2.0));
        assert!(matches!(store.get(99), Err(MetricsError::RecordNotFound(99))));
    }

    #[test]
    fn test_loads_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"metric_value_id": 5, "company_id": 2, "metric_name_internal": "gas_production",
                 "value": 1200, "unit": "mcf", "extraction_confidence_score": 0.7}}]"#
        )
        .unwrap();

        let store = InMemoryMetricStore::from_json_file(file.path()).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(5).unwrap().unit.as_deref(), Some("mcf"));
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            InMemoryMetricStore::from_json_file(file.path()),
            Err(MetricsError::Json(_))
        ));
    }
}
