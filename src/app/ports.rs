use chrono::NaiveDate;

use crate::domain::MetricRecord;
use crate::error::Result;

/// Looks up the records reported by one company for one period end date.
///
/// The quality evaluator calls this once per evaluated production record; timeouts and
/// retries around the lookup belong to the implementation.
pub trait SiblingFetcher {
    fn fetch_siblings(
        &self,
        company_id: i64,
        period_end_date: NaiveDate,
        metric_names: &[&str],
    ) -> Result<Vec<MetricRecord>>;
}

impl<F> SiblingFetcher for F
where
    F: Fn(i64, NaiveDate, &[&str]) -> Result<Vec<MetricRecord>>,
{
    fn fetch_siblings(
        &self,
        company_id: i64,
        period_end_date: NaiveDate,
        metric_names: &[&str],
    ) -> Result<Vec<MetricRecord>> {
        self(company_id, period_end_date, metric_names)
    }
}

/// Source of the records the reporting use cases work on
pub trait MetricSource {
    fn all_records(&self) -> Vec<MetricRecord>;
    fn record_by_id(&self, metric_value_id: i64) -> Option<MetricRecord>;
}
