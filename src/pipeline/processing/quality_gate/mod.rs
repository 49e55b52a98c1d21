use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, warn};

use crate::app::ports::SiblingFetcher;
use crate::config::QualityConfig;
use crate::constants::{self, BOE_PRODUCTION, GAS_PRODUCTION, NGL_PRODUCTION, OIL_PRODUCTION, PRODUCTION_METRICS};
use crate::domain::MetricRecord;
use crate::error::Result;
use crate::pipeline::processing::normalize::UnitNormalizer;

pub mod review_hint;

pub use review_hint::{MethodCategory, ReviewHintBuilder, Severity};

pub const CONFIDENCE_CHECK_OK: &str = "Confidence score check";
pub const CONFIDENCE_CHECK_FLAG: &str = "Low confidence score";
pub const BOE_CONSISTENCY_CHECK: &str = "BOE consistency check";
pub const PERIOD_DURATION_CHECK: &str = "Period duration check";
pub const VALUE_SANITY_CHECK: &str = "Value sanity check";

/// Outcome of a single quality rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    /// The record passed the rule
    Ok,
    /// The record needs attention; the reason says why
    Flag,
}

impl CheckStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckStatus::Ok => "ok",
            CheckStatus::Flag => "flag",
        }
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one evaluation rule applied to a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityCheck {
    /// Display name of the rule, one of the `*_CHECK` constants
    pub name: String,
    pub status: CheckStatus,
    /// Human-readable explanation of the status
    pub reason: String,
}

impl QualityCheck {
    pub fn ok(name: &str, reason: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            reason: reason.into(),
        }
    }

    pub fn flag(name: &str, reason: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Flag,
            reason: reason.into(),
        }
    }

    pub fn is_flagged(&self) -> bool {
        self.status == CheckStatus::Flag
    }
}

/// Runs the fixed battery of per-record and cross-record data-quality checks
#[derive(Debug, Clone, Default)]
pub struct DataQualityEvaluator {
    normalizer: UnitNormalizer,
    config: QualityConfig,
}

impl DataQualityEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: QualityConfig) -> Self {
        Self {
            normalizer: UnitNormalizer::new(),
            config,
        }
    }

    pub fn config(&self) -> &QualityConfig {
        &self.config
    }

    /// Evaluate one record.
    ///
    /// Checks come back in a fixed order: confidence, BOE consistency, period duration,
    /// value sanity. Conditional checks that do not apply are left out rather than
    /// reported as failures. The only error is a failing sibling lookup.
    pub fn evaluate<F>(&self, record: &MetricRecord, siblings: &F) -> Result<Vec<QualityCheck>>
    where
        F: SiblingFetcher + ?Sized,
    {
        let mut checks = vec![self.check_confidence(record)];

        if constants::is_production_metric(&record.metric_name_internal) {
            if let Some(check) = self.check_boe_consistency(record, siblings)? {
                checks.push(check);
            }
        }

        if let Some(check) = self.check_period_duration(record) {
            checks.push(check);
        }

        if let Some(check) = self.check_value_sanity(record) {
            checks.push(check);
        }

        debug!(
            metric_value_id = record.metric_value_id,
            checks = checks.len(),
            flagged = checks.iter().filter(|c| c.is_flagged()).count(),
            "Evaluated metric record"
        );

        Ok(checks)
    }

    pub fn check_confidence(&self, record: &MetricRecord) -> QualityCheck {
        let score = record.extraction_confidence_score;
        let threshold = self.config.confidence_threshold;

        if score < threshold {
            QualityCheck::flag(
                CONFIDENCE_CHECK_FLAG,
                format!(
                    "Confidence score {:.2} is below recommended threshold of {:.2}",
                    score, threshold
                ),
            )
        } else {
            QualityCheck::ok(
                CONFIDENCE_CHECK_OK,
                format!("Confidence score {:.2} meets quality threshold", score),
            )
        }
    }

    /// Reconcile oil, NGL and gas against reported BOE for the record's company and period
    pub fn check_boe_consistency<F>(&self, record: &MetricRecord, siblings: &F) -> Result<Option<QualityCheck>>
    where
        F: SiblingFetcher + ?Sized,
    {
        // Records without a period end date cannot share a period with anything
        let Some(period_end_date) = record.period_end_date else {
            return Ok(None);
        };

        let related = siblings.fetch_siblings(record.company_id, period_end_date, &PRODUCTION_METRICS)?;
        Ok(self.reconcile_boe(&related))
    }

    /// Compare `oil + ngl + gas / ratio` with the reported BOE across already fetched siblings
    pub fn reconcile_boe(&self, related: &[MetricRecord]) -> Option<QualityCheck> {
        if related.len() < 2 {
            return None;
        }

        let mut values: HashMap<&str, f64> = HashMap::new();
        for metric in related {
            let normalized = self.normalizer.normalize_record(metric);
            values.insert(metric.metric_name_internal.as_str(), normalized.value.unwrap_or(0.0));
        }

        let mut expected = 0.0;
        if let Some(oil) = values.get(OIL_PRODUCTION) {
            expected += oil;
        }
        if let Some(ngl) = values.get(NGL_PRODUCTION) {
            expected += ngl;
        }
        if let Some(gas) = values.get(GAS_PRODUCTION) {
            expected += gas / self.config.gas_to_boe_ratio;
        }

        let reported = *values.get(BOE_PRODUCTION)?;
        if expected <= 0.0 {
            return None;
        }

        let percent_diff = ((reported - expected) / expected).abs() * 100.0;
        if percent_diff > self.config.boe_tolerance_pct {
            warn!(
                expected_boe = expected,
                reported_boe = reported,
                percent_diff,
                "BOE reconciliation outside tolerance"
            );
            Some(QualityCheck::flag(
                BOE_CONSISTENCY_CHECK,
                format!(
                    "Calculated BOE ({:.2}) differs from reported BOE ({:.2}) by {:.1}%",
                    expected, reported, percent_diff
                ),
            ))
        } else {
            Some(QualityCheck::ok(
                BOE_CONSISTENCY_CHECK,
                format!("BOE calculation matches within {:.1}% tolerance", percent_diff),
            ))
        }
    }

    pub fn check_period_duration(&self, record: &MetricRecord) -> Option<QualityCheck> {
        let (start, end) = (record.period_start_date?, record.period_end_date?);
        let days = (end - start).num_days().abs();

        if days < self.config.min_period_days || days > self.config.max_period_days {
            Some(QualityCheck::flag(
                PERIOD_DURATION_CHECK,
                format!(
                    "Period duration of {} days is unusual (expected {}-{})",
                    days, self.config.min_period_days, self.config.max_period_days
                ),
            ))
        } else {
            Some(QualityCheck::ok(
                PERIOD_DURATION_CHECK,
                format!("Period duration of {} days is within normal range", days),
            ))
        }
    }

    pub fn check_value_sanity(&self, record: &MetricRecord) -> Option<QualityCheck> {
        let value = record.value?;

        let check = if value < 0.0 {
            QualityCheck::flag(
                VALUE_SANITY_CHECK,
                format!("Negative value detected for {}", record.metric_name_internal),
            )
        } else if value == 0.0 {
            QualityCheck::flag(VALUE_SANITY_CHECK, "Zero value may indicate missing or null data")
        } else {
            QualityCheck::ok(VALUE_SANITY_CHECK, "Value is within expected range")
        };

        Some(check)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MetricsError;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn production(id: i64, metric: &str, value: f64, unit: &str) -> MetricRecord {
        MetricRecord::new(id, 1, metric, Some(value), Some(unit))
            .with_period(Some(date(2024, 10, 1)), Some(date(2024, 12, 31)))
    }

    /// Fake lookup returning a fixed set of siblings
    struct FixedSiblings(Vec<MetricRecord>);

    impl SiblingFetcher for FixedSiblings {
        fn fetch_siblings(&self, _: i64, _: NaiveDate, metric_names: &[&str]) -> Result<Vec<MetricRecord>> {
            Ok(self
                .0
                .iter()
                .filter(|r| metric_names.contains(&r.metric_name_internal.as_str()))
                .cloned()
                .collect())
        }
    }

    struct FailingSiblings;

    impl SiblingFetcher for FailingSiblings {
        fn fetch_siblings(&self, company_id: i64, _: NaiveDate, _: &[&str]) -> Result<Vec<MetricRecord>> {
            Err(MetricsError::SiblingLookup {
                company_id,
                message: "connection reset".to_string(),
            })
        }
    }

    fn no_siblings(_: i64, _: NaiveDate, _: &[&str]) -> Result<Vec<MetricRecord>> {
        Ok(Vec::new())
    }

    #[test]
    fn test_confidence_check_passes_high_score() {
        let evaluator = DataQualityEvaluator::new();
        let record = MetricRecord::new(1, 1, "oil_production", Some(10.0), Some("mbbl")).with_confidence(0.95);

        let check = evaluator.check_confidence(&record);
        assert_eq!(check.status, CheckStatus::Ok);
        assert_eq!(check.name, CONFIDENCE_CHECK_OK);
        assert!(check.reason.contains("0.95"));
    }

    #[test]
    fn test_confidence_check_flags_low_score() {
        let evaluator = DataQualityEvaluator::new();
        let record = MetricRecord::new(1, 1, "oil_production", Some(10.0), Some("mbbl")).with_confidence(0.65);

        let check = evaluator.check_confidence(&record);
        assert_eq!(check.status, CheckStatus::Flag);
        assert_eq!(check.name, CONFIDENCE_CHECK_FLAG);
        assert!(check.reason.contains("0.65"));
        assert!(check.reason.contains("below recommended threshold of 0.80"));
    }

    #[test]
    fn test_confidence_threshold_is_inclusive() {
        let evaluator = DataQualityEvaluator::new();

        let at_threshold = MetricRecord::new(1, 1, "oil_production", Some(10.0), Some("mbbl")).with_confidence(0.80);
        let check = evaluator.check_confidence(&at_threshold);
        assert_eq!(check.status, CheckStatus::Ok);
        assert_eq!(check.name, CONFIDENCE_CHECK_OK);

        let below = MetricRecord::new(2, 1, "oil_production", Some(10.0), Some("mbbl")).with_confidence(0.79);
        let check = evaluator.check_confidence(&below);
        assert_eq!(check.status, CheckStatus::Flag);
        assert!(check.reason.starts_with("Confidence score 0.79 is below"));
    }

    #[test]
    fn test_boe_consistency_matches() {
        let evaluator = DataQualityEvaluator::new();
        let siblings = vec![
            production(1, "oil_production", 100.0, "mbbl"),
            production(2, "gas_production", 600.0, "mmcf"),
            production(3, "boe_production", 200.0, "mboe"),
        ];

        let check = evaluator.reconcile_boe(&siblings).unwrap();
        assert_eq!(check.status, CheckStatus::Ok);
        assert_eq!(check.reason, "BOE calculation matches within 0.0% tolerance");
    }

    #[test]
    fn test_boe_consistency_flags_large_difference() {
        let evaluator = DataQualityEvaluator::new();
        let siblings = vec![
            production(1, "oil_production", 100.0, "mbbl"),
            production(2, "gas_production", 600.0, "mmcf"),
            production(3, "boe_production", 250.0, "mboe"),
        ];

        let check = evaluator.reconcile_boe(&siblings).unwrap();
        assert_eq!(check.status, CheckStatus::Flag);
        assert_eq!(
            check.reason,
            "Calculated BOE (200.00) differs from reported BOE (250.00) by 25.0%"
        );
    }

    #[test]
    fn test_boe_tolerance_bound_is_inclusive() {
        let evaluator = DataQualityEvaluator::new();

        let siblings = vec![
            production(1, "oil_production", 200.0, "mbbl"),
            production(2, "boe_production", 220.0, "mboe"),
        ];
        let check = evaluator.reconcile_boe(&siblings).unwrap();
        assert_eq!(check.status, CheckStatus::Ok);
        assert_eq!(check.reason, "BOE calculation matches within 10.0% tolerance");

        let siblings = vec![
            production(1, "oil_production", 200.0, "mbbl"),
            production(2, "boe_production", 221.0, "mboe"),
        ];
        let check = evaluator.reconcile_boe(&siblings).unwrap();
        assert_eq!(check.status, CheckStatus::Flag);
        assert!(check.reason.ends_with("by 10.5%"));
    }

    #[test]
    fn test_boe_consistency_normalizes_sibling_units() {
        let evaluator = DataQualityEvaluator::new();
        let siblings = vec![
            production(1, "oil_production", 100_000.0, "bbl"),
            production(2, "gas_production", 600_000.0, "mcf"),
            production(3, "ngl_production", 0.05, "mmbbl"),
            production(4, "boe_production", 250_000.0, "boe"),
        ];

        let check = evaluator.reconcile_boe(&siblings).unwrap();
        assert_eq!(check.status, CheckStatus::Ok);
    }

    #[test]
    fn test_boe_consistency_skips_with_single_sibling() {
        let evaluator = DataQualityEvaluator::new();
        let siblings = vec![production(1, "boe_production", 200.0, "mboe")];
        assert!(evaluator.reconcile_boe(&siblings).is_none());
    }

    #[test]
    fn test_boe_consistency_skips_without_reported_boe() {
        let evaluator = DataQualityEvaluator::new();
        let siblings = vec![
            production(1, "oil_production", 100.0, "mbbl"),
            production(2, "gas_production", 600.0, "mmcf"),
        ];
        assert!(evaluator.reconcile_boe(&siblings).is_none());
    }

    #[test]
    fn test_boe_consistency_skips_when_expected_is_zero() {
        let evaluator = DataQualityEvaluator::new();
        let siblings = vec![
            production(1, "oil_production", 0.0, "mbbl"),
            production(2, "boe_production", 50.0, "mboe"),
        ];
        assert!(evaluator.reconcile_boe(&siblings).is_none());
    }

    #[test]
    fn test_boe_tolerance_is_configurable() {
        let evaluator = DataQualityEvaluator::with_config(QualityConfig {
            boe_tolerance_pct: 30.0,
            ..QualityConfig::default()
        });
        let siblings = vec![
            production(1, "oil_production", 100.0, "mbbl"),
            production(2, "gas_production", 600.0, "mmcf"),
            production(3, "boe_production", 250.0, "mboe"),
        ];

        let check = evaluator.reconcile_boe(&siblings).unwrap();
        assert_eq!(check.status, CheckStatus::Ok);
    }

    #[test]
    fn test_period_duration_flags_short_period() {
        let evaluator = DataQualityEvaluator::new();
        let record = MetricRecord::new(1, 1, "oil_production", Some(10.0), Some("mbbl"))
            .with_period(Some(date(2024, 3, 26)), Some(date(2024, 3, 31)));

        let check = evaluator.check_period_duration(&record).unwrap();
        assert_eq!(check.status, CheckStatus::Flag);
        assert!(check.reason.contains("5 days"));
    }

    #[test]
    fn test_period_duration_accepts_quarter() {
        let evaluator = DataQualityEvaluator::new();
        let record = MetricRecord::new(1, 1, "oil_production", Some(10.0), Some("mbbl"))
            .with_period(Some(date(2024, 1, 1)), Some(date(2024, 3, 31)));

        let check = evaluator.check_period_duration(&record).unwrap();
        assert_eq!(check.status, CheckStatus::Ok);
        assert!(check.reason.contains("90 days"));
    }

    #[test]
    fn test_period_duration_flags_multi_year_span() {
        let evaluator = DataQualityEvaluator::new();
        let record = MetricRecord::new(1, 1, "oil_production", Some(10.0), Some("mbbl"))
            .with_period(Some(date(2022, 1, 1)), Some(date(2023, 12, 31)));

        let check = evaluator.check_period_duration(&record).unwrap();
        assert_eq!(check.status, CheckStatus::Flag);
    }

    #[test]
    fn test_period_duration_bounds_are_inclusive() {
        let evaluator = DataQualityEvaluator::new();
        let cases = [
            ((2024, 2, 1), (2024, 2, 29), 28, CheckStatus::Ok),
            ((2024, 2, 2), (2024, 2, 29), 27, CheckStatus::Flag),
            ((2024, 1, 1), (2025, 1, 1), 366, CheckStatus::Ok),
            ((2024, 1, 1), (2025, 1, 2), 367, CheckStatus::Flag),
        ];

        for ((sy, sm, sd), (ey, em, ed), days, expected) in cases {
            let record = MetricRecord::new(1, 1, "oil_production", Some(10.0), Some("mbbl"))
                .with_period(Some(date(sy, sm, sd)), Some(date(ey, em, ed)));

            let check = evaluator.check_period_duration(&record).unwrap();
            assert_eq!(check.status, expected, "{days} days");
            assert!(check.reason.contains(&format!("{days} days")));
        }
    }

    #[test]
    fn test_period_duration_requires_both_dates() {
        let evaluator = DataQualityEvaluator::new();
        let record = MetricRecord::new(1, 1, "oil_production", Some(10.0), Some("mbbl"))
            .with_period(None, Some(date(2024, 3, 31)));
        assert!(evaluator.check_period_duration(&record).is_none());
    }

    #[test]
    fn test_value_sanity() {
        let evaluator = DataQualityEvaluator::new();

        let negative = MetricRecord::new(1, 1, "oil_production", Some(-100.0), Some("mbbl"));
        let check = evaluator.check_value_sanity(&negative).unwrap();
        assert_eq!(check.status, CheckStatus::Flag);
        assert!(check.reason.contains("Negative value detected"));

        let zero = MetricRecord::new(2, 1, "oil_production", Some(0.0), Some("mbbl"));
        let check = evaluator.check_value_sanity(&zero).unwrap();
        assert_eq!(check.status, CheckStatus::Flag);
        assert!(check.reason.contains("Zero value"));

        let positive = MetricRecord::new(3, 1, "oil_production", Some(100.0), Some("mbbl"));
        assert_eq!(evaluator.check_value_sanity(&positive).unwrap().status, CheckStatus::Ok);

        let missing = MetricRecord::new(4, 1, "oil_production", None, Some("mbbl"));
        assert!(evaluator.check_value_sanity(&missing).is_none());
    }

    #[test]
    fn test_evaluate_orders_checks() {
        let evaluator = DataQualityEvaluator::new();
        let record = production(3, "boe_production", 250.0, "mboe").with_confidence(0.9);
        let siblings = FixedSiblings(vec![
            production(1, "oil_production", 100.0, "mbbl"),
            production(2, "gas_production", 600.0, "mmcf"),
            record.clone(),
        ]);

        let checks = evaluator.evaluate(&record, &siblings).unwrap();
        let names: Vec<&str> = checks.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec![CONFIDENCE_CHECK_OK, BOE_CONSISTENCY_CHECK, PERIOD_DURATION_CHECK, VALUE_SANITY_CHECK]
        );
        assert_eq!(checks[1].status, CheckStatus::Flag);
    }

    #[test]
    fn test_evaluate_skips_boe_for_non_production_metrics() {
        let evaluator = DataQualityEvaluator::new();
        let record = MetricRecord::new(9, 1, "gross_wells_drilled", Some(27.0), Some("#"));

        // Lookup would fail if it were called
        let checks = evaluator.evaluate(&record, &FailingSiblings).unwrap();
        assert_eq!(checks.len(), 2);
        assert!(checks.iter().all(|c| c.name != BOE_CONSISTENCY_CHECK));
    }

    #[test]
    fn test_evaluate_accepts_plain_function_lookup() {
        let evaluator = DataQualityEvaluator::new();
        let record = production(1, "oil_production", 100.0, "mbbl");

        let checks = evaluator.evaluate(&record, &no_siblings).unwrap();
        assert_eq!(checks.len(), 3);
    }

    #[test]
    fn test_evaluate_propagates_lookup_failure() {
        let evaluator = DataQualityEvaluator::new();
        let record = production(1, "oil_production", 100.0, "mbbl");

        let err = evaluator.evaluate(&record, &FailingSiblings).unwrap_err();
        assert!(matches!(err, MetricsError::SiblingLookup { company_id: 1, .. }));
    }
}
