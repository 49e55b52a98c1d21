use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};

use crate::domain::{GroupBy, MetricRecord};
use crate::pipeline::processing::normalize::{round_to, UnitNormalizer};

/// One aggregated row: a group dimension value and a metric, summed in normalized units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    /// `company_<id>`, `basin_<name>` or `segment_<name>`, with `unknown` for a missing name
    pub group_key: String,
    pub group_type: GroupBy,
    /// Set only when grouping by company
    pub company_id: Option<i64>,
    pub company_name: Option<String>,
    /// Set only when grouping by basin
    pub basin_name: Option<String>,
    /// Set only when grouping by segment
    pub segment_name: Option<String>,
    pub metric_name_internal: String,
    pub metric_name_display: Option<String>,
    /// Sum of the group's normalized values, null values counted as zero
    pub aggregated_normalized_value: f64,
    /// Normalized unit of the last record in the group, else the metric definition unit
    pub aggregated_normalized_unit: Option<String>,
    /// Mean confidence rounded to 2 places
    pub avg_confidence: f64,
    pub record_count: usize,
    /// Set when records in the group normalized to different units and the sum mixes them
    pub mixed_units: bool,
}

impl GroupSummary {
    /// Name the output is ordered by for the group's dimension
    fn display_name(&self) -> &str {
        let name = match self.group_type {
            GroupBy::Company => &self.company_name,
            GroupBy::Basin => &self.basin_name,
            GroupBy::Segment => &self.segment_name,
        };
        name.as_deref().unwrap_or("")
    }
}

struct GroupAccumulator {
    summary: GroupSummary,
    metric_unit: Option<String>,
    last_unit: Option<String>,
    seen_units: BTreeSet<String>,
    confidence_total: f64,
}

/// Groups records by company, basin or segment and sums each metric in its standard unit
#[derive(Debug, Clone, Copy, Default)]
pub struct Aggregator {
    normalizer: UnitNormalizer,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn aggregate(&self, records: &[MetricRecord], group_by: GroupBy) -> Vec<GroupSummary> {
        let mut order: Vec<String> = Vec::new();
        let mut groups: HashMap<String, GroupAccumulator> = HashMap::new();

        for record in records {
            let group_key = group_key(record, group_by);
            let key = format!("{}||{}", group_key, record.metric_name_internal);

            let acc = groups.entry(key.clone()).or_insert_with(|| {
                order.push(key);
                GroupAccumulator {
                    summary: GroupSummary {
                        group_key,
                        group_type: group_by,
                        company_id: (group_by == GroupBy::Company).then_some(record.company_id),
                        company_name: if group_by == GroupBy::Company { record.company_name.clone() } else { None },
                        basin_name: if group_by == GroupBy::Basin { record.basin_name.clone() } else { None },
                        segment_name: if group_by == GroupBy::Segment { record.segment_name.clone() } else { None },
                        metric_name_internal: record.metric_name_internal.clone(),
                        metric_name_display: record.metric_name_display.clone(),
                        aggregated_normalized_value: 0.0,
                        aggregated_normalized_unit: None,
                        avg_confidence: 0.0,
                        record_count: 0,
                        mixed_units: false,
                    },
                    metric_unit: record.metric_unit.clone(),
                    last_unit: None,
                    seen_units: BTreeSet::new(),
                    confidence_total: 0.0,
                }
            });

            let normalized = self.normalizer.normalize_record(record);
            acc.summary.aggregated_normalized_value += normalized.value.unwrap_or(0.0);
            acc.summary.record_count += 1;
            acc.confidence_total += record.extraction_confidence_score;
            if let Some(unit) = &normalized.unit {
                acc.seen_units.insert(unit.clone());
            }
            acc.last_unit = normalized.unit;
        }

        let mut output: Vec<GroupSummary> = order
            .into_iter()
            .filter_map(|key| groups.remove(&key))
            .map(|acc| {
                let mut summary = acc.summary;
                summary.aggregated_normalized_unit = acc.last_unit.or(acc.metric_unit);
                summary.avg_confidence = if summary.record_count > 0 {
                    round_to(acc.confidence_total / summary.record_count as f64, 2)
                } else {
                    0.0
                };
                summary.mixed_units = acc.seen_units.len() > 1;
                if summary.mixed_units {
                    warn!(
                        group_key = %summary.group_key,
                        metric = %summary.metric_name_internal,
                        units = ?acc.seen_units,
                        "Aggregated group mixes incompatible units"
                    );
                }
                summary
            })
            .collect();

        output.sort_by(|a, b| {
            a.display_name()
                .cmp(b.display_name())
                .then_with(|| a.metric_name_internal.cmp(&b.metric_name_internal))
        });

        debug!(records = records.len(), groups = output.len(), group_by = %group_by, "Aggregated metric records");
        output
    }
}

/// Key identifying the group a record belongs to, before the metric name is appended
pub fn group_key(record: &MetricRecord, group_by: GroupBy) -> String {
    match group_by {
        GroupBy::Company => format!("company_{}", record.company_id),
        GroupBy::Basin => format!("basin_{}", record.basin_name.as_deref().unwrap_or("unknown")),
        GroupBy::Segment => format!("segment_{}", record.segment_name.as_deref().unwrap_or("unknown")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oil(id: i64, company_id: i64, company: &str, value: f64, unit: &str, confidence: f64) -> MetricRecord {
        MetricRecord::new(id, company_id, "oil_production", Some(value), Some(unit))
            .with_company_name(company)
            .with_confidence(confidence)
    }

    #[test]
    fn test_sums_same_company_and_metric() {
        let records = vec![
            oil(1, 10, "Apex Energy", 100.0, "mbbl", 0.9),
            oil(2, 10, "Apex Energy", 150.0, "mbbl", 0.8),
        ];

        let summary = Aggregator::new().aggregate(&records, GroupBy::Company);
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].aggregated_normalized_value, 250.0);
        assert_eq!(summary[0].aggregated_normalized_unit.as_deref(), Some("mbbl"));
        assert_eq!(summary[0].record_count, 2);
        assert_eq!(summary[0].avg_confidence, 0.85);
        assert_eq!(summary[0].company_id, Some(10));
        assert_eq!(summary[0].group_key, "company_10");
        assert!(!summary[0].mixed_units);
    }

    #[test]
    fn test_normalizes_before_summing() {
        let records = vec![
            oil(1, 10, "Apex Energy", 1000.0, "bbl", 0.9),
            oil(2, 10, "Apex Energy", 5.0, "mbbl", 0.9),
        ];

        let summary = Aggregator::new().aggregate(&records, GroupBy::Company);
        assert_eq!(summary[0].aggregated_normalized_value, 6.0);
        assert_eq!(summary[0].aggregated_normalized_unit.as_deref(), Some("mbbl"));
    }

    #[test]
    fn test_sorts_by_company_name_then_metric() {
        let mut gas = MetricRecord::new(3, 20, "gas_production", Some(10.0), Some("mmcf"))
            .with_company_name("Basalt Resources");
        gas.extraction_confidence_score = 0.7;
        let records = vec![
            oil(1, 30, "Cobalt Oil", 1.0, "mbbl", 0.9),
            oil(2, 20, "Basalt Resources", 1.0, "mbbl", 0.9),
            gas,
            oil(4, 10, "Apex Energy", 1.0, "mbbl", 0.9),
        ];

        let summary = Aggregator::new().aggregate(&records, GroupBy::Company);
        let order: Vec<(&str, &str)> = summary
            .iter()
            .map(|s| (s.company_name.as_deref().unwrap(), s.metric_name_internal.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("Apex Energy", "oil_production"),
                ("Basalt Resources", "gas_production"),
                ("Basalt Resources", "oil_production"),
                ("Cobalt Oil", "oil_production"),
            ]
        );
    }

    #[test]
    fn test_groups_by_basin_with_unknown_fallback() {
        let records = vec![
            oil(1, 10, "Apex Energy", 10.0, "mbbl", 0.9).with_basin("Permian"),
            oil(2, 20, "Basalt Resources", 5.0, "mbbl", 0.9).with_basin("Permian"),
            oil(3, 30, "Cobalt Oil", 7.0, "mbbl", 0.9),
        ];

        let summary = Aggregator::new().aggregate(&records, GroupBy::Basin);
        assert_eq!(summary.len(), 2);
        // Missing basin names sort first as empty strings
        assert_eq!(summary[0].group_key, "basin_unknown");
        assert_eq!(summary[0].basin_name, None);
        assert_eq!(summary[1].basin_name.as_deref(), Some("Permian"));
        assert_eq!(summary[1].aggregated_normalized_value, 15.0);
        assert_eq!(summary[1].company_id, None);
    }

    #[test]
    fn test_groups_by_segment() {
        let records = vec![
            oil(1, 10, "Apex Energy", 10.0, "mbbl", 0.9).with_segment("Upstream"),
            oil(2, 10, "Apex Energy", 4.0, "mbbl", 0.9).with_segment("Midstream"),
        ];

        let summary = Aggregator::new().aggregate(&records, GroupBy::Segment);
        let names: Vec<&str> = summary.iter().map(|s| s.segment_name.as_deref().unwrap()).collect();
        assert_eq!(names, vec!["Midstream", "Upstream"]);
    }

    #[test]
    fn test_null_values_count_as_zero() {
        let records = vec![
            oil(1, 10, "Apex Energy", 10.0, "mbbl", 0.9),
            MetricRecord::new(2, 10, "oil_production", None, Some("mbbl"))
                .with_company_name("Apex Energy")
                .with_confidence(0.5),
        ];

        let summary = Aggregator::new().aggregate(&records, GroupBy::Company);
        assert_eq!(summary[0].aggregated_normalized_value, 10.0);
        assert_eq!(summary[0].record_count, 2);
        assert_eq!(summary[0].avg_confidence, 0.7);
    }

    #[test]
    fn test_falls_back_to_definition_unit() {
        let mut record = MetricRecord::new(1, 10, "oil_production", Some(3.0), None).with_company_name("Apex Energy");
        record.metric_unit = Some("mbbl".to_string());

        let summary = Aggregator::new().aggregate(&[record], GroupBy::Company);
        assert_eq!(summary[0].aggregated_normalized_unit.as_deref(), Some("mbbl"));
    }

    #[test]
    fn test_flags_mixed_units() {
        let records = vec![
            MetricRecord::new(1, 10, "capex", Some(10.0), Some("$000")).with_company_name("Apex Energy"),
            MetricRecord::new(2, 10, "capex", Some(2.0), Some("$mm")).with_company_name("Apex Energy"),
        ];

        let summary = Aggregator::new().aggregate(&records, GroupBy::Company);
        assert!(summary[0].mixed_units);
        assert_eq!(summary[0].aggregated_normalized_unit.as_deref(), Some("$mm"));
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        assert!(Aggregator::new().aggregate(&[], GroupBy::Basin).is_empty());
    }
}
