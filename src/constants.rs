//! Internal metric names shared by the normalizer, the quality checks and the summary defaults.

pub const OIL_PRODUCTION: &str = "oil_production";
pub const GAS_PRODUCTION: &str = "gas_production";
pub const NGL_PRODUCTION: &str = "ngl_production";
pub const BOE_PRODUCTION: &str = "boe_production";

pub const TOTAL_LATERAL_LENGTH_DRILLED: &str = "total_lateral_length_drilled";
pub const TOTAL_LATERAL_LENGTH_COMPLETED: &str = "total_lateral_length_completed";
pub const TOTAL_LATERAL_LENGTH_TILED: &str = "total_lateral_length_tiled";

pub const AVG_REALIZED_OIL_PRICE: &str = "avg_realized_oil_price";
pub const AVG_REALIZED_GAS_PRICE: &str = "avg_realized_gas_price";

/// Production metrics that take part in BOE reconciliation
pub const PRODUCTION_METRICS: [&str; 4] = [
    OIL_PRODUCTION,
    GAS_PRODUCTION,
    NGL_PRODUCTION,
    BOE_PRODUCTION,
];

/// Metrics reported by the summary when the caller does not pick any
pub const DEFAULT_SUMMARY_METRICS: [&str; 3] = [BOE_PRODUCTION, OIL_PRODUCTION, GAS_PRODUCTION];

/// Whether a metric is one of the production volumes reconciled against BOE
pub fn is_production_metric(metric_name_internal: &str) -> bool {
    PRODUCTION_METRICS.contains(&metric_name_internal)
}

/// Split a comma-separated metric list, trimming whitespace and dropping empty entries
pub fn parse_metric_list(metrics: &str) -> Vec<String> {
    metrics
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}
