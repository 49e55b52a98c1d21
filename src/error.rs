use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid period '{0}': expected YYYY-Qn with n in 1..=4")]
    InvalidPeriod(String),

    #[error("Invalid group-by dimension '{0}': expected company, basin or segment")]
    InvalidGroupBy(String),

    #[error("Invalid sort '{0}': expected <field>:asc or <field>:desc")]
    InvalidSort(String),

    #[error("{name} must be between 0 and 1, got {value}")]
    OutOfRange { name: &'static str, value: f64 },

    #[error("Metric value {0} not found")]
    RecordNotFound(i64),

    #[error("Sibling lookup failed for company {company_id}: {message}")]
    SiblingLookup { company_id: i64, message: String },
}

pub type Result<T> = std::result::Result<T, MetricsError>;

/// Reject a confidence bound outside `0.0..=1.0`
pub fn ensure_unit_interval(name: &'static str, value: f64) -> Result<f64> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(MetricsError::OutOfRange { name, value })
    }
}
