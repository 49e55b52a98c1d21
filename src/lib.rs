pub mod config;
pub mod constants;
pub mod error;
pub mod storage;

// Layered boundaries: use cases and their ports
pub mod app;

// Domain data shapes shared across layers
pub mod domain;

pub mod observability;
pub mod pipeline;

pub use config::Config;
pub use domain::{GroupBy, MetricRecord, QuarterPeriod};
pub use error::{MetricsError, Result};
pub use pipeline::processing::normalize::{ConversionOutcome, NormalizedValue, UnitNormalizer};
pub use storage::InMemoryMetricStore;
