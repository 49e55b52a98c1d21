pub mod ports;
pub mod metrics_query_use_case;
pub mod normalize_use_case;
pub mod quality_gate_use_case;
pub mod review_queue_use_case;
pub mod summary_use_case;

pub use metrics_query_use_case::{MetricRow, MetricsFilter, MetricsQueryUseCase};
pub use normalize_use_case::{NormalizeUseCase, NormalizedMetric};
pub use quality_gate_use_case::{MetricDetail, QualityGateUseCase, RecordEvaluation};
pub use review_queue_use_case::{ReviewFilter, ReviewItem, ReviewQueueUseCase};
pub use summary_use_case::{SummaryPeriod, SummaryRequest, SummaryUseCase};
