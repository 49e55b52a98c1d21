// Pipeline processing: unit normalization, data-quality checks and aggregation

pub mod normalize;
pub mod quality_gate;
pub mod aggregate;
