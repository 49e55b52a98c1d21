// Record processing pipeline: normalization, quality gate and aggregation

pub mod processing;
