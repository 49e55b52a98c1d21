use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::ReviewConfig;
use crate::domain::MetricRecord;

/// Review priority derived from the extraction confidence score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Critical,
    High,
    Medium,
}

impl Severity {
    pub fn from_score(score: f64, config: &ReviewConfig) -> Self {
        if score < config.critical_below {
            Severity::Critical
        } else if score < config.high_below {
            Severity::High
        } else {
            Severity::Medium
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Family of extraction method a record came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodCategory {
    Ocr,
    HtmlTable,
    XbrlEdgar,
    AiLlm,
    Manual,
    Other(String),
    Unknown,
}

impl MethodCategory {
    /// Classify a free-text method name, ignoring case. Whitespace is kept as given.
    pub fn classify(method: Option<&str>) -> Self {
        let Some(method) = method.filter(|m| !m.is_empty()) else {
            return MethodCategory::Unknown;
        };

        match method.to_lowercase().as_str() {
            "ocr" | "pdf_ocr" | "image_ocr" => MethodCategory::Ocr,
            "html_table_reader" | "html_parser" => MethodCategory::HtmlTable,
            // "egdar" is a misspelling that shows up in real extraction logs
            "xbrl" | "xbrl_parser" | "edgar" | "egdar" => MethodCategory::XbrlEdgar,
            "llm" | "gpt" | "ai" => MethodCategory::AiLlm,
            "manual" => MethodCategory::Manual,
            _ => MethodCategory::Other(method.to_string()),
        }
    }

    pub fn caveat(&self) -> String {
        match self {
            MethodCategory::Ocr => "extracted from image/PDF via OCR - may contain recognition errors".to_string(),
            MethodCategory::HtmlTable => "extracted from HTML table - verify structure parsing".to_string(),
            MethodCategory::XbrlEdgar => "extracted from XBRL/EDGAR filing - check tag mapping".to_string(),
            MethodCategory::AiLlm => "extracted using AI/LLM - requires manual verification".to_string(),
            MethodCategory::Manual => "manually entered - verify source accuracy".to_string(),
            MethodCategory::Other(method) => format!("extracted via {} - review extraction quality", method),
            MethodCategory::Unknown => "extraction method unknown - requires investigation".to_string(),
        }
    }
}

/// Builds the one-line triage hint shown next to low-confidence rows
#[derive(Debug, Clone, Default)]
pub struct ReviewHintBuilder {
    config: ReviewConfig,
}

impl ReviewHintBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ReviewConfig) -> Self {
        Self { config }
    }

    pub fn severity(&self, record: &MetricRecord) -> Severity {
        Severity::from_score(record.extraction_confidence_score, &self.config)
    }

    /// Semicolon-joined hint: severity, method caveat, then any value or source anomalies
    pub fn build(&self, record: &MetricRecord) -> String {
        let score = record.extraction_confidence_score;
        let mut hints = vec![format!("{} priority (confidence: {:.2})", self.severity(record), score)];

        hints.push(MethodCategory::classify(record.extraction_method.as_deref()).caveat());

        if record.value.map_or(true, |v| v == 0.0) {
            hints.push("zero or null value detected".to_string());
        }

        if record.source_url.as_deref().map_or(true, |url| url.trim().is_empty()) {
            hints.push("no source URL available for verification".to_string());
        }

        hints.join("; ")
    }
}
