use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

use crate::error::{MetricsError, Result};

static QUARTER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})-Q([1-4])$").expect("quarter pattern is valid"));

/// A fiscal quarter written as `YYYY-Qn`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QuarterPeriod {
    pub year: i32,
    pub quarter: u32,
}

impl QuarterPeriod {
    /// Last calendar day of the quarter
    pub fn end_date(&self) -> Result<NaiveDate> {
        let (month, day) = match self.quarter {
            1 => (3, 31),
            2 => (6, 30),
            3 => (9, 30),
            4 => (12, 31),
            _ => return Err(MetricsError::InvalidPeriod(self.to_string())),
        };
        NaiveDate::from_ymd_opt(self.year, month, day)
            .ok_or_else(|| MetricsError::InvalidPeriod(self.to_string()))
    }
}

impl FromStr for QuarterPeriod {
    type Err = MetricsError;

    fn from_str(s: &str) -> Result<Self> {
        let captures = QUARTER_PATTERN
            .captures(s)
            .ok_or_else(|| MetricsError::InvalidPeriod(s.to_string()))?;

        let year = captures[1]
            .parse::<i32>()
            .map_err(|_| MetricsError::InvalidPeriod(s.to_string()))?;
        let quarter = captures[2]
            .parse::<u32>()
            .map_err(|_| MetricsError::InvalidPeriod(s.to_string()))?;

        Ok(Self { year, quarter })
    }
}

impl fmt::Display for QuarterPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-Q{}", self.year, self.quarter)
    }
}
