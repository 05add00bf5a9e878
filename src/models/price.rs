use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 일별 종가 한 건
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
}

impl PricePoint {
    pub fn new(timestamp: DateTime<Utc>, close: f64) -> Self {
        PricePoint { timestamp, close }
    }
}
