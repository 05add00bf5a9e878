use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 가격이 SMA 기준으로 어느 쪽에 있는지
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Above,
    Below,
    Unknown,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Above => write!(f, "above"),
            Position::Below => write!(f, "below"),
            Position::Unknown => write!(f, "unknown"),
        }
    }
}

/// 크로스오버 방향
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrossDirection {
    Above,
    Below,
}

impl fmt::Display for CrossDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrossDirection::Above => write!(f, "above"),
            CrossDirection::Below => write!(f, "below"),
        }
    }
}

/// 감지된 크로스오버 이벤트
///
/// 타임스탬프는 감지 시점이 아니라 알림 발송 시점에 채워진다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crossover {
    pub sma_period: usize,
    pub direction: CrossDirection,
    pub price: f64,
    pub sma_value: f64,
    pub timestamp: Option<DateTime<Utc>>,
}

impl Crossover {
    pub fn new(sma_period: usize, direction: CrossDirection, price: f64, sma_value: f64) -> Self {
        Crossover {
            sma_period,
            direction,
            price,
            sma_value,
            timestamp: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}
