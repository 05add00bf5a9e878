/**
* filename : formatter
* author : HAMA
* date: 2025. 6. 3.
* description:
**/

use std::collections::BTreeMap;

use crate::models::Crossover;

/// 알림/응답 메시지 포맷터
#[derive(Debug, Clone)]
pub struct MessageFormatter {
  symbol: String,
}

impl MessageFormatter {
  pub fn new(symbol: impl Into<String>) -> Self {
    MessageFormatter {
      symbol: symbol.into(),
    }
  }

  /// 크로스오버 알림 본문
  ///
  /// 타임스탬프가 없는 이벤트는 "-"로 표기한다.
  pub fn format_crossover_message(&self, crossover: &Crossover) -> String {
    let timestamp = crossover
      .timestamp
      .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
      .unwrap_or_else(|| "-".to_string());

    format!(
      "{} crossed {} the {}-day SMA at {}. Price: ${:.2}, SMA {}: ${:.2}",
      self.symbol,
      crossover.direction,
      crossover.sma_period,
      timestamp,
      crossover.price,
      crossover.sma_period,
      crossover.sma_value
    )
  }

  /// /status 응답 본문
  pub fn format_status_message(
    &self,
    subscribed: bool,
    current_price: f64,
    smas: &BTreeMap<usize, Option<f64>>,
  ) -> String {
    let mut parts = vec![
      format!(
        "Status: {}",
        if subscribed { "Subscribed" } else { "Unsubscribed" }
      ),
      format!("Current {} Price: ${:.2}", self.symbol, current_price),
    ];

    for (period, value) in smas {
      match value {
        Some(v) => parts.push(format!("SMA {}: ${:.2}", period, v)),
        None => parts.push(format!("SMA {}: N/A", period)),
      }
    }

    parts.join("; ")
  }

  pub fn format_subscribe_confirmation(&self) -> String {
    format!("You are now subscribed to {} SMA alerts.", self.symbol)
  }

  pub fn format_unsubscribe_confirmation(&self) -> String {
    format!("You have been unsubscribed from {} SMA alerts.", self.symbol)
  }
}
