//! 시간 관련 유틸리티
//!
//! 시간 변환 함수 제공

pub mod backoff;
pub mod logging;

use chrono::{DateTime, Utc};

/// 타임스탬프(초)를 DateTime<Utc>로 변환
pub fn timestamp_to_datetime(timestamp_secs: i64) -> DateTime<Utc> {
  DateTime::from_timestamp(timestamp_secs, 0).unwrap_or_default()
}

/// DateTime<Utc>를 타임스탬프(초)로 변환
pub fn datetime_to_timestamp(dt: DateTime<Utc>) -> i64 {
  dt.timestamp()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_timestamp_conversion() {
    let now = Utc::now();
    let ts = datetime_to_timestamp(now);
    let dt = timestamp_to_datetime(ts);

    // 초 단위 변환이므로 1초 이내 오차 허용
    let diff = (now - dt).num_milliseconds().abs();
    assert!(diff < 1000);
  }
}
