/**
* filename : sma
* author : HAMA
* date: 2025. 6. 2.
* description:
**/

use std::collections::{BTreeMap, VecDeque};

use crate::error::AlertError;

/// 모니터링 대상 SMA 기간 (일)
pub const DEFAULT_PERIODS: [usize; 4] = [25, 50, 75, 100];

/// 종가 시계열의 마지막 period개 평균
///
/// 데이터가 period개 미만이면 Ok(None), period가 0이면 오류
pub fn calculate_sma(closes: &[f64], period: usize) -> Result<Option<f64>, AlertError> {
  if period < 1 {
    return Err(AlertError::InvalidParameter(
      "SMA period must be at least 1".to_string(),
    ));
  }

  Ok(sma_window(closes, period))
}

/// 전체 기본 기간에 대해 SMA 일괄 계산
///
/// 계산 불가능한 기간은 None으로 표시
pub fn calculate_all_smas(closes: &[f64]) -> BTreeMap<usize, Option<f64>> {
  DEFAULT_PERIODS
    .iter()
    .map(|&period| (period, sma_window(closes, period)))
    .collect()
}

fn sma_window(closes: &[f64], period: usize) -> Option<f64> {
  if period < 1 || closes.len() < period {
    return None;
  }

  let window = &closes[closes.len() - period..];
  Some(window.iter().sum::<f64>() / period as f64)
}

/// 증분 SMA 계산기
///
/// 차트 오버레이처럼 연속된 구간 전체의 SMA가 필요할 때 사용
#[derive(Debug)]
pub struct RollingSma {
  period: usize,
  values: VecDeque<f64>,
  sum: f64,
}

impl RollingSma {
  pub fn new(period: usize) -> Self {
    RollingSma {
      period,
      values: VecDeque::with_capacity(period),
      sum: 0.0,
    }
  }

  pub fn period(&self) -> usize {
    self.period
  }

  pub fn push(&mut self, close: f64) {
    // 새 종가 추가
    self.values.push_back(close);
    self.sum += close;

    // 오래된 종가 제거 (필요시)
    if self.values.len() > self.period {
      if let Some(old_value) = self.values.pop_front() {
        self.sum -= old_value;
      }
    }
  }

  pub fn is_ready(&self) -> bool {
    self.values.len() >= self.period
  }

  pub fn value(&self) -> Option<f64> {
    if !self.is_ready() {
      return None;
    }

    Some(self.sum / self.period as f64)
  }
}
