/**
* filename : crossover
* author : HAMA
* date: 2025. 6. 2.
* description: SMA 크로스오버 감지 로직
**/

use std::collections::{BTreeMap, HashMap};

use crate::models::{CrossDirection, Crossover, Position};

/// 가격의 SMA 대비 위치 판정
///
/// 정확히 같으면 Unknown (중복 알림 억제)
pub fn classify_position(price: f64, sma_value: f64) -> Position {
  if price > sma_value {
    Position::Above
  } else if price < sma_value {
    Position::Below
  } else {
    Position::Unknown
  }
}

/// 이전 상태와 현재 가격을 비교해 크로스오버 이벤트 생성
///
/// Below -> Above, Above -> Below 전환만 이벤트가 된다.
/// 이전 상태가 없거나 Unknown이면 해당 기간은 건너뛴다.
pub fn detect_crossovers(
  current_price: f64,
  smas: &BTreeMap<usize, f64>,
  previous_states: &HashMap<usize, Position>,
) -> Vec<Crossover> {
  let mut crossovers = Vec::new();

  for (&period, &sma_value) in smas {
    let previous = previous_states
      .get(&period)
      .copied()
      .unwrap_or(Position::Unknown);
    let current = classify_position(current_price, sma_value);

    match (previous, current) {
      // 상향 돌파
      (Position::Below, Position::Above) => {
        crossovers.push(Crossover::new(
          period,
          CrossDirection::Above,
          current_price,
          sma_value,
        ));
      }
      // 하향 돌파
      (Position::Above, Position::Below) => {
        crossovers.push(Crossover::new(
          period,
          CrossDirection::Below,
          current_price,
          sma_value,
        ));
      }
      _ => {}
    }
  }

  crossovers
}

/// 다음 사이클에서 쓸 위치 상태 계산
pub fn update_crossover_state(
  smas: &BTreeMap<usize, f64>,
  current_price: f64,
) -> HashMap<usize, Position> {
  smas
    .iter()
    .map(|(&period, &sma_value)| (period, classify_position(current_price, sma_value)))
    .collect()
}
