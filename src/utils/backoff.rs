//! 재시도 유틸리티
//!
//! 외부 API 호출 실패 시 지수 백오프 재시도 제공

use std::future::Future;
use std::time::Duration;

use crate::error::AlertError;

/// 지수 백오프 재시도 정책
///
/// 대기 시간은 시도마다 2배로 늘고 max_delay에서 멈춘다.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
  pub initial_delay: Duration,
  pub max_delay: Duration,
  pub max_retries: u32,
}

impl BackoffPolicy {
  pub fn new(initial_delay: Duration, max_delay: Duration, max_retries: u32) -> Self {
    BackoffPolicy {
      initial_delay,
      max_delay,
      max_retries,
    }
  }
}

impl Default for BackoffPolicy {
  fn default() -> Self {
    BackoffPolicy {
      initial_delay: Duration::from_secs(30),
      max_delay: Duration::from_secs(300),
      max_retries: 5,
    }
  }
}

/// 작업을 정책에 따라 재시도
///
/// 마지막 시도까지 실패하면 마지막 오류를 반환한다.
pub async fn retry_with_backoff<T, F, Fut>(
  policy: &BackoffPolicy,
  op_name: &str,
  mut operation: F,
) -> Result<T, AlertError>
where
  F: FnMut() -> Fut,
  Fut: Future<Output = Result<T, AlertError>>,
{
  let mut delay = policy.initial_delay;
  let mut attempt = 1u32;

  loop {
    match operation().await {
      Ok(value) => return Ok(value),
      Err(err) => {
        if attempt >= policy.max_retries {
          log::error!("{} failed after {} attempts: {}", op_name, attempt, err);
          return Err(err);
        }

        log::warn!(
          "{} failed (attempt {}/{}): {}; retrying in {:?}",
          op_name,
          attempt,
          policy.max_retries,
          err,
          delay
        );
        tokio::time::sleep(delay).await;

        delay = (delay * 2).min(policy.max_delay);
        attempt += 1;
      }
    }
  }
}
