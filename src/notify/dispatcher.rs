/**
* filename : dispatcher
* author : HAMA
* date: 2025. 6. 3.
* description: 구독자 전체에 크로스오버 알림 전송
**/

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::chart::ChartGenerator;
use crate::indicators::DEFAULT_PERIODS;
use crate::models::PricePoint;
use crate::notify::subscriptions::SubscriptionManager;
use crate::notify::telegram::Notifier;
use crate::utils::logging;

const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// 차트 첨부 알림 발송기
///
/// 수신자별로 재시도하며, 한 수신자의 실패가 다른 수신자 발송을 막지 않는다.
pub struct AlertDispatcher {
  notifier: Arc<dyn Notifier>,
  subscriptions: Arc<SubscriptionManager>,
  charts: ChartGenerator,
  max_retries: u32,
  retry_delay: Duration,
}

impl AlertDispatcher {
  pub fn new(
    notifier: Arc<dyn Notifier>,
    subscriptions: Arc<SubscriptionManager>,
    charts: ChartGenerator,
  ) -> Self {
    AlertDispatcher {
      notifier,
      subscriptions,
      charts,
      max_retries: DEFAULT_MAX_RETRIES,
      retry_delay: DEFAULT_RETRY_DELAY,
    }
  }

  pub fn with_retry(mut self, max_retries: u32, retry_delay: Duration) -> Self {
    self.max_retries = max_retries.max(1);
    self.retry_delay = retry_delay;
    self
  }

  /// 한 명에게 차트 + 캡션 알림 전송
  pub async fn send_alert(&self, chat_id: i64, caption: &str, prices: &[PricePoint]) -> bool {
    let png = match self.charts.render(prices, &DEFAULT_PERIODS) {
      Ok(png) => png,
      Err(e) => {
        log::error!("Failed to generate alert chart: {}", e);
        return false;
      }
    };

    for attempt in 1..=self.max_retries {
      match self.notifier.send_photo(chat_id, &png, caption).await {
        Ok(()) => {
          logging::log_alert_sent(chat_id, true);
          return true;
        }
        Err(e) => {
          log::warn!(
            "send_photo failed for chat_id {} (attempt {}/{}): {}",
            chat_id,
            attempt,
            self.max_retries,
            e
          );

          if attempt < self.max_retries {
            tokio::time::sleep(self.retry_delay).await;
          }
        }
      }
    }

    logging::log_alert_sent(chat_id, false);
    false
  }

  /// 구독자 전원에게 알림 전송, 수신자별 성공 여부 반환
  pub async fn send_alert_to_all(
    &self,
    caption: &str,
    prices: &[PricePoint],
  ) -> HashMap<i64, bool> {
    let subscribers = self.subscriptions.all_subscribers().await;
    let mut results = HashMap::new();

    if subscribers.is_empty() {
      log::debug!("No subscribers registered, skipping alert");
      return results;
    }

    for chat_id in subscribers {
      let delivered = self.send_alert(chat_id, caption, prices).await;
      results.insert(chat_id, delivered);
    }

    results
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::AlertError;
  use crate::notify::telegram::MockNotifier;
  use chrono::{Duration as ChronoDuration, Utc};
  use mockall::Sequence;

  const PNG_MAGIC: [u8; 4] = [0x89, 0x50, 0x4E, 0x47];

  fn price_fixture(days: usize) -> Vec<PricePoint> {
    let now = Utc::now();
    (0..days)
      .map(|i| {
        let close = 490.0 + ((i % 9) as f64) * 1.75;
        PricePoint::new(now - ChronoDuration::days((days - i) as i64), close)
      })
      .collect()
  }

  async fn manager_with(chat_ids: &[i64]) -> Arc<SubscriptionManager> {
    let manager = Arc::new(SubscriptionManager::new());
    for &chat_id in chat_ids {
      manager.subscribe(chat_id).await.unwrap();
    }
    manager
  }

  fn dispatcher(notifier: MockNotifier, subscriptions: Arc<SubscriptionManager>) -> AlertDispatcher {
    AlertDispatcher::new(
      Arc::new(notifier),
      subscriptions,
      ChartGenerator::new("SPY"),
    )
    .with_retry(3, Duration::from_millis(1))
  }

  #[tokio::test]
  async fn test_send_alert_attaches_png_chart() {
    let mut notifier = MockNotifier::new();
    notifier
      .expect_send_photo()
      .withf(|chat_id, png, caption| {
        *chat_id == 777 && png.starts_with(&PNG_MAGIC) && caption.contains("crossed")
      })
      .times(1)
      .returning(|_, _, _| Ok(()));

    let dispatcher = dispatcher(notifier, manager_with(&[777]).await);
    let delivered = dispatcher
      .send_alert(777, "SPY crossed above the 25-day SMA", &price_fixture(120))
      .await;

    assert!(delivered);
  }

  #[tokio::test]
  async fn test_send_alert_retries_then_succeeds() {
    let mut seq = Sequence::new();
    let mut notifier = MockNotifier::new();
    notifier
      .expect_send_photo()
      .times(1)
      .in_sequence(&mut seq)
      .returning(|_, _, _| Err(AlertError::TelegramError("flaky".to_string())));
    notifier
      .expect_send_photo()
      .times(1)
      .in_sequence(&mut seq)
      .returning(|_, _, _| Ok(()));

    let dispatcher = dispatcher(notifier, manager_with(&[777]).await);

    assert!(dispatcher.send_alert(777, "alert", &price_fixture(120)).await);
  }

  #[tokio::test]
  async fn test_send_alert_gives_up_after_max_retries() {
    let mut notifier = MockNotifier::new();
    notifier
      .expect_send_photo()
      .times(3)
      .returning(|_, _, _| Err(AlertError::TelegramError("down".to_string())));

    let dispatcher = dispatcher(notifier, manager_with(&[777]).await);

    assert!(!dispatcher.send_alert(777, "alert", &price_fixture(120)).await);
  }

  #[tokio::test]
  async fn test_short_history_fails_without_calling_telegram() {
    let notifier = MockNotifier::new();

    let dispatcher = dispatcher(notifier, manager_with(&[777]).await);

    assert!(!dispatcher.send_alert(777, "alert", &price_fixture(50)).await);
  }

  #[tokio::test]
  async fn test_fan_out_isolates_failures() {
    let mut notifier = MockNotifier::new();
    notifier
      .expect_send_photo()
      .withf(|chat_id, _, _| *chat_id == 100)
      .returning(|_, _, _| Ok(()));
    notifier
      .expect_send_photo()
      .withf(|chat_id, _, _| *chat_id == 200)
      .times(3)
      .returning(|_, _, _| Err(AlertError::TelegramError("blocked".to_string())));

    let dispatcher = dispatcher(notifier, manager_with(&[100, 200]).await);
    let results = dispatcher.send_alert_to_all("alert", &price_fixture(120)).await;

    assert_eq!(results.len(), 2);
    assert_eq!(results[&100], true);
    assert_eq!(results[&200], false);
  }

  #[tokio::test]
  async fn test_no_subscribers_sends_nothing() {
    let notifier = MockNotifier::new();

    let dispatcher = dispatcher(notifier, manager_with(&[]).await);
    let results = dispatcher.send_alert_to_all("alert", &price_fixture(120)).await;

    assert!(results.is_empty());
  }
}
