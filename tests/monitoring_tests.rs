//! 모니터링 루프 통합 테스트
//!
//! 모의 가격 제공자와 기록용 알림 구현으로
//! 감지-차트-발송 전체 경로를 검증한다.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use xAlert::chart::ChartGenerator;
use xAlert::error::AlertError;
use xAlert::market_data::mocks::MockPriceProvider;
use xAlert::models::PricePoint;
use xAlert::monitor::MonitoringService;
use xAlert::notify::dispatcher::AlertDispatcher;
use xAlert::notify::formatter::MessageFormatter;
use xAlert::notify::subscriptions::SubscriptionManager;
use xAlert::notify::telegram::{Notifier, TelegramUpdate};
use xAlert::utils::backoff::BackoffPolicy;

const PNG_MAGIC: [u8; 4] = [0x89, 0x50, 0x4E, 0x47];

/// 전송 내용을 기록만 하는 Notifier 구현
#[derive(Default)]
struct RecordingNotifier {
  messages: Mutex<Vec<(i64, String)>>,
  photos: Mutex<Vec<(i64, Vec<u8>, String)>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
  async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), AlertError> {
    self.messages.lock().await.push((chat_id, text.to_string()));
    Ok(())
  }

  async fn send_photo(&self, chat_id: i64, png: &[u8], caption: &str) -> Result<(), AlertError> {
    self
      .photos
      .lock()
      .await
      .push((chat_id, png.to_vec(), caption.to_string()));
    Ok(())
  }

  async fn get_updates(
    &self,
    _offset: Option<i64>,
    _timeout_secs: u64,
  ) -> Result<Vec<TelegramUpdate>, AlertError> {
    Ok(Vec::new())
  }
}

fn flat_history(days: usize, close: f64) -> Vec<PricePoint> {
  let now = Utc::now();
  (0..days)
    .map(|i| PricePoint::new(now - chrono::Duration::days((days - i) as i64), close))
    .collect()
}

fn build_service(
  provider: Arc<MockPriceProvider>,
  notifier: Arc<RecordingNotifier>,
  subscriptions: Arc<SubscriptionManager>,
) -> MonitoringService {
  let dispatcher = AlertDispatcher::new(
    notifier,
    subscriptions,
    ChartGenerator::new("SPY"),
  );
  MonitoringService::new(provider, dispatcher, MessageFormatter::new("SPY"))
}

#[tokio::test(start_paused = true)]
async fn test_crossover_alerts_reach_subscriber_with_chart() {
  // 평평한 120일 이력, 현재가는 아래에서 위로 교차
  let provider = Arc::new(
    MockPriceProvider::new(flat_history(120, 480.0), 470.0).with_price_script(&[470.0, 510.0]),
  );
  let notifier = Arc::new(RecordingNotifier::default());
  let subscriptions = Arc::new(SubscriptionManager::new());
  subscriptions.subscribe(4242).await.unwrap();

  let service = build_service(provider, notifier.clone(), subscriptions);
  service.start_monitoring(1, Some(2)).await;

  // 두 번째 사이클에서 네 기간 모두 상향 돌파
  let photos = notifier.photos.lock().await;
  assert_eq!(photos.len(), 4);
  for (chat_id, png, caption) in photos.iter() {
    assert_eq!(*chat_id, 4242);
    assert!(png.starts_with(&PNG_MAGIC));
    assert!(caption.contains("crossed above"));
    assert!(caption.contains("$510.00"));
    // 발송 시점의 타임스탬프가 채워졌는지 확인
    assert!(!caption.contains(" at -"));
  }
  assert!(photos[0].2.contains("25-day SMA"));
  assert!(photos[3].2.contains("100-day SMA"));

  // 이 경로에서는 텍스트 메시지를 쓰지 않는다
  assert!(notifier.messages.lock().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_transient_fetch_failures_are_absorbed() {
  let provider = Arc::new(
    MockPriceProvider::new(flat_history(120, 480.0), 470.0).fail_current_times(2),
  );
  let notifier = Arc::new(RecordingNotifier::default());
  let subscriptions = Arc::new(SubscriptionManager::new());
  subscriptions.subscribe(4242).await.unwrap();

  let service = build_service(provider.clone(), notifier.clone(), subscriptions)
    .with_backoff(BackoffPolicy::new(
      Duration::from_secs(5),
      Duration::from_secs(10),
      5,
    ));
  service.start_monitoring(1, Some(1)).await;

  // 두 번 실패한 뒤 세 번째 시도에서 성공
  assert_eq!(provider.current_price_calls().await, 3);

  // 첫 사이클은 상태 기록만 하므로 발송은 없다
  assert!(notifier.photos.lock().await.is_empty());
  assert!(notifier.messages.lock().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_no_subscribers_means_no_outbound_traffic() {
  let provider = Arc::new(
    MockPriceProvider::new(flat_history(120, 480.0), 470.0).with_price_script(&[470.0, 510.0]),
  );
  let notifier = Arc::new(RecordingNotifier::default());
  let subscriptions = Arc::new(SubscriptionManager::new());

  let service = build_service(provider, notifier.clone(), subscriptions);
  service.start_monitoring(1, Some(2)).await;

  // 교차는 일어나지만 수신자가 없으면 아무것도 보내지 않는다
  assert!(notifier.photos.lock().await.is_empty());
  assert!(notifier.messages.lock().await.is_empty());
}
