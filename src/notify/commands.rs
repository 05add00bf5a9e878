/**
* filename : commands
* author : HAMA
* date: 2025. 6. 3.
* description: 텔레그램 명령 처리 (/start, /stop, /status)
**/

use std::sync::Arc;
use std::time::Duration;

use crate::chart::ChartGenerator;
use crate::error::AlertError;
use crate::indicators::{calculate_all_smas, DEFAULT_PERIODS};
use crate::market_data::provider::PriceProvider;
use crate::models::PricePoint;
use crate::monitor::HISTORY_DAYS;
use crate::notify::formatter::MessageFormatter;
use crate::notify::subscriptions::SubscriptionManager;
use crate::notify::telegram::{Notifier, TelegramUpdate};
use crate::utils::logging;

/// getUpdates 롱 폴링 대기 시간
pub const POLL_TIMEOUT_SECS: u64 = 30;

const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);
const DATA_UNAVAILABLE_REPLY: &str =
  "Price data is unavailable right now, please try again later.";

/// 구독 명령 수신 루프
pub struct CommandHandler {
  notifier: Arc<dyn Notifier>,
  subscriptions: Arc<SubscriptionManager>,
  formatter: MessageFormatter,
  charts: ChartGenerator,
  price_data: Arc<dyn PriceProvider>,
}

impl CommandHandler {
  pub fn new(
    notifier: Arc<dyn Notifier>,
    subscriptions: Arc<SubscriptionManager>,
    formatter: MessageFormatter,
    charts: ChartGenerator,
    price_data: Arc<dyn PriceProvider>,
  ) -> Self {
    CommandHandler {
      notifier,
      subscriptions,
      formatter,
      charts,
      price_data,
    }
  }

  /// 명령 폴링 시작. 종료는 태스크 중단으로만 이루어진다.
  pub async fn run(self) {
    log::info!("Command polling started");
    let mut offset = None;

    loop {
      offset = self.poll_once(offset).await;
    }
  }

  /// 업데이트 한 차례 수신 및 처리, 다음 offset 반환
  ///
  /// 처리 실패는 로그만 남기고 offset은 항상 전진시켜 재수신을 막는다.
  async fn poll_once(&self, mut offset: Option<i64>) -> Option<i64> {
    match self.notifier.get_updates(offset, POLL_TIMEOUT_SECS).await {
      Ok(updates) => {
        for update in updates {
          offset = Some(update.update_id + 1);

          if let Err(e) = self.handle_update(&update).await {
            logging::log_error("command handling", &e);
          }
        }
      }
      Err(e) => {
        log::warn!("getUpdates failed: {}; retrying in {:?}", e, POLL_RETRY_DELAY);
        tokio::time::sleep(POLL_RETRY_DELAY).await;
      }
    }

    offset
  }

  async fn handle_update(&self, update: &TelegramUpdate) -> Result<(), AlertError> {
    let message = match &update.message {
      Some(message) => message,
      None => return Ok(()),
    };
    let text = match &message.text {
      Some(text) => text,
      None => return Ok(()),
    };
    let chat_id = message.chat.id;

    // "/start@BotName 인자" 형태에서도 명령 부분만 사용
    let command = text.split_whitespace().next().unwrap_or("");
    let command = command.split('@').next().unwrap_or(command);

    match command {
      "/start" => self.handle_start(chat_id).await,
      "/stop" => self.handle_stop(chat_id).await,
      "/status" => self.handle_status(chat_id).await,
      // 알 수 없는 명령은 무시
      _ => Ok(()),
    }
  }

  async fn handle_start(&self, chat_id: i64) -> Result<(), AlertError> {
    let newly_added = self.subscriptions.subscribe(chat_id).await?;
    if newly_added {
      log::info!("New subscriber: chat_id = {}", chat_id);
    }

    self
      .notifier
      .send_message(chat_id, &self.formatter.format_subscribe_confirmation())
      .await
  }

  async fn handle_stop(&self, chat_id: i64) -> Result<(), AlertError> {
    self.subscriptions.unsubscribe(chat_id).await?;

    self
      .notifier
      .send_message(chat_id, &self.formatter.format_unsubscribe_confirmation())
      .await
  }

  async fn handle_status(&self, chat_id: i64) -> Result<(), AlertError> {
    let subscribed = self.subscriptions.is_subscribed(chat_id).await?;

    let (current_price, prices) = match self.fetch_market_snapshot().await {
      Ok(snapshot) => snapshot,
      Err(e) => {
        logging::log_error("status snapshot", &e);
        return self.notifier.send_message(chat_id, DATA_UNAVAILABLE_REPLY).await;
      }
    };

    let closes: Vec<f64> = prices.iter().map(|p| p.close).collect();
    let smas = calculate_all_smas(&closes);
    let caption = self
      .formatter
      .format_status_message(subscribed, current_price, &smas);

    // 차트 렌더링이 안 되면 상태 텍스트라도 보낸다
    match self.charts.render(&prices, &DEFAULT_PERIODS) {
      Ok(png) => self.notifier.send_photo(chat_id, &png, &caption).await,
      Err(e) => {
        log::warn!("Failed to render status chart: {}", e);
        self.notifier.send_message(chat_id, &caption).await
      }
    }
  }

  async fn fetch_market_snapshot(&self) -> Result<(f64, Vec<PricePoint>), AlertError> {
    let current_price = self.price_data.fetch_current_price().await?;
    let prices = self.price_data.fetch_historical_prices(HISTORY_DAYS).await?;

    Ok((current_price, prices))
  }
}
