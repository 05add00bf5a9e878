/**
* filename : main
* author : HAMA
* date: 2025. 6. 3.
* description:
**/

mod chart;
mod config;
mod error;
mod indicators;
mod market_data;
mod models;
mod monitor;
mod notify;
mod signals;
mod utils;

use std::sync::Arc;
use std::time::Duration;

use crate::chart::ChartGenerator;
use crate::config::Config;
use crate::market_data::mocks::MockPriceProvider;
use crate::market_data::provider::PriceProvider;
use crate::market_data::yahoo::YahooProvider;
use crate::monitor::MonitoringService;
use crate::notify::commands::CommandHandler;
use crate::notify::dispatcher::AlertDispatcher;
use crate::notify::formatter::MessageFormatter;
use crate::notify::subscriptions::SubscriptionManager;
use crate::notify::telegram::TelegramClient;
use crate::utils::backoff::BackoffPolicy;
use crate::utils::logging;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // 설정 로드
    let config = Config::load()?;

    // 로깅 초기화
    logging::init(&config.logging.level)?;
    log::info!("SMA 크로스오버 알림 봇 시작...");
    log::info!(
        "대상 심볼: {}, 점검 주기: {}분",
        config.market.symbol,
        config.monitoring.interval_minutes
    );

    // 가격 데이터 제공자 생성
    let price_data: Arc<dyn PriceProvider> = if config.market.use_mock {
        log::info!("모의 가격 제공자 사용");
        Arc::new(MockPriceProvider::with_random_walk(
            config.market.history_days,
            500.0,
        ))
    } else {
        Arc::new(YahooProvider::new(&config.market.symbol))
    };

    // Telegram 클라이언트 생성
    let notifier = Arc::new(TelegramClient::new(&config.telegram.token));

    // 구독 관리자 생성, 설정된 chat_id 를 기본 수신자로 등록
    let subscriptions = Arc::new(SubscriptionManager::new());
    let primary_chat = config.primary_chat_id()?;
    subscriptions.subscribe(primary_chat).await?;
    log::info!("기본 수신 채팅 등록: {}", primary_chat);

    let formatter = MessageFormatter::new(&config.market.symbol);
    let charts = ChartGenerator::new(&config.market.symbol);
    let dispatcher = AlertDispatcher::new(notifier.clone(), subscriptions.clone(), charts.clone());

    // 명령 폴링 루프 시작 (/start, /stop, /status)
    let command_handler = CommandHandler::new(
        notifier.clone(),
        subscriptions.clone(),
        formatter.clone(),
        charts,
        price_data.clone(),
    );
    let command_task = tokio::spawn(command_handler.run());

    // 모니터링 루프 시작
    let backoff = BackoffPolicy::new(
        Duration::from_secs(config.monitoring.initial_backoff_secs),
        Duration::from_secs(config.monitoring.max_backoff_secs),
        config.monitoring.max_retries,
    );
    let service =
        MonitoringService::new(price_data, dispatcher, formatter).with_backoff(backoff);
    let interval = config.monitoring.interval_minutes;
    let monitor_task = tokio::spawn(async move {
        service.start_monitoring(interval, None).await;
    });

    // 종료 신호 대기
    tokio::signal::ctrl_c().await?;
    log::info!("종료 신호 수신, 작업 정리 중...");

    monitor_task.abort();
    command_task.abort();
    let _ = monitor_task.await;
    let _ = command_task.await;

    log::info!("SMA 크로스오버 알림 봇 종료");
    Ok(())
}
