//! 로깅 유틸리티
//!
//! 로그 초기화 및 유틸리티 함수 제공

use std::env;

use env_logger::Builder;
use log::LevelFilter;

use crate::error::AlertError;
use crate::models::Crossover;

/// 로깅 시스템 초기화
///
/// RUST_LOG 환경변수가 있으면 설정 파일보다 우선한다.
pub fn init(default_level: &str) -> Result<(), AlertError> {
    let mut builder = Builder::from_default_env();

    let log_level = env::var("RUST_LOG").unwrap_or_else(|_| default_level.to_string());

    // 로그 레벨 파싱
    let level_filter = match log_level.to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        _ => LevelFilter::Info,
    };

    builder
      .filter_level(level_filter)
      .format_timestamp_millis()
      .init();

    log::info!("로깅 시스템 초기화 완료: 레벨 = {}", log_level);

    Ok(())
}

/// 크로스오버 감지 로그
pub fn log_crossover_detected(crossover: &Crossover) {
    log::info!(
        "크로스오버 감지: {}일 SMA {} - 가격: {:.2} - SMA: {:.2}",
        crossover.sma_period,
        crossover.direction,
        crossover.price,
        crossover.sma_value
    );
}

/// 알림 발송 결과 로그
pub fn log_alert_sent(chat_id: i64, success: bool) {
    if success {
        log::info!("알림 발송 완료: chat_id = {}", chat_id);
    } else {
        log::warn!("알림 발송 실패: chat_id = {}", chat_id);
    }
}

/// 오류 로그
pub fn log_error(context: &str, error: &AlertError) {
    log::error!("오류 발생 - {}: {}", context, error);
}
