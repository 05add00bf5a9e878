//! SMA 크로스오버 알림 봇 라이브러리
//!
//! SPY 가격의 이동평균선 교차를 감지해 Telegram으로 알림을 보내는 모니터링 시스템입니다.

pub mod chart;
pub mod config;
pub mod error;
pub mod indicators;
pub mod market_data;
pub mod models;
pub mod monitor;
pub mod notify;
pub mod signals;
pub mod utils;

// 핵심 타입 재노출
pub use crate::error::AlertError;
pub use crate::models::crossover::{CrossDirection, Crossover, Position};
pub use crate::models::price::PricePoint;
pub use crate::market_data::provider::PriceProvider;
pub use crate::notify::telegram::Notifier;

/// 버전 정보
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 결과 타입 별칭
pub type Result<T> = std::result::Result<T, AlertError>;
