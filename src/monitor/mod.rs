/**
* filename : mod
* author : HAMA
* date: 2025. 6. 3.
* description: 주기적 크로스오버 모니터링 루프
**/

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::indicators::calculate_all_smas;
use crate::market_data::provider::{validate_price_data, PriceProvider};
use crate::models::{Crossover, Position, PricePoint};
use crate::notify::dispatcher::AlertDispatcher;
use crate::notify::formatter::MessageFormatter;
use crate::signals::{detect_crossovers, update_crossover_state};
use crate::utils::backoff::{retry_with_backoff, BackoffPolicy};
use crate::utils::logging;

/// SMA 계산에 필요한 이력 일수 (최장 기간과 동일)
pub const HISTORY_DAYS: usize = 100;

/// 모니터링 주기 하한/상한 (분)
pub const MIN_INTERVAL_MINUTES: u64 = 1;
pub const MAX_INTERVAL_MINUTES: u64 = 15;

/// 크로스오버 감시 서비스
///
/// 한 사이클: 시세 조회 -> 검증 -> 감지 -> 상태 갱신 -> 알림 발송.
/// 어떤 실패도 루프를 중단시키지 않고 해당 사이클만 건너뛴다.
pub struct MonitoringService {
    price_data: Arc<dyn PriceProvider>,
    dispatcher: AlertDispatcher,
    formatter: MessageFormatter,
    previous_states: HashMap<usize, Position>,
    last_prices: Vec<PricePoint>,
    backoff: BackoffPolicy,
}

impl MonitoringService {
    pub fn new(
        price_data: Arc<dyn PriceProvider>,
        dispatcher: AlertDispatcher,
        formatter: MessageFormatter,
    ) -> Self {
        MonitoringService {
            price_data,
            dispatcher,
            formatter,
            previous_states: HashMap::new(),
            last_prices: Vec::new(),
            backoff: BackoffPolicy::default(),
        }
    }

    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// 한 사이클 수행 후 감지된 크로스오버 반환
    ///
    /// 조회/검증 실패 시 빈 목록을 반환하며 이전 상태는 그대로 둔다.
    pub async fn check_for_crossovers(&mut self) -> Vec<Crossover> {
        let provider = self.price_data.clone();
        let current_price = match retry_with_backoff(&self.backoff, "fetch current price", || {
            let provider = provider.clone();
            async move { provider.fetch_current_price().await }
        })
        .await
        {
            Ok(price) => price,
            Err(e) => {
                logging::log_error("current price fetch", &e);
                return Vec::new();
            }
        };

        let provider = self.price_data.clone();
        let prices = match retry_with_backoff(&self.backoff, "fetch price history", || {
            let provider = provider.clone();
            async move { provider.fetch_historical_prices(HISTORY_DAYS).await }
        })
        .await
        {
            Ok(prices) => prices,
            Err(e) => {
                logging::log_error("price history fetch", &e);
                return Vec::new();
            }
        };

        if !validate_price_data(&prices) {
            log::warn!("Discarding unusable price data ({} points)", prices.len());
            return Vec::new();
        }

        let closes: Vec<f64> = prices.iter().map(|p| p.close).collect();
        let smas: BTreeMap<usize, f64> = calculate_all_smas(&closes)
            .into_iter()
            .filter_map(|(period, value)| value.map(|v| (period, v)))
            .collect();

        let crossovers = detect_crossovers(current_price, &smas, &self.previous_states);

        // 상태 갱신은 감지가 끝난 뒤에만 수행한다
        self.previous_states = update_crossover_state(&smas, current_price);
        self.last_prices = prices;

        for crossover in &crossovers {
            logging::log_crossover_detected(crossover);
        }

        crossovers
    }

    /// 감지된 이벤트를 타임스탬프 찍어 구독자 전체에 발송
    pub async fn process_crossovers(&mut self, crossovers: &[Crossover]) -> HashMap<i64, bool> {
        let mut results = HashMap::new();
        if crossovers.is_empty() {
            return results;
        }

        let prices = if self.last_prices.len() >= HISTORY_DAYS {
            self.last_prices.clone()
        } else {
            let provider = self.price_data.clone();
            match retry_with_backoff(&self.backoff, "fetch chart history", || {
                let provider = provider.clone();
                async move { provider.fetch_historical_prices(HISTORY_DAYS).await }
            })
            .await
            {
                Ok(prices) => prices,
                Err(e) => {
                    logging::log_error("chart history fetch", &e);
                    return results;
                }
            }
        };

        for crossover in crossovers {
            let stamped = crossover.clone().with_timestamp(Utc::now());
            let caption = self.formatter.format_crossover_message(&stamped);
            let dispatched = self.dispatcher.send_alert_to_all(&caption, &prices).await;
            results.extend(dispatched);
        }

        results
    }

    /// 주기 실행 시작
    ///
    /// interval_minutes는 1~15분으로 강제되고, iterations가 None이면 무한 반복한다.
    /// 종료는 태스크 abort로만 이루어진다.
    pub async fn start_monitoring(mut self, interval_minutes: u64, iterations: Option<u64>) {
        let clamped = interval_minutes.clamp(MIN_INTERVAL_MINUTES, MAX_INTERVAL_MINUTES);
        if clamped != interval_minutes {
            log::warn!(
                "Monitoring interval {} minute(s) out of range, using {}",
                interval_minutes,
                clamped
            );
        }

        let interval = Duration::from_secs(clamped * 60);
        log::info!("Monitoring started: every {} minute(s)", clamped);

        let mut completed: u64 = 0;
        loop {
            if let Some(limit) = iterations {
                if completed >= limit {
                    log::info!("Monitoring finished after {} iteration(s)", completed);
                    break;
                }
            }

            let crossovers = self.check_for_crossovers().await;
            if !crossovers.is_empty() {
                self.process_crossovers(&crossovers).await;
            }

            completed += 1;
            tokio::time::sleep(interval).await;
        }
    }
}
