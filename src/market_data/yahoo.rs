/**
* filename : yahoo
* author : HAMA
* date: 2025. 6. 3.
* description: Yahoo Finance v8 차트 API 클라이언트
**/

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::error::AlertError;
use crate::market_data::provider::{validate_price_data, PriceProvider};
use crate::models::PricePoint;
use crate::utils::timestamp_to_datetime;

const YAHOO_API_BASE: &str = "https://query1.finance.yahoo.com";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:124.0) Gecko/20100101 Firefox/124.0";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// 캐시 유효 시간
const CACHE_TTL: Duration = Duration::from_secs(300);

/// 이력 요청 하한 (가장 긴 SMA 기간)
const MIN_HISTORY_DAYS: usize = 100;

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartApiError>,
}

#[derive(Debug, Deserialize)]
struct ChartApiError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(rename = "regularMarketPrice")]
    regular_market_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    close: Option<Vec<Option<f64>>>,
}

struct CachedHistory {
    fetched_at: Instant,
    prices: Vec<PricePoint>,
}

/// Yahoo Finance 기반 가격 제공자
///
/// 현재가와 일별 종가 이력을 조회하며 응답을 5분간 캐싱한다.
pub struct YahooProvider {
    client: Client,
    base_url: String,
    symbol: String,
    current_cache: Mutex<Option<(Instant, f64)>>,
    history_cache: Mutex<HashMap<usize, CachedHistory>>,
}

impl YahooProvider {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self::with_base_url(symbol, YAHOO_API_BASE)
    }

    pub fn with_base_url(symbol: impl Into<String>, base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        YahooProvider {
            client,
            base_url: base_url.into(),
            symbol: symbol.into(),
            current_cache: Mutex::new(None),
            history_cache: Mutex::new(HashMap::new()),
        }
    }

    /// 현재가/이력 캐시 비우기
    pub async fn clear_cache(&self) {
        self.current_cache.lock().await.take();
        self.history_cache.lock().await.clear();
    }

    async fn fetch_chart(&self, range_days: usize) -> Result<ChartResult, AlertError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, self.symbol);
        let range = format!("{}d", range_days);

        let response = self
            .client
            .get(&url)
            .query(&[("interval", "1d"), ("range", range.as_str())])
            .send()
            .await
            .map_err(|e| AlertError::DataUnavailable(format!("Yahoo request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AlertError::DataUnavailable(format!(
                "Yahoo returned status {}",
                response.status()
            )));
        }

        let parsed: ChartResponse = response
            .json()
            .await
            .map_err(|e| AlertError::DataUnavailable(format!("Failed to parse Yahoo response: {}", e)))?;

        if let Some(err) = parsed.chart.error {
            return Err(AlertError::DataUnavailable(format!(
                "Yahoo error {}: {}",
                err.code, err.description
            )));
        }

        parsed
            .chart
            .result
            .and_then(|mut results| {
                if results.is_empty() {
                    None
                } else {
                    Some(results.remove(0))
                }
            })
            .ok_or_else(|| {
                AlertError::DataUnavailable("Yahoo response contained no chart data".to_string())
            })
    }
}

/// 차트 응답에서 종가 시계열 추출
///
/// 종가가 null인 캔들(휴장 등)은 버리고 시간순으로 정렬한다.
fn extract_price_points(result: &ChartResult) -> Vec<PricePoint> {
    let timestamps = match &result.timestamp {
        Some(timestamps) => timestamps,
        None => return Vec::new(),
    };

    let closes = match result.indicators.quote.first().and_then(|q| q.close.as_ref()) {
        Some(closes) => closes,
        None => return Vec::new(),
    };

    let mut points: Vec<PricePoint> = timestamps
        .iter()
        .zip(closes.iter())
        .filter_map(|(&ts, close)| close.map(|c| PricePoint::new(timestamp_to_datetime(ts), c)))
        .collect();

    points.sort_by_key(|p| p.timestamp);
    points
}

#[async_trait]
impl PriceProvider for YahooProvider {
    async fn fetch_current_price(&self) -> Result<f64, AlertError> {
        {
            let cache = self.current_cache.lock().await;
            if let Some((fetched_at, price)) = *cache {
                if fetched_at.elapsed() < CACHE_TTL {
                    log::debug!("current price cache hit: {}", price);
                    return Ok(price);
                }
            }
        }

        let result = self.fetch_chart(5).await?;

        // 장중 메타데이터가 없으면 마지막 종가로 대체
        let price = match result.meta.regular_market_price {
            Some(price) => price,
            None => extract_price_points(&result)
                .last()
                .map(|p| p.close)
                .ok_or_else(|| {
                    AlertError::DataUnavailable("No current price in Yahoo response".to_string())
                })?,
        };

        // 0 이하·NaN 현재가는 거부
        if !(price > 0.0) {
            return Err(AlertError::InvalidData(format!(
                "Current price for {} looks invalid: {}",
                self.symbol, price
            )));
        }

        let mut cache = self.current_cache.lock().await;
        *cache = Some((Instant::now(), price));

        Ok(price)
    }

    async fn fetch_historical_prices(&self, days: usize) -> Result<Vec<PricePoint>, AlertError> {
        if days < 1 {
            return Err(AlertError::InvalidParameter(
                "days must be at least 1".to_string(),
            ));
        }

        // 가장 긴 SMA(100일) 계산이 항상 가능하도록 최소 요청량을 보장
        let days = days.max(MIN_HISTORY_DAYS);

        {
            let cache = self.history_cache.lock().await;
            if let Some(entry) = cache.get(&days) {
                if entry.fetched_at.elapsed() < CACHE_TTL {
                    log::debug!("history cache hit for {} days", days);
                    return Ok(entry.prices.clone());
                }
            }
        }

        // 주말/휴장일 손실을 감안해 달력 기준으로 여유분을 더 요청
        let range_days = days + (days / 2).max(10);
        let result = self.fetch_chart(range_days).await?;
        let mut points = extract_price_points(&result);

        if points.is_empty() {
            return Err(AlertError::DataUnavailable(format!(
                "Yahoo returned no price history for {}",
                self.symbol
            )));
        }

        if points.len() > days {
            points.drain(..points.len() - days);
        }

        // 미래 타임스탬프나 0 이하 종가가 섞인 시계열은 캐싱 전에 거른다
        if !validate_price_data(&points) {
            return Err(AlertError::InvalidData(format!(
                "Invalid price history received for {}",
                self.symbol
            )));
        }

        let mut cache = self.history_cache.lock().await;
        cache.insert(
            days,
            CachedHistory {
                fetched_at: Instant::now(),
                prices: points.clone(),
            },
        );

        Ok(points)
    }
}
