use async_trait::async_trait;
use chrono::Utc;

use crate::error::AlertError;
use crate::models::PricePoint;

/// 가격 데이터 제공자 인터페이스
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// 현재가 조회
    async fn fetch_current_price(&self) -> Result<f64, AlertError>;

    /// 최근 days일치 일별 종가 조회 (오래된 것부터 정렬)
    async fn fetch_historical_prices(&self, days: usize) -> Result<Vec<PricePoint>, AlertError>;
}

/// 수신한 가격 데이터 검증
///
/// 비어 있거나, 미래 타임스탬프가 있거나, 종가가 0 이하 또는 NaN이면 실패
pub fn validate_price_data(data: &[PricePoint]) -> bool {
    if data.is_empty() {
        return false;
    }

    let now = Utc::now();

    for point in data {
        if point.timestamp > now {
            return false;
        }
        if !(point.close > 0.0) {
            return false;
        }
    }

    true
}
