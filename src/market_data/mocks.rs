use std::collections::VecDeque;

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use tokio::sync::Mutex;

use crate::error::AlertError;
use crate::market_data::provider::PriceProvider;
use crate::models::PricePoint;

struct MockState {
    price_script: VecDeque<f64>,
    last_price: f64,
    history: Vec<PricePoint>,
    fail_current_remaining: u32,
    fail_historical_remaining: u32,
    current_calls: u32,
    historical_calls: u32,
}

/// A mock implementation of the PriceProvider trait for testing and development
pub struct MockPriceProvider {
    state: Mutex<MockState>,
}

impl MockPriceProvider {
    pub fn new(history: Vec<PricePoint>, current_price: f64) -> Self {
        MockPriceProvider {
            state: Mutex::new(MockState {
                price_script: VecDeque::new(),
                last_price: current_price,
                history,
                fail_current_remaining: 0,
                fail_historical_remaining: 0,
                current_calls: 0,
                historical_calls: 0,
            }),
        }
    }

    /// Generate a random daily walk so the bot can run without live market access
    pub fn with_random_walk(days: usize, start_price: f64) -> Self {
        let mut rng = rand::thread_rng();
        let now = Utc::now();
        let mut history = Vec::with_capacity(days);
        let mut close = start_price;

        for i in 0..days {
            let timestamp = now - chrono::Duration::days((days - i) as i64);
            let change = rng.gen_range(-200.0..200.0) / 10_000.0;
            close = (close * (1.0 + change)).clamp(start_price * 0.5, start_price * 2.0);
            history.push(PricePoint::new(timestamp, close));
        }

        Self::new(history, close)
    }

    /// Queue current prices to be returned one per call; the last one repeats
    pub fn with_price_script(mut self, prices: &[f64]) -> Self {
        self.state.get_mut().price_script = prices.iter().copied().collect();
        self
    }

    /// Make the next n current price fetches fail
    pub fn fail_current_times(mut self, n: u32) -> Self {
        self.state.get_mut().fail_current_remaining = n;
        self
    }

    /// Make the next n historical fetches fail
    pub fn fail_historical_times(mut self, n: u32) -> Self {
        self.state.get_mut().fail_historical_remaining = n;
        self
    }

    pub async fn current_price_calls(&self) -> u32 {
        self.state.lock().await.current_calls
    }

    pub async fn historical_calls(&self) -> u32 {
        self.state.lock().await.historical_calls
    }
}

#[async_trait]
impl PriceProvider for MockPriceProvider {
    async fn fetch_current_price(&self) -> Result<f64, AlertError> {
        let mut state = self.state.lock().await;
        state.current_calls += 1;

        if state.fail_current_remaining > 0 {
            state.fail_current_remaining -= 1;
            return Err(AlertError::DataUnavailable(
                "mock: current price unavailable".to_string(),
            ));
        }

        if let Some(price) = state.price_script.pop_front() {
            state.last_price = price;
        }

        Ok(state.last_price)
    }

    async fn fetch_historical_prices(&self, _days: usize) -> Result<Vec<PricePoint>, AlertError> {
        let mut state = self.state.lock().await;
        state.historical_calls += 1;

        if state.fail_historical_remaining > 0 {
            state.fail_historical_remaining -= 1;
            return Err(AlertError::DataUnavailable(
                "mock: price history unavailable".to_string(),
            ));
        }

        Ok(state.history.clone())
    }
}
