/**
* filename : config
* author : HAMA
* date: 2025. 6. 2.
* description:
**/

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::AlertError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub market: MarketConfig,
    pub monitoring: MonitoringConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub token: String,
    pub chat_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    pub symbol: String,
    pub history_days: usize,
    pub use_mock: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub interval_minutes: u64,
    pub initial_backoff_secs: u64,
    pub max_backoff_secs: u64,
    pub max_retries: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Config {
    /// Load configuration from a file
    pub fn load() -> Result<Self, AlertError> {
        // Try to load from config.json
        let config_path = Path::new("config.json");

        let mut cfg = if config_path.exists() {
            let mut file = File::open(config_path)
                .map_err(|e| AlertError::ConfigError(format!("Failed to open config file: {}", e)))?;

            let mut contents = String::new();
            file.read_to_string(&mut contents)
                .map_err(|e| AlertError::ConfigError(format!("Failed to read config file: {}", e)))?;

            serde_json::from_str::<Config>(&contents)
                .map_err(|e| AlertError::ConfigError(format!("Failed to parse config file: {}", e)))?
        } else {
            // Fall back to default configuration
            Config::default()
        };

        // environment overrides
        cfg.apply_env_overrides()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Apply environment variable overrides for sensitive/runtime fields
    fn apply_env_overrides(&mut self) -> Result<(), AlertError> {
        use std::env;
        if let Ok(v) = env::var("TELEGRAM_TOKEN") { if !v.is_empty() { self.telegram.token = v; } }
        if let Ok(v) = env::var("TELEGRAM_CHAT_ID") { if !v.is_empty() { self.telegram.chat_id = v; } }
        if let Ok(v) = env::var("SYMBOL") { if !v.is_empty() { self.market.symbol = v; } }
        if let Ok(v) = env::var("MONITORING_INTERVAL") {
            if !v.is_empty() {
                self.monitoring.interval_minutes = v.parse().map_err(|_| {
                    AlertError::ConfigError(format!("Invalid MONITORING_INTERVAL value: {}", v))
                })?;
            }
        }
        if let Ok(v) = env::var("USE_MOCK") {
            let lower = v.to_lowercase();
            if ["1","true","yes"].contains(&lower.as_str()) { self.market.use_mock = true; }
            if ["0","false","no"].contains(&lower.as_str()) { self.market.use_mock = false; }
        }
        if let Ok(v) = env::var("LOG_LEVEL") { if !v.is_empty() { self.logging.level = v; } }
        Ok(())
    }

    /// Reject configurations the bot cannot run with
    pub fn validate(&self) -> Result<(), AlertError> {
        if self.telegram.token.is_empty() {
            return Err(AlertError::ConfigError(
                "Telegram token cannot be empty. Set TELEGRAM_TOKEN or fill config.json".to_string(),
            ));
        }
        if !valid_token_format(&self.telegram.token) {
            return Err(AlertError::ConfigError(
                "Invalid Telegram token format. Expected 'digits:secret' with a 35 character secret".to_string(),
            ));
        }
        if self.telegram.chat_id.is_empty() {
            return Err(AlertError::ConfigError(
                "Chat ID cannot be empty. Set TELEGRAM_CHAT_ID or fill config.json".to_string(),
            ));
        }
        self.primary_chat_id()?;
        if self.market.symbol.is_empty() {
            return Err(AlertError::ConfigError("Symbol cannot be empty".to_string()));
        }
        if self.monitoring.interval_minutes < 1 {
            return Err(AlertError::ConfigError(format!(
                "Monitoring interval must be a positive number of minutes. Got: {}",
                self.monitoring.interval_minutes
            )));
        }
        if self.monitoring.max_retries < 1 {
            return Err(AlertError::ConfigError(
                "Fetch retries must be at least 1".to_string(),
            ));
        }
        if self.market.history_days < 100 {
            return Err(AlertError::ConfigError(format!(
                "History days must cover the longest SMA period (100). Got: {}",
                self.market.history_days
            )));
        }
        Ok(())
    }

    /// 설정된 기본 수신 채팅 ID
    ///
    /// 구독 명단은 양수 ID만 받으므로 여기서 같은 규칙을 적용한다.
    pub fn primary_chat_id(&self) -> Result<i64, AlertError> {
        let id = self.telegram.chat_id.parse::<i64>().map_err(|_| {
            AlertError::ConfigError(format!(
                "Chat ID must be numeric. Got: {}",
                self.telegram.chat_id
            ))
        })?;

        if id <= 0 {
            return Err(AlertError::ConfigError(format!(
                "Chat ID must be a positive private chat ID. Got: {}",
                id
            )));
        }

        Ok(id)
    }
}

/// Telegram 봇 토큰 형식 검사 (숫자 ID + ':' + 35자 시크릿)
fn valid_token_format(token: &str) -> bool {
    let mut parts = token.splitn(2, ':');
    let id = parts.next().unwrap_or("");
    let secret = parts.next().unwrap_or("");

    let id_ok = !id.is_empty() && id.chars().all(|c| c.is_ascii_digit());
    let secret_ok = secret.len() == 35
        && secret.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

    id_ok && secret_ok
}

impl Default for Config {
    fn default() -> Self {
        Config {
            telegram: TelegramConfig {
                token: "".to_string(),
                chat_id: "".to_string(),
            },
            market: MarketConfig {
                symbol: "SPY".to_string(),
                history_days: 100,
                use_mock: false,
            },
            monitoring: MonitoringConfig {
                interval_minutes: 5,
                initial_backoff_secs: 30,
                max_backoff_secs: 300,
                max_retries: 5,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}
