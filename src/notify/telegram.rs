/**
* filename : telegram
* author : HAMA
* date: 2025. 6. 3.
* description: 텔레그램 Bot API 클라이언트
**/

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::AlertError;

pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// 알림 전송 인터페이스
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// 텍스트 메시지 전송
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), AlertError>;

    /// PNG 차트와 캡션 전송
    async fn send_photo(&self, chat_id: i64, png: &[u8], caption: &str) -> Result<(), AlertError>;

    /// 롱 폴링으로 업데이트 수신
    async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
    ) -> Result<Vec<TelegramUpdate>, AlertError>;
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramUpdate {
    pub update_id: i64,
    pub message: Option<TelegramMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramMessage {
    pub chat: TelegramChat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GetUpdatesRequest {
    timeout: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<i64>,
}

/// 실제 텔레그램 Bot API 호출 구현
pub struct TelegramClient {
    client: Client,
    base_url: String,
    token: String,
}

impl TelegramClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(token, TELEGRAM_API_BASE)
    }

    pub fn with_base_url(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        TelegramClient {
            client: Client::new(),
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    async fn read_result<T: DeserializeOwned>(
        response: reqwest::Response,
        method: &str,
    ) -> Result<T, AlertError> {
        let status = response.status();

        // 실패 응답도 ok/description 형태라 본문을 먼저 읽는다
        let body: ApiResponse<T> = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                return Err(AlertError::TelegramError(format!(
                    "{} returned status {} ({})",
                    method, status, e
                )))
            }
        };

        if !body.ok {
            return Err(AlertError::TelegramError(format!(
                "{} rejected: {}",
                method,
                body.description
                    .unwrap_or_else(|| "no description".to_string())
            )));
        }

        body.result.ok_or_else(|| {
            AlertError::TelegramError(format!("{} returned empty result", method))
        })
    }
}

#[async_trait]
impl Notifier for TelegramClient {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), AlertError> {
        let request = SendMessageRequest { chat_id, text };
        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&request)
            .send()
            .await?;

        Self::read_result::<serde_json::Value>(response, "sendMessage").await?;
        Ok(())
    }

    async fn send_photo(&self, chat_id: i64, png: &[u8], caption: &str) -> Result<(), AlertError> {
        let photo = Part::bytes(png.to_vec())
            .file_name("chart.png")
            .mime_str("image/png")?;
        let form = Form::new()
            .text("chat_id", chat_id.to_string())
            .text("caption", caption.to_string())
            .part("photo", photo);

        let response = self
            .client
            .post(self.method_url("sendPhoto"))
            .multipart(form)
            .send()
            .await?;

        Self::read_result::<serde_json::Value>(response, "sendPhoto").await?;
        Ok(())
    }

    async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
    ) -> Result<Vec<TelegramUpdate>, AlertError> {
        let request = GetUpdatesRequest {
            timeout: timeout_secs,
            offset,
        };
        let response = self
            .client
            .post(self.method_url("getUpdates"))
            .json(&request)
            .send()
            .await?;

        Self::read_result(response, "getUpdates").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_url() {
        let client = TelegramClient::new("123:abc");

        assert_eq!(
            client.method_url("sendMessage"),
            "https://api.telegram.org/bot123:abc/sendMessage"
        );
    }

    #[test]
    fn test_parse_updates_envelope() {
        let json = r#"{
            "ok": true,
            "result": [
                {
                    "update_id": 700001,
                    "message": {
                        "message_id": 42,
                        "chat": { "id": 9999, "type": "private" },
                        "text": "/start"
                    }
                },
                { "update_id": 700002 }
            ]
        }"#;

        let body: ApiResponse<Vec<TelegramUpdate>> = serde_json::from_str(json).unwrap();

        assert!(body.ok);
        let updates = body.result.unwrap();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].update_id, 700001);
        let message = updates[0].message.as_ref().unwrap();
        assert_eq!(message.chat.id, 9999);
        assert_eq!(message.text.as_deref(), Some("/start"));
        assert!(updates[1].message.is_none());
    }

    #[test]
    fn test_error_envelope() {
        let json = r#"{ "ok": false, "error_code": 401, "description": "Unauthorized" }"#;

        let body: ApiResponse<Vec<TelegramUpdate>> = serde_json::from_str(json).unwrap();

        assert!(!body.ok);
        assert_eq!(body.description.as_deref(), Some("Unauthorized"));
    }

    #[test]
    fn test_get_updates_request_omits_missing_offset() {
        let without = serde_json::to_string(&GetUpdatesRequest {
            timeout: 30,
            offset: None,
        })
        .unwrap();
        assert_eq!(without, r#"{"timeout":30}"#);

        let with = serde_json::to_string(&GetUpdatesRequest {
            timeout: 30,
            offset: Some(700002),
        })
        .unwrap();
        assert!(with.contains(r#""offset":700002"#));
    }
}
