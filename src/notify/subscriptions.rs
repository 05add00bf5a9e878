/**
* filename : subscriptions
* author : HAMA
* date: 2025. 6. 3.
* description:
**/

use std::collections::HashSet;

use tokio::sync::RwLock;

use crate::error::AlertError;

/// 알림 수신자 명단
///
/// 메모리에만 유지되고 재시작 시 초기화된다.
pub struct SubscriptionManager {
  subscribers: RwLock<HashSet<i64>>,
}

impl SubscriptionManager {
  pub fn new() -> Self {
    SubscriptionManager {
      subscribers: RwLock::new(HashSet::new()),
    }
  }

  /// 구독 등록. 새로 등록되면 true, 이미 있으면 false
  pub async fn subscribe(&self, chat_id: i64) -> Result<bool, AlertError> {
    validate_chat_id(chat_id)?;

    let mut subscribers = self.subscribers.write().await;
    Ok(subscribers.insert(chat_id))
  }

  /// 구독 해제. 해제되면 true, 명단에 없었으면 false
  pub async fn unsubscribe(&self, chat_id: i64) -> Result<bool, AlertError> {
    validate_chat_id(chat_id)?;

    let mut subscribers = self.subscribers.write().await;
    Ok(subscribers.remove(&chat_id))
  }

  pub async fn is_subscribed(&self, chat_id: i64) -> Result<bool, AlertError> {
    validate_chat_id(chat_id)?;

    let subscribers = self.subscribers.read().await;
    Ok(subscribers.contains(&chat_id))
  }

  pub async fn all_subscribers(&self) -> Vec<i64> {
    let subscribers = self.subscribers.read().await;
    subscribers.iter().copied().collect()
  }

  pub async fn subscriber_count(&self) -> usize {
    self.subscribers.read().await.len()
  }

  pub async fn clear(&self) {
    self.subscribers.write().await.clear();
  }
}

impl Default for SubscriptionManager {
  fn default() -> Self {
    Self::new()
  }
}

fn validate_chat_id(chat_id: i64) -> Result<(), AlertError> {
  if chat_id <= 0 {
    return Err(AlertError::InvalidParameter(format!(
      "chat_id must be positive, got {}",
      chat_id
    )));
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_subscribe_and_duplicate() {
    let manager = SubscriptionManager::new();

    assert!(manager.subscribe(100).await.unwrap());
    assert!(!manager.subscribe(100).await.unwrap());
    assert_eq!(manager.subscriber_count().await, 1);
  }

  #[tokio::test]
  async fn test_unsubscribe() {
    let manager = SubscriptionManager::new();
    manager.subscribe(100).await.unwrap();

    assert!(manager.unsubscribe(100).await.unwrap());
    assert!(!manager.unsubscribe(100).await.unwrap());
    assert!(!manager.is_subscribed(100).await.unwrap());
  }

  #[tokio::test]
  async fn test_invalid_chat_id() {
    let manager = SubscriptionManager::new();

    assert!(manager.subscribe(0).await.is_err());
    assert!(manager.subscribe(-5).await.is_err());
    assert!(manager.is_subscribed(-5).await.is_err());
    assert_eq!(manager.subscriber_count().await, 0);
  }

  #[tokio::test]
  async fn test_all_subscribers_and_clear() {
    let manager = SubscriptionManager::new();
    manager.subscribe(100).await.unwrap();
    manager.subscribe(200).await.unwrap();

    let mut all = manager.all_subscribers().await;
    all.sort();
    assert_eq!(all, vec![100, 200]);

    manager.clear().await;
    assert_eq!(manager.subscriber_count().await, 0);
  }
}
