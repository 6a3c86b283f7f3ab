use chrono::{DateTime, Utc};
use common::error::{AppError, Res};
use redis::AsyncCommands;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use uuid::Uuid;

pub fn setup_pool(redis_url: &str) -> Res<deadpool_redis::Pool> {
    let cfg = deadpool_redis::Config::from_url(redis_url);
    cfg.create_pool(Some(deadpool_redis::Runtime::Tokio1))
        .map_err(|e| AppError::Internal(format!("Failed to create Redis pool: {}", e)))
}

/// Message wrapper stored on a queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub id: Uuid,
    /// Deliveries already attempted.
    pub attempts: u32,
    pub dispatched_at: DateTime<Utc>,
    pub payload: T,
}

impl<T> Envelope<T> {
    pub fn new(payload: T) -> Self {
        Self {
            id: Uuid::new_v4(),
            attempts: 0,
            dispatched_at: Utc::now(),
            payload,
        }
    }

    /// The same message, marked for another delivery.
    pub fn retried(mut self) -> Self {
        self.attempts += 1;
        self.dispatched_at = Utc::now();
        self
    }
}

/// A named Redis list used as a FIFO work queue.
///
/// Producers `LPUSH`, consumers `BRPOP`. A popped message is gone from Redis,
/// so a consumer that dies mid-job loses it.
#[derive(Clone)]
pub struct RedisQueue {
    pool: deadpool_redis::Pool,
    name: String,
}

impl RedisQueue {
    pub fn new(pool: deadpool_redis::Pool, name: impl Into<String>) -> Self {
        Self {
            pool,
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn key(&self) -> String {
        format!("queues:{}", self.name)
    }

    pub async fn push<T: Serialize>(&self, payload: T) -> Res<Uuid> {
        self.push_envelope(&Envelope::new(payload)).await
    }

    pub async fn push_envelope<T: Serialize>(&self, envelope: &Envelope<T>) -> Res<Uuid> {
        let body = serde_json::to_string(envelope)?;
        let mut conn = self.pool.get().await?;
        let _: i64 = conn.lpush(self.key(), body).await?;
        log::debug!(
            "Queued message queue={} message_id={} attempts={}",
            self.name,
            envelope.id,
            envelope.attempts
        );
        Ok(envelope.id)
    }

    /// Waits up to `timeout_secs` for the next message.
    pub async fn pop<T: DeserializeOwned>(&self, timeout_secs: f64) -> Res<Option<Envelope<T>>> {
        let mut conn = self.pool.get().await?;
        let popped: Option<(String, String)> = conn.brpop(self.key(), timeout_secs).await?;

        match popped {
            Some((_, body)) => Ok(Some(serde_json::from_str(&body)?)),
            None => Ok(None),
        }
    }

    pub async fn len(&self) -> Res<u64> {
        let mut conn = self.pool.get().await?;
        conn.llen(self.key()).await.map_err(AppError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retried_envelope_keeps_id_and_counts_attempts() {
        let envelope = Envelope::new("job".to_string());
        let id = envelope.id;
        let again = envelope.retried().retried();
        assert_eq!(again.id, id);
        assert_eq!(again.attempts, 2);
    }

    #[test]
    fn envelope_wire_shape() {
        let envelope = Envelope::new(serde_json::json!({ "minutes": 6 }));
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["attempts"], 0);
        assert_eq!(value["payload"]["minutes"], 6);
        assert!(value["id"].is_string());
        assert!(value["dispatched_at"].is_string());
    }
}
