//! Job Queue: a durable FIFO of job identifiers backed by a Redis list.
//!
//! Producers `LPUSH`, the single consumer `BRPOP`s from the other end.
//! Messages carry only the job id; the worker always re-reads the job from
//! the Job Store.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::Client as RedisClient;
use thiserror::Error;

pub const QUEUE_KEY: &str = "evaluation_queue";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Slack on top of the BRPOP timeout before the reply is considered lost.
const BLOCKING_REPLY_GRACE: Duration = Duration::from_secs(2);
const COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("queue unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue(&self, job_id: &str) -> Result<(), QueueError>;

    /// Waits up to `timeout` for the oldest entry. `Ok(None)` on timeout.
    async fn dequeue_blocking(&self, timeout: Duration) -> Result<Option<String>, QueueError>;

    async fn len(&self) -> Result<u64, QueueError>;
}

/// Holds two long-lived, self-reconnecting connections. `commands` is
/// shared by producers and status reads; `blocking` carries only the
/// consumer's BRPOP, which would otherwise stall everything queued behind it.
#[derive(Clone)]
pub struct RedisJobQueue {
    commands: ConnectionManager,
    blocking: ConnectionManager,
}

impl RedisJobQueue {
    pub async fn connect(client: RedisClient) -> Result<Self, QueueError> {
        let commands = bounded(CONNECT_TIMEOUT, ConnectionManager::new(client.clone())).await?;
        let blocking = bounded(CONNECT_TIMEOUT, ConnectionManager::new(client)).await?;
        Ok(Self { commands, blocking })
    }
}

/// BRPOP takes whole seconds and treats 0 as "block forever".
fn brpop_timeout_secs(timeout: Duration) -> u64 {
    timeout.as_secs().max(1)
}

async fn bounded<T>(
    limit: Duration,
    call: impl Future<Output = redis::RedisResult<T>>,
) -> Result<T, QueueError> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(QueueError::Unavailable(format!(
            "no reply from Redis within {}s",
            limit.as_secs()
        ))),
    }
}

#[async_trait]
impl JobQueue for RedisJobQueue {
    async fn enqueue(&self, job_id: &str) -> Result<(), QueueError> {
        let mut conn = self.commands.clone();
        let mut cmd = redis::cmd("LPUSH");
        cmd.arg(QUEUE_KEY).arg(job_id);
        bounded(COMMAND_TIMEOUT, cmd.query_async::<_, i64>(&mut conn)).await?;
        Ok(())
    }

    async fn dequeue_blocking(&self, timeout: Duration) -> Result<Option<String>, QueueError> {
        let mut conn = self.blocking.clone();
        let seconds = brpop_timeout_secs(timeout);
        let mut cmd = redis::cmd("BRPOP");
        cmd.arg(QUEUE_KEY).arg(seconds);
        let popped: Option<(String, String)> = bounded(
            Duration::from_secs(seconds) + BLOCKING_REPLY_GRACE,
            cmd.query_async(&mut conn),
        )
        .await?;
        Ok(popped.map(|(_key, job_id)| job_id))
    }

    async fn len(&self) -> Result<u64, QueueError> {
        let mut conn = self.commands.clone();
        let mut cmd = redis::cmd("LLEN");
        cmd.arg(QUEUE_KEY);
        let length: u64 = bounded(COMMAND_TIMEOUT, cmd.query_async(&mut conn)).await?;
        Ok(length)
    }
}
