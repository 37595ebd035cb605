// Command execution against Redis

use crate::core::errors::HookError;
use redis::aio::{ConnectionLike, ConnectionManager};
use redis::{Client, Cmd, ErrorKind, Pipeline, RedisError, RedisResult, Value};
use tokio::time::{sleep, timeout, Duration};

/// Executes commands once the hook has admitted them.
///
/// The interceptor never speaks the wire protocol itself; this is the seam to
/// whatever connection the embedder uses.
#[async_trait::async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn execute(&self, cmd: &Cmd) -> RedisResult<Value>;

    /// Run a batch. The inner results are per command, in submission order,
    /// and carry each command's own error reply. The outer error is kept for
    /// failures that hit the batch as a whole, such as a dropped connection.
    async fn execute_pipeline(&self, pipeline: &Pipeline) -> RedisResult<Vec<RedisResult<Value>>>;
}

/// Executor over a `redis` connection manager
#[derive(Clone)]
pub struct RedisExecutor {
    connection_manager: ConnectionManager,
}

impl RedisExecutor {
    /// Open a client for `redis_url` and establish the managed connection.
    ///
    /// Each attempt is bounded by `connect_timeout`; failed attempts are
    /// retried with a linear backoff of one second per attempt.
    pub async fn connect(
        redis_url: &str,
        connect_timeout: Duration,
        max_attempts: u32,
    ) -> Result<Self, HookError> {
        const BACKOFF_STEP_MS: u64 = 1000;

        let max_attempts = max_attempts.max(1);
        let mut connection_errors = Vec::new();

        for attempt in 0..max_attempts {
            if attempt > 0 {
                sleep(Duration::from_millis(BACKOFF_STEP_MS * attempt as u64)).await;
            }

            match Self::try_connect(redis_url, connect_timeout).await {
                Ok(executor) => {
                    if attempt > 0 {
                        tracing::info!("Redis connection succeeded on attempt {}", attempt + 1);
                    }
                    return Ok(executor);
                }
                Err(e) => {
                    if attempt + 1 < max_attempts {
                        tracing::warn!(
                            attempt = attempt + 1,
                            max_attempts = max_attempts,
                            error = %e,
                            "Redis connection attempt failed, retrying..."
                        );
                    }
                    connection_errors.push(format!("Attempt {} failed: {}", attempt + 1, e));
                }
            }
        }

        Err(HookError::Connection(format!(
            "Failed to connect to Redis at {} after {} attempts: {}",
            redis_url,
            max_attempts,
            connection_errors.join("; ")
        )))
    }

    async fn try_connect(redis_url: &str, connect_timeout: Duration) -> Result<Self, HookError> {
        let client = Client::open(redis_url).map_err(|e| {
            HookError::Connection(format!("Invalid Redis URL format '{}': {}", redis_url, e))
        })?;

        let connection_manager = timeout(connect_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| {
                HookError::Connection(format!(
                    "Redis connection timed out after {} seconds",
                    connect_timeout.as_secs()
                ))
            })?
            .map_err(|e| HookError::Connection(format!("Failed to create Redis connection: {}", e)))?;

        Ok(Self { connection_manager })
    }
}

#[async_trait::async_trait]
impl CommandExecutor for RedisExecutor {
    async fn execute(&self, cmd: &Cmd) -> RedisResult<Value> {
        let mut conn = self.connection_manager.clone();
        let value: Value = cmd.query_async(&mut conn).await?;
        Ok(value)
    }

    async fn execute_pipeline(&self, pipeline: &Pipeline) -> RedisResult<Vec<RedisResult<Value>>> {
        let mut conn = self.connection_manager.clone();
        let count = pipeline.cmd_iter().count();
        if count == 0 {
            return Ok(Vec::new());
        }

        // Raw replies keep one error value per failing command, so the
        // outer error is left to transport and transaction-level failures.
        let replies = if is_atomic(pipeline) {
            match conn.req_packed_commands(pipeline, count + 1, 1).await?.pop() {
                Some(Value::Array(items)) => items,
                // EXEC aborted by WATCH
                Some(Value::Nil) => vec![Value::Nil; count],
                Some(Value::ServerError(err)) => return Err(err.into()),
                _ => {
                    return Err(RedisError::from((
                        ErrorKind::ResponseError,
                        "Invalid response when parsing multi response",
                    )))
                }
            }
        } else {
            conn.req_packed_commands(pipeline, 0, count).await?
        };

        Ok(replies.into_iter().map(Value::extract_error).collect())
    }
}

/// True when the pipeline wraps its commands in MULTI/EXEC
fn is_atomic(pipeline: &Pipeline) -> bool {
    let commands_len: usize = pipeline
        .cmd_iter()
        .map(|cmd| cmd.get_packed_command().len())
        .sum();
    pipeline.get_packed_pipeline().len() != commands_len
}
