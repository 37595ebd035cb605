// Integration tests against a real Redis server
//
// These tests require Redis to be running on REDIS_URL (default
// redis://127.0.0.1:6379/0) and return early when it is not reachable.

use crate::common::{command, CapturingLogger};
use redis_interceptor::{CallContext, Config, HookError, RedisOp};
use std::sync::Arc;

fn live_config(logger: Arc<CapturingLogger>) -> Config {
    let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379/0".to_string());
    let mut config = Config::new(url).with_logger(logger);
    config.redis_connection_timeout_secs = 2;
    config.redis_connection_retries = 1;
    config
}

async fn connect() -> Option<(RedisOp, Arc<CapturingLogger>)> {
    let logger = Arc::new(CapturingLogger::default());
    match RedisOp::init(live_config(logger.clone())).await {
        Ok(op) => Some((op, logger)),
        Err(_) => None,
    }
}

#[tokio::test]
async fn test_init_fails_when_unreachable() {
    let logger = Arc::new(CapturingLogger::default());
    let mut config = Config::new("redis://127.0.0.1:1/0").with_logger(logger.clone());
    config.redis_connection_timeout_secs = 1;
    config.redis_connection_retries = 1;

    let result = RedisOp::init(config).await;

    assert!(matches!(result, Err(HookError::Connection(_))));
    assert_eq!(logger.at("error").len(), 1);
}

#[tokio::test]
async fn test_live_set_get_and_disabled_flushdb() {
    let Some((op, logger)) = connect().await else {
        return;
    };
    let ctx = CallContext::background();
    let key = format!("interceptor_test_{}", uuid::Uuid::new_v4());

    let mut set = redis::cmd("SET");
    set.arg(&key).arg("value").arg("EX").arg(60);
    let _: () = op.query(&ctx, &set).await.unwrap();

    let value: String = op.query(&ctx, &command(&format!("GET {}", key))).await.unwrap();
    assert_eq!(value, "value");

    let flush = op.execute(&ctx, &redis::cmd("FLUSHDB")).await;
    assert!(matches!(flush, Err(HookError::CommandDisabled { .. })));

    // Still there: FLUSHDB never reached the server
    let value: String = op.query(&ctx, &command(&format!("GET {}", key))).await.unwrap();
    assert_eq!(value, "value");

    // Only the init message was logged
    assert!(logger.at("error").is_empty());
    assert!(logger.at("debug").is_empty());

    let _: () = op.query(&ctx, &command(&format!("DEL {}", key))).await.unwrap();
}

#[tokio::test]
async fn test_live_wrong_type_is_logged() {
    let Some((op, logger)) = connect().await else {
        return;
    };
    let ctx = CallContext::background();
    let key = format!("interceptor_test_{}", uuid::Uuid::new_v4());

    let _: () = op.query(&ctx, &command(&format!("SET {} plain", key))).await.unwrap();
    let result: Result<Option<String>, HookError> =
        op.query(&ctx, &command(&format!("HGET {} field", key))).await;
    assert!(matches!(result, Err(HookError::Redis(_))));

    let errors = logger.at("error");
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("HGET"));

    let missing: Result<String, HookError> = op
        .query(&ctx, &command(&format!("GET {}_absent", key)))
        .await;
    assert_eq!(RedisOp::normalize_nil(missing).unwrap(), None);

    let _: () = op.query(&ctx, &command(&format!("DEL {}", key))).await.unwrap();
}

#[tokio::test]
async fn test_live_pipeline_debug() {
    let Some((op, logger)) = connect().await else {
        return;
    };
    let key = format!("interceptor_test_{}", uuid::Uuid::new_v4());
    let ctx = op.debug_context(&CallContext::background());

    let mut pipe = redis::pipe();
    pipe.cmd("SET").arg(&key).arg("1").cmd("INCR").arg(&key).cmd("DEL").arg(&key);

    let ((), counter, deleted): ((), i64, i64) = op.query_pipeline(&ctx, &pipe).await.unwrap();
    assert_eq!(counter, 2);
    assert_eq!(deleted, 1);

    let debug = logger.at("debug");
    assert_eq!(debug.len(), 1);
    assert!(debug[0].message.contains("redis pipeline cmds:SET"));
}
