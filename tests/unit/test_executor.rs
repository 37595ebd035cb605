// Real executor over a loopback RESP server

use crate::common::{CapturingLogger, FakeRedisServer};
use redis::Value;
use redis_interceptor::state::{CommandExecutor, RedisExecutor};
use redis_interceptor::{CallContext, HookError, RedisOp};
use std::sync::Arc;
use tokio::time::Duration;

fn mixed_pipeline() -> redis::Pipeline {
    let mut pipe = redis::pipe();
    pipe.cmd("SET")
        .arg("aaa")
        .arg("aaa")
        .cmd("HDEL")
        .arg("ccc")
        .arg("aaa")
        .cmd("SET")
        .arg("bbb")
        .arg("aaa");
    pipe
}

#[tokio::test]
async fn test_pipeline_error_stays_with_its_command() {
    let server = FakeRedisServer::start(&["hdel"]).await;
    let executor = RedisExecutor::connect(&server.url, Duration::from_secs(2), 1)
        .await
        .unwrap();

    let replies = executor.execute_pipeline(&mixed_pipeline()).await.unwrap();

    assert_eq!(replies.len(), 3);
    assert!(matches!(replies[0], Ok(Value::Okay)));
    assert_eq!(replies[1].as_ref().unwrap_err().code(), Some("WRONGTYPE"));
    assert!(matches!(replies[2], Ok(Value::Okay)));
}

#[tokio::test]
async fn test_atomic_pipeline_error_stays_with_its_command() {
    let server = FakeRedisServer::start(&["hdel"]).await;
    let executor = RedisExecutor::connect(&server.url, Duration::from_secs(2), 1)
        .await
        .unwrap();

    let mut pipe = mixed_pipeline();
    pipe.atomic();
    let replies = executor.execute_pipeline(&pipe).await.unwrap();

    assert_eq!(replies.len(), 3);
    assert!(replies[0].is_ok());
    assert_eq!(replies[1].as_ref().unwrap_err().code(), Some("WRONGTYPE"));
    assert!(replies[2].is_ok());
}

#[tokio::test]
async fn test_pipeline_logs_the_command_that_failed() {
    let server = FakeRedisServer::start(&["hdel"]).await;
    let logger = Arc::new(CapturingLogger::default());
    let op = RedisOp::init(server.config(logger.clone())).await.unwrap();

    let result = op.pipeline(&CallContext::background(), &mixed_pipeline()).await;
    match result {
        Err(HookError::Redis(e)) => assert_eq!(e.code(), Some("WRONGTYPE")),
        other => panic!("Expected WRONGTYPE, got {:?}", other),
    }

    let errors = logger.at("error");
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("redis error:cmd:[HDEL ccc aaa]"));
    assert!(!errors[0].message.contains("[SET aaa aaa]"));
    assert!(errors[0].message.contains("test_executor.rs"));
}

#[tokio::test]
async fn test_init_ping_failure_names_the_caller() {
    let server = FakeRedisServer::start(&["ping"]).await;
    let logger = Arc::new(CapturingLogger::default());

    let result = RedisOp::init(server.config(logger.clone())).await;
    assert!(matches!(result, Err(HookError::Connection(_))));

    let errors = logger.at("error");
    assert_eq!(errors.len(), 2);
    assert!(errors[0].message.contains("real_caller:tests/unit/test_executor.rs"));
    assert!(errors[0].message.contains("cmd:[PING]"));
    assert!(errors[1].message.starts_with("Redis tcp ping error:"));
}
