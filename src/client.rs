// Hooked Redis client handle

use crate::config::Config;
use crate::core::context::{CallContext, CallerSite};
use crate::core::errors::HookError;
use crate::core::models::CommandRecord;
use crate::engine::command_filter::DisabledCommands;
use crate::hook::{CommandHook, LoggingHook};
use crate::logging::{Logger, LoggerSlot, TracingLogger};
use crate::state::executor::{CommandExecutor, RedisExecutor};
use redis::{Cmd, FromRedisValue, Pipeline, Value};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::time::Duration;

/// Handle to a Redis client with the logging hook installed.
///
/// Cheap to clone; clones share the connection, the debug flag and the
/// active logger.
#[derive(Clone)]
pub struct RedisOp {
    inner: Arc<Inner>,
}

struct Inner {
    config: Config,
    executor: Arc<dyn CommandExecutor>,
    hook: Arc<dyn CommandHook>,
    debug: Arc<AtomicBool>,
    logger: Arc<LoggerSlot>,
}

impl RedisOp {
    /// Connect, install the hook and probe the server with PING.
    ///
    /// The logger is wired before connecting so connection and probe failures
    /// are logged, attributed to the caller of `init`. No handle is returned
    /// when the probe fails.
    #[track_caller]
    pub fn init(config: Config) -> impl Future<Output = Result<Self, HookError>> {
        let site = CallerSite::here();
        async move {
            let logger = Self::logger_slot(&config);

            let executor = match RedisExecutor::connect(
                &config.redis_url,
                Duration::from_secs(config.redis_connection_timeout_secs),
                config.redis_connection_retries,
            )
            .await
            {
                Ok(executor) => executor,
                Err(e) => {
                    logger.load().error(format_args!("Redis connect error:{}", e));
                    return Err(e);
                }
            };

            let op = Self::assemble(config, Arc::new(executor), logger);

            if let Err(e) = op.probe(site).await {
                op.logger().error(format_args!("Redis tcp ping error:{}", e));
                return Err(e);
            }

            op.logger().printf(
                &CallContext::background().with_caller(site),
                format_args!("Redis client ready"),
            );

            Ok(op)
        }
    }

    /// Build a handle over an existing executor. No connectivity probe is run.
    pub fn with_executor(config: Config, executor: Arc<dyn CommandExecutor>) -> Self {
        let logger = Self::logger_slot(&config);
        Self::assemble(config, executor, logger)
    }

    fn logger_slot(config: &Config) -> Arc<LoggerSlot> {
        let logger: Arc<dyn Logger> = config
            .logger
            .clone()
            .unwrap_or_else(|| Arc::new(TracingLogger));
        Arc::new(LoggerSlot::new(logger))
    }

    fn assemble(config: Config, executor: Arc<dyn CommandExecutor>, logger: Arc<LoggerSlot>) -> Self {
        let debug = Arc::new(AtomicBool::new(config.debug));
        let hook = LoggingHook::new(
            DisabledCommands::new(&config.disabled_commands),
            debug.clone(),
            logger.clone(),
            config.context_logger.clone(),
        );

        Self {
            inner: Arc::new(Inner {
                config,
                executor,
                hook: Arc::new(hook),
                debug,
                logger,
            }),
        }
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Turn process-level debug logging on or off.
    ///
    /// The tracing filter must also let debug events through for the entries
    /// to show up.
    pub fn switch_debug(&self, on: bool) {
        self.inner.debug.store(on, Ordering::Relaxed);
    }

    pub fn is_debug(&self) -> bool {
        self.inner.debug.load(Ordering::Relaxed)
    }

    /// Child of `parent` whose commands are logged even when debug is off
    pub fn debug_context(&self, parent: &CallContext) -> CallContext {
        parent.with_debug(true)
    }

    /// Replace the active logger for every later command
    pub fn set_logger(&self, logger: Arc<dyn Logger>) {
        self.inner.logger.store(logger);
    }

    pub fn logger(&self) -> Arc<dyn Logger> {
        self.inner.logger.load()
    }

    /// Treat a missing key as a normal outcome
    pub fn normalize_nil<T>(result: Result<T, HookError>) -> Result<Option<T>, HookError> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(HookError::Nil) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Run one command and convert its reply.
    ///
    /// A nil reply that `T` cannot represent yields `HookError::Nil`.
    #[track_caller]
    pub fn query<'a, T>(
        &'a self,
        ctx: &CallContext,
        cmd: &'a Cmd,
    ) -> impl Future<Output = Result<T, HookError>> + 'a
    where
        T: FromRedisValue + 'a,
    {
        let ctx = Self::attribute(ctx, CallerSite::here());
        async move {
            let value = self.run_command(ctx, cmd).await?;
            from_reply(value)
        }
    }

    /// Run one command and return the raw reply
    #[track_caller]
    pub fn execute<'a>(
        &'a self,
        ctx: &CallContext,
        cmd: &'a Cmd,
    ) -> impl Future<Output = Result<Value, HookError>> + 'a {
        let ctx = Self::attribute(ctx, CallerSite::here());
        async move { self.run_command(ctx, cmd).await }
    }

    /// Run a pipeline and return one reply per command.
    ///
    /// Fails with the first command error of the batch.
    #[track_caller]
    pub fn pipeline<'a>(
        &'a self,
        ctx: &CallContext,
        pipeline: &'a Pipeline,
    ) -> impl Future<Output = Result<Vec<Value>, HookError>> + 'a {
        let ctx = Self::attribute(ctx, CallerSite::here());
        async move { self.run_pipeline(ctx, pipeline).await }
    }

    /// Run a pipeline and convert the replies, e.g. into a tuple
    #[track_caller]
    pub fn query_pipeline<'a, T>(
        &'a self,
        ctx: &CallContext,
        pipeline: &'a Pipeline,
    ) -> impl Future<Output = Result<T, HookError>> + 'a
    where
        T: FromRedisValue + 'a,
    {
        let ctx = Self::attribute(ctx, CallerSite::here());
        async move {
            let values = self.run_pipeline(ctx, pipeline).await?;
            from_reply(Value::Array(values))
        }
    }

    /// Connectivity probe
    #[track_caller]
    pub fn ping(&self) -> impl Future<Output = Result<(), HookError>> + '_ {
        self.probe(CallerSite::here())
    }

    async fn probe(&self, site: CallerSite) -> Result<(), HookError> {
        let ctx = CallContext::background().with_caller(site);
        let reply: String = self
            .query(&ctx, &redis::cmd("PING"))
            .await
            .map_err(|e| HookError::Connection(format!("Redis ping failed: {}", e)))?;

        if reply == "PONG" {
            Ok(())
        } else {
            Err(HookError::Connection(format!(
                "Redis ping returned unexpected response: {}",
                reply
            )))
        }
    }

    /// Explicit caller sites on the context win over the captured one
    fn attribute(ctx: &CallContext, site: CallerSite) -> CallContext {
        match ctx.caller() {
            Some(_) => ctx.clone(),
            None => ctx.with_caller(site),
        }
    }

    async fn run_command(&self, ctx: CallContext, cmd: &Cmd) -> Result<Value, HookError> {
        let mut record = CommandRecord::from_cmd(cmd);
        let ctx = self.inner.hook.before_process(&ctx, &record)?;

        let result = self.inner.executor.execute(cmd).await;
        if let Err(e) = &result {
            record.fail(e);
        }

        self.inner.hook.after_process(&ctx, &record);
        result.map_err(HookError::from)
    }

    async fn run_pipeline(&self, ctx: CallContext, pipeline: &Pipeline) -> Result<Vec<Value>, HookError> {
        let mut records = CommandRecord::from_pipeline(pipeline);
        let ctx = self.inner.hook.before_process_pipeline(&ctx, &records)?;

        let replies = match self.inner.executor.execute_pipeline(pipeline).await {
            Ok(replies) => replies,
            Err(e) => {
                // Nothing came back for any command; every record shares the failure.
                for record in records.iter_mut() {
                    record.fail(&e);
                }
                self.inner.hook.after_process_pipeline(&ctx, &records);
                return Err(e.into());
            }
        };

        let mut values = Vec::with_capacity(replies.len());
        let mut first_error = None;
        for (record, reply) in records.iter_mut().zip(replies) {
            match reply {
                Ok(value) => values.push(value),
                Err(e) => {
                    record.fail(&e);
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        self.inner.hook.after_process_pipeline(&ctx, &records);

        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(values),
        }
    }
}

fn from_reply<T: FromRedisValue>(value: Value) -> Result<T, HookError> {
    match T::from_redis_value(&value) {
        Ok(converted) => Ok(converted),
        Err(_) if matches!(value, Value::Nil) => Err(HookError::Nil),
        Err(e) => Err(e.into()),
    }
}
