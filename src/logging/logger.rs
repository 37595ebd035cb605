// Logger capability used by the command hook

use crate::core::context::{CallContext, CallerSite};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, error, info};

/// Field name carrying the command latency in microseconds
pub const REDIS_TIME_COST: &str = "redisTimeCost/us";

/// Enrichment attached to every hook log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogFields {
    pub caller: CallerSite,
    pub elapsed_micros: i64,
}

impl LogFields {
    pub fn new(caller: CallerSite, elapsed_micros: i64) -> Self {
        Self {
            caller,
            elapsed_micros,
        }
    }

    /// Prefix used when a backend has no structured-field support
    pub fn inline_prefix(&self) -> String {
        format!(
            "real_caller:{},line:{},{}:{},",
            self.caller.file, self.caller.line, REDIS_TIME_COST, self.elapsed_micros
        )
    }
}

/// Logging backend for the interceptor.
///
/// Implementors only need the three plain methods. The `*_with_fields`
/// variants default to inlining the fields into the message; backends with
/// structured fields override them.
pub trait Logger: Send + Sync {
    fn debug(&self, args: fmt::Arguments<'_>);

    fn error(&self, args: fmt::Arguments<'_>);

    /// Lifecycle messages from the client (connect, probe, reconnect)
    fn printf(&self, ctx: &CallContext, args: fmt::Arguments<'_>);

    fn debug_with_fields(&self, fields: &LogFields, args: fmt::Arguments<'_>) {
        self.debug(format_args!("{}{}", fields.inline_prefix(), args));
    }

    fn error_with_fields(&self, fields: &LogFields, args: fmt::Arguments<'_>) {
        self.error(format_args!("{}{}", fields.inline_prefix(), args));
    }
}

/// Default logger, forwarding to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn debug(&self, args: fmt::Arguments<'_>) {
        debug!(target: "redis", "{}", args);
    }

    fn error(&self, args: fmt::Arguments<'_>) {
        error!(target: "redis", "{}", args);
    }

    fn printf(&self, ctx: &CallContext, args: fmt::Arguments<'_>) {
        match ctx.caller() {
            Some(caller) => info!(target: "redis", real_caller = caller.file, line = caller.line, "{}", args),
            None => info!(target: "redis", "{}", args),
        }
    }

    fn debug_with_fields(&self, fields: &LogFields, args: fmt::Arguments<'_>) {
        debug!(
            target: "redis",
            real_caller = fields.caller.file,
            line = fields.caller.line,
            "redisTimeCost/us" = fields.elapsed_micros,
            "{}",
            args
        );
    }

    fn error_with_fields(&self, fields: &LogFields, args: fmt::Arguments<'_>) {
        error!(
            target: "redis",
            real_caller = fields.caller.file,
            line = fields.caller.line,
            "redisTimeCost/us" = fields.elapsed_micros,
            "{}",
            args
        );
    }
}

/// Chooses the logger for a call from its context
pub type ContextLogger = Arc<dyn Fn(&CallContext) -> Arc<dyn Logger> + Send + Sync>;

/// Swappable reference to the active logger.
///
/// A caller that already loaded the logger keeps using it after a swap; only
/// later loads see the replacement.
pub struct LoggerSlot {
    active: RwLock<Arc<dyn Logger>>,
}

impl LoggerSlot {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            active: RwLock::new(logger),
        }
    }

    pub fn load(&self) -> Arc<dyn Logger> {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn store(&self, logger: Arc<dyn Logger>) {
        *self.active.write().unwrap_or_else(PoisonError::into_inner) = logger;
    }
}

impl Default for LoggerSlot {
    fn default() -> Self {
        Self::new(Arc::new(TracingLogger))
    }
}

impl fmt::Debug for LoggerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerSlot").finish_non_exhaustive()
    }
}
