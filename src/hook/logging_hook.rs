// Logging and filtering hook

use crate::core::context::{CallContext, CallerSite};
use crate::core::errors::HookError;
use crate::core::models::{join_pipeline_args, CommandRecord};
use crate::engine::command_filter::DisabledCommands;
use crate::hook::CommandHook;
use crate::logging::{ContextLogger, LogFields, Logger, LoggerSlot};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

const UNKNOWN_CALLER: CallerSite = CallerSite {
    file: "unknown",
    line: 0,
};

/// Hook that rejects disabled commands and logs failed or debugged ones.
///
/// A command is logged when it failed, when its context carries the debug
/// override, or when the shared debug flag is on. Failures go out at error
/// level, everything else at debug level.
pub struct LoggingHook {
    disabled: DisabledCommands,
    debug: Arc<AtomicBool>,
    logger: Arc<LoggerSlot>,
    context_logger: Option<ContextLogger>,
}

impl LoggingHook {
    pub fn new(
        disabled: DisabledCommands,
        debug: Arc<AtomicBool>,
        logger: Arc<LoggerSlot>,
        context_logger: Option<ContextLogger>,
    ) -> Self {
        Self {
            disabled,
            debug,
            logger,
            context_logger,
        }
    }

    pub fn disabled(&self) -> &DisabledCommands {
        &self.disabled
    }

    fn debug_on(&self, ctx: &CallContext) -> bool {
        ctx.debug() || self.debug.load(Ordering::Relaxed)
    }

    fn logger_for(&self, ctx: &CallContext) -> Arc<dyn Logger> {
        match &self.context_logger {
            Some(pick) => pick(ctx),
            None => self.logger.load(),
        }
    }

    fn fields(ctx: &CallContext) -> LogFields {
        LogFields::new(ctx.caller().unwrap_or(UNKNOWN_CALLER), ctx.elapsed_micros())
    }
}

impl CommandHook for LoggingHook {
    fn before_process(&self, ctx: &CallContext, cmd: &CommandRecord) -> Result<CallContext, HookError> {
        let ctx = ctx.started_now();
        if self.disabled.is_disabled(&cmd.name) {
            return Err(HookError::CommandDisabled {
                command: cmd.name.clone(),
            });
        }
        Ok(ctx)
    }

    fn after_process(&self, ctx: &CallContext, cmd: &CommandRecord) {
        if !cmd.is_failed() && !self.debug_on(ctx) {
            return;
        }

        let logger = self.logger_for(ctx);
        let fields = Self::fields(ctx);
        match &cmd.failure {
            Some(failure) => logger.error_with_fields(
                &fields,
                format_args!("redis error:cmd:{},err:{}", cmd.display_args(), failure),
            ),
            None => logger.debug_with_fields(&fields, format_args!("cmd:{}", cmd.display_args())),
        }
    }

    fn before_process_pipeline(
        &self,
        ctx: &CallContext,
        cmds: &[CommandRecord],
    ) -> Result<CallContext, HookError> {
        let ctx = ctx.started_now();
        if let Some(name) = self
            .disabled
            .first_disabled(cmds.iter().map(|cmd| cmd.name.as_str()))
        {
            return Err(HookError::CommandDisabled {
                command: name.to_string(),
            });
        }
        Ok(ctx)
    }

    fn after_process_pipeline(&self, ctx: &CallContext, cmds: &[CommandRecord]) {
        // Only the first failure of a batch is reported.
        let first_failed = cmds.iter().find(|cmd| cmd.is_failed());
        if first_failed.is_none() && !self.debug_on(ctx) {
            return;
        }

        let logger = self.logger_for(ctx);
        let fields = Self::fields(ctx);
        match first_failed.and_then(|cmd| cmd.failure.as_ref().map(|failure| (cmd, failure))) {
            Some((cmd, failure)) => logger.error_with_fields(
                &fields,
                format_args!("redis error:cmd:{},err:{}", cmd.display_args(), failure),
            ),
            None => logger.debug_with_fields(
                &fields,
                format_args!("redis pipeline cmds:{}", join_pipeline_args(cmds)),
            ),
        }
    }
}
