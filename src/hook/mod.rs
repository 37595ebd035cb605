// Command interception hooks

pub mod logging_hook;

pub use logging_hook::LoggingHook;

use crate::core::context::CallContext;
use crate::core::errors::HookError;
use crate::core::models::CommandRecord;

/// Callbacks invoked around every command and every pipeline.
///
/// `before_*` runs on the issuing task before anything is sent and may reject
/// the call; the context it returns is the one handed to `after_*`.
/// `after_*` sees the records with their failures filled in.
pub trait CommandHook: Send + Sync {
    fn before_process(&self, ctx: &CallContext, cmd: &CommandRecord) -> Result<CallContext, HookError>;

    fn after_process(&self, ctx: &CallContext, cmd: &CommandRecord);

    fn before_process_pipeline(
        &self,
        ctx: &CallContext,
        cmds: &[CommandRecord],
    ) -> Result<CallContext, HookError>;

    fn after_process_pipeline(&self, ctx: &CallContext, cmds: &[CommandRecord]);
}
