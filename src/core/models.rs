// Command records observed by the hook

use redis::{Arg, Cmd, ErrorKind, Pipeline, RedisError};
use std::fmt;

/// Separator appended after each command when a pipeline is logged
pub const PIPELINE_SEPARATOR: &str = ";  ";

/// Cloneable rendering of a `RedisError`
#[derive(Debug, Clone, PartialEq)]
pub struct CommandFailure {
    pub kind: ErrorKind,
    pub code: Option<String>,
    pub message: String,
}

impl From<&RedisError> for CommandFailure {
    fn from(err: &RedisError) -> Self {
        Self {
            kind: err.kind(),
            code: err.code().map(str::to_string),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for CommandFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// A single command as seen by the before/after hooks
#[derive(Debug, Clone, PartialEq)]
pub struct CommandRecord {
    /// Lower-cased command name
    pub name: String,
    /// Every argument, the command name included
    pub args: Vec<String>,
    pub failure: Option<CommandFailure>,
}

impl CommandRecord {
    pub fn new<S: Into<String>>(args: Vec<S>) -> Self {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        let name = args.first().map(|n| n.to_lowercase()).unwrap_or_default();
        Self {
            name,
            args,
            failure: None,
        }
    }

    pub fn from_cmd(cmd: &Cmd) -> Self {
        let args = cmd
            .args_iter()
            .map(|arg| match arg {
                Arg::Simple(bytes) => String::from_utf8_lossy(bytes).into_owned(),
                Arg::Cursor => "0".to_string(),
            })
            .collect::<Vec<_>>();
        Self::new(args)
    }

    pub fn from_pipeline(pipeline: &Pipeline) -> Vec<Self> {
        pipeline.cmd_iter().map(Self::from_cmd).collect()
    }

    pub fn fail(&mut self, err: &RedisError) {
        self.failure = Some(CommandFailure::from(err));
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    /// Arguments as a bracketed, space-separated list: `[set key value]`
    pub fn display_args(&self) -> String {
        format!("[{}]", self.args.join(" "))
    }

    /// Arguments joined by single spaces, with a trailing space per argument
    pub fn joined_args(&self) -> String {
        self.args.iter().fold(String::new(), |mut out, arg| {
            out.push_str(arg);
            out.push(' ');
            out
        })
    }
}

/// All arguments of a batch, each command followed by the pipeline separator
pub fn join_pipeline_args(cmds: &[CommandRecord]) -> String {
    cmds.iter().fold(String::new(), |mut out, cmd| {
        out.push_str(&cmd.joined_args());
        out.push_str(PIPELINE_SEPARATOR);
        out
    })
}
