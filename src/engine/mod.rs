// Command admission

pub mod command_filter;

pub use command_filter::{DisabledCommands, ALWAYS_DISABLED};
