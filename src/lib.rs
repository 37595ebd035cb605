// Library root for the Redis command interceptor

pub mod client;
pub mod config;
pub mod core;
pub mod engine;
pub mod hook;
pub mod logging;
pub mod state;

pub use client::RedisOp;
pub use config::Config;
pub use crate::core::context::{CallContext, CallerSite};
pub use crate::core::errors::{normalize_nil_error, HookError};
