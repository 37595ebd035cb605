pub mod executor;

pub use executor::{CommandExecutor, RedisExecutor};
