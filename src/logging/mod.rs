// Logging: the hook's logger capability and the tracing backend setup

pub mod logger;
pub mod subscriber;

pub use logger::{ContextLogger, LogFields, Logger, LoggerSlot, TracingLogger, REDIS_TIME_COST};
pub use subscriber::init_tracing;
