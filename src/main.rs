// Probe binary: run one command through the interceptor

use anyhow::Context;
use clap::Parser;
use redis_interceptor::{CallContext, Config, RedisOp};
use tracing::info;

/// Run a single Redis command through the logging hook
#[derive(Parser, Debug)]
#[command(name = "redis-interceptor", version)]
struct Cli {
    /// Redis URL, overrides REDIS_URL
    #[arg(long)]
    url: Option<String>,

    /// Log every command, not only failures
    #[arg(long)]
    debug: bool,

    /// Additional commands to reject before execution
    #[arg(long = "disable", value_delimiter = ',')]
    disabled: Vec<String>,

    /// Command and arguments, e.g. `GET greeting`
    #[arg(required = true, trailing_var_arg = true)]
    command: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::from_env().context("Configuration error")?;
    if let Some(url) = cli.url {
        config.redis_url = url;
        config.validate().context("Configuration error")?;
    }
    config.debug |= cli.debug;
    let config = config.with_disabled_commands(cli.disabled);

    redis_interceptor::logging::init_tracing(&config)?;
    info!(redis_url = %config.redis_url, "Starting redis-interceptor probe");

    let op = RedisOp::init(config).await.context("Redis initialization failed")?;

    let mut cmd = redis::cmd(&cli.command[0]);
    for arg in &cli.command[1..] {
        cmd.arg(arg);
    }

    match op.execute(&CallContext::background(), &cmd).await? {
        redis::Value::Nil => println!("(nil)"),
        value => println!("{:?}", value),
    }

    Ok(())
}
