//! fetchpane: interactive terminal HTTP viewer.

use anyhow::Context;
use clap::builder::RangedU64ValueParser;
use clap::{Args, Parser};
use fetchpane::logging::{self, LogConfig, LogLevel};
use fetchpane::terminal::install_panic_hook;
use fetchpane::{Engine, EngineConfig};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "fetchpane",
    about = "Fetch URLs in the background and page through the responses",
    version
)]
struct Cli {
    #[arg(
        long,
        value_name = "N",
        default_value_t = fetchpane::buffer::DEFAULT_CAPACITY,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..),
        help = "Number of responses kept for the session"
    )]
    capacity: usize,

    #[arg(
        long,
        value_name = "SECS",
        default_value_t = 10,
        help = "Longest single wait of the fetch worker"
    )]
    liveness_secs: u64,

    #[arg(
        long,
        value_name = "SECS",
        default_value_t = 60,
        help = "Abort a transfer after this many seconds (0 disables the limit)"
    )]
    timeout_secs: u64,

    #[arg(long, help = "Draw on the primary screen instead of the alternate one")]
    no_alt_screen: bool,

    #[arg(long, help = "Ignore the system proxy settings")]
    no_proxy: bool,

    #[command(flatten)]
    logging: LoggingArgs,

    /// URLs fetched at startup, in order, as if typed.
    #[arg(value_name = "URL")]
    urls: Vec<String>,
}

#[derive(Args, Debug, Clone)]
struct LoggingArgs {
    #[arg(
        long = "log-level",
        value_enum,
        default_value_t = LogLevel::Info,
        help = "Minimum log level (error, warn, info, debug, trace)"
    )]
    level: LogLevel,

    #[arg(
        long = "log-file",
        value_name = "PATH",
        help = "Append logs to the specified file"
    )]
    file: Option<PathBuf>,
}

impl Cli {
    fn engine_config(&self) -> EngineConfig {
        let mut config = EngineConfig {
            capacity: self.capacity,
            liveness_timeout: Duration::from_secs(self.liveness_secs.max(1)),
            alternate_screen: !self.no_alt_screen,
            ..EngineConfig::default()
        };
        config.http.timeout =
            (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs));
        config.http.use_system_proxy = !self.no_proxy;
        config
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    install_panic_hook();

    logging::init(&LogConfig {
        level: cli.logging.level,
        file: cli.logging.file.clone(),
    })
    .context("failed to initialise logging")?;

    let mut engine =
        Engine::with_config(cli.engine_config()).context("failed to start fetchpane")?;
    for url in cli.urls {
        engine.submit(url).context("failed to queue startup URL")?;
    }

    engine.run().context("fetchpane stopped with an error")
}
