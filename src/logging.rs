//! log4rs setup for the headless runner.

use anyhow::Context;
use log::LevelFilter;
use log4rs::{
    append::{console::ConsoleAppender, file::FileAppender},
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
};

const PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} {l} {t} {m}{n}";

/// Level from `DOTLINK_LOG_LEVEL`, defaulting to `info`.
pub fn level_from_env() -> LevelFilter {
    std::env::var("DOTLINK_LOG_LEVEL")
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(LevelFilter::Info)
}

/// Install a console appender, plus a file appender when `file_path` is set.
pub fn init_log(level: LevelFilter, file_path: Option<&str>) -> anyhow::Result<()> {
    let console = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(PATTERN)))
        .build();

    let mut builder = Config::builder().appender(
        Appender::builder()
            .filter(Box::new(ThresholdFilter::new(level)))
            .build("console", Box::new(console)),
    );
    let mut root = Root::builder().appender("console");

    if let Some(path) = file_path {
        let logfile = FileAppender::builder()
            .encoder(Box::new(PatternEncoder::new(PATTERN)))
            .build(path)
            .with_context(|| format!("failed to open log file {path}"))?;
        builder = builder.appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(level)))
                .build("logfile", Box::new(logfile)),
        );
        root = root.appender("logfile");
    }

    let config = builder
        .build(root.build(level))
        .context("invalid log configuration")?;
    log4rs::init_config(config).context("logger already initialized")?;
    Ok(())
}

/// Initialize from `DOTLINK_LOG_LEVEL` and `DOTLINK_LOG_PATH`.
pub fn init_from_env() -> anyhow::Result<()> {
    let path = std::env::var("DOTLINK_LOG_PATH").ok();
    init_log(level_from_env(), path.as_deref())
}
