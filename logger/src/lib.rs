use std::str::FromStr;

use colored::Colorize;
use common::env_config::Config;
use middleware::logger::LoggerMiddleware;

pub mod middleware {
    pub mod logger;
}

fn level_filter(level: &str) -> log::LevelFilter {
    log::LevelFilter::from_str(level.trim()).unwrap_or(log::LevelFilter::Info)
}

pub fn setup(config: &Config) -> Result<(), fern::InitError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            let color = match record.level() {
                log::Level::Info => "green",
                log::Level::Warn => "yellow",
                log::Level::Error => "red",
                log::Level::Debug => "magenta",
                log::Level::Trace => "bright black",
            };
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d %H:%M:%S]"),
                record.target(),
                record.level().to_string().color(color),
                message
            ))
        })
        .level(level_filter(&config.log_level))
        .level_for("hyper", log::LevelFilter::Off)
        .level_for("sqlx", log::LevelFilter::Warn)
        .level_for("lettre", log::LevelFilter::Warn)
        .level_for("actix_server", log::LevelFilter::Warn)
        .chain(std::io::stdout())
        .chain(fern::log_file(&config.log_file)?)
        .apply()?;
    Ok(())
}

pub fn middleware(console_logging_enabled: bool) -> LoggerMiddleware {
    LoggerMiddleware::new(console_logging_enabled)
}
