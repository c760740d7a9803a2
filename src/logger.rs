use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::append::rolling_file::policy::compound::{
    CompoundPolicy, roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger,
};
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::path::Path;

use crate::errors::GenError;

pub const LOG_FILE_STEM: &str = "usergen";
const PATTERN: &str = "[{d(%d-%m-%Y %H:%M:%S)}] [{l}] {m}{n}";
const ROLL_SIZE: u64 = 10 * 1024 * 1024;
const DEFAULT_RETENTION: u32 = 7;

/// Parse `error|warn|info|debug|trace`; anything else is `info`.
pub fn parse_level(level: &str) -> LevelFilter {
    match level.to_ascii_lowercase().as_str() {
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

/// Route logs to the console and to a rolling `{dir}/usergen.log`.
///
/// # Errors
/// Returns an error if the log directory cannot be created, an appender fails
/// to build, or a logger is already installed.
pub fn configure_logging(dir: &Path, level: LevelFilter) -> Result<(), GenError> {
    std::fs::create_dir_all(dir)?;
    let roller = FixedWindowRoller::builder()
        .build(&format!("{}", dir.join(format!("{LOG_FILE_STEM}.{{}}.log")).display()), DEFAULT_RETENTION)
        .map_err(|e| GenError::Logger(e.to_string()))?;
    let policy = CompoundPolicy::new(Box::new(SizeTrigger::new(ROLL_SIZE)), Box::new(roller));
    let file = RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(PATTERN)))
        .build(dir.join(format!("{LOG_FILE_STEM}.log")), Box::new(policy))?;
    let console = ConsoleAppender::builder().encoder(Box::new(PatternEncoder::new(PATTERN))).build();

    let config = Config::builder()
        .appender(Appender::builder().build("file", Box::new(file)))
        .appender(Appender::builder().build("console", Box::new(console)))
        .build(Root::builder().appender("file").appender("console").build(level))
        .map_err(|e| GenError::Logger(e.to_string()))?;
    log4rs::init_config(config).map_err(|e| GenError::Logger(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_level_defaults_to_info() {
        assert_eq!(parse_level("DEBUG"), LevelFilter::Debug);
        assert_eq!(parse_level("warn"), LevelFilter::Warn);
        assert_eq!(parse_level("verbose"), LevelFilter::Info);
    }
}
