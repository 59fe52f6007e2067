//! Structured logging and tracing for Serre
//!
//! Console and daily-rotated file output on top of `tracing-subscriber`, plus
//! a small component-tagged logger used by the serving layer.

use crate::config::LoggingConfig;
use crate::error::{Result, SerreError};
use std::path::Path;
use tracing::{Level, info};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod level;
mod state;
mod structured;

pub use level::parse_log_level;
pub use state::is_initialized;
pub use structured::{LogContext, StructuredLogger, get_logger, get_logger_with_context};

use level::{min_level, resolve_level};
use state::{INIT_ERROR, INIT_ONCE, LOG_GUARD};

/// Initialize logging system based on configuration
///
/// Runs once per process; later calls return the outcome of the first one.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    INIT_ONCE.call_once(|| {
        let init_result = (|| -> Result<()> {
            let base_level = parse_log_level(&config.level)?;
            let console_level = resolve_level(config.console_level.as_ref(), base_level);
            let file_level = resolve_level(config.file_level.as_ref(), base_level);
            let filter = build_env_filter(min_level(console_level, file_level));

            if should_use_console_only() {
                init_console_only_logging(filter, config.json_format, console_level);
                return Ok(());
            }

            init_file_logging(config, filter, console_level, file_level)
        })();

        if let Err(e) = init_result {
            let _ = INIT_ERROR.set(e.to_string());
        }
    });

    if let Some(err) = INIT_ERROR.get() {
        return Err(SerreError::config(err.clone()));
    }
    Ok(())
}

fn build_env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("serre={},tokio_modbus=warn,tower_http=info", level).into()
    })
}

fn should_use_console_only() -> bool {
    cfg!(test) || std::env::var_os("SERRE_DISABLE_FILE_LOG").is_some()
}

fn console_layer<S>(json_format: bool, level: Level) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a> + 'static,
{
    let layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false);
    if json_format {
        layer
            .json()
            .with_filter(LevelFilter::from_level(level))
            .boxed()
    } else {
        layer.with_filter(LevelFilter::from_level(level)).boxed()
    }
}

fn init_console_only_logging(filter: EnvFilter, json_format: bool, console_level: Level) {
    let result = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer(json_format, console_level))
        .try_init();

    // Another subscriber (e.g. a test harness) may already be installed
    if result.is_ok() {
        info!(
            "Logging initialized - console_level: {:?}, console-only",
            console_level
        );
    }
}

fn init_file_logging(
    config: &LoggingConfig,
    filter: EnvFilter,
    console_level: Level,
    file_level: Level,
) -> Result<()> {
    let log_dir = {
        // A path with an extension names a file; rotate next to it
        let p = Path::new(&config.file);
        if p.extension().is_some() {
            p.parent().unwrap_or(p)
        } else {
            p
        }
    };

    let file_appender = rolling::Builder::new()
        .rotation(rolling::Rotation::DAILY)
        .filename_prefix("serre")
        .filename_suffix("log")
        .max_log_files(config.backup_count.max(1) as usize)
        .build(log_dir)
        .map_err(|e| SerreError::io(format!("Failed to create log file appender: {}", e)))?;

    let (non_blocking_appender, guard) = non_blocking(file_appender);
    let _ = LOG_GUARD.set(guard);

    let file_layer = {
        let base = fmt::layer()
            .with_writer(non_blocking_appender)
            .with_ansi(false)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false);
        if config.json_format {
            base.json()
                .with_filter(LevelFilter::from_level(file_level))
                .boxed()
        } else {
            base.with_filter(LevelFilter::from_level(file_level))
                .boxed()
        }
    };

    let subscriber = tracing_subscriber::registry().with(filter).with(file_layer);

    let init = if config.console_output {
        subscriber
            .with(console_layer(config.json_format, console_level))
            .try_init()
    } else {
        subscriber.try_init()
    };
    init.map_err(|e| SerreError::config(format!("Failed to install subscriber: {}", e)))?;

    info!(
        "Logging initialized - console_level: {:?}, file_level: {:?}, dir: {}",
        console_level,
        file_level,
        log_dir.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_level() {
        assert_eq!(parse_log_level("DEBUG").unwrap(), Level::DEBUG);
        assert_eq!(parse_log_level("info").unwrap(), Level::INFO);
        assert_eq!(parse_log_level("WARNING").unwrap(), Level::WARN);
        assert!(parse_log_level("verbose").is_err());
    }

    #[test]
    fn level_overrides_fall_back_to_base() {
        let bad = "loud".to_string();
        let debug = "debug".to_string();
        assert_eq!(resolve_level(None, Level::INFO), Level::INFO);
        assert_eq!(resolve_level(Some(&bad), Level::WARN), Level::WARN);
        assert_eq!(resolve_level(Some(&debug), Level::WARN), Level::DEBUG);
        assert_eq!(min_level(Level::ERROR, Level::DEBUG), Level::DEBUG);
    }

    #[test]
    fn test_log_context() {
        let context = LogContext::new("web")
            .with_user("alice")
            .with_device("10.0.0.2", 502)
            .with_field("route", "/api/info".to_string());

        let logger = get_logger_with_context(context);
        assert_eq!(
            logger.format_fields(),
            "component=web,user=alice,device=10.0.0.2:502,route=/api/info"
        );
    }

    #[test]
    fn test_structured_logger() {
        init_logging(&LoggingConfig::default()).ok();
        assert!(is_initialized());

        let logger = get_logger("test_component");
        assert_eq!(logger.context().component, "test_component");

        // These should not panic
        logger.info("Test info message");
        logger.debug("Test debug message");
        logger.warn("Test warning message");
        logger.error("Test error message");
    }
}
