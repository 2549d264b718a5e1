use anyhow::{Context, Result};
use campus_config::{LogFormat, LoggingConfig};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Filter string for the configured level followed by extra directives
pub fn filter_directives(config: &LoggingConfig) -> String {
    std::iter::once(config.level.to_string())
        .chain(config.directives.iter().map(|d| d.trim().to_string()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Build the env filter. `RUST_LOG` is only consulted when the configured
/// directives do not parse.
pub fn build_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_new(filter_directives(config))
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize logging from configuration
///
/// A subscriber that is already installed is left in place.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let layer = match config.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(false)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .boxed(),
        LogFormat::Text => fmt::layer()
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .boxed(),
    };

    // Use try_init to avoid panic if global subscriber already set
    if let Err(e) = tracing_subscriber::registry()
        .with(build_filter(config))
        .with(layer)
        .try_init()
    {
        tracing::debug!("Global tracing subscriber already initialized, skipping: {}", e);
    }

    Ok(())
}

/// Initialize logging from a level string, for use before the
/// configuration is available
pub fn init_with_level(level: &str) -> Result<()> {
    let config = LoggingConfig {
        level: level
            .parse()
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("invalid log level {}", level))?,
        ..LoggingConfig::default()
    };
    init_logging(&config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_config::LogLevel;

    #[test]
    fn test_filter_directives() {
        let config = LoggingConfig {
            level: LogLevel::Debug,
            directives: vec!["sea_orm=warn".to_string(), " sqlx=error ".to_string()],
            ..LoggingConfig::default()
        };
        assert_eq!(filter_directives(&config), "debug,sea_orm=warn,sqlx=error");
    }

    #[test]
    fn test_build_filter_from_config() {
        let filter = build_filter(&LoggingConfig::default());
        assert_eq!(filter.to_string(), "info");
    }

    #[test]
    fn test_init_twice_is_harmless() {
        let config = LoggingConfig {
            format: LogFormat::Compact,
            ..LoggingConfig::default()
        };
        init_logging(&config).unwrap();
        init_logging(&LoggingConfig::default()).unwrap();
        init_with_level("warn").unwrap();
        assert!(init_with_level("chatty").is_err());
    }
}
