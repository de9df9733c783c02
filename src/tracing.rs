use crate::config::{AppConfig, LoggingConfig, SentryConfig};
use anyhow::{anyhow, Result};
use std::io;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Keeps Sentry and the non-blocking log writer alive; drop on shutdown to flush
pub struct TelemetryGuard {
    _sentry: Option<sentry::ClientInitGuard>,
    _log_writer: Option<WorkerGuard>,
}

/// Install the global subscriber: env filter, formatted output and the Sentry layer
pub fn init_tracing(config: &AppConfig) -> Result<TelemetryGuard> {
    let logging_config = &config.logging;

    let sentry_guard = init_sentry(&config.sentry)?;
    let env_filter = create_env_filter(logging_config);
    let (writer, log_guard) = create_writer(logging_config)?;

    let base = fmt::layer()
        .with_writer(writer)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(logging_config.include_location)
        .with_line_number(logging_config.include_location)
        .with_span_events(FmtSpan::CLOSE);

    let fmt_layer = match logging_config.format.to_lowercase().as_str() {
        "pretty" => base.pretty().boxed(),
        "compact" => base.compact().boxed(),
        _ => base.json().boxed(),
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .with(create_sentry_layer())
        .try_init()
        .map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))?;

    tracing::info!(
        level = %logging_config.level,
        format = %logging_config.format,
        target = %logging_config.target,
        sentry_enabled = config.sentry.is_enabled(),
        "Tracing initialized"
    );

    if config.sentry.is_enabled() {
        tracing::info!(dsn = %mask_dsn(&config.sentry.dsn), "Sentry initialized");
    }

    Ok(TelemetryGuard {
        _sentry: sentry_guard,
        _log_writer: log_guard,
    })
}

fn init_sentry(config: &SentryConfig) -> Result<Option<sentry::ClientInitGuard>> {
    if !config.is_enabled() {
        return Ok(None);
    }

    let guard = sentry::init(sentry::ClientOptions {
        dsn: Some(config.dsn.parse()?),
        environment: Some(config.environment.clone().into()),
        release: Some(
            config
                .release
                .clone()
                .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string())
                .into(),
        ),
        traces_sample_rate: config.traces_sample_rate,
        debug: config.debug,
        ..Default::default()
    });

    sentry::configure_scope(|scope| {
        scope.set_tag("service", env!("CARGO_PKG_NAME"));
    });

    Ok(Some(guard))
}

/// Mask the key part of a DSN for logging
fn mask_dsn(dsn: &str) -> String {
    match dsn.parse::<url::Url>() {
        Ok(parsed) => format!(
            "{}://***@{}",
            parsed.scheme(),
            parsed.host_str().unwrap_or("unknown")
        ),
        Err(_) => "***".to_string(),
    }
}

/// Errors become Sentry events; info and above become breadcrumbs
pub(crate) fn create_sentry_layer<S>() -> sentry::integrations::tracing::SentryLayer<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    use sentry::integrations::tracing::EventFilter;

    sentry::integrations::tracing::layer().event_filter(|md| match *md.level() {
        tracing::Level::ERROR => EventFilter::Event,
        tracing::Level::WARN | tracing::Level::INFO => EventFilter::Breadcrumb,
        _ => EventFilter::Ignore,
    })
}

/// `RUST_LOG` wins over the configured level; unparsable levels fall back to info
fn create_env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

fn create_writer(config: &LoggingConfig) -> Result<(BoxMakeWriter, Option<WorkerGuard>)> {
    match config.target.to_lowercase().as_str() {
        "stderr" => Ok((BoxMakeWriter::new(io::stderr), None)),
        "file" => {
            let file_path = config
                .file_path
                .as_ref()
                .ok_or_else(|| anyhow!("File path is required when target is 'file'"))?;

            let path = Path::new(file_path);
            let directory = path
                .parent()
                .ok_or_else(|| anyhow!("Invalid file path: {}", file_path))?;
            let filename = path
                .file_name()
                .ok_or_else(|| anyhow!("Invalid filename: {}", file_path))?;

            std::fs::create_dir_all(directory)?;

            let appender = tracing_appender::rolling::daily(directory, filename);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            Ok((BoxMakeWriter::new(non_blocking), Some(guard)))
        }
        _ => Ok((BoxMakeWriter::new(io::stdout), None)),
    }
}
