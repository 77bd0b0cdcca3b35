/*!
 * Logging Module
 * Centralized logging configuration and utilities
 */
pub mod config;
pub mod middleware;

use std::io;
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing::Subscriber;
use tracing_subscriber::{
    filter::LevelFilter, fmt, fmt::MakeWriter, layer::SubscriberExt, registry::LookupSpan,
    util::SubscriberInitExt, EnvFilter, Layer,
};

use config::LogConfig;

/// JSON layer that only passes ERROR events.
fn error_layer<S, W>(writer: W) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    fmt::layer()
        .json()
        .with_writer(writer)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_filter(LevelFilter::ERROR)
}

/// Initialize the logging system.
///
/// The returned guards flush the background writers; hold them until shutdown.
pub fn init(config: &LogConfig) -> Vec<WorkerGuard> {
    std::fs::create_dir_all(&config.directory).ok();

    // File appender for all logs
    let file_appender = rolling::daily(&config.directory, "app.log");
    let (file_writer, file_guard) = non_blocking(file_appender);

    // File appender for errors only
    let error_appender = rolling::daily(&config.directory, "error.log");
    let (error_writer, error_guard) = non_blocking(error_appender);

    let (console_writer, console_guard) = non_blocking(io::stdout());

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_directive()));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if config.json {
        let file_layer = fmt::layer()
            .json()
            .with_writer(file_writer)
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true);

        let console_layer = fmt::layer()
            .json()
            .with_writer(console_writer)
            .with_target(false);

        subscriber
            .with(file_layer)
            .with(error_layer(error_writer))
            .with(console_layer)
            .init();
    } else {
        let file_layer = fmt::layer()
            .with_writer(file_writer)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false);

        let console_layer = fmt::layer()
            .with_writer(console_writer)
            .with_target(true)
            .pretty();

        subscriber
            .with(file_layer)
            .with(error_layer(error_writer))
            .with(console_layer)
            .init();
    }

    tracing::info!(
        level = %config.level,
        json = config.json,
        "logging initialized"
    );

    vec![file_guard, error_guard, console_guard]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::sync::Mutex;

    fn emit_into<S>(subscriber: S)
    where
        S: Subscriber + Send + Sync + 'static,
    {
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("portfolio viewed");
            tracing::error!(portfolio_id = "p-1", "disk full");
        });
    }

    #[test]
    fn test_error_layer_keeps_only_errors_on_json_stack() {
        let dir = tempfile::TempDir::new().unwrap();
        let errors = dir.path().join("error.log");
        let all = dir.path().join("app.log");

        emit_into(
            tracing_subscriber::registry()
                .with(EnvFilter::new("trace"))
                .with(fmt::layer().json().with_writer(Mutex::new(File::create(&all).unwrap())))
                .with(error_layer(Mutex::new(File::create(&errors).unwrap()))),
        );

        let error_log = std::fs::read_to_string(&errors).unwrap();
        assert!(error_log.contains("disk full"));
        assert!(!error_log.contains("portfolio viewed"));
        assert!(std::fs::read_to_string(&all).unwrap().contains("portfolio viewed"));
    }

    #[test]
    fn test_error_layer_stacks_on_text_layers() {
        let dir = tempfile::TempDir::new().unwrap();
        let errors = dir.path().join("error.log");

        emit_into(
            tracing_subscriber::registry()
                .with(EnvFilter::new("info"))
                .with(
                    fmt::layer()
                        .with_writer(Mutex::new(File::create(dir.path().join("app.log")).unwrap()))
                        .with_ansi(false),
                )
                .with(error_layer(Mutex::new(File::create(&errors).unwrap())))
                .with(fmt::layer().with_writer(std::io::sink).pretty()),
        );

        let error_log = std::fs::read_to_string(&errors).unwrap();
        assert_eq!(error_log.lines().count(), 1);
        assert!(error_log.contains("\"portfolio_id\":\"p-1\""));
    }
}
