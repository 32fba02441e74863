use std::path::PathBuf;

use bevy::prelude::*;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

pub(crate) struct LogPlugin {
    directory: PathBuf,
}

impl LogPlugin {
    pub(crate) fn new(directory: PathBuf) -> Self {
        Self { directory }
    }
}

/// Dropping the guard stops the file writer.
#[derive(Resource)]
pub(crate) struct CurrentLogHandle {
    #[allow(dead_code)]
    guard: WorkerGuard,
}

impl Plugin for LogPlugin {
    fn build(&self, app: &mut App) {
        let file_name = log_file_name(chrono::Local::now());
        let file_appender = tracing_appender::rolling::never(&self.directory, file_name);
        let (non_blocking_log_writer, guard) = tracing_appender::non_blocking(file_appender);

        let collector = tracing_subscriber::registry()
            .with(
                EnvFilter::builder()
                    // INFO unless RUST_LOG is set
                    .with_default_directive(Level::INFO.into())
                    .from_env_lossy(),
            )
            .with(fmt::layer().with_writer(std::io::stdout))
            .with(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(non_blocking_log_writer),
            );

        if let Err(error) = tracing::subscriber::set_global_default(collector) {
            // Logging is not available yet.
            eprintln!("Unable to set a global log collector: {error}");
            return;
        }

        info!("Logging to {}", self.directory.display());
        app.insert_resource(CurrentLogHandle { guard });
    }
}

fn log_file_name<Tz>(time: chrono::DateTime<Tz>) -> PathBuf
where
    Tz: chrono::TimeZone,
    Tz::Offset: std::fmt::Display,
{
    time.format("%Y-%m-%d_%H-%M-%S.log").to_string().into()
}
