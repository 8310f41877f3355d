//! # Logging
//! src/logging.rs
//!
//! Subscriber de `tracing`: filtro por `RUST_LOG` (por defecto
//! `stats_server=info`), salida a stdout y, si hay `log_file`, una copia sin
//! colores en ese archivo escrita por un hilo aparte. El archivo rota cada
//! día y se conservan a lo sumo `MAX_LOG_FILES`. Timestamps en UTC.

use crate::config::Config;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{self, RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "stats_server=info";

/// Archivo actual más cinco rotados
const MAX_LOG_FILES: usize = 6;

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("invalid log file path: {0}")]
    InvalidPath(String),

    #[error("failed to open log file: {0}")]
    Appender(#[from] rolling::InitError),

    #[error("failed to install tracing subscriber: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

/// Mantiene vivo el writer del archivo; al soltarlo se vacía el buffer
#[must_use = "dropping the guard stops file logging"]
pub struct LogGuard {
    _file: Option<WorkerGuard>,
}

/// Separa `path` en (directorio, nombre de archivo)
fn split_log_path(path: &Path) -> Result<(&Path, &std::ffi::OsStr), LogError> {
    let name = path
        .file_name()
        .ok_or_else(|| LogError::InvalidPath(path.display().to_string()))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    Ok((dir, name))
}

/// Appender diario para `path`; los archivos quedan como `<nombre>.AAAA-MM-DD`
fn file_appender(path: &Path) -> Result<RollingFileAppender, LogError> {
    let (dir, name) = split_log_path(path)?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(name.to_string_lossy())
        .max_log_files(MAX_LOG_FILES)
        .build(dir)?;
    Ok(appender)
}

/// Instala el subscriber global
pub fn init(config: &Config) -> Result<LogGuard, LogError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let (file_layer, guard) = match config.log_file_path() {
        Some(path) => {
            let (writer, guard) = tracing_appender::non_blocking(file_appender(path)?);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_timer(fmt::time::SystemTime);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_timer(fmt::time::SystemTime))
        .with(file_layer)
        .try_init()?;

    Ok(LogGuard { _file: guard })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_log_path() {
        let (dir, name) = split_log_path(Path::new("webserver.log")).unwrap();
        assert_eq!(dir, Path::new("."));
        assert_eq!(name, "webserver.log");

        let (dir, name) = split_log_path(Path::new("/var/log/stats/server.log")).unwrap();
        assert_eq!(dir, Path::new("/var/log/stats"));
        assert_eq!(name, "server.log");
    }

    #[test]
    fn test_split_log_path_without_file_name() {
        assert!(matches!(
            split_log_path(Path::new("/")),
            Err(LogError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_file_appender_writes_dated_file() {
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let mut appender = file_appender(&dir.path().join("webserver.log")).unwrap();
        appender.write_all(b"job added to the queue\n").unwrap();
        appender.flush().unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 1);
        assert!(names[0].starts_with("webserver.log."), "got {:?}", names);

        let content = std::fs::read_to_string(dir.path().join(&names[0])).unwrap();
        assert_eq!(content, "job added to the queue\n");
    }
}
