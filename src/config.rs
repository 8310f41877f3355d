//! # Configuración del Servidor
//! src/config.rs
//!
//! Argumentos CLI con fallback a variables de entorno (y a un `.env` si
//! existe, cargado en `main`).
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./stats_server --port 8080 --workers 4 --dataset ./data/nutrition.csv
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! HTTP_PORT=8080 TP_NUM_OF_THREADS=4 RESULTS_DIR=/tmp/results ./stats_server
//! ```

use clap::Parser;
use std::path::Path;
use tracing::info;

/// Errores de validación de la configuración
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("port must be > 0")]
    InvalidPort,

    #[error("poll interval must be > 0 ms")]
    InvalidPollInterval,

    #[error("dataset path must not be empty")]
    EmptyDatasetPath,

    #[error("results directory must not be empty")]
    EmptyResultsDir,
}

/// Número de workers por defecto: los núcleos disponibles
pub fn default_pool_size() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Configuración del servidor
#[derive(Debug, Clone, Parser)]
#[command(name = "stats_server")]
#[command(about = "Servidor HTTP de estadísticas de nutrición y actividad física con pool de jobs")]
#[command(version)]
pub struct Config {
    /// Host/IP en el que escucha
    #[arg(long, default_value = "127.0.0.1", env = "HTTP_HOST")]
    pub host: String,

    /// Puerto en el que escucha el servidor
    #[arg(short, long, default_value = "5000", env = "HTTP_PORT")]
    pub port: u16,

    /// CSV con el dataset
    #[arg(
        long,
        default_value = "./nutrition_activity_obesity_usa_subset.csv",
        env = "DATASET_PATH"
    )]
    pub dataset: String,

    /// Directorio donde se escriben los resultados de los jobs
    #[arg(long = "results-dir", default_value = "./results", env = "RESULTS_DIR")]
    pub results_dir: String,

    /// Número de workers; si falta, es 0 o no es un entero, se usan los núcleos
    #[arg(long, env = "TP_NUM_OF_THREADS")]
    pub workers: Option<String>,

    /// Cada cuánto un worker ocioso revisa la señal de shutdown
    #[arg(long = "poll-interval-ms", default_value = "1000", env = "TP_POLL_INTERVAL_MS")]
    pub poll_interval_ms: u64,

    /// Archivo de log (vacío = solo stdout)
    #[arg(long = "log-file", default_value = "webserver.log", env = "LOG_FILE")]
    pub log_file: String,
}

impl Config {
    /// Dirección completa para bind (host:port)
    ///
    /// ```
    /// use stats_server::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "127.0.0.1:5000");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Número efectivo de workers
    pub fn pool_size(&self) -> usize {
        self.workers
            .as_deref()
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .filter(|&n| n > 0)
            .unwrap_or_else(default_pool_size)
    }

    pub fn log_file_path(&self) -> Option<&Path> {
        let trimmed = self.log_file.trim();
        (!trimmed.is_empty()).then(|| Path::new(trimmed))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidPollInterval);
        }
        if self.dataset.trim().is_empty() {
            return Err(ConfigError::EmptyDatasetPath);
        }
        if self.results_dir.trim().is_empty() {
            return Err(ConfigError::EmptyResultsDir);
        }
        Ok(())
    }

    /// Resumen de la configuración en el log
    pub fn log_summary(&self) {
        info!(
            address = %self.address(),
            dataset = %self.dataset,
            results_dir = %self.results_dir,
            workers = self.pool_size(),
            poll_interval_ms = self.poll_interval_ms,
            log_file = %self.log_file,
            "configuration loaded"
        );
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            dataset: "./nutrition_activity_obesity_usa_subset.csv".to_string(),
            results_dir: "./results".to_string(),
            workers: None,
            poll_interval_ms: 1000,
            log_file: "webserver.log".to_string(),
        }
    }
}
