//! # Stats Server
//! src/lib.rs
//!
//! Servidor HTTP que responde consultas estadísticas sobre el dataset
//! "Nutrition, Physical Activity, and Obesity" de EE.UU. Cada consulta se
//! encola como job en un pool de hilos; el cliente recibe un ID y luego pide
//! el resultado.
//!
//! ## Arquitectura
//!
//! - `http`: parsing de requests y construcción de responses
//! - `router`: mapeo (método, path) → handler
//! - `server`: estado compartido, tabla de rutas y loop TCP
//! - `jobs`: registro, cola, workers, persistencia de resultados y shutdown
//! - `commands`: consultas tipadas y agregaciones sobre el dataset
//! - `dataset`: carga del CSV
//! - `config` / `logging`: configuración CLI/env y subscriber de `tracing`
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use stats_server::config::Config;
//! use stats_server::dataset::Dataset;
//! use stats_server::jobs::{FsResultStore, JobManagerConfig};
//! use stats_server::server::{AppState, Server};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let state = AppState::new(
//!     Dataset::load(&config.dataset)?,
//!     FsResultStore::new(&config.results_dir)?,
//!     JobManagerConfig::from_config(&config),
//! )?;
//!
//! Server::bind(&config.address(), Arc::new(state))?.run()?;
//! # Ok(())
//! # }
//! ```

pub mod commands;
pub mod config;
pub mod dataset;
pub mod http;
pub mod jobs;
pub mod logging;
pub mod router;
pub mod server;
