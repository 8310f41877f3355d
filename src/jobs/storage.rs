//! # Persistencia de Resultados
//! src/jobs/storage.rs
//!
//! Sumidero de resultados indexado por ID de job. El pool escribe un JSON
//! por job terminado y nunca lee lo que escribió; la lectura la hace la
//! capa HTTP (`/api/get_results/<job_id>`).

use crate::jobs::types::JobId;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Error al persistir o leer un resultado
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no result stored for {0}")]
    Missing(JobId),
}

/// Sumidero de resultados
///
/// Cada job escribe una clave distinta, así que las implementaciones deben
/// tolerar escrituras concurrentes.
pub trait ResultStore: Send + Sync {
    fn write(&self, job_id: &JobId, value: &Value) -> Result<(), StoreError>;
}

/// Un archivo JSON por job dentro de un directorio
#[derive(Debug, Clone)]
pub struct FsResultStore {
    dir: PathBuf,
}

impl FsResultStore {
    /// Crea el store y el directorio si no existe
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Ruta del archivo de resultado de un job
    pub fn path_for(&self, job_id: &JobId) -> PathBuf {
        self.dir.join(job_id.to_string())
    }

    /// Lee el resultado de un job (camino de consulta, no lo usa el pool)
    pub fn read(&self, job_id: &JobId) -> Result<Value, StoreError> {
        let path = self.path_for(job_id);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::Missing(*job_id));
            }
            Err(e) => return Err(e.into()),
        };

        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

impl ResultStore for FsResultStore {
    fn write(&self, job_id: &JobId, value: &Value) -> Result<(), StoreError> {
        // Archivo temporal primero, luego rename (atómico en Unix)
        let final_path = self.path_for(job_id);
        let temp_path = self.dir.join(format!(".{}.tmp", job_id));

        let written = write_json(&temp_path, value)
            .and_then(|()| fs::rename(&temp_path, &final_path).map_err(StoreError::from));

        if written.is_err() {
            // Sin resultado final no debe quedar el temporal
            let _ = fs::remove_file(&temp_path);
        }
        written
    }
}

fn write_json(path: &Path, value: &Value) -> Result<(), StoreError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}

/// Store en memoria, útil para tests y para correr sin disco
#[derive(Debug, Default)]
pub struct MemoryResultStore {
    results: Mutex<HashMap<JobId, Value>>,
}

impl MemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, job_id: &JobId) -> Option<Value> {
        self.results.lock().get(job_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.results.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResultStore for MemoryResultStore {
    fn write(&self, job_id: &JobId, value: &Value) -> Result<(), StoreError> {
        self.results.lock().insert(*job_id, value.clone());
        Ok(())
    }
}
