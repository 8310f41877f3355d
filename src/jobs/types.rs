//! # Tipos y Estructuras para el Sistema de Jobs
//! src/jobs/types.rs
//!
//! Define los tipos fundamentales para el manejo de trabajos asíncronos.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Prefijo con el que se renderizan los IDs de job
const JOB_ID_PREFIX: &str = "job_id_";

/// Identificador único de un job
///
/// Se asigna de forma monótona (1, 2, 3, ...) y se muestra como `job_id_<n>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(u64);

impl JobId {
    pub fn new(seq: u64) -> Self {
        Self(seq)
    }

    pub fn seq(&self) -> u64 {
        self.0
    }

    /// Parsea un ID con formato `job_id_<n>`
    ///
    /// # Ejemplo
    /// ```
    /// use stats_server::jobs::JobId;
    ///
    /// assert_eq!(JobId::parse("job_id_7"), Some(JobId::new(7)));
    /// assert_eq!(JobId::parse("job-7"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        s.strip_prefix(JOB_ID_PREFIX)?.parse().ok().map(Self)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", JOB_ID_PREFIX, self.0)
    }
}

impl Serialize for JobId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for JobId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        JobId::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid job id: {}", raw)))
    }
}

/// Estado de un job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Job encolado o ejecutándose
    Running,

    /// Job completado exitosamente
    Done,

    /// Job falló (ejecución o persistencia)
    Error,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Running => "running",
            JobStatus::Done => "done",
            JobStatus::Error => "error",
        }
    }

    /// Verifica si el estado es terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Error)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Foto del estado de un job en un instante dado
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobSnapshot {
    pub id: JobId,

    pub status: JobStatus,

    /// Resultado (solo cuando `status == Done`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    /// Detalle del error (solo cuando `status == Error`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobSnapshot {
    pub fn running(id: JobId) -> Self {
        Self {
            id,
            status: JobStatus::Running,
            result: None,
            error: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Estado del controlador del pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    /// Acepta y ejecuta jobs
    Active,

    /// Shutdown en curso: no acepta jobs nuevos, termina los encolados
    Draining,

    /// Todos los workers terminaron (terminal)
    Stopped,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_id_display_and_parse() {
        let id = JobId::new(42);
        assert_eq!(id.to_string(), "job_id_42");
        assert_eq!(JobId::parse("job_id_42"), Some(id));
    }

    #[test]
    fn test_job_id_parse_rejects_garbage() {
        assert_eq!(JobId::parse("job_id_"), None);
        assert_eq!(JobId::parse("job_id_abc"), None);
        assert_eq!(JobId::parse("42"), None);
    }

    #[test]
    fn test_job_id_ordering_is_numeric() {
        assert!(JobId::new(2) < JobId::new(10));
    }

    #[test]
    fn test_job_status_serialization() {
        let json = serde_json::to_string(&JobStatus::Running).unwrap();
        assert_eq!(json, "\"running\"");
        let json = serde_json::to_string(&JobId::new(3)).unwrap();
        assert_eq!(json, "\"job_id_3\"");
    }

    #[test]
    fn test_terminal_states() {
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Done.is_terminal());
        assert!(JobStatus::Error.is_terminal());
    }
}
