//! # Comandos de Consulta
//! src/commands/mod.rs
//!
//! Cada endpoint `POST /api/<consulta>` se traduce en un [`Command`] con sus
//! entradas ya validadas. El comando se ejecuta dentro de un worker del pool
//! contra el dataset compartido.
//!
//! ## Consultas
//!
//! | Endpoint                    | Requiere `state` |
//! |-----------------------------|------------------|
//! | `states_mean`               | no               |
//! | `state_mean`                | sí               |
//! | `best5`                     | no               |
//! | `worst5`                    | no               |
//! | `global_mean`               | no               |
//! | `diff_from_mean`            | no               |
//! | `state_diff_from_mean`      | sí               |
//! | `mean_by_category`          | no               |
//! | `state_mean_by_category`    | sí               |

pub mod aggregate;
pub mod handlers;

use crate::dataset::Dataset;
use crate::jobs::TaskError;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

/// Tipo de consulta (uno por endpoint)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    StatesMean,
    StateMean,
    Best5,
    Worst5,
    GlobalMean,
    DiffFromMean,
    StateDiffFromMean,
    MeanByCategory,
    StateMeanByCategory,
}

impl QueryKind {
    pub const ALL: [QueryKind; 9] = [
        QueryKind::StatesMean,
        QueryKind::StateMean,
        QueryKind::Best5,
        QueryKind::Worst5,
        QueryKind::GlobalMean,
        QueryKind::DiffFromMean,
        QueryKind::StateDiffFromMean,
        QueryKind::MeanByCategory,
        QueryKind::StateMeanByCategory,
    ];

    /// Nombre del endpoint, sin el prefijo `/api/`
    pub fn name(&self) -> &'static str {
        match self {
            QueryKind::StatesMean => "states_mean",
            QueryKind::StateMean => "state_mean",
            QueryKind::Best5 => "best5",
            QueryKind::Worst5 => "worst5",
            QueryKind::GlobalMean => "global_mean",
            QueryKind::DiffFromMean => "diff_from_mean",
            QueryKind::StateDiffFromMean => "state_diff_from_mean",
            QueryKind::MeanByCategory => "mean_by_category",
            QueryKind::StateMeanByCategory => "state_mean_by_category",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn requires_state(&self) -> bool {
        matches!(
            self,
            QueryKind::StateMean | QueryKind::StateDiffFromMean | QueryKind::StateMeanByCategory
        )
    }
}

/// Cuerpo JSON de un request de consulta
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct QueryParams {
    pub question: String,
    #[serde(default)]
    pub state: Option<String>,
}

/// Consulta con sus entradas ligadas
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    StatesMean { question: String },
    StateMean { question: String, state: String },
    Best5 { question: String },
    Worst5 { question: String },
    GlobalMean { question: String },
    DiffFromMean { question: String },
    StateDiffFromMean { question: String, state: String },
    MeanByCategory { question: String },
    StateMeanByCategory { question: String, state: String },
}

impl Command {
    /// Construye el comando validando que estén las entradas necesarias
    pub fn new(kind: QueryKind, params: QueryParams) -> Result<Self, TaskError> {
        let QueryParams { question, state } = params;

        let state = match (kind.requires_state(), state) {
            (true, Some(state)) => state,
            (true, None) => {
                return Err(TaskError::InvalidInput(format!(
                    "'{}' requires a 'state' field",
                    kind.name()
                )));
            }
            (false, _) => String::new(),
        };

        Ok(match kind {
            QueryKind::StatesMean => Command::StatesMean { question },
            QueryKind::StateMean => Command::StateMean { question, state },
            QueryKind::Best5 => Command::Best5 { question },
            QueryKind::Worst5 => Command::Worst5 { question },
            QueryKind::GlobalMean => Command::GlobalMean { question },
            QueryKind::DiffFromMean => Command::DiffFromMean { question },
            QueryKind::StateDiffFromMean => Command::StateDiffFromMean { question, state },
            QueryKind::MeanByCategory => Command::MeanByCategory { question },
            QueryKind::StateMeanByCategory => Command::StateMeanByCategory { question, state },
        })
    }

    pub fn kind(&self) -> QueryKind {
        match self {
            Command::StatesMean { .. } => QueryKind::StatesMean,
            Command::StateMean { .. } => QueryKind::StateMean,
            Command::Best5 { .. } => QueryKind::Best5,
            Command::Worst5 { .. } => QueryKind::Worst5,
            Command::GlobalMean { .. } => QueryKind::GlobalMean,
            Command::DiffFromMean { .. } => QueryKind::DiffFromMean,
            Command::StateDiffFromMean { .. } => QueryKind::StateDiffFromMean,
            Command::MeanByCategory { .. } => QueryKind::MeanByCategory,
            Command::StateMeanByCategory { .. } => QueryKind::StateMeanByCategory,
        }
    }

    /// Ejecuta la consulta contra el dataset
    pub fn execute(&self, dataset: &Dataset) -> Result<Value, TaskError> {
        let rows = dataset.rows();

        let value = match self {
            Command::StatesMean { question } => aggregate::states_mean(rows, question),
            Command::StateMean { question, state } => aggregate::state_mean(rows, question, state),
            Command::Best5 { question } => aggregate::best5(rows, question),
            Command::Worst5 { question } => aggregate::worst5(rows, question),
            Command::GlobalMean { question } => aggregate::global_mean(rows, question),
            Command::DiffFromMean { question } => aggregate::diff_from_mean(rows, question),
            Command::StateDiffFromMean { question, state } => {
                aggregate::state_diff_from_mean(rows, question, state)
            }
            Command::MeanByCategory { question } => aggregate::mean_by_category(rows, question),
            Command::StateMeanByCategory { question, state } => {
                aggregate::state_mean_by_category(rows, question, state)
            }
        };

        Ok(value)
    }

    /// Convierte el comando en una tarea lista para el pool
    pub fn into_task(
        self,
        dataset: Arc<Dataset>,
    ) -> impl FnOnce() -> Result<Value, TaskError> + Send + 'static {
        move || self.execute(&dataset)
    }
}
