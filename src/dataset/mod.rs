//! # Dataset
//! src/dataset/mod.rs
//!
//! Carga el CSV "Nutrition, Physical Activity, and Obesity" en memoria.
//! Solo se conservan las columnas que usan las agregaciones.
//!
//! ## Columnas
//!
//! | Columna CSV                 | Campo                      |
//! |-----------------------------|----------------------------|
//! | `LocationDesc`              | `location`                 |
//! | `Question`                  | `question`                 |
//! | `Data_Value`                | `value` (`None` si no es numérico) |
//! | `StratificationCategory1`   | `stratification_category`  |
//! | `Stratification1`           | `stratification`           |

use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Preguntas donde un valor menor es mejor
pub const QUESTIONS_BEST_IS_MIN: [&str; 5] = [
    "Percent of adults aged 18 years and older who have an overweight classification",
    "Percent of adults aged 18 years and older who have obesity",
    "Percent of adults who engage in no leisure-time physical activity",
    "Percent of adults who report consuming fruit less than one time daily",
    "Percent of adults who report consuming vegetables less than one time daily",
];

/// Preguntas donde un valor mayor es mejor
pub const QUESTIONS_BEST_IS_MAX: [&str; 4] = [
    "Percent of adults who achieve at least 150 minutes a week of moderate-intensity aerobic physical activity or 75 minutes a week of vigorous-intensity aerobic activity (or an equivalent combination)",
    "Percent of adults who achieve at least 150 minutes a week of moderate-intensity aerobic physical activity or 75 minutes a week of vigorous-intensity aerobic physical activity and engage in muscle-strengthening activities on 2 or more days a week",
    "Percent of adults who achieve at least 300 minutes a week of moderate-intensity aerobic physical activity or 150 minutes a week of vigorous-intensity aerobic activity (or an equivalent combination)",
    "Percent of adults who engage in muscle-strengthening activities on 2 or more days a week",
];

pub fn best_is_min(question: &str) -> bool {
    QUESTIONS_BEST_IS_MIN.contains(&question)
}

pub fn best_is_max(question: &str) -> bool {
    QUESTIONS_BEST_IS_MAX.contains(&question)
}

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("failed to open dataset: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing column: {0}")]
    MissingColumn(&'static str),
}

/// Una fila del dataset
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub location: String,
    pub question: String,
    pub value: Option<f64>,
    pub stratification_category: String,
    pub stratification: String,
}

/// Índices de las columnas relevantes dentro del header
struct Columns {
    location: usize,
    question: usize,
    value: usize,
    stratification_category: usize,
    stratification: usize,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, DatasetError> {
        let find = |name: &'static str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or(DatasetError::MissingColumn(name))
        };

        Ok(Self {
            location: find("LocationDesc")?,
            question: find("Question")?,
            value: find("Data_Value")?,
            stratification_category: find("StratificationCategory1")?,
            stratification: find("Stratification1")?,
        })
    }

    fn row(&self, record: &csv::StringRecord) -> Row {
        let field = |idx: usize| record.get(idx).unwrap_or("").to_string();

        Row {
            location: field(self.location),
            question: field(self.question),
            value: record
                .get(self.value)
                .and_then(|v| v.trim().parse::<f64>().ok())
                .filter(|v| v.is_finite()),
            stratification_category: field(self.stratification_category),
            stratification: field(self.stratification),
        }
    }
}

/// Dataset cargado en memoria (inmutable, compartido entre workers)
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    rows: Vec<Row>,
}

impl Dataset {
    /// Carga el CSV desde disco
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(file)
    }

    /// Carga el CSV desde cualquier lector
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let columns = Columns::from_headers(reader.headers()?)?;

        let mut rows = Vec::new();
        for record in reader.records() {
            rows.push(columns.row(&record?));
        }

        Ok(Self { rows })
    }

    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
