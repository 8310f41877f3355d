//! # Agregaciones
//! src/commands/aggregate.rs
//!
//! Funciones puras sobre las filas del dataset. Todas retornan un objeto
//! JSON cuyo orden de claves es parte del resultado (p.ej. estados
//! ordenados por media ascendente).
//!
//! Las filas sin `Data_Value` numérico se ignoran.

use crate::dataset::{self, Row};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashMap};

/// Acumulador suma/cantidad
#[derive(Debug, Clone, Copy, Default)]
struct MeanAcc {
    sum: f64,
    count: usize,
}

impl MeanAcc {
    fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// Filas de una pregunta con valor numérico
fn values_for<'a>(rows: &'a [Row], question: &'a str) -> impl Iterator<Item = (&'a Row, f64)> + 'a {
    rows.iter()
        .filter(move |row| row.question == question)
        .filter_map(|row| row.value.map(|v| (row, v)))
}

/// Media por estado, ordenada ascendentemente
///
/// Los empates conservan el orden de primera aparición en el dataset.
fn sorted_state_means(rows: &[Row], question: &str) -> Vec<(String, f64)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut accs: Vec<(&str, MeanAcc)> = Vec::new();

    for (row, value) in values_for(rows, question) {
        let slot = *index.entry(row.location.as_str()).or_insert_with(|| {
            accs.push((row.location.as_str(), MeanAcc::default()));
            accs.len() - 1
        });
        accs[slot].1.push(value);
    }

    let mut means: Vec<(String, f64)> = accs
        .into_iter()
        .filter_map(|(state, acc)| acc.mean().map(|m| (state.to_string(), m)))
        .collect();
    means.sort_by(|a, b| a.1.total_cmp(&b.1));
    means
}

fn global_mean_value(rows: &[Row], question: &str) -> Option<f64> {
    let mut acc = MeanAcc::default();
    for (_, value) in values_for(rows, question) {
        acc.push(value);
    }
    acc.mean()
}

fn state_mean_value(rows: &[Row], question: &str, state: &str) -> Option<f64> {
    let mut acc = MeanAcc::default();
    for (_, value) in values_for(rows, question).filter(|(row, _)| row.location == state) {
        acc.push(value);
    }
    acc.mean()
}

fn to_object<I>(pairs: I) -> Value
where
    I: IntoIterator<Item = (String, f64)>,
{
    let map: Map<String, Value> = pairs.into_iter().map(|(k, v)| (k, json!(v))).collect();
    Value::Object(map)
}

/// Representación de una tupla de strings al estilo `('a', 'b')`
fn tuple_key(parts: &[&str]) -> String {
    let quoted: Vec<String> = parts
        .iter()
        .map(|p| {
            if p.contains('\'') && !p.contains('"') {
                format!("\"{}\"", p)
            } else {
                format!("'{}'", p.replace('\\', "\\\\").replace('\'', "\\'"))
            }
        })
        .collect();
    format!("({})", quoted.join(", "))
}

/// `/api/states_mean`: media de cada estado, ascendente
pub fn states_mean(rows: &[Row], question: &str) -> Value {
    to_object(sorted_state_means(rows, question))
}

/// `/api/state_mean`: media de un estado (0 si no hay datos)
pub fn state_mean(rows: &[Row], question: &str, state: &str) -> Value {
    let mut map = Map::new();
    let value = match state_mean_value(rows, question, state) {
        Some(mean) => json!(mean),
        None => json!(0),
    };
    map.insert(state.to_string(), value);
    Value::Object(map)
}

/// `/api/best5`: los 5 mejores estados según la polaridad de la pregunta
pub fn best5(rows: &[Row], question: &str) -> Value {
    let means = sorted_state_means(rows, question);
    to_object(take_edge(means, dataset::best_is_min(question)))
}

/// `/api/worst5`: los 5 peores estados según la polaridad de la pregunta
pub fn worst5(rows: &[Row], question: &str) -> Value {
    let means = sorted_state_means(rows, question);
    to_object(take_edge(means, dataset::best_is_max(question)))
}

/// Primeros 5 (`from_start`) o últimos 5 de una lista ordenada
fn take_edge(mut means: Vec<(String, f64)>, from_start: bool) -> Vec<(String, f64)> {
    if from_start {
        means.truncate(5);
        means
    } else {
        let skip = means.len().saturating_sub(5);
        means.split_off(skip)
    }
}

/// `/api/global_mean`: media de todos los valores de la pregunta
pub fn global_mean(rows: &[Row], question: &str) -> Value {
    match global_mean_value(rows, question) {
        Some(mean) => json!({ "global_mean": mean }),
        None => json!({ "global_mean": 0 }),
    }
}

/// `/api/diff_from_mean`: media global menos la media de cada estado
pub fn diff_from_mean(rows: &[Row], question: &str) -> Value {
    let global = global_mean_value(rows, question).unwrap_or(0.0);
    to_object(
        sorted_state_means(rows, question)
            .into_iter()
            .map(|(state, mean)| (state, global - mean)),
    )
}

/// `/api/state_diff_from_mean`: media global menos la media del estado
pub fn state_diff_from_mean(rows: &[Row], question: &str, state: &str) -> Value {
    let global = global_mean_value(rows, question);
    let local = state_mean_value(rows, question, state);

    let value = match (global, local) {
        (None, None) => json!(0),
        (g, s) => json!(g.unwrap_or(0.0) - s.unwrap_or(0.0)),
    };

    let mut map = Map::new();
    map.insert(state.to_string(), value);
    Value::Object(map)
}

/// `/api/mean_by_category`: media por (estado, categoría, segmento)
///
/// Claves ordenadas lexicográficamente por la tupla; se omiten grupos con
/// algún componente vacío.
pub fn mean_by_category(rows: &[Row], question: &str) -> Value {
    let mut groups: BTreeMap<(&str, &str, &str), MeanAcc> = BTreeMap::new();

    for (row, value) in values_for(rows, question) {
        let key = (
            row.location.as_str(),
            row.stratification_category.as_str(),
            row.stratification.as_str(),
        );
        if key.0.is_empty() || key.1.is_empty() || key.2.is_empty() {
            continue;
        }
        groups.entry(key).or_default().push(value);
    }

    to_object(groups.into_iter().filter_map(|((state, category, segment), acc)| {
        acc.mean()
            .map(|mean| (tuple_key(&[state, category, segment]), mean))
    }))
}

/// `/api/state_mean_by_category`: media por (categoría, segmento) de un estado
pub fn state_mean_by_category(rows: &[Row], question: &str, state: &str) -> Value {
    let mut groups: BTreeMap<(&str, &str), MeanAcc> = BTreeMap::new();
    let mut matched = false;

    for row in rows
        .iter()
        .filter(|row| row.question == question && row.location == state)
    {
        matched = true;
        let Some(value) = row.value else { continue };
        if row.stratification_category.is_empty() || row.stratification.is_empty() {
            continue;
        }
        groups
            .entry((row.stratification_category.as_str(), row.stratification.as_str()))
            .or_default()
            .push(value);
    }

    let mut map = Map::new();
    if !matched || state.is_empty() {
        map.insert(state.to_string(), json!(0));
        return Value::Object(map);
    }

    let inner = to_object(groups.into_iter().filter_map(|((category, segment), acc)| {
        acc.mean().map(|mean| (tuple_key(&[category, segment]), mean))
    }));
    map.insert(state.to_string(), inner);
    Value::Object(map)
}
