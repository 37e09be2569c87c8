//! Aggregations over a form's submissions: per-field summaries, CSV export and the
//! per-form submission overview.
//!
//! Summaries skip falsy answers (`null`, `false`, `0`, `""`), so a checkbox's "No" count only
//! includes explicit non-true answers such as `"false"`.

use serde::Serialize;
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::forms::{FieldType, FormField, as_number, checkbox_flag};

/// How many characters of a title the overview keeps before eliding
const OVERVIEW_TITLE_CHARS: usize = 15;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ValueCount {
    pub name: String,
    pub value: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldSummary {
    /// Numeric answers; all zero when nothing numeric was submitted
    Number { count: usize, average: f64, min: f64, max: f64 },
    /// Answer counts in first-seen order
    Choices { counts: Vec<ValueCount> },
    /// Checkbox answers as `Yes` / `No`
    YesNo { counts: Vec<ValueCount> },
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FieldReport {
    pub field_id: String,
    pub label: String,
    pub field_type: FieldType,
    pub summary: Option<FieldSummary>,
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Display text for a stored answer
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(value_text).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Summarize one field across submissions. `None` for field types without a summary.
pub fn summarize_field(field: &FormField, rows: &[&Map<String, Value>]) -> Option<FieldSummary> {
    let answers: Vec<&Value> = rows.iter().filter_map(|row| row.get(&field.id)).filter(|v| is_truthy(v)).collect();

    match field.field_type {
        FieldType::Number => {
            let numbers: Vec<f64> = answers.iter().filter_map(|v| as_number(v)).collect();
            if numbers.is_empty() {
                return Some(FieldSummary::Number {
                    count: 0,
                    average: 0.0,
                    min: 0.0,
                    max: 0.0,
                });
            }
            let sum: f64 = numbers.iter().sum();
            Some(FieldSummary::Number {
                count: numbers.len(),
                average: round_one_decimal(sum / numbers.len() as f64),
                min: numbers.iter().copied().fold(f64::INFINITY, f64::min),
                max: numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            })
        }
        FieldType::Select | FieldType::Radio => {
            let mut counts: Vec<ValueCount> = Vec::new();
            for answer in answers {
                let name = value_text(answer);
                match counts.iter_mut().find(|c| c.name == name) {
                    Some(existing) => existing.value += 1,
                    None => counts.push(ValueCount { name, value: 1 }),
                }
            }
            Some(FieldSummary::Choices { counts })
        }
        FieldType::Checkbox => {
            let yes = answers
                .iter()
                .filter(|v| checkbox_flag(v) == Some(true))
                .count();
            Some(FieldSummary::YesNo {
                counts: vec![
                    ValueCount {
                        name: "Yes".to_string(),
                        value: yes,
                    },
                    ValueCount {
                        name: "No".to_string(),
                        value: answers.len() - yes,
                    },
                ],
            })
        }
        _ => None,
    }
}

pub fn summarize_form(fields: &[FormField], rows: &[&Map<String, Value>]) -> Vec<FieldReport> {
    fields
        .iter()
        .filter(|f| f.field_type != FieldType::Section)
        .map(|f| FieldReport {
            field_id: f.id.clone(),
            label: f.label.clone(),
            field_type: f.field_type,
            summary: summarize_field(f, rows),
        })
        .collect()
}

/// Quote a CSV cell when it contains a delimiter, quote or line break
fn csv_cell(text: &str) -> String {
    if text.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_string()
    }
}

/// Render submissions as CSV: a header row of field labels, then one row per submission.
pub fn to_csv(fields: &[FormField], rows: &[&Map<String, Value>]) -> String {
    let columns: Vec<&FormField> = fields.iter().filter(|f| f.field_type != FieldType::Section).collect();

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(columns.iter().map(|f| csv_cell(&f.label)).collect::<Vec<_>>().join(","));
    for row in rows {
        let cells: Vec<String> = columns
            .iter()
            .map(|f| row.get(&f.id).map(value_text).map(|t| csv_cell(&t)).unwrap_or_default())
            .collect();
        lines.push(cells.join(","));
    }

    let mut csv = lines.join("\r\n");
    csv.push_str("\r\n");
    csv
}

/// Download name for an export, with characters that would break a Content-Disposition header removed
pub fn export_filename(title: &str) -> String {
    let stem: String = title
        .chars()
        .filter(|c| !c.is_control() && !matches!(c, '"' | '\\' | '/'))
        .collect();
    let stem = stem.trim();
    if stem.is_empty() {
        "report.csv".to_string()
    } else {
        format!("{stem}.csv")
    }
}

/// Overview chart label: long titles are cut to 15 characters plus `...`
pub fn overview_label(title: &str) -> String {
    if title.chars().count() > OVERVIEW_TITLE_CHARS {
        let head: String = title.chars().take(OVERVIEW_TITLE_CHARS).collect();
        format!("{head}...")
    } else {
        title.to_string()
    }
}
