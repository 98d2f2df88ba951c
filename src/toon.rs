//! TOON (Token-Oriented Object Notation) encoder using rtoon library
//!
//! The view is reshaped before encoding so that uniform lists (functions,
//! complexity entries) come out as tabular blocks with one header row, and
//! empty or absent sections are dropped.

use rtoon::encode_default;
use serde_json::{json, Map, Value};

use crate::session::{MetricsView, PanelView, View};

/// Encode a rendered view as TOON
pub fn encode_toon(view: &View) -> String {
    let mut obj = Map::new();

    if let Some(failure) = &view.failure {
        obj.insert("failure".to_string(), json!(failure));
    }

    if let Some(file) = &view.file_name {
        obj.insert("file".to_string(), json!(file));
    }

    if let Some(sidebar) = &view.sidebar {
        let mut info = Map::new();
        if let Some(raw) = &sidebar.raw {
            info.insert("loc".to_string(), json!(raw.loc));
            info.insert("lloc".to_string(), json!(raw.lloc));
            info.insert("sloc".to_string(), json!(raw.sloc));
            info.insert("comments".to_string(), json!(raw.comments));
            info.insert("multi".to_string(), json!(raw.multi));
            info.insert("blank".to_string(), json!(raw.blank));
        }
        info.insert("functions".to_string(), json!(sidebar.functions));
        info.insert("classes".to_string(), json!(sidebar.classes));
        obj.insert("info".to_string(), Value::Object(info));
    }

    if !view.functions.is_empty() {
        let rows: Vec<Value> = view
            .functions
            .iter()
            .map(|f| {
                json!({
                    "name": f.qualified_name,
                    "start": f.metadata.start_line,
                    "end": f.metadata.end_line,
                    "params": f.metadata.parameter_names.join(" "),
                })
            })
            .collect();
        obj.insert("functions".to_string(), Value::Array(rows));

        let panels: Vec<Value> = view
            .functions
            .iter()
            .filter_map(|f| {
                let mut panel = Map::new();
                if let Some(explanation) = &f.explanation {
                    panel.insert("explanation".to_string(), panel_value(explanation));
                }
                if let Some(answer) = &f.answer {
                    panel.insert("question".to_string(), json!(answer.question));
                    panel.insert("answer".to_string(), panel_value(&answer.content));
                }
                if panel.is_empty() {
                    return None;
                }
                panel.insert("function".to_string(), json!(f.qualified_name));
                Some(Value::Object(panel))
            })
            .collect();
        if !panels.is_empty() {
            obj.insert("panels".to_string(), Value::Array(panels));
        }
    }

    match &view.metrics {
        Some(MetricsView::Ready {
            complexity,
            high_complexity,
            maintainability,
            grade,
            recommendation,
            ..
        }) => {
            if !complexity.is_empty() {
                let rows: Vec<Value> = complexity
                    .iter()
                    .map(|e| json!({ "name": e.name, "kind": e.kind, "score": e.score }))
                    .collect();
                obj.insert("complexity".to_string(), Value::Array(rows));
            }
            if !high_complexity.is_empty() {
                let names: Vec<&str> = high_complexity.iter().map(|e| e.name.as_str()).collect();
                obj.insert("high_complexity".to_string(), json!(names));
            }
            obj.insert(
                "maintainability".to_string(),
                json!(format!("{:.2}", maintainability)),
            );
            obj.insert("grade".to_string(), json!(grade.as_str()));
            obj.insert("recommendation".to_string(), json!(recommendation));
        }
        Some(MetricsView::Failed { message }) => {
            obj.insert("metrics_error".to_string(), json!(message));
        }
        None => {}
    }

    if let Some(improvements) = &view.improvements {
        obj.insert("improvements".to_string(), panel_value(improvements));
    }

    let value = Value::Object(obj);
    encode_default(&value).unwrap_or_else(|e| format!("TOON encoding error: {}", e))
}

fn panel_value(panel: &PanelView) -> Value {
    match panel {
        PanelView::Ready { text } => json!(text),
        PanelView::Failed { message } => json!(format!("error: {}", message)),
    }
}
