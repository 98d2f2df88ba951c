//! Dashboard state, events and rendering
//!
//! Each user action is an [`Event`] handled by [`dispatch`], which updates an
//! explicit [`AppState`]. Per-definition panels are keyed by [`DefinitionId`].
//! [`render`] is a pure function of the state and produces a serializable
//! [`View`] that the text, TOON and HTML front ends all consume.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::analysis::{analyze, Analysis};
use crate::explain::ExplanationService;
use crate::metrics::{
    ComplexityEntry, MaintainabilityGrade, MetricsService, RawMetrics, HIGH_COMPLEXITY_THRESHOLD,
};
use crate::schema::{DefinitionId, DefinitionNode, FunctionMetadata};

pub const REFACTOR_ADVICE: &str =
    "Consider refactoring parts of the code to improve maintainability.";
pub const WELL_MAINTAINED: &str = "The code is well-maintained and easy to understand.";
pub const GENERAL_ADVICE: &str = "Functions with high complexity or low maintainability index can be refactored for better performance and readability.";

/// Content of a panel that is filled on demand
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PanelContent {
    #[default]
    Closed,
    Ready(String),
    Failed(String),
}

impl PanelContent {
    fn from_result(result: crate::error::Result<String>) -> Self {
        match result {
            Ok(text) => Self::Ready(text),
            Err(e) => {
                tracing::warn!(error = %e, "panel request failed");
                Self::Failed(e.to_string())
            }
        }
    }

    fn view(&self) -> Option<PanelView> {
        match self {
            Self::Closed => None,
            Self::Ready(text) => Some(PanelView::Ready { text: text.clone() }),
            Self::Failed(message) => Some(PanelView::Failed {
                message: message.clone(),
            }),
        }
    }
}

/// Open panels for one definition
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Panels {
    pub explanation: PanelContent,
    pub answer: Option<(String, PanelContent)>,
    pub details_open: bool,
}

/// Complete dashboard state
#[derive(Debug, Default)]
pub struct AppState {
    pub analysis: Option<Analysis>,
    /// Why the last upload could not be analysed
    pub failure: Option<String>,
    pub panels: BTreeMap<DefinitionId, Panels>,
    pub improvements: PanelContent,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// State holding an analysis that was produced outside [`dispatch`]
    pub fn with_analysis(analysis: Analysis) -> Self {
        Self {
            analysis: Some(analysis),
            ..Default::default()
        }
    }
}

/// A user action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    Upload { file_name: String, source: String },
    RequestExplanation { id: DefinitionId },
    RequestAnswer { id: DefinitionId, question: String },
    RequestMore { id: DefinitionId },
    ClosePanels { id: DefinitionId },
    RequestImprovements,
}

/// Apply one event to the state
///
/// Service failures only ever land in the panel that asked for them.
pub fn dispatch(
    state: &mut AppState,
    event: Event,
    explainer: &dyn ExplanationService,
    metrics: &dyn MetricsService,
) {
    match event {
        Event::Upload { file_name, source } => {
            state.panels.clear();
            state.improvements = PanelContent::Closed;
            match analyze(&file_name, &source, metrics) {
                Ok(analysis) => {
                    state.analysis = Some(analysis);
                    state.failure = None;
                }
                Err(e) => {
                    tracing::warn!(file = %file_name, error = %e, "upload rejected");
                    state.analysis = None;
                    state.failure = Some(format!("Cannot analyze this file: {}", e));
                }
            }
        }
        Event::RequestExplanation { id } => {
            let Some(code) = function_source(state, &id) else {
                return;
            };
            let content = PanelContent::from_result(explainer.explain(&code));
            state.panels.entry(id).or_default().explanation = content;
        }
        Event::RequestAnswer { id, question } => {
            let question = question.trim().to_string();
            if question.is_empty() {
                return;
            }
            let Some(code) = function_source(state, &id) else {
                return;
            };
            let content = PanelContent::from_result(explainer.answer(&code, &question));
            state.panels.entry(id).or_default().answer = Some((question, content));
        }
        Event::RequestMore { id } => {
            let known = state
                .analysis
                .as_ref()
                .is_some_and(|a| a.definition(&id).is_some());
            if !known {
                tracing::warn!(%id, "details requested for unknown definition");
                return;
            }
            state.panels.entry(id).or_default().details_open = true;
        }
        Event::ClosePanels { id } => {
            state.panels.remove(&id);
        }
        Event::RequestImprovements => {
            let Some(analysis) = state.analysis.as_ref() else {
                tracing::warn!("improvements requested with no file loaded");
                return;
            };
            state.improvements =
                PanelContent::from_result(explainer.suggest_improvements(&analysis.source));
        }
    }
}

fn function_source(state: &AppState, id: &DefinitionId) -> Option<String> {
    let record = state.analysis.as_ref().and_then(|a| a.record(id));
    if record.is_none() {
        tracing::warn!(%id, "event for unknown function ignored");
    }
    record.map(|r| r.source.clone())
}

// ============================================================================
// View
// ============================================================================

/// Rendered dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct View {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sidebar: Option<Sidebar>,
    pub functions: Vec<FunctionPanel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MetricsView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub improvements: Option<PanelView>,
}

/// File summary counts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sidebar {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<RawMetrics>,
    pub functions: usize,
    pub classes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PanelView {
    Ready { text: String },
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerView {
    pub question: String,
    pub content: PanelView,
}

/// One function as displayed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionPanel {
    pub id: DefinitionId,
    pub name: String,
    pub qualified_name: String,
    pub source: String,
    pub metadata: FunctionMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<PanelView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<AnswerView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<DefinitionNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MetricsView {
    Ready {
        complexity: Vec<ComplexityEntry>,
        high_complexity: Vec<ComplexityEntry>,
        threshold: usize,
        maintainability: f64,
        grade: MaintainabilityGrade,
        needs_refactor: bool,
        recommendation: String,
        advice: String,
    },
    Failed {
        message: String,
    },
}

/// Render the state; functions are shown in source order
pub fn render(state: &AppState) -> View {
    let Some(analysis) = state.analysis.as_ref() else {
        return View {
            file_name: None,
            source: None,
            failure: state.failure.clone(),
            sidebar: None,
            functions: Vec::new(),
            metrics: None,
            improvements: None,
        };
    };

    let mut functions: Vec<FunctionPanel> = analysis
        .records
        .iter()
        .map(|record| {
            let panels = state.panels.get(&record.id);
            FunctionPanel {
                id: record.id,
                name: record.metadata.name.clone(),
                qualified_name: record.qualified_name.clone(),
                source: record.source.clone(),
                metadata: record.metadata.clone(),
                explanation: panels.and_then(|p| p.explanation.view()),
                answer: panels.and_then(|p| {
                    let (question, content) = p.answer.as_ref()?;
                    Some(AnswerView {
                        question: question.clone(),
                        content: content.view()?,
                    })
                }),
                details: panels
                    .filter(|p| p.details_open)
                    .and_then(|_| analysis.definition(&record.id).cloned()),
            }
        })
        .collect();
    functions.sort_by_key(|f| (f.id.start_line, f.id.end_line));

    let metrics = Some(match &analysis.metrics {
        Ok(snapshot) => {
            let needs_refactor = snapshot.maintainability.needs_refactor();
            MetricsView::Ready {
                complexity: snapshot.complexity.clone(),
                high_complexity: snapshot.high_complexity().cloned().collect(),
                threshold: HIGH_COMPLEXITY_THRESHOLD,
                maintainability: snapshot.maintainability.score,
                grade: snapshot.maintainability.grade,
                needs_refactor,
                recommendation: if needs_refactor {
                    REFACTOR_ADVICE
                } else {
                    WELL_MAINTAINED
                }
                .to_string(),
                advice: GENERAL_ADVICE.to_string(),
            }
        }
        Err(message) => MetricsView::Failed {
            message: message.clone(),
        },
    });

    View {
        file_name: Some(analysis.file_name.clone()),
        source: Some(analysis.source.clone()),
        failure: None,
        sidebar: Some(Sidebar {
            raw: analysis.metrics.as_ref().ok().map(|m| m.raw),
            functions: analysis.function_count(),
            classes: analysis.class_count(),
        }),
        functions,
        metrics,
        improvements: state.improvements.view(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CodeSightError, Result};
    use crate::metrics::TreeSitterMetrics;
    use crate::schema::DefinitionKind;

    struct Echo;

    impl ExplanationService for Echo {
        fn explain(&self, code: &str) -> Result<String> {
            Ok(format!("explained {} bytes", code.len()))
        }

        fn answer(&self, _code: &str, question: &str) -> Result<String> {
            Ok(format!("answer to {}", question))
        }

        fn suggest_improvements(&self, _source: &str) -> Result<String> {
            Err(CodeSightError::service("inference", "offline"))
        }
    }

    const SRC: &str = "def add(a, b):\n    return a + b\n";

    fn loaded() -> AppState {
        let mut state = AppState::new();
        dispatch(
            &mut state,
            Event::Upload {
                file_name: "add.py".to_string(),
                source: SRC.to_string(),
            },
            &Echo,
            &TreeSitterMetrics::new(),
        );
        state
    }

    fn add_id() -> DefinitionId {
        DefinitionId {
            kind: DefinitionKind::Function,
            start_line: 1,
            end_line: 2,
        }
    }

    #[test]
    fn test_explain_opens_only_that_panel() {
        let mut state = loaded();
        dispatch(
            &mut state,
            Event::RequestExplanation { id: add_id() },
            &Echo,
            &TreeSitterMetrics::new(),
        );
        let view = render(&state);
        let panel = &view.functions[0];
        assert_eq!(
            panel.explanation,
            Some(PanelView::Ready {
                text: "explained 31 bytes".to_string()
            })
        );
        assert!(panel.answer.is_none());
        assert!(panel.details.is_none());
    }

    #[test]
    fn test_blank_question_is_ignored() {
        let mut state = loaded();
        dispatch(
            &mut state,
            Event::RequestAnswer {
                id: add_id(),
                question: "   ".to_string(),
            },
            &Echo,
            &TreeSitterMetrics::new(),
        );
        assert!(state.panels.is_empty());
    }

    #[test]
    fn test_improvement_failure_is_isolated() {
        let mut state = loaded();
        dispatch(
            &mut state,
            Event::RequestImprovements,
            &Echo,
            &TreeSitterMetrics::new(),
        );
        let view = render(&state);
        assert!(matches!(view.improvements, Some(PanelView::Failed { .. })));
        assert!(matches!(view.metrics, Some(MetricsView::Ready { .. })));
        assert_eq!(view.functions.len(), 1);
    }

    #[test]
    fn test_event_json_shape() {
        let event = Event::RequestMore { id: add_id() };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "request_more");
        assert_eq!(json["id"]["kind"], "function");
        let back: Event = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
