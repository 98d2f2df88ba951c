//! Dashboard event handling with fake services

mod common;

use codesight::schema::{DefinitionId, DefinitionKind};
use codesight::session::{MetricsView, PanelView, GENERAL_ADVICE, WELL_MAINTAINED};
use codesight::{dispatch, render, AppState, Event, TreeSitterMetrics};

use common::{BrokenMetrics, DownExplainer, RecordingExplainer, ADD, MIXED};

fn upload(state: &mut AppState, name: &str, source: &str, explainer: &RecordingExplainer) {
    dispatch(
        state,
        Event::Upload {
            file_name: name.to_string(),
            source: source.to_string(),
        },
        explainer,
        &TreeSitterMetrics::new(),
    );
}

fn function_id(start_line: usize, end_line: usize) -> DefinitionId {
    DefinitionId {
        kind: DefinitionKind::Function,
        start_line,
        end_line,
    }
}

#[test]
fn initial_state_renders_nothing() {
    let view = render(&AppState::new());
    assert!(view.file_name.is_none());
    assert!(view.functions.is_empty());
    assert!(view.metrics.is_none());
    assert!(view.failure.is_none());
}

#[test]
fn upload_renders_inventory_and_metrics() {
    let explainer = RecordingExplainer::default();
    let mut state = AppState::new();
    upload(&mut state, "mixed.py", MIXED, &explainer);

    let view = render(&state);
    assert_eq!(view.file_name.as_deref(), Some("mixed.py"));
    let sidebar = view.sidebar.as_ref().unwrap();
    assert_eq!(sidebar.functions, 6);
    assert_eq!(sidebar.classes, 2);

    let lines: Vec<_> = view.functions.iter().map(|f| f.id.start_line).collect();
    let mut sorted = lines.clone();
    sorted.sort();
    assert_eq!(lines, sorted);

    assert!(view.functions.iter().all(|f| f.explanation.is_none()));
    assert_eq!(explainer.calls(), 0);
    match view.metrics {
        Some(MetricsView::Ready { advice, .. }) => assert_eq!(advice, GENERAL_ADVICE),
        other => panic!("expected metrics, got {other:?}"),
    }
}

#[test]
fn explain_then_ask_then_close() {
    let explainer = RecordingExplainer::default();
    let metrics = TreeSitterMetrics::new();
    let mut state = AppState::new();
    upload(&mut state, "add.py", ADD, &explainer);
    let id = function_id(1, 2);

    dispatch(&mut state, Event::RequestExplanation { id }, &explainer, &metrics);
    dispatch(
        &mut state,
        Event::RequestAnswer {
            id,
            question: "  what is returned?  ".to_string(),
        },
        &explainer,
        &metrics,
    );
    dispatch(&mut state, Event::RequestMore { id }, &explainer, &metrics);

    let view = render(&state);
    let panel = &view.functions[0];
    assert_eq!(
        panel.explanation,
        Some(PanelView::Ready {
            text: "explains `def add(a, b):`".to_string()
        })
    );
    let answer = panel.answer.as_ref().unwrap();
    assert_eq!(answer.question, "what is returned?");
    assert_eq!(
        answer.content,
        PanelView::Ready {
            text: "answer: what is returned?".to_string()
        }
    );
    assert_eq!(panel.details.as_ref().unwrap().name, "add");
    assert_eq!(explainer.calls(), 2);

    dispatch(&mut state, Event::ClosePanels { id }, &explainer, &metrics);
    let view = render(&state);
    assert!(view.functions[0].explanation.is_none());
    assert!(view.functions[0].answer.is_none());
    assert!(view.functions[0].details.is_none());
}

#[test]
fn panels_are_independent_per_function() {
    let explainer = RecordingExplainer::default();
    let metrics = TreeSitterMetrics::new();
    let mut state = AppState::new();
    upload(&mut state, "mixed.py", MIXED, &explainer);

    let target = render(&state).functions[1].id;
    dispatch(
        &mut state,
        Event::RequestExplanation { id: target },
        &explainer,
        &metrics,
    );

    let view = render(&state);
    let opened: Vec<_> = view
        .functions
        .iter()
        .filter(|f| f.explanation.is_some())
        .map(|f| f.id)
        .collect();
    assert_eq!(opened, vec![target]);
}

#[test]
fn unknown_function_is_ignored() {
    let explainer = RecordingExplainer::default();
    let mut state = AppState::new();
    upload(&mut state, "add.py", ADD, &explainer);

    dispatch(
        &mut state,
        Event::RequestExplanation {
            id: function_id(40, 41),
        },
        &explainer,
        &TreeSitterMetrics::new(),
    );
    assert_eq!(explainer.calls(), 0);
    assert!(state.panels.is_empty());
}

#[test]
fn service_failure_stays_in_its_panel() {
    let explainer = RecordingExplainer::default();
    let metrics = TreeSitterMetrics::new();
    let mut state = AppState::new();
    upload(&mut state, "add.py", ADD, &explainer);
    let id = function_id(1, 2);

    dispatch(&mut state, Event::RequestExplanation { id }, &DownExplainer, &metrics);
    dispatch(&mut state, Event::RequestImprovements, &DownExplainer, &metrics);

    let view = render(&state);
    assert!(matches!(
        view.functions[0].explanation,
        Some(PanelView::Failed { ref message }) if message.contains("503")
    ));
    assert!(matches!(view.improvements, Some(PanelView::Failed { .. })));
    assert!(view.failure.is_none());
    assert!(matches!(view.metrics, Some(MetricsView::Ready { .. })));
}

#[test]
fn metrics_failure_keeps_functions() {
    let explainer = RecordingExplainer::default();
    let mut state = AppState::new();
    dispatch(
        &mut state,
        Event::Upload {
            file_name: "add.py".to_string(),
            source: ADD.to_string(),
        },
        &explainer,
        &BrokenMetrics,
    );

    let view = render(&state);
    assert_eq!(view.functions.len(), 1);
    assert!(matches!(view.metrics, Some(MetricsView::Failed { .. })));
    assert!(view.sidebar.unwrap().raw.is_none());
}

#[test]
fn syntax_error_upload_replaces_previous_analysis() {
    let explainer = RecordingExplainer::default();
    let mut state = AppState::new();
    upload(&mut state, "add.py", ADD, &explainer);
    upload(&mut state, "bad.py", "def f(:\n    pass\n", &explainer);

    let view = render(&state);
    assert!(view.file_name.is_none());
    assert!(view.functions.is_empty());
    assert!(view.failure.unwrap().starts_with("Cannot analyze this file"));
}

#[test]
fn new_upload_resets_panels() {
    let explainer = RecordingExplainer::default();
    let metrics = TreeSitterMetrics::new();
    let mut state = AppState::new();
    upload(&mut state, "add.py", ADD, &explainer);
    dispatch(
        &mut state,
        Event::RequestExplanation { id: function_id(1, 2) },
        &explainer,
        &metrics,
    );
    dispatch(&mut state, Event::RequestImprovements, &explainer, &metrics);

    upload(&mut state, "add.py", ADD, &explainer);
    let view = render(&state);
    assert!(view.functions[0].explanation.is_none());
    assert!(view.improvements.is_none());
}

#[test]
fn well_maintained_recommendation_for_small_file() {
    let explainer = RecordingExplainer::default();
    let mut state = AppState::new();
    upload(&mut state, "add.py", ADD, &explainer);

    match render(&state).metrics {
        Some(MetricsView::Ready {
            recommendation,
            needs_refactor,
            high_complexity,
            ..
        }) => {
            assert_eq!(recommendation, WELL_MAINTAINED);
            assert!(!needs_refactor);
            assert!(high_complexity.is_empty());
        }
        other => panic!("expected metrics, got {other:?}"),
    }
}
