//! Plain-text dashboard report for the terminal

use std::fmt::Write;

use crate::session::{FunctionPanel, MetricsView, PanelView, View};

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{} {}", count, word)
    } else {
        format!("{} {}s", count, word)
    }
}

/// Format a rendered view as a sectioned text report
pub fn format_text(view: &View) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "═══════════════════════════════════════════");
    let _ = writeln!(out, "  CODE ANALYSIS");
    let _ = writeln!(out, "═══════════════════════════════════════════");

    if let Some(failure) = &view.failure {
        let _ = writeln!(out, "\n✗ {}", failure);
        return out;
    }

    let Some(file_name) = &view.file_name else {
        let _ = writeln!(out, "\nNo file loaded.");
        return out;
    };

    let _ = writeln!(out, "\nfile: {}", file_name);

    if let Some(sidebar) = &view.sidebar {
        let _ = writeln!(out, "\nCODE INFO");
        if let Some(raw) = &sidebar.raw {
            let _ = writeln!(out, "  Lines of Code:           {}", raw.loc);
            let _ = writeln!(out, "  Logical Lines of Code:   {}", raw.lloc);
            let _ = writeln!(out, "  Comments:                {}", plural(raw.comments, "comment"));
            let _ = writeln!(out, "  Multi-line Strings:      {}", plural(raw.multi, "line"));
        }
        let _ = writeln!(out, "  Number of Functions:     {}", sidebar.functions);
        let _ = writeln!(out, "  Number of Classes:       {}", sidebar.classes);
    }

    let _ = writeln!(out, "\nFUNCTIONS");
    if view.functions.is_empty() {
        let _ = writeln!(out, "  No functions found in the uploaded code.");
    }
    for function in &view.functions {
        write_function(&mut out, function);
    }

    match &view.metrics {
        Some(MetricsView::Ready {
            complexity,
            high_complexity,
            threshold,
            maintainability,
            grade,
            recommendation,
            advice,
            ..
        }) => {
            let _ = writeln!(out, "\nCYCLOMATIC COMPLEXITY");
            if complexity.is_empty() {
                let _ = writeln!(out, "  No functions or classes detected.");
            } else {
                for entry in complexity {
                    let _ = writeln!(
                        out,
                        "  {:<40} {:>4}  ({})",
                        entry.name,
                        entry.score,
                        entry.rank()
                    );
                }
                if high_complexity.is_empty() {
                    let _ = writeln!(out, "  ✓ No functions with high complexity found.");
                } else {
                    let _ = writeln!(out, "  ⚠ Functions with high complexity (over {}):", threshold);
                    for entry in high_complexity {
                        let _ = writeln!(out, "    - {}: {}", entry.name, entry.score);
                    }
                }
            }

            let _ = writeln!(out, "\nMAINTAINABILITY INDEX");
            let _ = writeln!(out, "  Maintainability Index: {:.2} ({})", maintainability, grade);

            let _ = writeln!(out, "\nRECOMMENDATIONS");
            let _ = writeln!(out, "  {}", recommendation);
            let _ = writeln!(out, "  {}", advice);
        }
        Some(MetricsView::Failed { message }) => {
            let _ = writeln!(out, "\nMETRICS");
            let _ = writeln!(out, "  ✗ metrics unavailable: {}", message);
        }
        None => {}
    }

    if let Some(improvements) = &view.improvements {
        let _ = writeln!(out, "\nSUGGESTED IMPROVEMENTS");
        write_panel(&mut out, improvements, "  ");
    }

    out
}

fn write_function(out: &mut String, function: &FunctionPanel) {
    let _ = writeln!(out, "\n── {} ──", function.qualified_name);
    for line in function.source.lines() {
        let _ = writeln!(out, "  │ {}", line);
    }

    if let Some(explanation) = &function.explanation {
        let _ = writeln!(out, "  Explanation:");
        write_panel(out, explanation, "    ");
        for (key, value) in function.metadata.fields() {
            let _ = writeln!(out, "    {}: {}", key, value);
        }
    }

    if let Some(answer) = &function.answer {
        let _ = writeln!(out, "  Q: {}", answer.question);
        write_panel(out, &answer.content, "    ");
    }

    if let Some(details) = &function.details {
        let _ = writeln!(out, "  More about this function:");
        let _ = writeln!(out, "    depth: {}", details.depth);
        let _ = writeln!(out, "    async: {}", details.is_async);
        if !details.decorators.is_empty() {
            let _ = writeln!(out, "    decorators: {}", details.decorators.join(", "));
        }
        if let Some(returns) = &details.return_annotation {
            let _ = writeln!(out, "    returns: {}", returns);
        }
        for param in &details.parameters {
            let _ = writeln!(
                out,
                "    param {} ({:?}{}{})",
                param.name,
                param.kind,
                if param.has_default { ", default" } else { "" },
                param
                    .annotation
                    .as_deref()
                    .map(|a| format!(", {}", a))
                    .unwrap_or_default()
            );
        }
    }
}

fn write_panel(out: &mut String, panel: &PanelView, indent: &str) {
    match panel {
        PanelView::Ready { text } => {
            for line in text.lines() {
                let _ = writeln!(out, "{}{}", indent, line);
            }
        }
        PanelView::Failed { message } => {
            let _ = writeln!(out, "{}✗ {}", indent, message);
        }
    }
}
