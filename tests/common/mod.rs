//! Shared fixtures and fake services for codesight integration tests

#![allow(dead_code)]

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};

use codesight::{CodeSightError, ExplanationService, MetricsService, MetricsSnapshot, RawMetrics, Result};
use tempfile::NamedTempFile;

pub const ADD: &str = "def add(a, b):\n    return a + b\n";

/// A module mixing top-level functions, a class with methods, a nested
/// function, decorators and an async def
pub const MIXED: &str = r#"import functools


def top(x, y=1, *args, z, **kwargs):
    """Docstring."""
    if x > y:
        return x
    return y


class Shape(Base):
    sides = 0

    def __init__(self, name):
        self.name = name

    @property
    def area(self):
        return 0

    class Meta:
        ordering = ["name"]


def outer():
    def inner(v):
        return v * 2
    return inner


async def fetch(url, /, retries=3):
    for _ in range(retries):
        try:
            return await get(url)
        except IOError:
            pass
"#;

/// Explanation service that records calls and answers deterministically
#[derive(Default)]
pub struct RecordingExplainer {
    pub calls: AtomicUsize,
}

impl RecordingExplainer {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ExplanationService for RecordingExplainer {
    fn explain(&self, code: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let first = code.lines().next().unwrap_or_default();
        Ok(format!("explains `{}`", first.trim()))
    }

    fn answer(&self, _code: &str, question: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("answer: {}", question))
    }

    fn suggest_improvements(&self, _source: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok("use type hints".to_string())
    }
}

/// Explanation service that always fails
pub struct DownExplainer;

impl ExplanationService for DownExplainer {
    fn explain(&self, _code: &str) -> Result<String> {
        Err(CodeSightError::service("inference", "503 Service Unavailable"))
    }

    fn answer(&self, _code: &str, _question: &str) -> Result<String> {
        Err(CodeSightError::service("inference", "503 Service Unavailable"))
    }

    fn suggest_improvements(&self, _source: &str) -> Result<String> {
        Err(CodeSightError::service("inference", "503 Service Unavailable"))
    }
}

/// Metrics service that always fails
pub struct BrokenMetrics;

impl MetricsService for BrokenMetrics {
    fn raw(&self, _source: &str) -> Result<RawMetrics> {
        Err(CodeSightError::service("metrics", "unavailable"))
    }

    fn complexity(&self, _source: &str) -> Result<Vec<codesight::ComplexityEntry>> {
        Err(CodeSightError::service("metrics", "unavailable"))
    }

    fn maintainability(&self, _source: &str) -> Result<codesight::Maintainability> {
        Err(CodeSightError::service("metrics", "unavailable"))
    }

    fn snapshot(&self, _source: &str) -> Result<MetricsSnapshot> {
        Err(CodeSightError::service("metrics", "unavailable"))
    }
}

/// Write `contents` to a temporary file with the given suffix
pub fn temp_source(contents: &str, suffix: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("create temp file");
    file.write_all(contents.as_bytes()).expect("write temp file");
    file.flush().expect("flush temp file");
    file
}
