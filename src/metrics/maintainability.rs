//! Maintainability index
//!
//! The SEI formula as radon computes it: logical lines for size, multi-line
//! strings counted as comments, and the result rescaled to 0..=100.

use serde::{Deserialize, Serialize};

use crate::metrics::raw::RawMetrics;

/// Scores below this are flagged as needing a refactor
pub const REFACTOR_THRESHOLD: f64 = 65.0;

/// Letter grade for a maintainability score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaintainabilityGrade {
    A,
    B,
    C,
}

impl MaintainabilityGrade {
    /// A above 19, B above 9, C otherwise
    pub fn from_score(score: f64) -> Self {
        if score > 19.0 {
            Self::A
        } else if score > 9.0 {
            Self::B
        } else {
            Self::C
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
        }
    }
}

impl std::fmt::Display for MaintainabilityGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Maintainability {
    pub score: f64,
    pub grade: MaintainabilityGrade,
}

impl Maintainability {
    pub fn needs_refactor(&self) -> bool {
        self.score < REFACTOR_THRESHOLD
    }
}

/// Combine Halstead volume, total complexity and raw counts into an index
pub fn compute(volume: f64, complexity: usize, raw: &RawMetrics) -> Maintainability {
    let comment_percent = if raw.sloc == 0 {
        0.0
    } else {
        (raw.comments + raw.multi) as f64 / raw.sloc as f64 * 100.0
    };
    let score = index(volume, complexity, raw.lloc, comment_percent);
    Maintainability {
        score,
        grade: MaintainabilityGrade::from_score(score),
    }
}

fn index(volume: f64, complexity: usize, lloc: usize, comment_percent: f64) -> f64 {
    if volume <= 0.0 || complexity == 0 || lloc == 0 {
        return 100.0;
    }

    let comments_scale = (2.46 * comment_percent.to_radians()).sqrt();

    let raw_index = 171.0
        - 5.2 * volume.ln()
        - 0.23 * complexity as f64
        - 16.2 * (lloc as f64).ln()
        + 50.0 * comments_scale.sin();

    (raw_index * 100.0 / 171.0).clamp(0.0, 100.0)
}
