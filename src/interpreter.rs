//! Raw model outputs -> bounded clinical scores plus a rationale
//!
//! Clamping is policy, not error handling: any raw value maps into its
//! dimension's declared range. The rationale is a deterministic template
//! filled from the clamped scores.

use crate::model::SCORE_DIMS;
use serde::Serialize;

/// The four clinical dimensions, in model output order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    OverallNegativity,
    PerceivedJudgment,
    AnxietyStress,
    EmpathyRapport,
}

pub const DIMENSIONS: [Dimension; SCORE_DIMS] = [
    Dimension::OverallNegativity,
    Dimension::PerceivedJudgment,
    Dimension::AnxietyStress,
    Dimension::EmpathyRapport,
];

impl Dimension {
    /// Inclusive (floor, ceiling) of the dimension's clinical scale
    pub fn range(self) -> (f32, f32) {
        match self {
            Dimension::OverallNegativity => (0.0, 10.0),
            Dimension::PerceivedJudgment => (0.0, 5.0),
            Dimension::AnxietyStress => (0.0, 10.0),
            Dimension::EmpathyRapport => (0.0, 10.0),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Dimension::OverallNegativity => "overall negativity",
            Dimension::PerceivedJudgment => "perceived judgment",
            Dimension::AnxietyStress => "anxiety/stress",
            Dimension::EmpathyRapport => "empathy/rapport",
        }
    }
}

/// Final per-request analysis: bounded scores plus rationale
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub overall_negativity: f32,
    pub perceived_judgment: f32,
    pub anxiety_stress: f32,
    pub empathy_rapport: f32,
    pub rationale: String,
}

fn clamp_to(dim: Dimension, raw: f32) -> f32 {
    let (floor, ceiling) = dim.range();
    if raw.is_nan() {
        return floor;
    }
    raw.clamp(floor, ceiling)
}

/// Interpret one forward pass into bounded scores and a rationale.
pub fn interpret(raw: [f32; SCORE_DIMS]) -> AnalysisResult {
    let mut scores = [0.0f32; SCORE_DIMS];
    for (k, dim) in DIMENSIONS.iter().enumerate() {
        scores[k] = clamp_to(*dim, raw[k]);
    }

    AnalysisResult {
        overall_negativity: scores[0],
        perceived_judgment: scores[1],
        anxiety_stress: scores[2],
        empathy_rapport: scores[3],
        rationale: render_rationale(&scores),
    }
}

/// Elevated when a score reaches 70% of its ceiling.
fn is_elevated(dim: Dimension, score: f32) -> bool {
    let (_, ceiling) = dim.range();
    score >= 0.7 * ceiling
}

fn render_rationale(scores: &[f32; SCORE_DIMS]) -> String {
    let mut rationale = format!(
        "The statement shows an overall negativity of {:.1}/10, \
         perceived judgment of {:.1}/5, anxiety/stress potential of {:.1}/10, \
         and empathy/rapport of {:.1}/10.",
        scores[0], scores[1], scores[2], scores[3]
    );

    let elevated: Vec<&str> = DIMENSIONS
        .iter()
        .zip(scores)
        .filter(|(dim, score)| is_elevated(**dim, **score))
        .map(|(dim, _)| dim.label())
        .collect();
    if !elevated.is_empty() {
        rationale.push_str(&format!(" Elevated: {}.", elevated.join(", ")));
    }

    rationale
}
