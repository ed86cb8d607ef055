use serde::{Deserialize, Serialize};

/// The scored outcome for a single question. Produced once per question during
/// evaluation and immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluatedResult {
    pub question: String,
    pub answer: String,
    pub feedback: String,
    /// 1..=5 from the evaluator; 0 marks a fallback result for a failed call.
    pub score: u8,
}

/// The whole-session performance summary, produced once after every
/// `EvaluatedResult` exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub strengths: String,
    pub areas_for_improvement: String,
}

/// Everything the results view needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub results: Vec<EvaluatedResult>,
    pub summary: PerformanceSummary,
}
