use crate::evaluator::Evaluator;
use crate::report::{EvaluatedResult, PerformanceSummary};

/// Scored in place of an answer the candidate never gave.
pub const EMPTY_ANSWER_PLACEHOLDER: &str = "No answer was provided for this question.";
/// Feedback attached when a scoring call fails; such results carry score 0.
pub const FALLBACK_FEEDBACK: &str =
    "This answer could not be evaluated. Please review it yourself.";
pub const FALLBACK_STRENGTHS: &str = "A performance summary could not be generated.";
pub const FALLBACK_IMPROVEMENT: &str =
    "Review the per-question feedback above for guidance.";

/// Fan-out one scoring request per question, fan-in with an all-complete
/// barrier. Completion order is irrelevant; the returned results are in
/// original question order. A failed call degrades to a fallback result
/// instead of failing the batch.
pub async fn evaluate_all<E: Evaluator + Send + Sync>(
    evaluator: &E,
    questions: &[String],
    answers: &[String],
) -> Vec<EvaluatedResult> {
    let calls = questions.iter().zip(answers.iter()).map(|(question, answer)| async move {
        let scored_answer = if answer.trim().is_empty() {
            EMPTY_ANSWER_PLACEHOLDER
        } else {
            answer.as_str()
        };
        match evaluator.evaluate_answer(question, scored_answer).await {
            Ok(evaluation) => EvaluatedResult {
                question: question.clone(),
                answer: answer.clone(),
                feedback: evaluation.feedback,
                score: evaluation.score,
            },
            Err(e) => {
                tracing::warn!("Evaluation failed for question \"{question}\": {e:?}");
                EvaluatedResult {
                    question: question.clone(),
                    answer: answer.clone(),
                    feedback: FALLBACK_FEEDBACK.to_string(),
                    score: 0,
                }
            }
        }
    });
    // join_all yields outputs in input order regardless of completion order.
    futures::future::join_all(calls).await
}

/// One summary request over the assembled results, with a fixed fallback so
/// the session always reaches the results view.
pub async fn summarize<E: Evaluator + Send + Sync>(
    evaluator: &E,
    results: &[EvaluatedResult],
) -> PerformanceSummary {
    match evaluator.summarize(results).await {
        Ok(summary) => summary,
        Err(e) => {
            tracing::warn!("Summary generation failed: {e:?}");
            PerformanceSummary {
                strengths: FALLBACK_STRENGTHS.to_string(),
                areas_for_improvement: FALLBACK_IMPROVEMENT.to_string(),
            }
        }
    }
}
