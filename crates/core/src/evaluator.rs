use crate::report::{EvaluatedResult, PerformanceSummary};
use anyhow::Result;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use reqwest::Client;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: Message,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub content: String,
}

/// The evaluator's verdict on a single answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerEvaluation {
    pub feedback: String,
    /// Always within 1..=5 for a successful call.
    pub score: u8,
}

// The `Evaluator` trait is the contract for the generative-AI collaborator the
// session depends on. The session only ever sees this abstraction, so unit
// tests drive the whole state machine with `mockall`'s `MockEvaluator` instead
// of live network calls, and another provider can be swapped in without
// touching the core logic.
//
// Every method returns a `Result`; a malformed or missing-field response is
// treated identically to a transport failure. The *callers* own the fallback
// behavior (placeholder questions message, zero score, fallback summary text),
// so a failure here never strands the session in a phase with no exit.
#[async_trait]
#[cfg_attr(test, automock)]
pub trait Evaluator {
    /// Generate the interview question list from a resume or subject document.
    async fn generate_questions(&self, document: &str) -> Result<Vec<String>>;

    /// Score one answer against its question.
    async fn evaluate_answer(&self, question: &str, answer: &str) -> Result<AnswerEvaluation>;

    /// Produce the whole-session summary from the assembled results.
    async fn summarize(&self, results: &[EvaluatedResult]) -> Result<PerformanceSummary>;
}

/// How many questions the generation prompt asks for. Any non-empty list is
/// accepted, since the collaborator is untrusted.
pub const QUESTION_COUNT: usize = 10;

pub struct EvaluatorClient {
    client: Client,
    api_key: String,
    model: String,
}

impl EvaluatorClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model,
        }
    }

    async fn chat(&self, body: serde_json::Value) -> Result<String> {
        let resp = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .json::<LlmResponse>()
            .await?;

        let answer = resp
            .choices
            .first()
            .ok_or_else(|| anyhow::anyhow!("No response from LLM"))?
            .message
            .content
            .clone();
        Ok(answer)
    }
}

#[async_trait]
impl Evaluator for EvaluatorClient {
    async fn generate_questions(&self, document: &str) -> Result<Vec<String>> {
        let prompt = format!(
            r#"You are an experienced technical interviewer preparing a mock interview.

Candidate material (resume text or chosen subject):
---
{document}
---

Write exactly {QUESTION_COUNT} interview questions tailored to this material,
ordered from warm-up to in-depth.

Respond STRICTLY as a JSON array of {QUESTION_COUNT} question strings:
["question 1", "question 2", ...]

Do NOT add any explanation, just the JSON."#
        );

        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "user", "content": prompt }
            ],
            "temperature": 0.4
        });

        let answer = self.chat(body).await?;
        parse_questions(&answer)
    }

    async fn evaluate_answer(&self, question: &str, answer: &str) -> Result<AnswerEvaluation> {
        let prompt = format!(
            r#"You are scoring one answer from a mock interview.

Question: "{question}"

Candidate's answer: "{answer}"

Give concise, constructive feedback (2-3 sentences) and an integer score from
1 (poor) to 5 (excellent).

Respond STRICTLY as JSON:
{{"feedback": "<text>", "score": <1-5>}}

Do NOT add any explanation, just the JSON."#
        );

        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "user", "content": prompt }
            ],
            "response_format": { "type": "json_object" },
            "temperature": 0.2
        });

        let answer = self.chat(body).await?;
        parse_evaluation(&answer)
    }

    async fn summarize(&self, results: &[EvaluatedResult]) -> Result<PerformanceSummary> {
        let transcript = results
            .iter()
            .map(|r| {
                serde_json::json!({
                    "question": r.question,
                    "answer": r.answer,
                    "score": r.score,
                })
            })
            .collect::<Vec<_>>();

        let prompt = format!(
            r#"Here is a candidate's full mock-interview transcript with per-answer
scores (1-5, 0 means the answer could not be scored):

{transcript}

Summarize the candidate's performance.

Respond STRICTLY as JSON:
{{"strengths": "<text>", "areas_for_improvement": "<text>"}}

Do NOT add any explanation, just the JSON."#,
            transcript = serde_json::Value::Array(transcript)
        );

        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "user", "content": prompt }
            ],
            "response_format": { "type": "json_object" },
            "temperature": 0.2
        });

        let answer = self.chat(body).await?;
        parse_summary(&answer)
    }
}

// The parse helpers below are strict on shape: anything other than the
// requested JSON (wrong type, missing field, out-of-range score) is an error,
// which the call sites translate into their fallback values.

fn parse_questions(raw: &str) -> Result<Vec<String>> {
    let value: serde_json::Value = serde_json::from_str(raw.trim())
        .map_err(|e| anyhow::anyhow!("Failed to parse LLM question list: {e}"))?;
    let array = value
        .as_array()
        .ok_or_else(|| anyhow::anyhow!("LLM question output is not an array: {raw}"))?;

    let questions: Vec<String> = array
        .iter()
        .filter_map(|q| q.as_str())
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .collect();

    if questions.is_empty() {
        return Err(anyhow::anyhow!("LLM returned no usable questions: {raw}"));
    }
    Ok(questions)
}

fn parse_evaluation(raw: &str) -> Result<AnswerEvaluation> {
    let value: serde_json::Value = serde_json::from_str(raw.trim())?;
    let feedback = value
        .get("feedback")
        .and_then(|f| f.as_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid LLM evaluation format: {raw}"))?
        .to_string();
    let score = value
        .get("score")
        .and_then(|s| s.as_u64())
        .ok_or_else(|| anyhow::anyhow!("Invalid LLM evaluation format: {raw}"))?;

    if !(1..=5).contains(&score) {
        return Err(anyhow::anyhow!("LLM score out of range: {score}"));
    }

    Ok(AnswerEvaluation {
        feedback,
        score: score as u8,
    })
}

fn parse_summary(raw: &str) -> Result<PerformanceSummary> {
    let value: serde_json::Value = serde_json::from_str(raw.trim())?;
    let strengths = value
        .get("strengths")
        .and_then(|s| s.as_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid LLM summary format: {raw}"))?
        .to_string();
    let areas_for_improvement = value
        .get("areas_for_improvement")
        .and_then(|s| s.as_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid LLM summary format: {raw}"))?
        .to_string();

    Ok(PerformanceSummary {
        strengths,
        areas_for_improvement,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn parse_questions_accepts_a_clean_array() {
        let raw = r#"["Tell me about yourself.", "What is ownership in Rust?"]"#;
        let questions = parse_questions(raw).unwrap();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0], "Tell me about yourself.");
    }

    #[test]
    fn parse_questions_rejects_non_arrays_and_empty_output() {
        assert!(parse_questions(r#"{"questions": []}"#).is_err());
        assert!(parse_questions("not json at all").is_err());
        assert!(parse_questions(r#"[]"#).is_err());
        // An array of non-strings has no usable questions either.
        assert!(parse_questions(r#"[1, 2, 3]"#).is_err());
    }

    #[test]
    fn parse_evaluation_requires_both_fields_and_a_valid_score() {
        let ok = parse_evaluation(r#"{"feedback": "Solid answer.", "score": 4}"#).unwrap();
        assert_eq!(ok.score, 4);
        assert_eq!(ok.feedback, "Solid answer.");

        assert!(parse_evaluation(r#"{"score": 4}"#).is_err());
        assert!(parse_evaluation(r#"{"feedback": "x"}"#).is_err());
        assert!(parse_evaluation(r#"{"feedback": "x", "score": 0}"#).is_err());
        assert!(parse_evaluation(r#"{"feedback": "x", "score": 6}"#).is_err());
    }

    #[test]
    fn parse_summary_requires_both_fields() {
        let ok = parse_summary(
            r#"{"strengths": "Clear communication.", "areas_for_improvement": "More depth."}"#,
        )
        .unwrap();
        assert_eq!(ok.strengths, "Clear communication.");
        assert_eq!(ok.areas_for_improvement, "More depth.");

        assert!(parse_summary(r#"{"strengths": "x"}"#).is_err());
    }

    // This is an integration test that makes a live call to the OpenAI API.
    // It is ignored by default so `cargo test` runs without a live API key.
    // To run it, use `cargo test -- --ignored`.
    #[tokio::test]
    #[ignore]
    async fn test_generate_questions_live() {
        dotenvy::dotenv_override().ok();
        let api_key = env::var("OPENAI_API_KEY").expect("OPENAI_API_KEY not set");
        let evaluator = EvaluatorClient::new(api_key, "gpt-4o".to_string());

        let document = "Backend engineer, 4 years of Rust, tokio services, PostgreSQL.";
        let questions = evaluator.generate_questions(document).await.unwrap();
        println!("Questions: {questions:?}");
        assert!(questions.len() >= 3, "Should return a usable question list");
    }

    // This is an integration test. See the note on `test_generate_questions_live`.
    #[tokio::test]
    #[ignore]
    async fn test_evaluate_answer_live() {
        dotenvy::dotenv_override().ok();
        let api_key = env::var("OPENAI_API_KEY").expect("OPENAI_API_KEY not set");
        let evaluator = EvaluatorClient::new(api_key, "gpt-4o".to_string());

        let evaluation = evaluator
            .evaluate_answer(
                "What does Rust's borrow checker guarantee?",
                "It guarantees at compile time that references never outlive their data \
                 and that mutable access is exclusive, which rules out data races.",
            )
            .await
            .unwrap();
        println!("Evaluation: {evaluation:?}");
        assert!((1..=5).contains(&evaluation.score));
        assert!(!evaluation.feedback.is_empty());
    }
}
