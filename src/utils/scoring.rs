// src/utils/scoring.rs

use std::collections::HashMap;

use serde::Serialize;

use crate::models::attempt::AnswerSubmission;

/// Threshold applied when a quiz has no usable passing score of its own.
pub const DEFAULT_PASSING_SCORE: f64 = 70.0;

/// What the scorer needs to know about one question.
#[derive(Debug, Clone, Default)]
pub struct AnswerKey {
    pub points: i64,
    /// Texts of the options flagged as correct.
    pub correct_options: Vec<String>,
}

impl AnswerKey {
    fn accepts(&self, selected: &str) -> bool {
        self.correct_options.iter().any(|text| text == selected)
    }
}

/// Outcome of scoring one submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreSummary {
    /// Points earned.
    pub score: f64,
    /// Points available, never below 1.
    pub max_score: f64,
    pub percentage: f64,
    pub correct_count: i64,
    pub total_count: i64,
    pub passed: bool,
}

/// Resolves a quiz's stored passing score. Missing and non-positive values
/// fall back to `DEFAULT_PASSING_SCORE`.
pub fn effective_passing_score(stored: Option<f64>) -> f64 {
    stored
        .filter(|score| *score > 0.0)
        .unwrap_or(DEFAULT_PASSING_SCORE)
}

/// Scores submitted answers against the answer keys of the questions they name.
///
/// Answers naming a question absent from `keys` are skipped entirely. Repeated
/// answers for the same question are each counted.
pub fn score_answers(
    keys: &HashMap<i64, AnswerKey>,
    answers: &[AnswerSubmission],
    passing_score: Option<f64>,
) -> ScoreSummary {
    let mut total_count = 0;
    let mut correct_count = 0;
    let mut total_points = 0;
    let mut earned_points = 0;

    for answer in answers {
        let Some(key) = keys.get(&answer.question_id) else {
            continue;
        };

        total_count += 1;
        total_points += key.points;

        if key.accepts(&answer.selected_answer) {
            correct_count += 1;
            earned_points += key.points;
        }
    }

    let max_score = if total_points > 0 {
        total_points as f64
    } else {
        1.0
    };
    let score = earned_points as f64;
    let percentage = score / max_score * 100.0;
    let passed = percentage >= effective_passing_score(passing_score);

    ScoreSummary {
        score,
        max_score,
        percentage,
        correct_count,
        total_count,
        passed,
    }
}
