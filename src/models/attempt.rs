// src/models/attempt.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::utils::scoring::ScoreSummary;

/// Represents the 'quiz_attempts' table.
/// Scoring columns stay empty until the attempt is submitted.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuizAttempt {
    pub id: i64,
    pub user_id: i64,
    pub quiz_id: i64,
    pub score: Option<f64>,
    pub max_score: Option<f64>,
    pub percentage: Option<f64>,
    pub is_passed: Option<bool>,
    pub time_taken_minutes: Option<i64>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// One row of a user's attempt history.
#[derive(Debug, Serialize, FromRow)]
pub struct AttemptHistoryEntry {
    pub id: i64,
    pub quiz_id: i64,
    pub quiz_title: String,
    pub score: Option<f64>,
    pub max_score: Option<f64>,
    pub percentage: Option<f64>,
    pub is_passed: Option<bool>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// DTO for starting a quiz.
#[derive(Debug, Deserialize)]
pub struct StartQuizRequest {
    pub user_id: i64,
}

#[derive(Debug, Serialize)]
pub struct StartQuizResponse {
    pub attempt_id: i64,
    pub quiz_id: i64,
    pub message: String,
}

/// One submitted answer: the option text the user picked for a question.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnswerSubmission {
    pub question_id: i64,
    pub selected_answer: String,
}

/// DTO for submitting a quiz attempt.
#[derive(Debug, Deserialize)]
pub struct SubmitQuizRequest {
    pub answers: Vec<AnswerSubmission>,
}

/// Response body for a scored submission.
#[derive(Debug, Serialize)]
pub struct QuizResult {
    pub attempt_id: i64,
    #[serde(flatten)]
    pub summary: ScoreSummary,
    pub message: String,
}

impl QuizResult {
    pub fn new(attempt_id: i64, summary: ScoreSummary) -> Self {
        let message = if summary.passed {
            "Great job!"
        } else {
            "Keep practicing!"
        };

        Self {
            attempt_id,
            summary,
            message: message.to_string(),
        }
    }
}
