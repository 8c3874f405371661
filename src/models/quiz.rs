// src/models/quiz.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

pub const QUESTION_TYPES: [&str; 3] = ["multiple_choice", "true_false", "short_answer"];

/// Represents the 'quizzes' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Quiz {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub specialization_id: i64,

    /// 1 (entry) to 4 (expert).
    pub difficulty_level: i64,

    pub time_limit_minutes: i64,

    /// Percentage needed to pass. `None` means the default threshold applies.
    pub passing_score: Option<f64>,

    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Represents the 'questions' table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub quiz_id: i64,
    pub question_text: String,

    /// One of `QUESTION_TYPES`.
    pub question_type: String,

    pub points: i64,

    /// Position within the quiz, ascending.
    pub order_index: i64,

    pub explanation: Option<String>,
}

/// Represents the 'question_options' table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: i64,
    pub question_id: i64,
    pub option_text: String,
    pub is_correct: bool,
    pub order_index: i64,
}

/// Listing row for quiz catalogues.
#[derive(Debug, Serialize, FromRow)]
pub struct QuizSummary {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub specialization_id: i64,
    pub specialization_name: Option<String>,
    /// Time limit in minutes.
    pub duration: i64,
    pub difficulty: i64,
    pub question_count: i64,
}

/// DTO for sending a question to the client (option texts only, no correctness flags).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub question: String,
    pub question_type: String,
    pub points: i64,
    pub options: Vec<String>,
}

/// A quiz as served to a user about to take it.
#[derive(Debug, Serialize)]
pub struct QuizDetail {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub specialization_id: i64,
    pub duration: i64,
    pub difficulty: i64,
    pub passing_score: f64,
    pub question_count: usize,
    pub questions: Vec<PublicQuestion>,
}

/// DTO for creating a quiz together with its questions and options.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    pub specialization_id: i64,
    #[validate(range(min = 1, max = 4, message = "Difficulty level must be between 1 and 4."))]
    pub difficulty_level: i64,
    #[validate(range(min = 1, max = 600))]
    pub time_limit_minutes: Option<i64>,
    #[validate(range(min = 1.0, max = 100.0, message = "Passing score must be between 1 and 100."))]
    pub passing_score: Option<f64>,
    #[validate(nested)]
    #[serde(default)]
    pub questions: Vec<CreateQuestionRequest>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 2000))]
    pub question_text: String,
    #[validate(custom(function = validate_question_type))]
    pub question_type: String,
    #[validate(range(min = 0, max = 100))]
    pub points: Option<i64>,
    #[validate(length(max = 5000))]
    pub explanation: Option<String>,
    #[validate(length(min = 1, message = "A question needs at least one option."), nested)]
    pub options: Vec<CreateOptionRequest>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateOptionRequest {
    #[validate(length(min = 1, max = 500))]
    pub option_text: String,
    #[serde(default)]
    pub is_correct: bool,
}

fn validate_question_type(question_type: &str) -> Result<(), validator::ValidationError> {
    if QUESTION_TYPES.contains(&question_type) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("unknown_question_type"))
    }
}
