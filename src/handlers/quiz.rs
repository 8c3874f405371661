// src/handlers/quiz.rs

use std::collections::{BTreeSet, HashMap};

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqliteExecutor, SqlitePool};

use crate::{
    error::AppError,
    extract::AppJson,
    handlers::taxonomy::find_active_specialization,
    models::{
        attempt::{
            AnswerSubmission, QuizAttempt, QuizResult, StartQuizRequest, StartQuizResponse,
            SubmitQuizRequest,
        },
        quiz::{PublicQuestion, Question, QuestionOption, Quiz, QuizDetail, QuizSummary},
    },
    utils::scoring::{AnswerKey, effective_passing_score, score_answers},
};

const QUIZ_SUMMARY_SELECT: &str = r#"
    SELECT
        q.id,
        q.title,
        q.description,
        q.specialization_id,
        s.name AS specialization_name,
        q.time_limit_minutes AS duration,
        q.difficulty_level AS difficulty,
        (SELECT COUNT(*) FROM questions qs WHERE qs.quiz_id = q.id) AS question_count
    FROM quizzes q
    LEFT JOIN specializations s ON s.id = q.specialization_id
    WHERE q.is_active = 1
"#;

pub(crate) async fn find_active_quiz<'e>(
    executor: impl SqliteExecutor<'e>,
    id: i64,
) -> Result<Quiz, AppError> {
    sqlx::query_as::<_, Quiz>(
        r#"
        SELECT id, title, description, specialization_id, difficulty_level,
               time_limit_minutes, passing_score, is_active, created_at
        FROM quizzes
        WHERE id = ? AND is_active = 1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?
    .ok_or(AppError::NotFound("Quiz not found".to_string()))
}

/// Builds the answer keys for the questions named in a submission: points per
/// question and the texts of its correct options. Ids with no question row are
/// absent from the result.
async fn load_answer_keys(
    conn: &mut SqliteConnection,
    answers: &[AnswerSubmission],
) -> Result<HashMap<i64, AnswerKey>, AppError> {
    let question_ids: BTreeSet<i64> = answers.iter().map(|a| a.question_id).collect();
    if question_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let mut builder: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT id, points FROM questions WHERE id IN (");
    let mut separated = builder.separated(", ");
    for id in &question_ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");

    let questions: Vec<(i64, i64)> = builder
        .build_query_as()
        .fetch_all(&mut *conn)
        .await?;

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT question_id, option_text FROM question_options WHERE is_correct = 1 AND question_id IN (",
    );
    let mut separated = builder.separated(", ");
    for id in &question_ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");

    let correct_options: Vec<(i64, String)> = builder
        .build_query_as()
        .fetch_all(&mut *conn)
        .await?;

    let mut keys: HashMap<i64, AnswerKey> = questions
        .into_iter()
        .map(|(id, points)| {
            (
                id,
                AnswerKey {
                    points,
                    correct_options: Vec::new(),
                },
            )
        })
        .collect();

    for (question_id, text) in correct_options {
        if let Some(key) = keys.get_mut(&question_id) {
            key.correct_options.push(text);
        }
    }

    Ok(keys)
}

/// Lists every active quiz with its question count.
pub async fn list_quizzes(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let quizzes = sqlx::query_as::<_, QuizSummary>(&format!("{QUIZ_SUMMARY_SELECT} ORDER BY q.id"))
        .fetch_all(&pool)
        .await?;

    Ok(Json(quizzes))
}

/// Lists the active quizzes of an active specialization.
pub async fn list_specialization_quizzes(
    State(pool): State<SqlitePool>,
    Path(specialization_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    find_active_specialization(&pool, specialization_id).await?;

    let quizzes = sqlx::query_as::<_, QuizSummary>(&format!(
        "{QUIZ_SUMMARY_SELECT} AND q.specialization_id = ? ORDER BY q.difficulty_level, q.id"
    ))
    .bind(specialization_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(quizzes))
}

/// Returns a quiz with its ordered questions.
///
/// Option texts are included; correctness flags are not.
pub async fn get_quiz(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = find_active_quiz(&pool, id).await?;

    let questions = sqlx::query_as::<_, Question>(
        r#"
        SELECT id, quiz_id, question_text, question_type, points, order_index, explanation
        FROM questions
        WHERE quiz_id = ?
        ORDER BY order_index, id
        "#,
    )
    .bind(id)
    .fetch_all(&pool)
    .await?;

    let options = sqlx::query_as::<_, QuestionOption>(
        r#"
        SELECT o.id, o.question_id, o.option_text, o.is_correct, o.order_index
        FROM question_options o
        JOIN questions q ON q.id = o.question_id
        WHERE q.quiz_id = ?
        ORDER BY o.question_id, o.order_index, o.id
        "#,
    )
    .bind(id)
    .fetch_all(&pool)
    .await?;

    let mut options_by_question: HashMap<i64, Vec<String>> = HashMap::new();
    for option in options {
        options_by_question
            .entry(option.question_id)
            .or_default()
            .push(option.option_text);
    }

    let questions: Vec<PublicQuestion> = questions
        .into_iter()
        .map(|q| PublicQuestion {
            options: options_by_question.remove(&q.id).unwrap_or_default(),
            id: q.id,
            question: q.question_text,
            question_type: q.question_type,
            points: q.points,
        })
        .collect();

    Ok(Json(QuizDetail {
        id: quiz.id,
        title: quiz.title,
        description: quiz.description,
        specialization_id: quiz.specialization_id,
        duration: quiz.time_limit_minutes,
        difficulty: quiz.difficulty_level,
        passing_score: effective_passing_score(quiz.passing_score),
        question_count: questions.len(),
        questions,
    }))
}

/// Opens a new attempt for a user on an active quiz.
pub async fn start_quiz(
    State(pool): State<SqlitePool>,
    Path(quiz_id): Path<i64>,
    AppJson(req): AppJson<StartQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    find_active_quiz(&pool, quiz_id).await?;

    sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE id = ?")
        .bind(req.user_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    let attempt_id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO quiz_attempts (user_id, quiz_id, started_at)
        VALUES (?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(req.user_id)
    .bind(quiz_id)
    .bind(Utc::now())
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create quiz attempt: {:?}", e);
        AppError::from(e)
    })?;

    tracing::info!(attempt_id, quiz_id, user_id = req.user_id, "Quiz attempt started");

    Ok((
        StatusCode::CREATED,
        Json(StartQuizResponse {
            attempt_id,
            quiz_id,
            message: "Quiz started successfully".to_string(),
        }),
    ))
}

pub async fn get_attempt(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let attempt = sqlx::query_as::<_, QuizAttempt>(
        r#"
        SELECT id, user_id, quiz_id, score, max_score, percentage, is_passed,
               time_taken_minutes, started_at, completed_at
        FROM quiz_attempts
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Attempt not found".to_string()))?;

    Ok(Json(attempt))
}

/// Scores a submission and records the result on the attempt.
///
/// * Answers are matched against the correct options of the question they name.
/// * Unknown question ids are ignored; repeated answers each count.
/// * Re-submitting overwrites the previous result.
pub async fn submit_quiz(
    State(pool): State<SqlitePool>,
    Path(attempt_id): Path<i64>,
    AppJson(req): AppJson<SubmitQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = pool.begin().await?;

    let attempt = sqlx::query_as::<_, QuizAttempt>(
        r#"
        SELECT id, user_id, quiz_id, score, max_score, percentage, is_passed,
               time_taken_minutes, started_at, completed_at
        FROM quiz_attempts
        WHERE id = ?
        "#,
    )
    .bind(attempt_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::NotFound("Attempt not found".to_string()))?;

    let passing_score: Option<f64> =
        sqlx::query_scalar::<_, Option<f64>>("SELECT passing_score FROM quizzes WHERE id = ?")
            .bind(attempt.quiz_id)
            .fetch_optional(&mut *tx)
            .await?
            .flatten();

    let keys = load_answer_keys(&mut tx, &req.answers).await?;
    let summary = score_answers(&keys, &req.answers, passing_score);

    let completed_at = Utc::now();
    let time_taken_minutes = (completed_at - attempt.started_at).num_minutes();

    sqlx::query(
        r#"
        UPDATE quiz_attempts
        SET score = ?, max_score = ?, percentage = ?, is_passed = ?,
            time_taken_minutes = ?, completed_at = ?
        WHERE id = ?
        "#,
    )
    .bind(summary.score)
    .bind(summary.max_score)
    .bind(summary.percentage)
    .bind(summary.passed)
    .bind(time_taken_minutes)
    .bind(completed_at)
    .bind(attempt_id)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("Failed to record attempt {}: {:?}", attempt_id, e);
        AppError::from(e)
    })?;

    tx.commit().await?;

    tracing::info!(
        attempt_id,
        percentage = summary.percentage,
        passed = summary.passed,
        "Quiz attempt scored"
    );

    Ok(Json(QuizResult::new(attempt_id, summary)))
}
