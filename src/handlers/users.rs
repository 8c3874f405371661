// src/handlers/users.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use sqlx::{SqliteExecutor, SqlitePool};

use crate::{
    error::AppError,
    extract::AppJson,
    handlers::{auth::USER_COLUMNS, taxonomy::find_active_specialization},
    models::{
        attempt::AttemptHistoryEntry,
        user::{UpdateSpecializationRequest, User, UserScores},
    },
    utils::jwt::Claims,
};

pub(crate) async fn find_user<'e>(
    executor: impl SqliteExecutor<'e>,
    id: i64,
) -> Result<User, AppError> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))
}

/// Returns the user behind the bearer token.
pub async fn me(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    Ok(Json(find_user(&pool, user_id).await?))
}

pub async fn get_user(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(find_user(&pool, id).await?))
}

/// Sets the user's preferred specialization. The specialization must be active.
pub async fn update_specialization(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<UpdateSpecializationRequest>,
) -> Result<impl IntoResponse, AppError> {
    find_user(&pool, id).await?;
    find_active_specialization(&pool, payload.specialization_id).await?;

    let user = sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET preferred_specialization_id = ? WHERE id = ? RETURNING {USER_COLUMNS}"
    ))
    .bind(payload.specialization_id)
    .bind(id)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to update specialization of user {}: {:?}", id, e);
        AppError::from(e)
    })?;

    Ok(Json(user))
}

pub async fn get_scores(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let scores = sqlx::query_as::<_, UserScores>(
        r#"
        SELECT readiness_score, technical_score, soft_skills_score, leadership_score
        FROM users
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(scores))
}

/// Lists a user's attempts, most recently completed first; open attempts last.
pub async fn list_attempts(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    find_user(&pool, id).await?;

    let attempts = sqlx::query_as::<_, AttemptHistoryEntry>(
        r#"
        SELECT a.id, a.quiz_id, q.title AS quiz_title, a.score, a.max_score,
               a.percentage, a.is_passed, a.started_at, a.completed_at
        FROM quiz_attempts a
        JOIN quizzes q ON q.id = a.quiz_id
        WHERE a.user_id = ?
        ORDER BY a.completed_at IS NULL, a.completed_at DESC, a.id DESC
        "#,
    )
    .bind(id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(attempts))
}
