// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use validator::Validate;

use crate::{
    error::{AppError, is_unique_violation},
    extract::AppJson,
    handlers::auth::USER_COLUMNS,
    models::{
        quiz::CreateQuizRequest,
        taxonomy::{
            BranchAdminRow, BranchListParams, CreateBranchRequest, CreateSectorRequest,
            CreateSpecializationRequest, SectorAdminRow, SpecializationAdminRow,
            SpecializationListParams, UpdateBranchRequest, UpdateSectorRequest,
            UpdateSpecializationRequest,
        },
        user::{AdminUpdateUserRequest, UserListEntry},
    },
    utils::html::{clean_html, clean_optional},
};

/// Tables whose rows are soft-deleted through `is_active`.
#[derive(Debug, Clone, Copy)]
enum Table {
    Sectors,
    Branches,
    Specializations,
    Quizzes,
    Users,
}

impl Table {
    fn name(self) -> &'static str {
        match self {
            Table::Sectors => "sectors",
            Table::Branches => "branches",
            Table::Specializations => "specializations",
            Table::Quizzes => "quizzes",
            Table::Users => "users",
        }
    }

    fn not_found(self) -> AppError {
        let entity = match self {
            Table::Sectors => "Sector",
            Table::Branches => "Branch",
            Table::Specializations => "Specialization",
            Table::Quizzes => "Quiz",
            Table::Users => "User",
        };
        AppError::NotFound(format!("{entity} not found"))
    }
}

/// Fails with the table's NotFound error unless a row with `id` exists,
/// active or not.
async fn ensure_exists(pool: &SqlitePool, table: Table, id: i64) -> Result<(), AppError> {
    let found: Option<i64> = sqlx::query_scalar(&format!(
        "SELECT id FROM {} WHERE id = ?",
        table.name()
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    found.map(|_| ()).ok_or_else(|| table.not_found())
}

/// Clears `is_active` on a row. The row itself is kept.
async fn deactivate(pool: &SqlitePool, table: Table, id: i64) -> Result<StatusCode, AppError> {
    let result = sqlx::query(&format!(
        "UPDATE {} SET is_active = 0 WHERE id = ?",
        table.name()
    ))
    .bind(id)
    .execute(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to deactivate {} {}: {:?}", table.name(), id, e);
        AppError::from(e)
    })?;

    if result.rows_affected() == 0 {
        return Err(table.not_found());
    }

    tracing::info!(table = table.name(), id, "Row deactivated");
    Ok(StatusCode::NO_CONTENT)
}

/// Runs a partial UPDATE assembled by the caller. `set_count` is the number of
/// assignments pushed; zero means there is nothing to write.
async fn apply_update(
    pool: &SqlitePool,
    table: Table,
    id: i64,
    mut builder: QueryBuilder<'_, Sqlite>,
    set_count: usize,
    conflict_message: &str,
) -> Result<StatusCode, AppError> {
    if set_count == 0 {
        ensure_exists(pool, table, id).await?;
        return Ok(StatusCode::OK);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    let result = builder.build().execute(pool).await.map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict(conflict_message.to_string())
        } else {
            tracing::error!("Failed to update {} {}: {:?}", table.name(), id, e);
            AppError::from(e)
        }
    })?;

    if result.rows_affected() == 0 {
        return Err(table.not_found());
    }

    Ok(StatusCode::OK)
}

// ---------------------------------------------------------------------------
// Sectors
// ---------------------------------------------------------------------------

/// Lists all sectors, inactive ones included, with their branch counts.
pub async fn list_sectors(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let sectors = sqlx::query_as::<_, SectorAdminRow>(
        r#"
        SELECT s.id, s.name, s.description, s.is_active, s.created_at,
               (SELECT COUNT(*) FROM branches b WHERE b.sector_id = s.id) AS branch_count
        FROM sectors s
        ORDER BY s.id
        "#,
    )
    .fetch_all(&pool)
    .await?;

    Ok(Json(sectors))
}

pub async fn create_sector(
    State(pool): State<SqlitePool>,
    AppJson(payload): AppJson<CreateSectorRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO sectors (name, description) VALUES (?, ?) RETURNING id",
    )
    .bind(payload.name.trim())
    .bind(clean_optional(payload.description))
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict("Sector already exists".to_string())
        } else {
            tracing::error!("Failed to create sector: {:?}", e);
            AppError::from(e)
        }
    })?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({"id": id}))))
}

pub async fn update_sector(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<UpdateSectorRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE sectors SET ");
    let mut separated = builder.separated(", ");
    let mut set_count = 0;

    if let Some(name) = payload.name {
        separated.push("name = ");
        separated.push_bind_unseparated(name.trim().to_string());
        set_count += 1;
    }

    if let Some(description) = payload.description {
        separated.push("description = ");
        separated.push_bind_unseparated(clean_html(&description));
        set_count += 1;
    }

    if let Some(is_active) = payload.is_active {
        separated.push("is_active = ");
        separated.push_bind_unseparated(is_active);
        set_count += 1;
    }

    apply_update(&pool, Table::Sectors, id, builder, set_count, "Sector already exists").await
}

/// Soft-deletes a sector. Its branches are left untouched.
pub async fn delete_sector(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    deactivate(&pool, Table::Sectors, id).await
}

// ---------------------------------------------------------------------------
// Branches
// ---------------------------------------------------------------------------

/// Lists all branches, optionally only those of one sector.
pub async fn list_branches(
    State(pool): State<SqlitePool>,
    Query(params): Query<BranchListParams>,
) -> Result<impl IntoResponse, AppError> {
    let branches = sqlx::query_as::<_, BranchAdminRow>(
        r#"
        SELECT b.id, b.name, b.description, b.sector_id, s.name AS sector_name, b.is_active,
               (SELECT COUNT(*) FROM specializations sp WHERE sp.branch_id = b.id) AS specialization_count
        FROM branches b
        LEFT JOIN sectors s ON s.id = b.sector_id
        WHERE (? IS NULL OR b.sector_id = ?)
        ORDER BY b.id
        "#,
    )
    .bind(params.sector_id)
    .bind(params.sector_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(branches))
}

pub async fn create_branch(
    State(pool): State<SqlitePool>,
    AppJson(payload): AppJson<CreateBranchRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    ensure_exists(&pool, Table::Sectors, payload.sector_id).await?;

    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO branches (name, description, sector_id) VALUES (?, ?, ?) RETURNING id",
    )
    .bind(payload.name.trim())
    .bind(clean_optional(payload.description))
    .bind(payload.sector_id)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create branch: {:?}", e);
        AppError::from(e)
    })?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({"id": id}))))
}

pub async fn update_branch(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<UpdateBranchRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    if let Some(sector_id) = payload.sector_id {
        ensure_exists(&pool, Table::Sectors, sector_id).await?;
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE branches SET ");
    let mut separated = builder.separated(", ");
    let mut set_count = 0;

    if let Some(name) = payload.name {
        separated.push("name = ");
        separated.push_bind_unseparated(name.trim().to_string());
        set_count += 1;
    }

    if let Some(description) = payload.description {
        separated.push("description = ");
        separated.push_bind_unseparated(clean_html(&description));
        set_count += 1;
    }

    if let Some(sector_id) = payload.sector_id {
        separated.push("sector_id = ");
        separated.push_bind_unseparated(sector_id);
        set_count += 1;
    }

    if let Some(is_active) = payload.is_active {
        separated.push("is_active = ");
        separated.push_bind_unseparated(is_active);
        set_count += 1;
    }

    apply_update(&pool, Table::Branches, id, builder, set_count, "Branch already exists").await
}

pub async fn delete_branch(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    deactivate(&pool, Table::Branches, id).await
}

// ---------------------------------------------------------------------------
// Specializations
// ---------------------------------------------------------------------------

/// Lists all specializations, optionally only those of one branch.
pub async fn list_specializations(
    State(pool): State<SqlitePool>,
    Query(params): Query<SpecializationListParams>,
) -> Result<impl IntoResponse, AppError> {
    let specializations = sqlx::query_as::<_, SpecializationAdminRow>(
        r#"
        SELECT sp.id, sp.name, sp.description, sp.branch_id,
               b.name AS branch_name, s.name AS sector_name, sp.is_active,
               (SELECT COUNT(*) FROM quizzes q WHERE q.specialization_id = sp.id) AS quiz_count
        FROM specializations sp
        LEFT JOIN branches b ON b.id = sp.branch_id
        LEFT JOIN sectors s ON s.id = b.sector_id
        WHERE (? IS NULL OR sp.branch_id = ?)
        ORDER BY sp.id
        "#,
    )
    .bind(params.branch_id)
    .bind(params.branch_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(specializations))
}

pub async fn create_specialization(
    State(pool): State<SqlitePool>,
    AppJson(payload): AppJson<CreateSpecializationRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    ensure_exists(&pool, Table::Branches, payload.branch_id).await?;

    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO specializations (name, description, branch_id) VALUES (?, ?, ?) RETURNING id",
    )
    .bind(payload.name.trim())
    .bind(clean_optional(payload.description))
    .bind(payload.branch_id)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create specialization: {:?}", e);
        AppError::from(e)
    })?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({"id": id}))))
}

pub async fn update_specialization(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<UpdateSpecializationRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    if let Some(branch_id) = payload.branch_id {
        ensure_exists(&pool, Table::Branches, branch_id).await?;
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE specializations SET ");
    let mut separated = builder.separated(", ");
    let mut set_count = 0;

    if let Some(name) = payload.name {
        separated.push("name = ");
        separated.push_bind_unseparated(name.trim().to_string());
        set_count += 1;
    }

    if let Some(description) = payload.description {
        separated.push("description = ");
        separated.push_bind_unseparated(clean_html(&description));
        set_count += 1;
    }

    if let Some(branch_id) = payload.branch_id {
        separated.push("branch_id = ");
        separated.push_bind_unseparated(branch_id);
        set_count += 1;
    }

    if let Some(is_active) = payload.is_active {
        separated.push("is_active = ");
        separated.push_bind_unseparated(is_active);
        set_count += 1;
    }

    apply_update(
        &pool,
        Table::Specializations,
        id,
        builder,
        set_count,
        "Specialization already exists",
    )
    .await
}

pub async fn delete_specialization(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    deactivate(&pool, Table::Specializations, id).await
}

// ---------------------------------------------------------------------------
// Quizzes
// ---------------------------------------------------------------------------

/// Creates a quiz with its questions and options in a single transaction.
///
/// Questions and options keep the order they were sent in.
pub async fn create_quiz(
    State(pool): State<SqlitePool>,
    AppJson(payload): AppJson<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    ensure_exists(&pool, Table::Specializations, payload.specialization_id).await?;

    let mut tx = pool.begin().await?;

    let quiz_id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO quizzes
        (title, description, specialization_id, difficulty_level, time_limit_minutes, passing_score)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(payload.title.trim())
    .bind(clean_optional(payload.description))
    .bind(payload.specialization_id)
    .bind(payload.difficulty_level)
    .bind(payload.time_limit_minutes.unwrap_or(30))
    .bind(payload.passing_score.unwrap_or(crate::utils::scoring::DEFAULT_PASSING_SCORE))
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create quiz: {:?}", e);
        AppError::from(e)
    })?;

    for (question_index, question) in payload.questions.into_iter().enumerate() {
        let question_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO questions
            (quiz_id, question_text, question_type, points, order_index, explanation)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(quiz_id)
        .bind(question.question_text)
        .bind(question.question_type)
        .bind(question.points.unwrap_or(1))
        .bind(question_index as i64)
        .bind(clean_optional(question.explanation))
        .fetch_one(&mut *tx)
        .await?;

        for (option_index, option) in question.options.into_iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO question_options (question_id, option_text, is_correct, order_index)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(question_id)
            .bind(option.option_text)
            .bind(option.is_correct)
            .bind(option_index as i64)
            .execute(&mut *tx)
            .await?;
        }
    }

    tx.commit().await?;

    tracing::info!(quiz_id, "Quiz created");

    Ok((StatusCode::CREATED, Json(serde_json::json!({"id": quiz_id}))))
}

pub async fn delete_quiz(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    deactivate(&pool, Table::Quizzes, id).await
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// Lists all users with the name of their preferred specialization.
pub async fn list_users(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let columns = USER_COLUMNS
        .split(", ")
        .map(|c| format!("u.{}", c.trim()))
        .collect::<Vec<_>>()
        .join(", ");

    let users = sqlx::query_as::<_, UserListEntry>(&format!(
        r#"
        SELECT {columns}, sp.name AS specialization_name
        FROM users u
        LEFT JOIN specializations sp ON sp.id = u.preferred_specialization_id
        ORDER BY u.id DESC
        "#
    ))
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list users: {:?}", e);
        AppError::from(e)
    })?;

    Ok(Json(users))
}

/// Updates user information.
pub async fn update_user(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<AdminUpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    if let Some(specialization_id) = payload.preferred_specialization_id {
        ensure_exists(&pool, Table::Specializations, specialization_id).await?;
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE users SET ");
    let mut separated = builder.separated(", ");
    let mut set_count = 0;

    if let Some(name) = payload.name {
        separated.push("name = ");
        separated.push_bind_unseparated(name.trim().to_string());
        set_count += 1;
    }

    if let Some(email) = payload.email {
        separated.push("email = ");
        separated.push_bind_unseparated(email.trim().to_lowercase());
        set_count += 1;
    }

    if let Some(role) = payload.role {
        separated.push("role = ");
        separated.push_bind_unseparated(role);
        set_count += 1;
    }

    if let Some(is_active) = payload.is_active {
        separated.push("is_active = ");
        separated.push_bind_unseparated(is_active);
        set_count += 1;
    }

    let scores = [
        ("readiness_score = ", payload.readiness_score),
        ("technical_score = ", payload.technical_score),
        ("soft_skills_score = ", payload.soft_skills_score),
        ("leadership_score = ", payload.leadership_score),
    ];
    for (column, value) in scores {
        if let Some(value) = value {
            separated.push(column);
            separated.push_bind_unseparated(value);
            set_count += 1;
        }
    }

    if let Some(specialization_id) = payload.preferred_specialization_id {
        separated.push("preferred_specialization_id = ");
        separated.push_bind_unseparated(specialization_id);
        set_count += 1;
    }

    apply_update(&pool, Table::Users, id, builder, set_count, "Email already registered").await
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Row counts across the database.
#[derive(Debug, Serialize, FromRow)]
pub struct DatabaseStats {
    pub sectors: i64,
    pub active_sectors: i64,
    pub branches: i64,
    pub active_branches: i64,
    pub specializations: i64,
    pub active_specializations: i64,
    pub quizzes: i64,
    pub users: i64,
    pub active_users: i64,
    pub quiz_attempts: i64,
    pub avg_readiness_score: f64,
}

pub async fn get_stats(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let stats = sqlx::query_as::<_, DatabaseStats>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM sectors) AS sectors,
            (SELECT COUNT(*) FROM sectors WHERE is_active = 1) AS active_sectors,
            (SELECT COUNT(*) FROM branches) AS branches,
            (SELECT COUNT(*) FROM branches WHERE is_active = 1) AS active_branches,
            (SELECT COUNT(*) FROM specializations) AS specializations,
            (SELECT COUNT(*) FROM specializations WHERE is_active = 1) AS active_specializations,
            (SELECT COUNT(*) FROM quizzes) AS quizzes,
            (SELECT COUNT(*) FROM users) AS users,
            (SELECT COUNT(*) FROM users WHERE is_active = 1) AS active_users,
            (SELECT COUNT(*) FROM quiz_attempts) AS quiz_attempts,
            CAST(COALESCE((SELECT AVG(readiness_score) FROM users), 0.0) AS REAL) AS avg_readiness_score
        "#,
    )
    .fetch_one(&pool)
    .await?;

    Ok(Json(stats))
}
