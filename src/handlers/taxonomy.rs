// src/handlers/taxonomy.rs

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use sqlx::{SqliteExecutor, SqlitePool};

use crate::{
    error::AppError,
    models::taxonomy::{Branch, Sector, SectorHierarchy, Specialization, build_hierarchy},
};

/// Fetches a sector only if it exists and is active.
pub(crate) async fn find_active_sector<'e>(
    executor: impl SqliteExecutor<'e>,
    id: i64,
) -> Result<Sector, AppError> {
    sqlx::query_as::<_, Sector>(
        r#"
        SELECT id, name, description, is_active, created_at
        FROM sectors
        WHERE id = ? AND is_active = 1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?
    .ok_or(AppError::NotFound("Sector not found".to_string()))
}

pub(crate) async fn find_active_branch<'e>(
    executor: impl SqliteExecutor<'e>,
    id: i64,
) -> Result<Branch, AppError> {
    sqlx::query_as::<_, Branch>(
        r#"
        SELECT id, name, description, sector_id, is_active, created_at
        FROM branches
        WHERE id = ? AND is_active = 1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?
    .ok_or(AppError::NotFound("Branch not found".to_string()))
}

pub(crate) async fn find_active_specialization<'e>(
    executor: impl SqliteExecutor<'e>,
    id: i64,
) -> Result<Specialization, AppError> {
    sqlx::query_as::<_, Specialization>(
        r#"
        SELECT id, name, description, branch_id, is_active, created_at
        FROM specializations
        WHERE id = ? AND is_active = 1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?
    .ok_or(AppError::NotFound("Specialization not found".to_string()))
}

/// Lists all active sectors, alphabetically.
pub async fn list_sectors(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let sectors = sqlx::query_as::<_, Sector>(
        r#"
        SELECT id, name, description, is_active, created_at
        FROM sectors
        WHERE is_active = 1
        ORDER BY name
        "#,
    )
    .fetch_all(&pool)
    .await?;

    Ok(Json(sectors))
}

pub async fn get_sector(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(find_active_sector(&pool, id).await?))
}

/// Lists the active branches of an active sector.
pub async fn list_sector_branches(
    State(pool): State<SqlitePool>,
    Path(sector_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    find_active_sector(&pool, sector_id).await?;

    let branches = sqlx::query_as::<_, Branch>(
        r#"
        SELECT id, name, description, sector_id, is_active, created_at
        FROM branches
        WHERE sector_id = ? AND is_active = 1
        ORDER BY name
        "#,
    )
    .bind(sector_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(branches))
}

pub async fn get_branch(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(find_active_branch(&pool, id).await?))
}

/// Lists the active specializations of an active branch.
pub async fn list_branch_specializations(
    State(pool): State<SqlitePool>,
    Path(branch_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    find_active_branch(&pool, branch_id).await?;

    let specializations = sqlx::query_as::<_, Specialization>(
        r#"
        SELECT id, name, description, branch_id, is_active, created_at
        FROM specializations
        WHERE branch_id = ? AND is_active = 1
        ORDER BY name
        "#,
    )
    .bind(branch_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(specializations))
}

pub async fn get_specialization(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(find_active_specialization(&pool, id).await?))
}

/// Returns one active sector with its active branches and specializations.
pub async fn get_sector_hierarchy(
    State(pool): State<SqlitePool>,
    Path(sector_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let sector = find_active_sector(&pool, sector_id).await?;

    let branches = sqlx::query_as::<_, Branch>(
        r#"
        SELECT id, name, description, sector_id, is_active, created_at
        FROM branches
        WHERE sector_id = ? AND is_active = 1
        ORDER BY name
        "#,
    )
    .bind(sector_id)
    .fetch_all(&pool)
    .await?;

    let specializations = sqlx::query_as::<_, Specialization>(
        r#"
        SELECT s.id, s.name, s.description, s.branch_id, s.is_active, s.created_at
        FROM specializations s
        JOIN branches b ON b.id = s.branch_id
        WHERE b.sector_id = ? AND b.is_active = 1 AND s.is_active = 1
        ORDER BY s.name
        "#,
    )
    .bind(sector_id)
    .fetch_all(&pool)
    .await?;

    let tree: Vec<SectorHierarchy> = build_hierarchy(vec![sector], branches, specializations);
    let sector = tree
        .into_iter()
        .next()
        .ok_or(AppError::NotFound("Sector not found".to_string()))?;

    Ok(Json(sector))
}

/// Returns the complete active taxonomy.
pub async fn get_hierarchy(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let sectors = sqlx::query_as::<_, Sector>(
        r#"
        SELECT id, name, description, is_active, created_at
        FROM sectors
        WHERE is_active = 1
        ORDER BY name
        "#,
    )
    .fetch_all(&pool)
    .await?;

    let branches = sqlx::query_as::<_, Branch>(
        r#"
        SELECT id, name, description, sector_id, is_active, created_at
        FROM branches
        WHERE is_active = 1
        ORDER BY name
        "#,
    )
    .fetch_all(&pool)
    .await?;

    let specializations = sqlx::query_as::<_, Specialization>(
        r#"
        SELECT id, name, description, branch_id, is_active, created_at
        FROM specializations
        WHERE is_active = 1
        ORDER BY name
        "#,
    )
    .fetch_all(&pool)
    .await?;

    Ok(Json(build_hierarchy(sectors, branches, specializations)))
}
