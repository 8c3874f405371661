// src/models/user.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::utils::jwt::{ROLE_ADMIN, ROLE_USER};

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    /// Unique login identifier.
    pub email: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password_hash: String,

    pub name: String,

    /// 'user' or 'admin'.
    pub role: String,

    pub is_active: bool,

    pub preferred_specialization_id: Option<i64>,

    pub readiness_score: f64,
    pub technical_score: f64,
    pub soft_skills_score: f64,
    pub leadership_score: f64,

    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

/// Admin listing row: the user plus the name of their preferred specialization.
#[derive(Debug, Serialize, FromRow)]
pub struct UserListEntry {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub user: User,
    pub specialization_name: Option<String>,
}

/// The four readiness scores of a user.
#[derive(Debug, Serialize, FromRow)]
pub struct UserScores {
    pub readiness_score: f64,
    pub technical_score: f64,
    pub soft_skills_score: f64,
    pub leadership_score: f64,
}

/// DTO for creating a new user (Registration).
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Name length must be between 1 and 100 characters."
    ))]
    pub name: String,
    #[validate(email(message = "Email address is not valid."))]
    pub email: String,
    #[validate(length(
        min = 4,
        max = 128,
        message = "Password length must be between 4 and 128 characters."
    ))]
    pub password: String,
}

/// DTO for user login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 254))]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(rename = "type")]
    pub token_type: String,
    pub user: User,
}

/// DTO for choosing a preferred specialization.
#[derive(Debug, Deserialize)]
pub struct UpdateSpecializationRequest {
    pub specialization_id: i64,
}

/// DTO for an admin editing a user. Fields are optional.
#[derive(Debug, Deserialize, Validate)]
pub struct AdminUpdateUserRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(custom(function = validate_role))]
    pub role: Option<String>,
    pub is_active: Option<bool>,
    #[validate(range(min = 0.0, max = 100.0))]
    pub readiness_score: Option<f64>,
    #[validate(range(min = 0.0, max = 100.0))]
    pub technical_score: Option<f64>,
    #[validate(range(min = 0.0, max = 100.0))]
    pub soft_skills_score: Option<f64>,
    #[validate(range(min = 0.0, max = 100.0))]
    pub leadership_score: Option<f64>,
    pub preferred_specialization_id: Option<i64>,
}

fn validate_role(role: &str) -> Result<(), validator::ValidationError> {
    if role == ROLE_USER || role == ROLE_ADMIN {
        Ok(())
    } else {
        Err(validator::ValidationError::new("unknown_role"))
    }
}
