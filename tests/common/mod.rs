// tests/common/mod.rs

#![allow(dead_code)]

use readiness::{config::Config, db, routes, state::AppState};
use serde_json::{Value, json};
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};

pub const ADMIN_EMAIL: &str = "admin@readiness.test";
pub const ADMIN_PASSWORD: &str = "admin-password";

pub struct TestApp {
    pub address: String,
    pub pool: SqlitePool,
    pub client: reqwest::Client,
}

pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3000".to_string()],
        admin_email: Some(ADMIN_EMAIL.to_string()),
        admin_password: Some(ADMIN_PASSWORD.to_string()),
    }
}

/// A single-connection in-memory database with migrations applied.
/// The connection is never recycled, so the data lives as long as the pool.
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");

    db::run_migrations(&pool)
        .await
        .expect("Failed to migrate database");

    pool
}

/// Spawns the app on a random port, seeded with an admin account.
pub async fn spawn_app() -> TestApp {
    let pool = test_pool().await;
    let config = test_config();

    db::seed_admin_user(&pool, &config)
        .await
        .expect("Failed to seed admin user");

    let state = AppState {
        pool: pool.clone(),
        config,
    };
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        pool,
        client: reqwest::Client::new(),
    }
}

pub fn unique_email() -> String {
    format!("u_{}@readiness.test", &uuid::Uuid::new_v4().to_string()[..8])
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn login(&self, email: &str, password: &str) -> Value {
        self.post(
            "/api/users/login",
            &json!({"email": email, "password": password}),
        )
        .await
        .json::<Value>()
        .await
        .expect("Failed to parse login json")
    }

    pub async fn admin_token(&self) -> String {
        let login = self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
        login["token"].as_str().expect("Token not found").to_string()
    }

    /// Registers a user and returns its id.
    pub async fn register(&self, email: &str, password: &str) -> i64 {
        let response = self
            .post(
                "/api/users/register",
                &json!({"name": "Test User", "email": email, "password": password}),
            )
            .await;
        assert_eq!(response.status().as_u16(), 201);

        let user: Value = response.json().await.unwrap();
        user["id"].as_i64().expect("user id")
    }

    pub async fn admin_post(&self, token: &str, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Creates an entity through an admin endpoint and returns its id.
    pub async fn admin_create(&self, token: &str, path: &str, body: Value) -> i64 {
        let response = self.admin_post(token, path, &body).await;
        assert_eq!(response.status().as_u16(), 201, "creating {path}");

        let created: Value = response.json().await.unwrap();
        created["id"].as_i64().expect("created id")
    }

    /// Sector → branch → specialization, returning the three ids.
    pub async fn seed_taxonomy(&self, token: &str, sector_name: &str) -> (i64, i64, i64) {
        let sector_id = self
            .admin_create(
                token,
                "/api/admin/sectors",
                json!({"name": sector_name, "description": "Sector description"}),
            )
            .await;
        let branch_id = self
            .admin_create(
                token,
                "/api/admin/branches",
                json!({"name": "Software Engineering", "sector_id": sector_id}),
            )
            .await;
        let specialization_id = self
            .admin_create(
                token,
                "/api/admin/specializations",
                json!({"name": "Backend Development", "branch_id": branch_id}),
            )
            .await;

        (sector_id, branch_id, specialization_id)
    }
}
