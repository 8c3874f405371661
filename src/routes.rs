// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, patch, post, put},
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    config::Config,
    handlers::{admin, auth, health, quiz, taxonomy, users},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

/// Assembles the main application router.
///
/// * Public taxonomy and quiz routes under `/api`.
/// * Account routes under `/api/users` (`/me` needs a bearer token).
/// * Admin routes under `/api/admin` (bearer token with admin role).
/// * Applies global middleware (Trace, CORS) and injects the state.
pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/sectors", get(taxonomy::list_sectors))
        .route("/sectors/{id}", get(taxonomy::get_sector))
        .route("/sectors/{id}/branches", get(taxonomy::list_sector_branches))
        .route("/sectors/{id}/hierarchy", get(taxonomy::get_sector_hierarchy))
        .route("/hierarchy", get(taxonomy::get_hierarchy))
        .route("/branches/{id}", get(taxonomy::get_branch))
        .route(
            "/branches/{id}/specializations",
            get(taxonomy::list_branch_specializations),
        )
        .route("/specializations/{id}", get(taxonomy::get_specialization))
        .route(
            "/specializations/{id}/quizzes",
            get(quiz::list_specialization_quizzes),
        )
        .route("/quizzes", get(quiz::list_quizzes))
        .route("/quizzes/{id}", get(quiz::get_quiz))
        .route("/quizzes/{id}/start", post(quiz::start_quiz))
        .route("/attempts/{id}", get(quiz::get_attempt))
        .route("/attempts/{id}/submit", post(quiz::submit_quiz));

    let user_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/{id}", get(users::get_user))
        .route("/{id}/specialization", patch(users::update_specialization))
        .route("/{id}/scores", get(users::get_scores))
        .route("/{id}/attempts", get(users::list_attempts))
        // Current user, bearer token required
        .merge(
            Router::new()
                .route("/me", get(users::me))
                .layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        );

    let admin_routes = Router::new()
        .route("/sectors", get(admin::list_sectors).post(admin::create_sector))
        .route(
            "/sectors/{id}",
            put(admin::update_sector).delete(admin::delete_sector),
        )
        .route("/branches", get(admin::list_branches).post(admin::create_branch))
        .route(
            "/branches/{id}",
            put(admin::update_branch).delete(admin::delete_branch),
        )
        .route(
            "/specializations",
            get(admin::list_specializations).post(admin::create_specialization),
        )
        .route(
            "/specializations/{id}",
            put(admin::update_specialization).delete(admin::delete_specialization),
        )
        .route("/quizzes", post(admin::create_quiz))
        .route("/quizzes/{id}", delete(admin::delete_quiz))
        .route("/users", get(admin::list_users))
        .route("/users/{id}", put(admin::update_user))
        .route("/stats", get(admin::get_stats))
        // Auth runs first, then the admin role check
        .layer(middleware::from_fn(admin_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let cors = cors_layer(&state.config);

    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        .nest("/api/users", user_routes)
        .nest("/api/admin", admin_routes)
        .nest("/api", public_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
