// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    handlers::{admin, category, quiz, stats},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Every route requires a bearer token; `/api/admin` also requires the admin role.
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (stores, config, running quizzes).
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let quiz_routes = Router::new()
        .route("/sessions", post(quiz::start_quiz))
        .route(
            "/sessions/{id}",
            get(quiz::get_quiz).delete(quiz::exit_quiz),
        )
        .route("/sessions/{id}/answers", post(quiz::submit_answer));

    let student_routes = Router::new()
        .route("/categories", get(category::list_categories))
        .route("/stats/me", get(stats::my_stats))
        .route("/dashboard", get(stats::dashboard))
        .nest("/quiz", quiz_routes);

    let admin_routes = Router::new()
        .route("/questions", post(admin::create_question))
        .route(
            "/students/{id}/categories/{category_id}",
            put(admin::set_publication),
        )
        .route("/students/{id}/stats", get(admin::student_stats))
        .route(
            "/students/{id}/answers",
            delete(admin::reset_student_answers),
        )
        .route("/stats", get(admin::overview))
        .layer(middleware::from_fn(admin_middleware));

    let api = Router::new()
        .merge(student_routes)
        .nest("/admin", admin_routes)
        // Auth runs before the admin check nested above
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
