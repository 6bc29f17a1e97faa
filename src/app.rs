use std::sync::Arc;

use axum::http::Method;
use axum::routing::{get, post, put};
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::authz::{OverridePolicy, SessionRegistry};
use crate::config::{AppConfig, GuardConfig};
use crate::db::SqliteRoleStore;
use crate::errors::AppError;
use crate::jwt::JwtConfig;
use crate::routes::{auth, health, licenses, roles};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub jwt: Arc<JwtConfig>,
    pub sessions: SessionRegistry,
    pub guard: GuardConfig,
    pub override_policy: OverridePolicy,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: AppConfig) -> Self {
        let sessions = SessionRegistry::new(SqliteRoleStore::resolver(pool.clone()));
        Self {
            pool,
            jwt: Arc::new(config.jwt),
            sessions,
            guard: config.guard,
            override_policy: OverridePolicy::new(config.role_override_enabled),
        }
    }
}

pub async fn create_app(pool: SqlitePool) -> Result<Router, AppError> {
    let config = AppConfig::from_env()?;
    Ok(create_app_with_config(pool, config))
}

pub fn create_app_with_config(pool: SqlitePool, config: AppConfig) -> Router {
    let state = AppState::new(pool, config);

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_origin(Any)
        .allow_headers(Any);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/me", get(auth::me))
        .route("/logout", post(auth::logout))
        .route("/role", get(roles::current_role))
        .route("/role/refresh", post(roles::refresh_role));

    let mut router = Router::new()
        .route("/api/health", get(health::health))
        .route("/dashboard", get(roles::dashboard))
        .route("/licenses/mine", get(licenses::my_licenses))
        .route("/organizations", get(licenses::list_organizations))
        .route("/organizations/:id/licenses", get(licenses::organization_licenses))
        .nest("/auth", auth_routes);

    // operator preview tooling only exists when explicitly switched on
    if state.override_policy.is_enabled() {
        router = router.route(
            "/debug/role-override",
            put(roles::set_role_override).delete(roles::clear_role_override),
        );
    }

    router
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
