/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use onboard_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = onboard_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, middleware::security::SecurityHeadersLayer, routes};
use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{header, HeaderValue, Method},
    middleware::{from_fn_with_state, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use onboard_shared::{
    auth::{jwt::JwtIssuer, middleware::authenticate},
    registration::RegistrationService,
    storage::{FileStore, LocalFileStore},
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Token issuer built from the configured secret
    pub tokens: Arc<JwtIssuer>,

    /// Registration workflow
    pub registration: RegistrationService,
}

impl AppState {
    /// Creates application state storing documents under `UPLOAD_DIR`
    pub fn new(db: PgPool, config: Config) -> Self {
        let files = Arc::new(LocalFileStore::new(&config.storage.upload_dir));
        Self::with_file_store(db, config, files)
    }

    /// Creates application state with a custom document store
    pub fn with_file_store(db: PgPool, config: Config, files: Arc<dyn FileStore>) -> Self {
        let tokens = Arc::new(JwtIssuer::with_ttl(
            config.jwt.secret.clone(),
            chrono::Duration::hours(config.jwt.expiration_hours),
        ));
        let registration = RegistrationService::new(db.clone(), files, tokens.clone());

        Self {
            db,
            config: Arc::new(config),
            tokens,
            registration,
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET  /health                  # Health check (public)
/// └── /api/
///     ├── POST   /register          # Multipart registration (public, body limit)
///     ├── POST   /login             # Credential login (public)
///     ├── GET    /profile           # Authenticated
///     ├── PUT    /profile           # Authenticated
///     ├── GET    /companies         # Authenticated
///     ├── GET    /companies/:id     # Authenticated
///     └── DELETE /companies/:id     # Authenticated, company admin only
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Security headers
/// 4. Authentication (per-route basis)
pub fn build_router(state: AppState) -> Router {
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let public_routes = Router::new()
        .route(
            "/register",
            post(routes::register::register)
                .layer(DefaultBodyLimit::max(state.config.api.max_body_bytes)),
        )
        .route("/login", post(routes::auth::login));

    let protected_routes = Router::new()
        .route(
            "/profile",
            get(routes::profile::get_profile).put(routes::profile::update_profile),
        )
        .route("/companies", get(routes::companies::list_companies))
        .route(
            "/companies/:id",
            get(routes::companies::get_company).delete(routes::companies::delete_company),
        )
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_layer));

    let api_routes = Router::new().merge(public_routes).merge(protected_routes);

    // Configure CORS based on environment
    let cors = if state.config.allows_any_origin() {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Validates the bearer token and injects the caller's `AuthContext` into
/// request extensions.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let caller = authenticate(req.headers(), &state.tokens)?;

    req.extensions_mut().insert(caller);

    Ok(next.run(req).await)
}
