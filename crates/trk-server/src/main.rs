//! Tracker RS Server
//!
//! Binds the API and web routers to one listener, wires up the database,
//! session store, token services, and the optional Google federation.

use std::sync::Arc;

use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trk_api::AppState;
use trk_auth::{
    AuthGate, CookieConfig, GoogleFederation, MemoryRevocationLedger, MemorySessionStore,
    PgRevocationLedger, RevocationLedger, TokenService,
};
use trk_core::AppConfig;
use trk_db::{migrations, Database, DatabaseConfig};

mod health;

use health::HealthChecker;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    dotenvy::dotenv().ok();
    let config = AppConfig::from_env().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config from env: {}, using defaults", e);
        AppConfig::default()
    });

    info!(
        version = env!("CARGO_PKG_VERSION"),
        host = %config.server.host,
        port = config.server.port,
        "Starting Tracker RS"
    );

    // Connect to database
    let db_config = DatabaseConfig::with_url(&config.database.url);
    let db = match Database::connect(&db_config).await {
        Ok(db) => {
            info!("Connected to database");
            migrations::run(db.pool()).await?;
            Some(db)
        }
        Err(e) => {
            tracing::warn!(
                "Failed to connect to database: {}. Running without database.",
                e
            );
            None
        }
    };
    let pool = db.as_ref().map(|d| d.pool().clone());

    let app_state = build_state(config.clone(), pool.clone());
    let health_checker = Arc::new(HealthChecker::new(pool));

    spawn_session_sweeper(app_state.sessions.clone());

    let app = build_router(app_state, health_checker);

    let addr = config.server_addr();
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "info,trk_server=debug,trk_api=debug,trk_web=debug,tower_http=debug".into()
            }),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();
}

/// Assemble the shared application state from configuration
fn build_state(config: AppConfig, pool: Option<sqlx::PgPool>) -> AppState {
    let tokens = Arc::new(TokenService::new(
        config.auth.jwt_secret.as_bytes(),
        config.auth.access_token_expires_seconds,
        config.auth.refresh_token_expires_seconds,
    ));

    let ledger: Arc<dyn RevocationLedger> = match pool.clone() {
        Some(pool) => Arc::new(PgRevocationLedger::new(pool)),
        None => Arc::new(MemoryRevocationLedger::new()),
    };
    let gate = Arc::new(AuthGate::new(tokens.clone(), ledger.clone()));

    let federation = config.auth.google.as_ref().and_then(|google| {
        match GoogleFederation::new(google) {
            Ok(federation) => {
                info!("Google federation enabled");
                Some(Arc::new(federation))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Google federation misconfigured, disabling");
                None
            }
        }
    });

    // Secure cookie unless explicitly running in development
    let cookies = if config.server.dev_mode {
        CookieConfig::development()
    } else {
        CookieConfig::default()
    };

    AppState {
        db: pool,
        tokens,
        gate,
        ledger,
        sessions: Arc::new(MemorySessionStore::new()),
        cookies,
        federation,
        config: Arc::new(config),
    }
}

/// Periodic sweep of expired sessions; lookups also evict lazily
fn spawn_session_sweeper(sessions: Arc<dyn trk_auth::SessionStore>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(3600));
        loop {
            interval.tick().await;
            match sessions.cleanup_expired() {
                Ok(0) => {}
                Ok(count) => tracing::debug!(count, "expired sessions swept"),
                Err(e) => tracing::warn!(error = %e, "session sweep failed"),
            }
        }
    });
}

/// Build the application router
fn build_router(state: AppState, health: Arc<HealthChecker>) -> Router {
    let health_routes = Router::new()
        .route("/health", get(health::liveness))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(health);

    let app_routes = trk_api::router().merge(trk_web::router()).with_state(state);

    Router::new()
        .merge(health_routes)
        .merge(app_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn test_app() -> Router {
        let state = build_state(AppConfig::default(), None);
        build_router(state, Arc::new(HealthChecker::new(None)))
    }

    #[test]
    fn test_session_cookie_secure_unless_dev_mode() {
        let state = build_state(AppConfig::default(), None);
        assert!(state.cookies.secure);

        let mut dev = AppConfig::default();
        dev.server.dev_mode = true;
        let state = build_state(dev, None);
        assert!(!state.cookies.secure);
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_readiness_without_database_is_healthy() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .uri("/health/ready")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_login_page_served() {
        let response = test_app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_api_requires_authentication() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .uri("/api/auth/me")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
