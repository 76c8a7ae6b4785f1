//! Health check endpoints
//!
//! Liveness answers unconditionally; readiness executes a real query
//! against the pool when one is configured.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use sqlx::PgPool;

/// Health check status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Individual component health
#[derive(Debug, Clone, Serialize)]
pub struct ComponentHealth {
    pub name: &'static str,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub response_time_ms: u64,
}

/// Overall health report
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub components: Vec<ComponentHealth>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl HealthReport {
    pub fn http_status(&self) -> StatusCode {
        match self.status {
            HealthStatus::Healthy => StatusCode::OK,
            HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Health checker service
pub struct HealthChecker {
    start_time: Instant,
    pool: Option<PgPool>,
}

impl HealthChecker {
    pub fn new(pool: Option<PgPool>) -> Self {
        Self {
            start_time: Instant::now(),
            pool,
        }
    }

    pub async fn check(&self) -> HealthReport {
        let mut components = Vec::new();
        let mut status = HealthStatus::Healthy;

        if let Some(ref pool) = self.pool {
            let db = check_database(pool).await;
            if db.status == HealthStatus::Unhealthy {
                status = HealthStatus::Unhealthy;
            }
            components.push(db);
        }

        HealthReport {
            status,
            version: env!("CARGO_PKG_VERSION"),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            components,
            timestamp: chrono::Utc::now(),
        }
    }
}

async fn check_database(pool: &PgPool) -> ComponentHealth {
    let start = Instant::now();
    let (status, message) = match sqlx::query("SELECT 1").execute(pool).await {
        Ok(_) => (HealthStatus::Healthy, None),
        Err(e) => {
            tracing::warn!(error = %e, "database health check failed");
            (HealthStatus::Unhealthy, Some(e.to_string()))
        }
    };

    ComponentHealth {
        name: "database",
        status,
        message,
        response_time_ms: start.elapsed().as_millis() as u64,
    }
}

/// Simple liveness check
pub async fn liveness() -> &'static str {
    "OK"
}

/// Readiness check including a database ping
pub async fn readiness(
    State(checker): State<Arc<HealthChecker>>,
) -> (StatusCode, Json<HealthReport>) {
    let report = checker.check().await;
    let status = report.http_status();
    (status, Json(report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_healthy_without_database() {
        let checker = HealthChecker::new(None);
        let report = checker.check().await;
        assert_eq!(report.status, HealthStatus::Healthy);
        assert!(report.components.is_empty());
    }

    #[test]
    fn test_http_status_mapping() {
        let report = HealthReport {
            status: HealthStatus::Unhealthy,
            version: "0.1.0",
            uptime_seconds: 1,
            components: vec![],
            timestamp: chrono::Utc::now(),
        };
        assert_eq!(report.http_status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
