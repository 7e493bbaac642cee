use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use nola_db::{DbPool, PgMartRepository};
use serde::Serialize;
use tracing::warn;

/// Body of `GET /`; the frontend and load balancers probe for it.
pub const ONLINE_STATUS: &str = "NOLA Analytics Backend está online";

const DATABASE_FAILED_DETAIL: &str = "database query failed; see server log";
const MART_LOOKUP_FAILED_DETAIL: &str = "mart lookup failed; see server log";

#[derive(Clone)]
pub struct HealthState {
    db_pool: DbPool,
    marts: Arc<PgMartRepository>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RootStatus {
    pub status: &'static str,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub database: HealthCheck,
    pub marts: HealthCheck,
    pub checked_at: String,
}

pub fn router(db_pool: DbPool, marts: Arc<PgMartRepository>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .with_state(HealthState { db_pool, marts })
}

pub async fn root() -> Json<RootStatus> {
    Json(RootStatus { status: ONLINE_STATUS })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let database = database_check(&state.db_pool).await;
    let marts = if database.status == "ready" {
        marts_check(&state.marts).await
    } else {
        HealthCheck { status: "skipped", detail: "database is not reachable".to_string() }
    };
    let ready = database.status == "ready" && marts.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "nola-server runtime initialized".to_string(),
        },
        database,
        marts,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn database_check(pool: &DbPool) -> HealthCheck {
    match sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await {
        Ok(_) => HealthCheck { status: "ready", detail: "database query succeeded".to_string() },
        Err(error) => {
            warn!(
                event_name = "system.health.database_failed",
                correlation_id = "health",
                error = %error,
                "health database query failed"
            );
            HealthCheck { status: "degraded", detail: DATABASE_FAILED_DETAIL.to_string() }
        }
    }
}

async fn marts_check(marts: &PgMartRepository) -> HealthCheck {
    match marts.mart_status().await {
        Ok(statuses) => {
            let missing: Vec<_> = statuses
                .into_iter()
                .filter(|status| !status.present)
                .map(|status| status.relation)
                .collect();
            if missing.is_empty() {
                HealthCheck { status: "ready", detail: "all data marts present".to_string() }
            } else {
                HealthCheck {
                    status: "degraded",
                    detail: format!("missing data marts (run `dbt build`): {}", missing.join(", ")),
                }
            }
        }
        Err(error) => {
            warn!(
                event_name = "system.health.mart_lookup_failed",
                correlation_id = "health",
                error = %error,
                "health mart lookup failed"
            );
            HealthCheck { status: "degraded", detail: MART_LOOKUP_FAILED_DETAIL.to_string() }
        }
    }
}
