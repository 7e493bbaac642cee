//! Read-only JSON endpoints over the analytics marts.
//!
//! - `GET /api/v1/segments/em-risco`: at-risk customers with a count/segment envelope
//! - `GET /api/v1/rfm/risky-customers`: at-risk customers as a bare list, capped at 100
//! - `GET /api/v1/custom_query/`: whitelisted metric x dimension aggregate, capped at 20

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use nola_core::domain::customer::{CustomerRecord, SegmentResponse};
use nola_core::domain::metric::MetricPoint;
use nola_core::errors::{ApplicationError, InterfaceError, ValidationError};
use nola_core::query::{MetricQuery, SegmentQuery, RISKY_CUSTOMERS_ROW_LIMIT};
use nola_db::MartRepository;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct ApiState {
    repository: Arc<dyn MartRepository>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CustomQueryParams {
    pub metric: Option<String>,
    pub dimension: Option<String>,
    pub channel: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
    pub correlation_id: String,
}

#[derive(Debug)]
pub struct ApiError(InterfaceError);

impl ApiError {
    fn new(error: impl Into<ApplicationError>, correlation_id: &str) -> Self {
        Self(error.into().into_interface(correlation_id))
    }

    fn status(&self) -> StatusCode {
        match self.0 {
            InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            InterfaceError::SchemaMissing { .. } | InterfaceError::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let correlation_id = self.0.correlation_id().to_string();

        if status.is_client_error() {
            warn!(
                event_name = "api.request.rejected",
                correlation_id = %correlation_id,
                error = %self.0,
                "request rejected"
            );
        } else {
            error!(
                event_name = "api.request.failed",
                correlation_id = %correlation_id,
                status = status.as_u16(),
                error = %self.0,
                "request failed"
            );
        }

        (status, Json(ErrorBody { detail: self.0.user_message(), correlation_id })).into_response()
    }
}

pub fn router(repository: Arc<dyn MartRepository>) -> Router {
    Router::new()
        .route("/api/v1/segments/em-risco", get(at_risk_segment))
        .route("/api/v1/rfm/risky-customers", get(risky_customers))
        .route("/api/v1/custom_query/", get(custom_query))
        .route("/api/v1/custom_query", get(custom_query))
        .with_state(ApiState { repository })
}

pub async fn at_risk_segment(
    State(state): State<ApiState>,
) -> Result<Json<SegmentResponse>, ApiError> {
    let correlation_id = new_correlation_id();
    let query = SegmentQuery::at_risk();

    let customers = state
        .repository
        .customers_in_segment(&query)
        .await
        .map_err(|error| ApiError::new(error, &correlation_id))?;

    info!(
        event_name = "api.segment.served",
        correlation_id = %correlation_id,
        segment = %query.segment,
        row_count = customers.len(),
        "segment customers served"
    );
    Ok(Json(SegmentResponse::new(query.segment, customers)))
}

pub async fn risky_customers(
    State(state): State<ApiState>,
) -> Result<Json<Vec<CustomerRecord>>, ApiError> {
    let correlation_id = new_correlation_id();
    let query = SegmentQuery::at_risk().with_limit(RISKY_CUSTOMERS_ROW_LIMIT);

    let customers = state
        .repository
        .customers_in_segment(&query)
        .await
        .map_err(|error| ApiError::new(error, &correlation_id))?;

    info!(
        event_name = "api.risky_customers.served",
        correlation_id = %correlation_id,
        row_count = customers.len(),
        "risky customers served"
    );
    Ok(Json(customers))
}

pub async fn custom_query(
    State(state): State<ApiState>,
    params: Result<Query<CustomQueryParams>, QueryRejection>,
) -> Result<Json<Vec<MetricPoint>>, ApiError> {
    let correlation_id = new_correlation_id();
    let Query(params) = params.map_err(|rejection| {
        ApiError::new(ValidationError::MalformedQuery(rejection.body_text()), &correlation_id)
    })?;
    let query = MetricQuery::from_params(
        params.metric.as_deref(),
        params.dimension.as_deref(),
        params.channel.as_deref(),
    )
    .map_err(|error| ApiError::new(error, &correlation_id))?;

    let points = state
        .repository
        .metric_points(&query)
        .await
        .map_err(|error| ApiError::new(error, &correlation_id))?;
    let points = query.finish(points);

    info!(
        event_name = "api.custom_query.served",
        correlation_id = %correlation_id,
        metric = %query.metric,
        dimension = %query.dimension,
        channel = query.channel.channel().unwrap_or("*"),
        row_count = points.len(),
        "custom query served"
    );
    Ok(Json(points))
}

fn new_correlation_id() -> String {
    Uuid::new_v4().simple().to_string()
}
