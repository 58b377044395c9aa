use crate::analytics;
use crate::db;
use crate::errors::{Error, Result};
use crate::metrics::{
    ANALYTICS_EMPTY_TOTAL, ANALYTICS_LATENCY_SECONDS, ANALYTICS_QUERIES_TOTAL,
    DEVICES_REGISTERED_TOTAL, DUPLICATE_DEVICES_TOTAL, READINGS_TOTAL, REJECTED_READINGS_TOTAL,
};
use crate::model::{AnalyticsResponse, Device, StatusResponse};
use crate::validate::validate;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

/// Naive UTC, fixed microsecond precision so stored values sort
/// chronologically as strings.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

#[derive(Debug, Clone)]
struct AppState {
    pool: SqlitePool,
}

#[derive(Debug, Deserialize)]
pub struct DeviceParams {
    name: String,
}

#[derive(Debug, Deserialize)]
pub struct ReadingParams {
    x: f64,
    y: f64,
    z: f64,
}

#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    start: Option<String>,
    end: Option<String>,
}

pub fn create_router(pool: SqlitePool) -> Router {
    let state = AppState { pool };

    Router::new()
        .route("/health", get(health))
        .route("/device", post(register_device))
        .route("/device/:device_id/data", post(add_reading))
        .route("/device/:device_id/analytics", get(get_analytics))
        .with_state(state)
}

pub fn timestamp_now() -> String {
    Utc::now().naive_utc().format(TIMESTAMP_FORMAT).to_string()
}

async fn health() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok".to_string(),
    })
}

async fn register_device(
    State(state): State<AppState>,
    Query(params): Query<DeviceParams>,
) -> Result<Json<Device>> {
    let mut conn = state.pool.acquire().await?;

    match db::create_device(&mut conn, &params.name).await {
        Ok(id) => {
            DEVICES_REGISTERED_TOTAL.inc();
            info!("Registered device {} as id {}", params.name, id);
            Ok(Json(Device {
                id,
                name: params.name,
            }))
        }
        Err(Error::DuplicateName(name)) => {
            DUPLICATE_DEVICES_TOTAL.inc();
            warn!("Rejected duplicate device name {:?}", name);
            Err(Error::DuplicateName(name))
        }
        Err(e) => Err(e),
    }
}

async fn add_reading(
    State(state): State<AppState>,
    Path(device_id): Path<i64>,
    Query(params): Query<ReadingParams>,
) -> Result<Json<StatusResponse>> {
    if let Err(e) = validate(params.x, params.y, params.z) {
        REJECTED_READINGS_TOTAL.inc();
        return Err(e);
    }

    let timestamp = timestamp_now();
    let mut conn = state.pool.acquire().await?;

    if !db::device_exists(&mut conn, device_id).await? {
        REJECTED_READINGS_TOTAL.inc();
        debug!("Reading for unknown device {}", device_id);
        return Err(Error::DeviceNotFound(device_id));
    }

    let reading = match db::insert_reading(
        &mut conn, device_id, &timestamp, params.x, params.y, params.z,
    )
    .await
    {
        Ok(reading) => reading,
        Err(Error::DeviceNotFound(id)) => {
            // Device vanished between the check and the insert
            REJECTED_READINGS_TOTAL.inc();
            warn!("Foreign key rejected reading for device {}", id);
            return Err(Error::DeviceNotFound(id));
        }
        Err(e) => return Err(e),
    };

    READINGS_TOTAL.inc();
    debug!(
        "Stored reading {} for device {} at {}",
        reading.id, reading.device_id, reading.timestamp
    );

    Ok(Json(StatusResponse {
        status: "data added".to_string(),
    }))
}

async fn get_analytics(
    State(state): State<AppState>,
    Path(device_id): Path<i64>,
    Query(params): Query<AnalyticsQuery>,
) -> Result<Json<AnalyticsResponse>> {
    ANALYTICS_QUERIES_TOTAL.inc();
    let timer = ANALYTICS_LATENCY_SECONDS.start_timer();

    // Empty bounds mean unbounded
    let start = params.start.as_deref().filter(|s| !s.is_empty());
    let end = params.end.as_deref().filter(|s| !s.is_empty());

    let rows = {
        let mut conn = state.pool.acquire().await?;
        db::query_readings(&mut conn, device_id, start, end).await?
    };

    let response = AnalyticsResponse::from(analytics::compute(&rows));
    if matches!(response, AnalyticsResponse::NoData { .. }) {
        ANALYTICS_EMPTY_TOTAL.inc();
    }
    timer.observe_duration();

    Ok(Json(response))
}
