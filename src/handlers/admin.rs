use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Reservation, Resource, SlotTemplate};
use crate::state::AppState;

fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

// POST /api/admin/resources
#[derive(Deserialize)]
pub struct CreateResourceRequest {
    pub id: String,
    pub name: String,
}

pub async fn create_resource(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateResourceRequest>,
) -> Result<Json<Resource>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let resource = state.catalog.add_resource(&body.id, &body.name)?;
    Ok(Json(resource))
}

// POST /api/admin/resources/:id/slots
#[derive(Deserialize)]
pub struct CreateSlotRequest {
    pub start: String,
    pub end: String,
    pub days: Option<Vec<String>>,
}

pub async fn create_slot(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(resource_id): Path<String>,
    Json(body): Json<CreateSlotRequest>,
) -> Result<Json<SlotTemplate>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let slot = state
        .catalog
        .add_slot(&resource_id, &body.start, &body.end, body.days)?;
    Ok(Json(slot))
}

// POST /api/admin/resources/:id/deactivate
pub async fn deactivate_resource(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(resource_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let cancelled = state.booking.deactivate_resource(&resource_id)?;
    Ok(Json(
        serde_json::json!({"ok": true, "cancelled_reservations": cancelled}),
    ))
}

// GET /api/admin/bookings
#[derive(Deserialize)]
pub struct ReservationsQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

pub async fn get_reservations(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ReservationsQuery>,
) -> Result<Json<Vec<Reservation>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let limit = query.limit.unwrap_or(50);
    let reservations = state.store.list_all(query.status.as_deref(), limit)?;
    Ok(Json(reservations))
}

// GET /api/admin/status
#[derive(Serialize)]
pub struct StatusResponse {
    resource_count: i64,
    upcoming_confirmed_count: i64,
    live_hold_count: i64,
}

pub async fn get_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<StatusResponse>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let stats = {
        let db = state.db.lock().unwrap();
        queries::get_dashboard_stats(&db)?
    };

    Ok(Json(StatusResponse {
        resource_count: stats.resource_count,
        upcoming_confirmed_count: stats.upcoming_confirmed_count,
        live_hold_count: stats.live_hold_count,
    }))
}
