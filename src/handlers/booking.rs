use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::db::queries::DATE_FMT;
use crate::errors::AppError;
use crate::models::{Reservation, Resource};
use crate::services::{BookingResult, DayAvailability};
use crate::state::AppState;

fn parse_date(s: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(s, DATE_FMT)
        .map_err(|_| AppError::InvalidRequest(format!("invalid date: {s}, expected YYYY-MM-DD")))
}

// GET /api/resources
pub async fn list_resources(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Resource>>, AppError> {
    Ok(Json(state.catalog.list_resources()?))
}

// GET /api/availability?resource_id=gym&date=2025-11-01
#[derive(Deserialize)]
pub struct AvailabilityQuery {
    pub resource_id: String,
    pub date: String,
}

pub async fn get_availability(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<DayAvailability>, AppError> {
    let date = parse_date(&query.date)?;
    let day = state.booking.available_slots(&query.resource_id, date)?;
    Ok(Json(day))
}

// POST /api/bookings
#[derive(Deserialize)]
pub struct BookingRequest {
    pub resource_id: String,
    pub date: String,
    pub slot_id: String,
    pub requester_id: String,
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(body): Json<BookingRequest>,
) -> Result<Json<BookingResult>, AppError> {
    let date = parse_date(&body.date)?;
    let result = state
        .booking
        .book(&body.resource_id, date, &body.slot_id, &body.requester_id)?;
    Ok(Json(result))
}

// POST /api/bookings/:id/cancel
#[derive(Deserialize)]
pub struct CancelRequest {
    pub requester_id: String,
}

pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<CancelRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.booking.cancel_booking(&id, &body.requester_id)?;
    Ok(Json(serde_json::json!({"ok": true})))
}

// GET /api/bookings?requester_id=resident-a
#[derive(Deserialize)]
pub struct MyBookingsQuery {
    pub requester_id: String,
}

pub async fn my_bookings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MyBookingsQuery>,
) -> Result<Json<Vec<Reservation>>, AppError> {
    Ok(Json(state.booking.my_bookings(&query.requester_id)?))
}
