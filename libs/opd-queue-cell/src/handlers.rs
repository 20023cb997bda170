use std::sync::Arc;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    response::Json,
};
use serde_json::{json, Value};
use tracing::{debug, info};

use shared_models::error::AppError;

use crate::{AllocationEngine, BookTokenQuery, OpdQueueError, Slot, Token};

fn map_queue_error(e: OpdQueueError) -> AppError {
    debug!("Queue operation refused: {}", e);
    match e {
        OpdQueueError::CapacityExceeded { .. } => AppError::Conflict(e.to_string()),
        OpdQueueError::DoctorNotFound(_) | OpdQueueError::SlotNotFound { .. } => {
            AppError::NotFound(e.to_string())
        }
    }
}

/// Replace a doctor's schedule
pub async fn setup_doctor(
    State(engine): State<Arc<AllocationEngine>>,
    Path(doctor_id): Path<String>,
    payload: Result<Json<Vec<Slot>>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(slots) = payload.map_err(|rejection| {
        debug!("Rejected schedule payload for doctor {}: {}", doctor_id, rejection);
        AppError::BadRequest(rejection.body_text())
    })?;

    info!("Schedule setup for doctor {} with {} slots", doctor_id, slots.len());

    engine.set_doctor_schedule(&doctor_id, slots).await;

    Ok(Json(json!({
        "status": "success",
        "message": format!("Schedule for {} initialized", doctor_id)
    })))
}

/// Admit a patient into a slot queue
pub async fn book_token(
    State(engine): State<Arc<AllocationEngine>>,
    Path((doctor_id, slot_id)): Path<(String, String)>,
    query: Result<Query<BookTokenQuery>, QueryRejection>,
) -> Result<Json<Token>, AppError> {
    let Query(query) = query.map_err(|rejection| {
        debug!("Rejected booking query for slot {}: {}", slot_id, rejection);
        AppError::ValidationError(rejection.body_text())
    })?;

    let patient_name = query.name.trim();
    if patient_name.is_empty() {
        return Err(AppError::ValidationError("Patient name is required".to_string()));
    }

    let token = engine
        .allocate(&doctor_id, &slot_id, patient_name, query.priority)
        .await
        .map_err(map_queue_error)?;

    Ok(Json(token))
}

/// Cancel a token; unknown tokens are not an error
pub async fn cancel_token(
    State(engine): State<Arc<AllocationEngine>>,
    Path((doctor_id, slot_id, token_id)): Path<(String, String, String)>,
) -> Json<Value> {
    let removed = engine.cancel(&doctor_id, &slot_id, &token_id).await;

    Json(json!({
        "status": "success",
        "removed": removed
    }))
}

/// Run the fairness pass on one slot
pub async fn relieve_starvation(
    State(engine): State<Arc<AllocationEngine>>,
    Path((doctor_id, slot_id)): Path<(String, String)>,
) -> Json<Value> {
    let upgrade = engine.relieve_pressure(&doctor_id, &slot_id).await;

    Json(json!({
        "upgraded": upgrade
    }))
}

/// Read-only view of a doctor's slots and their ordered queues
pub async fn get_doctor_schedule(
    State(engine): State<Arc<AllocationEngine>>,
    Path(doctor_id): Path<String>,
) -> Result<Json<Vec<Slot>>, AppError> {
    engine
        .doctor_schedule(&doctor_id)
        .await
        .map(Json)
        .ok_or_else(|| map_queue_error(OpdQueueError::DoctorNotFound(doctor_id)))
}
