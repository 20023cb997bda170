use std::sync::Arc;
use axum::{
    Router,
    routing::{get, post},
};

use crate::AllocationEngine;
use crate::handlers::{
    setup_doctor,
    book_token,
    cancel_token,
    relieve_starvation,
    get_doctor_schedule,
};

pub fn create_opd_queue_router(engine: Arc<AllocationEngine>) -> Router {
    Router::new()
        .route("/setup-doctor/{doctor_id}", post(setup_doctor))
        .route("/book-token/{doctor_id}/{slot_id}", post(book_token))
        .route("/cancel-token/{doctor_id}/{slot_id}/{token_id}", post(cancel_token))
        .route("/relieve-starvation/{doctor_id}/{slot_id}", post(relieve_starvation))
        .route("/schedule/{doctor_id}", get(get_doctor_schedule))
        .with_state(engine)
}
