use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use opd_queue_cell::{create_opd_queue_router, AllocationEngine};

pub fn create_router(engine: Arc<AllocationEngine>) -> Router {
    Router::new()
        .route("/", get(|| async { "OPD Token Allocation Engine is running!" }))
        .merge(create_opd_queue_router(engine))
}
