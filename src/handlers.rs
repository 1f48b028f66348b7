// src/handlers.rs
use actix_web::{web, HttpResponse, Responder};
use log::error;
use serde_json::json;

use crate::orchestrator::ScanOrchestrator;
use crate::snapshot::SnapshotCache;

pub struct AppState {
    pub orchestrator: ScanOrchestrator,
    pub snapshot: SnapshotCache,
}

/// GET /api/tokens - the current snapshot, running an ingestion cycle if the
/// cached one has expired.
pub async fn get_tokens(state: web::Data<AppState>) -> impl Responder {
    match state.snapshot.get_snapshot(&state.orchestrator).await {
        Ok(snapshot) => HttpResponse::Ok().json(snapshot),
        Err(e) => {
            error!("💥 [HTTP] /api/tokens failed: {}", e);
            HttpResponse::InternalServerError().json(json!({
                "error": e.kind(),
                "message": e.to_string(),
            }))
        }
    }
}

/// GET /health
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}
