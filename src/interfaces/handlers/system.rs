use actix_web::{web, get, HttpResponse, Responder};
use humantime::format_duration;
use once_cell::sync::Lazy;
use chrono::Utc;
use std::{
    time::Duration,
    sync::{atomic::{AtomicI64, Ordering}, RwLock},
};
use serde::Serialize;
use crate::{constants::START_TIME, repositories::gallery::GalleryRepository, settings::StorageBackend, AppState};

#[derive(Serialize, Clone, Default)]
struct HealthCheckResponse {
    status: String,
    uptime: String,
    timestamp: String,
    start_at: String,
    storage_backend: String,
    document_store: String,
    version: String,
}

impl HealthCheckResponse {
    fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

static LAST_CHECK: AtomicI64 = AtomicI64::new(0);
static CACHED_STATUS: Lazy<RwLock<HealthCheckResponse>> = Lazy::new(||
    RwLock::new(HealthCheckResponse::default())
);

async fn build_health_response(state: &web::Data<AppState>) -> HealthCheckResponse {
    let now_utc = Utc::now();
    let uptime_duration = now_utc.signed_duration_since(*START_TIME);
    let human_uptime = format_duration(Duration::from_secs(uptime_duration.num_seconds().max(0) as u64));

    let store_ok = match state.query_handler.gallery_repo.check_connection().await {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Document store health check failed");
            false
        }
    };

    let storage_backend = match state.storage_backend {
        StorageBackend::Hosted => "hosted",
        StorageBackend::Memory => "memory",
    };

    HealthCheckResponse {
        status: if store_ok { "healthy" } else { "degraded" }.to_string(),
        uptime: human_uptime.to_string(),
        timestamp: now_utc.to_rfc3339(),
        start_at: START_TIME.to_rfc3339(),
        storage_backend: storage_backend.to_string(),
        document_store: if store_ok { "OK" } else { "Unavailable" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }
}

fn respond(response: HealthCheckResponse) -> HttpResponse {
    if response.is_healthy() {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}

/// Liveness plus document store reachability. Results are reused for 5s.
#[get("/health")]
pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let now = Utc::now().timestamp();
    let last = LAST_CHECK.load(Ordering::Relaxed);

    if now - last > 5 {
        let response = build_health_response(&state).await;

        if let Ok(mut cache) = CACHED_STATUS.write() {
            *cache = response.clone();
            LAST_CHECK.store(now, Ordering::Relaxed);
        }

        respond(response)
    } else {
        match CACHED_STATUS.read() {
            Ok(response) => respond(response.clone()),
            Err(e) => {
                tracing::warn!("HealthCheck cache lock poisoned: {}", e);
                let response = build_health_response(&state).await;
                respond(response)
            }
        }
    }
}
