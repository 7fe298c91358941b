use crate::database::DocumentStore;
use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub database: String,
    pub timestamp: i64,
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Health",
    responses(
        (status = 200, description = "Service banner", body = String, content_type = "text/plain")
    )
)]
pub async fn banner() -> impl Responder {
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body("Smart server is running")
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Store is unreachable", body = HealthResponse)
    )
)]
pub async fn health_check(store: web::Data<dyn DocumentStore>) -> impl Responder {
    let (status, database) = match store.health_check().await {
        Ok(()) => ("healthy", "connected".to_string()),
        Err(e) => {
            log::warn!("⚠️ Health check: store unreachable - {}", e);
            ("unhealthy", "unreachable".to_string())
        }
    };

    let body = HealthResponse {
        status: status.to_string(),
        service: "bidding-service".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database,
        timestamp: chrono::Utc::now().timestamp(),
    };

    if status == "healthy" {
        HttpResponse::Ok().json(body)
    } else {
        HttpResponse::ServiceUnavailable().json(body)
    }
}
