use crate::models::{MessageResponse, TokenResponse};
use crate::services::auth_service::{Authenticators, Principal};
use crate::utils::AppError;
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SessionResponse {
    pub email: String,
}

/// Self-asserted login: the posted claims are signed as-is for one hour.
#[utoipa::path(
    post,
    path = "/getToken",
    tag = "Session",
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Session token issued", body = TokenResponse),
        (status = 400, description = "Malformed body", body = MessageResponse),
        (status = 500, description = "Signing failure", body = MessageResponse)
    )
)]
pub async fn issue_token(
    authenticators: web::Data<Authenticators>,
    body: web::Json<Map<String, Value>>,
) -> Result<HttpResponse, AppError> {
    let claims = body.into_inner();
    log::info!(
        "🔐 POST /getToken - email: {}",
        claims.get("email").and_then(Value::as_str).unwrap_or("N/A")
    );

    let token = authenticators.sessions().issue(claims)?;
    Ok(HttpResponse::Ok().json(TokenResponse { token }))
}

#[utoipa::path(
    get,
    path = "/session",
    tag = "Session",
    responses(
        (status = 200, description = "Session principal", body = SessionResponse),
        (status = 401, description = "Missing or invalid session token", body = MessageResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn session_check(principal: web::ReqData<Principal>) -> HttpResponse {
    HttpResponse::Ok().json(SessionResponse {
        email: principal.into_inner().email,
    })
}
