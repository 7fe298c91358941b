use crate::database::DocumentStore;
use crate::models::{from_json, registration_email, CreateUserOutcome, InsertResult, MessageResponse, USER_EXISTS_MESSAGE};
use crate::services::user_service;
use crate::utils::AppError;
use actix_web::{web, HttpResponse};
use serde_json::{Map, Value};

#[utoipa::path(
    post,
    path = "/users",
    tag = "Users",
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "User registered", body = InsertResult),
        (status = 200, description = "A user with this email already exists", body = MessageResponse),
        (status = 400, description = "Missing email or malformed body", body = MessageResponse),
        (status = 500, description = "Store failure", body = MessageResponse)
    )
)]
pub async fn create_user(
    store: web::Data<dyn DocumentStore>,
    body: web::Json<Map<String, Value>>,
) -> Result<HttpResponse, AppError> {
    let user = from_json(&body).map_err(|e| AppError::InvalidRequest(format!("Invalid user: {}", e)))?;
    let email = registration_email(&user)
        .map(str::to_owned)
        .ok_or_else(|| AppError::InvalidRequest("Email is required".to_string()))?;

    log::info!("📝 POST /users - email: {}", email);

    let outcome = user_service::create_user(store.get_ref(), user)
        .await
        .map_err(|e| AppError::internal("Failed to create user", e))?;

    match outcome {
        CreateUserOutcome::Created(id) => {
            log::info!("✅ User registered: {}", email);
            Ok(HttpResponse::Ok().json(InsertResult::new(&id)))
        }
        CreateUserOutcome::AlreadyExists => {
            log::info!("ℹ️ User already registered: {}", email);
            Ok(HttpResponse::Ok().json(MessageResponse::new(USER_EXISTS_MESSAGE)))
        }
    }
}
