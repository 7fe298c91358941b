use crate::api::EmailQuery;
use crate::database::DocumentStore;
use crate::models::{from_json, to_json, to_json_list, DeleteResult, InsertResult, MessageResponse, UpdateResult};
use crate::services::auth_service::Principal;
use crate::services::product_service;
use crate::utils::AppError;
use actix_web::{web, HttpResponse};
use serde_json::{Map, Value};

const PRODUCT_NOT_FOUND: &str = "Product not found";

#[utoipa::path(
    get,
    path = "/products",
    tag = "Products",
    params(
        ("email" = Option<String>, Query, description = "Only products listed by this owner")
    ),
    responses(
        (status = 200, description = "Products in store order", body = Vec<serde_json::Value>),
        (status = 500, description = "Store failure", body = MessageResponse)
    )
)]
pub async fn list_products(
    store: web::Data<dyn DocumentStore>,
    query: web::Query<EmailQuery>,
) -> Result<HttpResponse, AppError> {
    let owner = query.owner();
    log::info!("📦 GET /products - owner: {}", owner.unwrap_or("all"));

    let products = product_service::list_products(store.get_ref(), owner)
        .await
        .map_err(|e| AppError::internal("Failed to fetch products", e))?;

    Ok(HttpResponse::Ok().json(to_json_list(products)))
}

#[utoipa::path(
    get,
    path = "/latest-products",
    tag = "Products",
    responses(
        (status = 200, description = "The six newest products", body = Vec<serde_json::Value>),
        (status = 500, description = "Store failure", body = MessageResponse)
    )
)]
pub async fn latest_products(store: web::Data<dyn DocumentStore>) -> Result<HttpResponse, AppError> {
    let products = product_service::latest_products(store.get_ref())
        .await
        .map_err(|e| AppError::internal("Failed to fetch latest products", e))?;

    Ok(HttpResponse::Ok().json(to_json_list(products)))
}

#[utoipa::path(
    get,
    path = "/products/{id}",
    tag = "Products",
    params(
        ("id" = String, Path, description = "Product id")
    ),
    responses(
        (status = 200, description = "The product", body = serde_json::Value),
        (status = 404, description = "No product with this id", body = MessageResponse),
        (status = 500, description = "Store failure", body = MessageResponse)
    )
)]
pub async fn get_product(
    store: web::Data<dyn DocumentStore>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    let product = product_service::get_product(store.get_ref(), &id)
        .await
        .map_err(|e| AppError::internal("Failed to fetch product", e))?
        .ok_or_else(|| AppError::NotFound(PRODUCT_NOT_FOUND.to_string()))?;

    Ok(HttpResponse::Ok().json(to_json(product)))
}

#[utoipa::path(
    post,
    path = "/products",
    tag = "Products",
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Product created", body = InsertResult),
        (status = 400, description = "Malformed body", body = MessageResponse),
        (status = 401, description = "Missing or invalid ID token", body = MessageResponse),
        (status = 500, description = "Store failure", body = MessageResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_product(
    store: web::Data<dyn DocumentStore>,
    principal: web::ReqData<Principal>,
    body: web::Json<Map<String, Value>>,
) -> Result<HttpResponse, AppError> {
    log::info!("📦 POST /products - by: {}", principal.email);

    let fields = from_json(&body).map_err(|e| AppError::InvalidRequest(format!("Invalid product: {}", e)))?;
    let id = product_service::create_product(store.get_ref(), fields)
        .await
        .map_err(|e| AppError::internal("Failed to create product", e))?;

    log::info!("✅ Product created: {}", crate::models::id_string(&id));
    Ok(HttpResponse::Ok().json(InsertResult::new(&id)))
}

#[utoipa::path(
    patch,
    path = "/products/{id}",
    tag = "Products",
    params(
        ("id" = String, Path, description = "Product id")
    ),
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Fields merged into the product", body = UpdateResult),
        (status = 400, description = "Malformed body", body = MessageResponse),
        (status = 500, description = "Store failure", body = MessageResponse)
    )
)]
pub async fn update_product(
    store: web::Data<dyn DocumentStore>,
    path: web::Path<String>,
    body: web::Json<Map<String, Value>>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    log::info!("✏️ PATCH /products/{}", id);

    let fields = from_json(&body).map_err(|e| AppError::InvalidRequest(format!("Invalid product: {}", e)))?;
    let summary = product_service::update_product(store.get_ref(), &id, fields)
        .await
        .map_err(|e| AppError::internal("Failed to update product", e))?;

    Ok(HttpResponse::Ok().json(UpdateResult::from(summary)))
}

#[utoipa::path(
    delete,
    path = "/products/{id}",
    tag = "Products",
    params(
        ("id" = String, Path, description = "Product id")
    ),
    responses(
        (status = 200, description = "Deletion acknowledged, possibly of nothing", body = DeleteResult),
        (status = 500, description = "Store failure", body = MessageResponse)
    )
)]
pub async fn delete_product(
    store: web::Data<dyn DocumentStore>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    log::info!("🗑️ DELETE /products/{}", id);

    let deleted = product_service::delete_product(store.get_ref(), &id)
        .await
        .map_err(|e| AppError::internal("Failed to delete product", e))?;

    Ok(HttpResponse::Ok().json(DeleteResult::new(deleted)))
}
