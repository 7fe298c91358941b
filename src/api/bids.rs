use crate::api::EmailQuery;
use crate::database::DocumentStore;
use crate::models::{from_json, to_json_list, DeleteResult, InsertResult, MessageResponse};
use crate::services::auth_service::Principal;
use crate::services::policy::{self, Decision};
use crate::services::bid_service;
use crate::utils::AppError;
use actix_web::{web, HttpResponse};
use serde_json::{Map, Value};

/// Buyer-scoped listing: asking for another buyer's bids is forbidden.
#[utoipa::path(
    get,
    path = "/bids",
    tag = "Bids",
    params(
        ("email" = Option<String>, Query, description = "Only bids placed by this buyer; must be the caller")
    ),
    responses(
        (status = 200, description = "Bids in store order", body = Vec<serde_json::Value>),
        (status = 401, description = "Missing or invalid ID token", body = MessageResponse),
        (status = 403, description = "Email is not the caller's", body = MessageResponse),
        (status = 500, description = "Store failure", body = MessageResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_bids(
    store: web::Data<dyn DocumentStore>,
    principal: web::ReqData<Principal>,
    query: web::Query<EmailQuery>,
) -> Result<HttpResponse, AppError> {
    let buyer = query.owner();
    log::info!("💰 GET /bids - buyer: {} (caller: {})", buyer.unwrap_or("all"), principal.email);

    if policy::authorize(&principal, buyer) == Decision::Deny {
        log::warn!("⛔ {} asked for bids of {}", principal.email, buyer.unwrap_or_default());
        return Err(AppError::Forbidden);
    }

    let bids = bid_service::list_bids(store.get_ref(), buyer)
        .await
        .map_err(|e| AppError::internal("Failed to fetch bids", e))?;

    Ok(HttpResponse::Ok().json(to_json_list(bids)))
}

#[utoipa::path(
    get,
    path = "/products/bids/{product_id}",
    tag = "Bids",
    params(
        ("product_id" = String, Path, description = "Product id the bids reference")
    ),
    responses(
        (status = 200, description = "Bids on the product, highest bid_price first", body = Vec<serde_json::Value>),
        (status = 401, description = "Missing or invalid ID token", body = MessageResponse),
        (status = 500, description = "Store failure", body = MessageResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn bids_for_product(
    store: web::Data<dyn DocumentStore>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let product_id = path.into_inner();
    log::info!("💰 GET /products/bids/{}", product_id);

    let bids = bid_service::bids_for_product(store.get_ref(), &product_id)
        .await
        .map_err(|e| AppError::internal("Failed to fetch bids", e))?;

    Ok(HttpResponse::Ok().json(to_json_list(bids)))
}

#[utoipa::path(
    post,
    path = "/bids",
    tag = "Bids",
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Bid placed", body = InsertResult),
        (status = 400, description = "Malformed body", body = MessageResponse),
        (status = 500, description = "Store failure", body = MessageResponse)
    )
)]
pub async fn create_bid(
    store: web::Data<dyn DocumentStore>,
    body: web::Json<Map<String, Value>>,
) -> Result<HttpResponse, AppError> {
    let fields = from_json(&body).map_err(|e| AppError::InvalidRequest(format!("Invalid bid: {}", e)))?;
    log::info!(
        "💰 POST /bids - product: {}",
        fields.get_str(crate::models::BID_PRODUCT).unwrap_or("N/A")
    );

    let id = bid_service::create_bid(store.get_ref(), fields)
        .await
        .map_err(|e| AppError::internal("Failed to create bid", e))?;

    Ok(HttpResponse::Ok().json(InsertResult::new(&id)))
}

#[utoipa::path(
    delete,
    path = "/bids/{id}",
    tag = "Bids",
    params(
        ("id" = String, Path, description = "Bid id")
    ),
    responses(
        (status = 200, description = "Deletion acknowledged, possibly of nothing", body = DeleteResult),
        (status = 500, description = "Store failure", body = MessageResponse)
    )
)]
pub async fn delete_bid(
    store: web::Data<dyn DocumentStore>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    log::info!("🗑️ DELETE /bids/{}", id);

    let deleted = bid_service::delete_bid(store.get_ref(), &id)
        .await
        .map_err(|e| AppError::internal("Failed to delete bid", e))?;

    Ok(HttpResponse::Ok().json(DeleteResult::new(deleted)))
}
