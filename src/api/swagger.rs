use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bidding Service API",
        version = "1.0.0",
        description = "Marketplace backend: users, products and bids.\n\n**Authentication:** `POST /products`, `GET /bids` and `GET /products/bids/{product_id}` require a Firebase ID token. `GET /session` requires a session token from `POST /getToken`. Both are sent as `Authorization: Bearer <token>` and are not interchangeable."
    ),
    paths(
        // Health
        crate::api::health::banner,
        crate::api::health::health_check,

        // Users & sessions
        crate::api::users::create_user,
        crate::api::session::issue_token,
        crate::api::session::session_check,

        // Products
        crate::api::products::list_products,
        crate::api::products::latest_products,
        crate::api::products::get_product,
        crate::api::products::create_product,
        crate::api::products::update_product,
        crate::api::products::delete_product,

        // Bids
        crate::api::bids::list_bids,
        crate::api::bids::bids_for_product,
        crate::api::bids::create_bid,
        crate::api::bids::delete_bid,
    ),
    components(
        schemas(
            crate::api::health::HealthResponse,
            crate::api::session::SessionResponse,
            crate::models::InsertResult,
            crate::models::UpdateResult,
            crate::models::DeleteResult,
            crate::models::MessageResponse,
            crate::models::TokenResponse,
        )
    ),
    tags(
        (name = "Health", description = "Service banner and liveness, including store reachability."),
        (name = "Users", description = "Registration, idempotent by email."),
        (name = "Session", description = "Locally signed session tokens."),
        (name = "Products", description = "Product listings. Creating one needs an ID token."),
        (name = "Bids", description = "Bids on products. Listing needs an ID token and is scoped to the caller."),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Firebase ID token or session token, depending on the operation"))
                        .build(),
                ),
            );
        }
    }
}
