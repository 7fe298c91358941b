pub mod bids;
pub mod health;
pub mod products;
pub mod session;
pub mod swagger;
pub mod users;

use crate::middleware::AuthMiddleware;
use crate::services::auth_service::TrustScheme;
use crate::utils::AppError;
use actix_web::{guard, web};
use serde::Deserialize;

/// Optional `?email=` filter shared by the product and bid listings.
#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    pub email: Option<String>,
}

impl EmailQuery {
    /// An empty `email` is the same as no filter.
    pub fn owner(&self) -> Option<&str> {
        self.email.as_deref().filter(|email| !email.is_empty())
    }
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        AppError::InvalidRequest(format!("Invalid JSON body: {}", err)).into()
    })
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        log::debug!("Rejected query string: {}", err);
        AppError::InvalidRequest("Invalid query string".to_string()).into()
    })
}

/// The whole route table. Each operation picks its credential scheme here.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .route("/", web::get().to(health::banner))
        .route("/health", web::get().to(health::health_check))
        // Users & sessions
        .route("/users", web::post().to(users::create_user))
        .route("/getToken", web::post().to(session::issue_token))
        .service(
            web::resource("/session")
                .wrap(AuthMiddleware::new(TrustScheme::Session))
                .route(web::get().to(session::session_check)),
        )
        // Products
        .service(
            web::resource("/products")
                .guard(guard::Post())
                .wrap(AuthMiddleware::new(TrustScheme::IdentityProvider))
                .route(web::post().to(products::create_product)),
        )
        .service(web::resource("/products").route(web::get().to(products::list_products)))
        .service(
            web::resource("/products/bids/{product_id}")
                .wrap(AuthMiddleware::new(TrustScheme::IdentityProvider))
                .route(web::get().to(bids::bids_for_product)),
        )
        .service(
            web::resource("/products/{id}")
                .route(web::get().to(products::get_product))
                .route(web::patch().to(products::update_product))
                .route(web::delete().to(products::delete_product)),
        )
        .route("/latest-products", web::get().to(products::latest_products))
        // Bids
        .service(
            web::resource("/bids")
                .guard(guard::Get())
                .wrap(AuthMiddleware::new(TrustScheme::IdentityProvider))
                .route(web::get().to(bids::list_bids)),
        )
        .service(web::resource("/bids").route(web::post().to(bids::create_bid)))
        .route("/bids/{id}", web::delete().to(bids::delete_bid));
}


#[cfg(test)]
mod email_query_tests {
    use super::EmailQuery;

    #[test]
    fn empty_email_means_no_filter() {
        let query = |email: Option<&str>| EmailQuery {
            email: email.map(str::to_string),
        };
        assert_eq!(query(None).owner(), None);
        assert_eq!(query(Some("")).owner(), None);
        assert_eq!(query(Some("a@x.com")).owner(), Some("a@x.com"));
    }
}
