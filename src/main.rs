mod api;
mod config;
mod database;
mod middleware;
mod models;
mod services;
mod utils;

use actix_cors::Cors;
use actix_web::{http::header, middleware::Logger, web, App, HttpServer};
use config::{Config, StoreConfig};
use database::{DocumentStore, MemoryStore, MongoStore};
use dotenv::dotenv;
use services::auth_service::Authenticators;
use services::identity_service::FirebaseVerifier;
use services::session_service::SessionTokens;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| {
        log::error!("❌ Invalid configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    log::info!("🚀 Starting Bidding Service...");

    // The store connects on first use
    let store: Arc<dyn DocumentStore> = match &config.store {
        StoreConfig::Mongo { uri, db_name } => {
            log::info!("📊 Database: MongoDB ({})", db_name);
            Arc::new(MongoStore::new(uri.as_str(), db_name.as_str()))
        }
        StoreConfig::Memory => {
            log::warn!("⚠️  Database: in-memory store, data is lost on exit");
            Arc::new(MemoryStore::new())
        }
    };
    let store_data: web::Data<dyn DocumentStore> = web::Data::from(store.clone());

    log::info!("🔑 Identity provider project: {}", config.firebase_project_id);
    let authenticators = web::Data::new(Authenticators::new(
        Arc::new(FirebaseVerifier::new(
            config.firebase_project_id.as_str(),
            config.firebase_keys_url.as_str(),
        )),
        Arc::new(SessionTokens::new(&config.jwt_secret)),
    ));

    let (host, port) = (config.host.clone(), config.port);
    let allowed_origins = config.cors_allowed_origins.clone();

    log::info!("🌐 Server starting on {}:{}", host, port);
    log::info!("📚 Swagger UI available at: http://{}:{}/swagger-ui/", host, port);
    log::info!("📄 OpenAPI spec at: http://{}:{}/api-docs/openapi.json", host, port);

    // Start HTTP server
    let server = HttpServer::new(move || {
        let cors = if allowed_origins.is_empty() {
            Cors::permissive()
        } else {
            allowed_origins
                .iter()
                .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
                .allowed_methods(vec!["GET", "POST", "PATCH", "DELETE", "OPTIONS"])
                .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
                .expose_headers(vec![header::CONTENT_TYPE])
                .max_age(3600)
        };

        // Generate OpenAPI specification
        let openapi = api::swagger::ApiDoc::openapi();

        App::new()
            .app_data(store_data.clone())
            .app_data(authenticators.clone())
            .wrap(cors)
            .wrap(middleware::SecurityHeaders)
            .wrap(Logger::default())
            .service(SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi))
            .configure(api::routes)
    })
    .bind((host.as_str(), port))?
    .run()
    .await;

    log::info!("🛑 Server stopped, closing store");
    store.shutdown().await;

    server
}
