//! bluf HTTP server
//!
//! Actix-web routes around the summarizer. Every route is served at the
//! root and again under `/api/v1`.

pub mod routes;
pub mod state;
pub mod text;
pub mod types;
pub mod validation;

use actix_cors::Cors;
use actix_web::error::InternalError;
use actix_web::{http::header, web, App, HttpServer};
use bluf_common::{AppConfig, BlufError, Result};
use bluf_llm::Envelope;
use std::sync::Arc;
use tracing::info;
use tracing_actix_web::TracingLogger;

pub use state::AppState;

/// Largest accepted JSON body
const JSON_BODY_LIMIT: usize = 4 * 1024 * 1024;

/// JSON extractor settings; malformed bodies get an error envelope
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_BODY_LIMIT)
        .error_handler(|err, _req| {
            let envelope = Envelope::from_error(&BlufError::invalid_input(err.to_string()));
            InternalError::from_response(err, routes::respond(envelope)).into()
        })
}

/// Routes and extractor config shared by the server and tests
pub fn configure_app(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .configure(routes::configure)
        .service(web::scope("/api/v1").configure(routes::configure));
}

/// Start the HTTP server and run until shutdown
pub async fn start_server(config: AppConfig) -> Result<()> {
    let bind_address = config.server_bind_address();
    let state = Arc::new(AppState::new(config));

    let available: Vec<&str> = state
        .registry
        .providers()
        .filter(|p| p.has_credential())
        .map(|p| p.id.as_str())
        .collect();
    info!("Providers with credentials: {:?}", available);
    info!("Starting HTTP server on {}", bind_address);

    let data = web::Data::new(state);
    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT])
            .max_age(3600);

        App::new()
            .wrap(TracingLogger::default())
            .wrap(cors)
            .app_data(data.clone())
            .configure(configure_app)
    })
    .bind(&bind_address)?
    .run()
    .await?;

    info!("HTTP server stopped");
    Ok(())
}
