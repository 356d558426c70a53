pub mod summarize;
pub mod system;

use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use bluf_llm::Envelope;

/// Register every route on `cfg`
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(system::index)
        .service(system::info)
        .service(summarize::mai_summarize)
        .service(summarize::lcsai_summarize)
        .service(summarize::wpapi_summarize)
        .service(summarize::supported_types)
        .service(summarize::summarize_pdf)
        .service(summarize::summarize_docx)
        .service(summarize::summarize_batch);
}

/// Serialize an envelope with its own status code
pub fn respond(envelope: Envelope) -> HttpResponse {
    let status = StatusCode::from_u16(envelope.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    HttpResponse::build(status).json(envelope)
}
