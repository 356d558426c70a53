use actix_web::{get, HttpResponse};
use bluf_llm::timestamp_now;
use serde_json::json;

fn banner() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": 200,
        "message": "BLUF API is working.",
        "abbr": "BLUF stands for Bottom Line Up Front.",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": timestamp_now(),
    }))
}

/// Service banner
#[get("/")]
pub async fn index() -> actix_web::Result<HttpResponse> {
    Ok(banner())
}

/// Service banner
#[get("/info")]
pub async fn info() -> actix_web::Result<HttpResponse> {
    Ok(banner())
}
