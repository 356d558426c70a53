use actix_web::{get, post, web, HttpResponse};
use bluf_common::{BlufError, Result};
use bluf_llm::{Envelope, ProviderId, SummarizerClient};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::routes::respond;
use crate::state::AppState;
use crate::text::{format_to_html, sanitize_content};
use crate::types::{BatchRequest, CredentialedRequest, MaiRequest, SummarizeRequest};
use crate::validation::require_fields;

/// Summarize with the built-in OpenRouter model
#[post("/mai/summarize")]
pub async fn mai_summarize(
    body: web::Json<Value>,
    state: web::Data<Arc<AppState>>,
) -> actix_web::Result<HttpResponse> {
    Ok(finish("/mai/summarize", handle_mai(body.into_inner(), &state).await))
}

/// Summarize with a caller-chosen provider and model
#[post("/lcsai/summarize")]
pub async fn lcsai_summarize(
    body: web::Json<Value>,
    state: web::Data<Arc<AppState>>,
) -> actix_web::Result<HttpResponse> {
    Ok(finish("/lcsai/summarize", handle_lcsai(body.into_inner(), &state).await))
}

/// Summarize with a caller-supplied credential
#[post("/summarize/wpapi")]
pub async fn wpapi_summarize(
    body: web::Json<Value>,
    state: web::Data<Arc<AppState>>,
) -> actix_web::Result<HttpResponse> {
    Ok(finish("/summarize/wpapi", handle_wpapi(body.into_inner(), &state).await))
}

/// Summarize many texts in one call
#[post("/summarize/batch")]
pub async fn summarize_batch(
    body: web::Json<Value>,
    state: web::Data<Arc<AppState>>,
) -> actix_web::Result<HttpResponse> {
    Ok(finish("/summarize/batch", handle_batch(body.into_inner(), &state).await))
}

/// Capability descriptor
#[get("/summarize/supported-types")]
pub async fn supported_types(state: web::Data<Arc<AppState>>) -> actix_web::Result<HttpResponse> {
    let providers: Vec<Value> = state
        .registry
        .providers()
        .map(|p| {
            json!({
                "name": p.id,
                "default_model": p.default_model,
                "available": p.has_credential(),
            })
        })
        .collect();

    let mut payload = Map::new();
    payload.insert(
        "supported_types".into(),
        json!({ "files": ["pdf", "docx"], "data": ["text", "json"] }),
    );
    payload.insert("providers".into(), Value::Array(providers));

    Ok(finish("/summarize/supported-types", Envelope::success(payload)))
}

#[post("/summarize/pdf")]
pub async fn summarize_pdf() -> actix_web::Result<HttpResponse> {
    Ok(finish(
        "/summarize/pdf",
        Envelope::error("PDF summarization is not implemented", 501),
    ))
}

#[post("/summarize/docx")]
pub async fn summarize_docx() -> actix_web::Result<HttpResponse> {
    Ok(finish(
        "/summarize/docx",
        Envelope::error("DOCX summarization is not implemented", 501),
    ))
}

async fn handle_mai(body: Value, state: &AppState) -> Result<Envelope> {
    require_fields(&body, &["input"])?;
    let request: MaiRequest = serde_json::from_value(body)?;

    let client = state.pooled_client(ProviderId::OpenRouter.as_str(), "").await?;
    summarize_one(&client, &request.input).await
}

async fn handle_lcsai(body: Value, state: &AppState) -> Result<Envelope> {
    require_fields(&body, &["provider", "model", "text|content"])?;
    let request: SummarizeRequest = serde_json::from_value(body)?;

    info!(
        "Summarize request - Provider: {}, Model: {}, Length: {}",
        request.provider,
        request.model,
        request.text.len()
    );

    let client = state.pooled_client(&request.provider, &request.model).await?;
    summarize_one(&client, &request.text).await
}

async fn handle_wpapi(body: Value, state: &AppState) -> Result<Envelope> {
    require_fields(&body, &["api_key", "provider", "model", "text|content"])?;
    let request: CredentialedRequest = serde_json::from_value(body)?;

    info!(
        "Credentialed summarize request - Provider: {}, Model: {}, Length: {}",
        request.provider,
        request.model,
        request.text.len()
    );

    let client = state.caller_client(&request.api_key, &request.provider, &request.model)?;
    summarize_one(&client, &request.text).await
}

async fn handle_batch(body: Value, state: &AppState) -> Result<Envelope> {
    require_fields(&body, &["provider", "model", "texts|contents"])?;
    let request: BatchRequest = serde_json::from_value(body)?;

    if request.texts.is_empty() {
        return Err(BlufError::invalid_input("texts cannot be empty"));
    }

    let client = state.pooled_client(&request.provider, &request.model).await?;
    let contents: Vec<String> = request.texts.iter().map(|t| sanitize_content(t)).collect();
    let workers = batch_workers(request.max_workers, state.config.batch_max_workers);

    let summaries: Vec<Value> = client
        .summarize_batch(&contents, workers)
        .await?
        .iter()
        .map(|text| json!({ "output": text, "html": format_to_html(text) }))
        .collect();

    let mut payload = Map::new();
    payload.insert("summaries".into(), Value::Array(summaries));
    payload.insert("provider".into(), json!(client.provider()));
    payload.insert("model".into(), json!(client.model()));
    Envelope::success(payload)
}

/// Caller worker count capped at `limit`
fn batch_workers(requested: Option<usize>, limit: usize) -> usize {
    requested.unwrap_or(limit).min(limit)
}

async fn summarize_one(client: &SummarizerClient, raw: &str) -> Result<Envelope> {
    let content = sanitize_content(raw);
    let output = client.summarize_detailed(&content).await?;
    let html = format_to_html(&output.text);
    Envelope::from_summary(&output, &html)
}

fn finish(route: &str, result: Result<Envelope>) -> HttpResponse {
    let envelope = result.unwrap_or_else(|e| {
        if e.status_code() >= 500 {
            error!("{} failed: {}", route, e);
        } else {
            warn!("{} rejected: {}", route, e);
        }
        Envelope::from_error(&e)
    });
    respond(envelope)
}
