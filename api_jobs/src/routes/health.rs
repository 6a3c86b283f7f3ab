use actix_web::{Responder, get};
use common::http::Success;
use serde_json::json;

#[get("")]
pub async fn get_health() -> impl Responder {
    Success::ok(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
