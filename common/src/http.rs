use actix_web::HttpResponse;
use serde::Serialize;

use super::error::Res;

pub struct Success;
impl Success {
    pub fn accepted<T: Serialize>(body: T) -> Res<HttpResponse> {
        Result::Ok(HttpResponse::Accepted().json(body))
    }
    pub fn ok<T: Serialize>(body: T) -> Res<HttpResponse> {
        Result::Ok(HttpResponse::Ok().json(body))
    }
}
