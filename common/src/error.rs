use actix_web::HttpResponse;
use thiserror::Error;

pub type Res<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    // === CONVERSION ERRORS ===
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Redis pool error: {0}")]
    Pool(#[from] deadpool_redis::PoolError),

    #[error("JWT error: {0}")]
    JWT(#[from] jsonwebtoken::errors::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Stripe error: {0}")]
    Stripe(#[from] stripe::StripeError),

    #[error("Mail error: {0}")]
    Mail(String),

    // === APPLICATION ERRORS ===
    #[error("Authorization error: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Duplicate resource: {0}")]
    Duplicate(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("{0}")]
    Internal(String),
}

impl From<lettre::error::Error> for AppError {
    fn from(error: lettre::error::Error) -> Self {
        AppError::Mail(error.to_string())
    }
}

impl From<lettre::transport::smtp::Error> for AppError {
    fn from(error: lettre::transport::smtp::Error) -> Self {
        AppError::Mail(error.to_string())
    }
}

impl From<lettre::address::AddressError> for AppError {
    fn from(error: lettre::address::AddressError) -> Self {
        AppError::Validation(format!("Invalid e-mail address: {}", error))
    }
}

/// Stable error kind, independent of the underlying cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Forbidden,
    Duplicate,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Validation => "validation",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::Duplicate => "duplicate",
            ErrorKind::Internal => "internal",
        }
    }
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Database(sqlx::Error::RowNotFound) | AppError::NotFound(_) => {
                ErrorKind::NotFound
            }
            AppError::Database(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                ErrorKind::Duplicate
            }
            AppError::Duplicate(_) => ErrorKind::Duplicate,
            AppError::Validation(_) | AppError::BadRequest(_) => ErrorKind::Validation,
            AppError::Unauthorized(_) | AppError::Forbidden(_) => ErrorKind::Forbidden,
            _ => ErrorKind::Internal,
        }
    }

    pub fn to_http_response(&self) -> HttpResponse {
        let is_dev = cfg!(debug_assertions);

        let to_internal_json = |err_msg: &str| {
            if is_dev {
                serde_json::json!({ "error": err_msg, "kind": "internal" })
            } else {
                serde_json::json!({ "error": "Internal server error", "kind": "internal" })
            }
        };
        let to_json = |kind: ErrorKind| {
            serde_json::json!({ "error": self.to_string(), "kind": kind.as_str() })
        };

        match self {
            // === CONVERSION ERRORS ===
            AppError::Database(sqlx::Error::RowNotFound) => {
                HttpResponse::NotFound().json(to_json(ErrorKind::NotFound))
            }
            AppError::Database(error) => {
                log::error!("Database error: {}", error);
                HttpResponse::InternalServerError().json(to_internal_json(&error.to_string()))
            }
            AppError::Migration(error) => {
                log::error!("Migration error: {}", error);
                HttpResponse::InternalServerError().json(to_internal_json(&error.to_string()))
            }
            AppError::Redis(error) => {
                log::error!("Redis error: {}", error);
                HttpResponse::InternalServerError().json(to_internal_json(&error.to_string()))
            }
            AppError::Pool(error) => {
                log::error!("Redis pool error: {}", error);
                HttpResponse::InternalServerError().json(to_internal_json(&error.to_string()))
            }
            AppError::JWT(error) => {
                log::warn!("JWT error: {}", error);
                HttpResponse::Unauthorized().json(to_json(ErrorKind::Forbidden))
            }
            AppError::Json(error) => {
                log::error!("JSON error: {}", error);
                HttpResponse::InternalServerError().json(to_internal_json(&error.to_string()))
            }
            AppError::Stripe(error) => {
                log::error!("Stripe error: {}", error);
                HttpResponse::InternalServerError().json(to_internal_json(&error.to_string()))
            }
            AppError::Mail(error) => {
                log::error!("Mail error: {}", error);
                HttpResponse::InternalServerError().json(to_internal_json(error))
            }

            // === APPLICATION ERRORS ===
            AppError::Unauthorized(_) => {
                HttpResponse::Unauthorized().json(to_json(ErrorKind::Forbidden))
            }
            AppError::Forbidden(_) => HttpResponse::Forbidden().json(to_json(ErrorKind::Forbidden)),
            AppError::NotFound(_) => HttpResponse::NotFound().json(to_json(ErrorKind::NotFound)),
            AppError::Validation(_) | AppError::BadRequest(_) => {
                HttpResponse::BadRequest().json(to_json(ErrorKind::Validation))
            }
            AppError::Duplicate(_) => HttpResponse::Conflict().json(to_json(ErrorKind::Duplicate)),
            AppError::Timeout(error) => {
                log::error!("Timed out: {}", error);
                HttpResponse::GatewayTimeout().json(to_internal_json(error))
            }

            AppError::Internal(error) => {
                log::error!("Internal error: {}", error);
                HttpResponse::InternalServerError().json(to_internal_json(error))
            }
        }
    }
}

impl actix_web::ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        self.to_http_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_the_stable_taxonomy() {
        assert_eq!(AppError::Database(sqlx::Error::RowNotFound).kind(), ErrorKind::NotFound);
        assert_eq!(AppError::NotFound("plan".into()).kind(), ErrorKind::NotFound);
        assert_eq!(AppError::Validation("days".into()).kind(), ErrorKind::Validation);
        assert_eq!(AppError::BadRequest("body".into()).kind(), ErrorKind::Validation);
        assert_eq!(AppError::Forbidden("role".into()).kind(), ErrorKind::Forbidden);
        assert_eq!(AppError::Unauthorized("token".into()).kind(), ErrorKind::Forbidden);
        assert_eq!(AppError::Duplicate("plan".into()).kind(), ErrorKind::Duplicate);
        assert_eq!(AppError::Internal("boom".into()).kind(), ErrorKind::Internal);
        assert_eq!(AppError::Mail("smtp".into()).kind(), ErrorKind::Internal);
    }

    #[test]
    fn http_status_matches_kind() {
        assert_eq!(AppError::NotFound("x".into()).to_http_response().status(), 404);
        assert_eq!(AppError::Validation("x".into()).to_http_response().status(), 400);
        assert_eq!(AppError::Forbidden("x".into()).to_http_response().status(), 403);
        assert_eq!(AppError::Unauthorized("x".into()).to_http_response().status(), 401);
        assert_eq!(AppError::Duplicate("x".into()).to_http_response().status(), 409);
        assert_eq!(AppError::Internal("x".into()).to_http_response().status(), 500);
    }
}
