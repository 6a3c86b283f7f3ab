use std::{rc::Rc, sync::Arc};

use actix_web::{
    Error, HttpMessage,
    body::{BoxBody, MessageBody},
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use common::{
    access::{self, Capability},
    error::AppError,
    jwt::{bearer_token, validate_jwt},
};
use futures::future::{LocalBoxFuture, Ready, ok};

/// Rejects requests whose bearer token does not carry `capability`.
///
/// Valid claims are stored in the request extensions for the handlers.
pub struct RequireCapability {
    secret: Arc<String>,
    capability: Capability,
}

impl RequireCapability {
    pub fn new(secret: &str, capability: Capability) -> Self {
        Self {
            secret: Arc::new(secret.to_string()),
            capability,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireCapability
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Transform = RequireCapabilityService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(RequireCapabilityService {
            service: Rc::new(service),
            secret: self.secret.clone(),
            capability: self.capability,
        })
    }
}

pub struct RequireCapabilityService<S> {
    service: Rc<S>,
    secret: Arc<String>,
    capability: Capability,
}

impl<S, B> Service<ServiceRequest> for RequireCapabilityService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let Some(token) = bearer_token(&req) else {
            let response = AppError::Unauthorized("No authorization token provided".to_string())
                .to_http_response();
            return Box::pin(async move { Ok(req.into_response(response)) });
        };

        let claims = match validate_jwt(&token, &self.secret) {
            Ok(claims) => claims,
            Err(e) => {
                log::warn!("Rejected token path={}: {}", req.path(), e);
                let response =
                    AppError::Unauthorized("Invalid token".to_string()).to_http_response();
                return Box::pin(async move { Ok(req.into_response(response)) });
            }
        };

        if !access::authorize(&claims.principal(), self.capability) {
            log::warn!(
                "Capability denied sub={} role={} capability={:?} path={}",
                claims.sub,
                claims.role,
                self.capability,
                req.path()
            );
            let response = AppError::Forbidden(format!(
                "Missing capability '{}'",
                self.capability.permission()
            ))
            .to_http_response();
            return Box::pin(async move { Ok(req.into_response(response)) });
        }

        req.extensions_mut().insert(claims);
        let srv = Rc::clone(&self.service);
        Box::pin(async move { srv.call(req).await.map(|res| res.map_into_boxed_body()) })
    }
}
