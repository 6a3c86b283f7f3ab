use actix_web::web::{self};
use common::access::Capability;
use middleware::auth::RequireCapability;

pub mod routes {
    pub mod health;
    pub mod jobs;
}

pub mod middleware {
    pub mod auth;
}

mod dtos {
    pub(crate) mod jobs;
}

pub fn mount_health() -> actix_web::Scope {
    web::scope("/health").service(routes::health::get_health)
}

/// Job triggers for an external scheduler. Callers need the maintenance capability.
pub fn mount_jobs(
    jwt_secret: &str,
) -> actix_web::Scope<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    > + use<>,
> {
    web::scope("/jobs")
        .wrap(RequireCapability::new(jwt_secret, Capability::RunMaintenance))
        .service(routes::jobs::post_expired)
        .service(routes::jobs::post_expiring)
        .service(routes::jobs::post_new)
        .service(routes::jobs::post_sync_plans)
}
