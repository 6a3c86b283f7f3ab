use actix_web::{App, HttpMessage, HttpRequest, HttpResponse, http::StatusCode, test, web};
use api_jobs::{middleware::auth::RequireCapability, mount_health};
use common::{
    access::{Capability, Role},
    env_config::JwtConfig,
    jwt::{TokenSubject, JwtClaims, generate_jwt},
};
use uuid::Uuid;

const SECRET: &str = "ops-secret";

fn token(role: Role, permissions: &[&str], secret: &str) -> String {
    let config = JwtConfig {
        secret: secret.to_string(),
        expiration_hours: 1,
    };
    generate_jwt(
        TokenSubject {
            subject: Uuid::new_v4(),
            role,
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
        },
        &config,
    )
    .unwrap()
}

async fn whoami(req: HttpRequest) -> HttpResponse {
    match req.extensions().get::<JwtClaims>() {
        Some(claims) => HttpResponse::Ok().body(claims.role.clone()),
        None => HttpResponse::InternalServerError().finish(),
    }
}

macro_rules! ops_app {
    () => {
        test::init_service(
            App::new().service(
                web::scope("/api")
                    .service(mount_health())
                    .service(
                        web::scope("/jobs")
                            .wrap(RequireCapability::new(SECRET, Capability::RunMaintenance))
                            .route("/whoami", web::post().to(whoami)),
                    ),
            ),
        )
        .await
    };
}

#[actix_web::test]
async fn health_needs_no_token() {
    let app = ops_app!();
    let req = test::TestRequest::get().uri("/api/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn missing_token_is_unauthorized() {
    let app = ops_app!();
    let req = test::TestRequest::post().uri("/api/jobs/whoami").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn token_signed_elsewhere_is_unauthorized() {
    let app = ops_app!();
    let req = test::TestRequest::post()
        .uri("/api/jobs/whoami")
        .insert_header((
            "Authorization",
            format!("Bearer {}", token(Role::Admin, &[], "other-secret")),
        ))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn plain_user_is_forbidden() {
    let app = ops_app!();
    let req = test::TestRequest::post()
        .uri("/api/jobs/whoami")
        .insert_header((
            "Authorization",
            format!("Bearer {}", token(Role::User, &["view contents"], SECRET)),
        ))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn granted_user_and_manager_pass_with_claims() {
    let app = ops_app!();

    for (role, permissions, expected) in [
        (Role::Manager, vec![], "manager"),
        (Role::User, vec!["run maintenance"], "user"),
    ] {
        let req = test::TestRequest::post()
            .uri("/api/jobs/whoami")
            .insert_header((
                "Authorization",
                format!("Bearer {}", token(role, &permissions, SECRET)),
            ))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = test::read_body(resp).await;
        assert_eq!(body, expected.as_bytes());
    }
}
