use crate::error::AppError;
use crate::models::*;
use crate::services::AuthService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

#[utoipa::path(
    post,
    path = "/user/auth",
    tag = "user",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token pair", body = AuthResponse),
        (status = 400, description = "Malformed email"),
        (status = 401, description = "Unknown email or wrong password")
    )
)]
pub async fn login(
    service: web::Data<AuthService>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    match service.login(request.into_inner()).await {
        Ok(auth) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": auth }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/user/auth/renew",
    tag = "user",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "New token pair", body = AuthResponse),
        (status = 401, description = "Missing, expired or non refresh token")
    )
)]
/// Expects the refresh token as bearer.
pub async fn renew(service: web::Data<AuthService>, req: HttpRequest) -> Result<HttpResponse> {
    let Some(token) = bearer_token(&req) else {
        return Ok(AppError::AuthError("Missing refresh token".to_string()).error_response());
    };
    match service.renew(token).await {
        Ok(auth) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": auth }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/user/register/validation",
    tag = "user",
    request_body = MailValidationRequest,
    responses(
        (status = 200, description = "Mail validated", body = ValidationResponse),
        (status = 400, description = "Malformed email or token"),
        (status = 404, description = "No such validation"),
        (status = 409, description = "Already validated"),
        (status = 410, description = "Validation expired")
    )
)]
pub async fn mail_validation(
    service: web::Data<AuthService>,
    request: web::Json<MailValidationRequest>,
) -> Result<HttpResponse> {
    match service.mail_validation(request.into_inner()).await {
        Ok(validation) => {
            Ok(HttpResponse::Ok().json(json!({ "success": true, "data": validation })))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/user/register/renew",
    tag = "user",
    request_body = ValidationRecoverRequest,
    responses(
        (status = 204, description = "New validation issued"),
        (status = 400, description = "Malformed email or type"),
        (status = 404, description = "No such user")
    )
)]
pub async fn validation_recover(
    service: web::Data<AuthService>,
    request: web::Json<ValidationRecoverRequest>,
) -> Result<HttpResponse> {
    match service.validation_recover(request.into_inner()).await {
        Ok(()) => Ok(HttpResponse::NoContent().finish()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/user/password",
    tag = "user",
    request_body = PasswordUpdateRequest,
    responses(
        (status = 200, description = "Password updated", body = ValidationResponse),
        (status = 400, description = "Malformed email, password or token"),
        (status = 404, description = "No such validation"),
        (status = 409, description = "Validation already used"),
        (status = 410, description = "Validation expired")
    )
)]
pub async fn password_update(
    service: web::Data<AuthService>,
    request: web::Json<PasswordUpdateRequest>,
) -> Result<HttpResponse> {
    match service.password_update(request.into_inner()).await {
        Ok(validation) => {
            Ok(HttpResponse::Ok().json(json!({ "success": true, "data": validation })))
        }
        Err(e) => Ok(e.error_response()),
    }
}

pub fn user_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/user")
            .route("/auth", web::post().to(login))
            .route("/auth/renew", web::get().to(renew))
            .route("/register/validation", web::put().to(mail_validation))
            .route("/register/renew", web::post().to(validation_recover))
            .route("/password", web::put().to(password_update)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MailConfig;
    use crate::external::MailService;
    use crate::utils::JwtService;
    use actix_web::test::TestRequest;
    use actix_web::{App, http::StatusCode, test};
    use sea_orm::{DatabaseBackend, MockDatabase};
    use serde_json::Value;

    fn auth_service() -> AuthService {
        AuthService::new(
            MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
            JwtService::new("test-secret", 900, 1800),
            MailService::new(MailConfig::default()),
            900,
        )
    }

    #[actix_web::test]
    async fn test_renew_is_a_get() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(auth_service()))
                .configure(user_config),
        )
        .await;

        let req = TestRequest::get().uri("/user/auth/renew").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["message"], "Missing refresh token");
    }

    #[actix_web::test]
    async fn test_mail_validation_route() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(auth_service()))
                .configure(user_config),
        )
        .await;

        let req = TestRequest::put()
            .uri("/user/register/validation")
            .set_json(json!({ "email": "not-an-email", "token": "123455" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[std::prelude::v1::test]
    fn test_bearer_token() {
        let req = TestRequest::default()
            .insert_header(("Authorization", "Bearer abc.def"))
            .to_http_request();
        assert_eq!(bearer_token(&req), Some("abc.def"));

        let req = TestRequest::default()
            .insert_header(("Authorization", "Basic abc"))
            .to_http_request();
        assert_eq!(bearer_token(&req), None);

        assert_eq!(bearer_token(&TestRequest::default().to_http_request()), None);
    }
}
