use crate::error::{AppError, AppResult};
use crate::models::AuthUser;
use crate::utils::JwtService;
use actix_web::http::Method;
use actix_web::{
    Error, HttpMessage, HttpRequest,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};

/// Routes reachable without an access token.
struct PublicPaths {
    exact_paths: Vec<&'static str>,
    prefix_paths: Vec<&'static str>,
}

impl PublicPaths {
    fn new() -> Self {
        Self {
            exact_paths: vec![
                "/swagger-ui",
                "/swagger-ui/",
                "/api-docs/openapi.json",
                "/api/v1/client/register",
                "/api/v1/employee/register",
                "/api/v1/code/error",
            ],
            // the whole user scope is public: renew carries a refresh token,
            // checked by its handler
            prefix_paths: vec![
                "/swagger-ui/",
                "/api-docs/",
                "/api/v1/status/",
                "/api/v1/user/",
            ],
        }
    }

    fn is_public_path(&self, path: &str) -> bool {
        if self.exact_paths.contains(&path) {
            return true;
        }

        self.prefix_paths
            .iter()
            .any(|&prefix| path.starts_with(prefix))
    }
}

pub struct AuthMiddleware {
    jwt_service: JwtService,
}

impl AuthMiddleware {
    pub fn new(jwt_service: JwtService) -> Self {
        Self { jwt_service }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service,
            jwt_service: self.jwt_service.clone(),
            public_paths: PublicPaths::new(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
    jwt_service: JwtService,
    public_paths: PublicPaths,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // CORS preflight
        if req.method() == Method::OPTIONS {
            let fut = self.service.call(req);
            return Box::pin(fut);
        }

        if self.public_paths.is_public_path(req.path()) {
            let fut = self.service.call(req);
            return Box::pin(fut);
        }

        let token = req
            .headers()
            .get("Authorization")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));

        let Some(token) = token else {
            let error = AppError::AuthError("Missing access token".to_string());
            return Box::pin(async move { Err(error.into()) });
        };

        match self.jwt_service.verify_access_token(token) {
            Ok(claims) => {
                req.extensions_mut().insert(AuthUser {
                    credential_id: claims.sub,
                    user_id: claims.user_id,
                    role: claims.role,
                });
                let fut = self.service.call(req);
                Box::pin(fut)
            }
            Err(_) => {
                let error = AppError::AuthError("Invalid access token".to_string());
                Box::pin(async move { Err(error.into()) })
            }
        }
    }
}

/// Caller stored by `AuthMiddleware`.
pub fn get_current_user(req: &HttpRequest) -> AppResult<AuthUser> {
    req.extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| AppError::AuthError("Missing access token".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test, web};

    async fn whoami(req: HttpRequest) -> HttpResponse {
        match get_current_user(&req) {
            Ok(user) => HttpResponse::Ok().body(format!("{}:{}", user.user_id, user.role)),
            Err(_) => HttpResponse::InternalServerError().finish(),
        }
    }

    fn jwt() -> JwtService {
        JwtService::new("test-secret", 900, 1800)
    }

    #[std::prelude::v1::test]
    fn test_public_paths() {
        let paths = PublicPaths::new();
        assert!(paths.is_public_path("/api/v1/status/healthcheck"));
        assert!(paths.is_public_path("/api/v1/client/register"));
        assert!(paths.is_public_path("/api/v1/user/register/validation"));
        assert!(paths.is_public_path("/api/v1/employee/register"));
        assert!(paths.is_public_path("/api/v1/user/auth"));
        assert!(paths.is_public_path("/api/v1/user/auth/renew"));
        assert!(paths.is_public_path("/api/v1/code/error"));
        assert!(paths.is_public_path("/swagger-ui/index.html"));

        assert!(!paths.is_public_path("/api/v1/export/client"));
        assert!(!paths.is_public_path("/api/v1/client/register/validation"));
        assert!(!paths.is_public_path("/api/v1/client/some-id"));
        assert!(!paths.is_public_path("/api/v1/game/ticket"));
        assert!(!paths.is_public_path("/api/v1/employee/some-id"));
        assert!(!paths.is_public_path("/api/v1/store"));
        assert!(!paths.is_public_path("/api/v1/caisse/some-id"));
    }

    #[actix_web::test]
    async fn test_protected_route_requires_token() {
        let app = test::init_service(
            App::new()
                .wrap(AuthMiddleware::new(jwt()))
                .route("/api/v1/game/tickets", web::get().to(whoami)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/v1/game/tickets")
            .to_request();
        let err = app.call(req).await.err().unwrap();
        assert_eq!(
            err.as_response_error().status_code(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[actix_web::test]
    async fn test_refresh_token_is_not_an_access_token() {
        let app = test::init_service(
            App::new()
                .wrap(AuthMiddleware::new(jwt()))
                .route("/api/v1/game/tickets", web::get().to(whoami)),
        )
        .await;

        let refresh = jwt()
            .generate_refresh_token("cred-1", "client-1", Role::Client)
            .unwrap();
        let req = test::TestRequest::get()
            .uri("/api/v1/game/tickets")
            .insert_header(("Authorization", format!("Bearer {refresh}")))
            .to_request();
        assert!(app.call(req).await.is_err());
    }

    #[actix_web::test]
    async fn test_valid_token_exposes_caller() {
        let app = test::init_service(
            App::new()
                .wrap(AuthMiddleware::new(jwt()))
                .route("/api/v1/game/tickets", web::get().to(whoami)),
        )
        .await;

        let access = jwt()
            .generate_access_token("cred-1", "emp-1", Role::Employee)
            .unwrap();
        let req = test::TestRequest::get()
            .uri("/api/v1/game/tickets")
            .insert_header(("Authorization", format!("Bearer {access}")))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, "emp-1:employee");
    }
}
