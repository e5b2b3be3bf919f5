use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::validation_entity::ValidationType;
use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::status::healthcheck,
        handlers::client::register,
        handlers::client::export,
        handlers::client::get_client,
        handlers::client::update_client,
        handlers::client::delete_client,
        handlers::employee::register,
        handlers::employee::get_employee,
        handlers::employee::update_employee,
        handlers::employee::delete_employee,
        handlers::user::login,
        handlers::user::renew,
        handlers::user::mail_validation,
        handlers::user::validation_recover,
        handlers::user::password_update,
        handlers::game::random_ticket,
        handlers::game::my_tickets,
        handlers::game::get_ticket,
        handlers::game::claim_ticket,
        handlers::store::list_stores,
        handlers::store::store_caisses,
        handlers::store::get_caisse,
        handlers::store::create_caisse,
        handlers::store::update_caisse,
        handlers::store::delete_caisse,
        handlers::code::list_errors,
    ),
    components(
        schemas(
            Role,
            ValidationType,
            LoginRequest,
            AuthResponse,
            MailValidationRequest,
            ValidationRecoverRequest,
            PasswordUpdateRequest,
            ValidationResponse,
            ClientRegisterRequest,
            ClientUpdateRequest,
            ClientResponse,
            EmployeeRegisterRequest,
            EmployeeUpdateRequest,
            EmployeeResponse,
            ClaimTicketRequest,
            TicketResponse,
            StoreResponse,
            CaisseResponse,
            CaisseCreateRequest,
            CaisseUpdateRequest,
            ApiError,
            ErrorCode,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "status", description = "Service status"),
        (name = "client", description = "Client registration and management"),
        (name = "employee", description = "Employee registration and management"),
        (name = "user", description = "Authentication, validation and password recovery"),
        (name = "game", description = "Game tickets"),
        (name = "store", description = "Stores"),
        (name = "caisse", description = "Cash registers, employees only"),
        (name = "code", description = "Error code listing"),
    ),
    info(
        title = "TheTipTop API",
        version = "1.0.0",
        description = "TheTipTop backend REST API documentation",
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
