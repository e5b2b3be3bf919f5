use crate::middlewares::get_current_user;
use crate::models::*;
use crate::services::ClientService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/client/register",
    operation_id = "register_client",
    tag = "client",
    request_body = ClientRegisterRequest,
    responses(
        (status = 201, description = "Client registered, validation mail sent", body = ClientResponse),
        (status = 400, description = "Invalid email, password, cgu or newsletter"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register(
    service: web::Data<ClientService>,
    request: web::Json<ClientRegisterRequest>,
) -> Result<HttpResponse> {
    match service.register(request.into_inner()).await {
        Ok(client) => Ok(HttpResponse::Created().json(json!({ "success": true, "data": client }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/export/client",
    tag = "client",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "All clients", body = [ClientResponse]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Employees only")
    )
)]
pub async fn export(service: web::Data<ClientService>, req: HttpRequest) -> Result<HttpResponse> {
    let caller = match get_current_user(&req) {
        Ok(caller) => caller,
        Err(e) => return Ok(e.error_response()),
    };
    match service.export(&caller).await {
        Ok(list) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": list }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/client/{id}",
    tag = "client",
    params(
        ("id" = String, Path, description = "Client id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Client", body = ClientResponse),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "No such client")
    )
)]
pub async fn get_client(
    service: web::Data<ClientService>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let caller = match get_current_user(&req) {
        Ok(caller) => caller,
        Err(e) => return Ok(e.error_response()),
    };
    match service.get(&path.into_inner(), &caller).await {
        Ok(client) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": client }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/client",
    tag = "client",
    request_body = ClientUpdateRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Client updated", body = ClientResponse),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "No such client")
    )
)]
pub async fn update_client(
    service: web::Data<ClientService>,
    req: HttpRequest,
    request: web::Json<ClientUpdateRequest>,
) -> Result<HttpResponse> {
    let caller = match get_current_user(&req) {
        Ok(caller) => caller,
        Err(e) => return Ok(e.error_response()),
    };
    match service.update(request.into_inner(), &caller).await {
        Ok(client) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": client }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/client/{id}",
    tag = "client",
    params(
        ("id" = String, Path, description = "Client id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 204, description = "Client deleted"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "No such client")
    )
)]
pub async fn delete_client(
    service: web::Data<ClientService>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let caller = match get_current_user(&req) {
        Ok(caller) => caller,
        Err(e) => return Ok(e.error_response()),
    };
    match service.delete(&path.into_inner(), &caller).await {
        Ok(()) => Ok(HttpResponse::NoContent().finish()),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn client_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/client")
            .route("", web::put().to(update_client))
            .route("/register", web::post().to(register))
            .route("/{id}", web::get().to(get_client))
            .route("/{id}", web::delete().to(delete_client)),
    )
    .service(web::scope("/export").route("/client", web::get().to(export)));
}
