use crate::middlewares::get_current_user;
use crate::models::*;
use crate::services::StoreService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/store",
    tag = "store",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Stores with their cash registers", body = [StoreResponse]),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_stores(service: web::Data<StoreService>) -> Result<HttpResponse> {
    match service.list_stores().await {
        Ok(list) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": list }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/store/{id}/caisses",
    tag = "store",
    params(
        ("id" = String, Path, description = "Store id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Cash registers of the store", body = [CaisseResponse]),
        (status = 403, description = "Employees only"),
        (status = 404, description = "No such store")
    )
)]
pub async fn store_caisses(
    service: web::Data<StoreService>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let caller = match get_current_user(&req) {
        Ok(caller) => caller,
        Err(e) => return Ok(e.error_response()),
    };
    match service.caisses_by_store(&path.into_inner(), &caller).await {
        Ok(list) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": list }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/caisse/{id}",
    tag = "caisse",
    params(
        ("id" = String, Path, description = "Caisse id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Cash register", body = CaisseResponse),
        (status = 403, description = "Employees only"),
        (status = 404, description = "No such caisse")
    )
)]
pub async fn get_caisse(
    service: web::Data<StoreService>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let caller = match get_current_user(&req) {
        Ok(caller) => caller,
        Err(e) => return Ok(e.error_response()),
    };
    match service.get_caisse(&path.into_inner(), &caller).await {
        Ok(caisse) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": caisse }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/caisse",
    tag = "caisse",
    request_body = CaisseCreateRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Cash register created", body = CaisseResponse),
        (status = 403, description = "Employees only"),
        (status = 404, description = "No such store")
    )
)]
pub async fn create_caisse(
    service: web::Data<StoreService>,
    req: HttpRequest,
    request: web::Json<CaisseCreateRequest>,
) -> Result<HttpResponse> {
    let caller = match get_current_user(&req) {
        Ok(caller) => caller,
        Err(e) => return Ok(e.error_response()),
    };
    match service.create_caisse(request.into_inner(), &caller).await {
        Ok(caisse) => {
            Ok(HttpResponse::Created().json(json!({ "success": true, "data": caisse })))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/caisse/{id}",
    tag = "caisse",
    params(
        ("id" = String, Path, description = "Caisse id")
    ),
    request_body = CaisseUpdateRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Cash register moved", body = CaisseResponse),
        (status = 403, description = "Employees only"),
        (status = 404, description = "No such caisse or store")
    )
)]
pub async fn update_caisse(
    service: web::Data<StoreService>,
    req: HttpRequest,
    path: web::Path<String>,
    request: web::Json<CaisseUpdateRequest>,
) -> Result<HttpResponse> {
    let caller = match get_current_user(&req) {
        Ok(caller) => caller,
        Err(e) => return Ok(e.error_response()),
    };
    match service
        .update_caisse(&path.into_inner(), request.into_inner(), &caller)
        .await
    {
        Ok(caisse) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": caisse }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/caisse/{id}",
    tag = "caisse",
    params(
        ("id" = String, Path, description = "Caisse id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 204, description = "Cash register deleted"),
        (status = 403, description = "Employees only"),
        (status = 404, description = "No such caisse")
    )
)]
pub async fn delete_caisse(
    service: web::Data<StoreService>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let caller = match get_current_user(&req) {
        Ok(caller) => caller,
        Err(e) => return Ok(e.error_response()),
    };
    match service.delete_caisse(&path.into_inner(), &caller).await {
        Ok(()) => Ok(HttpResponse::NoContent().finish()),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn store_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/store")
            .route("", web::get().to(list_stores))
            .route("/{id}/caisses", web::get().to(store_caisses)),
    )
    .service(
        web::scope("/caisse")
            .route("", web::post().to(create_caisse))
            .route("/{id}", web::get().to(get_caisse))
            .route("/{id}", web::put().to(update_caisse))
            .route("/{id}", web::delete().to(delete_caisse)),
    );
}
