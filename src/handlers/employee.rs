use crate::middlewares::get_current_user;
use crate::models::*;
use crate::services::EmployeeService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/employee/register",
    operation_id = "register_employee",
    tag = "employee",
    request_body = EmployeeRegisterRequest,
    responses(
        (status = 201, description = "Employee registered, validation mail sent", body = EmployeeResponse),
        (status = 400, description = "Invalid email or password"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register(
    service: web::Data<EmployeeService>,
    request: web::Json<EmployeeRegisterRequest>,
) -> Result<HttpResponse> {
    match service.register(request.into_inner()).await {
        Ok(employee) => {
            Ok(HttpResponse::Created().json(json!({ "success": true, "data": employee })))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/employee/{id}",
    tag = "employee",
    params(
        ("id" = String, Path, description = "Employee id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Employee", body = EmployeeResponse),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "No such employee")
    )
)]
pub async fn get_employee(
    service: web::Data<EmployeeService>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let caller = match get_current_user(&req) {
        Ok(caller) => caller,
        Err(e) => return Ok(e.error_response()),
    };
    match service.get(&path.into_inner(), &caller).await {
        Ok(employee) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": employee }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/employee",
    tag = "employee",
    request_body = EmployeeUpdateRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Employee updated", body = EmployeeResponse),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "No such employee")
    )
)]
pub async fn update_employee(
    service: web::Data<EmployeeService>,
    req: HttpRequest,
    request: web::Json<EmployeeUpdateRequest>,
) -> Result<HttpResponse> {
    let caller = match get_current_user(&req) {
        Ok(caller) => caller,
        Err(e) => return Ok(e.error_response()),
    };
    match service.update(request.into_inner(), &caller).await {
        Ok(employee) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": employee }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/employee/{id}",
    tag = "employee",
    params(
        ("id" = String, Path, description = "Employee id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 204, description = "Employee deleted"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "No such employee")
    )
)]
pub async fn delete_employee(
    service: web::Data<EmployeeService>,
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

pub fn employee_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/employee")
            .route("", web::put().to(update_employee))
            .route("/register", web::post().to(register))
            .route("/{id}", web::get().to(get_employee))
            .route("/{id}", web::delete().to(delete_employee)),
    );
}
