use crate::error::error_catalog;
use crate::models::ApiResponse;
use actix_web::{HttpResponse, Result, web};

#[utoipa::path(
    get,
    path = "/code/error",
    tag = "code",
    responses(
        (status = 200, description = "Map from message code to ErrorCode")
    )
)]
pub async fn list_errors() -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(ApiResponse::success(error_catalog())))
}

pub fn code_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/code").route("/error", web::get().to(list_errors)));
}
