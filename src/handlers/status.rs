use crate::models::ApiResponse;
use actix_web::{HttpResponse, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/status/healthcheck",
    tag = "status",
    responses(
        (status = 200, description = "Service is up")
    )
)]
pub async fn healthcheck() -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(ApiResponse::success(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))))
}

pub fn status_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/status").route("/healthcheck", web::get().to(healthcheck)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, test};

    #[actix_web::test]
    async fn test_healthcheck() {
        let app = test::init_service(App::new().configure(status_config)).await;
        let req = test::TestRequest::get()
            .uri("/status/healthcheck")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["status"], "ok");
    }
}
