use crate::middlewares::get_current_user;
use crate::models::*;
use crate::services::GameService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/game/random",
    tag = "game",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "A random unclaimed ticket", body = TicketResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No ticket left")
    )
)]
pub async fn random_ticket(service: web::Data<GameService>) -> Result<HttpResponse> {
    match service.random_ticket().await {
        Ok(ticket) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": ticket }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/game/tickets",
    tag = "game",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Tickets claimed by the caller", body = [TicketResponse]),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn my_tickets(service: web::Data<GameService>, req: HttpRequest) -> Result<HttpResponse> {
    let caller = match get_current_user(&req) {
        Ok(caller) => caller,
        Err(e) => return Ok(e.error_response()),
    };
    match service.my_tickets(&caller).await {
        Ok(list) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": list }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/game/ticket/{id}",
    tag = "game",
    params(
        ("id" = String, Path, description = "Ticket id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Ticket", body = TicketResponse),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "No such ticket")
    )
)]
pub async fn get_ticket(
    service: web::Data<GameService>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let caller = match get_current_user(&req) {
        Ok(caller) => caller,
        Err(e) => return Ok(e.error_response()),
    };
    match service.get_ticket(&path.into_inner(), &caller).await {
        Ok(ticket) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": ticket }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/game/ticket",
    tag = "game",
    request_body = ClaimTicketRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Ticket claimed", body = TicketResponse),
        (status = 400, description = "Malformed token"),
        (status = 404, description = "Unknown token"),
        (status = 409, description = "Ticket already claimed")
    )
)]
pub async fn claim_ticket(
    service: web::Data<GameService>,
    req: HttpRequest,
    request: web::Json<ClaimTicketRequest>,
) -> Result<HttpResponse> {
    let caller = match get_current_user(&req) {
        Ok(caller) => caller,
        Err(e) => return Ok(e.error_response()),
    };
    match service.claim_ticket(&request.token, &caller).await {
        Ok(ticket) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": ticket }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn game_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/game")
            .route("/random", web::get().to(random_ticket))
            .route("/tickets", web::get().to(my_tickets))
            .route("/ticket", web::put().to(claim_ticket))
            .route("/ticket/{id}", web::get().to(get_ticket)),
    );
}
