use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter

use thetiptop_backend::{
    config::Config,
    database::{create_pool, run_migrations},
    external::MailService,
    handlers,
    middlewares::{AuthMiddleware, create_cors},
    repositories::SeaOrmTicketRepository,
    services::*,
    swagger::swagger_config,
    utils::JwtService,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    let config = Config::from_toml().expect("Failed to load configuration");

    let pool = create_pool(&config.database)
        .await
        .expect("Failed to create database connection pool");

    run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    sync_stores(&pool)
        .await
        .expect("Failed to synchronize stores");

    // Tickets are topped up before the server accepts claims
    if config.game.hydrate_on_start {
        let repo = SeaOrmTicketRepository::new(pool.clone());
        let report = hydrate_tickets(
            &repo,
            config.game.require,
            &config.game.dispatch,
            config.game.batch_size,
        )
        .await
        .expect("Failed to hydrate tickets");
        log::info!(
            "Ticket hydration done: {} existing, {} created",
            report.existing,
            report.created
        );
    }

    let jwt_service = JwtService::new(
        &config.jwt.secret,
        config.jwt.access_token_expires_in,
        config.jwt.refresh_token_expires_in,
    );

    let mail_service = MailService::new(config.mail.clone());
    if !mail_service.is_enabled() {
        log::warn!("MAIL_API_URL is empty, validation mails will not be sent");
    }

    let auth_service = AuthService::new(
        pool.clone(),
        jwt_service.clone(),
        mail_service,
        config.security.validation_expire,
    );
    let client_service = ClientService::new(pool.clone(), auth_service.clone());
    let employee_service = EmployeeService::new(pool.clone(), auth_service.clone());
    let game_service = GameService::new(pool.clone());
    let store_service = StoreService::new(pool.clone());

    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    let allowed_origins = config.server.allowed_origins.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(create_cors(&allowed_origins))
            .wrap(AuthMiddleware::new(jwt_service.clone()))
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(client_service.clone()))
            .app_data(web::Data::new(employee_service.clone()))
            .app_data(web::Data::new(game_service.clone()))
            .app_data(web::Data::new(store_service.clone()))
            .configure(swagger_config)
            .service(
                web::scope("/api/v1")
                    .configure(handlers::status_config)
                    .configure(handlers::client_config)
                    .configure(handlers::employee_config)
                    .configure(handlers::user_config)
                    .configure(handlers::game_config)
                    .configure(handlers::store_config)
                    .configure(handlers::code_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
