use std::io;

use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use log::{error, info};

use mplan_service::{
    config::Settings,
    db::init_db_pool,
    handlers,
    service::{auth::AuthMiddleware, log::{init_logger, LoggerMiddleware}},
    PGPool,
};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    init_logger();

    let settings = Settings::from_env().map_err(|err| {
        error!("invalid configuration: {}", err);
        io::Error::new(io::ErrorKind::InvalidInput, err.to_string())
    })?;
    let pool: PGPool = init_db_pool(&settings).await.map_err(|err| {
        error!("failed to initialise the database: {:?}", err);
        io::Error::new(io::ErrorKind::Other, err.to_string())
    })?;

    let bind = (settings.host.clone(), settings.port);
    info!("listening on {}:{}", bind.0, bind.1);
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(settings.clone()))
            .wrap(AuthMiddleware {
                db_pool: pool.clone(),
                jwt_secret: settings.jwt_secret.clone(),
            })
            .wrap(LoggerMiddleware)
            .service(web::scope("/auth").configure(handlers::auth::init_routes))
            .service(web::scope("/events").configure(handlers::event::init_routes))
            .service(web::scope("/users").configure(handlers::user::init_routes))
            .service(web::scope("/departments").configure(handlers::catalog::departments::init_routes))
            .service(web::scope("/categories").configure(handlers::catalog::categories::init_routes))
            .service(web::scope("/locations").configure(handlers::catalog::locations::init_routes))
    })
    .bind(bind)?
    .run()
    .await
}
