use actix_web::{post, web, HttpResponse, Responder};
use log::info;

use crate::{
    config::Settings,
    dto::{LoginUserRequest, NewUserDto},
    service, PGPool,
};

#[post("/register")]
pub async fn register(dto: web::Json<NewUserDto>, pool_state: web::Data<PGPool>) -> impl Responder {
    let conn: &PGPool = pool_state.get_ref();
    match service::user::register(dto.into_inner(), conn).await {
        Ok(user) => {
            info!("registered '{}' via /auth/register", user.username);
            HttpResponse::Created().json(user)
        }
        Err(err) => HttpResponse::from_error(err),
    }
}

#[post("/login")]
pub async fn login(
    dto: web::Json<LoginUserRequest>,
    pool_state: web::Data<PGPool>,
    settings: web::Data<Settings>,
) -> impl Responder {
    let conn: &PGPool = pool_state.get_ref();
    match service::auth::login(conn, settings.get_ref(), dto.into_inner()).await {
        Ok(token) => HttpResponse::Ok().json(token),
        Err(err) => HttpResponse::from_error(err),
    }
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(register).service(login);
}
