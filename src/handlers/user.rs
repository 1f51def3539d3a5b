use actix_web::{get, post, put, web, HttpResponse, Responder};
use uuid::Uuid;

use crate::{
    dto::{SetGroupsDto, UserListQuery},
    service::{self, access::Principal},
    PGPool,
};

#[get("")]
pub async fn get_all(
    principal: Principal,
    query: web::Query<UserListQuery>,
    pool_state: web::Data<PGPool>,
) -> impl Responder {
    let conn: &PGPool = pool_state.get_ref();
    match service::user::list(&principal, &query, conn).await {
        Ok(users) => HttpResponse::Ok().json(users),
        Err(err) => HttpResponse::from_error(err),
    }
}

#[get("/{id}")]
pub async fn get_by_id(principal: Principal, id: web::Path<Uuid>, pool_state: web::Data<PGPool>) -> impl Responder {
    let conn: &PGPool = pool_state.get_ref();
    match service::user::get(&principal, id.into_inner(), conn).await {
        Ok(user) => HttpResponse::Ok().json(user),
        Err(err) => HttpResponse::from_error(err),
    }
}

#[post("/{id}/toggle-active")]
pub async fn toggle_active(principal: Principal, id: web::Path<Uuid>, pool_state: web::Data<PGPool>) -> impl Responder {
    let conn: &PGPool = pool_state.get_ref();
    match service::user::toggle_active(&principal, id.into_inner(), conn).await {
        Ok(user) => HttpResponse::Ok().json(user),
        Err(err) => HttpResponse::from_error(err),
    }
}

#[post("/{id}/toggle-admin")]
pub async fn toggle_admin(principal: Principal, id: web::Path<Uuid>, pool_state: web::Data<PGPool>) -> impl Responder {
    let conn: &PGPool = pool_state.get_ref();
    match service::user::toggle_admin(&principal, id.into_inner(), conn).await {
        Ok(user) => HttpResponse::Ok().json(user),
        Err(err) => HttpResponse::from_error(err),
    }
}

#[put("/{id}/groups")]
pub async fn set_groups(
    principal: Principal,
    id: web::Path<Uuid>,
    dto: web::Json<SetGroupsDto>,
    pool_state: web::Data<PGPool>,
) -> impl Responder {
    let conn: &PGPool = pool_state.get_ref();
    match service::user::set_groups(&principal, id.into_inner(), dto.into_inner(), conn).await {
        Ok(user) => HttpResponse::Ok().json(user),
        Err(err) => HttpResponse::from_error(err),
    }
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(get_all)
        .service(get_by_id)
        .service(toggle_active)
        .service(toggle_admin)
        .service(set_groups);
}
