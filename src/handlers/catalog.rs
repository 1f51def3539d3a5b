//! Department, category and location catalogs. Reads are open to any caller,
//! writes require the admin role.

use actix_web::{delete, get, post, put, web, HttpResponse, Responder};

use crate::{
    dto::{CatalogQuery, CategoryDto, DepartmentDto, LocationDto},
    service::{self, access::Principal},
    PGPool,
};

pub mod departments {
    use super::*;

    #[get("")]
    pub async fn get_all(query: web::Query<CatalogQuery>, pool_state: web::Data<PGPool>) -> impl Responder {
        match service::catalog::list_departments(query.q.as_deref(), pool_state.get_ref()).await {
            Ok(departments) => HttpResponse::Ok().json(departments),
            Err(err) => HttpResponse::from_error(err),
        }
    }

    #[post("")]
    pub async fn create(
        principal: Principal,
        dto: web::Json<DepartmentDto>,
        pool_state: web::Data<PGPool>,
    ) -> impl Responder {
        match service::catalog::create_department(&principal, dto.into_inner(), pool_state.get_ref()).await {
            Ok(department) => HttpResponse::Created().json(department),
            Err(err) => HttpResponse::from_error(err),
        }
    }

    #[put("/{id}")]
    pub async fn update(
        principal: Principal,
        id: web::Path<i64>,
        dto: web::Json<DepartmentDto>,
        pool_state: web::Data<PGPool>,
    ) -> impl Responder {
        match service::catalog::update_department(&principal, id.into_inner(), dto.into_inner(), pool_state.get_ref())
            .await
        {
            Ok(department) => HttpResponse::Ok().json(department),
            Err(err) => HttpResponse::from_error(err),
        }
    }

    #[delete("/{id}")]
    pub async fn remove(principal: Principal, id: web::Path<i64>, pool_state: web::Data<PGPool>) -> impl Responder {
        match service::catalog::delete_department(&principal, id.into_inner(), pool_state.get_ref()).await {
            Ok(()) => HttpResponse::NoContent().finish(),
            Err(err) => HttpResponse::from_error(err),
        }
    }

    pub fn init_routes(cfg: &mut web::ServiceConfig) {
        cfg.service(get_all).service(create).service(update).service(remove);
    }
}

pub mod categories {
    use super::*;

    #[get("")]
    pub async fn get_all(query: web::Query<CatalogQuery>, pool_state: web::Data<PGPool>) -> impl Responder {
        match service::catalog::list_categories(query.q.as_deref(), pool_state.get_ref()).await {
            Ok(categories) => HttpResponse::Ok().json(categories),
            Err(err) => HttpResponse::from_error(err),
        }
    }

    #[post("")]
    pub async fn create(
        principal: Principal,
        dto: web::Json<CategoryDto>,
        pool_state: web::Data<PGPool>,
    ) -> impl Responder {
        match service::catalog::create_category(&principal, dto.into_inner(), pool_state.get_ref()).await {
            Ok(category) => HttpResponse::Created().json(category),
            Err(err) => HttpResponse::from_error(err),
        }
    }

    #[put("/{id}")]
    pub async fn update(
        principal: Principal,
        id: web::Path<i64>,
        dto: web::Json<CategoryDto>,
        pool_state: web::Data<PGPool>,
    ) -> impl Responder {
        match service::catalog::update_category(&principal, id.into_inner(), dto.into_inner(), pool_state.get_ref())
            .await
        {
            Ok(category) => HttpResponse::Ok().json(category),
            Err(err) => HttpResponse::from_error(err),
        }
    }

    #[delete("/{id}")]
    pub async fn remove(principal: Principal, id: web::Path<i64>, pool_state: web::Data<PGPool>) -> impl Responder {
        match service::catalog::delete_category(&principal, id.into_inner(), pool_state.get_ref()).await {
            Ok(()) => HttpResponse::NoContent().finish(),
            Err(err) => HttpResponse::from_error(err),
        }
    }

    pub fn init_routes(cfg: &mut web::ServiceConfig) {
        cfg.service(get_all).service(create).service(update).service(remove);
    }
}

pub mod locations {
    use super::*;

    #[get("")]
    pub async fn get_all(query: web::Query<CatalogQuery>, pool_state: web::Data<PGPool>) -> impl Responder {
        match service::catalog::list_locations(query.q.as_deref(), pool_state.get_ref()).await {
            Ok(locations) => HttpResponse::Ok().json(locations),
            Err(err) => HttpResponse::from_error(err),
        }
    }

    #[post("")]
    pub async fn create(
        principal: Principal,
        dto: web::Json<LocationDto>,
        pool_state: web::Data<PGPool>,
    ) -> impl Responder {
        match service::catalog::create_location(&principal, dto.into_inner(), pool_state.get_ref()).await {
            Ok(location) => HttpResponse::Created().json(location),
            Err(err) => HttpResponse::from_error(err),
        }
    }

    #[put("/{id}")]
    pub async fn update(
        principal: Principal,
        id: web::Path<i64>,
        dto: web::Json<LocationDto>,
        pool_state: web::Data<PGPool>,
    ) -> impl Responder {
        match service::catalog::update_location(&principal, id.into_inner(), dto.into_inner(), pool_state.get_ref())
            .await
        {
            Ok(location) => HttpResponse::Ok().json(location),
            Err(err) => HttpResponse::from_error(err),
        }
    }

    #[delete("/{id}")]
    pub async fn remove(principal: Principal, id: web::Path<i64>, pool_state: web::Data<PGPool>) -> impl Responder {
        match service::catalog::delete_location(&principal, id.into_inner(), pool_state.get_ref()).await {
            Ok(()) => HttpResponse::NoContent().finish(),
            Err(err) => HttpResponse::from_error(err),
        }
    }

    pub fn init_routes(cfg: &mut web::ServiceConfig) {
        cfg.service(get_all).service(create).service(update).service(remove);
    }
}
