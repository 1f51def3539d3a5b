use actix_web::{delete, get, post, put, web, HttpRequest, HttpResponse, Responder};

use crate::{
    config::Settings,
    dto::{BulkIdsDto, BulkPublishDto, BulkStatusDto, EventListQuery, LegacyImportDto, NewEventDto, UpdateEventDto},
    models::EventStatus,
    service::{self, access::Principal},
    PGPool,
};

const EXPORT_DISPOSITION: &str = "attachment; filename=\"events.json\"";

#[get("")]
pub async fn get_all(
    req: HttpRequest,
    principal: Option<Principal>,
    pool_state: web::Data<PGPool>,
    settings: web::Data<Settings>,
) -> impl Responder {
    let query = EventListQuery::from_query_string(req.query_string());
    let conn: &PGPool = pool_state.get_ref();
    match service::event::list(principal.as_ref(), &query, settings.get_ref(), conn).await {
        Ok(page) => HttpResponse::Ok().json(page),
        Err(err) => HttpResponse::from_error(err),
    }
}

#[get("/export")]
pub async fn export(
    req: HttpRequest,
    principal: Option<Principal>,
    pool_state: web::Data<PGPool>,
) -> impl Responder {
    let query = EventListQuery::from_query_string(req.query_string());
    let conn: &PGPool = pool_state.get_ref();
    match service::event::export(principal.as_ref(), &query, conn).await {
        Ok(report) => HttpResponse::Ok()
            .insert_header(("Content-Disposition", EXPORT_DISPOSITION))
            .json(report),
        Err(err) => HttpResponse::from_error(err),
    }
}

#[get("/{id}")]
pub async fn get_by_id(
    principal: Option<Principal>,
    id: web::Path<i64>,
    pool_state: web::Data<PGPool>,
) -> impl Responder {
    let conn: &PGPool = pool_state.get_ref();
    match service::event::get(principal.as_ref(), id.into_inner(), conn).await {
        Ok(record) => HttpResponse::Ok().json(record),
        Err(err) => HttpResponse::from_error(err),
    }
}

#[post("")]
pub async fn create(
    principal: Principal,
    new_event_dto: web::Json<NewEventDto>,
    pool_state: web::Data<PGPool>,
) -> impl Responder {
    let conn: &PGPool = pool_state.get_ref();
    match service::event::create(&principal, new_event_dto.into_inner(), conn).await {
        Ok(created) => HttpResponse::Created().json(created),
        Err(err) => HttpResponse::from_error(err),
    }
}

#[put("/{id}")]
pub async fn update(
    principal: Principal,
    id: web::Path<i64>,
    update_event_dto: web::Json<UpdateEventDto>,
    pool_state: web::Data<PGPool>,
) -> impl Responder {
    let conn: &PGPool = pool_state.get_ref();
    match service::event::update(&principal, id.into_inner(), update_event_dto.into_inner(), conn).await {
        Ok(record) => HttpResponse::Ok().json(record),
        Err(err) => HttpResponse::from_error(err),
    }
}

#[delete("/{id}")]
pub async fn remove(principal: Principal, id: web::Path<i64>, pool_state: web::Data<PGPool>) -> impl Responder {
    let conn: &PGPool = pool_state.get_ref();
    match service::event::delete(&principal, id.into_inner(), conn).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(err) => HttpResponse::from_error(err),
    }
}

#[post("/{id}/status/{status}")]
pub async fn set_status(
    principal: Principal,
    path: web::Path<(i64, String)>,
    pool_state: web::Data<PGPool>,
) -> impl Responder {
    let conn: &PGPool = pool_state.get_ref();
    let (id, raw_status) = path.into_inner();
    let status = match raw_status.parse::<EventStatus>() {
        Ok(status) => status,
        Err(err) => return HttpResponse::from_error(err),
    };
    match service::event::set_status(&principal, id, status, conn).await {
        Ok(event) => HttpResponse::Ok().json(event),
        Err(err) => HttpResponse::from_error(err),
    }
}

#[post("/{id}/toggle-publish")]
pub async fn toggle_publish(principal: Principal, id: web::Path<i64>, pool_state: web::Data<PGPool>) -> impl Responder {
    let conn: &PGPool = pool_state.get_ref();
    match service::event::toggle_publish(&principal, id.into_inner(), conn).await {
        Ok(state) => HttpResponse::Ok().json(state),
        Err(err) => HttpResponse::from_error(err),
    }
}

#[post("/bulk/status")]
pub async fn bulk_status(
    principal: Principal,
    dto: web::Json<BulkStatusDto>,
    pool_state: web::Data<PGPool>,
) -> impl Responder {
    let conn: &PGPool = pool_state.get_ref();
    let status = match dto.status.parse::<EventStatus>() {
        Ok(status) => status,
        Err(err) => return HttpResponse::from_error(err),
    };
    match service::event::bulk_set_status(&principal, &dto.ids, status, conn).await {
        Ok(outcome) => HttpResponse::Ok().json(outcome),
        Err(err) => HttpResponse::from_error(err),
    }
}

#[post("/bulk/publish")]
pub async fn bulk_publish(
    principal: Principal,
    dto: web::Json<BulkPublishDto>,
    pool_state: web::Data<PGPool>,
) -> impl Responder {
    let conn: &PGPool = pool_state.get_ref();
    match service::event::bulk_set_published(&principal, &dto.ids, dto.published, conn).await {
        Ok(outcome) => HttpResponse::Ok().json(outcome),
        Err(err) => HttpResponse::from_error(err),
    }
}

#[post("/bulk/delete")]
pub async fn bulk_delete(principal: Principal, dto: web::Json<BulkIdsDto>, pool_state: web::Data<PGPool>) -> impl Responder {
    let conn: &PGPool = pool_state.get_ref();
    match service::event::bulk_delete(&principal, &dto.ids, conn).await {
        Ok(outcome) => HttpResponse::Ok().json(outcome),
        Err(err) => HttpResponse::from_error(err),
    }
}

#[post("/import")]
pub async fn import_legacy(
    principal: Principal,
    dto: web::Json<LegacyImportDto>,
    pool_state: web::Data<PGPool>,
) -> impl Responder {
    let conn: &PGPool = pool_state.get_ref();
    match service::event::import_legacy(&principal, dto.into_inner(), conn).await {
        Ok(report) => HttpResponse::Ok().json(report),
        Err(err) => HttpResponse::from_error(err),
    }
}

/// Literal paths go before `/{id}` so they are not captured as ids.
pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(get_all)
        .service(export)
        .service(bulk_status)
        .service(bulk_publish)
        .service(bulk_delete)
        .service(import_legacy)
        .service(create)
        .service(get_by_id)
        .service(update)
        .service(remove)
        .service(set_status)
        .service(toggle_publish);
}
