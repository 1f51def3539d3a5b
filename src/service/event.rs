//! Event use cases.
//!
//! Every read by a principal loads a snapshot of resolved records and hands it to the pure
//! core: access filter first, then the query engine, then pagination or export.
//! Mutations check permission on the stored row before touching it.

use std::{collections::HashSet, future::Future};

use chrono::{DateTime, Utc};
use log::{info, warn};

use crate::{
    config::Settings,
    db,
    dto::{
        BulkOutcome, EventListQuery, ImportReport, LegacyImportDto, NewEventDto, PublishState,
        SkippedRow, UnmatchedNames, UpdateEventDto,
    },
    errors::ApiError,
    models::{validate_title, validate_window, Event, EventRecord, EventStatus},
    service::{
        access::{can_view, ensure_admin, ensure_can_edit, visible_events, Principal},
        export::{build_report, ExportReport},
        filter::{filter_events, EventCriteria},
        legacy::{normalize_legacy, ImportDefaults},
        pagination::{paginate, Page, PageRequest},
        status::{derive_status, refresh},
    },
    PGPool,
};

/// Access filter, query engine and pagination over one snapshot.
pub fn list_page(
    records: &[EventRecord],
    principal: Option<&Principal>,
    query: &EventListQuery,
    settings: &Settings,
    now: DateTime<Utc>,
) -> Page<EventRecord> {
    let criteria = EventCriteria::from_query(query);
    let visible = visible_events(records, principal);
    let ordered = filter_events(visible, &criteria, now);
    let request = PageRequest::from_raw(
        query.page.as_deref(),
        query.page_size.as_deref(),
        settings.page_size,
        settings.max_page_size,
    );
    paginate(&ordered, request.page_size, request.page).map(|record| record.clone())
}

pub fn export_report(
    records: &[EventRecord],
    principal: Option<&Principal>,
    query: &EventListQuery,
    now: DateTime<Utc>,
) -> ExportReport {
    let criteria = EventCriteria::from_query(query);
    let visible = visible_events(records, principal);
    build_report(filter_events(visible, &criteria, now), now)
}

/// One unsaved event per window, sharing every other field.
pub fn build_events(dto: &NewEventDto, principal: &Principal, now: DateTime<Utc>) -> Result<Vec<Event>, ApiError> {
    validate_title(&dto.title)?;
    let title = dto.title.trim().to_string();
    let description = dto
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string);
    dto.windows()?
        .into_iter()
        .map(|window| -> Result<Event, ApiError> {
            validate_window(window.date_start, window.date_end)?;
            Ok(Event {
                id: 0,
                title: title.clone(),
                description: description.clone(),
                category_id: dto.category_id,
                department_id: dto.department_id,
                date_start: window.date_start,
                date_end: window.date_end,
                status: derive_status(EventStatus::Planned, window.date_start, window.date_end, now),
                is_published: dto.is_published,
                created_by: Some(principal.id),
                created_at: now,
                updated_at: now,
            })
        })
        .collect()
}

/// Applies the changed fields, validates, and settles the status: an explicit
/// status wins, otherwise it is re-derived from the new window.
pub fn apply_update(event: &mut Event, dto: &UpdateEventDto, now: DateTime<Utc>) -> Result<(), ApiError> {
    if let Some(title) = &dto.title {
        event.title = title.trim().to_string();
    }
    if let Some(description) = &dto.description {
        let description = description.trim();
        event.description = (!description.is_empty()).then(|| description.to_string());
    }
    if let Some(category_id) = dto.category_id {
        event.category_id = category_id;
    }
    if let Some(department_id) = dto.department_id {
        event.department_id = department_id;
    }
    if let Some(date_start) = dto.date_start {
        event.date_start = date_start;
    }
    if dto.clear_date_end {
        event.date_end = None;
    } else if let Some(date_end) = dto.date_end {
        event.date_end = Some(date_end);
    }
    if let Some(is_published) = dto.is_published {
        event.is_published = is_published;
    }
    event.validate()?;
    match dto.status.as_deref() {
        Some(raw) => event.status = raw.parse::<EventStatus>()?,
        None => {
            refresh(event, now);
        }
    }
    event.updated_at = now;
    Ok(())
}

fn unique_ids(ids: &[i64]) -> Vec<i64> {
    let mut seen = HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

async fn ensure_references(category_id: i64, department_id: i64, pool: &PGPool) -> Result<(), ApiError> {
    if db::catalog::get_category(category_id, pool).await?.is_none() {
        return Err(ApiError::validation(format!("category #{} does not exist", category_id)));
    }
    if db::catalog::get_department(department_id, pool).await?.is_none() {
        return Err(ApiError::validation(format!("department #{} does not exist", department_id)));
    }
    Ok(())
}

async fn editable(principal: &Principal, id: i64, pool: &PGPool) -> Result<Event, ApiError> {
    let event = db::event::get_by_id(id, pool)
        .await?
        .ok_or_else(|| ApiError::not_found("event"))?;
    ensure_can_edit(principal, &event)?;
    Ok(event)
}

/// Anonymous callers see nothing, so the store is only read for a principal.
async fn visible_snapshot(principal: Option<&Principal>, pool: &PGPool) -> Result<Vec<EventRecord>, ApiError> {
    match principal {
        Some(_) => db::event::load_records(pool).await,
        None => Ok(Vec::new()),
    }
}

pub async fn list(
    principal: Option<&Principal>,
    query: &EventListQuery,
    settings: &Settings,
    pool: &PGPool,
) -> Result<Page<EventRecord>, ApiError> {
    let records = visible_snapshot(principal, pool).await?;
    Ok(list_page(&records, principal, query, settings, Utc::now()))
}

pub async fn export(
    principal: Option<&Principal>,
    query: &EventListQuery,
    pool: &PGPool,
) -> Result<ExportReport, ApiError> {
    let records = visible_snapshot(principal, pool).await?;
    Ok(export_report(&records, principal, query, Utc::now()))
}

/// Events the caller may not see are reported as missing.
pub async fn get(principal: Option<&Principal>, id: i64, pool: &PGPool) -> Result<EventRecord, ApiError> {
    db::event::load_record(id, pool)
        .await?
        .filter(|record| can_view(principal, &record.event))
        .ok_or_else(|| ApiError::not_found("event"))
}

/// Creates one event per window inside a single transaction.
pub async fn create(principal: &Principal, dto: NewEventDto, pool: &PGPool) -> Result<Vec<EventRecord>, ApiError> {
    let events = build_events(&dto, principal, Utc::now())?;
    ensure_references(dto.category_id, dto.department_id, pool).await?;

    let mut tx = pool.begin().await?;
    let mut ids = Vec::with_capacity(events.len());
    for event in &events {
        let id = db::event::insert(event, &mut tx).await?;
        db::event::replace_locations(id, &dto.location_ids, &mut tx).await?;
        db::event::replace_responsibles(id, &dto.responsible_ids, &mut tx).await?;
        ids.push(id);
    }
    tx.commit().await?;
    info!("'{}' created events {:?} '{}'", principal.username, ids, dto.title.trim());

    let mut created = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(record) = db::event::load_record(id, pool).await? {
            created.push(record);
        }
    }
    Ok(created)
}

pub async fn update(
    principal: &Principal,
    id: i64,
    dto: UpdateEventDto,
    pool: &PGPool,
) -> Result<EventRecord, ApiError> {
    let mut event = editable(principal, id, pool).await?;
    apply_update(&mut event, &dto, Utc::now())?;
    if dto.category_id.is_some() || dto.department_id.is_some() {
        ensure_references(event.category_id, event.department_id, pool).await?;
    }

    let mut tx = pool.begin().await?;
    if db::event::update(&event, &mut tx).await? == 0 {
        return Err(ApiError::not_found("event"));
    }
    if let Some(location_ids) = &dto.location_ids {
        db::event::replace_locations(id, location_ids, &mut tx).await?;
    }
    if let Some(responsible_ids) = &dto.responsible_ids {
        db::event::replace_responsibles(id, responsible_ids, &mut tx).await?;
    }
    tx.commit().await?;
    info!("'{}' updated event #{} (status {})", principal.username, id, event.status);

    db::event::load_record(id, pool)
        .await?
        .ok_or_else(|| ApiError::not_found("event"))
}

pub async fn delete(principal: &Principal, id: i64, pool: &PGPool) -> Result<(), ApiError> {
    editable(principal, id, pool).await?;
    if db::event::delete(id, pool).await? == 0 {
        return Err(ApiError::not_found("event"));
    }
    info!("'{}' deleted event #{}", principal.username, id);
    Ok(())
}

/// Direct override; bypasses derivation, so it can enter or leave `cancelled`.
pub async fn set_status(principal: &Principal, id: i64, status: EventStatus, pool: &PGPool) -> Result<Event, ApiError> {
    let mut event = editable(principal, id, pool).await?;
    let now = Utc::now();
    if db::event::set_status(id, status, now, pool).await? == 0 {
        return Err(ApiError::not_found("event"));
    }
    info!("'{}' set event #{} status {} -> {}", principal.username, id, event.status, status);
    event.status = status;
    event.updated_at = now;
    Ok(event)
}

pub async fn toggle_publish(principal: &Principal, id: i64, pool: &PGPool) -> Result<PublishState, ApiError> {
    editable(principal, id, pool).await?;
    let is_published = db::event::toggle_publish(id, Utc::now(), pool)
        .await?
        .ok_or_else(|| ApiError::not_found("event"))?;
    info!("'{}' set event #{} published = {}", principal.username, id, is_published);
    Ok(PublishState { id, is_published })
}

async fn set_published(principal: &Principal, id: i64, published: bool, pool: &PGPool) -> Result<(), ApiError> {
    editable(principal, id, pool).await?;
    match db::event::set_published(id, published, Utc::now(), pool).await? {
        0 => Err(ApiError::not_found("event")),
        _ => Ok(()),
    }
}

/// Runs `op` once per distinct id, in input order. A failing id is recorded
/// as skipped and never stops the rest.
async fn run_bulk<F, Fut>(ids: &[i64], action: &str, mut op: F) -> BulkOutcome
where
    F: FnMut(i64) -> Fut,
    Fut: Future<Output = Result<(), ApiError>>,
{
    let mut outcome = BulkOutcome::default();
    for id in unique_ids(ids) {
        match op(id).await {
            Ok(()) => outcome.affected += 1,
            Err(err) => {
                warn!("bulk {} skipped event #{}: {}", action, id, err);
                outcome.skip(id, &err);
            }
        }
    }
    outcome
}

pub async fn bulk_set_status(
    principal: &Principal,
    ids: &[i64],
    status: EventStatus,
    pool: &PGPool,
) -> Result<BulkOutcome, ApiError> {
    let outcome = run_bulk(ids, "status", move |id| async move {
        set_status(principal, id, status, pool).await.map(|_| ())
    })
    .await;
    Ok(outcome)
}

pub async fn bulk_set_published(
    principal: &Principal,
    ids: &[i64],
    published: bool,
    pool: &PGPool,
) -> Result<BulkOutcome, ApiError> {
    let outcome = run_bulk(ids, "publish", |id| set_published(principal, id, published, pool)).await;
    info!(
        "'{}' set published = {} on {} events",
        principal.username, published, outcome.affected
    );
    Ok(outcome)
}

pub async fn bulk_delete(principal: &Principal, ids: &[i64], pool: &PGPool) -> Result<BulkOutcome, ApiError> {
    Ok(run_bulk(ids, "delete", |id| delete(principal, id, pool)).await)
}

/// Rows are independent: a failing row is reported by its index and skipped.
pub async fn import_legacy(principal: &Principal, dto: LegacyImportDto, pool: &PGPool) -> Result<ImportReport, ApiError> {
    ensure_admin(principal)?;
    let users = db::user::summaries(pool).await?;
    let locations = db::catalog::all_locations(pool).await?;
    let defaults = ImportDefaults {
        category_id: dto.default_category_id,
        department_id: dto.default_department_id,
    };

    let mut report = ImportReport::default();
    for (row, legacy) in dto.rows.iter().enumerate() {
        let normalized = match normalize_legacy(legacy, &users, &locations, defaults) {
            Ok(normalized) => normalized,
            Err(err) => {
                warn!("legacy row {} rejected: {}", row, err);
                report.skipped.push(SkippedRow {
                    row,
                    reason: err.to_string(),
                });
                continue;
            }
        };
        match create(principal, normalized.event, pool).await {
            Ok(created) => report.created.extend(created.iter().map(|r| r.event.id)),
            Err(err) => {
                warn!("legacy row {} failed: {}", row, err);
                report.skipped.push(SkippedRow {
                    row,
                    reason: err.to_string(),
                });
                continue;
            }
        }
        if !normalized.unmatched_responsibles.is_empty() || !normalized.unmatched_places.is_empty() {
            report.unmatched.push(UnmatchedNames {
                row,
                responsibles: normalized.unmatched_responsibles,
                places: normalized.unmatched_places,
            });
        }
    }
    info!(
        "'{}' imported {} legacy rows, skipped {}",
        principal.username,
        report.created.len(),
        report.skipped.len()
    );
    Ok(report)
}
