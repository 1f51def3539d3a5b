use log::info;

use crate::{
    db,
    dto::{CategoryDto, DepartmentDto, LocationDto},
    errors::ApiError,
    models::{Category, CategoryOverview, Department, DepartmentOverview, Location, LocationOverview},
    service::access::{ensure_admin, Principal},
    PGPool,
};

pub const DEFAULT_COLOR: &str = "#000000";

fn clean_name(name: &str, entity: &str) -> Result<String, ApiError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::validation(format!("{} name must not be empty", entity)));
    }
    Ok(name.to_string())
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// `#RRGGBB`; an absent or blank value means the default black.
pub fn normalize_color(color: Option<&str>) -> Result<String, ApiError> {
    let color = match color.map(str::trim).filter(|c| !c.is_empty()) {
        Some(c) => c,
        None => return Ok(DEFAULT_COLOR.to_string()),
    };
    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());
    if !valid {
        return Err(ApiError::validation(format!("'{}' is not a #RRGGBB color", color)));
    }
    Ok(color.to_uppercase())
}

fn category_from_dto(id: i64, dto: CategoryDto) -> Result<Category, ApiError> {
    Ok(Category {
        id,
        name: clean_name(&dto.name, "category")?,
        color: normalize_color(dto.color.as_deref())?,
        description: blank_to_none(dto.description),
    })
}

fn location_from_dto(id: i64, dto: LocationDto) -> Result<Location, ApiError> {
    Ok(Location {
        id,
        name: clean_name(&dto.name, "location")?,
        address: blank_to_none(dto.address),
        description: blank_to_none(dto.description),
    })
}

fn ensure_deleted(rows: u64, entity: &str) -> Result<(), ApiError> {
    if rows == 0 {
        Err(ApiError::not_found(entity))
    } else {
        Ok(())
    }
}

pub async fn list_departments(q: Option<&str>, pool: &PGPool) -> Result<Vec<DepartmentOverview>, ApiError> {
    Ok(db::catalog::list_departments(q, pool).await?)
}

pub async fn create_department(principal: &Principal, dto: DepartmentDto, pool: &PGPool) -> Result<Department, ApiError> {
    ensure_admin(principal)?;
    let name = clean_name(&dto.name, "department")?;
    let department = db::catalog::create_department(&name, pool).await?;
    info!("'{}' created department #{} '{}'", principal.username, department.id, department.name);
    Ok(department)
}

pub async fn update_department(
    principal: &Principal,
    id: i64,
    dto: DepartmentDto,
    pool: &PGPool,
) -> Result<Department, ApiError> {
    ensure_admin(principal)?;
    let name = clean_name(&dto.name, "department")?;
    let department = db::catalog::update_department(id, &name, pool)
        .await?
        .ok_or_else(|| ApiError::not_found("department"))?;
    info!("'{}' renamed department #{} to '{}'", principal.username, id, department.name);
    Ok(department)
}

/// Refused with a conflict while events still reference the department.
pub async fn delete_department(principal: &Principal, id: i64, pool: &PGPool) -> Result<(), ApiError> {
    ensure_admin(principal)?;
    ensure_deleted(db::catalog::delete_department(id, pool).await?, "department")?;
    info!("'{}' deleted department #{}", principal.username, id);
    Ok(())
}

pub async fn list_categories(q: Option<&str>, pool: &PGPool) -> Result<Vec<CategoryOverview>, ApiError> {
    Ok(db::catalog::list_categories(q, pool).await?)
}

pub async fn create_category(principal: &Principal, dto: CategoryDto, pool: &PGPool) -> Result<Category, ApiError> {
    ensure_admin(principal)?;
    let category = db::catalog::create_category(&category_from_dto(0, dto)?, pool).await?;
    info!("'{}' created category #{} '{}'", principal.username, category.id, category.name);
    Ok(category)
}

pub async fn update_category(
    principal: &Principal,
    id: i64,
    dto: CategoryDto,
    pool: &PGPool,
) -> Result<Category, ApiError> {
    ensure_admin(principal)?;
    let category = db::catalog::update_category(&category_from_dto(id, dto)?, pool)
        .await?
        .ok_or_else(|| ApiError::not_found("category"))?;
    info!("'{}' updated category #{}", principal.username, id);
    Ok(category)
}

pub async fn delete_category(principal: &Principal, id: i64, pool: &PGPool) -> Result<(), ApiError> {
    ensure_admin(principal)?;
    ensure_deleted(db::catalog::delete_category(id, pool).await?, "category")?;
    info!("'{}' deleted category #{}", principal.username, id);
    Ok(())
}

pub async fn list_locations(q: Option<&str>, pool: &PGPool) -> Result<Vec<LocationOverview>, ApiError> {
    Ok(db::catalog::list_locations(q, pool).await?)
}

pub async fn create_location(principal: &Principal, dto: LocationDto, pool: &PGPool) -> Result<Location, ApiError> {
    ensure_admin(principal)?;
    let location = db::catalog::create_location(&location_from_dto(0, dto)?, pool).await?;
    info!("'{}' created location #{} '{}'", principal.username, location.id, location.name);
    Ok(location)
}

pub async fn update_location(
    principal: &Principal,
    id: i64,
    dto: LocationDto,
    pool: &PGPool,
) -> Result<Location, ApiError> {
    ensure_admin(principal)?;
    let location = db::catalog::update_location(&location_from_dto(id, dto)?, pool)
        .await?
        .ok_or_else(|| ApiError::not_found("location"))?;
    info!("'{}' updated location #{}", principal.username, id);
    Ok(location)
}

pub async fn delete_location(principal: &Principal, id: i64, pool: &PGPool) -> Result<(), ApiError> {
    ensure_admin(principal)?;
    ensure_deleted(db::catalog::delete_location(id, pool).await?, "location")?;
    info!("'{}' deleted location #{}", principal.username, id);
    Ok(())
}
