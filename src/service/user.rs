use chrono::Utc;
use log::info;
use uuid::Uuid;

use crate::{
    db::{self, user::UserFilter},
    dto::{NewUserDto, SetGroupsDto, UserListQuery, UserView},
    errors::ApiError,
    models::User,
    service::{
        access::{ensure_admin, Groups, Principal},
        crypto,
        filter::{parse_flag, parse_number},
    },
    PGPool,
};

pub async fn register(dto: NewUserDto, pool: &PGPool) -> Result<UserView, ApiError> {
    let username = dto.username.trim().to_string();
    if username.is_empty() || dto.pwd.is_empty() {
        return Err(ApiError::validation("username and password are required"));
    }
    if dto.pwd != dto.pwd_confirm {
        return Err(ApiError::validation("passwords do not match"));
    }
    if db::user::exists(&username, pool).await? {
        return Err(ApiError::conflict(format!("user '{}' already exists", username)));
    }
    let user = User {
        id: Uuid::new_v4(),
        pwd_hash: crypto::hash_password(&username, &dto.pwd),
        display_name: dto
            .display_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| username.clone()),
        username,
        email: dto.email,
        phone: dto.phone,
        department_id: dto.department_id,
        is_active: true,
        is_staff: false,
        is_superuser: false,
        group_mask: Groups::USER.mask(),
        created_at: Utc::now(),
    };
    db::user::create(&user, pool).await?;
    info!("registered user '{}'", user.username);
    Ok(UserView::from(&user))
}

/// `staff_access` matches `is_staff`, `in_admin_group` the admin bit.
pub fn user_filter(query: &UserListQuery) -> UserFilter {
    UserFilter {
        is_active: parse_flag(query.is_active.as_deref()),
        is_superuser: parse_flag(query.is_superuser.as_deref()),
        is_staff: parse_flag(query.staff_access.as_deref()),
        group_bit: parse_flag(query.in_admin_group.as_deref()).map(|set| (Groups::ADMIN.mask(), set)),
        department_id: parse_number(query.department_id.as_deref()),
        search: query
            .q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_string),
    }
}

pub async fn list(principal: &Principal, query: &UserListQuery, pool: &PGPool) -> Result<Vec<UserView>, ApiError> {
    ensure_admin(principal)?;
    let users = db::user::get_all(&user_filter(query), pool).await?;
    Ok(users.iter().map(UserView::from).collect())
}

pub async fn get(principal: &Principal, id: Uuid, pool: &PGPool) -> Result<UserView, ApiError> {
    if principal.id != id {
        ensure_admin(principal)?;
    }
    let user = db::user::get_by_id(id, pool)
        .await?
        .ok_or_else(|| ApiError::not_found("user"))?;
    Ok(UserView::from(&user))
}

pub async fn toggle_active(principal: &Principal, id: Uuid, pool: &PGPool) -> Result<UserView, ApiError> {
    ensure_admin(principal)?;
    let user = db::user::toggle_active(id, pool)
        .await?
        .ok_or_else(|| ApiError::not_found("user"))?;
    info!(
        "'{}' set user '{}' active = {}",
        principal.username, user.username, user.is_active
    );
    Ok(UserView::from(&user))
}

/// `is_staff` only follows the admin bit when it flips; superusers keep theirs as is.
fn next_staff_flag(user: &User, groups: Groups) -> bool {
    let was_admin = user.groups().contains(Groups::ADMIN);
    let is_admin = groups.contains(Groups::ADMIN);
    if user.is_superuser || was_admin == is_admin {
        user.is_staff
    } else {
        is_admin
    }
}

fn toggled_admin(user: &User) -> Groups {
    let mut groups = user.groups() | Groups::USER;
    groups.toggle(Groups::ADMIN);
    groups
}

pub fn groups_from_names(names: &[String]) -> Result<Groups, ApiError> {
    names.iter().try_fold(Groups::USER, |groups, name| {
        Groups::from_group_name(name)
            .map(|group| groups | group)
            .ok_or_else(|| ApiError::validation(format!("unknown group '{}'", name)))
    })
}

pub async fn toggle_admin(principal: &Principal, id: Uuid, pool: &PGPool) -> Result<UserView, ApiError> {
    ensure_admin(principal)?;
    let user = db::user::get_by_id(id, pool)
        .await?
        .ok_or_else(|| ApiError::not_found("user"))?;
    let groups = toggled_admin(&user);
    store_groups(principal, &user, groups, pool).await
}

pub async fn set_groups(principal: &Principal, id: Uuid, dto: SetGroupsDto, pool: &PGPool) -> Result<UserView, ApiError> {
    ensure_admin(principal)?;
    let groups = groups_from_names(&dto.groups)?;
    let user = db::user::get_by_id(id, pool)
        .await?
        .ok_or_else(|| ApiError::not_found("user"))?;
    store_groups(principal, &user, groups, pool).await
}

async fn store_groups(principal: &Principal, user: &User, groups: Groups, pool: &PGPool) -> Result<UserView, ApiError> {
    let updated = db::user::set_groups(user.id, groups.mask(), next_staff_flag(user, groups), pool)
        .await?
        .ok_or_else(|| ApiError::not_found("user"))?;
    info!(
        "'{}' set groups of '{}' to {:?}",
        principal.username,
        updated.username,
        groups.names()
    );
    Ok(UserView::from(&updated))
}
