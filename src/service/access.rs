use std::future::{ready, Ready};

use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use bitflags::bitflags;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    errors::ApiError,
    models::{Event, EventRecord, User},
};

bitflags! {
    /// Group memberships of a user, persisted as `users.group_mask`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Groups: u8 {
        const USER = 0b001;
        const DEPARTMENT_HEAD = 0b010;
        const ADMIN = 0b100;
    }
}

impl Groups {
    pub fn from_mask(mask: i32) -> Self {
        Groups::from_bits_truncate(mask as u8)
    }

    pub fn mask(&self) -> i32 {
        self.bits() as i32
    }

    pub fn from_group_name(name: &str) -> Option<Groups> {
        match name.trim() {
            "user" => Some(Groups::USER),
            "department_head" => Some(Groups::DEPARTMENT_HEAD),
            "admin" => Some(Groups::ADMIN),
            _ => None,
        }
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.contains(Groups::USER) {
            names.push("user");
        }
        if self.contains(Groups::DEPARTMENT_HEAD) {
            names.push("department_head");
        }
        if self.contains(Groups::ADMIN) {
            names.push("admin");
        }
        names
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    DepartmentHead,
    Member,
}

impl Role {
    /// Admin wins over department head when a user is in both groups.
    pub fn from_groups(groups: Groups) -> Self {
        if groups.contains(Groups::ADMIN) {
            Role::Admin
        } else if groups.contains(Groups::DEPARTMENT_HEAD) {
            Role::DepartmentHead
        } else {
            Role::Member
        }
    }
}

/// The authenticated user acting on a request.
///
/// Resolved once per request by the auth middleware; handlers take it as an
/// extractor (`Principal` when login is required, `Option<Principal>` when
/// anonymous callers are allowed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: Uuid,
    pub username: String,
    pub department_id: Option<i64>,
    pub role: Role,
}

impl Principal {
    /// `None` for deactivated accounts: they are treated as anonymous.
    pub fn from_user(user: &User) -> Option<Self> {
        if !user.is_active {
            return None;
        }
        Some(Principal {
            id: user.id,
            username: user.username.clone(),
            department_id: user.department_id,
            role: Role::from_groups(user.groups()),
        })
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_department_head(&self) -> bool {
        self.role == Role::DepartmentHead
    }
}

impl FromRequest for Principal {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<Principal>()
                .cloned()
                .ok_or(ApiError::Unauthorized),
        )
    }
}

pub fn can_view(principal: Option<&Principal>, event: &Event) -> bool {
    let Some(principal) = principal else {
        return false;
    };
    if principal.is_admin() {
        return true;
    }
    let own = event.created_by == Some(principal.id);
    if principal.is_department_head() {
        return own || principal.department_id == Some(event.department_id);
    }
    own
}

pub fn can_edit(principal: Option<&Principal>, event: &Event) -> bool {
    can_view(principal, event)
}

pub fn ensure_can_edit(principal: &Principal, event: &Event) -> Result<(), ApiError> {
    if can_edit(Some(principal), event) {
        Ok(())
    } else {
        Err(ApiError::PermissionDenied)
    }
}

pub fn ensure_admin(principal: &Principal) -> Result<(), ApiError> {
    if principal.is_admin() {
        Ok(())
    } else {
        Err(ApiError::PermissionDenied)
    }
}

/// Narrows the collection to what `principal` may see, keeping input order.
pub fn visible_events<'a, I>(events: I, principal: Option<&Principal>) -> Vec<&'a EventRecord>
where
    I: IntoIterator<Item = &'a EventRecord>,
{
    events
        .into_iter()
        .filter(|record| can_view(principal, &record.event))
        .collect()
}
