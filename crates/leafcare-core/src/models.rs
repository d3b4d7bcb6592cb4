//! Data models for LeafCare
//!
//! Defines the records kept in each collection (users, pots, plants), the
//! views handed back to callers, and pagination.
//! Field names follow the stored JSON (`userId`, `isAdmin`).

use serde::{Deserialize, Serialize};

use crate::document::DocumentId;

/// Default page size for list operations
pub const DEFAULT_PAGE_LIMIT: usize = 30;

/// A user account as stored
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<DocumentId>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Argon2 PHC string
    pub password: String,
    #[serde(rename = "isAdmin", default)]
    pub is_admin: bool,
}

/// A user as returned to callers (no password)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: DocumentId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
}

impl UserProfile {
    /// Profile of a stored user; `None` if the user was never saved
    pub fn of(user: &User) -> Option<Self> {
        Some(Self {
            id: user.id?,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            is_admin: user.is_admin,
        })
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Input for creating a user
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    #[serde(rename = "isAdmin", default)]
    pub is_admin: bool,
}

/// Changes to a user; `None` leaves a field as is
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub new_password: Option<String>,
    pub current_password: Option<String>,
}

/// An irrigation pot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Pot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<DocumentId>,
    pub code: String,
    pub pot_model_id: String,
    /// Owning user, if the pot has been assigned
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<DocumentId>,
}

/// Pot entry in list results
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PotSummary {
    pub id: DocumentId,
    pub code: String,
    pub pot_model: String,
}

impl PotSummary {
    pub fn of(pot: &Pot) -> Option<Self> {
        Some(Self {
            id: pot.id?,
            code: pot.code.clone(),
            pot_model: pot.pot_model_id.clone(),
        })
    }
}

/// Input for creating a pot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewPot {
    pub code: String,
    pub pot_model_id: String,
}

/// Changes to a pot; `None` leaves a field as is
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PotUpdate {
    pub code: Option<String>,
    pub pot_model_id: Option<String>,
    #[serde(rename = "userId")]
    pub user_id: Option<DocumentId>,
}

/// A plant owned by a user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Plant {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<DocumentId>,
    pub name: String,
    #[serde(rename = "userId")]
    pub user_id: DocumentId,
}

/// Filters for listing plants
#[derive(Debug, Clone, Default)]
pub struct PlantFilter {
    /// Keep plants whose name contains this text
    pub name: Option<String>,
    /// Keep plants whose owner's first or last name equals this (admins only)
    pub user_name: Option<String>,
}

/// Requested page of a list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number
    pub page: usize,
    /// Items per page
    pub limit: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl PageRequest {
    pub fn new(page: usize, limit: usize) -> Self {
        Self { page, limit }
    }

    /// Page and limit are both at least 1
    pub fn is_valid(&self) -> bool {
        self.page >= 1 && self.limit >= 1
    }
}

/// Pagination metadata of a list response
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pagination {
    pub total_records: usize,
    pub total_pages: usize,
    pub page: usize,
    pub limit: usize,
}

/// One page of a list response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    pub pagination: Pagination,
    pub data: Vec<T>,
}

impl<T> Page<T> {
    /// Cut `items` down to the requested page
    ///
    /// `request` must be valid (see [`PageRequest::is_valid`]).
    pub fn paginate(items: Vec<T>, request: PageRequest) -> Self {
        let total_records = items.len();
        let total_pages = total_records.div_ceil(request.limit);
        let data = items
            .into_iter()
            .skip((request.page - 1).saturating_mul(request.limit))
            .take(request.limit)
            .collect();

        Self {
            pagination: Pagination {
                total_records,
                total_pages,
                page: request.page,
                limit: request.limit,
            },
            data,
        }
    }

    /// Map the items of this page, keeping the pagination
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            pagination: self.pagination,
            data: self.data.into_iter().map(f).collect(),
        }
    }
}
