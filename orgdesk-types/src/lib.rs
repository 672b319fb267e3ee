//! Core type definitions for OrgDesk.
//!
//! This crate defines the plain, serializable values shared by the entity
//! client and the data table engine:
//! - [`QueryDescriptor`]: list-query intent (page, sort, search, filters)
//! - [`PaginatedResult`]: one canonical page of rows plus totals
//! - [`MutationResult`]: the uniform status/data/error result shape
//! - Tenant and row identifiers ([`OrganizationId`], [`OrgScope`], [`RowId`], [`IdField`])
//! - [`EntityRecord`]: the bound every listed row type satisfies
//!
//! Nothing here performs I/O.

mod ids;
mod query;
mod record;
mod result;

pub use ids::{IdField, OrgScope, OrganizationId, RowId};
pub use record::EntityRecord;
pub use query::{FilterValue, QueryDescriptor, Scalar, SortDirection, RESERVED_KEYS};
pub use result::{total_pages_for, MutationFailure, MutationResult, PaginatedResult};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when building or validating types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid query descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("filter key `{0}` is reserved")]
    ReservedKey(String),

    #[error("invalid organization id: {0:?}")]
    InvalidOrganizationId(String),
}
