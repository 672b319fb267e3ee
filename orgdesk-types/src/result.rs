//! Canonical list and mutation result shapes.

use serde::{Deserialize, Serialize};

/// Number of pages needed for `total_count` rows at `page_size` rows per page.
pub fn total_pages_for(total_count: u64, page_size: u32) -> u64 {
    total_count.div_ceil(u64::from(page_size.max(1)))
}

/// One page of rows plus pagination totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResult<T> {
    /// Rows in the order the server returned them.
    pub data: Vec<T>,
    pub total_count: u64,
    pub total_pages: u64,
}

impl<T> PaginatedResult<T> {
    /// An empty page (no rows, no pages).
    pub fn empty() -> Self {
        Self {
            data: Vec::new(),
            total_count: 0,
            total_pages: 0,
        }
    }

    /// Treats a bare array as the full, unpaginated result.
    pub fn from_bare(data: Vec<T>) -> Self {
        Self {
            total_count: data.len() as u64,
            total_pages: 1,
            data,
        }
    }

    /// Builds a page whose page count is derived from `page_size`.
    pub fn paged(data: Vec<T>, total_count: u64, page_size: u32) -> Self {
        Self {
            data,
            total_count,
            total_pages: total_pages_for(total_count, page_size),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginatedResult<U> {
        PaginatedResult {
            data: self.data.into_iter().map(f).collect(),
            total_count: self.total_count,
            total_pages: self.total_pages,
        }
    }
}

impl<T> Default for PaginatedResult<T> {
    fn default() -> Self {
        Self::empty()
    }
}

/// A failed mutation or fetch, extracted from a [`MutationResult`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("request failed with status {status}: {message}")]
pub struct MutationFailure {
    pub status: u16,
    pub message: String,
}

/// Uniform result of every entity client call.
///
/// `error` is authoritative: a result carrying an error is a failure even
/// when `status` is in the 2xx range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationResult<T> {
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> MutationResult<T> {
    pub fn success(status: u16, data: T) -> Self {
        Self {
            status,
            data: Some(data),
            error: None,
        }
    }

    /// A successful response that carried no body (e.g. `204 No Content`).
    pub fn empty_success(status: u16) -> Self {
        Self {
            status,
            data: None,
            error: None,
        }
    }

    pub fn failure(status: u16, error: impl Into<String>) -> Self {
        Self {
            status,
            data: None,
            error: Some(error.into()),
        }
    }

    /// Attaches a data value, typically the empty default on failures.
    #[must_use]
    pub fn with_data(mut self, data: T) -> Self {
        self.data = Some(data);
        self
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none() && (200..=299).contains(&self.status)
    }

    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    /// The failure message, synthesized from the status when the error field
    /// is missing on a non-2xx result.
    pub fn error_message(&self) -> Option<String> {
        match &self.error {
            Some(msg) => Some(msg.clone()),
            None if !(200..=299).contains(&self.status) => {
                Some(format!("Request failed with status code {}", self.status))
            }
            None => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> MutationResult<U> {
        MutationResult {
            status: self.status,
            data: self.data.map(f),
            error: self.error,
        }
    }

    /// Converts into a `Result`, keeping the (optional) payload on success.
    pub fn into_result(self) -> Result<Option<T>, MutationFailure> {
        match self.error_message() {
            Some(message) => Err(MutationFailure {
                status: self.status,
                message,
            }),
            None => Ok(self.data),
        }
    }
}
