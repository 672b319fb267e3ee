//! Per-entity client configuration.

use crate::transport::Method;
use orgdesk_types::{IdField, OrganizationId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Entity client operations that can be routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    FetchAll,
    Fetch,
    Create,
    Update,
    Delete,
}

impl Operation {
    /// Method used when a route does not name one.
    pub fn default_method(&self) -> Method {
        match self {
            Operation::FetchAll | Operation::Fetch => Method::Get,
            Operation::Create => Method::Post,
            Operation::Update => Method::Put,
            Operation::Delete => Method::Delete,
        }
    }
}

/// Where a custom route sends an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteOverride {
    /// Path relative to the API base (or an absolute URL).
    pub url: String,
    pub method: Option<Method>,
    /// Whether `url` carries the row id; only then is it dropped from the body.
    pub encodes_id: bool,
}

impl RouteOverride {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: None,
            encodes_id: false,
        }
    }

    /// Marks the route as addressing the row through its path.
    #[must_use]
    pub fn with_id_in_path(mut self) -> Self {
        self.encodes_id = true;
        self
    }

    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }
}

/// Builds a custom route from the row id and organization of a call.
pub type RouteFn =
    Arc<dyn Fn(Option<&str>, Option<&OrganizationId>) -> RouteOverride + Send + Sync>;

/// Configuration of one entity type's REST surface.
///
/// Built once per entity and shared by every client instance for it.
#[derive(Clone)]
pub struct EntityClientConfig {
    /// REST base path, e.g. `/tasks`.
    pub base_path: String,
    /// Whether requests carry the caller's `organizationId`.
    pub include_org_id: bool,
    pub id_field: IdField,
    /// Method for `update`: `PUT` unless the backend wants `PATCH`.
    pub update_method: Method,
    custom_routes: HashMap<Operation, RouteFn>,
}

impl EntityClientConfig {
    /// Creates a configuration for an entity mounted at `base_path`.
    pub fn new(base_path: impl Into<String>) -> Self {
        let base_path = base_path.into();
        let trimmed = base_path.trim().trim_end_matches('/');
        let base_path = if trimmed.starts_with('/') || trimmed.starts_with("http") {
            trimmed.to_string()
        } else {
            format!("/{trimmed}")
        };
        Self {
            base_path,
            include_org_id: false,
            id_field: IdField::Auto,
            update_method: Method::Put,
            custom_routes: HashMap::new(),
        }
    }

    /// Marks the entity as tenant-scoped.
    #[must_use]
    pub fn org_scoped(mut self) -> Self {
        self.include_org_id = true;
        self
    }

    #[must_use]
    pub fn with_id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = IdField::Named(field.into());
        self
    }

    #[must_use]
    pub fn with_update_method(mut self, method: Method) -> Self {
        self.update_method = method;
        self
    }

    /// Overrides the route of one operation.
    #[must_use]
    pub fn with_route<F>(mut self, operation: Operation, route: F) -> Self
    where
        F: Fn(Option<&str>, Option<&OrganizationId>) -> RouteOverride + Send + Sync + 'static,
    {
        self.custom_routes.insert(operation, Arc::new(route));
        self
    }

    pub fn custom_route(&self, operation: Operation) -> Option<&RouteFn> {
        self.custom_routes.get(&operation)
    }

    /// Short entity name for logs and error messages (last path segment).
    pub fn entity_name(&self) -> &str {
        self.base_path
            .rsplit('/')
            .find(|segment| !segment.is_empty())
            .unwrap_or("entity")
    }

    /// Default path for a row: `base_path/:id`, percent-encoded.
    pub fn item_path(&self, id: &str) -> String {
        format!("{}/{}", self.base_path, urlencoding::encode(id))
    }
}

impl fmt::Debug for EntityClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut routes: Vec<_> = self.custom_routes.keys().collect();
        routes.sort_by_key(|op| format!("{op:?}"));
        f.debug_struct("EntityClientConfig")
            .field("base_path", &self.base_path)
            .field("include_org_id", &self.include_org_id)
            .field("id_field", &self.id_field)
            .field("update_method", &self.update_method)
            .field("custom_routes", &routes)
            .finish()
    }
}
