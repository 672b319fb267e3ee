//! The generic entity client.
//!
//! One [`EntityClient`] per entity type gives every screen the same
//! `fetch_all` / `fetch` / `create` / `update` / `delete` surface. No
//! operation returns an error: transport failures, non-2xx responses and
//! call-boundary validation failures all come back as a failed
//! [`MutationResult`], with the empty default as data for list calls.

use crate::config::{EntityClientConfig, Operation};
use crate::error::{ClientError, ClientResult};
use crate::normalize::{error_message, normalize_list, ListBody};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, Method};
use orgdesk_types::{
    EntityRecord, IdField, MutationResult, OrgScope, PaginatedResult, QueryDescriptor, RowId,
};
use serde::Serialize;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, warn};

/// Resolved destination of one call.
struct Route {
    method: Method,
    path: String,
    /// Whether the row id is part of the path.
    encodes_id: bool,
}

/// REST client for one entity type.
pub struct EntityClient<T> {
    config: Arc<EntityClientConfig>,
    transport: Arc<dyn HttpTransport>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for EntityClient<T> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            transport: self.transport.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: EntityRecord> EntityClient<T> {
    /// Creates a client for the entity described by `config`.
    pub fn new(config: EntityClientConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self::with_shared_config(Arc::new(config), transport)
    }

    /// Creates a client sharing an existing configuration.
    pub fn with_shared_config(
        config: Arc<EntityClientConfig>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            config,
            transport,
            _marker: PhantomData,
        }
    }

    pub fn config(&self) -> &EntityClientConfig {
        &self.config
    }

    pub fn entity_name(&self) -> &str {
        self.config.entity_name()
    }

    pub fn id_field(&self) -> &IdField {
        &self.config.id_field
    }

    // ── Operations ───────────────────────────────────────────────

    /// Lists rows matching `query`, normalized to a [`PaginatedResult`].
    pub async fn fetch_all(
        &self,
        query: &QueryDescriptor,
        scope: &OrgScope,
    ) -> MutationResult<PaginatedResult<T>> {
        let response = match self.request_list(query, scope).await {
            Ok(response) => response,
            Err(err) => {
                return self
                    .fail(Operation::FetchAll, err)
                    .with_data(PaginatedResult::empty());
            }
        };

        let status = response.status;
        match normalize_list(response.body, query.page_size) {
            Ok(page) => {
                debug!(
                    "{}: fetched {} rows ({} total)",
                    self.entity_name(),
                    page.len(),
                    page.total_count
                );
                MutationResult::success(status, page)
            }
            Err(err) => {
                warn!("{}: {}; rendering an empty page", self.entity_name(), err);
                MutationResult::success(status, PaginatedResult::empty())
            }
        }
    }

    /// Lists rows without synthesising pagination: the body comes back in
    /// the shape the server used.
    pub async fn fetch_all_raw(
        &self,
        query: &QueryDescriptor,
        scope: &OrgScope,
    ) -> MutationResult<ListBody<T>> {
        let response = match self.request_list(query, scope).await {
            Ok(response) => response,
            Err(err) => {
                return self
                    .fail(Operation::FetchAll, err)
                    .with_data(ListBody::BareArray(Vec::new()));
            }
        };

        let status = response.status;
        match ListBody::from_value(response.body) {
            Ok(body) => MutationResult::success(status, body),
            Err(err) => {
                warn!("{}: {}; returning no rows", self.entity_name(), err);
                MutationResult::success(status, ListBody::BareArray(Vec::new()))
            }
        }
    }

    /// Fetches one row. `id` may be omitted when a custom fetch route does
    /// not need it (e.g. "current organization").
    pub async fn fetch(&self, id: Option<&str>, scope: &OrgScope) -> MutationResult<T> {
        self.try_fetch(id, scope)
            .await
            .unwrap_or_else(|err| self.fail(Operation::Fetch, err))
    }

    /// Creates a row from a partial payload.
    pub async fn create<P: Serialize + ?Sized>(
        &self,
        partial: &P,
        scope: &OrgScope,
    ) -> MutationResult<T> {
        self.try_create(partial, scope)
            .await
            .unwrap_or_else(|err| self.fail(Operation::Create, err))
    }

    /// Updates a row. The payload must carry the row's id field.
    pub async fn update<P: Serialize + ?Sized>(
        &self,
        partial: &P,
        scope: &OrgScope,
    ) -> MutationResult<T> {
        self.try_update(partial, scope)
            .await
            .unwrap_or_else(|err| self.fail(Operation::Update, err))
    }

    /// Deletes a row, returning whatever the server answered.
    pub async fn delete(&self, id: &str, scope: &OrgScope) -> MutationResult<Value> {
        self.try_delete(id, scope)
            .await
            .unwrap_or_else(|err| self.fail(Operation::Delete, err))
    }

    // ── Internals ────────────────────────────────────────────────

    async fn request_list(
        &self,
        query: &QueryDescriptor,
        scope: &OrgScope,
    ) -> ClientResult<HttpResponse> {
        query.validate()?;
        let mut params = query.to_query_pairs();
        params.extend(self.scope_params(scope)?);
        let route = self.route(Operation::FetchAll, None, scope);
        self.execute(HttpRequest::new(route.method, route.path).with_query(params))
            .await
    }

    async fn try_fetch(&self, id: Option<&str>, scope: &OrgScope) -> ClientResult<MutationResult<T>> {
        let params = self.scope_params(scope)?;
        let id = id.map(str::trim).filter(|id| !id.is_empty());
        if id.is_none() && self.config.custom_route(Operation::Fetch).is_none() {
            return Err(self.missing_id());
        }
        let route = self.route(Operation::Fetch, id, scope);
        let response = self
            .execute(HttpRequest::new(route.method, route.path).with_query(params))
            .await?;
        self.decode_one(response)
    }

    async fn try_create<P: Serialize + ?Sized>(
        &self,
        partial: &P,
        scope: &OrgScope,
    ) -> ClientResult<MutationResult<T>> {
        let body = serde_json::to_value(partial)?;
        let params = self.scope_params(scope)?;
        let route = self.route(Operation::Create, None, scope);
        let response = self
            .execute(
                HttpRequest::new(route.method, route.path)
                    .with_query(params)
                    .with_body(body),
            )
            .await?;
        self.decode_one(response)
    }

    async fn try_update<P: Serialize + ?Sized>(
        &self,
        partial: &P,
        scope: &OrgScope,
    ) -> ClientResult<MutationResult<T>> {
        let mut body = serde_json::to_value(partial)?;
        let params = self.scope_params(scope)?;
        let object = body.as_object_mut().ok_or_else(|| self.missing_id())?;
        let (id_key, row_id) = self
            .config
            .id_field
            .locate(object)
            .and_then(|(key, value)| RowId::from_value(value).map(|id| (key.to_string(), id)))
            .ok_or_else(|| self.missing_id())?;

        let route = self.route(Operation::Update, Some(row_id.as_str()), scope);
        if route.encodes_id {
            object.remove(&id_key);
        }

        let response = self
            .execute(
                HttpRequest::new(route.method, route.path)
                    .with_query(params)
                    .with_body(body),
            )
            .await?;
        self.decode_one(response)
    }

    async fn try_delete(&self, id: &str, scope: &OrgScope) -> ClientResult<MutationResult<Value>> {
        let params = self.scope_params(scope)?;
        let id = id.trim();
        if id.is_empty() {
            return Err(self.missing_id());
        }
        let route = self.route(Operation::Delete, Some(id), scope);
        let response = self
            .execute(HttpRequest::new(route.method, route.path).with_query(params))
            .await?;
        if response.body.is_null() {
            Ok(MutationResult::empty_success(response.status))
        } else {
            Ok(MutationResult::success(response.status, response.body))
        }
    }

    /// `organizationId` parameters for a call, validating the scope.
    fn scope_params(&self, scope: &OrgScope) -> ClientResult<Vec<(String, String)>> {
        if !self.config.include_org_id {
            return Ok(Vec::new());
        }
        match scope.organization_id() {
            Some(org) => Ok(vec![("organizationId".to_string(), org.as_str().to_string())]),
            None => Err(ClientError::MissingScope {
                entity: self.entity_name().to_string(),
            }),
        }
    }

    fn route(&self, operation: Operation, id: Option<&str>, scope: &OrgScope) -> Route {
        let default_method = match operation {
            Operation::Update => self.config.update_method,
            other => other.default_method(),
        };

        if let Some(custom) = self.config.custom_route(operation) {
            let route = custom(id, scope.organization_id());
            return Route {
                method: route.method.unwrap_or(default_method),
                path: route.url,
                encodes_id: id.is_some() && route.encodes_id,
            };
        }

        match (operation, id) {
            (Operation::FetchAll | Operation::Create, _) | (_, None) => Route {
                method: default_method,
                path: self.config.base_path.clone(),
                encodes_id: false,
            },
            (_, Some(id)) => Route {
                method: default_method,
                path: self.config.item_path(id),
                encodes_id: true,
            },
        }
    }

    async fn execute(&self, request: HttpRequest) -> ClientResult<HttpResponse> {
        debug!(
            "{}: {} {}",
            self.entity_name(),
            request.method,
            request.path
        );
        let response = self.transport.send(request).await?;
        if response.is_success() {
            return Ok(response);
        }
        let status = response.status;
        Err(ClientError::Http {
            status,
            message: error_message(&response.body)
                .unwrap_or_else(|| format!("Request failed with status code {status}")),
        })
    }

    fn decode_one(&self, response: HttpResponse) -> ClientResult<MutationResult<T>> {
        if response.body.is_null() {
            return Ok(MutationResult::empty_success(response.status));
        }
        let row = serde_json::from_value::<T>(response.body)
            .map_err(|e| ClientError::Shape(format!("{} row: {e}", self.entity_name())))?;
        Ok(MutationResult::success(response.status, row))
    }

    fn missing_id(&self) -> ClientError {
        ClientError::MissingId {
            entity: self.entity_name().to_string(),
            field: self.config.id_field.primary_name().to_string(),
        }
    }

    fn fail<U>(&self, operation: Operation, err: ClientError) -> MutationResult<U> {
        warn!("{} {:?} failed: {}", self.entity_name(), operation, err);
        err.into_mutation()
    }
}
