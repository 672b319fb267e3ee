//! Generic entity REST client for OrgDesk.
//!
//! Every entity screen (accounts, organizations, courses, locations, tasks,
//! payments, feature flags, ...) talks to the backend through an
//! [`EntityClient`] built from an [`EntityClientConfig`]:
//!
//! - **Transport**: [`HttpTransport`] abstracts the HTTP client;
//!   [`ReqwestTransport`] is the production implementation and
//!   [`transport::mock::MockTransport`] the scripted test double.
//! - **Normalizer**: [`ListBody`] decides once between bare-array and
//!   envelope list bodies and produces a `PaginatedResult`.
//! - **Client**: uniform CRUD with org scoping and error-shape
//!   normalization into `MutationResult`.
//!
//! # Example
//!
//! ```
//! use orgdesk_client::{EntityClient, EntityClientConfig, ReqwestTransport, TransportConfig};
//! use std::sync::Arc;
//!
//! let transport = ReqwestTransport::new(TransportConfig::default()).unwrap();
//! let tasks: EntityClient<serde_json::Value> =
//!     EntityClient::new(EntityClientConfig::new("/tasks").org_scoped(), Arc::new(transport));
//! assert_eq!(tasks.entity_name(), "tasks");
//! ```

mod client;
mod config;
mod error;
pub mod normalize;
pub mod transport;

pub use client::EntityClient;
pub use config::{EntityClientConfig, Operation, RouteFn, RouteOverride};
pub use error::{ClientError, ClientResult, GENERIC_ERROR_MESSAGE};
pub use normalize::{error_message, normalize_list, ListBody, ListEnvelope};
pub use transport::{
    HttpRequest, HttpResponse, HttpTransport, Method, ReqwestTransport, TransportConfig,
};
