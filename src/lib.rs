//! # Cloud Portal API
//!
//! A declarative REST resource client for multi-service cloud APIs, with
//! adapters for OpenStack and AWX.
//!
//! ## Overview
//!
//! This crate provides:
//! - Type-safe connection configuration via [`ConnectionConfig`] and
//!   [`ConnectionConfigBuilder`]
//! - Token authentication and service-catalog discovery via
//!   [`openstack::Connection`]
//! - Lazily bound, cached services sharing one async transport
//! - Resources described by static options (endpoint, envelope keys, field
//!   aliases and defaults) and driven by a generic
//!   [`ResourceManager`](rest::ResourceManager): CRUD, custom actions, lazy
//!   pagination
//! - Root, nested, embedded and unmanaged relationships, with embedded
//!   references resolved across services
//! - Human-readable messages extracted from arbitrary error bodies
//!
//! ## Quick Start
//!
//! ```rust
//! use cloud_portal::{ApiUrl, ConnectionConfig, Interface};
//! use cloud_portal::openstack::default_services;
//!
//! let config = ConnectionConfig::builder()
//!     .auth_url(ApiUrl::new("https://keystone.example.com:5000/v3").unwrap())
//!     .interface(Interface::new("public").unwrap())
//!     .services(default_services())
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.services().len(), 3);
//! ```
//!
//! ## Working With Resources
//!
//! ```rust,ignore
//! use cloud_portal::openstack::{AuthParams, Connection};
//!
//! let params = AuthParams::new()
//!     .use_password("Default", "jbloggs", "secret")
//!     .use_project_id("0a1b2c");
//! let conn = Connection::connect(config, params).await?;
//!
//! let compute = conn.compute()?;
//! let mut servers = compute.servers().all();
//! while let Some(server) = servers.next().await? {
//!     println!("{} is {:?}", server.name, server.status);
//! }
//!
//! conn.close();
//! ```
//!
//! ## Errors
//!
//! Configuration problems are reported as [`ConfigError`] before any request
//! is made. Everything after that returns [`ResourceError`]; API failures keep
//! the status code and the message the server reported:
//!
//! ```rust,ignore
//! match compute.flavors().get("missing").await {
//!     Err(e) if e.status() == Some(404) => println!("{}", e.api_message().unwrap_or_default()),
//!     other => { other?; }
//! }
//! ```
//!
//! ## Design Principles
//!
//! - **No global state**: connections carry their own configuration and registry
//! - **Fail-fast validation**: configuration newtypes validate on construction
//! - **Thread-safe**: connections, services and the transport are `Send + Sync`
//! - **Async-first**: every network call is an `async fn`; nothing is spawned
//! - **Explicit release**: `close()` releases the transport; there are no finalizers

pub mod awx;
pub mod clients;
pub mod config;
pub mod error;
pub mod openstack;
pub mod rest;

// Re-export public types at crate root for convenience
pub use config::{ApiUrl, ConnectionConfig, ConnectionConfigBuilder, Interface};
pub use error::ConfigError;

// Re-export HTTP client types
pub use clients::{
    HttpClient, HttpError, HttpMethod, HttpRequest, HttpRequestBuilder, HttpResponse,
    HttpResponseError, InvalidHttpRequestError,
};

// Re-export the resource core
pub use rest::{
    Embedded, Entity, FieldMap, Resource, ResourceError, ResourceList, ResourceManager,
    ResourceOptions, ServiceDescriptor, UnmanagedResource,
};
