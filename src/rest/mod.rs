//! Generic REST resource infrastructure.
//!
//! This module is provider-agnostic. A provider adapter declares its
//! resources as serde structs implementing [`Resource`] (or
//! [`UnmanagedResource`]) and registers its services as
//! [`ServiceDescriptor`]s; everything else is driven by the static
//! [`ResourceOptions`] attached to each type.
//!
//! - [`ResourceManager`]: CRUD, custom actions and lazy listing for one
//!   resource type within one bound service
//! - [`ResourceList`]: single-pass pagination over a listing
//! - [`Embedded`] and [`UnmanagedEndpoint`]: the non-collection relationship
//!   shapes
//! - [`ServiceResolver`]: cross-service lookup, implemented by connections
//! - [`ResourceError`]: errors for everything above
//!
//! # Example
//!
//! ```rust,ignore
//! use cloud_portal::openstack::{Connection, Server};
//!
//! let compute = conn.compute()?;
//! let mut servers = compute.servers().all();
//! while let Some(server) = servers.next().await? {
//!     if let Some(image) = &server.image {
//!         let image = compute.servers().fetch_embedded(image).await?;
//!         println!("{} runs {}", server.name, image.name);
//!     }
//! }
//! ```

mod errors;
mod manager;
mod options;
mod relations;
mod resource;
mod service;

pub use errors::ResourceError;
pub use manager::{extract_list, extract_one, related_manager, IntoKey, ResourceList, ResourceManager};
pub use options::{EnvelopeKey, ResourceOptions, UnmanagedOptions};
pub use relations::{inline_entity, optional_embedded, Embedded, UnmanagedEndpoint};
pub use resource::{DefaultFactory, Entity, FieldMap, Resource, UnmanagedResource};
pub use service::{service_name, Service, ServiceDescriptor, ServiceHandle, ServiceResolver};
