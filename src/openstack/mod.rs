//! OpenStack adapter.
//!
//! - [`AuthParams`]: the authentication request body
//! - [`Connection`]: token handshake, service catalog, lazily bound services
//! - [`Compute`], [`ImageService`], [`Orchestration`]: typed service handles
//! - [`Project`]: the projects available to the authenticated user
//!
//! Services are registered on the [`ConnectionConfig`](crate::ConnectionConfig);
//! [`default_services`] returns the three services this module provides
//! handles for. Further catalog types can be registered with
//! [`ServiceDescriptor`] and reached through [`Connection::handle`].

mod auth;
mod compute;
mod connection;
mod identity;
mod image;
mod orchestration;

pub use auth::AuthParams;
pub use compute::{
    AbsoluteLimits, AttachedVolume, Compute, Flavor, Keypair, Limits, RebootType, Server,
    VolumeAttachment,
};
pub use connection::{Connection, SUBJECT_TOKEN_HEADER};
pub use identity::{Project, IDENTITY};
pub use image::{Image, ImageService};
pub use orchestration::{Orchestration, Stack};

use crate::rest::ServiceDescriptor;

/// Returns the descriptors for the compute, image and orchestration services.
///
/// # Example
///
/// ```rust
/// use cloud_portal::openstack::default_services;
///
/// let services = default_services();
/// let names: Vec<_> = services.iter().map(|s| s.name()).collect();
/// assert_eq!(names, ["compute", "image", "orchestration"]);
/// assert_eq!(services[2].path_prefix(), "/v1/{project_id}");
/// ```
#[must_use]
pub fn default_services() -> Vec<ServiceDescriptor> {
    vec![
        ServiceDescriptor::new("compute", "/v2.1"),
        ServiceDescriptor::new("image", "/v2"),
        ServiceDescriptor::new("orchestration", "/v1/{project_id}"),
    ]
}
