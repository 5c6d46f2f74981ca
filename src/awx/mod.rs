//! AWX adapter.
//!
//! AWX exposes one API root (`/api/v2`) with HTTP basic authentication, so an
//! [`AwxConnection`] binds a single service named [`AWX`] and every resource
//! in this module belongs to it.

mod connection;
mod resources;

pub use connection::{AwxConfig, AwxConfigBuilder, AwxConnection, AWX, AWX_PATH_PREFIX};
pub use resources::{
    Credential, CredentialType, Inventory, InventoryVariableData, Job, JobEvent, JobTemplate,
    Organisation, Role, Team,
};
