//! Compute service resources: flavors, keypairs, servers and limits.
//!
//! # Example
//!
//! ```rust,ignore
//! use cloud_portal::openstack::RebootType;
//!
//! let compute = conn.compute()?;
//! let server = compute.servers().get("f3b2...").await?;
//! compute.servers().reboot(&server, RebootType::Soft).await?;
//!
//! let limits = compute.limits().fetch().await?;
//! println!("{}/{} cores", limits.absolute.total_cores_used, limits.absolute.total_cores);
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::openstack::image::Image;
use crate::rest::{
    inline_entity, optional_embedded, Embedded, Entity, FieldMap, IntoKey, Resource,
    ResourceError, ResourceManager, ResourceOptions, ServiceHandle, UnmanagedEndpoint,
    UnmanagedOptions, UnmanagedResource,
};

const COMPUTE: &str = "compute";

/// The compute service.
#[derive(Clone, Debug)]
pub struct Compute {
    handle: ServiceHandle,
}

impl Compute {
    pub(crate) const fn new(handle: ServiceHandle) -> Self {
        Self { handle }
    }

    /// Returns the underlying service handle.
    #[must_use]
    pub const fn handle(&self) -> &ServiceHandle {
        &self.handle
    }

    /// Returns the flavor manager.
    #[must_use]
    pub fn flavors(&self) -> ResourceManager<Flavor> {
        self.handle.root()
    }

    /// Returns the keypair manager.
    #[must_use]
    pub fn keypairs(&self) -> ResourceManager<Keypair> {
        self.handle.root()
    }

    /// Returns the server manager.
    #[must_use]
    pub fn servers(&self) -> ResourceManager<Server> {
        self.handle.root()
    }

    /// Returns the project limits endpoint.
    #[must_use]
    pub fn limits(&self) -> UnmanagedEndpoint<Limits> {
        self.handle.endpoint()
    }
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

/// A flavor (hardware template) for servers.
///
/// Summary listings only carry `id` and `name`; the sizing fields are then zero.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Flavor {
    /// Flavor id.
    pub id: String,
    /// Flavor name.
    #[serde(default)]
    pub name: String,
    /// Number of virtual CPUs.
    #[serde(default)]
    pub vcpus: u32,
    /// Memory in MiB.
    #[serde(default)]
    pub ram: u64,
    /// Root disk size in GiB.
    #[serde(default)]
    pub disk: u64,
    /// Ephemeral disk size in GiB.
    #[serde(default)]
    pub ephemeral: Option<u64>,
    /// Whether the flavor is public.
    #[serde(default)]
    pub is_public: Option<bool>,
    /// Whether the flavor is disabled.
    #[serde(default)]
    pub is_disabled: bool,
}

impl Entity for Flavor {
    const NAME: &'static str = "Flavor";
    const FIELDS: FieldMap = FieldMap::new(
        &[
            ("is_disabled", "OS-FLV-DISABLED:disabled"),
            ("is_public", "os-flavor-access:is_public"),
            ("ephemeral", "OS-FLV-EXT-DATA:ephemeral"),
        ],
        &[],
    );
}

impl Resource for Flavor {
    const CATALOG_TYPE: &'static str = COMPUTE;
    const OPTIONS: ResourceOptions = ResourceOptions::new("/flavors").with_detail();

    fn primary_key(&self) -> String {
        self.id.clone()
    }
}

/// An SSH keypair, identified by name.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Keypair {
    /// Keypair name.
    pub name: String,
    /// The public key.
    #[serde(default)]
    pub public_key: String,
    /// Key fingerprint.
    #[serde(default)]
    pub fingerprint: Option<String>,
    /// Key type (`ssh` or `x509`).
    #[serde(default, rename = "type")]
    pub key_type: Option<String>,
}

impl Entity for Keypair {
    const NAME: &'static str = "Keypair";

    /// List pages wrap each keypair in its own `keypair` object; unwrap it.
    fn from_wire(value: Value) -> Result<Self, ResourceError> {
        let value = match value {
            Value::Object(mut wrapper) if wrapper.len() == 1 && wrapper.contains_key("keypair") => {
                wrapper.remove("keypair").unwrap_or(Value::Null)
            }
            other => other,
        };
        serde_json::from_value(value).map_err(|e| ResourceError::deserialize(Self::NAME, &e))
    }
}

impl Resource for Keypair {
    const CATALOG_TYPE: &'static str = COMPUTE;
    const OPTIONS: ResourceOptions = ResourceOptions::new("/os-keypairs")
        .with_list_key("keypairs")
        .with_primary_key("name");

    fn primary_key(&self) -> String {
        self.name.clone()
    }
}

/// A volume attached to a server.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct VolumeAttachment {
    /// Attachment id.
    pub id: String,
    /// The server the volume is attached to.
    pub server_id: String,
    /// The attached volume.
    pub volume_id: String,
    /// Device name inside the server.
    #[serde(default)]
    pub device: Option<String>,
}

impl Entity for VolumeAttachment {
    const NAME: &'static str = "VolumeAttachment";
    const FIELDS: FieldMap =
        FieldMap::new(&[("server_id", "serverId"), ("volume_id", "volumeId")], &[]);
}

impl Resource for VolumeAttachment {
    const CATALOG_TYPE: &'static str = COMPUTE;
    const OPTIONS: ResourceOptions = ResourceOptions::new("/os-volume_attachments")
        .with_list_key("volumeAttachments")
        .with_resource_key("volumeAttachment");

    fn primary_key(&self) -> String {
        self.id.clone()
    }
}

/// A volume reference in a server's extended attributes.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct AttachedVolume {
    /// Volume id.
    pub id: String,
}

/// A server (virtual machine).
///
/// `flavor` and `image` are embedded references: the flavor resolves through
/// the compute service and the image through the image service. `image` is
/// `None` for servers booted from a volume.
#[derive(Clone, Debug, Deserialize)]
pub struct Server {
    /// Server id.
    pub id: String,
    /// Server name.
    #[serde(default)]
    pub name: String,
    /// Server status (`ACTIVE`, `SHUTOFF`, ...).
    #[serde(default)]
    pub status: Option<String>,
    /// Hypervisor power state.
    #[serde(default)]
    pub power_state: Option<i64>,
    /// Current task, if any.
    #[serde(default)]
    pub task_state: Option<String>,
    /// The flavor the server was built from.
    #[serde(default, deserialize_with = "optional_embedded")]
    pub flavor: Option<Embedded<Flavor>>,
    /// The image the server was built from.
    #[serde(default, deserialize_with = "optional_embedded")]
    pub image: Option<Embedded<Image>>,
    /// Addresses keyed by network name.
    #[serde(default)]
    pub addresses: Map<String, Value>,
    /// User metadata.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    /// Name of the keypair injected at boot.
    #[serde(default)]
    pub key_name: Option<String>,
    /// Volumes attached to the server.
    #[serde(default)]
    pub attached_volumes: Vec<AttachedVolume>,
    /// Creation time.
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    /// Fault details for servers in `ERROR`; empty otherwise.
    pub fault: Value,
}

impl Entity for Server {
    const NAME: &'static str = "Server";
    const FIELDS: FieldMap = FieldMap::new(
        &[
            ("image_id", "imageRef"),
            ("flavor_id", "flavorRef"),
            ("task_state", "OS-EXT-STS:task_state"),
            ("power_state", "OS-EXT-STS:power_state"),
            ("attached_volumes", "os-extended-volumes:volumes_attached"),
        ],
        &[("fault", empty_object)],
    );
}

impl Resource for Server {
    const CATALOG_TYPE: &'static str = COMPUTE;
    const OPTIONS: ResourceOptions = ResourceOptions::new("/servers").with_detail();

    fn primary_key(&self) -> String {
        self.id.clone()
    }
}

/// How a server is rebooted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RebootType {
    /// Graceful reboot through the guest OS.
    Soft,
    /// Power cycle.
    Hard,
}

impl ResourceManager<Server> {
    /// Starts a stopped server.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Http`] if the API rejects the action.
    pub async fn start(&self, server: impl IntoKey) -> Result<(), ResourceError> {
        self.action(server, "action", json!({ "os-start": null }))
            .await
            .map(|_| ())
    }

    /// Stops a running server.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Http`] if the API rejects the action.
    pub async fn stop(&self, server: impl IntoKey) -> Result<(), ResourceError> {
        self.action(server, "action", json!({ "os-stop": null }))
            .await
            .map(|_| ())
    }

    /// Reboots a server.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Http`] if the API rejects the action.
    pub async fn reboot(&self, server: impl IntoKey, reboot_type: RebootType) -> Result<(), ResourceError> {
        self.action(server, "action", json!({ "reboot": { "type": reboot_type } }))
            .await
            .map(|_| ())
    }

    /// Returns the volume attachments of a server.
    #[must_use]
    pub fn volume_attachments(&self, server: impl IntoKey) -> ResourceManager<VolumeAttachment> {
        self.nested(server)
    }
}

/// Absolute quota limits and usage for the current project.
///
/// Negative values mean "unlimited".
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct AbsoluteLimits {
    /// Maximum number of cores.
    #[serde(default)]
    pub total_cores: i64,
    /// Cores in use.
    #[serde(default)]
    pub total_cores_used: i64,
    /// Maximum RAM in MiB.
    #[serde(default)]
    pub total_ram: i64,
    /// RAM in use, in MiB.
    #[serde(default)]
    pub total_ram_used: i64,
    /// Maximum number of instances.
    #[serde(default)]
    pub instances: i64,
    /// Instances in use.
    #[serde(default)]
    pub instances_used: i64,
}

impl Entity for AbsoluteLimits {
    const NAME: &'static str = "AbsoluteLimits";
    const FIELDS: FieldMap = FieldMap::new(
        &[
            ("total_cores", "maxTotalCores"),
            ("total_cores_used", "totalCoresUsed"),
            ("total_ram", "maxTotalRAMSize"),
            ("total_ram_used", "totalRAMUsed"),
            ("instances", "maxTotalInstances"),
            ("instances_used", "totalInstancesUsed"),
        ],
        &[],
    );
}

/// Project limits, served as a single document under `limits`.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Limits {
    /// Absolute limits.
    #[serde(deserialize_with = "inline_entity")]
    pub absolute: AbsoluteLimits,
}

impl Entity for Limits {
    const NAME: &'static str = "Limits";
}

impl UnmanagedResource for Limits {
    const OPTIONS: UnmanagedOptions = UnmanagedOptions::new("/limits");
}
