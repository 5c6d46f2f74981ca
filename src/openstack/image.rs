//! Image service resources.
//!
//! The image API returns single images as bare objects (no envelope key) and
//! paginates with a relative `next` reference at the top of each page.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::rest::{Entity, Resource, ResourceManager, ResourceOptions, ServiceHandle};

/// The image service.
#[derive(Clone, Debug)]
pub struct ImageService {
    handle: ServiceHandle,
}

impl ImageService {
    pub(crate) const fn new(handle: ServiceHandle) -> Self {
        Self { handle }
    }

    /// Returns the underlying service handle.
    #[must_use]
    pub const fn handle(&self) -> &ServiceHandle {
        &self.handle
    }

    /// Returns the image manager.
    #[must_use]
    pub fn images(&self) -> ResourceManager<Image> {
        self.handle.root()
    }
}

/// A disk image.
///
/// Every field but `id` is optional so that partial images embedded in other
/// resources decode as well.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct Image {
    /// Image id.
    pub id: String,
    /// Image name.
    #[serde(default)]
    pub name: Option<String>,
    /// Image status (`active`, `queued`, ...).
    #[serde(default)]
    pub status: Option<String>,
    /// Visibility (`public`, `private`, `shared`, `community`).
    #[serde(default)]
    pub visibility: Option<String>,
    /// Minimum disk size in GiB.
    #[serde(default)]
    pub min_disk: u64,
    /// Minimum RAM in MiB.
    #[serde(default)]
    pub min_ram: u64,
    /// Size of the image data in bytes.
    #[serde(default)]
    pub size: Option<u64>,
    /// Disk format (`qcow2`, `raw`, ...).
    #[serde(default)]
    pub disk_format: Option<String>,
    /// Image tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Creation time.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Entity for Image {
    const NAME: &'static str = "Image";
}

impl Resource for Image {
    const CATALOG_TYPE: &'static str = "image";
    const OPTIONS: ResourceOptions = ResourceOptions::new("/images").unwrapped();

    fn primary_key(&self) -> String {
        self.id.clone()
    }
}
