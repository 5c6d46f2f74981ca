//! Identity resources available to every connection.

use serde::Deserialize;

use crate::rest::{Entity, Resource, ResourceOptions};

/// Catalog type of the identity service.
pub const IDENTITY: &str = "identity";

/// A project the authenticated user has access to.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Project {
    /// Project id.
    pub id: String,
    /// Project name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Id of the owning domain.
    #[serde(default)]
    pub domain_id: Option<String>,
    /// Whether the project is enabled.
    #[serde(default = "enabled")]
    pub enabled: bool,
}

const fn enabled() -> bool {
    true
}

impl Entity for Project {
    const NAME: &'static str = "Project";
}

impl Resource for Project {
    const CATALOG_TYPE: &'static str = IDENTITY;
    const OPTIONS: ResourceOptions = ResourceOptions::new("/auth/projects").with_list_key("projects");

    fn primary_key(&self) -> String {
        self.id.clone()
    }
}
