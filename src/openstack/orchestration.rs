//! Orchestration service resources.

use serde::Deserialize;

use crate::rest::{Entity, Resource, ResourceManager, ResourceOptions, ServiceHandle};

/// The orchestration service.
///
/// Its path prefix carries the scoped project id.
#[derive(Clone, Debug)]
pub struct Orchestration {
    handle: ServiceHandle,
}

impl Orchestration {
    pub(crate) const fn new(handle: ServiceHandle) -> Self {
        Self { handle }
    }

    /// Returns the underlying service handle.
    #[must_use]
    pub const fn handle(&self) -> &ServiceHandle {
        &self.handle
    }

    /// Returns the stack manager.
    #[must_use]
    pub fn stacks(&self) -> ResourceManager<Stack> {
        self.handle.root()
    }
}

/// An orchestration stack.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Stack {
    /// Stack id.
    pub id: String,
    /// Stack name.
    pub stack_name: String,
    /// Stack status (`CREATE_COMPLETE`, ...).
    #[serde(default)]
    pub stack_status: Option<String>,
    /// Why the stack is in its current status.
    #[serde(default)]
    pub stack_status_reason: Option<String>,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Creation time as reported by the service.
    #[serde(default)]
    pub creation_time: Option<String>,
}

impl Entity for Stack {
    const NAME: &'static str = "Stack";
}

impl Resource for Stack {
    const CATALOG_TYPE: &'static str = "orchestration";
    const OPTIONS: ResourceOptions = ResourceOptions::new("/stacks");

    fn primary_key(&self) -> String {
        self.id.clone()
    }
}
