//! AWX resources.
//!
//! Every AWX collection lives under a trailing-slash endpoint, returns bare
//! objects and paginates with `{"count", "next", "previous", "results"}`.

use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::clients::HttpMethod;
use crate::rest::{
    Entity, IntoKey, Resource, ResourceError, ResourceManager, ResourceOptions, UnmanagedEndpoint,
    UnmanagedOptions, UnmanagedResource,
};

use super::connection::AWX;

const fn awx_options(endpoint: &'static str) -> ResourceOptions {
    ResourceOptions::new(endpoint)
        .with_list_key("results")
        .unwrapped()
        .with_update_verb(HttpMethod::Patch)
}

fn awx_key(id: u64) -> String {
    id.to_string()
}

/// An organisation.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Organisation {
    /// Organisation id.
    pub id: u64,
    /// Organisation name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
}

impl Entity for Organisation {
    const NAME: &'static str = "Organisation";
}

impl Resource for Organisation {
    const CATALOG_TYPE: &'static str = AWX;
    const OPTIONS: ResourceOptions = awx_options("/organizations/");

    fn primary_key(&self) -> String {
        awx_key(self.id)
    }
}

/// A credential type.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct CredentialType {
    /// Credential type id.
    pub id: u64,
    /// Credential type name.
    pub name: String,
    /// Kind (`ssh`, `cloud`, ...).
    #[serde(default)]
    pub kind: Option<String>,
    /// Whether the type is built in.
    #[serde(default)]
    pub managed: bool,
}

impl Entity for CredentialType {
    const NAME: &'static str = "CredentialType";
}

impl Resource for CredentialType {
    const CATALOG_TYPE: &'static str = AWX;
    const OPTIONS: ResourceOptions = awx_options("/credential_types/");

    fn primary_key(&self) -> String {
        awx_key(self.id)
    }
}

/// A credential.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Credential {
    /// Credential id.
    pub id: u64,
    /// Credential name.
    pub name: String,
    /// Id of the credential type.
    #[serde(default)]
    pub credential_type: Option<u64>,
    /// Id of the owning organisation.
    #[serde(default)]
    pub organization: Option<u64>,
    /// Credential inputs; secret values come back as `$encrypted$`.
    #[serde(default)]
    pub inputs: Map<String, Value>,
}

impl Entity for Credential {
    const NAME: &'static str = "Credential";
}

impl Resource for Credential {
    const CATALOG_TYPE: &'static str = AWX;
    const OPTIONS: ResourceOptions = awx_options("/credentials/");

    fn primary_key(&self) -> String {
        awx_key(self.id)
    }
}

/// A role.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Role {
    /// Role id.
    pub id: u64,
    /// Role name (`Admin`, `Execute`, ...).
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
}

impl Entity for Role {
    const NAME: &'static str = "Role";
}

impl Resource for Role {
    const CATALOG_TYPE: &'static str = AWX;
    const OPTIONS: ResourceOptions = awx_options("/roles/");

    fn primary_key(&self) -> String {
        awx_key(self.id)
    }
}

/// A team.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Team {
    /// Team id.
    pub id: u64,
    /// Team name.
    pub name: String,
    /// Id of the owning organisation.
    #[serde(default)]
    pub organization: Option<u64>,
}

impl Entity for Team {
    const NAME: &'static str = "Team";
}

impl Resource for Team {
    const CATALOG_TYPE: &'static str = AWX;
    const OPTIONS: ResourceOptions = awx_options("/teams/");

    fn primary_key(&self) -> String {
        awx_key(self.id)
    }
}

impl ResourceManager<Team> {
    /// Returns the roles granted to a team.
    #[must_use]
    pub fn roles(&self, team: impl IntoKey) -> ResourceManager<Role> {
        self.nested(team)
    }
}

/// A job template.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct JobTemplate {
    /// Job template id.
    pub id: u64,
    /// Job template name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Id of the default inventory.
    #[serde(default)]
    pub inventory: Option<u64>,
    /// Playbook path within the project.
    #[serde(default)]
    pub playbook: Option<String>,
    /// Default extra variables, as YAML or JSON text.
    #[serde(default)]
    pub extra_vars: Option<String>,
}

impl Entity for JobTemplate {
    const NAME: &'static str = "JobTemplate";
}

impl Resource for JobTemplate {
    const CATALOG_TYPE: &'static str = AWX;
    const OPTIONS: ResourceOptions = awx_options("/job_templates/");

    fn primary_key(&self) -> String {
        awx_key(self.id)
    }
}

impl ResourceManager<JobTemplate> {
    /// Returns the credentials attached to a job template.
    #[must_use]
    pub fn credentials(&self, template: impl IntoKey) -> ResourceManager<Credential> {
        self.nested(template)
    }

    /// Launches a job from a template with its default parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Http`] if the launch is rejected.
    pub async fn launch(&self, template: impl IntoKey) -> Result<Job, ResourceError> {
        self.launch_with(template, json!({})).await
    }

    /// Launches a job from a template with launch-time parameters such as
    /// `extra_vars` or `inventory`.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Http`] if the launch is rejected.
    pub async fn launch_with(
        &self,
        template: impl IntoKey,
        params: Value,
    ) -> Result<Job, ResourceError> {
        self.action_one::<Job>(template, "launch", params).await
    }
}

/// A job.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Job {
    /// Job id.
    pub id: u64,
    /// Job name, copied from the template.
    #[serde(default)]
    pub name: String,
    /// Status (`pending`, `running`, `successful`, `failed`, ...).
    #[serde(default)]
    pub status: Option<String>,
    /// Whether the job failed.
    #[serde(default)]
    pub failed: bool,
    /// Id of the template the job was launched from.
    #[serde(default)]
    pub job_template: Option<u64>,
    /// Start time as reported by the server.
    #[serde(default)]
    pub started: Option<String>,
    /// Finish time as reported by the server.
    #[serde(default)]
    pub finished: Option<String>,
}

impl Entity for Job {
    const NAME: &'static str = "Job";
}

impl Resource for Job {
    const CATALOG_TYPE: &'static str = AWX;
    const OPTIONS: ResourceOptions = awx_options("/jobs/");

    fn primary_key(&self) -> String {
        awx_key(self.id)
    }
}

impl ResourceManager<Job> {
    /// Returns the events of a job.
    #[must_use]
    pub fn job_events(&self, job: impl IntoKey) -> ResourceManager<JobEvent> {
        self.nested(job)
    }
}

/// One event emitted while a job runs.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct JobEvent {
    /// Event id.
    pub id: u64,
    /// Event type (`runner_on_ok`, `playbook_on_stats`, ...).
    pub event: String,
    /// Position of the event within the job.
    #[serde(default)]
    pub counter: Option<u64>,
    /// Whether the event reports a failure.
    #[serde(default)]
    pub failed: bool,
    /// Whether the event reports a change.
    #[serde(default)]
    pub changed: bool,
    /// Host the event concerns, if any.
    #[serde(default)]
    pub host_name: Option<String>,
    /// Raw event payload.
    #[serde(default)]
    pub event_data: Map<String, Value>,
}

impl Entity for JobEvent {
    const NAME: &'static str = "JobEvent";
}

impl Resource for JobEvent {
    const CATALOG_TYPE: &'static str = AWX;
    const OPTIONS: ResourceOptions = awx_options("/job_events/");

    fn primary_key(&self) -> String {
        awx_key(self.id)
    }
}

/// An inventory.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Inventory {
    /// Inventory id.
    pub id: u64,
    /// Inventory name.
    pub name: String,
    /// Id of the owning organisation.
    #[serde(default)]
    pub organization: Option<u64>,
    /// Inventory variables, as YAML or JSON text.
    #[serde(default)]
    pub variables: Option<String>,
    /// Number of hosts.
    #[serde(default)]
    pub total_hosts: u64,
}

impl Entity for Inventory {
    const NAME: &'static str = "Inventory";
}

impl Resource for Inventory {
    const CATALOG_TYPE: &'static str = AWX;
    const OPTIONS: ResourceOptions = awx_options("/inventories/");

    fn primary_key(&self) -> String {
        awx_key(self.id)
    }
}

impl ResourceManager<Inventory> {
    /// Copies an inventory under a new name and returns the copy.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Http`] if the copy is rejected.
    pub async fn copy(&self, inventory: impl IntoKey, name: &str) -> Result<Inventory, ResourceError> {
        self.action_one::<Inventory>(inventory, "copy", json!({ "name": name }))
            .await
    }

    /// Returns the variable document of an inventory.
    #[must_use]
    pub fn variable_data(&self, inventory: impl IntoKey) -> UnmanagedEndpoint<InventoryVariableData> {
        self.nested_endpoint(inventory)
    }
}

/// The variables of an inventory, parsed by the server into a document.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct InventoryVariableData {
    /// Variables by name.
    #[serde(flatten)]
    pub variables: Map<String, Value>,
}

impl Entity for InventoryVariableData {
    const NAME: &'static str = "InventoryVariableData";
}

impl UnmanagedResource for InventoryVariableData {
    const OPTIONS: UnmanagedOptions = UnmanagedOptions::new("/variable_data/").unwrapped();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_awx_options() {
        let options = JobTemplate::OPTIONS;
        assert_eq!(options.list_key(), "results");
        assert_eq!(options.resource_key(), None);
        assert_eq!(options.update_verb(), HttpMethod::Patch);
        assert_eq!(options.endpoint(), "/job_templates/");
    }

    #[test]
    fn test_launch_response_decodes_as_job() {
        let job = Job::from_wire(json!({
            "job": 42,
            "id": 42,
            "type": "job",
            "name": "Deploy",
            "status": "pending",
            "job_template": 7
        }))
        .unwrap();
        assert_eq!(job.id, 42);
        assert_eq!(job.primary_key(), "42");
        assert_eq!(job.job_template, Some(7));
        assert!(!job.failed);
    }

    #[test]
    fn test_variable_data_keeps_every_variable() {
        let data = InventoryVariableData::from_wire(json!({"cluster_name": "k8s", "workers": 3}))
            .unwrap();
        assert_eq!(data.variables["workers"], json!(3));
        assert_eq!(data.variables.len(), 2);
    }
}
