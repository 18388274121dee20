//! Outbound notification port

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[cfg(test)]
use mockall::automock;

use crate::domain::ids::{EmployeeId, TenantId};
use crate::domain::DomainError;

/// Entity type attached to every workflow notification
pub const WORKFLOW_INSTANCE_ENTITY: &str = "workflow_instance";

/// Notification events emitted by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkflowEvent {
    #[serde(rename = "workflow.started")]
    Started,
    #[serde(rename = "workflow.step_assigned")]
    StepAssigned,
    #[serde(rename = "workflow.escalated")]
    Escalated,
    #[serde(rename = "workflow.completed")]
    Completed,
    #[serde(rename = "workflow.rejected")]
    Rejected,
}

impl WorkflowEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Started => "workflow.started",
            Self::StepAssigned => "workflow.step_assigned",
            Self::Escalated => "workflow.escalated",
            Self::Completed => "workflow.completed",
            Self::Rejected => "workflow.rejected",
        }
    }
}

impl std::fmt::Display for WorkflowEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A message for one recipient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub tenant_id: TenantId,
    pub recipient: EmployeeId,
    pub subject: String,
    pub body: String,
    pub entity_type: String,
    pub entity_id: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Notification {
    /// Event name carried in metadata, if any
    pub fn event(&self) -> Option<&str> {
        self.metadata.get("event").and_then(Value::as_str)
    }
}

/// Delivery channel; failures never roll back workflow state
#[cfg_attr(test, automock)]
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, notification: Notification) -> Result<(), DomainError>;
}
