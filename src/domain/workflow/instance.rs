//! Workflow instance entity and status machine

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ids::{DefinitionId, EmployeeId, EntityId, InstanceId, TenantId};
use crate::domain::DomainError;

/// Lifecycle status of an instance
///
/// `Active { escalated: true }` is the observable `escalated` marker; it still
/// accepts every action an `in_progress` instance accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum InstanceStatus {
    Active { escalated: bool },
    Approved,
    Rejected,
    Cancelled,
}

impl InstanceStatus {
    pub const IN_PROGRESS: InstanceStatus = InstanceStatus::Active { escalated: false };
    pub const ESCALATED: InstanceStatus = InstanceStatus::Active { escalated: true };

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active { .. })
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }

    pub fn is_escalated(&self) -> bool {
        matches!(self, Self::Active { escalated: true })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active { escalated: false } => "in_progress",
            Self::Active { escalated: true } => "escalated",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for InstanceStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_progress" => Ok(Self::IN_PROGRESS),
            "escalated" => Ok(Self::ESCALATED),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(DomainError::validation(format!(
                "Unknown workflow status '{}'",
                other
            ))),
        }
    }
}

impl TryFrom<String> for InstanceStatus {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<InstanceStatus> for String {
    fn from(status: InstanceStatus) -> Self {
        status.as_str().to_string()
    }
}

/// One running or completed approval for one business entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowInstance {
    id: InstanceId,
    tenant_id: TenantId,
    definition_id: Option<DefinitionId>,
    entity_type: String,
    entity_id: EntityId,
    current_step: u16,
    status: InstanceStatus,
    started_at: DateTime<Utc>,
    #[serde(default)]
    completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    current_approver: Option<EmployeeId>,
    #[serde(default)]
    created_by: Option<EmployeeId>,
    /// Optimistic-concurrency token, bumped on every committed change
    #[serde(default)]
    version: u64,
}

impl WorkflowInstance {
    pub fn new(
        tenant_id: TenantId,
        definition_id: Option<DefinitionId>,
        entity_type: impl Into<String>,
        entity_id: EntityId,
        current_step: u16,
        started_at: DateTime<Utc>,
        created_by: Option<EmployeeId>,
    ) -> Self {
        Self {
            id: InstanceId::new(),
            tenant_id,
            definition_id,
            entity_type: entity_type.into(),
            entity_id,
            current_step,
            status: InstanceStatus::IN_PROGRESS,
            started_at,
            completed_at: None,
            current_approver: None,
            created_by,
            version: 0,
        }
    }

    pub fn id(&self) -> &InstanceId {
        &self.id
    }

    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    pub fn definition_id(&self) -> Option<&DefinitionId> {
        self.definition_id.as_ref()
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn entity_id(&self) -> &EntityId {
        &self.entity_id
    }

    pub fn current_step(&self) -> u16 {
        self.current_step
    }

    pub fn status(&self) -> InstanceStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn current_approver(&self) -> Option<&EmployeeId> {
        self.current_approver.as_ref()
    }

    pub fn created_by(&self) -> Option<&EmployeeId> {
        self.created_by.as_ref()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Deadline for a definition-level SLA measured from `started_at`
    pub fn sla_deadline(&self, sla_hours: u32) -> DateTime<Utc> {
        self.started_at + Duration::hours(i64::from(sla_hours))
    }

    // State transitions. Callers check `is_active` first; these only mutate.

    /// Assign the approver of the current step
    pub fn assign(&mut self, approver: EmployeeId) {
        self.current_approver = Some(approver);
    }

    /// Move to a later step, clearing any escalation marker
    pub fn advance(&mut self, step_order: u16, approver: Option<EmployeeId>) {
        debug_assert!(step_order >= self.current_step, "step order must not decrease");
        self.current_step = self.current_step.max(step_order);
        self.current_approver = approver;
        self.status = InstanceStatus::IN_PROGRESS;
    }

    /// Reassign the current step without changing its order
    pub fn reassign(&mut self, approver: EmployeeId) {
        self.current_approver = Some(approver);
    }

    pub fn escalate(&mut self, target: EmployeeId) {
        self.status = InstanceStatus::ESCALATED;
        self.current_approver = Some(target);
    }

    pub fn complete(&mut self, approved: bool, at: DateTime<Utc>) {
        self.status = if approved {
            InstanceStatus::Approved
        } else {
            InstanceStatus::Rejected
        };
        self.current_approver = None;
        self.completed_at = Some(at);
    }

    /// Terminal cancellation set by the owning entity module
    pub fn cancel(&mut self, at: DateTime<Utc>) {
        self.status = InstanceStatus::Cancelled;
        self.current_approver = None;
        self.completed_at = Some(at);
    }

    /// Bump the version ahead of a write; returns the version the store must still hold
    pub fn next_version(&mut self) -> u64 {
        let expected = self.version;
        self.version += 1;
        expected
    }
}
