//! Audit log entries and actor requests

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::WorkflowError;
use crate::domain::employee::Employee;
use crate::domain::ids::{ActionId, EmployeeId, InstanceId, TenantId};

/// Kind of an audit log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Started,
    Approved,
    Rejected,
    Forwarded,
    Delegated,
    Escalated,
    AutoApproved,
    AutoRejected,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Forwarded => "forwarded",
            Self::Delegated => "delegated",
            Self::Escalated => "escalated",
            Self::AutoApproved => "auto_approved",
            Self::AutoRejected => "auto_rejected",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Immutable audit record of one transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowAction {
    id: ActionId,
    tenant_id: TenantId,
    instance_id: InstanceId,
    step: u16,
    /// `None` for system actions (auto-completion, escalation)
    actor: Option<EmployeeId>,
    action: ActionKind,
    comments: String,
    created_at: DateTime<Utc>,
    /// Store-assigned insertion order; breaks `created_at` ties
    #[serde(default)]
    sequence: u64,
}

impl WorkflowAction {
    pub fn new(
        tenant_id: TenantId,
        instance_id: InstanceId,
        step: u16,
        actor: Option<EmployeeId>,
        action: ActionKind,
        comments: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ActionId::new(),
            tenant_id,
            instance_id,
            step,
            actor,
            action,
            comments: comments.into(),
            created_at,
            sequence: 0,
        }
    }

    pub fn id(&self) -> &ActionId {
        &self.id
    }

    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    pub fn instance_id(&self) -> &InstanceId {
        &self.instance_id
    }

    pub fn step(&self) -> u16 {
        self.step
    }

    pub fn actor(&self) -> Option<&EmployeeId> {
        self.actor.as_ref()
    }

    pub fn action(&self) -> ActionKind {
        self.action
    }

    pub fn comments(&self) -> &str {
        &self.comments
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub(crate) fn set_sequence(&mut self, sequence: u64) {
        self.sequence = sequence;
    }
}

/// Action an actor may request through `take_action`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestedAction {
    Approve,
    Reject,
    Forward,
    Delegate,
}

impl RequestedAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Forward => "forward",
            Self::Delegate => "delegate",
        }
    }

    /// Audit kind recorded for this request
    pub fn audit_kind(&self) -> ActionKind {
        match self {
            Self::Approve => ActionKind::Approved,
            Self::Reject => ActionKind::Rejected,
            Self::Forward => ActionKind::Forwarded,
            Self::Delegate => ActionKind::Delegated,
        }
    }
}

impl FromStr for RequestedAction {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "approve" => Ok(Self::Approve),
            "reject" => Ok(Self::Reject),
            "forward" => Ok(Self::Forward),
            "delegate" => Ok(Self::Delegate),
            _ => Err(WorkflowError::UnsupportedAction(s.to_string())),
        }
    }
}

impl fmt::Display for RequestedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payload of a `take_action` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub kind: RequestedAction,
    #[serde(default)]
    pub comments: String,
    #[serde(default)]
    pub forward_to: Option<EmployeeId>,
    #[serde(default)]
    pub delegate_to: Option<EmployeeId>,
}

impl ActionRequest {
    fn of(kind: RequestedAction) -> Self {
        Self {
            kind,
            comments: String::new(),
            forward_to: None,
            delegate_to: None,
        }
    }

    pub fn approve() -> Self {
        Self::of(RequestedAction::Approve)
    }

    pub fn reject(comments: impl Into<String>) -> Self {
        Self::of(RequestedAction::Reject).with_comments(comments)
    }

    pub fn forward(target: EmployeeId) -> Self {
        let mut request = Self::of(RequestedAction::Forward);
        request.forward_to = Some(target);
        request
    }

    pub fn delegate(target: EmployeeId) -> Self {
        let mut request = Self::of(RequestedAction::Delegate);
        request.delegate_to = Some(target);
        request
    }

    pub fn with_comments(mut self, comments: impl Into<String>) -> Self {
        self.comments = comments.into();
        self
    }

    /// Payload checks that need no stored state
    pub fn validate(&self) -> Result<(), WorkflowError> {
        match self.kind {
            RequestedAction::Approve => Ok(()),
            RequestedAction::Reject if self.comments.trim().is_empty() => {
                Err(WorkflowError::MissingRejectionComments)
            }
            RequestedAction::Reject => Ok(()),
            RequestedAction::Forward if self.forward_to.is_none() => {
                Err(WorkflowError::MissingForwardTarget)
            }
            RequestedAction::Delegate if self.delegate_to.is_none() => {
                Err(WorkflowError::MissingDelegateTarget)
            }
            RequestedAction::Forward | RequestedAction::Delegate => Ok(()),
        }
    }
}

/// The employee performing an action, with the superuser override
#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    pub employee: Employee,
    pub superuser: bool,
}

impl Actor {
    pub fn new(employee: Employee) -> Self {
        Self {
            employee,
            superuser: false,
        }
    }

    pub fn superuser(employee: Employee) -> Self {
        Self {
            employee,
            superuser: true,
        }
    }

    pub fn id(&self) -> &EmployeeId {
        &self.employee.id
    }

    pub fn tenant_id(&self) -> &TenantId {
        &self.employee.tenant_id
    }
}
