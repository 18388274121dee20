//! Workflow error types

use thiserror::Error;

use crate::domain::DomainError;

/// Errors returned by entity resolution, approver resolution and the engine
#[derive(Debug, Clone, Error, PartialEq)]
pub enum WorkflowError {
    #[error("Entity type is required")]
    EntityTypeRequired,

    #[error("Unsupported entity type: {0}")]
    UnsupportedEntityType(String),

    #[error("Entity not found for organization: {entity_type} {entity_id}")]
    EntityNotFound {
        entity_type: String,
        entity_id: String,
    },

    #[error("No workflow defined for {0}")]
    NoWorkflowDefined(String),

    #[error("Workflow {0} not found")]
    DefinitionNotFound(String),

    #[error("Workflow instance not found: {0}")]
    InstanceNotFound(String),

    #[error("Unsupported approver type: {0}")]
    UnsupportedApproverType(String),

    #[error("Invalid step configuration: {0}")]
    InvalidStepConfig(String),

    #[error("Approver must belong to the same organization: {0}")]
    CrossTenantApprover(String),

    #[error("Employee not found: {0}")]
    UnknownEmployee(String),

    #[error("Workflow is no longer active (status: {0})")]
    WorkflowNotActive(String),

    #[error("Actor must belong to the same organization")]
    CrossTenantActor,

    #[error("Only the assigned approver can perform this action")]
    NotAssignedApprover,

    #[error("Unsupported action: {0}")]
    UnsupportedAction(String),

    #[error("Comments required when rejecting")]
    MissingRejectionComments,

    #[error("Forward action requires target employee")]
    MissingForwardTarget,

    #[error("Delegate action requires target employee")]
    MissingDelegateTarget,

    #[error("Step '{0}' does not allow delegation")]
    DelegationNotAllowed(String),

    #[error("Unable to determine escalation target")]
    NoEscalationTarget,

    #[error("Workflow instance {0} was modified concurrently")]
    ConcurrentModification(String),

    #[error("Store error: {0}")]
    Store(#[from] DomainError),
}

impl WorkflowError {
    pub fn unsupported_entity_type(token: impl Into<String>) -> Self {
        Self::UnsupportedEntityType(token.into())
    }

    pub fn entity_not_found(entity_type: impl Into<String>, entity_id: impl ToString) -> Self {
        Self::EntityNotFound {
            entity_type: entity_type.into(),
            entity_id: entity_id.to_string(),
        }
    }

    pub fn no_workflow_defined(entity_type: impl Into<String>) -> Self {
        Self::NoWorkflowDefined(entity_type.into())
    }

    pub fn definition_not_found(code: impl Into<String>) -> Self {
        Self::DefinitionNotFound(code.into())
    }

    pub fn instance_not_found(id: impl ToString) -> Self {
        Self::InstanceNotFound(id.to_string())
    }

    pub fn unsupported_approver_type(tag: impl Into<String>) -> Self {
        Self::UnsupportedApproverType(tag.into())
    }

    pub fn invalid_step_config(message: impl Into<String>) -> Self {
        Self::InvalidStepConfig(message.into())
    }

    pub fn cross_tenant_approver(employee_id: impl ToString) -> Self {
        Self::CrossTenantApprover(employee_id.to_string())
    }

    pub fn unknown_employee(employee_id: impl ToString) -> Self {
        Self::UnknownEmployee(employee_id.to_string())
    }

    pub fn not_active(status: impl ToString) -> Self {
        Self::WorkflowNotActive(status.to_string())
    }

    /// Caller-correctable failures; anything else is a store or transport fault
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Store(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = WorkflowError::unsupported_entity_type("timesheet");
        assert_eq!(err.to_string(), "Unsupported entity type: timesheet");

        let err = WorkflowError::no_workflow_defined("leave_request");
        assert_eq!(err.to_string(), "No workflow defined for leave_request");

        let err = WorkflowError::not_active("approved");
        assert_eq!(
            err.to_string(),
            "Workflow is no longer active (status: approved)"
        );
    }

    #[test]
    fn test_client_error_classification() {
        assert!(WorkflowError::MissingRejectionComments.is_client_error());
        assert!(WorkflowError::NotAssignedApprover.is_client_error());
        assert!(WorkflowError::ConcurrentModification("x".into()).is_client_error());

        let store: WorkflowError = DomainError::storage("connection reset").into();
        assert!(!store.is_client_error());
    }
}
