//! Definition service - tenant administration of workflow templates

use std::sync::Arc;

use tracing::info;

use crate::domain::entity::{normalize_entity_type, EntityRegistry};
use crate::domain::workflow::{
    validate_definition_code, ApproverStrategy, DefinitionRepository, WorkflowDefinition,
    WorkflowError, WorkflowStep,
};
use crate::domain::{
    DefinitionId, DomainError, EmployeeDirectory, EmployeeId, RoleId, StepId, TenantId,
};

/// Request to create a workflow definition
#[derive(Debug, Clone)]
pub struct CreateDefinitionRequest {
    pub name: String,
    pub code: String,
    pub entity_type: String,
    pub description: Option<String>,
    pub sla_hours: Option<u32>,
    pub auto_approve_on_sla: bool,
    pub is_active: bool,
}

impl CreateDefinitionRequest {
    pub fn new(
        name: impl Into<String>,
        code: impl Into<String>,
        entity_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
            entity_type: entity_type.into(),
            description: None,
            sla_hours: None,
            auto_approve_on_sla: false,
            is_active: true,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_sla(mut self, hours: u32, auto_approve: bool) -> Self {
        self.sla_hours = Some(hours);
        self.auto_approve_on_sla = auto_approve;
        self
    }

    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }
}

/// Request to add a step to a definition
///
/// The approver is given in its flat form (`approver_type` plus optional
/// parameters) and checked against the tag.
#[derive(Debug, Clone)]
pub struct CreateStepRequest {
    pub order: u16,
    pub name: String,
    pub approver_type: String,
    pub approver_role: Option<RoleId>,
    pub approver_user: Option<EmployeeId>,
    pub is_optional: bool,
    pub can_delegate: bool,
    pub sla_hours: Option<u32>,
    pub escalate_to: Option<StepId>,
}

impl CreateStepRequest {
    pub fn new(order: u16, name: impl Into<String>, approver_type: impl Into<String>) -> Self {
        Self {
            order,
            name: name.into(),
            approver_type: approver_type.into(),
            approver_role: None,
            approver_user: None,
            is_optional: false,
            can_delegate: true,
            sla_hours: None,
            escalate_to: None,
        }
    }

    pub fn with_role(mut self, role_id: RoleId) -> Self {
        self.approver_role = Some(role_id);
        self
    }

    pub fn with_user(mut self, employee_id: EmployeeId) -> Self {
        self.approver_user = Some(employee_id);
        self
    }

    pub fn with_optional(mut self, is_optional: bool) -> Self {
        self.is_optional = is_optional;
        self
    }

    pub fn with_can_delegate(mut self, can_delegate: bool) -> Self {
        self.can_delegate = can_delegate;
        self
    }

    pub fn with_sla_hours(mut self, hours: u32) -> Self {
        self.sla_hours = Some(hours);
        self
    }

    pub fn with_escalate_to(mut self, step_id: StepId) -> Self {
        self.escalate_to = Some(step_id);
        self
    }
}

/// Creates and deactivates definitions and steps for a tenant
pub struct DefinitionService {
    definitions: Arc<dyn DefinitionRepository>,
    directory: Arc<dyn EmployeeDirectory>,
    registry: Arc<EntityRegistry>,
}

impl std::fmt::Debug for DefinitionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefinitionService").finish()
    }
}

impl DefinitionService {
    pub fn new(
        definitions: Arc<dyn DefinitionRepository>,
        directory: Arc<dyn EmployeeDirectory>,
        registry: Arc<EntityRegistry>,
    ) -> Self {
        Self {
            definitions,
            directory,
            registry,
        }
    }

    /// Create a definition; `(tenant, code)` must be unused
    pub async fn create_definition(
        &self,
        tenant_id: &TenantId,
        request: CreateDefinitionRequest,
    ) -> Result<WorkflowDefinition, DomainError> {
        validate_definition_code(&request.code)?;
        if request.name.trim().is_empty() {
            return Err(DomainError::validation("Workflow name cannot be empty"));
        }
        let entity_type = self.entity_type_code(&request.entity_type)?;

        let mut definition =
            WorkflowDefinition::new(*tenant_id, request.name, request.code, entity_type)
                .with_auto_approve_on_sla(request.auto_approve_on_sla)
                .with_active(request.is_active);
        if let Some(description) = request.description {
            definition = definition.with_description(description);
        }
        if let Some(hours) = request.sla_hours {
            definition = definition.with_sla_hours(hours);
        }

        let definition = self.definitions.save_definition(definition).await?;
        info!(
            tenant_id = %tenant_id,
            definition_id = %definition.id(),
            code = %definition.code(),
            entity_type = %definition.entity_type(),
            "Workflow definition created"
        );
        Ok(definition)
    }

    /// Add a step to a definition of the same tenant
    pub async fn add_step(
        &self,
        tenant_id: &TenantId,
        definition_id: &DefinitionId,
        request: CreateStepRequest,
    ) -> Result<WorkflowStep, DomainError> {
        let definition = self.definition(tenant_id, definition_id).await?;

        if request.order == 0 {
            return Err(DomainError::validation("Step order must be at least 1"));
        }
        if request.name.trim().is_empty() {
            return Err(DomainError::validation("Step name cannot be empty"));
        }

        let strategy = ApproverStrategy::from_parts(
            &request.approver_type,
            request.approver_role,
            request.approver_user,
        )
        .map_err(into_validation)?;

        if let ApproverStrategy::User { approver_user } = &strategy {
            let belongs = self
                .directory
                .get_employee(approver_user)
                .await?
                .is_some_and(|e| e.belongs_to(tenant_id));
            if !belongs {
                return Err(into_validation(WorkflowError::cross_tenant_approver(
                    approver_user,
                )));
            }
        }

        let mut step = WorkflowStep::new(
            *tenant_id,
            *definition.id(),
            request.order,
            request.name,
            strategy,
        )
        .with_optional(request.is_optional)
        .with_can_delegate(request.can_delegate);
        if let Some(hours) = request.sla_hours {
            step = step.with_sla_hours(hours);
        }
        if let Some(target) = request.escalate_to {
            if self.definitions.get_step(tenant_id, &target).await?.is_none() {
                return Err(DomainError::validation(
                    "Escalation step must belong to the same organization",
                ));
            }
            step = step.with_escalate_to(target);
        }

        let step = self.definitions.save_step(step).await?;
        info!(
            tenant_id = %tenant_id,
            definition_id = %definition_id,
            step_id = %step.id(),
            order = step.order(),
            approver_type = %step.strategy(),
            "Workflow step added"
        );
        Ok(step)
    }

    /// Soft-delete a definition; running instances keep their history
    pub async fn deactivate_definition(
        &self,
        tenant_id: &TenantId,
        definition_id: &DefinitionId,
    ) -> Result<WorkflowDefinition, DomainError> {
        let mut definition = self.definition(tenant_id, definition_id).await?;
        definition.set_active(false);
        let definition = self.definitions.save_definition(definition).await?;
        info!(tenant_id = %tenant_id, definition_id = %definition_id, "Workflow definition deactivated");
        Ok(definition)
    }

    pub async fn deactivate_step(
        &self,
        tenant_id: &TenantId,
        step_id: &StepId,
    ) -> Result<WorkflowStep, DomainError> {
        let mut step = self
            .definitions
            .get_step(tenant_id, step_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Workflow step {} not found", step_id)))?;
        step.set_active(false);
        let step = self.definitions.save_step(step).await?;
        info!(tenant_id = %tenant_id, step_id = %step_id, "Workflow step deactivated");
        Ok(step)
    }

    /// Active definition for an entity-type token in any accepted spelling
    pub async fn find_for_entity_type(
        &self,
        tenant_id: &TenantId,
        entity_type: &str,
    ) -> Result<Option<WorkflowDefinition>, DomainError> {
        let entity_type = self.entity_type_code(entity_type)?;
        self.definitions
            .find_active_for_entity_type(tenant_id, &entity_type)
            .await
    }

    pub async fn list(&self, tenant_id: &TenantId) -> Result<Vec<WorkflowDefinition>, DomainError> {
        self.definitions.list_definitions(tenant_id).await
    }

    pub async fn steps(
        &self,
        tenant_id: &TenantId,
        definition_id: &DefinitionId,
    ) -> Result<Vec<WorkflowStep>, DomainError> {
        self.definition(tenant_id, definition_id).await?;
        self.definitions.list_steps(tenant_id, definition_id).await
    }

    /// Canonical code for a token, with aliases folded
    fn entity_type_code(&self, token: &str) -> Result<String, DomainError> {
        let normalized = normalize_entity_type(token).map_err(into_validation)?;
        Ok(self.registry.canonical(&normalized).to_string())
    }

    async fn definition(
        &self,
        tenant_id: &TenantId,
        definition_id: &DefinitionId,
    ) -> Result<WorkflowDefinition, DomainError> {
        self.definitions
            .get(tenant_id, definition_id)
            .await?
            .ok_or_else(|| {
                DomainError::not_found(format!("Workflow definition {} not found", definition_id))
            })
    }
}

fn into_validation(error: WorkflowError) -> DomainError {
    match error {
        WorkflowError::Store(inner) => inner,
        other => DomainError::validation(other.to_string()),
    }
}
