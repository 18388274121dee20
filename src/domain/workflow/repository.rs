//! Persistence ports for definitions, instances and the audit log

use std::sync::Arc;

use async_trait::async_trait;

use super::action::WorkflowAction;
use super::definition::WorkflowDefinition;
use super::instance::WorkflowInstance;
use super::step::WorkflowStep;
use crate::domain::entity::EntityHandle;
use crate::domain::ids::{DefinitionId, InstanceId, StepId, TenantId};
use crate::domain::DomainError;

/// Definitions and steps; read-only from the engine's point of view
#[async_trait]
pub trait DefinitionRepository: Send + Sync + std::fmt::Debug {
    async fn get(
        &self,
        tenant_id: &TenantId,
        id: &DefinitionId,
    ) -> Result<Option<WorkflowDefinition>, DomainError>;

    /// Active definition for an entity type; the first by name when several exist
    async fn find_active_for_entity_type(
        &self,
        tenant_id: &TenantId,
        entity_type: &str,
    ) -> Result<Option<WorkflowDefinition>, DomainError>;

    async fn find_active_by_code(
        &self,
        tenant_id: &TenantId,
        code: &str,
    ) -> Result<Option<WorkflowDefinition>, DomainError>;

    /// All definitions of a tenant, ordered by name
    async fn list_definitions(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Vec<WorkflowDefinition>, DomainError>;

    /// Steps of a definition ordered by `order`, inactive ones included
    async fn list_steps(
        &self,
        tenant_id: &TenantId,
        definition_id: &DefinitionId,
    ) -> Result<Vec<WorkflowStep>, DomainError>;

    async fn get_step(
        &self,
        tenant_id: &TenantId,
        id: &StepId,
    ) -> Result<Option<WorkflowStep>, DomainError>;

    /// Insert or replace; `(tenant, code)` must stay unique
    async fn save_definition(
        &self,
        definition: WorkflowDefinition,
    ) -> Result<WorkflowDefinition, DomainError>;

    /// Insert or replace; `(definition, order)` must stay unique
    async fn save_step(&self, step: WorkflowStep) -> Result<WorkflowStep, DomainError>;
}

/// Instances and actions, mutated only through transactions
#[async_trait]
pub trait WorkflowStore: Send + Sync + std::fmt::Debug {
    /// Open a unit of work; nothing is visible until `commit`
    async fn begin(&self) -> Result<Box<dyn WorkflowTransaction>, DomainError>;

    /// Unscoped lookup for trusted callers such as the SLA sweep
    async fn get_instance(&self, id: &InstanceId) -> Result<Option<WorkflowInstance>, DomainError>;

    async fn get_instance_for_tenant(
        &self,
        tenant_id: &TenantId,
        id: &InstanceId,
    ) -> Result<Option<WorkflowInstance>, DomainError>;

    /// Audit log ordered by `(step, created_at, sequence)`
    async fn list_actions(
        &self,
        tenant_id: &TenantId,
        instance_id: &InstanceId,
    ) -> Result<Vec<WorkflowAction>, DomainError>;

    /// Instances whose status is still active, across tenants
    async fn list_active_instances(&self) -> Result<Vec<WorkflowInstance>, DomainError>;
}

/// Staged writes committed atomically
///
/// Dropping a transaction without committing discards everything staged.
#[async_trait]
pub trait WorkflowTransaction: Send {
    fn insert_instance(&mut self, instance: WorkflowInstance);

    /// Replace an instance if the stored version still equals `expected_version`
    fn update_instance(&mut self, instance: WorkflowInstance, expected_version: u64);

    fn append_action(&mut self, action: WorkflowAction);

    /// Status write-back applied to the entity after the instance writes commit
    fn stage_entity_status(&mut self, entity: Arc<dyn EntityHandle>, status: String);

    /// Apply everything or nothing; a stale version yields `DomainError::Conflict`
    async fn commit(&mut self) -> Result<(), DomainError>;
}
