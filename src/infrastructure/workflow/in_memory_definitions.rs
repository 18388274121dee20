//! In-memory definition repository

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::workflow::{DefinitionRepository, WorkflowDefinition, WorkflowStep};
use crate::domain::{DefinitionId, DomainError, StepId, TenantId};

#[derive(Debug, Default)]
struct Tables {
    definitions: HashMap<DefinitionId, WorkflowDefinition>,
    steps: HashMap<StepId, WorkflowStep>,
}

/// In-memory implementation of DefinitionRepository
#[derive(Debug, Clone, Default)]
pub struct InMemoryDefinitionRepository {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryDefinitionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sorted_by_name(mut definitions: Vec<WorkflowDefinition>) -> Vec<WorkflowDefinition> {
    definitions.sort_by(|a, b| a.name().cmp(b.name()).then_with(|| a.id().cmp(b.id())));
    definitions
}

#[async_trait]
impl DefinitionRepository for InMemoryDefinitionRepository {
    async fn get(
        &self,
        tenant_id: &TenantId,
        id: &DefinitionId,
    ) -> Result<Option<WorkflowDefinition>, DomainError> {
        let tables = self.tables.read().await;
        Ok(tables
            .definitions
            .get(id)
            .filter(|d| d.tenant_id() == tenant_id)
            .cloned())
    }

    async fn find_active_for_entity_type(
        &self,
        tenant_id: &TenantId,
        entity_type: &str,
    ) -> Result<Option<WorkflowDefinition>, DomainError> {
        let definitions = self.list_definitions(tenant_id).await?;
        Ok(definitions
            .into_iter()
            .find(|d| d.is_active() && d.entity_type() == entity_type))
    }

    async fn find_active_by_code(
        &self,
        tenant_id: &TenantId,
        code: &str,
    ) -> Result<Option<WorkflowDefinition>, DomainError> {
        let tables = self.tables.read().await;
        Ok(tables
            .definitions
            .values()
            .find(|d| d.tenant_id() == tenant_id && d.is_active() && d.code() == code)
            .cloned())
    }

    async fn list_definitions(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Vec<WorkflowDefinition>, DomainError> {
        let tables = self.tables.read().await;
        Ok(sorted_by_name(
            tables
                .definitions
                .values()
                .filter(|d| d.tenant_id() == tenant_id)
                .cloned()
                .collect(),
        ))
    }

    async fn list_steps(
        &self,
        tenant_id: &TenantId,
        definition_id: &DefinitionId,
    ) -> Result<Vec<WorkflowStep>, DomainError> {
        let tables = self.tables.read().await;
        let mut steps: Vec<WorkflowStep> = tables
            .steps
            .values()
            .filter(|s| s.tenant_id() == tenant_id && s.definition_id() == definition_id)
            .cloned()
            .collect();
        steps.sort_by_key(|s| s.order());
        Ok(steps)
    }

    async fn get_step(
        &self,
        tenant_id: &TenantId,
        id: &StepId,
    ) -> Result<Option<WorkflowStep>, DomainError> {
        let tables = self.tables.read().await;
        Ok(tables
            .steps
            .get(id)
            .filter(|s| s.tenant_id() == tenant_id)
            .cloned())
    }

    async fn save_definition(
        &self,
        definition: WorkflowDefinition,
    ) -> Result<WorkflowDefinition, DomainError> {
        let mut tables = self.tables.write().await;

        let duplicate = tables.definitions.values().any(|d| {
            d.id() != definition.id()
                && d.tenant_id() == definition.tenant_id()
                && d.code() == definition.code()
        });
        if duplicate {
            return Err(DomainError::conflict(format!(
                "Workflow code '{}' already exists",
                definition.code()
            )));
        }

        tables
            .definitions
            .insert(*definition.id(), definition.clone());
        Ok(definition)
    }

    async fn save_step(&self, step: WorkflowStep) -> Result<WorkflowStep, DomainError> {
        let mut tables = self.tables.write().await;

        let duplicate = tables.steps.values().any(|s| {
            s.id() != step.id()
                && s.definition_id() == step.definition_id()
                && s.order() == step.order()
        });
        if duplicate {
            return Err(DomainError::conflict(format!(
                "Step order {} already exists in workflow {}",
                step.order(),
                step.definition_id()
            )));
        }

        tables.steps.insert(*step.id(), step.clone());
        Ok(step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::workflow::ApproverStrategy;

    #[tokio::test]
    async fn test_active_definition_lookup_is_tenant_scoped() {
        let repo = InMemoryDefinitionRepository::new();
        let tenant = TenantId::new();
        let other = TenantId::new();

        repo.save_definition(WorkflowDefinition::new(tenant, "B leave", "LEAVE_B", "leave_request"))
            .await
            .unwrap();
        repo.save_definition(WorkflowDefinition::new(tenant, "A leave", "LEAVE_A", "leave_request"))
            .await
            .unwrap();
        repo.save_definition(
            WorkflowDefinition::new(tenant, "0 retired", "LEAVE_OLD", "leave_request")
                .with_active(false),
        )
        .await
        .unwrap();

        let found = repo
            .find_active_for_entity_type(&tenant, "leave_request")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.code(), "LEAVE_A");

        assert!(repo
            .find_active_for_entity_type(&other, "leave_request")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_duplicate_code_conflicts_within_tenant_only() {
        let repo = InMemoryDefinitionRepository::new();
        let tenant = TenantId::new();

        repo.save_definition(WorkflowDefinition::new(tenant, "Leave", "LEAVE", "leave_request"))
            .await
            .unwrap();
        let err = repo
            .save_definition(WorkflowDefinition::new(tenant, "Leave 2", "LEAVE", "leave_request"))
            .await
            .unwrap_err();
        assert!(err.is_conflict());

        assert!(repo
            .save_definition(WorkflowDefinition::new(
                TenantId::new(),
                "Leave",
                "LEAVE",
                "leave_request"
            ))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_steps_ordered_and_unique() {
        let repo = InMemoryDefinitionRepository::new();
        let tenant = TenantId::new();
        let definition = WorkflowDefinition::new(tenant, "Leave", "LEAVE", "leave_request");
        let definition_id = *definition.id();
        repo.save_definition(definition).await.unwrap();

        for order in [2, 1] {
            repo.save_step(WorkflowStep::new(
                tenant,
                definition_id,
                order,
                format!("Step {}", order),
                ApproverStrategy::ReportingManager,
            ))
            .await
            .unwrap();
        }

        let steps = repo.list_steps(&tenant, &definition_id).await.unwrap();
        assert_eq!(steps.iter().map(|s| s.order()).collect::<Vec<_>>(), vec![1, 2]);

        let err = repo
            .save_step(WorkflowStep::new(
                tenant,
                definition_id,
                1,
                "Duplicate",
                ApproverStrategy::HrManager,
            ))
            .await
            .unwrap_err();
        assert!(err.is_conflict());
    }
}
