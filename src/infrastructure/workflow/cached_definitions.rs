//! Per-tenant definition cache

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;

use crate::domain::workflow::{DefinitionRepository, WorkflowDefinition, WorkflowStep};
use crate::domain::{DefinitionId, DomainError, StepId, TenantId};

/// Everything a tenant has configured, loaded in one pass
#[derive(Debug, Default)]
struct TenantSnapshot {
    /// Ordered by name, as the inner repository lists them
    definitions: Vec<WorkflowDefinition>,
    /// Ordered by definition then step order
    steps: Vec<WorkflowStep>,
}

/// Definition repository wrapper serving reads from a TTL cache keyed by tenant
///
/// Writes go straight to the inner repository and drop the tenant's entry.
#[derive(Debug)]
pub struct CachedDefinitionRepository<R: DefinitionRepository> {
    inner: R,
    cache: Cache<TenantId, Arc<TenantSnapshot>>,
}

impl<R: DefinitionRepository> CachedDefinitionRepository<R> {
    pub fn new(inner: R, ttl: Duration, capacity: u64) -> Self {
        let cache = Cache::builder()
            .time_to_live(ttl)
            .max_capacity(capacity)
            .build();

        Self { inner, cache }
    }

    pub async fn invalidate_tenant(&self, tenant_id: &TenantId) {
        self.cache.invalidate(tenant_id).await;
    }

    pub fn cache_size(&self) -> u64 {
        self.cache.entry_count()
    }

    async fn snapshot(&self, tenant_id: &TenantId) -> Result<Arc<TenantSnapshot>, DomainError> {
        if let Some(cached) = self.cache.get(tenant_id).await {
            tracing::debug!(tenant_id = %tenant_id, "Cache hit for workflow definitions");
            return Ok(cached);
        }

        tracing::debug!(tenant_id = %tenant_id, "Cache miss, loading workflow definitions");

        let definitions = self.inner.list_definitions(tenant_id).await?;
        let mut steps = Vec::new();
        for definition in &definitions {
            steps.extend(self.inner.list_steps(tenant_id, definition.id()).await?);
        }

        let snapshot = Arc::new(TenantSnapshot { definitions, steps });
        self.cache.insert(*tenant_id, Arc::clone(&snapshot)).await;
        Ok(snapshot)
    }
}

#[async_trait]
impl<R: DefinitionRepository> DefinitionRepository for CachedDefinitionRepository<R> {
    async fn get(
        &self,
        tenant_id: &TenantId,
        id: &DefinitionId,
    ) -> Result<Option<WorkflowDefinition>, DomainError> {
        let snapshot = self.snapshot(tenant_id).await?;
        Ok(snapshot.definitions.iter().find(|d| d.id() == id).cloned())
    }

    async fn find_active_for_entity_type(
        &self,
        tenant_id: &TenantId,
        entity_type: &str,
    ) -> Result<Option<WorkflowDefinition>, DomainError> {
        let snapshot = self.snapshot(tenant_id).await?;
        Ok(snapshot
            .definitions
            .iter()
            .find(|d| d.is_active() && d.entity_type() == entity_type)
            .cloned())
    }

    async fn find_active_by_code(
        &self,
        tenant_id: &TenantId,
        code: &str,
    ) -> Result<Option<WorkflowDefinition>, DomainError> {
        let snapshot = self.snapshot(tenant_id).await?;
        Ok(snapshot
            .definitions
            .iter()
            .find(|d| d.is_active() && d.code() == code)
            .cloned())
    }

    async fn list_definitions(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Vec<WorkflowDefinition>, DomainError> {
        Ok(self.snapshot(tenant_id).await?.definitions.clone())
    }

    async fn list_steps(
        &self,
        tenant_id: &TenantId,
        definition_id: &DefinitionId,
    ) -> Result<Vec<WorkflowStep>, DomainError> {
        let snapshot = self.snapshot(tenant_id).await?;
        Ok(snapshot
            .steps
            .iter()
            .filter(|s| s.definition_id() == definition_id)
            .cloned()
            .collect())
    }

    async fn get_step(
        &self,
        tenant_id: &TenantId,
        id: &StepId,
    ) -> Result<Option<WorkflowStep>, DomainError> {
        let snapshot = self.snapshot(tenant_id).await?;
        Ok(snapshot.steps.iter().find(|s| s.id() == id).cloned())
    }

    async fn save_definition(
        &self,
        definition: WorkflowDefinition,
    ) -> Result<WorkflowDefinition, DomainError> {
        let tenant_id = *definition.tenant_id();
        let saved = self.inner.save_definition(definition).await?;
        self.invalidate_tenant(&tenant_id).await;
        Ok(saved)
    }

    async fn save_step(&self, step: WorkflowStep) -> Result<WorkflowStep, DomainError> {
        let tenant_id = *step.tenant_id();
        let saved = self.inner.save_step(step).await?;
        self.invalidate_tenant(&tenant_id).await;
        Ok(saved)
    }
}
