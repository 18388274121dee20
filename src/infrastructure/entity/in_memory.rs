//! In-memory entity source used by the CLI and tests

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{
    DomainError, EmployeeId, EntityHandle, EntityId, EntitySource, HasPrimaryEmployee,
    HasStatusField, TenantId,
};

/// Generic business record with optional employee links and status column
#[derive(Debug)]
pub struct EntityRecord {
    id: EntityId,
    tenant_id: Option<TenantId>,
    employee: Option<EmployeeId>,
    initiator: Option<EmployeeId>,
    requester: Option<EmployeeId>,
    status: Option<Mutex<String>>,
}

impl EntityRecord {
    pub fn new(id: EntityId, tenant_id: Option<TenantId>) -> Self {
        Self {
            id,
            tenant_id,
            employee: None,
            initiator: None,
            requester: None,
            status: None,
        }
    }

    pub fn with_employee(mut self, employee: EmployeeId) -> Self {
        self.employee = Some(employee);
        self
    }

    pub fn with_initiator(mut self, initiator: EmployeeId) -> Self {
        self.initiator = Some(initiator);
        self
    }

    pub fn with_requester(mut self, requester: EmployeeId) -> Self {
        self.requester = Some(requester);
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(Mutex::new(status.into()));
        self
    }

    /// Current status column, if the record has one
    pub fn current_status(&self) -> Option<String> {
        self.status
            .as_ref()
            .map(|s| s.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }
}

impl EntityHandle for EntityRecord {
    fn id(&self) -> EntityId {
        self.id
    }

    fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    fn as_primary_employee(&self) -> Option<&dyn HasPrimaryEmployee> {
        Some(self)
    }

    fn as_status_field(&self) -> Option<&dyn HasStatusField> {
        self.status.as_ref().map(|_| self as &dyn HasStatusField)
    }
}

impl HasPrimaryEmployee for EntityRecord {
    fn employee(&self) -> Option<EmployeeId> {
        self.employee
    }

    fn initiator(&self) -> Option<EmployeeId> {
        self.initiator
    }

    fn requester(&self) -> Option<EmployeeId> {
        self.requester
    }
}

impl HasStatusField for EntityRecord {
    fn status(&self) -> String {
        self.current_status().unwrap_or_default()
    }

    fn set_status(&self, status: &str) {
        if let Some(field) = &self.status {
            *field.lock().unwrap_or_else(|e| e.into_inner()) = status.to_string();
        }
    }
}

/// Records of one entity type keyed by ID
#[derive(Debug, Clone, Default)]
pub struct InMemoryEntitySource {
    records: Arc<RwLock<HashMap<EntityId, Arc<EntityRecord>>>>,
}

impl InMemoryEntitySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, record: EntityRecord) -> Arc<EntityRecord> {
        let record = Arc::new(record);
        self.records
            .write()
            .await
            .insert(record.id, Arc::clone(&record));
        record
    }

    pub async fn get(&self, id: &EntityId) -> Option<Arc<EntityRecord>> {
        self.records.read().await.get(id).cloned()
    }
}

#[async_trait]
impl EntitySource for InMemoryEntitySource {
    async fn lookup(
        &self,
        tenant_id: &TenantId,
        id: &EntityId,
    ) -> Result<Option<Arc<dyn EntityHandle>>, DomainError> {
        let records = self.records.read().await;
        Ok(records
            .get(id)
            .filter(|r| r.tenant_id.is_none_or(|owner| &owner == tenant_id))
            .map(|r| Arc::clone(r) as Arc<dyn EntityHandle>))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::{EntityRegistry, EntityResolver};
    use crate::domain::workflow::{WorkflowError, WorkflowStore};
    use crate::infrastructure::workflow::InMemoryWorkflowStore;

    async fn resolver_with(source: &InMemoryEntitySource) -> EntityResolver {
        let mut registry = EntityRegistry::with_default_aliases();
        registry.register("employee_loan", Arc::new(source.clone()));
        EntityResolver::new(Arc::new(registry))
    }

    #[tokio::test]
    async fn test_resolve_alias_returns_canonical_code() {
        let tenant = TenantId::new();
        let source = InMemoryEntitySource::new();
        let id = EntityId::new();
        source.insert(EntityRecord::new(id, Some(tenant))).await;

        let resolver = resolver_with(&source).await;
        let resolved = resolver.resolve(&tenant, "Loan", &id).await.unwrap();
        assert_eq!(resolved.type_code, "employee_loan");
        assert_eq!(resolved.id(), id);
    }

    #[tokio::test]
    async fn test_resolve_hides_other_tenants() {
        let source = InMemoryEntitySource::new();
        let id = EntityId::new();
        source.insert(EntityRecord::new(id, Some(TenantId::new()))).await;

        let resolver = resolver_with(&source).await;
        let err = resolver
            .resolve(&TenantId::new(), "employee_loan", &id)
            .await
            .unwrap_err();
        assert_eq!(err, WorkflowError::entity_not_found("employee_loan", id));
    }

    #[tokio::test]
    async fn test_resolve_unsupported_type() {
        let resolver = resolver_with(&InMemoryEntitySource::new()).await;
        let err = resolver
            .resolve(&TenantId::new(), "timesheet", &EntityId::new())
            .await
            .unwrap_err();
        assert_eq!(err, WorkflowError::unsupported_entity_type("timesheet"));
    }

    #[tokio::test]
    async fn test_primary_employee_order() {
        let tenant = TenantId::new();
        let source = InMemoryEntitySource::new();
        let requester = EmployeeId::new();
        let initiator = EmployeeId::new();
        let id = EntityId::new();
        source
            .insert(
                EntityRecord::new(id, Some(tenant))
                    .with_requester(requester)
                    .with_initiator(initiator),
            )
            .await;

        let resolver = resolver_with(&source).await;
        let resolved = resolver.resolve(&tenant, "employee_loan", &id).await.unwrap();
        assert_eq!(EntityResolver::primary_employee(&resolved), Some(initiator));
    }

    #[tokio::test]
    async fn test_update_status_is_staged_until_commit() {
        let tenant = TenantId::new();
        let source = InMemoryEntitySource::new();
        let with_status = EntityId::new();
        let without_status = EntityId::new();
        let record = source
            .insert(EntityRecord::new(with_status, Some(tenant)).with_status("pending"))
            .await;
        source.insert(EntityRecord::new(without_status, Some(tenant))).await;

        let resolver = resolver_with(&source).await;
        let store = InMemoryWorkflowStore::new();
        let mut tx = store.begin().await.unwrap();

        let resolved = resolver.resolve(&tenant, "loan", &with_status).await.unwrap();
        assert!(EntityResolver::update_status(&resolved, "approved", tx.as_mut()));
        let plain = resolver.resolve(&tenant, "loan", &without_status).await.unwrap();
        assert!(!EntityResolver::update_status(&plain, "approved", tx.as_mut()));

        assert_eq!(record.current_status().as_deref(), Some("pending"));
        tx.commit().await.unwrap();
        assert_eq!(record.current_status().as_deref(), Some("approved"));
    }
}
