//! In-memory workflow store with staged, version-checked transactions

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::workflow::{
    WorkflowAction, WorkflowInstance, WorkflowStore, WorkflowTransaction,
};
use crate::domain::{DomainError, EntityHandle, InstanceId, TenantId};

#[derive(Debug, Default)]
struct StoreState {
    instances: HashMap<InstanceId, WorkflowInstance>,
    actions: Vec<WorkflowAction>,
    next_sequence: u64,
}

/// In-memory implementation of WorkflowStore
#[derive(Debug, Clone, Default)]
pub struct InMemoryWorkflowStore {
    state: Arc<RwLock<StoreState>>,
    fail_next_commit: Arc<AtomicBool>,
}

impl InMemoryWorkflowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed instances directly, bypassing transactions
    pub async fn with_instances(self, instances: Vec<WorkflowInstance>) -> Self {
        {
            let mut state = self.state.write().await;
            for instance in instances {
                state.instances.insert(*instance.id(), instance);
            }
        }
        self
    }

    /// Make the next commit fail with a storage error
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    pub async fn instance_count(&self) -> usize {
        self.state.read().await.instances.len()
    }
}

#[async_trait]
impl WorkflowStore for InMemoryWorkflowStore {
    async fn begin(&self) -> Result<Box<dyn WorkflowTransaction>, DomainError> {
        Ok(Box::new(InMemoryTransaction {
            state: Arc::clone(&self.state),
            fail: self.fail_next_commit.swap(false, Ordering::SeqCst),
            inserts: Vec::new(),
            updates: Vec::new(),
            actions: Vec::new(),
            entity_statuses: Vec::new(),
            committed: false,
        }))
    }

    async fn get_instance(&self, id: &InstanceId) -> Result<Option<WorkflowInstance>, DomainError> {
        let state = self.state.read().await;
        Ok(state.instances.get(id).cloned())
    }

    async fn get_instance_for_tenant(
        &self,
        tenant_id: &TenantId,
        id: &InstanceId,
    ) -> Result<Option<WorkflowInstance>, DomainError> {
        let state = self.state.read().await;
        Ok(state
            .instances
            .get(id)
            .filter(|i| i.tenant_id() == tenant_id)
            .cloned())
    }

    async fn list_actions(
        &self,
        tenant_id: &TenantId,
        instance_id: &InstanceId,
    ) -> Result<Vec<WorkflowAction>, DomainError> {
        let state = self.state.read().await;
        let mut actions: Vec<WorkflowAction> = state
            .actions
            .iter()
            .filter(|a| a.tenant_id() == tenant_id && a.instance_id() == instance_id)
            .cloned()
            .collect();
        actions.sort_by(|a, b| {
            a.step()
                .cmp(&b.step())
                .then_with(|| a.created_at().cmp(&b.created_at()))
                .then_with(|| a.sequence().cmp(&b.sequence()))
        });
        Ok(actions)
    }

    async fn list_active_instances(&self) -> Result<Vec<WorkflowInstance>, DomainError> {
        let state = self.state.read().await;
        let mut instances: Vec<WorkflowInstance> = state
            .instances
            .values()
            .filter(|i| i.is_active())
            .cloned()
            .collect();
        instances.sort_by_key(|i| i.started_at());
        Ok(instances)
    }
}

#[derive(Debug)]
struct InMemoryTransaction {
    state: Arc<RwLock<StoreState>>,
    fail: bool,
    inserts: Vec<WorkflowInstance>,
    updates: Vec<(WorkflowInstance, u64)>,
    actions: Vec<WorkflowAction>,
    entity_statuses: Vec<(Arc<dyn EntityHandle>, String)>,
    committed: bool,
}

#[async_trait]
impl WorkflowTransaction for InMemoryTransaction {
    fn insert_instance(&mut self, instance: WorkflowInstance) {
        self.inserts.push(instance);
    }

    fn update_instance(&mut self, instance: WorkflowInstance, expected_version: u64) {
        self.updates.push((instance, expected_version));
    }

    fn append_action(&mut self, action: WorkflowAction) {
        self.actions.push(action);
    }

    fn stage_entity_status(&mut self, entity: Arc<dyn EntityHandle>, status: String) {
        self.entity_statuses.push((entity, status));
    }

    async fn commit(&mut self) -> Result<(), DomainError> {
        if self.committed {
            return Err(DomainError::internal("Transaction already committed"));
        }
        if self.fail {
            return Err(DomainError::storage("Injected commit failure"));
        }

        let mut state = self.state.write().await;

        // Validate everything before touching state
        for instance in &self.inserts {
            if state.instances.contains_key(instance.id()) {
                return Err(DomainError::conflict(format!(
                    "Workflow instance '{}' already exists",
                    instance.id()
                )));
            }
        }
        for (instance, expected_version) in &self.updates {
            let stored = state.instances.get(instance.id()).ok_or_else(|| {
                DomainError::not_found(format!("Workflow instance '{}' not found", instance.id()))
            })?;
            if stored.version() != *expected_version {
                return Err(DomainError::conflict(format!(
                    "Workflow instance '{}' is at version {}, expected {}",
                    instance.id(),
                    stored.version(),
                    expected_version
                )));
            }
        }

        for instance in self.inserts.drain(..) {
            state.instances.insert(*instance.id(), instance);
        }
        for (instance, _) in self.updates.drain(..) {
            state.instances.insert(*instance.id(), instance);
        }
        for mut action in self.actions.drain(..) {
            state.next_sequence += 1;
            action.set_sequence(state.next_sequence);
            state.actions.push(action);
        }
        for (entity, status) in self.entity_statuses.drain(..) {
            if let Some(field) = entity.as_status_field() {
                field.set_status(&status);
            }
        }

        self.committed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::workflow::ActionKind;
    use crate::domain::{DefinitionId, EntityId};

    fn instance(tenant: TenantId) -> WorkflowInstance {
        WorkflowInstance::new(
            tenant,
            Some(DefinitionId::new()),
            "leave_request",
            EntityId::new(),
            1,
            Utc::now(),
            None,
        )
    }

    #[tokio::test]
    async fn test_nothing_visible_before_commit() {
        let store = InMemoryWorkflowStore::new();
        let tenant = TenantId::new();
        let instance = instance(tenant);
        let id = *instance.id();

        let mut tx = store.begin().await.unwrap();
        tx.insert_instance(instance.clone());
        tx.append_action(WorkflowAction::new(
            tenant,
            id,
            1,
            None,
            ActionKind::Started,
            "Workflow initiated",
            Utc::now(),
        ));
        assert!(store.get_instance(&id).await.unwrap().is_none());

        tx.commit().await.unwrap();
        assert!(store.get_instance(&id).await.unwrap().is_some());
        let actions = store.list_actions(&tenant, &id).await.unwrap();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].sequence(), 1);

        assert!(store
            .get_instance_for_tenant(&TenantId::new(), &id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_stale_version_conflicts_and_applies_nothing() {
        let tenant = TenantId::new();
        let original = instance(tenant);
        let id = *original.id();
        let store = InMemoryWorkflowStore::new()
            .with_instances(vec![original.clone()])
            .await;

        let mut first = original.clone();
        let expected = first.next_version();
        let mut tx = store.begin().await.unwrap();
        tx.update_instance(first, expected);
        tx.commit().await.unwrap();

        let mut second = original.clone();
        second.complete(true, Utc::now());
        let expected = second.next_version();
        let mut tx = store.begin().await.unwrap();
        tx.update_instance(second, expected);
        tx.append_action(WorkflowAction::new(
            tenant,
            id,
            1,
            None,
            ActionKind::Approved,
            "",
            Utc::now(),
        ));
        let err = tx.commit().await.unwrap_err();
        assert!(err.is_conflict());

        let stored = store.get_instance(&id).await.unwrap().unwrap();
        assert!(stored.is_active());
        assert!(store.list_actions(&tenant, &id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_injected_failure_and_active_listing() {
        let tenant = TenantId::new();
        let mut done = instance(tenant);
        done.complete(false, Utc::now());
        let store = InMemoryWorkflowStore::new()
            .with_instances(vec![instance(tenant), done])
            .await;

        assert_eq!(store.list_active_instances().await.unwrap().len(), 1);

        store.fail_next_commit();
        let mut tx = store.begin().await.unwrap();
        tx.insert_instance(instance(tenant));
        assert!(matches!(
            tx.commit().await,
            Err(DomainError::Storage { .. })
        ));
        assert_eq!(store.instance_count().await, 2);
    }
}
