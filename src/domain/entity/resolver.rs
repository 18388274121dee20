//! Tenant-safe entity resolution

use std::sync::Arc;

use tracing::debug;

use super::handle::EntityHandle;
use super::registry::EntityRegistry;
use crate::domain::ids::{EmployeeId, EntityId, TenantId};
use crate::domain::workflow::{WorkflowError, WorkflowTransaction};

/// Fold `CamelCase`, `kebab-case` and spaced tokens into `snake_case`
pub fn normalize_entity_type(token: &str) -> Result<String, WorkflowError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(WorkflowError::EntityTypeRequired);
    }

    let mut normalized = String::with_capacity(token.len() + 4);
    for c in token.chars() {
        if c.is_uppercase() {
            normalized.push('_');
            normalized.extend(c.to_lowercase());
        } else if c == '-' || c == ' ' {
            normalized.push('_');
        } else {
            normalized.push(c);
        }
    }

    let normalized = normalized.trim_matches('_').to_string();
    if normalized.is_empty() {
        return Err(WorkflowError::EntityTypeRequired);
    }
    Ok(normalized)
}

/// An entity found for a tenant, tagged with its canonical type code
#[derive(Debug, Clone)]
pub struct ResolvedEntity {
    pub type_code: String,
    pub handle: Arc<dyn EntityHandle>,
}

impl ResolvedEntity {
    pub fn id(&self) -> EntityId {
        self.handle.id()
    }
}

#[derive(Debug, Clone)]
pub struct EntityResolver {
    registry: Arc<EntityRegistry>,
}

impl EntityResolver {
    pub fn new(registry: Arc<EntityRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    /// Find `entity_id` of type `entity_type` within `tenant_id`
    pub async fn resolve(
        &self,
        tenant_id: &TenantId,
        entity_type: &str,
        entity_id: &EntityId,
    ) -> Result<ResolvedEntity, WorkflowError> {
        let token = normalize_entity_type(entity_type)?;
        let (code, source) = self
            .registry
            .source(&token)
            .ok_or_else(|| WorkflowError::unsupported_entity_type(entity_type))?;

        let handle = source
            .lookup(tenant_id, entity_id)
            .await?
            .ok_or_else(|| WorkflowError::entity_not_found(code, entity_id))?;

        // Sources are tenant-scoped already; a handle reporting another tenant is treated as absent
        if let Some(owner) = handle.tenant_id() {
            if &owner != tenant_id {
                debug!(
                    entity_type = %code,
                    entity_id = %entity_id,
                    "Entity source returned a record from another tenant"
                );
                return Err(WorkflowError::entity_not_found(code, entity_id));
            }
        }

        Ok(ResolvedEntity {
            type_code: code.to_string(),
            handle,
        })
    }

    /// Employee the entity is about, if the record type names one
    pub fn primary_employee(entity: &ResolvedEntity) -> Option<EmployeeId> {
        entity
            .handle
            .as_primary_employee()
            .and_then(|capability| capability.primary_employee())
    }

    /// Stage a status write-back in `tx`; returns false when the record has no status field
    pub fn update_status(
        entity: &ResolvedEntity,
        status: &str,
        tx: &mut dyn WorkflowTransaction,
    ) -> bool {
        if entity.handle.as_status_field().is_none() {
            return false;
        }
        tx.stage_entity_status(Arc::clone(&entity.handle), status.to_string());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_tokens() {
        assert_eq!(normalize_entity_type("leave_request").unwrap(), "leave_request");
        assert_eq!(normalize_entity_type("LeaveRequest").unwrap(), "leave_request");
        assert_eq!(normalize_entity_type("expense-claim").unwrap(), "expense_claim");
        assert_eq!(normalize_entity_type(" Payroll Run ").unwrap(), "payroll__run");
        assert_eq!(normalize_entity_type("fnf").unwrap(), "fnf");
    }

    #[test]
    fn test_normalize_rejects_empty() {
        assert_eq!(
            normalize_entity_type("   "),
            Err(WorkflowError::EntityTypeRequired)
        );
        assert_eq!(
            normalize_entity_type("__"),
            Err(WorkflowError::EntityTypeRequired)
        );
    }
}
