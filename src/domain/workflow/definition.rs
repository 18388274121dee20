//! Workflow definition (template) entity

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::ids::{DefinitionId, TenantId};
use crate::domain::DomainError;

/// Maximum length for definition codes
pub const MAX_CODE_LENGTH: usize = 50;

static CODE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]*$").unwrap());

/// Validate a definition code such as `LEAVE_REQUEST`
pub fn validate_definition_code(code: &str) -> Result<(), DomainError> {
    if code.is_empty() {
        return Err(DomainError::validation("Workflow code cannot be empty"));
    }

    if code.len() > MAX_CODE_LENGTH {
        return Err(DomainError::validation(format!(
            "Workflow code exceeds maximum length of {} characters",
            MAX_CODE_LENGTH
        )));
    }

    if !CODE_PATTERN.is_match(code) {
        return Err(DomainError::validation(format!(
            "Invalid workflow code '{}': must be alphanumeric with underscores or hyphens",
            code
        )));
    }

    Ok(())
}

/// Approval template for one entity type within a tenant
///
/// Steps are stored separately and reference the definition by ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    id: DefinitionId,
    tenant_id: TenantId,
    name: String,
    code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    /// Canonical entity-type token this definition governs
    entity_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sla_hours: Option<u32>,
    #[serde(default)]
    auto_approve_on_sla: bool,
    #[serde(default = "default_active")]
    is_active: bool,
    #[serde(default = "Utc::now")]
    created_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl WorkflowDefinition {
    pub fn new(
        tenant_id: TenantId,
        name: impl Into<String>,
        code: impl Into<String>,
        entity_type: impl Into<String>,
    ) -> Self {
        Self {
            id: DefinitionId::new(),
            tenant_id,
            name: name.into(),
            code: code.into(),
            description: None,
            entity_type: entity_type.into(),
            sla_hours: None,
            auto_approve_on_sla: false,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    // Builder methods

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_sla_hours(mut self, hours: u32) -> Self {
        self.sla_hours = Some(hours);
        self
    }

    pub fn with_auto_approve_on_sla(mut self, auto_approve: bool) -> Self {
        self.auto_approve_on_sla = auto_approve;
        self
    }

    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    // Getters

    pub fn id(&self) -> &DefinitionId {
        &self.id
    }

    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    /// Definition-level SLA used by breach detection; zero counts as unset
    pub fn sla_hours(&self) -> Option<u32> {
        self.sla_hours.filter(|hours| *hours > 0)
    }

    pub fn auto_approve_on_sla(&self) -> bool {
        self.auto_approve_on_sla
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    // Setters

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_active(&mut self, is_active: bool) {
        self.is_active = is_active;
    }

    pub fn set_sla(&mut self, sla_hours: Option<u32>, auto_approve_on_sla: bool) {
        self.sla_hours = sla_hours;
        self.auto_approve_on_sla = auto_approve_on_sla;
    }

    pub fn set_entity_type(&mut self, entity_type: impl Into<String>) {
        self.entity_type = entity_type.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_codes() {
        assert!(validate_definition_code("LEAVE_REQUEST").is_ok());
        assert!(validate_definition_code("expense-claim-v2").is_ok());
        assert!(validate_definition_code("A").is_ok());
    }

    #[test]
    fn test_invalid_codes() {
        assert!(validate_definition_code("").is_err());
        assert!(validate_definition_code("_leading").is_err());
        assert!(validate_definition_code("has space").is_err());
        assert!(validate_definition_code(&"X".repeat(MAX_CODE_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_zero_sla_counts_as_unset() {
        let tenant = TenantId::new();
        let definition =
            WorkflowDefinition::new(tenant, "Leave", "LEAVE", "leave_request").with_sla_hours(0);
        assert_eq!(definition.sla_hours(), None);

        let definition = definition.with_sla_hours(48).with_auto_approve_on_sla(true);
        assert_eq!(definition.sla_hours(), Some(48));
        assert!(definition.auto_approve_on_sla());
        assert!(definition.is_active());
    }
}
