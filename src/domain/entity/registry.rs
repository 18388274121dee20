//! Static registry mapping entity-type tokens to lookup sources

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use super::handle::EntityHandle;
use crate::domain::ids::{EntityId, TenantId};
use crate::domain::DomainError;

/// Entity types the platform's modules provide approval flows for
pub const KNOWN_ENTITY_TYPES: &[&str] = &[
    "leave_request",
    "payroll_run",
    "employee_transfer",
    "employee_promotion",
    "employee_loan",
    "reimbursement",
    "expense_claim",
    "resignation_request",
    "meeting",
    "full_final_settlement",
    "ai_decision",
];

/// Short tokens accepted in place of the canonical code
pub const DEFAULT_ALIASES: &[(&str, &str)] = &[
    ("loan", "employee_loan"),
    ("expense", "expense_claim"),
    ("fnf", "full_final_settlement"),
];

/// Tenant-scoped lookup for one concrete entity type, provided by its owning module
#[async_trait]
pub trait EntitySource: Send + Sync + fmt::Debug {
    /// Find `id` within `tenant_id`; `Ok(None)` when no such row is visible
    async fn lookup(
        &self,
        tenant_id: &TenantId,
        id: &EntityId,
    ) -> Result<Option<Arc<dyn EntityHandle>>, DomainError>;
}

/// Registry populated once at startup
#[derive(Debug, Default, Clone)]
pub struct EntityRegistry {
    sources: HashMap<String, Arc<dyn EntitySource>>,
    aliases: HashMap<String, String>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the default alias table installed
    pub fn with_default_aliases() -> Self {
        let mut registry = Self::new();
        for (alias, code) in DEFAULT_ALIASES {
            registry.alias(*alias, *code);
        }
        registry
    }

    pub fn register(&mut self, code: impl Into<String>, source: Arc<dyn EntitySource>) -> &mut Self {
        self.sources.insert(code.into(), source);
        self
    }

    pub fn alias(&mut self, alias: impl Into<String>, code: impl Into<String>) -> &mut Self {
        self.aliases.insert(alias.into(), code.into());
        self
    }

    /// Canonical code for a normalised token
    pub fn canonical<'a>(&'a self, token: &'a str) -> &'a str {
        self.aliases.get(token).map(String::as_str).unwrap_or(token)
    }

    /// Source registered for a normalised token, following aliases
    pub fn source(&self, token: &str) -> Option<(&str, &Arc<dyn EntitySource>)> {
        let code = self.canonical(token);
        self.sources
            .get_key_value(code)
            .map(|(code, source)| (code.as_str(), source))
    }

    /// Every accepted token (registered codes plus aliases that point at one)
    pub fn supported_types(&self) -> Vec<String> {
        let mut tokens: Vec<String> = self.sources.keys().cloned().collect();
        tokens.extend(
            self.aliases
                .iter()
                .filter(|(_, code)| self.sources.contains_key(*code))
                .map(|(alias, _)| alias.clone()),
        );
        tokens.sort();
        tokens
    }

    /// Alias table grouped by canonical code
    pub fn aliases_by_code(&self) -> BTreeMap<String, Vec<String>> {
        let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (alias, code) in &self.aliases {
            grouped.entry(code.clone()).or_default().push(alias.clone());
        }
        for aliases in grouped.values_mut() {
            aliases.sort();
        }
        grouped
    }
}
