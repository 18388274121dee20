//! JSON fixture loaded into the in-memory adapters

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use crate::config::AppConfig;
use crate::domain::entity::{normalize_entity_type, EntityRegistry, EntityResolver};
use crate::domain::workflow::{
    DefinitionRepository, WorkflowDefinition, WorkflowInstance, WorkflowStep, WorkflowStore,
};
use crate::domain::{Clock, Department, Employee, EmployeeId, EntityId, RoleMembership, TenantId};
use crate::infrastructure::employee::InMemoryEmployeeDirectory;
use crate::infrastructure::entity::{EntityRecord, InMemoryEntitySource};
use crate::infrastructure::notification::TracingNotificationSink;
use crate::infrastructure::services::{EngineDependencies, SlaSweeper, WorkflowEngine};
use crate::infrastructure::workflow::{
    CachedDefinitionRepository, InMemoryDefinitionRepository, InMemoryWorkflowStore,
};

/// A business record the engine can resolve
#[derive(Debug, Clone, Deserialize)]
pub struct EntityFixture {
    pub entity_type: String,
    pub id: EntityId,
    #[serde(default)]
    pub tenant_id: Option<TenantId>,
    #[serde(default)]
    pub employee: Option<EmployeeId>,
    #[serde(default)]
    pub initiator: Option<EmployeeId>,
    #[serde(default)]
    pub requester: Option<EmployeeId>,
    #[serde(default)]
    pub status: Option<String>,
}

impl EntityFixture {
    fn into_record(self) -> EntityRecord {
        let mut record = EntityRecord::new(self.id, self.tenant_id);
        if let Some(id) = self.employee {
            record = record.with_employee(id);
        }
        if let Some(id) = self.initiator {
            record = record.with_initiator(id);
        }
        if let Some(id) = self.requester {
            record = record.with_requester(id);
        }
        if let Some(status) = self.status {
            record = record.with_status(status);
        }
        record
    }
}

/// Everything a sweep needs, as one JSON document
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Fixtures {
    pub employees: Vec<Employee>,
    pub departments: Vec<Department>,
    pub memberships: Vec<RoleMembership>,
    pub entities: Vec<EntityFixture>,
    pub definitions: Vec<WorkflowDefinition>,
    pub steps: Vec<WorkflowStep>,
    pub instances: Vec<WorkflowInstance>,
}

/// Adapters populated from a fixture, wired into a sweeper
pub struct LoadedFixtures {
    pub sweeper: SlaSweeper,
    pub store: Arc<dyn WorkflowStore>,
}

impl Fixtures {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixture {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("Invalid fixture {}", path.display()))
    }

    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        let value: serde_json::Value = serde_json::from_str(raw)?;
        if !value.is_object() {
            anyhow::bail!("Fixture must be a JSON object");
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Populate in-memory adapters and build the engine around them
    pub async fn load(
        self,
        config: &AppConfig,
        clock: Arc<dyn Clock>,
    ) -> anyhow::Result<LoadedFixtures> {
        let directory = InMemoryEmployeeDirectory::new();
        for employee in self.employees {
            directory.add_employee(employee).await;
        }
        for department in self.departments {
            directory.add_department(department).await;
        }
        for membership in self.memberships {
            directory.add_membership(membership).await;
        }

        let registry = Arc::new(Self::registry(self.entities).await?);

        let definitions = CachedDefinitionRepository::new(
            InMemoryDefinitionRepository::new(),
            Duration::from_secs(config.engine.definition_cache_ttl_secs),
            config.engine.definition_cache_capacity,
        );
        for definition in self.definitions {
            definitions.save_definition(definition).await?;
        }
        for step in self.steps {
            definitions.save_step(step).await?;
        }
        let definitions: Arc<dyn DefinitionRepository> = Arc::new(definitions);

        let store: Arc<dyn WorkflowStore> =
            Arc::new(InMemoryWorkflowStore::new().with_instances(self.instances).await);

        let engine = WorkflowEngine::new(
            EngineDependencies {
                definitions: Arc::clone(&definitions),
                store: Arc::clone(&store),
                entities: EntityResolver::new(registry),
                directory: Arc::new(directory),
                notifier: Arc::new(TracingNotificationSink),
                clock,
            },
            &config.engine,
        );

        Ok(LoadedFixtures {
            sweeper: SlaSweeper::new(
                Arc::new(engine),
                Arc::clone(&store),
                definitions,
                config.sla.clone(),
            ),
            store,
        })
    }

    /// One entity source per canonical type present in the fixture
    async fn registry(entities: Vec<EntityFixture>) -> anyhow::Result<EntityRegistry> {
        let mut registry = EntityRegistry::with_default_aliases();
        let mut sources: HashMap<String, InMemoryEntitySource> = HashMap::new();

        for entity in entities {
            let normalized = normalize_entity_type(&entity.entity_type)?;
            let code = registry.canonical(&normalized).to_string();
            sources
                .entry(code)
                .or_default()
                .insert(entity.into_record())
                .await;
        }
        for (code, source) in sources {
            registry.register(code, Arc::new(source));
        }
        Ok(registry)
    }
}
