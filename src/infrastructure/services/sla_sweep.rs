//! SLA sweep - finds overdue instances and hands them to the engine

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::workflow_engine::WorkflowEngine;
use crate::config::SlaConfig;
use crate::domain::workflow::{DefinitionRepository, InstanceStatus, WorkflowInstance, WorkflowStore};
use crate::domain::DomainError;
use crate::infrastructure::metrics;

/// Outcome of one sweep run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Instances eligible for a deadline check
    pub checked: usize,
    /// Instances past their deadline
    pub breached: usize,
    /// Breaches the engine refused to handle
    pub failed: usize,
}

/// Periodic SLA check, driven by an external timer
pub struct SlaSweeper {
    engine: Arc<WorkflowEngine>,
    store: Arc<dyn WorkflowStore>,
    definitions: Arc<dyn DefinitionRepository>,
    config: SlaConfig,
}

impl std::fmt::Debug for SlaSweeper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlaSweeper")
            .field("config", &self.config)
            .finish()
    }
}

impl SlaSweeper {
    pub fn new(
        engine: Arc<WorkflowEngine>,
        store: Arc<dyn WorkflowStore>,
        definitions: Arc<dyn DefinitionRepository>,
        config: SlaConfig,
    ) -> Self {
        Self {
            engine,
            store,
            definitions,
            config,
        }
    }

    /// Check every active instance against `now` and handle the breaches
    ///
    /// One failing instance does not stop the sweep; only a failure to list
    /// instances is returned as an error.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<SweepReport, DomainError> {
        let started = Instant::now();
        let mut report = SweepReport::default();

        for instance in self.store.list_active_instances().await? {
            if !self.eligible(&instance) {
                continue;
            }
            report.checked += 1;

            match self.is_overdue(&instance, now).await {
                Ok(false) => continue,
                Ok(true) => report.breached += 1,
                Err(e) => {
                    report.failed += 1;
                    warn!(instance_id = %instance.id(), error = %e, "SLA check failed");
                    continue;
                }
            }

            match self.engine.handle_sla_breach(instance.id()).await {
                Ok(handled) => info!(
                    tenant_id = %handled.tenant_id(),
                    instance_id = %handled.id(),
                    status = %handled.status(),
                    "SLA breach handled"
                ),
                Err(e) => {
                    report.failed += 1;
                    warn!(instance_id = %instance.id(), error = %e, "Failed to handle SLA breach");
                }
            }
        }

        metrics::record_sweep(started.elapsed(), report.breached, report.failed);
        info!(
            checked = report.checked,
            breached = report.breached,
            failed = report.failed,
            "SLA sweep finished"
        );
        Ok(report)
    }

    fn eligible(&self, instance: &WorkflowInstance) -> bool {
        match instance.status() {
            InstanceStatus::Active { escalated: false } => true,
            InstanceStatus::Active { escalated: true } => self.config.sweep_escalated,
            _ => false,
        }
    }

    async fn is_overdue(
        &self,
        instance: &WorkflowInstance,
        now: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        let Some(definition_id) = instance.definition_id() else {
            return Ok(false);
        };
        let sla_hours = self
            .definitions
            .get(instance.tenant_id(), definition_id)
            .await?
            .and_then(|d| d.sla_hours());

        Ok(sla_hours.is_some_and(|hours| instance.sla_deadline(hours) <= now))
    }
}
