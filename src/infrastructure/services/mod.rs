//! Infrastructure services

mod definition_service;
mod sla_sweep;
mod workflow_engine;

pub use definition_service::{CreateDefinitionRequest, CreateStepRequest, DefinitionService};
pub use sla_sweep::{SlaSweeper, SweepReport};
pub use workflow_engine::{EngineDependencies, WorkflowEngine, SLA_BREACH_REASON};
