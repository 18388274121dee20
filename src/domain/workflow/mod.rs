//! Approval workflow domain module
//!
//! A [`WorkflowDefinition`] is a per-tenant template for one entity type with
//! ordered [`WorkflowStep`]s. Each running approval is a [`WorkflowInstance`]
//! whose every transition appends one [`WorkflowAction`] to its audit log.

mod action;
mod approver;
mod definition;
mod error;
mod instance;
mod replay;
pub mod repository;
mod step;

pub use action::{ActionKind, ActionRequest, Actor, RequestedAction, WorkflowAction};
pub use approver::ApproverResolver;
pub use definition::{validate_definition_code, WorkflowDefinition, MAX_CODE_LENGTH};
pub use error::WorkflowError;
pub use instance::{InstanceStatus, WorkflowInstance};
pub use replay::{replay, ReplayedState};
pub use repository::{DefinitionRepository, WorkflowStore, WorkflowTransaction};
pub use step::{first_active_step, next_active_step, ApproverStrategy, WorkflowStep};
