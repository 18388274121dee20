//! HR Approvals
//!
//! A multi-tenant approval workflow engine for HR business entities:
//! - Definitions of ordered approval steps per entity type
//! - Approver resolution by manager, department head, role or fixed user
//! - Approve, reject, forward, delegate and escalate with a full audit trail
//! - SLA breach handling by auto-approval or escalation

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;
