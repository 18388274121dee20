//! Infrastructure layer - Adapters, services and process setup

pub mod employee;
pub mod entity;
pub mod logging;
pub mod metrics;
pub mod notification;
pub mod services;
pub mod workflow;

pub use logging::init_logging;
