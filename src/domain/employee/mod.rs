//! Employee directory domain module
//!
//! The engine never owns employee records; it reads reporting lines, departments
//! and role memberships through [`EmployeeDirectory`] when resolving approvers.

mod directory;
mod entity;

pub use directory::EmployeeDirectory;
pub use entity::{Department, Employee, RoleMembership};

#[cfg(test)]
pub use directory::MockEmployeeDirectory;
