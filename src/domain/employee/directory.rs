//! Read-only employee directory port

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use super::entity::{Department, Employee};
use crate::domain::ids::{DepartmentId, EmployeeId, RoleId, TenantId};
use crate::domain::DomainError;

/// Lookups the approver resolver needs from the HR core
#[cfg_attr(test, automock)]
#[async_trait]
pub trait EmployeeDirectory: Send + Sync {
    /// Fetch an employee by ID regardless of tenant; callers enforce tenant checks
    async fn get_employee(&self, id: &EmployeeId) -> Result<Option<Employee>, DomainError>;

    async fn get_department(&self, id: &DepartmentId) -> Result<Option<Department>, DomainError>;

    /// Active employees of `tenant_id` holding an active membership of `role_id`
    async fn employees_with_role(
        &self,
        tenant_id: &TenantId,
        role_id: &RoleId,
    ) -> Result<Vec<Employee>, DomainError>;
}
