//! In-memory employee directory

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{
    Department, DepartmentId, DomainError, Employee, EmployeeDirectory, EmployeeId, RoleId,
    RoleMembership, TenantId,
};

#[derive(Debug, Default)]
struct Directory {
    employees: HashMap<EmployeeId, Employee>,
    departments: HashMap<DepartmentId, Department>,
    memberships: Vec<RoleMembership>,
}

/// In-memory implementation of EmployeeDirectory
#[derive(Debug, Clone, Default)]
pub struct InMemoryEmployeeDirectory {
    directory: Arc<RwLock<Directory>>,
}

impl InMemoryEmployeeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_employee(&self, employee: Employee) {
        self.directory
            .write()
            .await
            .employees
            .insert(employee.id, employee);
    }

    pub async fn add_department(&self, department: Department) {
        self.directory
            .write()
            .await
            .departments
            .insert(department.id, department);
    }

    pub async fn add_membership(&self, membership: RoleMembership) {
        self.directory.write().await.memberships.push(membership);
    }
}

#[async_trait]
impl EmployeeDirectory for InMemoryEmployeeDirectory {
    async fn get_employee(&self, id: &EmployeeId) -> Result<Option<Employee>, DomainError> {
        Ok(self.directory.read().await.employees.get(id).cloned())
    }

    async fn get_department(&self, id: &DepartmentId) -> Result<Option<Department>, DomainError> {
        Ok(self.directory.read().await.departments.get(id).cloned())
    }

    async fn employees_with_role(
        &self,
        tenant_id: &TenantId,
        role_id: &RoleId,
    ) -> Result<Vec<Employee>, DomainError> {
        let directory = self.directory.read().await;
        Ok(directory
            .memberships
            .iter()
            .filter(|m| m.is_active && &m.role_id == role_id)
            .filter_map(|m| directory.employees.get(&m.employee_id))
            .filter(|e| e.is_active && e.belongs_to(tenant_id))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_role_holders_filter_inactive_and_other_tenants() {
        let directory = InMemoryEmployeeDirectory::new();
        let tenant = TenantId::new();
        let role = RoleId::new();

        let active = Employee::new(tenant, "E-1", "Active");
        let inactive = Employee::new(tenant, "E-2", "Left").with_active(false);
        let lapsed = Employee::new(tenant, "E-3", "Lapsed membership");
        let foreign = Employee::new(TenantId::new(), "E-4", "Other org");

        for employee in [&active, &inactive, &lapsed, &foreign] {
            directory.add_employee(employee.clone()).await;
            let membership = RoleMembership::new(employee.id, role);
            let membership = if employee.id == lapsed.id {
                membership.inactive()
            } else {
                membership
            };
            directory.add_membership(membership).await;
        }

        let holders = directory.employees_with_role(&tenant, &role).await.unwrap();
        assert_eq!(holders, vec![active]);
    }
}
