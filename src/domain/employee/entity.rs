//! Employee, department and role membership records

use serde::{Deserialize, Serialize};

use crate::domain::ids::{DepartmentId, EmployeeId, RoleId, TenantId};

/// An employee as seen by the approval engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub tenant_id: TenantId,
    /// Human-facing employee number, used as the deterministic tie-break for role lookups
    pub employee_code: String,
    pub full_name: String,
    #[serde(default)]
    pub department_id: Option<DepartmentId>,
    #[serde(default)]
    pub reporting_manager_id: Option<EmployeeId>,
    #[serde(default)]
    pub hr_manager_id: Option<EmployeeId>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl Employee {
    pub fn new(
        tenant_id: TenantId,
        employee_code: impl Into<String>,
        full_name: impl Into<String>,
    ) -> Self {
        Self {
            id: EmployeeId::new(),
            tenant_id,
            employee_code: employee_code.into(),
            full_name: full_name.into(),
            department_id: None,
            reporting_manager_id: None,
            hr_manager_id: None,
            is_active: true,
        }
    }

    pub fn with_department(mut self, department_id: DepartmentId) -> Self {
        self.department_id = Some(department_id);
        self
    }

    pub fn with_reporting_manager(mut self, manager_id: EmployeeId) -> Self {
        self.reporting_manager_id = Some(manager_id);
        self
    }

    pub fn with_hr_manager(mut self, hr_manager_id: EmployeeId) -> Self {
        self.hr_manager_id = Some(hr_manager_id);
        self
    }

    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    pub fn belongs_to(&self, tenant_id: &TenantId) -> bool {
        &self.tenant_id == tenant_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: DepartmentId,
    pub tenant_id: TenantId,
    pub name: String,
    #[serde(default)]
    pub head_id: Option<EmployeeId>,
}

impl Department {
    pub fn new(tenant_id: TenantId, name: impl Into<String>) -> Self {
        Self {
            id: DepartmentId::new(),
            tenant_id,
            name: name.into(),
            head_id: None,
        }
    }

    pub fn with_head(mut self, head_id: EmployeeId) -> Self {
        self.head_id = Some(head_id);
        self
    }
}

/// Assignment of a role to an employee's user account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleMembership {
    pub employee_id: EmployeeId,
    pub role_id: RoleId,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl RoleMembership {
    pub fn new(employee_id: EmployeeId, role_id: RoleId) -> Self {
        Self {
            employee_id,
            role_id,
            is_active: true,
        }
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_employee_builder() {
        let tenant = TenantId::new();
        let manager = EmployeeId::new();
        let department = DepartmentId::new();

        let employee = Employee::new(tenant, "E-001", "Asha Rao")
            .with_department(department)
            .with_reporting_manager(manager);

        assert!(employee.belongs_to(&tenant));
        assert!(!employee.belongs_to(&TenantId::new()));
        assert_eq!(employee.reporting_manager_id, Some(manager));
        assert_eq!(employee.department_id, Some(department));
        assert!(employee.hr_manager_id.is_none());
        assert!(employee.is_active);
    }

    #[test]
    fn test_employee_deserialize_defaults() {
        let tenant = TenantId::new();
        let id = EmployeeId::new();
        let json = format!(
            r#"{{"id":"{}","tenant_id":"{}","employee_code":"E-9","full_name":"Kim"}}"#,
            id, tenant
        );
        let employee: Employee = serde_json::from_str(&json).unwrap();
        assert_eq!(employee.id, id);
        assert!(employee.is_active);
        assert!(employee.department_id.is_none());
    }
}
