//! Approver resolution for workflow steps

use std::sync::Arc;

use tracing::debug;

use super::error::WorkflowError;
use super::step::{ApproverStrategy, WorkflowStep};
use crate::domain::employee::{Employee, EmployeeDirectory};
use crate::domain::entity::{EntityResolver, ResolvedEntity};
use crate::domain::ids::{EmployeeId, RoleId, TenantId};

/// Picks the employee responsible for a step
///
/// `Ok(None)` is an expected outcome: the step has no human gate and the
/// engine auto-completes it. A fixed approver that cannot be found is an
/// error instead.
#[derive(Clone)]
pub struct ApproverResolver {
    directory: Arc<dyn EmployeeDirectory>,
}

impl std::fmt::Debug for ApproverResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApproverResolver").finish_non_exhaustive()
    }
}

impl ApproverResolver {
    pub fn new(directory: Arc<dyn EmployeeDirectory>) -> Self {
        Self { directory }
    }

    /// Resolve the approver of `step` for `entity` within `tenant_id`
    ///
    /// The subject of the manager-based strategies is the entity's primary
    /// employee, or `initiator` when no entity is supplied.
    pub async fn resolve(
        &self,
        step: &WorkflowStep,
        entity: Option<&ResolvedEntity>,
        initiator: Option<&EmployeeId>,
        tenant_id: &TenantId,
    ) -> Result<Option<Employee>, WorkflowError> {
        let subject_id = match entity {
            Some(entity) => EntityResolver::primary_employee(entity),
            None => initiator.copied(),
        };
        let subject = match subject_id {
            Some(id) => self.directory.get_employee(&id).await?,
            None => None,
        };

        let candidate = match step.strategy() {
            ApproverStrategy::ReportingManager => {
                self.lookup(subject.as_ref().and_then(|e| e.reporting_manager_id))
                    .await?
            }
            ApproverStrategy::HrManager => {
                self.lookup(subject.as_ref().and_then(|e| e.hr_manager_id))
                    .await?
            }
            ApproverStrategy::DepartmentHead => self.department_head(subject.as_ref()).await?,
            ApproverStrategy::Role { approver_role } => {
                self.role_holder(approver_role, subject.as_ref(), tenant_id)
                    .await?
            }
            ApproverStrategy::User { approver_user } => Some(
                self.directory
                    .get_employee(approver_user)
                    .await?
                    .ok_or_else(|| WorkflowError::unknown_employee(approver_user))?,
            ),
        };

        if let Some(approver) = &candidate {
            if !approver.belongs_to(tenant_id) {
                return Err(WorkflowError::cross_tenant_approver(approver.id));
            }
        }

        debug!(
            step = step.order(),
            strategy = %step.strategy(),
            approver = ?candidate.as_ref().map(|e| e.id),
            "Resolved step approver"
        );

        Ok(candidate)
    }

    /// Direct manager of `employee_id`, used as the escalation fallback
    pub async fn manager_of(
        &self,
        employee_id: &EmployeeId,
    ) -> Result<Option<Employee>, WorkflowError> {
        let employee = self.directory.get_employee(employee_id).await?;
        self.lookup(employee.and_then(|e| e.reporting_manager_id))
            .await
    }

    async fn lookup(&self, id: Option<EmployeeId>) -> Result<Option<Employee>, WorkflowError> {
        match id {
            Some(id) => Ok(self.directory.get_employee(&id).await?),
            None => Ok(None),
        }
    }

    async fn department_head(
        &self,
        subject: Option<&Employee>,
    ) -> Result<Option<Employee>, WorkflowError> {
        let Some(department_id) = subject.and_then(|e| e.department_id) else {
            return Ok(None);
        };
        let department = self.directory.get_department(&department_id).await?;
        self.lookup(department.and_then(|d| d.head_id)).await
    }

    async fn role_holder(
        &self,
        role_id: &RoleId,
        subject: Option<&Employee>,
        tenant_id: &TenantId,
    ) -> Result<Option<Employee>, WorkflowError> {
        let mut holders: Vec<Employee> = self
            .directory
            .employees_with_role(tenant_id, role_id)
            .await?
            .into_iter()
            .filter(|e| e.is_active && e.belongs_to(tenant_id))
            .collect();

        if let Some(department_id) = subject.and_then(|e| e.department_id) {
            holders.retain(|e| e.department_id == Some(department_id));
        }

        // First by employee number; deterministic, not a ranking
        holders.sort_by(|a, b| {
            a.employee_code
                .cmp(&b.employee_code)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(holders.into_iter().next())
    }
}
