//! Workflow step entity and approver strategies

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::WorkflowError;
use crate::domain::ids::{DefinitionId, EmployeeId, RoleId, StepId, TenantId};

/// Rule used to pick the responsible employee for a step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "approver_type", rename_all = "snake_case")]
pub enum ApproverStrategy {
    /// Direct manager of the entity's primary employee
    ReportingManager,
    /// HR manager of the entity's primary employee
    HrManager,
    /// Head of the primary employee's department
    DepartmentHead,
    /// First active holder of a role, preferring the primary employee's department
    Role { approver_role: RoleId },
    /// A fixed employee
    User { approver_user: EmployeeId },
}

impl ApproverStrategy {
    pub const REPORTING_MANAGER: &'static str = "reporting_manager";
    pub const HR_MANAGER: &'static str = "hr_manager";
    pub const DEPARTMENT_HEAD: &'static str = "department_head";
    pub const ROLE: &'static str = "role";
    pub const USER: &'static str = "user";

    /// Build a strategy from its tag and optional parameters
    ///
    /// `role` requires `approver_role`, `user` requires `approver_user`; the
    /// manager-based strategies accept neither.
    pub fn from_parts(
        tag: &str,
        approver_role: Option<RoleId>,
        approver_user: Option<EmployeeId>,
    ) -> Result<Self, WorkflowError> {
        let strategy = match tag.trim() {
            Self::REPORTING_MANAGER => Self::ReportingManager,
            Self::HR_MANAGER => Self::HrManager,
            Self::DEPARTMENT_HEAD => Self::DepartmentHead,
            Self::ROLE => {
                let approver_role = approver_role.ok_or_else(|| {
                    WorkflowError::invalid_step_config("Role approver requires approver_role")
                })?;
                if approver_user.is_some() {
                    return Err(WorkflowError::invalid_step_config(
                        "Role approver cannot also set approver_user",
                    ));
                }
                return Ok(Self::Role { approver_role });
            }
            Self::USER => {
                let approver_user = approver_user.ok_or_else(|| {
                    WorkflowError::invalid_step_config("User approver requires approver_user")
                })?;
                if approver_role.is_some() {
                    return Err(WorkflowError::invalid_step_config(
                        "User approver cannot also set approver_role",
                    ));
                }
                return Ok(Self::User { approver_user });
            }
            other => return Err(WorkflowError::unsupported_approver_type(other)),
        };

        if approver_role.is_some() || approver_user.is_some() {
            return Err(WorkflowError::invalid_step_config(format!(
                "Approver type '{}' does not take approver_role or approver_user",
                strategy.tag()
            )));
        }

        Ok(strategy)
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Self::ReportingManager => Self::REPORTING_MANAGER,
            Self::HrManager => Self::HR_MANAGER,
            Self::DepartmentHead => Self::DEPARTMENT_HEAD,
            Self::Role { .. } => Self::ROLE,
            Self::User { .. } => Self::USER,
        }
    }
}

impl fmt::Display for ApproverStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// One ordered approval gate of a definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStep {
    id: StepId,
    tenant_id: TenantId,
    definition_id: DefinitionId,
    order: u16,
    name: String,
    #[serde(flatten)]
    strategy: ApproverStrategy,
    #[serde(default)]
    is_optional: bool,
    #[serde(default = "default_true")]
    can_delegate: bool,
    /// Descriptive per-step SLA; breach detection reads the definition SLA
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sla_hours: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    escalate_to: Option<StepId>,
    #[serde(default = "default_true")]
    is_active: bool,
}

fn default_true() -> bool {
    true
}

impl WorkflowStep {
    pub fn new(
        tenant_id: TenantId,
        definition_id: DefinitionId,
        order: u16,
        name: impl Into<String>,
        strategy: ApproverStrategy,
    ) -> Self {
        Self {
            id: StepId::new(),
            tenant_id,
            definition_id,
            order,
            name: name.into(),
            strategy,
            is_optional: false,
            can_delegate: true,
            sla_hours: None,
            escalate_to: None,
            is_active: true,
        }
    }

    pub fn with_optional(mut self, is_optional: bool) -> Self {
        self.is_optional = is_optional;
        self
    }

    pub fn with_can_delegate(mut self, can_delegate: bool) -> Self {
        self.can_delegate = can_delegate;
        self
    }

    pub fn with_sla_hours(mut self, hours: u32) -> Self {
        self.sla_hours = Some(hours);
        self
    }

    pub fn with_escalate_to(mut self, step_id: StepId) -> Self {
        self.escalate_to = Some(step_id);
        self
    }

    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    pub fn id(&self) -> &StepId {
        &self.id
    }

    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    pub fn definition_id(&self) -> &DefinitionId {
        &self.definition_id
    }

    pub fn order(&self) -> u16 {
        self.order
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn strategy(&self) -> &ApproverStrategy {
        &self.strategy
    }

    pub fn is_optional(&self) -> bool {
        self.is_optional
    }

    pub fn can_delegate(&self) -> bool {
        self.can_delegate
    }

    pub fn sla_hours(&self) -> Option<u32> {
        self.sla_hours
    }

    pub fn escalate_to(&self) -> Option<&StepId> {
        self.escalate_to.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn set_active(&mut self, is_active: bool) {
        self.is_active = is_active;
    }
}

/// First active step, by order
pub fn first_active_step(steps: &[WorkflowStep]) -> Option<&WorkflowStep> {
    steps
        .iter()
        .filter(|s| s.is_active())
        .min_by_key(|s| s.order())
}

/// First active step strictly after `current_order`
pub fn next_active_step(steps: &[WorkflowStep], current_order: u16) -> Option<&WorkflowStep> {
    steps
        .iter()
        .filter(|s| s.is_active() && s.order() > current_order)
        .min_by_key(|s| s.order())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_from_parts() {
        assert_eq!(
            ApproverStrategy::from_parts("reporting_manager", None, None).unwrap(),
            ApproverStrategy::ReportingManager
        );

        let role = RoleId::new();
        assert_eq!(
            ApproverStrategy::from_parts("role", Some(role), None).unwrap(),
            ApproverStrategy::Role {
                approver_role: role
            }
        );

        let user = EmployeeId::new();
        assert_eq!(
            ApproverStrategy::from_parts("user", None, Some(user))
                .unwrap()
                .tag(),
            "user"
        );
    }

    #[test]
    fn test_strategy_unknown_tag() {
        let err = ApproverStrategy::from_parts("ceo", None, None).unwrap_err();
        assert_eq!(err, WorkflowError::unsupported_approver_type("ceo"));
    }

    #[test]
    fn test_strategy_parameter_rules() {
        assert!(matches!(
            ApproverStrategy::from_parts("role", None, None),
            Err(WorkflowError::InvalidStepConfig(_))
        ));
        assert!(matches!(
            ApproverStrategy::from_parts("user", Some(RoleId::new()), Some(EmployeeId::new())),
            Err(WorkflowError::InvalidStepConfig(_))
        ));
        assert!(matches!(
            ApproverStrategy::from_parts("hr_manager", None, Some(EmployeeId::new())),
            Err(WorkflowError::InvalidStepConfig(_))
        ));
    }

    #[test]
    fn test_step_serde_flattens_strategy() {
        let tenant = TenantId::new();
        let definition = DefinitionId::new();
        let role = RoleId::new();
        let step = WorkflowStep::new(
            tenant,
            definition,
            2,
            "Finance review",
            ApproverStrategy::Role {
                approver_role: role,
            },
        );

        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json["approver_type"], "role");
        assert_eq!(json["approver_role"], role.to_string());

        let back: WorkflowStep = serde_json::from_value(json).unwrap();
        assert_eq!(back, step);
    }

    #[test]
    fn test_active_step_navigation() {
        let tenant = TenantId::new();
        let definition = DefinitionId::new();
        let steps = vec![
            WorkflowStep::new(tenant, definition, 3, "Third", ApproverStrategy::HrManager),
            WorkflowStep::new(tenant, definition, 1, "First", ApproverStrategy::ReportingManager)
                .with_active(false),
            WorkflowStep::new(tenant, definition, 2, "Second", ApproverStrategy::DepartmentHead),
        ];

        assert_eq!(first_active_step(&steps).unwrap().order(), 2);
        assert_eq!(next_active_step(&steps, 2).unwrap().order(), 3);
        assert!(next_active_step(&steps, 3).is_none());
    }
}
