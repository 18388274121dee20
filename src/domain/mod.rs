//! Domain layer - approval workflow entities, ports and resolvers

pub mod clock;
pub mod employee;
pub mod entity;
pub mod error;
pub mod ids;
pub mod notification;
pub mod workflow;

pub use clock::{Clock, FixedClock, SystemClock};
pub use employee::{Department, Employee, EmployeeDirectory, RoleMembership};
pub use entity::{
    EntityHandle, EntityRegistry, EntityResolver, EntitySource, HasPrimaryEmployee,
    HasStatusField, ResolvedEntity,
};
pub use error::DomainError;
pub use ids::{
    ActionId, DefinitionId, DepartmentId, EmployeeId, EntityId, InstanceId, RoleId, StepId,
    TenantId,
};
pub use notification::{Notification, NotificationSink, WorkflowEvent};
pub use workflow::{
    ActionKind, ActionRequest, Actor, ApproverResolver, ApproverStrategy, DefinitionRepository,
    InstanceStatus, RequestedAction, WorkflowAction, WorkflowDefinition, WorkflowError,
    WorkflowInstance, WorkflowStep, WorkflowStore, WorkflowTransaction,
};
