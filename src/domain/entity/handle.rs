//! Capabilities a business entity exposes to the approval engine

use std::fmt::Debug;

use crate::domain::ids::{EmployeeId, EntityId, TenantId};

/// A business record owned by another module (leave request, expense claim, ...)
///
/// Optional capabilities are discovered through the `as_*` accessors; owning
/// modules override the ones their record supports.
pub trait EntityHandle: Send + Sync + Debug {
    fn id(&self) -> EntityId;

    /// Owning tenant; `None` for record types that are not tenant-scoped
    fn tenant_id(&self) -> Option<TenantId>;

    fn as_primary_employee(&self) -> Option<&dyn HasPrimaryEmployee> {
        None
    }

    fn as_status_field(&self) -> Option<&dyn HasStatusField> {
        None
    }
}

/// Records that name the employee the request is about
///
/// Records usually carry only one of these links; the first one set wins.
pub trait HasPrimaryEmployee: Send + Sync {
    fn employee(&self) -> Option<EmployeeId> {
        None
    }

    fn initiator(&self) -> Option<EmployeeId> {
        None
    }

    fn requester(&self) -> Option<EmployeeId> {
        None
    }

    fn primary_employee(&self) -> Option<EmployeeId> {
        self.employee()
            .or_else(|| self.initiator())
            .or_else(|| self.requester())
    }
}

/// Records with a writable status column mirrored from the workflow outcome
pub trait HasStatusField: Send + Sync {
    fn status(&self) -> String;

    fn set_status(&self, status: &str);
}
