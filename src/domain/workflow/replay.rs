//! Rebuild instance state from its audit log

use super::action::{ActionKind, WorkflowAction};
use super::instance::InstanceStatus;

/// Status and step derived from an ordered action log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayedState {
    pub status: InstanceStatus,
    pub current_step: u16,
}

/// Fold `actions` (ordered as the store returns them) into a state
///
/// `active_step_orders` are the orders of the definition's active steps and
/// decide where an `approved` entry moves the instance. Returns `None` for an
/// empty log.
pub fn replay(actions: &[WorkflowAction], active_step_orders: &[u16]) -> Option<ReplayedState> {
    let mut state: Option<ReplayedState> = None;

    for action in actions {
        let current = state.unwrap_or(ReplayedState {
            status: InstanceStatus::IN_PROGRESS,
            current_step: action.step(),
        });

        let next = match action.action() {
            ActionKind::Started => ReplayedState {
                status: InstanceStatus::IN_PROGRESS,
                current_step: action.step(),
            },
            ActionKind::Approved => {
                let next_order = active_step_orders
                    .iter()
                    .copied()
                    .filter(|order| *order > action.step())
                    .min();
                match next_order {
                    Some(order) => ReplayedState {
                        status: InstanceStatus::IN_PROGRESS,
                        current_step: order,
                    },
                    None => ReplayedState {
                        status: InstanceStatus::Approved,
                        current_step: action.step(),
                    },
                }
            }
            ActionKind::Rejected | ActionKind::AutoRejected => ReplayedState {
                status: InstanceStatus::Rejected,
                current_step: action.step(),
            },
            ActionKind::AutoApproved => ReplayedState {
                status: InstanceStatus::Approved,
                current_step: action.step(),
            },
            ActionKind::Escalated => ReplayedState {
                status: InstanceStatus::ESCALATED,
                current_step: current.current_step,
            },
            ActionKind::Forwarded | ActionKind::Delegated => current,
        };

        state = Some(next);
    }

    state
}
