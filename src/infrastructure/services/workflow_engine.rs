//! Workflow engine - start, act on, escalate and auto-complete approval instances

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::domain::entity::{EntityResolver, ResolvedEntity};
use crate::domain::notification::{Notification, NotificationSink, WorkflowEvent, WORKFLOW_INSTANCE_ENTITY};
use crate::domain::workflow::{
    first_active_step, next_active_step, replay, ActionKind, ActionRequest, Actor,
    ApproverResolver, DefinitionRepository, ReplayedState, RequestedAction, WorkflowAction,
    WorkflowDefinition, WorkflowError, WorkflowInstance, WorkflowStep, WorkflowStore,
    WorkflowTransaction,
};
use crate::domain::{Clock, Employee, EmployeeDirectory, EmployeeId, EntityId, InstanceId, TenantId};
use crate::infrastructure::metrics;

const STARTED_COMMENT: &str = "Workflow initiated";
const FORWARDED_COMMENT: &str = "Forwarded approval";
const DELEGATED_COMMENT: &str = "Delegated approval";
const AUTO_COMPLETION_COMMENT: &str = "Auto completion";
const COMPLETED_COMMENT: &str = "Workflow completed";

/// Reason recorded when the SLA sweep escalates an instance
pub const SLA_BREACH_REASON: &str = "SLA breach";

/// Collaborators the engine is wired with
pub struct EngineDependencies {
    pub definitions: Arc<dyn DefinitionRepository>,
    pub store: Arc<dyn WorkflowStore>,
    pub entities: EntityResolver,
    pub directory: Arc<dyn EmployeeDirectory>,
    pub notifier: Arc<dyn NotificationSink>,
    pub clock: Arc<dyn Clock>,
}

/// A notification queued during a transition and sent after commit
#[derive(Debug)]
struct Outgoing {
    event: WorkflowEvent,
    recipients: Vec<EmployeeId>,
    context: Map<String, Value>,
}

impl Outgoing {
    fn new(event: WorkflowEvent, recipients: impl IntoIterator<Item = Option<EmployeeId>>) -> Self {
        let mut unique: Vec<EmployeeId> = Vec::new();
        for recipient in recipients.into_iter().flatten() {
            if !unique.contains(&recipient) {
                unique.push(recipient);
            }
        }
        Self {
            event,
            recipients: unique,
            context: Map::new(),
        }
    }

    fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.context.insert(key.to_string(), value.into());
        self
    }
}

/// Definition and steps an instance runs against
struct Plan {
    definition: Option<WorkflowDefinition>,
    steps: Vec<WorkflowStep>,
}

impl Plan {
    fn name(&self) -> Option<&str> {
        self.definition.as_ref().map(|d| d.name())
    }

    fn step_at(&self, order: u16) -> Option<&WorkflowStep> {
        self.steps.iter().find(|s| s.order() == order)
    }
}

/// Orchestrates every workflow state transition
///
/// Each mutating call commits the instance change, its audit rows and the
/// entity status write-back in one transaction, then sends notifications.
pub struct WorkflowEngine {
    definitions: Arc<dyn DefinitionRepository>,
    store: Arc<dyn WorkflowStore>,
    entities: EntityResolver,
    approvers: ApproverResolver,
    directory: Arc<dyn EmployeeDirectory>,
    notifier: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
    subject_prefix: String,
}

impl std::fmt::Debug for WorkflowEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowEngine")
            .field("subject_prefix", &self.subject_prefix)
            .finish()
    }
}

impl WorkflowEngine {
    pub fn new(deps: EngineDependencies, config: &EngineConfig) -> Self {
        Self {
            approvers: ApproverResolver::new(Arc::clone(&deps.directory)),
            definitions: deps.definitions,
            store: deps.store,
            entities: deps.entities,
            directory: deps.directory,
            notifier: deps.notifier,
            clock: deps.clock,
            subject_prefix: config.notification_subject_prefix.clone(),
        }
    }

    /// Start the active workflow defined for `entity_type` on one entity
    pub async fn start(
        &self,
        tenant_id: &TenantId,
        entity_type: &str,
        entity_id: &EntityId,
        initiator: Option<&EmployeeId>,
    ) -> Result<WorkflowInstance, WorkflowError> {
        let entity = self.entities.resolve(tenant_id, entity_type, entity_id).await?;
        let definition = self
            .definitions
            .find_active_for_entity_type(tenant_id, &entity.type_code)
            .await?
            .ok_or_else(|| WorkflowError::no_workflow_defined(entity_type))?;

        self.start_instance(definition, entity, initiator).await
    }

    /// Start a specific definition for an entity the caller already holds
    pub async fn start_by_definition_code(
        &self,
        entity: ResolvedEntity,
        definition_code: &str,
        tenant_id: &TenantId,
        initiator: Option<&EmployeeId>,
    ) -> Result<WorkflowInstance, WorkflowError> {
        if entity.handle.tenant_id().is_some_and(|owner| &owner != tenant_id) {
            return Err(WorkflowError::entity_not_found(&entity.type_code, entity.id()));
        }

        let definition = self
            .definitions
            .find_active_by_code(tenant_id, definition_code)
            .await?
            .ok_or_else(|| WorkflowError::definition_not_found(definition_code))?;

        self.start_instance(definition, entity, initiator).await
    }

    /// Approve, reject, forward or delegate on behalf of `actor`
    pub async fn take_action(
        &self,
        instance_id: &InstanceId,
        actor: &Actor,
        request: ActionRequest,
    ) -> Result<WorkflowInstance, WorkflowError> {
        let instance = self.load(instance_id).await?;

        if actor.tenant_id() != instance.tenant_id() {
            return Err(WorkflowError::CrossTenantActor);
        }
        if !instance.is_active() {
            return Err(WorkflowError::not_active(instance.status()));
        }
        if matches!(request.kind, RequestedAction::Approve | RequestedAction::Reject)
            && !actor.superuser
            && instance
                .current_approver()
                .is_some_and(|approver| approver != actor.id())
        {
            return Err(WorkflowError::NotAssignedApprover);
        }
        request.validate()?;

        match request.kind {
            RequestedAction::Approve => self.approve(instance, actor, request.comments).await,
            RequestedAction::Reject => self.reject(instance, actor, request.comments).await,
            RequestedAction::Forward | RequestedAction::Delegate => {
                self.reassign(instance, actor, request).await
            }
        }
    }

    /// Hand the current step to a higher authority without changing its order
    pub async fn escalate(
        &self,
        instance_id: &InstanceId,
        actor: Option<&Actor>,
        reason: &str,
        target: Option<&EmployeeId>,
    ) -> Result<WorkflowInstance, WorkflowError> {
        let instance = self.load(instance_id).await?;

        if actor.is_some_and(|a| a.tenant_id() != instance.tenant_id()) {
            return Err(WorkflowError::CrossTenantActor);
        }
        if !instance.is_active() {
            return Err(WorkflowError::not_active(instance.status()));
        }

        let plan = self.plan(&instance).await?;
        self.escalate_loaded(instance, &plan, actor.map(|a| *a.id()), reason, target)
            .await
    }

    /// Apply the definition's SLA policy to an overdue instance
    ///
    /// Deadline checks belong to the caller; this only decides between
    /// auto-approval and escalation.
    pub async fn handle_sla_breach(
        &self,
        instance_id: &InstanceId,
    ) -> Result<WorkflowInstance, WorkflowError> {
        let instance = self.load(instance_id).await?;
        if !instance.is_active() {
            return Err(WorkflowError::not_active(instance.status()));
        }

        let plan = self.plan(&instance).await?;
        let Some(definition) = plan.definition.as_ref() else {
            debug!(instance_id = %instance_id, "SLA breach ignored: no definition");
            return Ok(instance);
        };
        if definition.sla_hours().is_none() {
            debug!(instance_id = %instance_id, "SLA breach ignored: no SLA configured");
            return Ok(instance);
        }

        if definition.auto_approve_on_sla() {
            metrics::record_sla_breach(true);
            self.auto_complete(instance, &plan).await
        } else {
            metrics::record_sla_breach(false);
            self.escalate_loaded(instance, &plan, None, SLA_BREACH_REASON, None)
                .await
        }
    }

    /// Instance by ID, visible only within its tenant
    pub async fn get_instance(
        &self,
        tenant_id: &TenantId,
        instance_id: &InstanceId,
    ) -> Result<WorkflowInstance, WorkflowError> {
        self.store
            .get_instance_for_tenant(tenant_id, instance_id)
            .await?
            .ok_or_else(|| WorkflowError::instance_not_found(instance_id))
    }

    /// Audit trail of an instance in log order
    pub async fn history(
        &self,
        tenant_id: &TenantId,
        instance_id: &InstanceId,
    ) -> Result<Vec<WorkflowAction>, WorkflowError> {
        Ok(self.store.list_actions(tenant_id, instance_id).await?)
    }

    /// Rebuild status and step from the audit trail alone
    pub async fn replay_history(
        &self,
        tenant_id: &TenantId,
        instance_id: &InstanceId,
    ) -> Result<Option<ReplayedState>, WorkflowError> {
        let instance = self.get_instance(tenant_id, instance_id).await?;
        let plan = self.plan(&instance).await?;
        let orders: Vec<u16> = plan
            .steps
            .iter()
            .filter(|s| s.is_active())
            .map(|s| s.order())
            .collect();
        let actions = self.history(tenant_id, instance_id).await?;
        Ok(replay(&actions, &orders))
    }

    // ------------------------------------------------------------ transitions

    async fn start_instance(
        &self,
        definition: WorkflowDefinition,
        entity: ResolvedEntity,
        initiator: Option<&EmployeeId>,
    ) -> Result<WorkflowInstance, WorkflowError> {
        let tenant_id = *definition.tenant_id();
        if let Some(id) = initiator {
            self.check_initiator(id, &tenant_id).await?;
        }

        let now = self.clock.now();
        let steps = self.definitions.list_steps(&tenant_id, definition.id()).await?;
        let first_step = first_active_step(&steps);

        let approver = match first_step {
            Some(step) => {
                self.approvers
                    .resolve(step, Some(&entity), initiator, &tenant_id)
                    .await?
            }
            None => None,
        };

        let mut instance = WorkflowInstance::new(
            tenant_id,
            Some(*definition.id()),
            entity.type_code.clone(),
            entity.id(),
            first_step.map_or(0, |s| s.order()),
            now,
            initiator.copied(),
        );

        let mut tx = self.store.begin().await?;
        let mut recorded = Vec::new();

        if first_step.is_some() {
            recorded.push(self.record(
                tx.as_mut(),
                &instance,
                initiator.copied(),
                ActionKind::Started,
                STARTED_COMMENT,
                now,
            ));
        }

        let outgoing = match (first_step, approver) {
            (Some(step), Some(approver)) => {
                instance.assign(approver.id);
                Outgoing::new(WorkflowEvent::Started, [Some(approver.id), initiator.copied()])
                    .with("step", step.name())
            }
            _ => {
                recorded.push(self.record(
                    tx.as_mut(),
                    &instance,
                    None,
                    ActionKind::AutoApproved,
                    AUTO_COMPLETION_COMMENT,
                    now,
                ));
                instance.complete(true, now);
                EntityResolver::update_status(&entity, instance.status().as_str(), tx.as_mut());
                Outgoing::new(
                    WorkflowEvent::Completed,
                    [EntityResolver::primary_employee(&entity), initiator.copied()],
                )
            }
        };

        tx.insert_instance(instance.clone());
        self.commit(tx, instance.id()).await?;
        self.committed(&instance, &recorded);
        self.dispatch(&instance, Some(definition.name()), outgoing).await;

        Ok(instance)
    }

    async fn approve(
        &self,
        mut instance: WorkflowInstance,
        actor: &Actor,
        comments: String,
    ) -> Result<WorkflowInstance, WorkflowError> {
        let now = self.clock.now();
        let entity = self.resolve_entity(&instance).await?;
        let plan = self.plan(&instance).await?;

        let next_step = next_active_step(&plan.steps, instance.current_step());
        let next_approver = match next_step {
            Some(step) => {
                self.approvers
                    .resolve(step, Some(&entity), instance.created_by(), instance.tenant_id())
                    .await?
            }
            None => None,
        };

        let expected_version = instance.next_version();
        let mut tx = self.store.begin().await?;
        let mut recorded = Vec::new();

        let outgoing = match (next_step, next_approver) {
            (Some(step), Some(approver)) => {
                recorded.push(self.record(
                    tx.as_mut(),
                    &instance,
                    Some(*actor.id()),
                    ActionKind::Approved,
                    comments,
                    now,
                ));
                instance.advance(step.order(), Some(approver.id));
                Outgoing::new(WorkflowEvent::StepAssigned, [Some(approver.id)])
                    .with("step", step.name())
            }
            (Some(step), None) => {
                recorded.push(self.record(
                    tx.as_mut(),
                    &instance,
                    Some(*actor.id()),
                    ActionKind::Approved,
                    comments,
                    now,
                ));
                instance.advance(step.order(), None);
                recorded.push(self.record(
                    tx.as_mut(),
                    &instance,
                    None,
                    ActionKind::AutoApproved,
                    AUTO_COMPLETION_COMMENT,
                    now,
                ));
                self.finish(&mut instance, &entity, true, now, tx.as_mut(), Some(*actor.id()))
            }
            (None, _) => {
                let comments = if comments.trim().is_empty() {
                    COMPLETED_COMMENT.to_string()
                } else {
                    comments
                };
                recorded.push(self.record(
                    tx.as_mut(),
                    &instance,
                    Some(*actor.id()),
                    ActionKind::Approved,
                    comments,
                    now,
                ));
                self.finish(&mut instance, &entity, true, now, tx.as_mut(), Some(*actor.id()))
            }
        };

        tx.update_instance(instance.clone(), expected_version);
        self.commit(tx, instance.id()).await?;
        self.committed(&instance, &recorded);
        self.dispatch(&instance, plan.name(), outgoing).await;

        Ok(instance)
    }

    async fn reject(
        &self,
        mut instance: WorkflowInstance,
        actor: &Actor,
        comments: String,
    ) -> Result<WorkflowInstance, WorkflowError> {
        let now = self.clock.now();
        let entity = self.resolve_entity(&instance).await?;
        let plan = self.plan(&instance).await?;

        let expected_version = instance.next_version();
        let mut tx = self.store.begin().await?;
        let recorded = vec![self.record(
            tx.as_mut(),
            &instance,
            Some(*actor.id()),
            ActionKind::Rejected,
            comments.clone(),
            now,
        )];
        let outgoing = self
            .finish(&mut instance, &entity, false, now, tx.as_mut(), Some(*actor.id()))
            .with("comments", comments);

        tx.update_instance(instance.clone(), expected_version);
        self.commit(tx, instance.id()).await?;
        self.committed(&instance, &recorded);
        self.dispatch(&instance, plan.name(), outgoing).await;

        Ok(instance)
    }

    /// Forward or delegate: new approver, same step
    async fn reassign(
        &self,
        mut instance: WorkflowInstance,
        actor: &Actor,
        request: ActionRequest,
    ) -> Result<WorkflowInstance, WorkflowError> {
        let (kind, target, default_comment, context_key) = match request.kind {
            RequestedAction::Forward => (
                ActionKind::Forwarded,
                request.forward_to.ok_or(WorkflowError::MissingForwardTarget)?,
                FORWARDED_COMMENT,
                "forwarded_by",
            ),
            _ => (
                ActionKind::Delegated,
                request.delegate_to.ok_or(WorkflowError::MissingDelegateTarget)?,
                DELEGATED_COMMENT,
                "delegated_by",
            ),
        };

        let plan = self.plan(&instance).await?;
        if kind == ActionKind::Delegated {
            if let Some(step) = plan.step_at(instance.current_step()) {
                if !step.can_delegate() {
                    return Err(WorkflowError::DelegationNotAllowed(step.name().to_string()));
                }
            }
        }

        let target = self.tenant_employee(&target, instance.tenant_id()).await?;
        let comments = if request.comments.trim().is_empty() {
            default_comment.to_string()
        } else {
            request.comments
        };

        let now = self.clock.now();
        let expected_version = instance.next_version();
        let mut tx = self.store.begin().await?;
        let recorded = vec![self.record(
            tx.as_mut(),
            &instance,
            Some(*actor.id()),
            kind,
            comments,
            now,
        )];
        instance.reassign(target.id);

        tx.update_instance(instance.clone(), expected_version);
        self.commit(tx, instance.id()).await?;
        self.committed(&instance, &recorded);

        let outgoing = Outgoing::new(WorkflowEvent::StepAssigned, [Some(target.id)])
            .with(context_key, actor.employee.full_name.clone());
        self.dispatch(&instance, plan.name(), outgoing).await;

        Ok(instance)
    }

    async fn escalate_loaded(
        &self,
        mut instance: WorkflowInstance,
        plan: &Plan,
        actor: Option<EmployeeId>,
        reason: &str,
        target: Option<&EmployeeId>,
    ) -> Result<WorkflowInstance, WorkflowError> {
        let target = match target {
            Some(id) => self.tenant_employee(id, instance.tenant_id()).await?,
            None => self
                .escalation_target(&instance, plan)
                .await?
                .ok_or(WorkflowError::NoEscalationTarget)?,
        };

        let now = self.clock.now();
        let expected_version = instance.next_version();
        let mut tx = self.store.begin().await?;
        let recorded = vec![self.record(
            tx.as_mut(),
            &instance,
            actor,
            ActionKind::Escalated,
            reason,
            now,
        )];
        instance.escalate(target.id);

        tx.update_instance(instance.clone(), expected_version);
        self.commit(tx, instance.id()).await?;
        self.committed(&instance, &recorded);

        let outgoing =
            Outgoing::new(WorkflowEvent::Escalated, [Some(target.id)]).with("reason", reason);
        self.dispatch(&instance, plan.name(), outgoing).await;

        Ok(instance)
    }

    async fn auto_complete(
        &self,
        mut instance: WorkflowInstance,
        plan: &Plan,
    ) -> Result<WorkflowInstance, WorkflowError> {
        let now = self.clock.now();
        let entity = self.resolve_entity(&instance).await?;

        let expected_version = instance.next_version();
        let mut tx = self.store.begin().await?;
        let recorded = vec![self.record(
            tx.as_mut(),
            &instance,
            None,
            ActionKind::AutoApproved,
            AUTO_COMPLETION_COMMENT,
            now,
        )];
        let outgoing = self.finish(&mut instance, &entity, true, now, tx.as_mut(), None);

        tx.update_instance(instance.clone(), expected_version);
        self.commit(tx, instance.id()).await?;
        self.committed(&instance, &recorded);
        self.dispatch(&instance, plan.name(), outgoing).await;

        Ok(instance)
    }

    // ---------------------------------------------------------------- helpers

    /// Terminal completion shared by approval, rejection and auto paths
    fn finish(
        &self,
        instance: &mut WorkflowInstance,
        entity: &ResolvedEntity,
        approved: bool,
        at: DateTime<Utc>,
        tx: &mut dyn WorkflowTransaction,
        actor: Option<EmployeeId>,
    ) -> Outgoing {
        instance.complete(approved, at);
        EntityResolver::update_status(entity, instance.status().as_str(), tx);

        let event = if approved {
            WorkflowEvent::Completed
        } else {
            WorkflowEvent::Rejected
        };
        Outgoing::new(event, [EntityResolver::primary_employee(entity), actor])
    }

    async fn escalation_target(
        &self,
        instance: &WorkflowInstance,
        plan: &Plan,
    ) -> Result<Option<Employee>, WorkflowError> {
        let escalate_to = plan
            .step_at(instance.current_step())
            .and_then(|s| s.escalate_to());

        if let Some(step_id) = escalate_to {
            if let Some(step) = self.definitions.get_step(instance.tenant_id(), step_id).await? {
                let entity = self.resolve_entity(instance).await?;
                let resolved = self
                    .approvers
                    .resolve(&step, Some(&entity), instance.created_by(), instance.tenant_id())
                    .await?;
                if resolved.is_some() {
                    return Ok(resolved);
                }
            }
        }

        let Some(current) = instance.current_approver() else {
            return Ok(None);
        };
        match self.approvers.manager_of(current).await? {
            Some(manager) if !manager.belongs_to(instance.tenant_id()) => {
                Err(WorkflowError::cross_tenant_approver(manager.id))
            }
            manager => Ok(manager),
        }
    }

    async fn load(&self, instance_id: &InstanceId) -> Result<WorkflowInstance, WorkflowError> {
        self.store
            .get_instance(instance_id)
            .await?
            .ok_or_else(|| WorkflowError::instance_not_found(instance_id))
    }

    async fn plan(&self, instance: &WorkflowInstance) -> Result<Plan, WorkflowError> {
        let Some(definition_id) = instance.definition_id() else {
            return Ok(Plan {
                definition: None,
                steps: Vec::new(),
            });
        };

        let definition = self
            .definitions
            .get(instance.tenant_id(), definition_id)
            .await?;
        let steps = match &definition {
            Some(d) => self.definitions.list_steps(instance.tenant_id(), d.id()).await?,
            None => Vec::new(),
        };
        Ok(Plan { definition, steps })
    }

    async fn resolve_entity(
        &self,
        instance: &WorkflowInstance,
    ) -> Result<ResolvedEntity, WorkflowError> {
        self.entities
            .resolve(instance.tenant_id(), instance.entity_type(), instance.entity_id())
            .await
    }

    /// The initiator acts on the tenant's behalf, so it must be one of its employees
    async fn check_initiator(
        &self,
        id: &EmployeeId,
        tenant_id: &TenantId,
    ) -> Result<(), WorkflowError> {
        match self.directory.get_employee(id).await? {
            Some(employee) if employee.belongs_to(tenant_id) => Ok(()),
            Some(_) => Err(WorkflowError::CrossTenantActor),
            None => Err(WorkflowError::unknown_employee(id)),
        }
    }

    /// Employee that exists and belongs to `tenant_id`
    async fn tenant_employee(
        &self,
        id: &EmployeeId,
        tenant_id: &TenantId,
    ) -> Result<Employee, WorkflowError> {
        let employee = self
            .directory
            .get_employee(id)
            .await?
            .ok_or_else(|| WorkflowError::unknown_employee(id))?;
        if !employee.belongs_to(tenant_id) {
            return Err(WorkflowError::cross_tenant_approver(id));
        }
        Ok(employee)
    }

    /// Stage one audit row at the instance's current step
    fn record(
        &self,
        tx: &mut dyn WorkflowTransaction,
        instance: &WorkflowInstance,
        actor: Option<EmployeeId>,
        kind: ActionKind,
        comments: impl Into<String>,
        at: DateTime<Utc>,
    ) -> ActionKind {
        tx.append_action(WorkflowAction::new(
            *instance.tenant_id(),
            *instance.id(),
            instance.current_step(),
            actor,
            kind,
            comments,
            at,
        ));
        kind
    }

    async fn commit(
        &self,
        mut tx: Box<dyn WorkflowTransaction>,
        instance_id: &InstanceId,
    ) -> Result<(), WorkflowError> {
        match tx.commit().await {
            Ok(()) => Ok(()),
            Err(e) if e.is_conflict() => {
                warn!(instance_id = %instance_id, error = %e, "Workflow commit lost a race");
                match self.store.get_instance(instance_id).await? {
                    Some(current) if !current.is_active() => {
                        Err(WorkflowError::not_active(current.status()))
                    }
                    _ => Err(WorkflowError::ConcurrentModification(instance_id.to_string())),
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    fn committed(&self, instance: &WorkflowInstance, recorded: &[ActionKind]) {
        for kind in recorded {
            metrics::record_transition(*kind);
            info!(
                tenant_id = %instance.tenant_id(),
                instance_id = %instance.id(),
                entity_type = %instance.entity_type(),
                action = %kind,
                step = instance.current_step(),
                status = %instance.status(),
                approver = ?instance.current_approver(),
                "Workflow transition committed"
            );
        }
    }

    /// Best effort: failures are logged and counted, never returned
    async fn dispatch(
        &self,
        instance: &WorkflowInstance,
        definition_name: Option<&str>,
        outgoing: Outgoing,
    ) {
        let title = definition_name
            .map(str::to_string)
            .unwrap_or_else(|| instance.id().to_string());
        let mut metadata = Map::new();
        metadata.insert("event".to_string(), Value::from(outgoing.event.as_str()));
        metadata.extend(outgoing.context);

        for recipient in outgoing.recipients {
            let notification = Notification {
                tenant_id: *instance.tenant_id(),
                recipient,
                subject: format!("{}: {}", self.subject_prefix, title),
                body: format!("Event: {}\nStatus: {}", outgoing.event, instance.status()),
                entity_type: WORKFLOW_INSTANCE_ENTITY.to_string(),
                entity_id: instance.id().to_string(),
                metadata: metadata.clone(),
            };

            if let Err(e) = self.notifier.notify(notification).await {
                metrics::record_notification_failure(outgoing.event.as_str());
                warn!(
                    instance_id = %instance.id(),
                    recipient = %recipient,
                    event = %outgoing.event,
                    error = %e,
                    "Failed to send workflow notification"
                );
            }
        }
    }
}
