//! Notification sink implementations

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use crate::domain::{DomainError, EmployeeId, Notification, NotificationSink};

/// Sink that writes every notification to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotificationSink;

#[async_trait]
impl NotificationSink for TracingNotificationSink {
    async fn notify(&self, notification: Notification) -> Result<(), DomainError> {
        info!(
            tenant_id = %notification.tenant_id,
            recipient = %notification.recipient,
            event = notification.event().unwrap_or_default(),
            entity_id = %notification.entity_id,
            subject = %notification.subject,
            "Notification dispatched"
        );
        Ok(())
    }
}

/// Sink that keeps notifications in memory for inspection
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotificationSink {
    sent: Arc<RwLock<Vec<Notification>>>,
}

impl InMemoryNotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<Notification> {
        self.sent.read().await.clone()
    }

    /// Notifications addressed to `recipient`
    pub async fn sent_to(&self, recipient: &EmployeeId) -> Vec<Notification> {
        self.sent
            .read()
            .await
            .iter()
            .filter(|n| &n.recipient == recipient)
            .cloned()
            .collect()
    }

    pub async fn clear(&self) {
        self.sent.write().await.clear();
    }
}

#[async_trait]
impl NotificationSink for InMemoryNotificationSink {
    async fn notify(&self, notification: Notification) -> Result<(), DomainError> {
        self.sent.write().await.push(notification);
        Ok(())
    }
}
