//! Staff in-app notification fan-out.
//!
//! New and arrived orders raise one in-app record per staff/admin user of
//! the tenant, for awareness. Fan-out is a best-effort side effect: a single
//! user's failed insert is logged and skipped, never aborting the batch.

use std::sync::Arc;

use fixhub_core::clock::Clock;
use fixhub_core::error::SideEffectError;
use fixhub_core::traits::{Directory, StaffNotificationStore};
use fixhub_core::types::{NotifyPriority, StaffNotification, UserRole};

/// Fans in-app notifications out to every staff/admin user of a tenant.
#[derive(Clone)]
pub struct StaffNotifier {
    directory: Arc<dyn Directory>,
    store: Arc<dyn StaffNotificationStore>,
    clock: Arc<dyn Clock>,
}

impl StaffNotifier {
    pub fn new(
        directory: Arc<dyn Directory>,
        store: Arc<dyn StaffNotificationStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            directory,
            store,
            clock,
        }
    }

    /// Create one notification per staff/admin user. Returns the number of
    /// records written.
    pub async fn notify_staff(
        &self,
        business_id: &str,
        kind: &str,
        title: &str,
        description: &str,
        link: Option<String>,
        priority: NotifyPriority,
    ) -> Result<usize, SideEffectError> {
        let mut users = self
            .directory
            .users_by_role(business_id, UserRole::Staff)
            .await
            .map_err(|e| SideEffectError::Lookup(e.to_string()))?;
        let admins = self
            .directory
            .users_by_role(business_id, UserRole::Admin)
            .await
            .map_err(|e| SideEffectError::Lookup(e.to_string()))?;
        users.extend(admins);

        let mut written = 0;
        for user in &users {
            let notification = StaffNotification {
                id: uuid::Uuid::new_v4().to_string(),
                business_id: business_id.to_string(),
                user_id: user.id,
                kind: kind.to_string(),
                title: title.to_string(),
                description: description.to_string(),
                link: link.clone(),
                priority,
                read: false,
                created_at: self.clock.now(),
            };
            match self.store.create(notification).await {
                Ok(_) => written += 1,
                Err(e) => {
                    tracing::warn!("⚠️ Staff notification for user {} failed: {e}", user.id);
                }
            }
        }
        Ok(written)
    }
}
