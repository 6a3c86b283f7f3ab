use chrono::{DateTime, Utc};
use common::access::{Principal, Role};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    #[sqlx(json)]
    pub permissions: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn principal(&self, has_active_subscription: bool) -> Principal {
        Principal::new(Role::from_string(&self.role))
            .with_permissions(self.permissions.clone())
            .with_active_subscription(has_active_subscription)
    }

    /// Address to notify, if the stored one is usable.
    pub fn mail_address(&self) -> Option<&str> {
        let email = self.email.trim();
        (!email.is_empty()).then_some(email)
    }
}
