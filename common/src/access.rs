//! Capability checks.
//!
//! A single `authorize` decides what a principal may do, from its role, its
//! explicit permission grants and whether it holds an active subscription.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::User => "user",
        }
    }

    /// Unknown roles get the least privileged one.
    pub fn from_string(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "admin" => Role::Admin,
            "manager" => Role::Manager,
            _ => Role::User,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ViewContents,
    CreateContents,
    EditContents,
    DeleteContents,
    ViewUsers,
    CreateUsers,
    EditUsers,
    DeleteUsers,
    ManagePlans,
    ManageSubscriptions,
    RunMaintenance,
}

impl Capability {
    /// Permission name granting this capability.
    pub fn permission(&self) -> &'static str {
        match self {
            Capability::ViewContents => "view contents",
            Capability::CreateContents => "create contents",
            Capability::EditContents => "edit contents",
            Capability::DeleteContents => "delete contents",
            Capability::ViewUsers => "view users",
            Capability::CreateUsers => "create users",
            Capability::EditUsers => "edit users",
            Capability::DeleteUsers => "delete users",
            Capability::ManagePlans => "manage plans",
            Capability::ManageSubscriptions => "manage subscriptions",
            Capability::RunMaintenance => "run maintenance",
        }
    }
}

/// Whoever is asking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub role: Role,
    pub permissions: Vec<String>,
    pub has_active_subscription: bool,
}

impl Principal {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            permissions: Vec::new(),
            has_active_subscription: false,
        }
    }

    pub fn with_permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions = permissions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_active_subscription(mut self, active: bool) -> Self {
        self.has_active_subscription = active;
        self
    }

    fn is_granted(&self, capability: Capability) -> bool {
        self.permissions
            .iter()
            .any(|p| p.eq_ignore_ascii_case(capability.permission()))
    }
}

pub fn authorize(principal: &Principal, capability: Capability) -> bool {
    match (principal.role, capability) {
        (Role::Admin, _) => true,
        // Content is for paying users; a grant alone is not enough.
        (Role::Manager, Capability::ViewContents) => true,
        (_, Capability::ViewContents) => principal.has_active_subscription,
        (
            Role::Manager,
            Capability::RunMaintenance | Capability::ManageSubscriptions | Capability::ViewUsers,
        ) => true,
        _ => principal.is_granted(capability),
    }
}
