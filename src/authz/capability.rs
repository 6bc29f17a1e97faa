use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::descriptor::{Role, RoleDescriptor};

/// Capability an access guard can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Admin,
    ManagerOrAbove,
    Authenticated,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Admin => "admin",
            Capability::ManagerOrAbove => "manager_or_above",
            Capability::Authenticated => "authenticated",
        }
    }

    pub fn is_satisfied_by(&self, descriptor: &RoleDescriptor) -> bool {
        let caps = Capabilities::of(descriptor);
        match self {
            Capability::Admin => caps.is_administrator,
            Capability::ManagerOrAbove => caps.is_manager_or_above,
            Capability::Authenticated => caps.is_authenticated_user,
        }
    }
}

/// Boolean flags derived from a descriptor.
///
/// Always built from the descriptor at hand; never store one next to a
/// descriptor that may later be replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Capabilities {
    pub is_administrator: bool,
    pub is_manager_or_above: bool,
    pub is_authenticated_user: bool,
}

impl Capabilities {
    pub fn of(descriptor: &RoleDescriptor) -> Self {
        let is_administrator = descriptor.is_primary_admin() || descriptor.is_scoped_admin();
        Self {
            is_administrator,
            is_manager_or_above: is_administrator || descriptor.role() == Role::Manager,
            is_authenticated_user: true,
        }
    }
}
