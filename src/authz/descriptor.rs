use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Effective access tier granted to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
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

    /// Parse an `access_level` value as stored on a license assignment.
    ///
    /// `moderator` is the legacy name of the manager tier and maps onto it.
    pub fn parse_access_level(value: &str) -> Option<Role> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "manager" | "moderator" => Some(Role::Manager),
            "user" => Some(Role::User),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which backing store produced a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RoleSource {
    PrimaryRoleStore,
    LicenseAssignmentStore,
    Default,
}

impl RoleSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleSource::PrimaryRoleStore => "primary_role_store",
            RoleSource::LicenseAssignmentStore => "license_assignment_store",
            RoleSource::Default => "default",
        }
    }
}

impl std::fmt::Display for RoleSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a single role resolution.
///
/// Fields are private so that every value goes through one of the
/// constructors below, which are the only places the admin flags are set.
/// A descriptor is never mutated; resolving again yields a new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct RoleDescriptor {
    role: Role,
    source: RoleSource,
    is_primary_admin: bool,
    is_scoped_admin: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    scope_id: Option<Uuid>,
}

impl RoleDescriptor {
    /// System-wide administrator granted by the primary-role store.
    pub fn primary_admin() -> Self {
        Self {
            role: Role::Admin,
            source: RoleSource::PrimaryRoleStore,
            is_primary_admin: true,
            is_scoped_admin: false,
            scope_id: None,
        }
    }

    /// Role derived from a license assignment, optionally scoped to the
    /// organization owning the assigned license.
    pub fn from_assignment(role: Role, scope_id: Option<Uuid>) -> Self {
        Self {
            role,
            source: RoleSource::LicenseAssignmentStore,
            is_primary_admin: false,
            is_scoped_admin: role == Role::Admin,
            scope_id,
        }
    }

    /// Least-privilege fallback when no store yields a record.
    pub fn default_user() -> Self {
        Self {
            role: Role::User,
            source: RoleSource::Default,
            is_primary_admin: false,
            is_scoped_admin: false,
            scope_id: None,
        }
    }

    /// Descriptor an operator previews through the role override.
    ///
    /// Unscoped admin previews as a primary admin, unscoped user previews as
    /// the default descriptor, everything else as an assignment-derived role.
    pub fn preview(role: Role, scope_id: Option<Uuid>) -> Self {
        match (role, scope_id) {
            (Role::Admin, None) => Self::primary_admin(),
            (Role::User, None) => Self::default_user(),
            (role, scope_id) => Self::from_assignment(role, scope_id),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn source(&self) -> RoleSource {
        self.source
    }

    pub fn is_primary_admin(&self) -> bool {
        self.is_primary_admin
    }

    pub fn is_scoped_admin(&self) -> bool {
        self.is_scoped_admin
    }

    pub fn scope_id(&self) -> Option<Uuid> {
        self.scope_id
    }

    /// Whether the holder may act on data belonging to `organization_id`.
    ///
    /// Primary admins reach every organization; everyone else only the one
    /// their role is scoped to.
    pub fn covers_organization(&self, organization_id: Uuid) -> bool {
        self.is_primary_admin || self.scope_id == Some(organization_id)
    }
}
