use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use super::descriptor::{Role, RoleDescriptor};
use crate::errors::AppResult;
use crate::models::license::{LicenseAssignmentRecord, PrimaryRoleRecord};

/// Table granting system-wide roles independent of any organization.
#[async_trait]
pub trait PrimaryRoleStore: Send + Sync {
    /// Zero or one record for the user. `Ok(None)` is the normal not-found
    /// outcome; `Err` is reserved for query or transport failures.
    async fn find_role(&self, user_id: Uuid) -> AppResult<Option<PrimaryRoleRecord>>;
}

/// Table linking users to license grants with a scoped access level.
#[async_trait]
pub trait LicenseAssignmentStore: Send + Sync {
    /// First assignment belonging to the user, if any.
    async fn first_assignment(&self, user_id: Uuid) -> AppResult<Option<LicenseAssignmentRecord>>;

    /// Active organization owning the license, if any.
    async fn organization_for_license(&self, license_id: Uuid) -> AppResult<Option<Uuid>>;
}

/// Resolves a user id into a [`RoleDescriptor`].
///
/// Lookup order:
/// 1. primary-role store `admin` record -> primary admin
/// 2. first license assignment -> its access level, scoped to the license's organization
/// 3. default user
///
/// Store failures are logged and treated as "no record" for that step, so a
/// broken backend always lands on less privilege, never more.
#[derive(Clone)]
pub struct RoleResolver {
    primary: Arc<dyn PrimaryRoleStore>,
    assignments: Arc<dyn LicenseAssignmentStore>,
}

impl RoleResolver {
    pub fn new(primary: Arc<dyn PrimaryRoleStore>, assignments: Arc<dyn LicenseAssignmentStore>) -> Self {
        Self { primary, assignments }
    }

    pub async fn resolve(&self, user_id: Uuid) -> RoleDescriptor {
        if self.holds_primary_admin(user_id).await {
            tracing::debug!(user_id = %user_id, source = "primary_role_store", "role resolved");
            return RoleDescriptor::primary_admin();
        }

        if let Some(descriptor) = self.from_assignment(user_id).await {
            tracing::debug!(
                user_id = %user_id,
                role = %descriptor.role(),
                source = "license_assignment_store",
                scope_id = ?descriptor.scope_id(),
                "role resolved"
            );
            return descriptor;
        }

        tracing::debug!(user_id = %user_id, source = "default", "role resolved");
        RoleDescriptor::default_user()
    }

    async fn holds_primary_admin(&self, user_id: Uuid) -> bool {
        match self.primary.find_role(user_id).await {
            Ok(Some(record)) => record.role.trim().eq_ignore_ascii_case(Role::Admin.as_str()),
            Ok(None) => false,
            Err(err) => {
                tracing::warn!(
                    user_id = %user_id,
                    error = ?err,
                    "primary role lookup failed, treating as no record"
                );
                false
            }
        }
    }

    async fn from_assignment(&self, user_id: Uuid) -> Option<RoleDescriptor> {
        let assignment = match self.assignments.first_assignment(user_id).await {
            Ok(found) => found?,
            Err(err) => {
                tracing::warn!(
                    user_id = %user_id,
                    error = ?err,
                    "license assignment lookup failed, treating as no record"
                );
                return None;
            }
        };

        let role = Role::parse_access_level(&assignment.access_level).unwrap_or_else(|| {
            tracing::warn!(
                user_id = %user_id,
                assignment_id = %assignment.id,
                access_level = %assignment.access_level,
                "unknown access level, downgrading to user"
            );
            Role::User
        });

        let scope_id = match self.assignments.organization_for_license(assignment.license_id).await {
            Ok(scope) => scope,
            Err(err) => {
                tracing::warn!(
                    user_id = %user_id,
                    license_id = %assignment.license_id,
                    error = ?err,
                    "organization lookup for license failed, leaving scope empty"
                );
                None
            }
        };

        Some(RoleDescriptor::from_assignment(role, scope_id))
    }
}
