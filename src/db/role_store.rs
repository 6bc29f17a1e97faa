use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{optional_row, row_parsers};
use crate::authz::{LicenseAssignmentStore, PrimaryRoleStore, RoleResolver};
use crate::errors::{AppError, AppResult};
use crate::models::license::{LicenseAssignmentRecord, PrimaryRoleRecord};

/// SQLite implementation of both role stores.
#[derive(Debug, Clone)]
pub struct SqliteRoleStore {
    pool: SqlitePool,
}

impl SqliteRoleStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Resolver backed by this pool for both lookups.
    pub fn resolver(pool: SqlitePool) -> RoleResolver {
        let store = std::sync::Arc::new(Self::new(pool));
        RoleResolver::new(store.clone(), store)
    }
}

#[async_trait]
impl PrimaryRoleStore for SqliteRoleStore {
    async fn find_role(&self, user_id: Uuid) -> AppResult<Option<PrimaryRoleRecord>> {
        let row = optional_row(
            sqlx::query("SELECT user_id, role FROM user_roles WHERE user_id = ? AND role = 'admin' LIMIT 1")
                .bind(user_id.to_string())
                .fetch_one(&self.pool)
                .await,
        )?;

        row.as_ref().map(row_parsers::primary_role_from_row).transpose()
    }
}

#[async_trait]
impl LicenseAssignmentStore for SqliteRoleStore {
    async fn first_assignment(&self, user_id: Uuid) -> AppResult<Option<LicenseAssignmentRecord>> {
        let row = optional_row(
            sqlx::query(
                "SELECT id, user_id, license_id, access_level, assigned_at FROM license_assignments \
                 WHERE user_id = ? ORDER BY assigned_at ASC, id ASC LIMIT 1",
            )
            .bind(user_id.to_string())
            .fetch_one(&self.pool)
            .await,
        )?;

        row.as_ref().map(row_parsers::assignment_from_row).transpose()
    }

    async fn organization_for_license(&self, license_id: Uuid) -> AppResult<Option<Uuid>> {
        let raw: Option<String> = optional_row(
            sqlx::query_scalar::<_, String>(
                "SELECT o.id FROM licenses l JOIN organizations o ON o.id = l.organization_id \
                 WHERE l.id = ? AND o.is_active = 1",
            )
            .bind(license_id.to_string())
            .fetch_one(&self.pool)
            .await,
        )?;

        raw.map(|id| {
            Uuid::parse_str(id.trim()).map_err(|e| AppError::internal(format!("invalid organization id: {e}")))
        })
        .transpose()
    }
}
