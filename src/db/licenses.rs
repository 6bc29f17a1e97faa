//! Read-only license queries backing the dashboard.

use sqlx::SqlitePool;
use uuid::Uuid;

use super::row_parsers;
use crate::errors::AppResult;
use crate::models::license::{AssignedLicense, LicenseSummary, Organization};

/// Active organizations, optionally narrowed to one id.
pub async fn list_organizations(pool: &SqlitePool, only: Option<Uuid>) -> AppResult<Vec<Organization>> {
    let rows = match only {
        Some(id) => {
            sqlx::query(
                "SELECT id, name, is_active, created_at FROM organizations WHERE is_active = 1 AND id = ? ORDER BY name",
            )
            .bind(id.to_string())
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query("SELECT id, name, is_active, created_at FROM organizations WHERE is_active = 1 ORDER BY name")
                .fetch_all(pool)
                .await?
        }
    };

    rows.iter().map(row_parsers::organization_from_row).collect()
}

pub async fn organization_is_active(pool: &SqlitePool, organization_id: Uuid) -> AppResult<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM organizations WHERE id = ? AND is_active = 1")
        .bind(organization_id.to_string())
        .fetch_one(pool)
        .await?;

    Ok(count > 0)
}

pub async fn organization_licenses(pool: &SqlitePool, organization_id: Uuid) -> AppResult<Vec<LicenseSummary>> {
    let rows = sqlx::query(
        "SELECT l.id, l.organization_id, l.product_name, l.total_seats, l.expires_at, \
           (SELECT COUNT(1) FROM license_assignments a WHERE a.license_id = l.id) AS seats_used \
         FROM licenses l WHERE l.organization_id = ? ORDER BY l.product_name",
    )
    .bind(organization_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_parsers::license_summary_from_row).collect()
}

pub async fn licenses_for_user(pool: &SqlitePool, user_id: Uuid) -> AppResult<Vec<AssignedLicense>> {
    let rows = sqlx::query(
        "SELECT a.id AS assignment_id, a.license_id, a.access_level, a.assigned_at, \
           l.product_name, l.expires_at, o.id AS organization_id, o.name AS organization_name \
         FROM license_assignments a \
         JOIN licenses l ON l.id = a.license_id \
         JOIN organizations o ON o.id = l.organization_id \
         WHERE a.user_id = ? ORDER BY a.assigned_at",
    )
    .bind(user_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_parsers::assigned_license_from_row).collect()
}
