use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::license::{AssignedLicense, LicenseAssignmentRecord, LicenseSummary, Organization, PrimaryRoleRecord};
use crate::models::user::DbUser;

pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, AppError> {
    let s = s.trim();

    // RFC3339 (what we write)
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    // SQLite CURRENT_TIMESTAMP: "YYYY-MM-DD HH:MM:SS"
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(Utc.from_utc_datetime(&naive));
    }

    if let Ok(naive_date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        let ndt = naive_date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| AppError::internal("invalid datetime: date out of range"))?;
        return Ok(Utc.from_utc_datetime(&ndt));
    }

    Err(AppError::internal(format!("invalid datetime: {}", s)))
}

fn parse_opt_datetime(s: Option<String>) -> Result<Option<DateTime<Utc>>, AppError> {
    match s.as_deref().map(str::trim) {
        Some(trimmed) if !trimmed.is_empty() => Ok(Some(parse_datetime(trimmed)?)),
        _ => Ok(None),
    }
}

fn get<'r, T>(row: &'r SqliteRow, column: &str) -> Result<T, AppError>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(column)
        .map_err(|e| AppError::internal(format!("missing {}: {}", column, e)))
}

fn get_uuid(row: &SqliteRow, column: &str) -> Result<Uuid, AppError> {
    let raw: String = get(row, column)?;
    Uuid::parse_str(raw.trim()).map_err(|e| AppError::internal(format!("invalid uuid in {}: {}", column, e)))
}

fn get_datetime(row: &SqliteRow, column: &str) -> Result<DateTime<Utc>, AppError> {
    let raw: String = get(row, column)?;
    parse_datetime(&raw)
}

pub fn db_user_from_row(row: &SqliteRow) -> Result<DbUser, AppError> {
    Ok(DbUser {
        id: get_uuid(row, "id")?,
        name: get(row, "name")?,
        email: get(row, "email")?,
        password_hash: get(row, "password_hash")?,
        created_at: get_datetime(row, "created_at")?,
        updated_at: get_datetime(row, "updated_at")?,
        deleted_at: parse_opt_datetime(get(row, "deleted_at")?)?,
    })
}

pub fn primary_role_from_row(row: &SqliteRow) -> Result<PrimaryRoleRecord, AppError> {
    Ok(PrimaryRoleRecord {
        user_id: get_uuid(row, "user_id")?,
        role: get(row, "role")?,
    })
}

pub fn assignment_from_row(row: &SqliteRow) -> Result<LicenseAssignmentRecord, AppError> {
    Ok(LicenseAssignmentRecord {
        id: get_uuid(row, "id")?,
        user_id: get_uuid(row, "user_id")?,
        license_id: get_uuid(row, "license_id")?,
        access_level: get(row, "access_level")?,
        assigned_at: get_datetime(row, "assigned_at")?,
    })
}

pub fn organization_from_row(row: &SqliteRow) -> Result<Organization, AppError> {
    Ok(Organization {
        id: get_uuid(row, "id")?,
        name: get(row, "name")?,
        is_active: get(row, "is_active")?,
        created_at: get_datetime(row, "created_at")?,
    })
}

pub fn license_summary_from_row(row: &SqliteRow) -> Result<LicenseSummary, AppError> {
    Ok(LicenseSummary::new(
        get_uuid(row, "id")?,
        get_uuid(row, "organization_id")?,
        get(row, "product_name")?,
        get(row, "total_seats")?,
        get(row, "seats_used")?,
        parse_opt_datetime(get(row, "expires_at")?)?,
    ))
}

pub fn assigned_license_from_row(row: &SqliteRow) -> Result<AssignedLicense, AppError> {
    Ok(AssignedLicense {
        assignment_id: get_uuid(row, "assignment_id")?,
        license_id: get_uuid(row, "license_id")?,
        product_name: get(row, "product_name")?,
        organization_id: get_uuid(row, "organization_id")?,
        organization_name: get(row, "organization_name")?,
        access_level: get(row, "access_level")?,
        assigned_at: get_datetime(row, "assigned_at")?,
        expires_at: parse_opt_datetime(get(row, "expires_at")?)?,
    })
}
