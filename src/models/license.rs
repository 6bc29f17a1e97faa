use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

// =============================================================================
// ROLE STORE RECORDS
// =============================================================================

/// Row of the primary-role store. Only `role = "admin"` grants anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryRoleRecord {
    pub user_id: Uuid,
    pub role: String,
}

/// Row of the license-assignment store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseAssignmentRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub license_id: Uuid,
    pub access_level: String,
    pub assigned_at: DateTime<Utc>,
}

// =============================================================================
// READ MODELS
// =============================================================================

/// Client organization holding licenses.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// License of an organization with its seat usage.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LicenseSummary {
    pub id: Uuid,
    pub organization_id: Uuid,
    #[schema(example = "RAYN Analytics Suite")]
    pub product_name: String,
    pub total_seats: i64,
    pub seats_used: i64,
    pub seats_available: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl LicenseSummary {
    pub fn new(
        id: Uuid,
        organization_id: Uuid,
        product_name: String,
        total_seats: i64,
        seats_used: i64,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            organization_id,
            product_name,
            total_seats,
            seats_used,
            seats_available: (total_seats - seats_used).max(0),
            expires_at,
        }
    }
}

/// A license seat assigned to the calling user.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AssignedLicense {
    pub assignment_id: Uuid,
    pub license_id: Uuid,
    pub product_name: String,
    pub organization_id: Uuid,
    pub organization_name: String,
    #[schema(example = "manager")]
    pub access_level: String,
    pub assigned_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}
