use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::authz::{
    Capabilities, Capability, GuardDecision, Role, RoleDescriptor, SessionPhase, SessionSnapshot,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct RoleResponse {
    pub phase: SessionPhase,
    pub override_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descriptor: Option<RoleDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<Capabilities>,
}

impl From<&SessionSnapshot> for RoleResponse {
    fn from(snapshot: &SessionSnapshot) -> Self {
        Self {
            phase: snapshot.phase,
            override_active: snapshot.override_active,
            descriptor: snapshot.descriptor.clone(),
            capabilities: snapshot.descriptor.as_ref().map(Capabilities::of),
        }
    }
}

/// Which dashboard the front end should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DashboardVariant {
    RaynAdmin,
    ClientAdmin,
    Manager,
    Employee,
}

impl DashboardVariant {
    pub fn for_descriptor(descriptor: &RoleDescriptor) -> Self {
        if descriptor.is_primary_admin() {
            DashboardVariant::RaynAdmin
        } else if descriptor.is_scoped_admin() {
            DashboardVariant::ClientAdmin
        } else if descriptor.role() == Role::Manager {
            DashboardVariant::Manager
        } else {
            DashboardVariant::Employee
        }
    }
}

/// One gated region of the dashboard and whether it is shown.
#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardSection {
    #[schema(example = "seat_usage")]
    pub name: &'static str,
    pub required: Capability,
    pub decision: GuardDecision,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardView {
    pub variant: DashboardVariant,
    pub descriptor: RoleDescriptor,
    pub sections: Vec<DashboardSection>,
}

/// Descriptor an operator wants to preview.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RoleOverrideRequest {
    pub role: Role,
    #[serde(default)]
    pub scope_id: Option<Uuid>,
}
