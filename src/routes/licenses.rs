use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::{Capability, RoleContext};
use crate::db::licenses;
use crate::errors::{AppError, AppResult};
use crate::models::license::{AssignedLicense, LicenseSummary, Organization};

#[utoipa::path(
    get,
    path = "/licenses/mine",
    tag = "Licenses",
    responses((status = 200, description = "Licenses assigned to the caller", body = Vec<AssignedLicense>)),
    security(("bearerAuth" = []))
)]
pub async fn my_licenses(State(state): State<AppState>, ctx: RoleContext) -> AppResult<Json<Vec<AssignedLicense>>> {
    ctx.require(Capability::Authenticated)?;
    let assigned = licenses::licenses_for_user(&state.pool, ctx.auth.user_id).await?;
    Ok(Json(assigned))
}

/// Primary admins see every active organization, scoped admins only theirs.
#[utoipa::path(
    get,
    path = "/organizations",
    tag = "Licenses",
    responses(
        (status = 200, description = "Visible organizations", body = Vec<Organization>),
        (status = 403, description = "Admin required")
    ),
    security(("bearerAuth" = []))
)]
pub async fn list_organizations(
    State(state): State<AppState>,
    ctx: RoleContext,
) -> AppResult<Json<Vec<Organization>>> {
    let descriptor = ctx.require(Capability::Admin)?;

    let organizations = if descriptor.is_primary_admin() {
        licenses::list_organizations(&state.pool, None).await?
    } else {
        match descriptor.scope_id() {
            Some(scope) => licenses::list_organizations(&state.pool, Some(scope)).await?,
            None => Vec::new(),
        }
    };

    Ok(Json(organizations))
}

#[utoipa::path(
    get,
    path = "/organizations/{id}/licenses",
    tag = "Licenses",
    params(("id" = Uuid, Path, description = "Organization ID")),
    responses(
        (status = 200, description = "Licenses with seat usage", body = Vec<LicenseSummary>),
        (status = 403, description = "Outside the caller's scope"),
        (status = 404, description = "Organization not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn organization_licenses(
    State(state): State<AppState>,
    ctx: RoleContext,
    Path(organization_id): Path<Uuid>,
) -> AppResult<Json<Vec<LicenseSummary>>> {
    let descriptor = ctx.require(Capability::ManagerOrAbove)?;

    if !descriptor.covers_organization(organization_id) {
        return Err(AppError::forbidden("organization is outside your scope"));
    }
    if !licenses::organization_is_active(&state.pool, organization_id).await? {
        return Err(AppError::not_found("organization not found"));
    }

    let summaries = licenses::organization_licenses(&state.pool, organization_id).await?;
    Ok(Json(summaries))
}
