//! Role session endpoints: the caller's descriptor, manual refresh, the
//! dashboard variant, and the operator preview override.

use axum::extract::State;
use axum::Json;

use crate::app::AppState;
use crate::authz::{Capability, RoleContext, RoleDescriptor};
use crate::db::licenses;
use crate::errors::{AppError, AppResult};
use crate::models::role::{DashboardSection, DashboardVariant, DashboardView, RoleOverrideRequest, RoleResponse};

const DASHBOARD_SECTIONS: [(&str, Capability); 4] = [
    ("organizations", Capability::Admin),
    ("seat_usage", Capability::ManagerOrAbove),
    ("team_members", Capability::ManagerOrAbove),
    ("my_licenses", Capability::Authenticated),
];

#[utoipa::path(
    get,
    path = "/auth/role",
    tag = "Roles",
    responses((status = 200, description = "Current role session", body = RoleResponse)),
    security(("bearerAuth" = []))
)]
pub async fn current_role(ctx: RoleContext) -> AppResult<Json<RoleResponse>> {
    Ok(Json(RoleResponse::from(&ctx.snapshot)))
}

#[utoipa::path(
    post,
    path = "/auth/role/refresh",
    tag = "Roles",
    responses((status = 200, description = "Role re-resolved", body = RoleResponse)),
    security(("bearerAuth" = []))
)]
pub async fn refresh_role(ctx: RoleContext) -> AppResult<Json<RoleResponse>> {
    ctx.session.refresh().await;
    Ok(Json(RoleResponse::from(&ctx.session.snapshot())))
}

#[utoipa::path(
    get,
    path = "/dashboard",
    tag = "Roles",
    responses(
        (status = 200, description = "Dashboard variant and gated sections", body = DashboardView),
        (status = 503, description = "Role still resolving")
    ),
    security(("bearerAuth" = []))
)]
pub async fn dashboard(ctx: RoleContext) -> AppResult<Json<DashboardView>> {
    let descriptor = ctx.require(Capability::Authenticated)?;

    let sections = DASHBOARD_SECTIONS
        .iter()
        .map(|&(name, required)| DashboardSection {
            name,
            required,
            decision: ctx.decide(required),
        })
        .collect();

    Ok(Json(DashboardView {
        variant: DashboardVariant::for_descriptor(&descriptor),
        descriptor,
        sections,
    }))
}

#[utoipa::path(
    put,
    path = "/debug/role-override",
    tag = "Roles",
    request_body = RoleOverrideRequest,
    responses(
        (status = 200, description = "Override active", body = RoleResponse),
        (status = 403, description = "Not an operator")
    ),
    security(("bearerAuth" = []))
)]
pub async fn set_role_override(
    State(state): State<AppState>,
    ctx: RoleContext,
    Json(req): Json<RoleOverrideRequest>,
) -> AppResult<Json<RoleResponse>> {
    let grant = state.override_policy.grant(&ctx.session)?;

    if let Some(scope_id) = req.scope_id {
        if !licenses::organization_is_active(&state.pool, scope_id).await? {
            return Err(AppError::bad_request("scope_id must reference an active organization"));
        }
    }

    ctx.session.set_override(&grant, RoleDescriptor::preview(req.role, req.scope_id));
    Ok(Json(RoleResponse::from(&ctx.session.snapshot())))
}

#[utoipa::path(
    delete,
    path = "/debug/role-override",
    tag = "Roles",
    responses(
        (status = 200, description = "Override cleared", body = RoleResponse),
        (status = 403, description = "Not an operator")
    ),
    security(("bearerAuth" = []))
)]
pub async fn clear_role_override(State(state): State<AppState>, ctx: RoleContext) -> AppResult<Json<RoleResponse>> {
    state.override_policy.grant(&ctx.session)?;
    ctx.session.clear_override();
    Ok(Json(RoleResponse::from(&ctx.session.snapshot())))
}
