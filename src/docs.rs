use axum::Router;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::openapi::server::Server;
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::authz::{Capabilities, Capability, GuardDecision, Role, RoleDescriptor, RoleSource, SessionPhase};
use crate::errors::ErrorResponse;
use crate::models;
use crate::routes;

#[derive(OpenApi)]
#[openapi(
	paths(
		routes::health::health,
		routes::auth::register,
		routes::auth::login,
		routes::auth::me,
		routes::auth::logout,
		routes::roles::current_role,
		routes::roles::refresh_role,
		routes::roles::dashboard,
		routes::roles::set_role_override,
		routes::roles::clear_role_override,
		routes::licenses::my_licenses,
		routes::licenses::list_organizations,
		routes::licenses::organization_licenses
	),
	components(
		schemas(
			ErrorResponse,
			routes::health::HealthResponse,
			routes::auth::MessageResponse,
			models::user::User,
			models::user::AuthResponse,
			models::user::LoginRequest,
			models::user::RegisterRequest,
			models::role::RoleResponse,
			models::role::DashboardVariant,
			models::role::DashboardSection,
			models::role::DashboardView,
			models::role::RoleOverrideRequest,
			models::license::Organization,
			models::license::LicenseSummary,
			models::license::AssignedLicense,
			Role,
			RoleSource,
			RoleDescriptor,
			Capability,
			Capabilities,
			GuardDecision,
			SessionPhase
		)
	),
	modifiers(&BearerAuth),
	tags(
		(name = "Health", description = "Service health"),
		(name = "Auth", description = "Authentication endpoints"),
		(name = "Roles", description = "Role resolution and access tiers"),
		(name = "Licenses", description = "License seats visible to the caller")
	)
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
	fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
		let components = openapi.components.get_or_insert_with(Default::default);
		components.add_security_scheme(
			"bearerAuth",
			SecurityScheme::Http(
				HttpBuilder::new()
					.scheme(HttpAuthScheme::Bearer)
					.bearer_format("JWT")
					.build(),
			),
		);
	}
}

pub fn build_openapi(port: u16) -> utoipa::openapi::OpenApi {
	let mut doc = ApiDoc::openapi();
	doc.servers = Some(vec![Server::new(format!("http://localhost:{port}"))]);
	doc
}

pub fn swagger_routes(doc: utoipa::openapi::OpenApi) -> Router {
	SwaggerUi::new("/docs").url("/api-docs/openapi.json", doc).into()
}
