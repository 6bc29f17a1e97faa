use serde::Serialize;
use utoipa::ToSchema;

use super::capability::Capability;
use super::descriptor::RoleDescriptor;
use super::session::{SessionPhase, SessionSnapshot};
use crate::errors::{AppError, AppResult};

/// Outcome of evaluating a guard against the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GuardDecision {
    Render,
    Loading,
    Fallback,
}

/// Declarative gate over a region of output or a data fetch.
///
/// Stateless: evaluate it against a fresh [`SessionSnapshot`] each time so a
/// refresh or an operator override is picked up immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessGuard {
    required: Capability,
    show_loading_placeholder: bool,
}

impl AccessGuard {
    pub fn new(required: Capability) -> Self {
        Self {
            required,
            show_loading_placeholder: true,
        }
    }

    pub fn admin() -> Self {
        Self::new(Capability::Admin)
    }

    pub fn manager_or_above() -> Self {
        Self::new(Capability::ManagerOrAbove)
    }

    pub fn authenticated() -> Self {
        Self::new(Capability::Authenticated)
    }

    /// When suppressed, an unresolved-but-resolving session falls back
    /// instead of showing a loading state.
    pub fn with_loading_placeholder(mut self, show: bool) -> Self {
        self.show_loading_placeholder = show;
        self
    }

    pub fn required(&self) -> Capability {
        self.required
    }

    pub fn evaluate(&self, snapshot: &SessionSnapshot) -> GuardDecision {
        match &snapshot.descriptor {
            None if snapshot.phase == SessionPhase::Resolving && self.show_loading_placeholder => {
                GuardDecision::Loading
            }
            None => GuardDecision::Fallback,
            Some(descriptor) if self.required.is_satisfied_by(descriptor) => GuardDecision::Render,
            Some(_) => GuardDecision::Fallback,
        }
    }

    /// Handler-side form of [`evaluate`](Self::evaluate): the descriptor on
    /// `Render`, 503 on `Loading`, 403 on `Fallback`.
    pub fn require(&self, snapshot: &SessionSnapshot) -> AppResult<RoleDescriptor> {
        match (self.evaluate(snapshot), &snapshot.descriptor) {
            (GuardDecision::Render, Some(descriptor)) => Ok(descriptor.clone()),
            (GuardDecision::Loading, _) => Err(AppError::unavailable("role resolution in progress")),
            _ => {
                tracing::debug!(
                    required = self.required.as_str(),
                    role = ?snapshot.descriptor.as_ref().map(|d| d.role()),
                    "access guard denied"
                );
                Err(AppError::forbidden(format!("requires {}", self.required.as_str())))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::descriptor::Role;
    use uuid::Uuid;

    fn resolved(descriptor: RoleDescriptor) -> SessionSnapshot {
        SessionSnapshot {
            descriptor: Some(descriptor),
            phase: SessionPhase::Resolved,
            override_active: false,
        }
    }

    fn empty(phase: SessionPhase) -> SessionSnapshot {
        SessionSnapshot {
            descriptor: None,
            phase,
            override_active: false,
        }
    }

    #[test]
    fn test_admin_guard_renders_for_primary_admin() {
        let snap = resolved(RoleDescriptor::primary_admin());
        assert_eq!(AccessGuard::admin().evaluate(&snap), GuardDecision::Render);
    }

    #[test]
    fn test_manager_guard_falls_back_for_default_user() {
        let snap = resolved(RoleDescriptor::default_user());
        assert_eq!(AccessGuard::manager_or_above().evaluate(&snap), GuardDecision::Fallback);
        assert_eq!(AccessGuard::authenticated().evaluate(&snap), GuardDecision::Render);
    }

    #[test]
    fn test_scoped_admin_passes_admin_guard() {
        let snap = resolved(RoleDescriptor::from_assignment(Role::Admin, Some(Uuid::new_v4())));
        assert_eq!(AccessGuard::admin().evaluate(&snap), GuardDecision::Render);
    }

    #[test]
    fn test_resolving_without_descriptor_shows_loading() {
        let snap = empty(SessionPhase::Resolving);
        assert_eq!(AccessGuard::authenticated().evaluate(&snap), GuardDecision::Loading);
        assert_eq!(
            AccessGuard::authenticated().with_loading_placeholder(false).evaluate(&snap),
            GuardDecision::Fallback
        );
    }

    #[test]
    fn test_settled_without_descriptor_falls_back() {
        let snap = empty(SessionPhase::Unresolved);
        assert_eq!(AccessGuard::authenticated().evaluate(&snap), GuardDecision::Fallback);
    }

    #[test]
    fn test_refresh_with_previous_descriptor_still_evaluates() {
        let snap = SessionSnapshot {
            descriptor: Some(RoleDescriptor::from_assignment(Role::Manager, None)),
            phase: SessionPhase::Resolving,
            override_active: false,
        };
        assert_eq!(AccessGuard::manager_or_above().evaluate(&snap), GuardDecision::Render);
    }

    #[test]
    fn test_require_maps_decisions_to_errors() {
        assert!(AccessGuard::admin().require(&resolved(RoleDescriptor::primary_admin())).is_ok());
        assert!(matches!(
            AccessGuard::admin().require(&resolved(RoleDescriptor::default_user())),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            AccessGuard::admin().require(&empty(SessionPhase::Resolving)),
            Err(AppError::Unavailable(_))
        ));
    }
}
