//! Operator "preview as" override.
//!
//! Lets an operator view the dashboard as another tier would. It never feeds
//! the resolver; it only swaps what a session reports while active.

use super::session::SessionHolder;
use crate::errors::{AppError, AppResult};

/// Proof that the override gate was passed. Only [`OverridePolicy::grant`]
/// can construct one.
#[derive(Debug)]
pub struct OverrideGrant {
    _private: (),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OverridePolicy {
    enabled: bool,
}

impl OverridePolicy {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Requires overrides to be switched on and the session's *resolved*
    /// role (not any active override) to be a primary admin.
    pub fn grant(&self, session: &SessionHolder) -> AppResult<OverrideGrant> {
        if !self.enabled {
            return Err(AppError::forbidden("role override is disabled"));
        }

        match session.resolved_descriptor() {
            Some(descriptor) if descriptor.is_primary_admin() => Ok(OverrideGrant { _private: () }),
            _ => {
                tracing::warn!(user_id = ?session.user_id(), "role override refused for non-operator");
                Err(AppError::forbidden("operator access required"))
            }
        }
    }
}
