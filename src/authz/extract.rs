use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::capability::Capability;
use super::descriptor::RoleDescriptor;
use super::guard::{AccessGuard, GuardDecision};
use super::session::{SessionHolder, SessionSnapshot};
use crate::app::AppState;
use crate::errors::{AppError, AppResult};
use crate::jwt::AuthUser;

/// Authenticated caller plus the role session backing the request.
///
/// The snapshot is taken once per request; guards evaluated from it all see
/// the same descriptor.
pub struct RoleContext {
    pub auth: AuthUser,
    pub session: Arc<SessionHolder>,
    pub snapshot: SessionSnapshot,
    show_loading_placeholder: bool,
}

impl RoleContext {
    pub fn guard(&self, capability: Capability) -> AccessGuard {
        AccessGuard::new(capability).with_loading_placeholder(self.show_loading_placeholder)
    }

    pub fn decide(&self, capability: Capability) -> GuardDecision {
        self.guard(capability).evaluate(&self.snapshot)
    }

    pub fn require(&self, capability: Capability) -> AppResult<RoleDescriptor> {
        self.guard(capability).require(&self.snapshot)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for RoleContext {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth = AuthUser::from_request_parts(parts, state).await?;
        let session = state
            .sessions
            .get_or_open(auth.session_id, auth.user_id, auth.expires_at)
            .await?;

        if session.current_descriptor().is_none() {
            session.refresh().await;
        }

        let snapshot = session.snapshot();
        Ok(Self {
            auth,
            session,
            snapshot,
            show_loading_placeholder: state.guard.show_loading_placeholder,
        })
    }
}
