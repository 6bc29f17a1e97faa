//! Session-scoped role cache.
//!
//! A [`SessionHolder`] keeps the last resolved [`RoleDescriptor`] for one
//! authenticated session. Every resolution is tagged with a token issued in
//! request order, and a completed resolution is applied only if no newer one
//! has been applied already and no sign-in/sign-out happened after it was
//! issued. Completion order never decides which result is kept.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::descriptor::RoleDescriptor;
use super::operator::OverrideGrant;
use super::resolver::RoleResolver;
use crate::errors::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Unresolved,
    Resolving,
    Resolved,
}

/// Point-in-time view of a session, as consumed by access guards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub descriptor: Option<RoleDescriptor>,
    pub phase: SessionPhase,
    pub override_active: bool,
}

/// Handle for one in-flight resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolutionTicket {
    pub token: u64,
    pub user_id: Uuid,
}

#[derive(Debug, Default)]
struct SessionState {
    user_id: Option<Uuid>,
    resolved: Option<RoleDescriptor>,
    override_descriptor: Option<RoleDescriptor>,
    /// Highest token handed out so far.
    issued: u64,
    /// Token of the result currently held in `resolved`.
    applied: u64,
    /// Tokens at or below this were issued before the last sign-in/sign-out.
    floor: u64,
}

impl SessionState {
    fn is_resolving(&self) -> bool {
        self.user_id.is_some() && self.issued > self.applied && self.issued > self.floor
    }

    fn phase(&self) -> SessionPhase {
        if self.user_id.is_none() {
            SessionPhase::Unresolved
        } else if self.is_resolving() {
            SessionPhase::Resolving
        } else if self.resolved.is_some() {
            SessionPhase::Resolved
        } else {
            SessionPhase::Unresolved
        }
    }

    fn reset(&mut self, user_id: Option<Uuid>) {
        self.user_id = user_id;
        self.resolved = None;
        self.override_descriptor = None;
        self.floor = self.issued;
        self.applied = self.issued;
    }
}

pub struct SessionHolder {
    resolver: RoleResolver,
    state: Mutex<SessionState>,
}

impl SessionHolder {
    pub fn new(resolver: RoleResolver) -> Self {
        Self {
            resolver,
            state: Mutex::new(SessionState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.state().user_id
    }

    /// Binds the session to `user_id` and resolves its role.
    ///
    /// Anything resolved for a previous user, including results still in
    /// flight, is discarded.
    pub async fn sign_in(&self, user_id: Uuid) -> Option<RoleDescriptor> {
        self.bind(user_id);
        self.refresh().await
    }

    /// The synchronous half of [`sign_in`](Self::sign_in): binds the user
    /// without resolving.
    fn bind(&self, user_id: Uuid) {
        self.state().reset(Some(user_id));
        tracing::debug!(user_id = %user_id, "session signed in");
    }

    /// Drops the held descriptor and any override. In-flight resolutions are
    /// ignored when they land.
    pub fn sign_out(&self) {
        let mut state = self.state();
        if let Some(user_id) = state.user_id {
            tracing::debug!(user_id = %user_id, "session signed out");
        }
        state.reset(None);
    }

    /// Re-resolves the role for the current user.
    ///
    /// No-op while an operator override is active or when nobody is signed
    /// in. Returns the descriptor held once this call settles, which may come
    /// from a newer concurrent refresh.
    pub async fn refresh(&self) -> Option<RoleDescriptor> {
        let Some(ticket) = self.begin_resolution() else {
            return self.current_descriptor();
        };
        let descriptor = self.resolver.resolve(ticket.user_id).await;
        self.complete_resolution(ticket, descriptor);
        self.current_descriptor()
    }

    /// Issues a token for a new resolution of the current user.
    pub fn begin_resolution(&self) -> Option<ResolutionTicket> {
        let mut state = self.state();
        if state.override_descriptor.is_some() {
            return None;
        }
        let user_id = state.user_id?;
        state.issued += 1;
        Some(ResolutionTicket {
            token: state.issued,
            user_id,
        })
    }

    /// Applies a finished resolution unless something newer already won.
    /// Returns whether the descriptor was kept.
    pub fn complete_resolution(&self, ticket: ResolutionTicket, descriptor: RoleDescriptor) -> bool {
        let mut state = self.state();
        let current_user = state.user_id == Some(ticket.user_id);
        if !current_user || ticket.token <= state.floor || ticket.token <= state.applied {
            tracing::debug!(
                user_id = %ticket.user_id,
                token = ticket.token,
                applied = state.applied,
                "discarding stale role resolution"
            );
            return false;
        }
        state.applied = ticket.token;
        state.resolved = Some(descriptor);
        true
    }

    /// The descriptor consumers should act on: the operator override when
    /// one is active, otherwise the last resolved value.
    pub fn current_descriptor(&self) -> Option<RoleDescriptor> {
        let state = self.state();
        state.override_descriptor.clone().or_else(|| state.resolved.clone())
    }

    /// The genuinely resolved descriptor, ignoring any override.
    pub fn resolved_descriptor(&self) -> Option<RoleDescriptor> {
        self.state().resolved.clone()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state();
        SessionSnapshot {
            descriptor: state.override_descriptor.clone().or_else(|| state.resolved.clone()),
            phase: state.phase(),
            override_active: state.override_descriptor.is_some(),
        }
    }

    pub fn set_override(&self, _grant: &OverrideGrant, descriptor: RoleDescriptor) {
        let mut state = self.state();
        tracing::info!(
            user_id = ?state.user_id,
            role = %descriptor.role(),
            source = %descriptor.source(),
            "operator role override enabled"
        );
        state.override_descriptor = Some(descriptor);
    }

    pub fn clear_override(&self) {
        let mut state = self.state();
        if state.override_descriptor.take().is_some() {
            tracing::info!(user_id = ?state.user_id, "operator role override cleared");
        }
    }
}

/// Sessions keyed by the JWT `sid`, each tracked until its token expires.
///
/// `open` is the sign-in hook, `close` the sign-out hook. A closed session
/// leaves a tombstone behind until its expiry so the same token cannot
/// reopen it. Expired entries are evicted whenever a session is opened.
#[derive(Clone)]
pub struct SessionRegistry {
    resolver: RoleResolver,
    sessions: Arc<RwLock<HashMap<Uuid, SessionEntry>>>,
}

struct SessionEntry {
    /// `None` once the session has been signed out.
    holder: Option<Arc<SessionHolder>>,
    /// Unix timestamp of the token's `exp`.
    expires_at: i64,
}

impl SessionEntry {
    fn is_expired(&self, now: i64) -> bool {
        self.expires_at < now
    }
}

impl SessionRegistry {
    pub fn new(resolver: RoleResolver) -> Self {
        Self {
            resolver,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn resolver(&self) -> &RoleResolver {
        &self.resolver
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<Uuid, SessionEntry>> {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Uuid, SessionEntry>> {
        self.sessions.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// The live, unexpired session for `session_id`.
    pub fn get(&self, session_id: Uuid) -> Option<Arc<SessionHolder>> {
        let now = Utc::now().timestamp();
        self.read()
            .get(&session_id)
            .filter(|entry| !entry.is_expired(now))
            .and_then(|entry| entry.holder.clone())
    }

    /// Whether `session_id` was signed out and its token has not expired yet.
    pub fn is_closed(&self, session_id: Uuid) -> bool {
        let now = Utc::now().timestamp();
        self.read()
            .get(&session_id)
            .is_some_and(|entry| entry.holder.is_none() && !entry.is_expired(now))
    }

    /// Creates (or replaces) the session and resolves the user's role.
    pub async fn open(&self, session_id: Uuid, user_id: Uuid, expires_at: i64) -> Arc<SessionHolder> {
        let holder = Arc::new(SessionHolder::new(self.resolver.clone()));
        holder.bind(user_id);

        let previous = {
            let mut sessions = self.write();
            evict_expired(&mut sessions, Utc::now().timestamp());
            sessions.insert(
                session_id,
                SessionEntry {
                    holder: Some(Arc::clone(&holder)),
                    expires_at,
                },
            )
        };
        if let Some(previous) = previous.and_then(|entry| entry.holder) {
            previous.sign_out();
        }

        holder.refresh().await;
        holder
    }

    /// Returns the live session for `session_id` if it belongs to `user_id`,
    /// opening a fresh one otherwise. Fails for a session that was signed
    /// out.
    ///
    /// Lookup and insert happen under one write lock, so concurrent first
    /// requests for the same session share a single holder.
    pub async fn get_or_open(&self, session_id: Uuid, user_id: Uuid, expires_at: i64) -> AppResult<Arc<SessionHolder>> {
        let (holder, replaced) = {
            let mut sessions = self.write();
            let now = Utc::now().timestamp();
            evict_expired(&mut sessions, now);

            match sessions.entry(session_id) {
                Entry::Occupied(mut occupied) => match occupied.get().holder.clone() {
                    None => return Err(AppError::unauthorized("session has been signed out")),
                    Some(holder) if holder.user_id() == Some(user_id) => return Ok(holder),
                    Some(previous) => {
                        let holder = Arc::new(SessionHolder::new(self.resolver.clone()));
                        holder.bind(user_id);
                        occupied.insert(SessionEntry {
                            holder: Some(Arc::clone(&holder)),
                            expires_at,
                        });
                        (holder, Some(previous))
                    }
                },
                Entry::Vacant(vacant) => {
                    let holder = Arc::new(SessionHolder::new(self.resolver.clone()));
                    holder.bind(user_id);
                    vacant.insert(SessionEntry {
                        holder: Some(Arc::clone(&holder)),
                        expires_at,
                    });
                    (holder, None)
                }
            }
        };
        if let Some(previous) = replaced {
            previous.sign_out();
        }

        tracing::debug!(session_id = %session_id, user_id = %user_id, "role session reopened");
        holder.refresh().await;
        Ok(holder)
    }

    /// Signs the session out and keeps a tombstone until `expires_at`, even
    /// when no live session was tracked. Returns whether a live session
    /// existed.
    pub fn close(&self, session_id: Uuid, expires_at: i64) -> bool {
        let removed = self
            .write()
            .entry(session_id)
            .or_insert(SessionEntry {
                holder: None,
                expires_at,
            })
            .holder
            .take();
        match removed {
            Some(holder) => {
                holder.sign_out();
                true
            }
            None => false,
        }
    }

    /// Number of live, unexpired sessions.
    pub fn len(&self) -> usize {
        let now = Utc::now().timestamp();
        self.read()
            .values()
            .filter(|entry| entry.holder.is_some() && !entry.is_expired(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn evict_expired(sessions: &mut HashMap<Uuid, SessionEntry>, now: i64) {
    sessions.retain(|session_id, entry| {
        if !entry.is_expired(now) {
            return true;
        }
        if let Some(holder) = entry.holder.take() {
            tracing::debug!(session_id = %session_id, "evicting expired role session");
            holder.sign_out();
        }
        false
    });
}
