//! Role resolution and role-gated access control
//!
//! - `resolver`: user id -> [`RoleDescriptor`] from the primary-role and
//!   license-assignment stores, falling back to least privilege
//! - `capability`: boolean flags derived from a descriptor
//! - `guard`: render / loading / fallback decisions over a session snapshot
//! - `session`: per-session descriptor cache with last-request-wins refresh
//! - `operator`: gated "preview as" override for operators

mod capability;
mod descriptor;
mod extract;
mod guard;
mod operator;
mod resolver;
mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use capability::{Capabilities, Capability};
pub use descriptor::{Role, RoleDescriptor, RoleSource};
pub use extract::RoleContext;
pub use guard::{AccessGuard, GuardDecision};
pub use operator::{OverrideGrant, OverridePolicy};
pub use resolver::{LicenseAssignmentStore, PrimaryRoleStore, RoleResolver};
pub use session::{ResolutionTicket, SessionHolder, SessionPhase, SessionRegistry, SessionSnapshot};
