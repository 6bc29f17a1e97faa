//! In-memory store doubles shared by the authz unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::oneshot;
use uuid::Uuid;

use super::resolver::{LicenseAssignmentStore, PrimaryRoleStore};
use crate::errors::{AppError, AppResult};
use crate::models::license::{LicenseAssignmentRecord, PrimaryRoleRecord};

#[derive(Default)]
pub struct FakePrimaryStore {
    roles: HashMap<Uuid, String>,
    fail: bool,
}

impl FakePrimaryStore {
    pub fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }

    pub fn with_role(mut self, user_id: Uuid, role: &str) -> Self {
        self.roles.insert(user_id, role.to_string());
        self
    }
}

#[async_trait]
impl PrimaryRoleStore for FakePrimaryStore {
    async fn find_role(&self, user_id: Uuid) -> AppResult<Option<PrimaryRoleRecord>> {
        if self.fail {
            return Err(AppError::internal("primary store unreachable"));
        }
        Ok(self.roles.get(&user_id).map(|role| PrimaryRoleRecord {
            user_id,
            role: role.clone(),
        }))
    }
}

#[derive(Default)]
pub struct FakeAssignmentStore {
    assignments: HashMap<Uuid, LicenseAssignmentRecord>,
    license_orgs: HashMap<Uuid, Uuid>,
    fail: bool,
    fail_org_lookup: bool,
}

impl FakeAssignmentStore {
    pub fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }

    pub fn with_assignment(mut self, user_id: Uuid, license_id: Uuid, access_level: &str) -> Self {
        self.assignments.insert(
            user_id,
            LicenseAssignmentRecord {
                id: Uuid::new_v4(),
                user_id,
                license_id,
                access_level: access_level.to_string(),
                assigned_at: Utc::now(),
            },
        );
        self
    }

    pub fn with_license_org(mut self, license_id: Uuid, organization_id: Uuid) -> Self {
        self.license_orgs.insert(license_id, organization_id);
        self
    }

    pub fn with_failing_org_lookup(mut self) -> Self {
        self.fail_org_lookup = true;
        self
    }
}

#[async_trait]
impl LicenseAssignmentStore for FakeAssignmentStore {
    async fn first_assignment(&self, user_id: Uuid) -> AppResult<Option<LicenseAssignmentRecord>> {
        if self.fail {
            return Err(AppError::internal("assignment store unreachable"));
        }
        Ok(self.assignments.get(&user_id).cloned())
    }

    async fn organization_for_license(&self, license_id: Uuid) -> AppResult<Option<Uuid>> {
        if self.fail || self.fail_org_lookup {
            return Err(AppError::internal("license lookup failed"));
        }
        Ok(self.license_orgs.get(&license_id).copied())
    }
}

/// Primary store whose answers are released by the test, one call at a time.
///
/// Each lookup takes the next queued gate and waits for the role string
/// sent through it, so a test decides in which order overlapping
/// resolutions complete.
#[derive(Default)]
pub struct GatedPrimaryStore {
    gates: Mutex<VecDeque<oneshot::Receiver<Option<String>>>>,
    calls: AtomicUsize,
}

impl GatedPrimaryStore {
    pub fn push_gate(&self) -> oneshot::Sender<Option<String>> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().push_back(rx);
        tx
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PrimaryRoleStore for GatedPrimaryStore {
    async fn find_role(&self, user_id: Uuid) -> AppResult<Option<PrimaryRoleRecord>> {
        let gate = self.gates.lock().unwrap().pop_front();
        self.calls.fetch_add(1, Ordering::SeqCst);
        let role = match gate {
            Some(rx) => rx.await.map_err(|_| AppError::internal("gate dropped"))?,
            None => None,
        };
        Ok(role.map(|role| PrimaryRoleRecord { user_id, role }))
    }
}
