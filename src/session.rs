// Operator session state: confirmation gate and cached snapshots

use crate::remote::models::{Policy, StatusSnapshot};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// The identity the caller authenticated, plus the authorization verdict
/// the identity layer reached for it. The core never derives the verdict
/// itself.
#[derive(Debug, Clone)]
pub struct Operator {
    pub identity: String,
    pub authorized: bool,
}

impl Operator {
    pub fn new(identity: impl Into<String>, authorized: bool) -> Self {
        Self {
            identity: identity.into(),
            authorized,
        }
    }
}

#[derive(Default)]
struct GroupSession {
    pending: Option<Policy>,
    snapshot: Option<StatusSnapshot>,
}

/// Per-operator session state, owned by the caller for its lifetime.
///
/// Holds the pending-confirmation flag and the last snapshot for each
/// group. Nothing here is process-global; a presentation layer creates one
/// session per authenticated operator.
pub struct Session {
    operator: Operator,
    groups: Mutex<HashMap<String, GroupSession>>,
}

impl Session {
    pub fn new(operator: Operator) -> Self {
        Self {
            operator,
            groups: Mutex::new(HashMap::new()),
        }
    }

    pub fn operator(&self) -> &Operator {
        &self.operator
    }

    /// Record the intent to restart a group under the chosen policy.
    /// Re-requesting before confirmation overwrites the policy; the
    /// operator's latest intent wins.
    pub fn request_restart(&self, group_id: &str, policy: Policy) {
        let mut groups = self.lock();
        groups.entry(group_id.to_string()).or_default().pending = Some(policy);
    }

    /// One-shot read of the pending intent: returns the recorded policy
    /// only if a request is pending, and clears it in the same locked
    /// step. A re-rendered confirmation therefore cannot execute twice.
    pub fn consume_restart(&self, group_id: &str) -> Option<Policy> {
        let mut groups = self.lock();
        groups.get_mut(group_id).and_then(|g| g.pending.take())
    }

    /// Replace the cached snapshot for a group
    pub fn store_snapshot(&self, group_id: &str, snapshot: StatusSnapshot) {
        let mut groups = self.lock();
        groups.entry(group_id.to_string()).or_default().snapshot = Some(snapshot);
    }

    /// Last stored snapshot for a group, if any
    pub fn snapshot(&self, group_id: &str) -> Option<StatusSnapshot> {
        let groups = self.lock();
        groups.get(group_id).and_then(|g| g.snapshot.clone())
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, GroupSession>> {
        match self.groups.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
