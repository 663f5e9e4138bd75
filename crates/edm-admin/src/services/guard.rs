//! Concurrency control for orchestrations
//!
//! Each orchestration holds a permit for the entity key it mutates. A second
//! invocation for the same key while the first is running is rejected with
//! `OperationInProgress` instead of applying its side effects twice.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{AdminError, AdminResult};
use crate::security::normalize_name;

/// Key identifying the entity an orchestration mutates
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationKey(String);

impl OperationKey {
    pub fn company(name_or_id: &str) -> Self {
        OperationKey(format!("company:{}", normalize_name(name_or_id)))
    }

    pub fn area(company: &str, area: &str) -> Self {
        OperationKey(format!(
            "area:{}/{}",
            normalize_name(company),
            normalize_name(area)
        ))
    }

    pub fn user(email: &str) -> Self {
        OperationKey(format!("user:{}", crate::models::normalize_email(email)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OperationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Set of keys with an orchestration in flight
#[derive(Clone, Default)]
pub struct OperationGuard {
    active: Arc<Mutex<HashSet<OperationKey>>>,
}

impl OperationGuard {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<OperationKey>> {
        // The set stays consistent even if a holder panicked
        self.active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Claim `key`, failing if another orchestration holds it
    pub fn acquire(&self, key: OperationKey) -> AdminResult<OperationPermit> {
        let mut active = self.lock();
        if !active.insert(key.clone()) {
            tracing::warn!(key = %key, "Duplicate operation rejected");
            return Err(AdminError::OperationInProgress {
                key: key.to_string(),
            });
        }
        Ok(OperationPermit {
            keys: vec![key],
            guard: self.clone(),
        })
    }

    /// Claim several keys at once, all or nothing
    pub fn acquire_all(&self, keys: impl IntoIterator<Item = OperationKey>) -> AdminResult<OperationPermit> {
        let mut wanted: Vec<OperationKey> = keys.into_iter().collect();
        wanted.dedup();
        let mut active = self.lock();
        if let Some(busy) = wanted.iter().find(|k| active.contains(*k)) {
            tracing::warn!(key = %busy, "Duplicate operation rejected");
            return Err(AdminError::OperationInProgress {
                key: busy.to_string(),
            });
        }
        active.extend(wanted.iter().cloned());
        Ok(OperationPermit {
            keys: wanted,
            guard: self.clone(),
        })
    }

    pub fn is_active(&self, key: &OperationKey) -> bool {
        self.lock().contains(key)
    }
}

/// Releases its keys when dropped
pub struct OperationPermit {
    keys: Vec<OperationKey>,
    guard: OperationGuard,
}

impl Drop for OperationPermit {
    fn drop(&mut self) {
        let mut active = self.guard.lock();
        for key in &self.keys {
            active.remove(key);
        }
    }
}
