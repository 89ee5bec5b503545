//! Per-session key/value storage and the features built on it.
//!
//! [`SessionStore`] stands in for browser session storage. Two small
//! helpers sit on top: [`PendingResume`] carries a generation request across
//! a sign-in round trip, and [`GuestQuota`] limits how many generations an
//! anonymous visitor may run.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

pub const PENDING_RESUME_KEY: &str = "planboard.pendingGeneration";
pub const GUEST_USAGE_KEY: &str = "planboard.guestGenerations";
pub const DEFAULT_GUEST_LIMIT: u32 = 3;

pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String);
    fn clear(&self, key: &str);
}

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).get(key).cloned()
    }

    fn set(&self, key: &str, value: String) {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).insert(key.to_string(), value);
    }

    fn clear(&self, key: &str) {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).remove(key);
    }
}

// =============================================================================
// PENDING RESUME
// =============================================================================

/// A generation the user asked for before being sent to sign in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingGeneration {
    /// Edge function name, e.g. `generate-bmc`.
    pub function: String,
    pub request: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}

pub struct PendingResume<'a> {
    store: &'a dyn SessionStore,
}

impl<'a> PendingResume<'a> {
    pub fn new(store: &'a dyn SessionStore) -> Self {
        Self { store }
    }

    /// Remember `pending`, replacing anything stashed earlier.
    pub fn stash(&self, pending: &PendingGeneration) -> Result<(), serde_json::Error> {
        let encoded = serde_json::to_string(pending)?;
        self.store.set(PENDING_RESUME_KEY, encoded);
        debug!(function = %pending.function, "session: generation stashed");
        Ok(())
    }

    /// Take the stashed request. It is consumed even when unreadable.
    #[must_use]
    pub fn take(&self) -> Option<PendingGeneration> {
        let raw = self.store.get(PENDING_RESUME_KEY)?;
        self.store.clear(PENDING_RESUME_KEY);
        match serde_json::from_str(&raw) {
            Ok(pending) => Some(pending),
            Err(e) => {
                warn!(error = %e, "session: discarding unreadable pending generation");
                None
            }
        }
    }
}

// =============================================================================
// GUEST QUOTA
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("guest generation limit of {limit} reached")]
pub struct QuotaExceeded {
    pub limit: u32,
}

impl crate::error::UserFacing for QuotaExceeded {
    fn error_code(&self) -> &'static str {
        "E_GUEST_QUOTA"
    }

    fn user_message(&self) -> String {
        format!("You have used all {} free generations. Sign in to keep going.", self.limit)
    }
}

pub struct GuestQuota<'a> {
    store: &'a dyn SessionStore,
    limit: u32,
}

impl<'a> GuestQuota<'a> {
    pub fn new(store: &'a dyn SessionStore) -> Self {
        Self::with_limit(store, DEFAULT_GUEST_LIMIT)
    }

    pub fn with_limit(store: &'a dyn SessionStore, limit: u32) -> Self {
        Self { store, limit }
    }

    /// Generations used so far. Unreadable counters count as zero.
    #[must_use]
    pub fn used(&self) -> u32 {
        self.store.get(GUEST_USAGE_KEY).and_then(|raw| raw.trim().parse().ok()).unwrap_or(0)
    }

    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.limit.saturating_sub(self.used())
    }

    /// Count one generation; returns how many remain afterwards.
    pub fn try_consume(&self) -> Result<u32, QuotaExceeded> {
        let used = self.used();
        if used >= self.limit {
            return Err(QuotaExceeded { limit: self.limit });
        }
        self.store.set(GUEST_USAGE_KEY, (used + 1).to_string());
        Ok(self.limit - used - 1)
    }

    pub fn reset(&self) {
        self.store.clear(GUEST_USAGE_KEY);
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
