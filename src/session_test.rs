use super::*;
use crate::error::UserFacing;
use serde_json::json;

// =============================================================================
// Store
// =============================================================================

#[test]
fn memory_store_get_set_clear() {
    let store = MemorySessionStore::new();
    assert_eq!(store.get("k"), None);
    store.set("k", "v1".into());
    store.set("k", "v2".into());
    assert_eq!(store.get("k").as_deref(), Some("v2"));
    store.clear("k");
    assert_eq!(store.get("k"), None);
    store.clear("never-set");
}

// =============================================================================
// Pending resume
// =============================================================================

fn pending() -> PendingGeneration {
    PendingGeneration {
        function: "generate-bmc".into(),
        request: json!({ "companyName": "Acme" }),
        project_id: Some("p1".into()),
    }
}

#[test]
fn pending_is_taken_once() {
    let store = MemorySessionStore::new();
    let resume = PendingResume::new(&store);
    assert_eq!(resume.take(), None);

    resume.stash(&pending()).unwrap();
    assert_eq!(resume.take(), Some(pending()));
    assert_eq!(resume.take(), None);
}

#[test]
fn stash_replaces_previous() {
    let store = MemorySessionStore::new();
    let resume = PendingResume::new(&store);
    resume.stash(&pending()).unwrap();
    let newer = PendingGeneration { function: "generate-user-stories".into(), ..pending() };
    resume.stash(&newer).unwrap();
    assert_eq!(resume.take().unwrap().function, "generate-user-stories");
}

#[test]
fn corrupt_pending_is_discarded() {
    let store = MemorySessionStore::new();
    store.set(PENDING_RESUME_KEY, "{not json".into());
    assert_eq!(PendingResume::new(&store).take(), None);
    assert_eq!(store.get(PENDING_RESUME_KEY), None);
}

// =============================================================================
// Guest quota
// =============================================================================

#[test]
fn quota_counts_down_to_exhaustion() {
    let store = MemorySessionStore::new();
    let quota = GuestQuota::new(&store);
    assert_eq!(quota.remaining(), 3);
    assert_eq!(quota.try_consume(), Ok(2));
    assert_eq!(quota.try_consume(), Ok(1));
    assert_eq!(quota.try_consume(), Ok(0));
    assert_eq!(quota.try_consume(), Err(QuotaExceeded { limit: 3 }));
    assert_eq!(quota.used(), 3);
    assert_eq!(quota.remaining(), 0);
}

#[test]
fn quota_reset_and_custom_limit() {
    let store = MemorySessionStore::new();
    let quota = GuestQuota::with_limit(&store, 1);
    quota.try_consume().unwrap();
    assert!(quota.try_consume().is_err());
    quota.reset();
    assert_eq!(quota.remaining(), 1);
}

#[test]
fn quota_shares_state_through_the_store() {
    let store = MemorySessionStore::new();
    GuestQuota::new(&store).try_consume().unwrap();
    assert_eq!(GuestQuota::new(&store).remaining(), 2);
}

#[test]
fn unreadable_counter_counts_as_zero() {
    let store = MemorySessionStore::new();
    store.set(GUEST_USAGE_KEY, "lots".into());
    assert_eq!(GuestQuota::new(&store).used(), 0);
}

#[test]
fn quota_error_is_user_facing() {
    let err = QuotaExceeded { limit: 3 };
    assert_eq!(err.error_code(), "E_GUEST_QUOTA");
    assert!(err.user_message().contains("3 free generations"));
}
