use super::*;

// =============================================================
// Basics
// =============================================================

#[test]
fn new_history_holds_initial_only() {
    let h = History::new(0);
    assert_eq!(h.len(), 1);
    assert_eq!(h.current(), Some(&0));
    assert!(!h.can_undo());
    assert!(!h.can_redo());
    assert_eq!(h.cap(), 50);
}

#[test]
fn undo_at_start_is_none() {
    let mut h = History::new("a");
    assert!(h.undo().is_none());
    assert_eq!(h.cursor(), 0);
}

#[test]
fn redo_at_end_is_none() {
    let mut h = History::new("a");
    h.push("b");
    assert!(h.redo().is_none());
}

#[test]
fn undo_then_redo_walks_entries() {
    let mut h = History::new(1);
    h.push(2);
    h.push(3);
    assert_eq!(h.undo(), Some(&2));
    assert_eq!(h.undo(), Some(&1));
    assert_eq!(h.redo(), Some(&2));
    assert_eq!(h.redo(), Some(&3));
    assert_eq!(h.current(), Some(&3));
}

// =============================================================
// Round trip
// =============================================================

#[test]
fn undo_n_then_redo_n_reproduces_latest() {
    let mut h = History::new(vec![0]);
    let mut state = vec![0];
    for i in 1..=10 {
        state.push(i);
        h.push(state.clone());
    }
    for _ in 0..10 {
        assert!(h.undo().is_some());
    }
    assert_eq!(h.current(), Some(&vec![0]));
    let mut last = None;
    for _ in 0..10 {
        last = h.redo().cloned();
    }
    assert_eq!(last, Some(state));
}

// =============================================================
// Branching
// =============================================================

#[test]
fn push_after_undo_discards_redo_branch() {
    let mut h = History::new('a');
    h.push('b');
    h.push('c');
    h.undo();
    h.push('d');
    assert!(!h.can_redo());
    assert_eq!(h.len(), 3);
    assert_eq!(h.undo(), Some(&'b'));
    assert_eq!(h.redo(), Some(&'d'));
}

// =============================================================
// Cap
// =============================================================

#[test]
fn length_never_exceeds_cap() {
    let mut h = History::new(0);
    for i in 1..=200 {
        h.push(i);
        assert!(h.len() <= 50);
    }
    assert_eq!(h.len(), 50);
}

#[test]
fn fifty_first_snapshot_evicts_oldest() {
    let mut h = History::new(0);
    for i in 1..50 {
        h.push(i);
    }
    assert_eq!(h.len(), 50);
    h.push(50);
    assert_eq!(h.len(), 50);
    let mut oldest = 50;
    while let Some(v) = h.undo() {
        oldest = *v;
    }
    assert_eq!(oldest, 1);
}

#[test]
fn custom_cap_is_respected() {
    let mut h = History::with_cap(0, 3);
    for i in 1..=5 {
        h.push(i);
    }
    assert_eq!(h.len(), 3);
    assert_eq!(h.undo(), Some(&4));
    assert_eq!(h.undo(), Some(&3));
    assert!(h.undo().is_none());
}

#[test]
fn zero_cap_behaves_as_one() {
    let mut h = History::with_cap(0, 0);
    h.push(1);
    assert_eq!(h.len(), 1);
    assert_eq!(h.current(), Some(&1));
}

#[test]
fn reset_starts_over() {
    let mut h = History::new(0);
    h.push(1);
    h.push(2);
    h.reset(9);
    assert_eq!(h.len(), 1);
    assert_eq!(h.current(), Some(&9));
    assert!(!h.can_undo());
}
