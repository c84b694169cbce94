//! HandlePool Tests
//!
//! Tests for:
//! - Insert / get round-trip
//! - Generation bump on removal and slot reuse
//! - Panicking accessors for stale, null and out-of-range handles
//! - Iteration order and length bookkeeping

use dusk::core::{Handle, HandlePool};

enum ThingTag {}
type ThingHandle = Handle<ThingTag>;
type ThingPool = HandlePool<String, ThingTag>;

// ============================================================================
// Round-trip
// ============================================================================

#[test]
fn insert_then_get_returns_value() {
    let mut pool = ThingPool::new();
    let h = pool.insert("albedo".to_string());
    assert_eq!(pool.get(h), "albedo");
    assert!(pool.is_valid(h));
    assert_eq!(pool.len(), 1);
}

#[test]
fn handles_are_distinct() {
    let mut pool = ThingPool::new();
    let a = pool.insert("a".into());
    let b = pool.insert("b".into());
    assert_ne!(a, b);
    assert_eq!(pool.get(a), "a");
    assert_eq!(pool.get(b), "b");
}

#[test]
fn get_mut_modifies_in_place() {
    let mut pool = ThingPool::new();
    let h = pool.insert("old".into());
    pool.get_mut(h).push_str("-new");
    assert_eq!(pool.get(h), "old-new");
}

// ============================================================================
// Removal and Generations
// ============================================================================

#[test]
fn removed_handle_is_invalid() {
    let mut pool = ThingPool::new();
    let h = pool.insert("gone".into());
    assert_eq!(pool.remove(h), "gone");
    assert!(!pool.is_valid(h));
    assert!(pool.try_get(h).is_none());
    assert!(pool.is_empty());
}

#[test]
fn freed_slot_is_reused_with_new_generation() {
    let mut pool = ThingPool::new();
    let old = pool.insert("first".into());
    pool.remove(old);
    let new = pool.insert("second".into());

    assert_eq!(new.index(), old.index());
    assert_eq!(new.generation(), old.generation() + 1);
    assert!(!pool.is_valid(old));
    assert_eq!(pool.get(new), "second");
}

#[test]
fn generation_climbs_on_every_reuse() {
    let mut pool = ThingPool::new();
    let first = pool.insert("0".into());
    let mut last = first;
    for round in 1..=5u32 {
        pool.remove(last);
        last = pool.insert(round.to_string());
        assert_eq!(last.index(), first.index());
        assert_eq!(last.generation(), first.generation() + round);
    }
    assert!(!pool.is_valid(first));
    assert_eq!(pool.len(), 1);
}

#[test]
fn handle_survives_unrelated_removals() {
    let mut pool = ThingPool::new();
    let keep = pool.insert("keep".into());
    for _ in 0..3 {
        let temp = pool.insert("temp".into());
        pool.remove(temp);
    }
    assert_eq!(pool.get(keep), "keep");
    assert_eq!(pool.iter().count(), 1);
}

#[test]
#[should_panic(expected = "stale generation")]
fn get_with_stale_handle_panics() {
    let mut pool = ThingPool::new();
    let h = pool.insert("x".into());
    pool.remove(h);
    pool.insert("y".into());
    let _ = pool.get(h);
}

#[test]
#[should_panic(expected = "null handle")]
fn get_with_null_handle_panics() {
    let pool = ThingPool::new();
    let _ = pool.get(ThingHandle::INVALID);
}

#[test]
#[should_panic(expected = "out of range")]
fn get_with_out_of_range_handle_panics() {
    let pool = ThingPool::new();
    let _ = pool.get(ThingHandle::from_raw_parts(3, 0));
}

#[test]
#[should_panic]
fn remove_twice_panics() {
    let mut pool = ThingPool::new();
    let h = pool.insert("x".into());
    pool.remove(h);
    pool.remove(h);
}

#[test]
fn try_get_mut_rejects_stale_handle() {
    let mut pool = ThingPool::new();
    let h = pool.insert("x".into());
    pool.remove(h);
    assert!(pool.try_get_mut(h).is_none());
}

// ============================================================================
// Handle Basics
// ============================================================================

#[test]
fn default_handle_is_null() {
    let h = ThingHandle::default();
    assert!(h.is_null());
    assert_eq!(h, ThingHandle::INVALID);
}

#[test]
fn null_handle_is_never_valid() {
    let mut pool = ThingPool::new();
    pool.insert("x".into());
    assert!(!pool.is_valid(ThingHandle::INVALID));
}

// ============================================================================
// Iteration
// ============================================================================

#[test]
fn iter_skips_vacant_slots() {
    let mut pool = ThingPool::new();
    let a = pool.insert("a".into());
    let b = pool.insert("b".into());
    let c = pool.insert("c".into());
    pool.remove(b);

    let seen: Vec<_> = pool.iter().map(|(h, v)| (h, v.clone())).collect();
    assert_eq!(seen, vec![(a, "a".to_string()), (c, "c".to_string())]);
    assert_eq!(pool.len(), 2);
}
