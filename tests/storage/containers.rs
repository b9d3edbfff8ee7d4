//! Integration tests for relation containers
//!
//! Tests dense slot-indexed maps and polymorphic bidirectional maps.

use linkage_foundation::{ClassId, EntityId, ErrorKind};
use linkage_storage::{
    EntityBiMap, LinkedBidirectionalMap, MutableOneToManyMap, MutableOneToOneMap, OneToManyView,
    OneToOneView,
};

// =============================================================================
// Dense Containers
// =============================================================================

#[test]
fn one_to_many_keeps_insertion_order() {
    let mut map = MutableOneToManyMap::new();
    map.put_all(&[5, 1, 3], 0);
    map.put(2, 0);

    assert_eq!(map.keys(0), &[5, 1, 3, 2]);
    assert_eq!(map.get(3), Some(0));
    assert_eq!(map.len(), 4);
}

#[test]
fn one_to_many_moves_children() {
    let mut map = MutableOneToManyMap::new();
    map.put_all(&[0, 1], 0);
    map.put(1, 7);

    assert_eq!(map.keys(0), &[0]);
    assert_eq!(map.keys(7), &[1]);
    assert_eq!(map.len(), 2);
}

#[test]
fn one_to_many_freeze_and_thaw() {
    let mut map = MutableOneToManyMap::new();
    map.put_all(&[9, 4], 2);
    let frozen = map.into_immutable();

    assert_eq!(frozen.keys(2), &[9, 4]);
    assert_eq!(frozen.get(100), None);

    let mut thawed = frozen.to_mutable();
    assert_eq!(thawed.remove_value(2), vec![9, 4]);
    assert!(thawed.is_empty());
    assert_eq!(frozen.len(), 2);
}

#[test]
fn one_to_one_strict_put_rejects_rebinding() {
    let mut map = MutableOneToOneMap::new();
    map.put(1, 10).unwrap();
    map.put(1, 10).unwrap();

    let err = map.put(2, 10).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::OneToOneViolation { .. }));

    map.put_force(2, 10);
    assert_eq!(map.get_key(10), Some(2));
    assert_eq!(map.get(1), None);
}

#[test]
fn one_to_one_freeze_keeps_both_directions() {
    let mut map = MutableOneToOneMap::new();
    map.put(3, 30).unwrap();
    map.put(4, 40).unwrap();
    map.remove_key(4);
    let frozen = map.into_immutable();

    assert_eq!(frozen.get(3), Some(30));
    assert_eq!(frozen.get_key(30), Some(3));
    assert_eq!(frozen.get_key(40), None);
    assert_eq!(frozen.iter().collect::<Vec<_>>(), vec![(3, 30)]);
}

// =============================================================================
// Polymorphic Containers
// =============================================================================

#[test]
fn linked_map_orders_children_per_parent() {
    let folder = EntityId::new(ClassId::new(0), 0).as_parent();
    let a = EntityId::new(ClassId::new(1), 4).as_child();
    let b = EntityId::new(ClassId::new(2), 1).as_child();
    let mut map = LinkedBidirectionalMap::new();

    map.insert(a, folder);
    map.insert(b, folder);

    assert_eq!(map.keys_by_value(folder).collect::<Vec<_>>(), vec![a, b]);
    assert_eq!(map.remove_value(folder), vec![a, b]);
    assert!(map.is_empty());
}

#[test]
fn bimap_inverse_view() {
    let parent = EntityId::new(ClassId::new(0), 1).as_parent();
    let child = EntityId::new(ClassId::new(1), 2).as_child();
    let mut map = EntityBiMap::new();

    map.insert(child, parent).unwrap();

    assert_eq!(map.inverse().get(parent), Some(child));
    assert!(map.inverse().contains_key(parent));
    assert!(map.insert(EntityId::new(ClassId::new(1), 3).as_child(), parent).is_err());
    assert!(map.remove_pair(child, parent));
    assert!(map.inverse().get(parent).is_none());
}
