//! Integration tests for entity identifiers

use std::collections::HashSet;

use linkage_foundation::{ClassId, EntityId};

#[test]
fn entity_ids_compare_by_class_and_slot() {
    let a = EntityId::new(ClassId::new(1), 0);
    let b = EntityId::new(ClassId::new(1), 1);
    let c = EntityId::new(ClassId::new(2), 0);

    assert_ne!(a, b);
    assert_ne!(a, c);
    assert_eq!(a, EntityId::new(ClassId::new(1), 0));
}

#[test]
fn role_tags_wrap_the_same_id() {
    let id = EntityId::new(ClassId::new(3), 7);

    assert_eq!(id.as_child().id(), id);
    assert_eq!(id.as_parent().id(), id);
    assert_eq!(id.as_child().class(), ClassId::new(3));
    assert_eq!(id.as_parent().slot(), 7);
}

#[test]
fn role_tagged_ids_work_as_set_keys() {
    let children: HashSet<_> = (0..4)
        .map(|slot| EntityId::new(ClassId::new(1), slot).as_child())
        .chain(std::iter::once(EntityId::new(ClassId::new(1), 2).as_child()))
        .collect();

    assert_eq!(children.len(), 4);
}

#[test]
fn formatting() {
    let id = EntityId::new(ClassId::new(4), 12);

    assert_eq!(format!("{id}"), "Entity(4:12)");
    assert_eq!(format!("{:?}", id.as_child()), "ChildEntityId(id=EntityId(4:12))");
    assert_eq!(format!("{:?}", id.as_parent()), "ParentEntityId(id=EntityId(4:12))");
}
