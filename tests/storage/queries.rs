//! Integration tests for the query surface
//!
//! Tests connection lookup and the aggregation queries across dense and
//! polymorphic connections.

use linkage_foundation::{ClassId, ClassRegistry, EntityId, ErrorKind};
use linkage_storage::{ConnectionId, ConnectionKind, RefsConfig, RefsRead, RefsTable};

struct Model {
    classes: ClassRegistry,
    module: ClassId,
    library: ClassId,
    facet: ClassId,
    java_facet: ClassId,
    root: ClassId,
}

fn model() -> Model {
    let mut classes = ClassRegistry::new();
    let module = classes.register("Module", &[]).unwrap();
    let library = classes.register("Library", &[]).unwrap();
    let facet = classes.register("Facet", &[]).unwrap();
    let java_facet = classes.register("JavaFacet", &[facet]).unwrap();
    let root = classes.register("ContentRoot", &[]).unwrap();
    Model {
        classes,
        module,
        library,
        facet,
        java_facet,
        root,
    }
}

// =============================================================================
// Connection Lookup
// =============================================================================

#[test]
fn find_connection_id_by_classes() {
    let m = model();
    let roots = ConnectionId::create(m.module, m.root, ConnectionKind::OneToMany, false);
    let facets = ConnectionId::create(m.module, m.facet, ConnectionKind::OneToAbstractMany, true);
    let mut table = RefsTable::new().to_mutable();
    table.replace_parent_of_child(roots, EntityId::new(m.root, 0).as_child(), EntityId::new(m.module, 0).as_parent());
    table.replace_parent_of_child(
        facets,
        EntityId::new(m.java_facet, 0).as_child(),
        EntityId::new(m.module, 0).as_parent(),
    );
    let table = table.into_immutable();

    assert_eq!(table.find_connection_id(m.module, m.root, &m.classes).unwrap(), Some(roots));
    assert_eq!(table.find_connection_id(m.module, m.java_facet, &m.classes).unwrap(), Some(facets));
    assert_eq!(table.find_connection_id(m.library, m.root, &m.classes).unwrap(), None);
    assert_eq!(table.connections().len(), 2);
}

// =============================================================================
// Aggregation
// =============================================================================

#[test]
fn parent_refs_span_every_kind() {
    let m = model();
    let roots = ConnectionId::create(m.module, m.java_facet, ConnectionKind::OneToMany, false);
    let single = ConnectionId::create(m.library, m.java_facet, ConnectionKind::OneToOne, true);
    let facets = ConnectionId::create(m.module, m.facet, ConnectionKind::OneToAbstractMany, true);
    let main = ConnectionId::create(m.library, m.facet, ConnectionKind::AbstractOneToOne, true);
    let facet = EntityId::new(m.java_facet, 3).as_child();

    let mut table = RefsTable::new().to_mutable();
    table.replace_parent_of_child(roots, facet, EntityId::new(m.module, 0).as_parent());
    table.replace_parent_of_child(single, facet, EntityId::new(m.library, 1).as_parent());
    table.replace_parent_of_child(facets, facet, EntityId::new(m.module, 2).as_parent());
    table.replace_parent_of_child(main, facet, EntityId::new(m.library, 3).as_parent());
    let table = table.into_immutable();

    let all = table.get_parent_refs_of_child(facet, &m.classes).unwrap();
    assert_eq!(all.len(), 4);
    assert_eq!(all[&roots], EntityId::new(m.module, 0).as_parent());
    assert_eq!(all[&main], EntityId::new(m.library, 3).as_parent());

    let one_to_one = table.get_parent_one_to_one_refs_of_child(facet, &m.classes).unwrap();
    let mut found: Vec<_> = one_to_one.keys().copied().collect();
    found.sort();
    let mut expected = vec![single, main];
    expected.sort();
    assert_eq!(found, expected);
}

#[test]
fn children_refs_group_by_connection() {
    let m = model();
    let roots = ConnectionId::create(m.module, m.root, ConnectionKind::OneToMany, true);
    let facets = ConnectionId::create(m.module, m.facet, ConnectionKind::OneToAbstractMany, true);
    let module = EntityId::new(m.module, 0).as_parent();
    let root_children = [EntityId::new(m.root, 2).as_child(), EntityId::new(m.root, 1).as_child()];
    let facet_children = [
        EntityId::new(m.java_facet, 0).as_child(),
        EntityId::new(m.facet, 0).as_child(),
    ];

    let mut table = RefsTable::new().to_mutable();
    table.replace_children_of_parent(roots, module, &root_children).unwrap();
    table.replace_children_of_parent(facets, module, &facet_children).unwrap();

    let refs = table.get_children_refs_of_parent_by(module, &m.classes).unwrap();
    assert_eq!(refs.len(), 2);
    assert_eq!(refs[&roots], root_children.to_vec());
    assert_eq!(refs[&facets], facet_children.to_vec());

    let other = table
        .get_children_refs_of_parent_by(EntityId::new(m.module, 1).as_parent(), &m.classes)
        .unwrap();
    assert!(other.is_empty());
}

#[test]
fn strict_config_leaves_clean_queries_alone() {
    let m = model();
    let facets = ConnectionId::create(m.module, m.facet, ConnectionKind::OneToAbstractMany, false);
    let mut table = RefsTable::with_config(RefsConfig::strict()).to_mutable();
    table.replace_parent_of_child(
        facets,
        EntityId::new(m.java_facet, 0).as_child(),
        EntityId::new(m.module, 0).as_parent(),
    );
    let table = table.into_immutable();

    let refs = table
        .get_parent_refs_of_child(EntityId::new(m.java_facet, 0).as_child(), &m.classes)
        .unwrap();
    assert_eq!(refs.len(), 1);
}

#[test]
fn unregistered_class_is_reported() {
    let m = model();
    let facets = ConnectionId::create(m.module, m.facet, ConnectionKind::OneToAbstractMany, false);
    let mut table = RefsTable::new().to_mutable();
    table.replace_parent_of_child(
        facets,
        EntityId::new(m.java_facet, 0).as_child(),
        EntityId::new(m.module, 0).as_parent(),
    );

    let err = table
        .get_children_refs_of_parent_by(EntityId::new(ClassId::new(9_999), 0).as_parent(), &m.classes)
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnknownClass(_)));
}

#[test]
fn narrow_accessors_miss_quietly() {
    let m = model();
    let conn = ConnectionId::create(m.library, m.root, ConnectionKind::OneToOne, true);
    let table = RefsTable::new();

    assert_eq!(table.get_one_to_one_child(conn, 0), None);
    assert_eq!(table.get_one_to_one_parent(conn, 0), None);
    assert_eq!(
        table.get_abstract_one_to_one_children(conn, EntityId::new(m.library, 0).as_parent()),
        None
    );
}
