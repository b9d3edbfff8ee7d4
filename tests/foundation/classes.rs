//! Integration tests for the class registry
//!
//! Tests registration, name lookup, and subtype queries.

use linkage_foundation::{ClassHierarchy, ClassId, ClassRegistry, ErrorKind};

// =============================================================================
// Registration
// =============================================================================

#[test]
fn register_and_lookup() {
    let mut classes = ClassRegistry::new();
    let module = classes.register("Module", &[]).unwrap();
    let library = classes.register("Library", &[]).unwrap();

    assert_ne!(module, library);
    assert_eq!(classes.lookup("Module"), Some(module));
    assert_eq!(classes.lookup("Facet"), None);
    assert_eq!(classes.name(library).unwrap(), "Library");
    assert_eq!(classes.len(), 2);
}

#[test]
fn duplicate_name_rejected() {
    let mut classes = ClassRegistry::new();
    classes.register("Module", &[]).unwrap();

    let err = classes.register("Module", &[]).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::DuplicateClass(ref name) if name == "Module"));
    assert_eq!(classes.len(), 1);
}

#[test]
fn unknown_supertype_rejected() {
    let mut classes = ClassRegistry::new();

    let err = classes.register("Facet", &[ClassId::new(42)]).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnknownClass(_)));
    assert!(classes.is_empty());
}

// =============================================================================
// Subtype Queries
// =============================================================================

#[test]
fn assignability_is_reflexive_and_transitive() {
    let mut classes = ClassRegistry::new();
    let entity = classes.register("Entity", &[]).unwrap();
    let facet = classes.register("Facet", &[entity]).unwrap();
    let java_facet = classes.register("JavaFacet", &[facet]).unwrap();

    assert!(classes.is_assignable_from(facet, facet).unwrap());
    assert!(classes.is_assignable_from(entity, java_facet).unwrap());
    assert!(!classes.is_assignable_from(java_facet, entity).unwrap());
}

#[test]
fn multiple_supertypes() {
    let mut classes = ClassRegistry::new();
    let named = classes.register("Named", &[]).unwrap();
    let owned = classes.register("Owned", &[]).unwrap();
    let source_root = classes.register("SourceRoot", &[named, owned]).unwrap();

    assert!(classes.is_assignable_from(named, source_root).unwrap());
    assert!(classes.is_assignable_from(owned, source_root).unwrap());
    assert!(!classes.is_assignable_from(named, owned).unwrap());
}

#[test]
fn unknown_class_in_query_is_an_error() {
    let mut classes = ClassRegistry::new();
    let entity = classes.register("Entity", &[]).unwrap();

    assert!(classes.is_assignable_from(ClassId::new(99), entity).is_err());
    assert!(classes.is_assignable_from(entity, ClassId::new(99)).is_err());
}
