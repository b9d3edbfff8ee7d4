//! Integration tests for error types

use linkage_foundation::{ClassId, EntityId, Error, ErrorContext, ErrorKind};

#[test]
fn error_kinds_render_their_subject() {
    let parent = EntityId::new(ClassId::new(1), 0).as_parent();
    let child = EntityId::new(ClassId::new(2), 5).as_child();

    let duplicate = Error::duplicate_children(parent, vec![child, child]);
    assert!(duplicate.to_string().contains("ParentEntityId(id=EntityId(1:0))"));

    let too_many = Error::too_many_children("Connection(parent=1 child=2 OneToOne)", 3);
    assert_eq!(
        too_many.to_string(),
        "trying to add 3 children to one-to-one connection Connection(parent=1 child=2 OneToOne)"
    );

    let violation = Error::one_to_one_violation(child, parent);
    assert!(matches!(violation.kind, ErrorKind::OneToOneViolation { .. }));
    assert!(violation.to_string().contains("already bound"));
}

#[test]
fn context_is_optional() {
    let err = Error::conflicting_reference("Connection(parent=1 child=2 OneToMany)");
    assert!(err.context.is_none());

    let err = err.with_context(ErrorContext::new().with_operation("get_parent_refs_of_child"));
    assert_eq!(
        err.context.and_then(|ctx| ctx.operation),
        Some("get_parent_refs_of_child".to_string())
    );
}

#[test]
fn errors_are_std_errors() {
    fn assert_error<E: std::error::Error + Send + Sync + 'static>(_: &E) {}

    assert_error(&Error::new(ErrorKind::DuplicateClass("Folder".into())));
}
