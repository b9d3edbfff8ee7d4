//! Integration tests for copy-on-write sessions
//!
//! A session over a snapshot must never change the snapshot, and freezing a
//! session must hand back untouched containers without copying them.

use std::thread;

use linkage_foundation::{ClassId, EntityId};
use linkage_storage::{ConnectionId, ConnectionKind, MutableRefsTable, RefsRead, RefsTable};

const PARENT: ClassId = ClassId::new(500);
const CHILD: ClassId = ClassId::new(501);

fn all_kinds() -> [ConnectionId; 4] {
    [
        ConnectionId::create(PARENT, CHILD, ConnectionKind::OneToMany, true),
        ConnectionId::create(PARENT, CHILD, ConnectionKind::OneToOne, true),
        ConnectionId::create(PARENT, CHILD, ConnectionKind::OneToAbstractMany, true),
        ConnectionId::create(PARENT, CHILD, ConnectionKind::AbstractOneToOne, true),
    ]
}

fn seeded() -> RefsTable {
    let mut table = RefsTable::new().to_mutable();
    for (p, conn) in (0u32..).zip(all_kinds()) {
        table.replace_parent_of_child(
            conn,
            EntityId::new(CHILD, p).as_child(),
            EntityId::new(PARENT, p).as_parent(),
        );
    }
    table.into_immutable()
}

#[test]
fn round_trip_returns_equal_table() {
    let base = seeded();
    let again = MutableRefsTable::from(&base).into_immutable();

    assert_eq!(again, base);
    for conn in all_kinds() {
        assert!(again.shares_storage(&base, conn), "{conn}");
    }
}

#[test]
fn writes_touch_only_their_connection() {
    let base = seeded();
    for conn in all_kinds() {
        let mut session = base.to_mutable();
        session.remove_refs_by_parent(conn, EntityId::new(PARENT, 0).as_parent());
        session.remove_refs_by_parent(conn, EntityId::new(PARENT, 1).as_parent());
        session.remove_refs_by_parent(conn, EntityId::new(PARENT, 2).as_parent());
        session.remove_refs_by_parent(conn, EntityId::new(PARENT, 3).as_parent());
        assert_eq!(session.copied_connections(), vec![conn]);

        let next = session.into_immutable();
        assert_ne!(next, base);
        assert_eq!(next, seeded_without(conn));
        for other in all_kinds() {
            assert_eq!(next.shares_storage(&base, other), other != conn, "{conn} vs {other}");
        }
    }
}

fn seeded_without(removed: ConnectionId) -> RefsTable {
    let mut table = seeded().to_mutable();
    table.remove_refs_by_parent(removed, EntityId::new(PARENT, 0).as_parent());
    table.remove_refs_by_parent(removed, EntityId::new(PARENT, 1).as_parent());
    table.remove_refs_by_parent(removed, EntityId::new(PARENT, 2).as_parent());
    table.remove_refs_by_parent(removed, EntityId::new(PARENT, 3).as_parent());
    table.into_immutable()
}

#[test]
fn base_is_unchanged_by_session() {
    let base = seeded();
    let before = base.clone();

    let mut session = base.to_mutable();
    for (p, conn) in (0u32..).zip(all_kinds()) {
        session.replace_parent_of_child(
            conn,
            EntityId::new(CHILD, p).as_child(),
            EntityId::new(PARENT, 40).as_parent(),
        );
    }
    assert_eq!(session.copied_connections().len(), 4);
    drop(session);

    assert_eq!(base, before);
    assert_eq!(base.get_one_to_many_parent(all_kinds()[0], 0), Some(0));
}

#[test]
fn concurrent_sessions_share_one_snapshot() {
    let base = seeded();
    let conn = all_kinds()[0];

    let results: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (10u32..14)
            .map(|p| {
                let base = &base;
                scope.spawn(move || {
                    let mut session = base.to_mutable();
                    session.replace_parent_of_child(
                        conn,
                        EntityId::new(CHILD, 0).as_child(),
                        EntityId::new(PARENT, p).as_parent(),
                    );
                    session.into_immutable()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for (p, table) in (10u32..).zip(&results) {
        assert_eq!(table.get_one_to_many_parent(conn, 0), Some(p));
    }
    assert_eq!(base.get_one_to_many_parent(conn, 0), Some(0));
}

mod properties {
    use linkage_foundation::EntityId;
    use linkage_storage::{MutableRefsTable, RefsRead};
    use proptest::prelude::*;

    use super::{CHILD, PARENT, all_kinds, seeded};

    proptest! {
        #[test]
        fn frozen_session_matches_its_own_reads(
            moves in proptest::collection::vec((0usize..4, 0u32..8, 0u32..4), 0..30),
        ) {
            let base = seeded();
            let mut session = MutableRefsTable::from(&base);
            for &(kind, c, p) in &moves {
                session.replace_parent_of_child(
                    all_kinds()[kind],
                    EntityId::new(CHILD, c).as_child(),
                    EntityId::new(PARENT, p).as_parent(),
                );
            }
            let dense = all_kinds()[0];
            let before: Vec<_> = (0..8).map(|c| session.get_one_to_many_parent(dense, c)).collect();
            let frozen = session.into_immutable();
            let after: Vec<_> = (0..8).map(|c| frozen.get_one_to_many_parent(dense, c)).collect();

            prop_assert_eq!(before, after);
            prop_assert_eq!(base, seeded());
        }
    }
}
