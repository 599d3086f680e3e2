//! Integration tests for the pair registry and the allocation tracker

use searchleaks::analysis::{
    AllocType, AllocationPairDefinition, AllocationTracker, PairKey, PairRegistry, PairStatus,
    RegistryWarning,
};
use searchleaks::error::LeakError;
use searchleaks::program::{CallEdge, CallSiteId, MethodId};
use std::path::PathBuf;

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn m(class: &str, name: &str) -> MethodId {
    MethodId::simple(class, name)
}

fn edge(caller: (&str, &str), callee: (&str, &str), site: u32) -> CallEdge {
    CallEdge::new(
        m(caller.0, caller.1),
        m(callee.0, callee.1),
        Some(CallSiteId(site)),
    )
}

fn registry(defs: &[(&str, &str, &str)]) -> PairRegistry {
    PairRegistry::load(
        defs.iter()
            .map(|(c, o, cl)| AllocationPairDefinition::new(*c, *o, *cl)),
    )
    .unwrap()
}

// ============================================================================
// Pair Registry
// ============================================================================

mod registry_tests {
    use super::*;

    #[test]
    fn test_pair_file_loads() {
        let mut builder = PairRegistry::builder();
        builder
            .add_file(&fixtures_path().join("pairs/cursor_pairs.txt"))
            .unwrap();
        let registry = builder.build().unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.alloc_type(&m("android.database.Cursor", "rawQuery")),
            AllocType::Opener
        );
        assert_eq!(
            registry.alloc_type(&m("android.database.Cursor", "close")),
            AllocType::Closer
        );
        assert_eq!(
            registry.alloc_type(&m("android.database.Cursor", "moveToNext")),
            AllocType::None
        );
    }

    #[test]
    fn test_malformed_record_identified() {
        let mut builder = PairRegistry::builder();
        let err = builder
            .add_file(&fixtures_path().join("pairs/malformed_pairs.txt"))
            .unwrap_err();

        match err {
            LeakError::MalformedPair { line, record, .. } => {
                assert_eq!(line, 2);
                assert!(record.contains("rawQuery"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_definition_rejected() {
        let mut builder = PairRegistry::builder();
        builder
            .add_source("Cursor ## query ## close\n", "a.txt")
            .unwrap();
        builder
            .add_source("# same again\nCursor ## query ## close\n", "b.txt")
            .unwrap();

        match builder.build().unwrap_err() {
            LeakError::DuplicatePair { first, second, .. } => {
                assert_eq!(first, "a.txt:1");
                assert_eq!(second, "b.txt:2");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_opener_wins_for_ambiguous_key() {
        let registry = registry(&[("Lock", "acquire", "release"), ("Lock", "release", "reset")]);

        assert_eq!(registry.alloc_type(&m("Lock", "release")), AllocType::Opener);
        assert_eq!(registry.warnings().len(), 1);
        match &registry.warnings()[0] {
            RegistryWarning::AmbiguousRole { key, .. } => {
                assert_eq!(key, &PairKey::new("Lock", "release"));
            }
            other => panic!("unexpected warning: {other}"),
        }
    }

    #[test]
    fn test_builtin_catalog_is_consistent() {
        let registry = PairRegistry::builtin().unwrap();

        assert!(registry.len() > 20);
        assert!(registry.warnings().is_empty());
        assert_eq!(
            registry.alloc_type(&m("android.hardware.Camera", "open")),
            AllocType::Opener
        );
    }

    #[test]
    fn test_matching_is_per_class() {
        let registry = registry(&[("Cursor", "query", "close")]);
        assert_eq!(registry.alloc_type(&m("OtherCursor", "query")), AllocType::None);
        assert!(registry.matching_definitions(&m("OtherCursor", "close")).is_empty());
    }
}

// ============================================================================
// Allocation Tracker
// ============================================================================

mod tracker_tests {
    use super::*;

    #[test]
    fn test_cursor_never_closed_stays_pending() {
        let registry = registry(&[("Cursor", "query", "close")]);
        let edges = [edge(("Main", "onCreate"), ("Cursor", "query"), 1)];
        let tracker = AllocationTracker::scan(&registry, &edges);

        assert_eq!(tracker.completed().count(), 0);
        let pending: Vec<_> = tracker.pending().collect();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].key, PairKey::new("Cursor", "query"));
    }

    #[test]
    fn test_completion_monotone_over_any_suffix() {
        let registry = registry(&[("Cursor", "query", "close")]);
        let prefix = [
            edge(("A", "a"), ("Cursor", "query"), 0),
            edge(("B", "b"), ("Cursor", "close"), 1),
        ];
        let suffix = [
            edge(("C", "c"), ("Cursor", "close"), 2),
            edge(("D", "d"), ("Cursor", "query"), 3),
            edge(("E", "e"), ("Other", "thing"), 4),
        ];

        let mut tracker = AllocationTracker::new(&registry);
        for e in &prefix {
            tracker.process_edge(e);
        }
        assert!(tracker.state(0).unwrap().is_completed());

        for e in &suffix {
            tracker.process_edge(e);
            assert_eq!(tracker.state(0).unwrap().status(), PairStatus::Completed);
        }
        assert_eq!(tracker.pending().count(), 0);
    }

    #[test]
    fn test_multi_definition_independence() {
        // start is shared by two definitions; only one of the closers appears
        let registry = registry(&[
            ("MediaRecorder", "start", "stop"),
            ("MediaRecorder", "start", "release"),
        ]);
        let edges = [
            edge(("Rec", "begin"), ("MediaRecorder", "start"), 0),
            edge(("Rec", "end"), ("MediaRecorder", "stop"), 1),
        ];
        let tracker = AllocationTracker::scan(&registry, &edges);

        let stop = tracker.state(0).unwrap();
        let release = tracker.state(1).unwrap();
        assert!(stop.is_completed());
        assert!(!release.is_completed());
        assert!(release.closer_callers().is_empty());
        assert_eq!(release.opener_callers().len(), 1);
    }

    #[test]
    fn test_ambiguous_key_closes_one_pair_and_opens_another() {
        // release closes acquire/release and opens release/destroy
        let registry = registry(&[("Lock", "acquire", "release"), ("Lock", "release", "destroy")]);
        let edges = [
            edge(("A", "lock"), ("Lock", "acquire"), 0),
            edge(("B", "unlock"), ("Lock", "release"), 1),
        ];
        let tracker = AllocationTracker::scan(&registry, &edges);

        let acquire = tracker.state(0).unwrap();
        assert_eq!(acquire.status(), PairStatus::Completed);
        assert!(acquire.closer_callers().contains_key(&m("B", "unlock")));
        assert!(!acquire.opener_callers().contains_key(&m("B", "unlock")));

        let release = tracker.state(1).unwrap();
        assert_eq!(release.status(), PairStatus::Pending);
        assert!(release.opener_callers().contains_key(&m("B", "unlock")));
        assert!(release.closer_callers().is_empty());

        let pending: Vec<_> = tracker.pending().map(|p| p.key.clone()).collect();
        assert_eq!(pending, vec![PairKey::new("Lock", "release")]);
    }

    #[test]
    fn test_state_created_once_per_definition() {
        let registry = registry(&[("Cursor", "query", "close")]);
        let edges: Vec<_> = (0..10)
            .map(|i| edge(("Main", "load"), ("Cursor", "query"), i))
            .collect();
        let tracker = AllocationTracker::scan(&registry, &edges);

        assert_eq!(tracker.states().count(), 1);
        assert_eq!(tracker.state(0).unwrap().opener_callers().len(), 1);
        assert_eq!(tracker.stats().edges_matched, 10);
    }

    #[test]
    fn test_opener_callee_recorded() {
        let registry = registry(&[("Camera", "open", "release")]);
        let open = MethodId::new("Camera", "open", "Camera open(int)");
        let edges = [
            CallEdge::new(m("Main", "start"), open.clone(), None),
            edge(("Main", "stop"), ("Camera", "release"), 1),
        ];
        let tracker = AllocationTracker::scan(&registry, &edges);

        assert_eq!(tracker.state(0).unwrap().opener(), Some(&open));
        assert!(tracker.is_seen(&PairKey::new("Camera", "release")));
    }
}
