//! Integration tests for leak reachability, exit points and diagnostic paths

use searchleaks::analysis::{
    AllocationPairDefinition, AllocationTracker, DiagnosticPath, LeakEngine, LeakIssue,
    LeakReachabilityAnalyzer, LeakSubject, PairRegistry,
};
use searchleaks::config::Config;
use searchleaks::graph::{CallGraph, SyntheticOverlay};
use searchleaks::program::{CallSiteId, ClassInfo, MethodId, Program};
use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn m(class: &str, name: &str) -> MethodId {
    MethodId::simple(class, name)
}

fn cursor_config() -> Config {
    Config {
        builtin_pairs: false,
        pairs: vec![AllocationPairDefinition::new("Cursor", "query", "close")],
        ..Config::default()
    }
}

/// Activity subclass plus its platform base
fn activity_program() -> Program {
    let mut program = Program::new();
    program
        .add_class(ClassInfo::new("android.app.Activity"))
        .add_class(ClassInfo::new("com.app.Main").with_superclass("android.app.Activity"));
    program
}

fn analyze(program: &Program, config: &Config) -> Vec<searchleaks::Leak> {
    let engine = LeakEngine::new(config).unwrap();
    let registry = engine.load_registry().unwrap();
    engine.analyze(program, &registry, None).leaks
}

// ============================================================================
// Cursor scenarios
// ============================================================================

mod scenario_tests {
    use super::*;

    #[test]
    fn test_cursor_never_closed() {
        let mut program = activity_program();
        program.add_call(m("com.app.Main", "onCreate"), m("Cursor", "query"));

        let leaks = analyze(&program, &cursor_config());
        assert_eq!(leaks.len(), 1);
        assert_eq!(leaks[0].issue, LeakIssue::NeverClosed);
        assert_eq!(leaks[0].issue.code(), "RL001");
        assert_eq!(
            leaks[0].subject.anchor_method(),
            Some(&m("com.app.Main", "onCreate"))
        );
    }

    #[test]
    fn test_closed_in_same_method() {
        let mut program = activity_program();
        program
            .add_call(m("com.app.Main", "onCreate"), m("Cursor", "query"))
            .add_call(m("com.app.Main", "onCreate"), m("Cursor", "close"));

        assert!(analyze(&program, &cursor_config()).is_empty());
    }

    #[test]
    fn test_closed_in_exit_point() {
        let mut program = activity_program();
        program
            .add_call(m("com.app.Main", "onCreate"), m("Cursor", "query"))
            .add_call(m("com.app.Main", "onDestroy"), m("com.app.Main", "releaseAll"))
            .add_call(m("com.app.Main", "releaseAll"), m("Cursor", "close"));

        assert!(analyze(&program, &cursor_config()).is_empty());
    }

    #[test]
    fn test_sibling_helper_never_called() {
        let mut program = activity_program();
        program
            .add_call(m("com.app.Main", "onCreate"), m("Cursor", "query"))
            .add_call(m("com.app.Main", "cleanup"), m("Cursor", "close"))
            .add_call(m("com.app.Main", "onDestroy"), m("android.util.Log", "d"));

        let leaks = analyze(&program, &cursor_config());
        assert_eq!(leaks.len(), 1);
        assert_eq!(leaks[0].issue, LeakIssue::CloserUnreachable);
        match &leaks[0].subject {
            LeakSubject::Resource {
                call_site, pair, ..
            } => {
                assert_eq!(*call_site, Some(CallSiteId(0)));
                assert_eq!(pair.as_ref().map(|p| p.closer.as_str()), Some("close"));
            }
            other => panic!("unexpected subject {other:?}"),
        }
    }

    #[test]
    fn test_reported_per_call_site() {
        // one opener caller closes, the other does not
        let mut program = activity_program();
        program
            .add_call(m("com.app.Main", "good"), m("Cursor", "query"))
            .add_call(m("com.app.Main", "good"), m("Cursor", "close"))
            .add_call(m("com.app.Main", "bad"), m("Cursor", "query"));

        let leaks = analyze(&program, &cursor_config());
        assert_eq!(leaks.len(), 1);
        assert_eq!(leaks[0].subject.anchor_method(), Some(&m("com.app.Main", "bad")));
    }

    #[test]
    fn test_exit_point_of_non_entry_class_ignored() {
        let mut program = Program::new();
        program
            .add_class(ClassInfo::new("com.app.Util"))
            .add_call(m("com.app.Util", "open"), m("Cursor", "query"))
            .add_call(m("com.app.Util", "onDestroy"), m("Cursor", "close"));

        let leaks = analyze(&program, &cursor_config());
        assert_eq!(leaks.len(), 1);
        assert_eq!(leaks[0].issue, LeakIssue::CloserUnreachable);
    }
}

// ============================================================================
// Overlay locality and determinism
// ============================================================================

mod locality_tests {
    use super::*;

    fn pair_program() -> Program {
        let mut program = activity_program();
        program
            .add_call(m("com.app.Main", "onCreate"), m("Cursor", "query"))
            .add_call(m("com.app.Main", "onCreate"), m("Camera", "open"))
            .add_call(m("com.app.Main", "onStop"), m("Cursor", "close"))
            .add_call(m("com.app.Worker", "run"), m("Camera", "open"))
            .add_call(m("com.app.Worker", "later"), m("Camera", "release"));
        program
    }

    #[test]
    fn test_base_graph_is_never_mutated() {
        let program = pair_program();
        let registry = PairRegistry::load([
            AllocationPairDefinition::new("Cursor", "query", "close"),
            AllocationPairDefinition::new("Camera", "open", "release"),
        ])
        .unwrap();
        let graph = CallGraph::from_edges(&program.edges);
        let before = graph.edge_count();
        let exits = BTreeSet::from([m("com.app.Main", "onStop")]);

        let tracker = AllocationTracker::scan(&registry, graph.edges());
        let analyzer = LeakReachabilityAnalyzer::new(&graph, &exits).with_parallel(false);
        let leaks = analyzer.analyze(&tracker);

        assert_eq!(graph.edge_count(), before);
        let on_stop = HashSet::from([graph.node_index(&m("com.app.Main", "onStop")).unwrap()]);
        assert!(!SyntheticOverlay::new(&graph)
            .reaches_any(graph.node_index(&m("com.app.Main", "onCreate")).unwrap(), &on_stop));
        // Camera opened in onCreate and in Worker.run; release is only in Worker.later
        assert_eq!(leaks.len(), 2);
        assert!(leaks.iter().all(|l| l.issue == LeakIssue::CloserUnreachable));
    }

    #[test]
    fn test_pair_order_and_parallelism_do_not_matter() {
        let program = pair_program();
        let defs = [
            AllocationPairDefinition::new("Cursor", "query", "close"),
            AllocationPairDefinition::new("Camera", "open", "release"),
        ];
        let run = |defs: Vec<AllocationPairDefinition>, parallel: bool| {
            let config = Config {
                builtin_pairs: false,
                pairs: defs,
                parallel,
                ..Config::default()
            };
            analyze(&program, &config)
                .into_iter()
                .map(|l| l.sort_key())
                .collect::<Vec<_>>()
        };

        let forward = run(defs.to_vec(), false);
        let reversed = run(defs.iter().rev().cloned().collect(), true);
        assert_eq!(forward, reversed);
        assert_eq!(forward.len(), 2);
    }

    #[test]
    fn test_cyclic_graph_terminates() {
        let mut program = activity_program();
        program
            .add_call(m("com.app.Main", "onCreate"), m("com.app.Main", "a"))
            .add_call(m("com.app.Main", "a"), m("com.app.Main", "b"))
            .add_call(m("com.app.Main", "b"), m("com.app.Main", "a"))
            .add_call(m("com.app.Main", "b"), m("Cursor", "query"))
            .add_call(m("com.app.Main", "unused"), m("Cursor", "close"));

        let leaks = analyze(&program, &cursor_config());
        assert_eq!(leaks.len(), 1);
        let steps = leaks[0].diagnostic_path.steps().unwrap();
        assert_eq!(steps.first(), Some(&m("com.app.Main", "onCreate")));
        assert_eq!(steps.last(), Some(&m("com.app.Main", "b")));
    }
}

// ============================================================================
// Diagnostic paths and fixtures
// ============================================================================

mod path_tests {
    use super::*;

    #[test]
    fn test_not_found_differs_from_not_searched() {
        let mut program = activity_program();
        program.add_call(m("com.app.Orphan", "run"), m("Cursor", "query"));

        let searched = analyze(&program, &cursor_config());
        assert_eq!(searched[0].diagnostic_path, DiagnosticPath::NotFound);

        let config = Config {
            find_paths: false,
            ..cursor_config()
        };
        let skipped = analyze(&program, &config);
        assert_eq!(skipped[0].diagnostic_path, DiagnosticPath::NotSearched);
        assert_ne!(
            searched[0].diagnostic_path.status(),
            skipped[0].diagnostic_path.status()
        );
    }

    #[test]
    fn test_camera_fixture() {
        let program = Program::from_file(&fixtures_path().join("programs/camera_app.json")).unwrap();
        let leaks = analyze(&program, &Config::default());

        let codes: Vec<_> = leaks.iter().map(|l| l.issue.code()).collect();
        assert_eq!(codes, vec!["RL001", "RL002"]);

        assert_eq!(
            leaks[0].subject.anchor_method(),
            Some(&m("com.example.camera.CameraActivity", "onResume"))
        );
        assert_eq!(
            leaks[1].diagnostic_path.steps().map(|s| s.len()),
            Some(2)
        );
    }

    #[test]
    fn test_cursor_fixture_with_declared_entry_points() {
        let program = Program::from_file(&fixtures_path().join("programs/cursor_app.json")).unwrap();
        let config = Config {
            builtin_pairs: false,
            pair_files: vec![fixtures_path().join("pairs/cursor_pairs.txt")],
            ..Config::default()
        };
        let leaks = analyze(&program, &config);

        assert_eq!(leaks.len(), 1);
        assert_eq!(
            leaks[0].subject.anchor_method(),
            Some(&m("com.example.notes.NotesActivity", "loadNotes"))
        );
        let steps = leaks[0].diagnostic_path.steps().unwrap();
        assert_eq!(steps[0].signature(), "void onCreate(android.os.Bundle)");
    }
}
