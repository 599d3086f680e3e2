//! Integration tests for context container classification and static
//! context field detection

use searchleaks::analysis::{
    ContextContainerClassifier, LeakEngine, LeakIssue, LeakKind, LeakSubject,
};
use searchleaks::config::Config;
use searchleaks::graph::ClassHierarchy;
use searchleaks::program::{ClassInfo, Program};
use std::collections::BTreeSet;
use std::path::PathBuf;

const CONTEXT: &str = "android.content.Context";

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// A small app: an Activity, a listener holding it, a presenter built from a
/// Context and a model built from the presenter
fn app_program() -> Program {
    let mut program = Program::new();
    program
        .add_class(ClassInfo::new("android.content.ContextWrapper").with_superclass(CONTEXT))
        .add_class(
            ClassInfo::new("android.app.Activity").with_superclass("android.content.ContextWrapper"),
        )
        .add_class(ClassInfo::new("com.app.MainActivity").with_superclass("android.app.Activity"))
        .add_class(
            ClassInfo::new("com.app.ClickListener")
                .with_interface("android.view.View$OnClickListener")
                .with_field("activity", "com.app.MainActivity"),
        )
        .add_class(ClassInfo::new("com.app.Presenter").with_constructor([CONTEXT]))
        .add_class(ClassInfo::new("com.app.Model").with_constructor(["com.app.Presenter"]))
        .add_class(
            ClassInfo::new("com.app.Holder")
                .with_interface("java.io.Serializable")
                .with_field("model", "com.app.Model"),
        )
        .add_class(ClassInfo::new("com.app.Plain").with_field("name", "java.lang.String"));
    program
}

// ============================================================================
// Classifier
// ============================================================================

mod classifier_tests {
    use super::*;

    #[test]
    fn test_field_and_constructor_rules() {
        let program = app_program();
        let hierarchy = ClassHierarchy::new(&program);
        let set = ContextContainerClassifier::new(&hierarchy, CONTEXT).classify();

        assert!(set.is_context_container(CONTEXT));
        assert!(set.is_context_container("com.app.ClickListener"));
        assert!(set.is_context_container("com.app.Presenter"));
        assert!(set.is_context_container("com.app.Model"));
        assert!(!set.is_context_container("com.app.Plain"));
        assert!(!set.is_context_container("com.app.MainActivity"));
    }

    #[test]
    fn test_union_reclosed_across_rules() {
        let program = app_program();
        let hierarchy = ClassHierarchy::new(&program);
        let set = ContextContainerClassifier::new(&hierarchy, CONTEXT).classify();

        // Holder is only reachable through Model, which the constructor rule finds
        assert!(set.is_context_container("com.app.Holder"));
    }

    #[test]
    fn test_idempotent_when_rerun() {
        let program = app_program();
        let hierarchy = ClassHierarchy::new(&program);
        let mut classifier = ContextContainerClassifier::new(&hierarchy, CONTEXT);

        let first = classifier.classify();
        let second = classifier.classify();
        assert_eq!(first, second);

        let seeded: BTreeSet<String> = first.iter().map(String::from).collect();
        let fed_back = classifier.classify_from(seeded);
        assert_eq!(first, fed_back);
        assert_eq!(classifier.stats().field_passes, 1);
        assert_eq!(classifier.stats().constructor_passes, 1);
    }

    #[test]
    fn test_only_grows_from_seed() {
        let program = app_program();
        let hierarchy = ClassHierarchy::new(&program);
        let seed = BTreeSet::from([CONTEXT.to_string(), "com.app.Plain".to_string()]);
        let set = ContextContainerClassifier::new(&hierarchy, CONTEXT).classify_from(seed);

        assert!(set.is_context_container("com.app.Plain"));
        assert!(set.is_context_container(CONTEXT));
    }
}

// ============================================================================
// Static context fields
// ============================================================================

mod static_field_tests {
    use super::*;

    #[test]
    fn test_static_fields_reported_with_context_leaks() {
        let mut program = app_program();
        program.add_class(
            ClassInfo::new("com.app.Registry")
                .with_static_field("sActivity", "com.app.MainActivity")
                .with_static_field("sPresenter", "com.app.Presenter")
                .with_static_field("sName", "java.lang.String"),
        );
        let config = Config {
            builtin_pairs: false,
            context_leaks: true,
            ..Config::default()
        };
        let engine = LeakEngine::new(&config).unwrap();
        let registry = engine.load_registry().unwrap();
        let outcome = engine.analyze(&program, &registry, None);

        let fields: Vec<_> = outcome
            .leaks
            .iter()
            .filter_map(|l| match &l.subject {
                LeakSubject::StaticField { field, .. } => Some(field.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(fields, vec!["sActivity", "sPresenter"]);
        assert!(outcome
            .leaks
            .iter()
            .all(|l| l.kind() == LeakKind::ContextLeak && l.issue == LeakIssue::StaticContextField));
        assert!(outcome.context_containers.is_some());
    }

    #[test]
    fn test_disabled_by_default() {
        let program = Program::from_file(&fixtures_path().join("programs/camera_app.json")).unwrap();
        let config = Config::default();
        let engine = LeakEngine::new(&config).unwrap();
        let registry = engine.load_registry().unwrap();
        let outcome = engine.analyze(&program, &registry, None);

        assert!(outcome
            .leaks
            .iter()
            .all(|l| l.issue != LeakIssue::StaticContextField));
    }

    #[test]
    fn test_fixture_static_session() {
        let program = Program::from_file(&fixtures_path().join("programs/camera_app.json")).unwrap();
        let config = Config {
            context_leaks: true,
            exclude: vec!["Recorder$".to_string()],
            ..Config::default()
        };
        let engine = LeakEngine::new(&config).unwrap();
        let registry = engine.load_registry().unwrap();
        let outcome = engine.analyze(&program, &registry, None);

        let codes: Vec<_> = outcome.leaks.iter().map(|l| l.issue.code()).collect();
        assert_eq!(codes, vec!["CL001", "RL001"]);
        assert_eq!(outcome.leaks[0].subject.anchor_name(), "Cache.sSession");
        assert_eq!(outcome.stats.suppressed, 1);
    }
}
