//! Context container classification
//!
//! A context container is a class that can hold a platform `Context`, either
//! through a field (field rule) or because it is constructed from one
//! (constructor rule). Both rules are computed to a fixed point from the
//! `Context` seed and unioned. The union is then closed under both rules
//! together, so feeding the result back as a seed never grows it.

use crate::graph::ClassHierarchy;
use crate::program::ClassInfo;
use std::collections::BTreeSet;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    Field,
    Constructor,
}

/// Fixed-point statistics, mostly useful for debugging convergence
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassifierStats {
    pub field_passes: usize,
    pub constructor_passes: usize,
    pub closure_passes: usize,
}

/// Classes that can reach a platform `Context`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextContainerSet {
    classes: BTreeSet<String>,
}

impl ContextContainerSet {
    pub fn is_context_container(&self, class: &str) -> bool {
        self.classes.contains(class)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

pub struct ContextContainerClassifier<'h, 'p> {
    hierarchy: &'h ClassHierarchy<'p>,
    context_class: String,
    stats: ClassifierStats,
}

impl<'h, 'p> ContextContainerClassifier<'h, 'p> {
    pub fn new(hierarchy: &'h ClassHierarchy<'p>, context_class: impl Into<String>) -> Self {
        Self {
            hierarchy,
            context_class: context_class.into(),
            stats: ClassifierStats::default(),
        }
    }

    pub fn stats(&self) -> ClassifierStats {
        self.stats
    }

    pub fn classify(&mut self) -> ContextContainerSet {
        let seed = BTreeSet::from([self.context_class.clone()]);
        self.classify_from(seed)
    }

    /// Run the classification from an arbitrary seed
    pub fn classify_from(&mut self, seed: BTreeSet<String>) -> ContextContainerSet {
        let (by_field, field_passes) = self.fixed_point(seed.clone(), &[Rule::Field]);
        let (by_constructor, constructor_passes) =
            self.fixed_point(seed, &[Rule::Constructor]);
        debug!(
            "Context rules: {} by field, {} by constructor",
            by_field.len(),
            by_constructor.len()
        );

        let union: BTreeSet<String> = by_field.union(&by_constructor).cloned().collect();
        let (classes, closure_passes) =
            self.fixed_point(union, &[Rule::Field, Rule::Constructor]);

        self.stats = ClassifierStats {
            field_passes,
            constructor_passes,
            closure_passes,
        };
        info!("Context containers: {} classes", classes.len());
        ContextContainerSet { classes }
    }

    /// Apply `rules` until a full pass adds nothing; returns the set and the
    /// number of passes made
    fn fixed_point(&self, mut set: BTreeSet<String>, rules: &[Rule]) -> (BTreeSet<String>, usize) {
        let mut passes = 0;
        loop {
            passes += 1;
            let added: Vec<String> = self
                .hierarchy
                .classes()
                .filter(|class| !set.contains(&class.name))
                .filter(|class| rules.iter().any(|&rule| self.applies(rule, class, &set)))
                .map(|class| class.name.clone())
                .collect();
            if added.is_empty() {
                return (set, passes);
            }
            set.extend(added);
        }
    }

    fn applies(&self, rule: Rule, class: &ClassInfo, set: &BTreeSet<String>) -> bool {
        match rule {
            Rule::Field => {
                !class.interfaces.is_empty()
                    && class.fields.iter().any(|f| self.reaches_set(&f.ty, set))
            }
            Rule::Constructor => class
                .constructors
                .iter()
                .flat_map(|c| c.params.iter())
                .any(|param| self.reaches_set(param, set)),
        }
    }

    fn reaches_set(&self, ty: &str, set: &BTreeSet<String>) -> bool {
        self.hierarchy.walk_chain(ty, |name| set.contains(name))
    }
}
