use crate::program::{ClassInfo, Program};
use std::collections::{HashMap, HashSet};

/// Inheritance and interface edges of the class universe
///
/// Classes missing from the model (unresolved platform types) are still
/// valid chain members; the walk just cannot climb past them.
pub struct ClassHierarchy<'p> {
    classes: HashMap<&'p str, &'p ClassInfo>,
    ordered: Vec<&'p ClassInfo>,
}

impl<'p> ClassHierarchy<'p> {
    pub fn new(program: &'p Program) -> Self {
        Self::from_classes(&program.classes)
    }

    pub fn from_classes(classes: &'p [ClassInfo]) -> Self {
        let mut ordered: Vec<&ClassInfo> = classes.iter().collect();
        ordered.sort_by(|a, b| a.name.cmp(&b.name));
        ordered.dedup_by(|a, b| a.name == b.name);

        let classes = ordered
            .iter()
            .copied()
            .map(|c| (c.name.as_str(), c))
            .collect();
        Self { classes, ordered }
    }

    /// All known classes, sorted by name
    pub fn classes(&self) -> impl Iterator<Item = &'p ClassInfo> + '_ {
        self.ordered.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Walk `class`, its superclass chain and all implemented interfaces,
    /// returning true as soon as `pred` accepts one of them
    pub fn walk_chain<F>(&self, class: &str, mut pred: F) -> bool
    where
        F: FnMut(&str) -> bool,
    {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut stack: Vec<&str> = vec![class];

        while let Some(name) = stack.pop() {
            if !visited.insert(name) {
                continue;
            }
            if pred(name) {
                return true;
            }
            if let Some(info) = self.classes.get(name) {
                if let Some(superclass) = &info.superclass {
                    stack.push(superclass);
                }
                stack.extend(info.interfaces.iter().map(String::as_str));
            }
        }
        false
    }
}
