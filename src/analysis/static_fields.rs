use super::context::ContextContainerSet;
use super::{Leak, LeakIssue, LeakSubject};
use crate::graph::ClassHierarchy;
use tracing::debug;

/// Flags static fields that can keep a Context alive
///
/// A static field outlives every component, so holding a context container
/// or a UI object in one retains the whole Activity.
pub struct StaticContextFieldDetector<'a> {
    containers: &'a ContextContainerSet,
    ui_classes: &'a [String],
}

impl<'a> StaticContextFieldDetector<'a> {
    pub fn new(containers: &'a ContextContainerSet, ui_classes: &'a [String]) -> Self {
        Self {
            containers,
            ui_classes,
        }
    }

    pub fn is_leaky_type(&self, hierarchy: &ClassHierarchy<'_>, ty: &str) -> bool {
        self.containers.is_context_container(ty)
            || hierarchy.walk_chain(ty, |name| self.ui_classes.iter().any(|ui| ui == name))
    }

    pub fn detect(&self, hierarchy: &ClassHierarchy<'_>) -> Vec<Leak> {
        let mut leaks = Vec::new();
        for class in hierarchy.classes() {
            for field in class.fields.iter().filter(|f| f.is_static) {
                if !self.is_leaky_type(hierarchy, &field.ty) {
                    continue;
                }
                debug!("Static context field {}.{}", class.name, field.name);
                leaks.push(Leak::new(
                    LeakIssue::StaticContextField,
                    LeakSubject::StaticField {
                        class: class.name.clone(),
                        field: field.name.clone(),
                        field_type: field.ty.clone(),
                    },
                ));
            }
        }
        leaks
    }
}
