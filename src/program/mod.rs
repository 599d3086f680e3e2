//! Program model consumed by the analysis
//!
//! The model is produced by an external front-end (a bytecode reader or a
//! call-graph exporter) and decoded here from JSON. The analysis only ever
//! reads it.

pub mod manifest;
mod method;

pub use manifest::Manifest;
pub use method::{CallSiteId, MethodId};

use crate::error::{LeakError, LeakResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Kind of a call-graph edge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// Call present in the program
    #[default]
    Normal,
    /// Edge added by the analysis to model a component exiting
    Synthetic,
}

/// A (caller, callee, call site) edge of the call graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallEdge {
    pub caller: MethodId,
    pub callee: MethodId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<CallSiteId>,
    #[serde(default)]
    pub kind: EdgeKind,
}

impl CallEdge {
    pub fn new(caller: MethodId, callee: MethodId, site: Option<CallSiteId>) -> Self {
        Self {
            caller,
            callee,
            site,
            kind: EdgeKind::Normal,
        }
    }
}

/// A declared field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default, rename = "static")]
    pub is_static: bool,
}

/// A declared constructor (only parameter types matter)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructorInfo {
    #[serde(default)]
    pub params: Vec<String>,
}

/// A class or interface of the analyzed program (application or platform)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassInfo {
    pub name: String,
    #[serde(default)]
    pub superclass: Option<String>,
    #[serde(default)]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub fields: Vec<FieldInfo>,
    #[serde(default)]
    pub constructors: Vec<ConstructorInfo>,
    /// Marked as an Android component by the front-end
    #[serde(default)]
    pub entry_point: bool,
}

impl ClassInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_superclass(mut self, superclass: impl Into<String>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    pub fn with_interface(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, ty: impl Into<String>) -> Self {
        self.fields.push(FieldInfo {
            name: name.into(),
            ty: ty.into(),
            is_static: false,
        });
        self
    }

    pub fn with_static_field(mut self, name: impl Into<String>, ty: impl Into<String>) -> Self {
        self.fields.push(FieldInfo {
            name: name.into(),
            ty: ty.into(),
            is_static: true,
        });
        self
    }

    pub fn with_constructor<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.constructors.push(ConstructorInfo {
            params: params.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn as_entry_point(mut self) -> Self {
        self.entry_point = true;
        self
    }
}

/// The whole program: class universe, call graph and declared entry methods
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Program {
    #[serde(default)]
    pub classes: Vec<ClassInfo>,
    #[serde(default)]
    pub entry_points: Vec<MethodId>,
    #[serde(default)]
    pub edges: Vec<CallEdge>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a program model from a JSON file
    pub fn from_file(path: &Path) -> LeakResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| LeakError::io(path, e))?;
        serde_json::from_str(&content).map_err(|source| LeakError::ProgramParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn add_class(&mut self, class: ClassInfo) -> &mut Self {
        self.classes.push(class);
        self
    }

    /// Append a call edge; the call site defaults to the edge's position
    pub fn add_call(&mut self, caller: MethodId, callee: MethodId) -> &mut Self {
        let site = CallSiteId(self.edges.len() as u32);
        self.edges.push(CallEdge::new(caller, callee, Some(site)));
        self
    }

    pub fn add_edge(&mut self, edge: CallEdge) -> &mut Self {
        self.edges.push(edge);
        self
    }

    pub fn add_entry_point(&mut self, method: MethodId) -> &mut Self {
        self.entry_points.push(method);
        self
    }

    /// Mark a class as an Android component, adding a stub if it is unknown
    pub fn mark_entry_point_class(&mut self, name: &str) -> &mut Self {
        match self.classes.iter_mut().find(|c| c.name == name) {
            Some(class) => class.entry_point = true,
            None => self.classes.push(ClassInfo::new(name).as_entry_point()),
        }
        self
    }

    pub fn class(&self, name: &str) -> Option<&ClassInfo> {
        self.classes.iter().find(|c| c.name == name)
    }
}
