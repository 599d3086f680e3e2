//! AndroidManifest.xml component discovery
//!
//! Components declared in the manifest are the entry-point classes of an
//! Android app. Only decoded (text) manifests are supported; binary AXML must
//! be decoded by the front-end first.

use crate::error::{LeakError, LeakResult};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::path::{Path, PathBuf};

const INLINE_SOURCE: &str = "<inline>";

/// Kind of a manifest-declared component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    Application,
    Activity,
    Service,
    Receiver,
    Provider,
}

impl ComponentKind {
    fn from_tag(tag: &[u8]) -> Option<Self> {
        match tag {
            b"application" => Some(Self::Application),
            b"activity" | b"activity-alias" => Some(Self::Activity),
            b"service" => Some(Self::Service),
            b"receiver" => Some(Self::Receiver),
            b"provider" => Some(Self::Provider),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub kind: ComponentKind,
    /// Class name exactly as written in the manifest (may be relative)
    pub name: String,
}

/// Decoded manifest: package plus declared components
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    pub package: Option<String>,
    pub components: Vec<Component>,
}

impl Manifest {
    pub fn from_file(path: &Path) -> LeakResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| LeakError::io(path, e))?;
        Self::parse_from(&content, path)
    }

    /// Parse manifest XML text that did not come from a file
    pub fn parse(content: &str) -> LeakResult<Self> {
        Self::parse_from(content, Path::new(INLINE_SOURCE))
    }

    /// Parse manifest XML text, naming `path` in errors
    pub fn parse_from(content: &str, path: &Path) -> LeakResult<Self> {
        let mut reader = Reader::from_str(content);
        reader.config_mut().trim_text(true);

        let mut manifest = Manifest::default();

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                    manifest.visit_element(&e, path)?;
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(LeakError::manifest(
                        path,
                        format!("error at position {}: {}", reader.buffer_position(), e),
                    ))
                }
                _ => {}
            }
        }

        Ok(manifest)
    }

    fn visit_element(&mut self, e: &BytesStart<'_>, path: &Path) -> LeakResult<()> {
        let tag = e.name();
        let tag = tag.as_ref();

        if tag == b"manifest" {
            self.package = attribute(e, b"package", path)?;
            return Ok(());
        }

        let Some(kind) = ComponentKind::from_tag(tag) else {
            return Ok(());
        };

        // An alias points at its target activity, which is the real class
        let name = if tag == b"activity-alias" {
            attribute(e, b"targetActivity", path)?
        } else {
            attribute(e, b"name", path)?
        };

        if let Some(name) = name {
            self.components.push(Component { kind, name });
        }
        Ok(())
    }

    /// Fully-qualified class names of all declared components
    pub fn component_classes(&self) -> Vec<String> {
        let mut classes: Vec<String> = self
            .components
            .iter()
            .map(|c| self.resolve(&c.name))
            .collect();
        classes.sort();
        classes.dedup();
        classes
    }

    /// Resolve `.Main` or `Main` against the manifest package
    fn resolve(&self, name: &str) -> String {
        match &self.package {
            Some(package) if name.starts_with('.') => format!("{}{}", package, name),
            Some(package) if !name.contains('.') => format!("{}.{}", package, name),
            _ => name.to_string(),
        }
    }
}

/// Read an attribute by local name, ignoring the `android:` prefix
fn attribute(e: &BytesStart<'_>, local: &[u8], path: &Path) -> LeakResult<Option<String>> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| LeakError::manifest(path, err))?;
        if attr.key.local_name().as_ref() == local {
            return Ok(Some(String::from_utf8_lossy(&attr.value).into_owned()));
        }
    }
    Ok(None)
}

/// Look for a manifest next to the program model when none was given
pub fn find_default_manifest(base: &Path) -> Option<PathBuf> {
    let candidates = [
        base.join("AndroidManifest.xml"),
        base.join("src/main/AndroidManifest.xml"),
        base.join("app/src/main/AndroidManifest.xml"),
    ];
    candidates.into_iter().find(|p| p.is_file())
}
