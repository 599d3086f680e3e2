//! Opener/closer pair registry
//!
//! A pair definition says that, for one class, calling `opener` acquires a
//! system resource and calling `closer` releases it. One method name may take
//! part in several definitions (an opener with two acceptable closers, or a
//! closer shared by two openers), so every lookup returns a list.

use crate::error::{LeakError, LeakResult};
use crate::program::MethodId;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};

const BUILTIN_PAIRS: &str = include_str!("builtin_pairs.txt");
const FIELD_SEPARATOR: &str = " ## ";

/// Name of a method within a class, independent of overloads
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PairKey {
    pub class_name: String,
    pub method_name: String,
}

impl PairKey {
    pub fn new(class_name: impl Into<String>, method_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            method_name: method_name.into(),
        }
    }

    pub fn of(method: &MethodId) -> Self {
        Self::new(method.class(), method.name())
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.class_name, self.method_name)
    }
}

/// One (class, opener, closer) definition
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AllocationPairDefinition {
    #[serde(rename = "class")]
    pub class_name: String,
    pub opener: String,
    pub closer: String,
}

impl AllocationPairDefinition {
    pub fn new(
        class_name: impl Into<String>,
        opener: impl Into<String>,
        closer: impl Into<String>,
    ) -> Self {
        Self {
            class_name: class_name.into(),
            opener: opener.into(),
            closer: closer.into(),
        }
    }

    pub fn open_key(&self) -> PairKey {
        PairKey::new(&self.class_name, &self.opener)
    }

    pub fn close_key(&self) -> PairKey {
        PairKey::new(&self.class_name, &self.closer)
    }

    /// Parse one `className ## opener ## closer` record
    pub fn parse_record(record: &str, origin: &str, line: usize) -> LeakResult<Self> {
        let fields: Vec<&str> = record.split(FIELD_SEPARATOR).map(str::trim).collect();
        if fields.len() != 3 {
            return Err(LeakError::malformed(
                origin,
                line,
                record,
                format!("expected 3 fields, found {}", fields.len()),
            ));
        }
        let definition = Self::new(fields[0], fields[1], fields[2]);
        definition.validate(origin, line)?;
        Ok(definition)
    }

    /// Reject empty names and names with surrounding whitespace, which would
    /// never match a call
    pub fn validate(&self, origin: &str, line: usize) -> LeakResult<()> {
        for name in [&self.class_name, &self.opener, &self.closer] {
            if name.is_empty() {
                return Err(LeakError::malformed(origin, line, self.to_string(), "empty field"));
            }
            if name.trim() != name.as_str() {
                return Err(LeakError::malformed(
                    origin,
                    line,
                    self.to_string(),
                    format!("'{}' has surrounding whitespace", name),
                ));
            }
        }
        Ok(())
    }

    /// Opener and closer are the same method name
    pub fn is_self_paired(&self) -> bool {
        self.opener == self.closer
    }
}

impl fmt::Display for AllocationPairDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}{}{}",
            self.class_name, FIELD_SEPARATOR, self.opener, FIELD_SEPARATOR, self.closer
        )
    }
}

/// Index of a definition inside its registry
pub type DefinitionId = usize;

/// Role of a method with respect to the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AllocType {
    Opener,
    Closer,
    None,
}

/// Non-fatal configuration problems found while building the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryWarning {
    /// A key opens in some definitions and closes in others
    AmbiguousRole {
        key: PairKey,
        opener_in: Vec<AllocationPairDefinition>,
        closer_in: Vec<AllocationPairDefinition>,
    },
    /// Opener and closer name the same method, so no call can close it
    SelfPaired { definition: AllocationPairDefinition },
}

impl fmt::Display for RegistryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryWarning::AmbiguousRole {
                key,
                opener_in,
                closer_in,
            } => write!(
                f,
                "'{}' is an opener in {} definition(s) and a closer in {} definition(s)",
                key,
                opener_in.len(),
                closer_in.len()
            ),
            RegistryWarning::SelfPaired { definition } => write!(
                f,
                "'{}' uses '{}' as both opener and closer",
                definition.class_name, definition.opener
            ),
        }
    }
}

/// Collects definitions from several sources, remembering where each came
/// from so duplicates can be reported precisely
#[derive(Debug, Default)]
pub struct PairRegistryBuilder {
    records: Vec<(AllocationPairDefinition, String)>,
}

impl PairRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one decoded definition; `line` is its position within `origin`
    pub fn add(
        &mut self,
        definition: AllocationPairDefinition,
        origin: &str,
        line: usize,
    ) -> LeakResult<&mut Self> {
        definition.validate(origin, line)?;
        self.records.push((definition, format!("{}:{}", origin, line)));
        Ok(self)
    }

    /// Add every record of a `##`-separated source text
    pub fn add_source(&mut self, text: &str, origin: &str) -> LeakResult<&mut Self> {
        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let definition = AllocationPairDefinition::parse_record(line, origin, idx + 1)?;
            self.add(definition, origin, idx + 1)?;
        }
        Ok(self)
    }

    pub fn add_file(&mut self, path: &Path) -> LeakResult<&mut Self> {
        let text = std::fs::read_to_string(path).map_err(|e| LeakError::io(path, e))?;
        self.add_source(&text, &path.display().to_string())
    }

    /// Add the embedded Android catalog
    pub fn add_builtin(&mut self) -> LeakResult<&mut Self> {
        self.add_source(BUILTIN_PAIRS, "<builtin>")
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn build(self) -> LeakResult<PairRegistry> {
        let mut first_seen: HashMap<&AllocationPairDefinition, &str> = HashMap::new();
        for (definition, origin) in &self.records {
            match first_seen.entry(definition) {
                Entry::Occupied(entry) => {
                    return Err(LeakError::DuplicatePair {
                        record: definition.to_string(),
                        first: entry.get().to_string(),
                        second: origin.clone(),
                    });
                }
                Entry::Vacant(entry) => {
                    entry.insert(origin.as_str());
                }
            }
        }

        Ok(PairRegistry::index(
            self.records.into_iter().map(|(d, _)| d).collect(),
        ))
    }
}

/// Immutable lookup structure over all pair definitions
#[derive(Debug, Clone)]
pub struct PairRegistry {
    definitions: Vec<AllocationPairDefinition>,
    by_open_key: HashMap<PairKey, Vec<DefinitionId>>,
    by_close_key: HashMap<PairKey, Vec<DefinitionId>>,
    warnings: Vec<RegistryWarning>,
}

impl PairRegistry {
    pub fn builder() -> PairRegistryBuilder {
        PairRegistryBuilder::new()
    }

    /// Build a registry from decoded definitions, rejecting duplicates
    pub fn load<I>(definitions: I) -> LeakResult<Self>
    where
        I: IntoIterator<Item = AllocationPairDefinition>,
    {
        let mut builder = PairRegistryBuilder::new();
        for (idx, definition) in definitions.into_iter().enumerate() {
            builder.add(definition, "definitions", idx + 1)?;
        }
        builder.build()
    }

    /// Registry over the embedded Android catalog only
    pub fn builtin() -> LeakResult<Self> {
        let mut builder = PairRegistryBuilder::new();
        builder.add_builtin()?;
        builder.build()
    }

    fn index(definitions: Vec<AllocationPairDefinition>) -> Self {
        let mut by_open_key: HashMap<PairKey, Vec<DefinitionId>> = HashMap::new();
        let mut by_close_key: HashMap<PairKey, Vec<DefinitionId>> = HashMap::new();

        for (id, definition) in definitions.iter().enumerate() {
            by_open_key.entry(definition.open_key()).or_default().push(id);
            by_close_key.entry(definition.close_key()).or_default().push(id);
        }

        let mut warnings = Vec::new();
        for definition in definitions.iter().filter(|d| d.is_self_paired()) {
            let warning = RegistryWarning::SelfPaired {
                definition: definition.clone(),
            };
            warn!("Ineffective pair definition: {}", warning);
            warnings.push(warning);
        }

        let mut ambiguous: Vec<&PairKey> = by_open_key
            .keys()
            .filter(|key| by_close_key.contains_key(*key))
            .collect();
        ambiguous.sort();

        for key in ambiguous {
            let collect = |ids: &[DefinitionId]| -> Vec<AllocationPairDefinition> {
                ids.iter().map(|&id| definitions[id].clone()).collect()
            };
            let opener_in = collect(&by_open_key[key]);
            let closer_in = collect(&by_close_key[key]);

            // same-name definitions are reported as SelfPaired above
            if opener_in == closer_in {
                continue;
            }

            let warning = RegistryWarning::AmbiguousRole {
                key: key.clone(),
                opener_in,
                closer_in,
            };
            warn!("Ambiguous pair configuration: {}", warning);
            warnings.push(warning);
        }

        debug!(
            "Pair registry: {} definitions, {} opener keys, {} closer keys",
            definitions.len(),
            by_open_key.len(),
            by_close_key.len()
        );

        Self {
            definitions,
            by_open_key,
            by_close_key,
            warnings,
        }
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn definitions(&self) -> &[AllocationPairDefinition] {
        &self.definitions
    }

    pub fn definition(&self, id: DefinitionId) -> &AllocationPairDefinition {
        &self.definitions[id]
    }

    pub fn warnings(&self) -> &[RegistryWarning] {
        &self.warnings
    }

    pub fn alloc_type(&self, method: &MethodId) -> AllocType {
        self.alloc_type_of_key(&PairKey::of(method))
    }

    pub fn alloc_type_of_key(&self, key: &PairKey) -> AllocType {
        if self.by_open_key.contains_key(key) {
            AllocType::Opener
        } else if self.by_close_key.contains_key(key) {
            AllocType::Closer
        } else {
            AllocType::None
        }
    }

    /// Every definition whose open or close key matches the method, in
    /// definition order
    pub fn matching_definitions(
        &self,
        method: &MethodId,
    ) -> Vec<(DefinitionId, &AllocationPairDefinition)> {
        let key = PairKey::of(method);
        let mut ids: Vec<DefinitionId> = self
            .by_open_key
            .get(&key)
            .into_iter()
            .chain(self.by_close_key.get(&key))
            .flatten()
            .copied()
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids.into_iter().map(|id| (id, &self.definitions[id])).collect()
    }
}
