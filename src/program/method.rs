use crate::error::LeakError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identity of a program method: declaring class, name and signature
///
/// The signature is the Soot-style sub-signature (`void work(int)`), so two
/// overloads of the same name are distinct methods.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MethodId {
    class: String,
    name: String,
    signature: String,
}

impl MethodId {
    pub fn new(
        class: impl Into<String>,
        name: impl Into<String>,
        signature: impl Into<String>,
    ) -> Self {
        Self {
            class: class.into(),
            name: name.into(),
            signature: signature.into(),
        }
    }

    /// A no-argument `void` method, mostly useful in tests and fixtures
    pub fn simple(class: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        let signature = format!("void {}()", name);
        Self::new(class, name, signature)
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Short `Class.name` form for terminal output
    pub fn short(&self) -> String {
        let simple_class = self.class.rsplit('.').next().unwrap_or(&self.class);
        format!("{}.{}", simple_class, self.name)
    }

    /// Extract the method name from a sub-signature like `void open(int)`
    fn name_from_signature(signature: &str) -> Option<&str> {
        let open = signature.find('(')?;
        if !signature.ends_with(')') {
            return None;
        }
        let name = signature[..open].split_whitespace().last()?;
        if name.is_empty() {
            None
        } else {
            Some(name)
        }
    }
}

impl FromStr for MethodId {
    type Err = LeakError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || LeakError::InvalidMethodSignature(s.to_string());
        let trimmed = s.trim();

        // Full form: <com.app.A: void work(int)>
        if let Some(inner) = trimmed
            .strip_prefix('<')
            .and_then(|rest| rest.strip_suffix('>'))
        {
            let (class, signature) = inner.split_once(':').ok_or_else(invalid)?;
            let class = class.trim();
            let signature = signature.trim();
            let name = Self::name_from_signature(signature).ok_or_else(invalid)?;
            if class.is_empty() {
                return Err(invalid());
            }
            return Ok(Self::new(class, name, signature));
        }

        // Shorthand: com.app.A.work
        let (class, name) = trimmed.rsplit_once('.').ok_or_else(invalid)?;
        let valid_name = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_alphanumeric() || c == '_' || c == '$' || c == '<' || c == '>');
        if class.is_empty() || !valid_name {
            return Err(invalid());
        }
        Ok(Self::simple(class, name))
    }
}

impl TryFrom<String> for MethodId {
    type Error = LeakError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MethodId> for String {
    fn from(value: MethodId) -> Self {
        value.to_string()
    }
}

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}: {}>", self.class, self.signature)
    }
}

/// Opaque handle of a call site, used for diagnostics and as the anchor of
/// synthetic edges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallSiteId(pub u32);

impl fmt::Display for CallSiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
