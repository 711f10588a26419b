//! `(family, type)` selectors.
//!
//! A family names a broad role ("kinematics", "renderer"); a type names one
//! interchangeable implementation of it ("kinematic2d"). Selectors are
//! written as `family/type`, or as a bare `family` when any implementation
//! will do. A bare selector resolves its type to the family name.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::InvalidSelector;

/// A component selector.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Selector {
    family: String,
    kind: Option<String>,
}

impl Selector {
    /// Builds a selector with an explicit type.
    #[must_use]
    pub fn new(family: impl Into<String>, kind: impl Into<String>) -> Self {
        let kind = kind.into();
        Self {
            family: family.into(),
            kind: (!kind.is_empty()).then_some(kind),
        }
    }

    /// Builds a selector naming only a family.
    #[must_use]
    pub fn family_only(family: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            kind: None,
        }
    }

    /// Parses `family/type` or `family`. Segments after the type are
    /// ignored. Returns `None` for blank input or an empty family.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let mut segments = text.trim().split('/').map(str::trim);
        let family = segments.next().unwrap_or_default();
        let kind = segments.next().unwrap_or_default();
        if family.is_empty() {
            return None;
        }
        Some(Self::new(family, kind))
    }

    /// Parses a whitespace-separated selector list, in order. Malformed
    /// entries are dropped.
    #[must_use]
    pub fn parse_list(text: &str) -> Vec<Self> {
        text.split_whitespace().filter_map(Self::parse).collect()
    }

    /// The family this selector addresses.
    #[must_use]
    pub fn family(&self) -> &str {
        &self.family
    }

    /// The resolved type: the explicit type, or the family name.
    #[must_use]
    pub fn kind(&self) -> &str {
        self.kind.as_deref().unwrap_or(&self.family)
    }

    /// The type exactly as written, if one was given.
    #[must_use]
    pub fn explicit_kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    /// Returns `true` when a type was written out.
    #[must_use]
    pub fn has_kind(&self) -> bool {
        self.kind.is_some()
    }

    /// Returns `true` if a component of `family`/`kind` satisfies this
    /// selector: same family, and same type when one was written.
    #[must_use]
    pub fn matches(&self, family: &str, kind: &str) -> bool {
        self.family == family && self.kind.as_deref().is_none_or(|k| k == kind)
    }
}

impl PartialEq for Selector {
    fn eq(&self, other: &Self) -> bool {
        self.family == other.family && self.kind() == other.kind()
    }
}

impl Hash for Selector {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.family.hash(state);
        self.kind().hash(state);
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind.as_deref() {
            Some(kind) if kind != self.family => write!(f, "{}/{}", self.family, kind),
            _ => f.write_str(&self.family),
        }
    }
}

impl FromStr for Selector {
    type Err = InvalidSelector;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| InvalidSelector(s.to_string()))
    }
}

impl TryFrom<String> for Selector {
    type Error = InvalidSelector;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Selector> for String {
    fn from(selector: Selector) -> Self {
        selector.to_string()
    }
}
