//! Component-layer error types.
//!
//! | Error | When | Recoverable |
//! |-------|------|-------------|
//! | [`ParamError::Locked`] | write while the cell is notifying | yes, retry next tick |
//! | [`ParamError::TypeMismatch`] | typed access with the wrong type | no |
//! | [`ParamError::AlreadySet`] | binding over an existing cell | no |
//! | [`ComponentError::Assembly`] | a spawn or attach request failed | see [`AssemblyFailure`] |

use thiserror::Error;

use crate::selector::Selector;

/// Errors raised by parameter cells and stores.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    /// The cell is delivering change notifications; writing now would loop.
    #[error("parameter '{key}' is locked while notifying listeners")]
    Locked {
        /// Key of the locked cell.
        key: String,
    },

    /// The cell was created with a different value type.
    #[error("parameter '{key}' holds {found}, accessed as {expected}")]
    TypeMismatch {
        /// Key of the cell.
        key: String,
        /// The type the caller asked for.
        expected: &'static str,
        /// The type fixed at the cell's creation.
        found: &'static str,
    },

    /// A bind targeted a key that already has a cell.
    #[error("parameter '{key}' is already set")]
    AlreadySet {
        /// Key of the existing cell.
        key: String,
    },
}

impl ParamError {
    /// Returns `true` if retrying the same operation later may succeed.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Locked { .. })
    }
}

/// Errors surfaced by component lifecycle methods.
#[derive(Debug, Clone, Error)]
pub enum ComponentError {
    /// A blackboard access failed.
    #[error(transparent)]
    Param(#[from] ParamError),

    /// A spawn or attach made through the runtime failed.
    #[error("{message}")]
    Assembly {
        kind: AssemblyFailure,
        /// The selector the failure names, when there is one: the unmet
        /// dependency, the missing module, or the component whose setup
        /// failed.
        selector: Option<Selector>,
        message: String,
    },

    /// Component-specific failure.
    #[error("{0}")]
    Failed(String),
}

/// Why the runtime refused a spawn or attach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblyFailure {
    UnmetDependency,
    ModuleNotFound,
    NoEntryPoint,
    Setup,
    NoSuchEntity,
    /// An entity-type file could not be read.
    Scene,
}

impl AssemblyFailure {
    /// Returns `true` when the failure came from a missing or broken module
    /// rather than from the entity being assembled.
    #[must_use]
    pub fn is_module(self) -> bool {
        matches!(self, Self::ModuleNotFound | Self::NoEntryPoint)
    }
}

/// A selector string that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid selector '{0}'")]
pub struct InvalidSelector(pub String);
