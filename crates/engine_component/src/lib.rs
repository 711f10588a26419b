//! # engine_component
//!
//! The contract shared by the runtime and every component module: what a
//! component is, how it is named, and the per-entity blackboard it talks
//! through.
//!
//! This crate provides:
//!
//! - [`Component`] trait — lifecycle (`setup`, `update`, `handle`), identity
//!   and declared dependencies.
//! - [`Selector`] — `family/type` addressing.
//! - [`ParameterStore`] / [`Param`] — typed, observable blackboard cells with
//!   write attribution.
//! - [`Context`] / [`Runtime`] — what a component may ask of its host.
//! - [`Signature`] and [`eval`] — flat string configuration and typed
//!   evaluation with defaults.
//! - [`export_component!`] — the factory entry point of a loadable module.

pub mod component;
pub mod context;
pub mod entity;
pub mod error;
pub mod eval;
pub mod param;
pub mod plugin;
pub mod selector;
pub mod signature;

pub use component::{AsAny, Component, ComponentId, Handler, handler};
pub use context::{Context, Runtime};
pub use entity::{Entity, EntityAllocator};
pub use error::{AssemblyFailure, ComponentError, InvalidSelector, ParamError};
pub use eval::eval;
pub use param::{Change, Listener, Ownership, Param, ParamValue, ParameterStore, ParameterTable, TypeTag};
pub use plugin::EntryPoint;
pub use selector::Selector;
pub use signature::Signature;
