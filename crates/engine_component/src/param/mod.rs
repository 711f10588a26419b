//! The per-entity blackboard.
//!
//! Each entity owns a [`ParameterStore`]: string-keyed [`Param`] cells whose
//! value type is fixed at creation. Every write records its writer and
//! synchronously notifies the cell's [`Listener`]s before returning. A cell
//! that is delivering notifications rejects further writes with
//! [`ParamError::Locked`](crate::ParamError::Locked).

pub mod cell;
pub mod store;
pub mod value;

pub use cell::{Change, Listener, Ownership, Param};
pub use store::{ParameterStore, ParameterTable};
pub use value::{ParamValue, SharedValue, TypeTag, Value};
