//! The [`Component`] contract.
//!
//! A component is a pluggable behavior unit identified by a `(family, type)`
//! pair. It never holds references to other components: everything it shares
//! goes through its owner's parameter store, reached via the [`Context`]
//! handed to every lifecycle call.
//!
//! ## Identity
//!
//! [`Component::family`] names the role ("kinematics") and
//! [`Component::kind`] the implementation ("kinematic2d"). An entity holds at
//! most one component per family; attaching another of the same family
//! replaces the first.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::error::ComponentError;
use crate::param::{Change, ParameterTable};
use crate::selector::Selector;
use crate::signature::Signature;

/// Identity of one attached component instance, unique per runtime.
///
/// Used as the writer attribution on parameter cells and as the listener
/// identity for hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentId(pub u64);

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Component({})", self.0)
    }
}

/// Upcast to [`Any`] so `dyn Component` can be downcast.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A pluggable behavior unit.
///
/// # Examples
///
/// ```rust
/// use engine_component::{Component, ComponentError, Context, ParameterTable, Signature};
///
/// #[derive(Default)]
/// struct Counter;
///
/// impl Component for Counter {
///     fn kind(&self) -> &str { "counter" }
///
///     fn parameters(&self) -> ParameterTable {
///         ParameterTable::new().with("count", 0i64)
///     }
///
///     fn setup(&mut self, ctx: &mut Context<'_>, sig: &Signature) -> Result<(), ComponentError> {
///         ctx.init("count", sig.get("count"), 0i64)?;
///         Ok(())
///     }
///
///     fn update(&mut self, ctx: &mut Context<'_>, _dt: f32) -> Result<(), ComponentError> {
///         ctx.add("count", 1i64)?;
///         Ok(())
///     }
/// }
/// ```
pub trait Component: AsAny + 'static {
    /// The implementation name.
    fn kind(&self) -> &str;

    /// The role this component fills. Defaults to [`Component::kind`].
    fn family(&self) -> &str {
        self.kind()
    }

    /// `family/type` of this component.
    fn selector(&self) -> Selector {
        Selector::new(self.family(), self.kind())
    }

    /// Components that must be attached to the same entity first.
    fn depends(&self) -> Vec<Selector> {
        Vec::new()
    }

    /// Default-parameter template seeded into the owner's store on attach.
    fn parameters(&self) -> ParameterTable {
        ParameterTable::new()
    }

    /// Called once after attach, with the owner's signature.
    ///
    /// # Errors
    ///
    /// An error aborts assembly of the owning entity.
    fn setup(&mut self, ctx: &mut Context<'_>, signature: &Signature) -> Result<(), ComponentError>;

    /// Called once per tick with the elapsed time in seconds.
    ///
    /// # Errors
    ///
    /// Errors are logged by the scheduler; the component keeps running.
    fn update(&mut self, ctx: &mut Context<'_>, dt: f32) -> Result<(), ComponentError>;

    /// Default change handler for hooked cells.
    fn handle(&mut self, ctx: &mut Context<'_>, change: &Change<'_>) {
        let _ = (ctx, change);
    }
}

impl dyn Component {
    /// Downcasts to the concrete component type.
    #[must_use]
    pub fn downcast_ref<T: Component>(&self) -> Option<&T> {
        AsAny::as_any(self).downcast_ref()
    }

    /// Mutable downcast to the concrete component type.
    pub fn downcast_mut<T: Component>(&mut self) -> Option<&mut T> {
        AsAny::as_any_mut(self).downcast_mut()
    }
}

impl fmt::Debug for dyn Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Component({}/{})", self.family(), self.kind())
    }
}

/// An alternate change handler supplied when hooking a cell.
pub type Handler = Rc<dyn Fn(&mut dyn Component, &mut Context<'_>, &Change<'_>)>;

/// Wraps a method of a concrete component as a [`Handler`].
///
/// The handler does nothing when invoked on a component of another type.
pub fn handler<C: Component>(f: fn(&mut C, &mut Context<'_>, &Change<'_>)) -> Handler {
    erase(move |component, ctx, change| {
        if let Some(component) = component.downcast_mut::<C>() {
            f(component, ctx, change);
        }
    })
}

fn erase<F>(f: F) -> Handler
where
    F: Fn(&mut dyn Component, &mut Context<'_>, &Change<'_>) + 'static,
{
    Rc::new(f)
}
