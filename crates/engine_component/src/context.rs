//! The component's view of the runtime.
//!
//! Every lifecycle call receives a [`Context`]: the owner's parameter store,
//! the caller's identity for write attribution, and a [`Runtime`] handle for
//! requests that reach beyond the owner (spawn, destroy, scene switch, ...).

use std::cell::RefCell;
use std::ops::Add;
use std::rc::Rc;

use tracing::debug;

use crate::component::{ComponentId, Handler};
use crate::entity::Entity;
use crate::error::{ComponentError, ParamError};
use crate::eval::eval;
use crate::param::{Listener, Param, ParamValue, ParameterStore};
use crate::selector::Selector;

/// Requests a component can make of the runtime hosting it.
///
/// Every method takes `&self`: calls arrive from inside `setup`, `update` and
/// change handlers while the runtime is mid-tick.
pub trait Runtime {
    /// The store of a live entity.
    fn store(&self, entity: Entity) -> Option<Rc<ParameterStore>>;

    /// The entity type name of a live entity.
    fn kind_of(&self, entity: Entity) -> Option<String>;

    /// A listener delivering changes to `component`, through `handler` when
    /// given. `None` when the component is not attached.
    fn listener(&self, component: ComponentId, handler: Option<Handler>) -> Option<Rc<dyn Listener>>;

    /// Builds a new entity of type `kind`. `Ok(None)` when the type is unknown.
    ///
    /// # Errors
    ///
    /// Fatal assembly errors of the new entity.
    fn spawn(&self, kind: &str) -> Result<Option<Entity>, ComponentError>;

    /// The first live entity of type `kind`.
    fn locate(&self, kind: &str) -> Option<Entity>;

    /// Marks `entity` for destruction at the next tick.
    fn destroy(&self, entity: Entity);

    /// Builds the component named by `selector` and attaches it to `entity`.
    /// `Ok(false)` when no such component is available.
    ///
    /// # Errors
    ///
    /// Unmet dependencies of the new component.
    fn attach(&self, entity: Entity, selector: &Selector) -> Result<bool, ComponentError>;

    /// Requests a switch to `scene` at the end of the current tick.
    fn load_scene(&self, scene: &str);

    /// Requests the scheduler stop after the current tick.
    fn quit(&self);
}

/// What a component sees during `setup`, `update` and change handling.
pub struct Context<'a> {
    runtime: &'a dyn Runtime,
    owner: Entity,
    component: ComponentId,
    store: Rc<ParameterStore>,
}

impl<'a> Context<'a> {
    #[must_use]
    pub fn new(
        runtime: &'a dyn Runtime,
        owner: Entity,
        component: ComponentId,
        store: Rc<ParameterStore>,
    ) -> Self {
        Self {
            runtime,
            owner,
            component,
            store,
        }
    }

    /// The entity this component is attached to.
    #[must_use]
    pub fn owner(&self) -> Entity {
        self.owner
    }

    /// The calling component's identity.
    #[must_use]
    pub fn id(&self) -> ComponentId {
        self.component
    }

    /// The owner's parameter store.
    #[must_use]
    pub fn store(&self) -> &ParameterStore {
        &self.store
    }

    /// The runtime handle.
    #[must_use]
    pub fn runtime(&self) -> &'a dyn Runtime {
        self.runtime
    }

    // -- blackboard --------------------------------------------------------

    /// The owner's cell under `key`, if it exists.
    #[must_use]
    pub fn param(&self, key: &str) -> Option<Rc<Param>> {
        self.store.get(key)
    }

    /// Returns `true` if the owner has a cell under `key`.
    #[must_use]
    pub fn exists(&self, key: &str) -> bool {
        self.store.contains(key)
    }

    /// Reads `key`, creating it with `T::default()` if absent.
    ///
    /// # Errors
    ///
    /// [`ParamError::TypeMismatch`] for the wrong type.
    pub fn read<T: ParamValue>(&self, key: &str) -> Result<T, ParamError> {
        self.store.access::<T>(key)?.read()
    }

    /// Writes `key` as this component, creating it if absent.
    ///
    /// # Errors
    ///
    /// [`ParamError::Locked`] while the cell notifies,
    /// [`ParamError::TypeMismatch`] for the wrong type.
    pub fn write<T: ParamValue>(&self, key: &str, value: T) -> Result<(), ParamError> {
        self.store
            .access::<T>(key)?
            .write(value, Some(self.component))
    }

    /// Writes `key` on another entity. Never creates the cell: returns
    /// `Ok(false)` when the entity or the key does not exist.
    ///
    /// # Errors
    ///
    /// As [`Context::write`].
    pub fn write_to<T: ParamValue>(&self, entity: Entity, key: &str, value: T) -> Result<bool, ParamError> {
        let Some(cell) = self.runtime.store(entity).and_then(|store| store.get(key)) else {
            return Ok(false);
        };
        cell.write(value, Some(self.component))?;
        Ok(true)
    }

    /// Read, add `delta`, write.
    ///
    /// # Errors
    ///
    /// As [`Context::write`].
    pub fn add<T>(&self, key: &str, delta: T) -> Result<(), ParamError>
    where
        T: ParamValue + Add<Output = T>,
    {
        let cell = self.store.access::<T>(key)?;
        let current = cell.read::<T>()?;
        cell.write(current + delta, Some(self.component))
    }

    /// Seeds `key` from a raw signature value.
    ///
    /// Writes `eval(raw, default)` when `raw` is present or the cell does not
    /// exist yet; otherwise the existing value is kept.
    ///
    /// # Errors
    ///
    /// As [`Context::write`].
    pub fn init<T: ParamValue>(&self, key: &str, raw: Option<&str>, default: T) -> Result<(), ParamError> {
        if raw.is_none() && self.store.contains(key) {
            return Ok(());
        }
        self.write(key, eval(raw, default))
    }

    /// Backs `key` with memory this component owns.
    ///
    /// # Errors
    ///
    /// [`ParamError::AlreadySet`] if the key already has a cell.
    pub fn bind<T: ParamValue>(&self, key: &str, slot: Rc<RefCell<T>>) -> Result<(), ParamError> {
        self.store.bind(key, slot).map(|_| ())
    }

    /// Backs `key` with memory this component owns, taking over a cell of
    /// the same type left by an earlier component. Its listeners stay hooked.
    ///
    /// # Errors
    ///
    /// As [`ParameterStore::rebind`].
    pub fn rebind<T: ParamValue>(&self, key: &str, slot: Rc<RefCell<T>>) -> Result<(), ParamError> {
        self.store.rebind(key, slot).map(|_| ())
    }

    // -- hooks -------------------------------------------------------------

    /// Listens to the owner's `key` through [`Component::handle`].
    /// Returns `false`, hooking nothing, when the key does not exist.
    ///
    /// [`Component::handle`]: crate::Component::handle
    pub fn hook(&self, key: &str) -> bool {
        self.hook_cell(self.store.get(key), None)
    }

    /// Listens to the owner's `key` through `handler`.
    pub fn hook_with(&self, key: &str, handler: Handler) -> bool {
        self.hook_cell(self.store.get(key), Some(handler))
    }

    /// Listens to `key` on another entity. The change notice names that
    /// entity as the owner.
    pub fn hook_on(&self, entity: Entity, key: &str) -> bool {
        let cell = self.runtime.store(entity).and_then(|store| store.get(key));
        self.hook_cell(cell, None)
    }

    /// Stops listening to the owner's `key`.
    pub fn unhook(&self, key: &str) -> bool {
        self.store
            .get(key)
            .is_some_and(|cell| cell.unhook(self.component))
    }

    fn hook_cell(&self, cell: Option<Rc<Param>>, handler: Option<Handler>) -> bool {
        let Some(cell) = cell else {
            return false;
        };
        let Some(listener) = self.runtime.listener(self.component, handler) else {
            debug!(component = %self.component, key = cell.key(), "hook from detached component ignored");
            return false;
        };
        cell.hook(listener);
        true
    }

    // -- runtime requests --------------------------------------------------

    /// Builds a new entity of type `kind`.
    ///
    /// # Errors
    ///
    /// Fatal assembly errors of the new entity.
    pub fn spawn(&self, kind: &str) -> Result<Option<Entity>, ComponentError> {
        self.runtime.spawn(kind)
    }

    /// The first live entity of type `kind`.
    #[must_use]
    pub fn locate(&self, kind: &str) -> Option<Entity> {
        self.runtime.locate(kind)
    }

    /// Marks the owner, and with it this component, for destruction at the
    /// next tick.
    pub fn destroy(&self) {
        self.runtime.destroy(self.owner);
    }

    /// Builds and attaches another component to the owner.
    ///
    /// # Errors
    ///
    /// Unmet dependencies of the new component.
    pub fn attach(&self, selector: &Selector) -> Result<bool, ComponentError> {
        self.runtime.attach(self.owner, selector)
    }

    /// Spawns another entity of the owner's type and copies every parameter
    /// value the two have in common.
    ///
    /// # Errors
    ///
    /// Fatal assembly errors of the copy, or a cell locked mid-notification.
    pub fn clone_owner(&self) -> Result<Option<Entity>, ComponentError> {
        let Some(kind) = self.runtime.kind_of(self.owner) else {
            return Ok(None);
        };
        let Some(copy) = self.runtime.spawn(&kind)? else {
            return Ok(None);
        };
        let Some(target) = self.runtime.store(copy) else {
            return Ok(Some(copy));
        };
        for key in target.keys() {
            if let (Some(dst), Some(src)) = (target.get(&key), self.store.get(&key))
                && dst.tag() == src.tag()
            {
                dst.write_from(&src, Some(self.component))?;
            }
        }
        Ok(Some(copy))
    }

    /// Switches to `scene` once the current tick completes.
    pub fn load_scene(&self, scene: &str) {
        self.runtime.load_scene(scene);
    }

    /// Stops the scheduler once the current tick completes.
    pub fn quit(&self) {
        self.runtime.quit();
    }
}
