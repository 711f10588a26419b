//! A single blackboard cell.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use tracing::trace;

use crate::component::ComponentId;
use crate::entity::Entity;
use crate::error::ParamError;
use crate::param::value::{ParamValue, SharedValue, TypeTag, Value};

/// A change notice delivered to listeners after every write.
#[derive(Debug, Clone, Copy)]
pub struct Change<'a> {
    /// Key of the written cell.
    pub key: &'a str,
    /// The component that wrote it; `None` for writes made by the runtime.
    pub writer: Option<ComponentId>,
    /// The entity owning the cell.
    pub owner: Entity,
}

/// Something that wants to hear about writes to a cell.
///
/// The runtime wraps each hooking component (plus its optional alternate
/// handler) in a listener; tests can implement it directly.
pub trait Listener {
    /// The identity used by [`Param::unhook`]. One hook per identity.
    fn listener_id(&self) -> ComponentId;

    /// Dead listeners are pruned and never notified.
    fn is_alive(&self) -> bool {
        true
    }

    /// Called synchronously, in hook order, for every write.
    fn on_change(&self, change: &Change<'_>);
}

/// Who owns the memory behind a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// Allocated by the store and released with it.
    Store,
    /// Bound to memory a component owns; the store only borrows it.
    Bound,
}

/// One typed, observable blackboard value.
///
/// The type is fixed when the cell is created and checked on every typed
/// access. All mutation goes through `&self` so a listener can read the cell
/// (or write other cells) while it is being notified.
pub struct Param {
    key: String,
    owner: Cell<Entity>,
    value: SharedValue,
    tag: TypeTag,
    ownership: Ownership,
    last_writer: Cell<Option<ComponentId>>,
    hooks: RefCell<Vec<Rc<dyn Listener>>>,
    locked: Cell<bool>,
}

impl Param {
    /// A store-owned cell holding `value`.
    #[must_use]
    pub fn new<T: ParamValue>(value: T) -> Self {
        Self::from_parts(Rc::new(RefCell::new(value)), TypeTag::of::<T>(), Ownership::Store)
    }

    /// A cell backed by memory the caller keeps. Writes through the cell are
    /// visible through `slot` and vice versa.
    #[must_use]
    pub fn bound<T: ParamValue>(slot: Rc<RefCell<T>>) -> Self {
        Self::from_parts(slot, TypeTag::of::<T>(), Ownership::Bound)
    }

    fn from_parts(value: SharedValue, tag: TypeTag, ownership: Ownership) -> Self {
        Self {
            key: String::new(),
            owner: Cell::new(Entity::UNOWNED),
            value,
            tag,
            ownership,
            last_writer: Cell::new(None),
            hooks: RefCell::new(Vec::new()),
            locked: Cell::new(false),
        }
    }

    /// The key this cell is installed under (empty until installed).
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    pub(crate) fn set_key(&mut self, key: impl Into<String>) {
        self.key = key.into();
    }

    /// The entity whose store holds this cell.
    #[must_use]
    pub fn owner(&self) -> Entity {
        self.owner.get()
    }

    pub(crate) fn set_owner(&self, owner: Entity) {
        self.owner.set(owner);
    }

    /// The value type fixed at creation.
    #[must_use]
    pub fn tag(&self) -> TypeTag {
        self.tag
    }

    /// `true` when the store owns the backing memory.
    #[must_use]
    pub fn is_store_owned(&self) -> bool {
        self.ownership == Ownership::Store
    }

    /// Ownership of the backing memory.
    #[must_use]
    pub fn ownership(&self) -> Ownership {
        self.ownership
    }

    /// The component that performed the most recent write.
    #[must_use]
    pub fn last_writer(&self) -> Option<ComponentId> {
        self.last_writer.get()
    }

    /// `true` while listeners are being notified.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.locked.get()
    }

    /// Number of live hooks.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.hooks.borrow().iter().filter(|h| h.is_alive()).count()
    }

    fn check<T: ParamValue>(&self) -> Result<(), ParamError> {
        if self.tag.is::<T>() {
            Ok(())
        } else {
            Err(self.mismatch::<T>())
        }
    }

    fn mismatch<T: ParamValue>(&self) -> ParamError {
        ParamError::TypeMismatch {
            key: self.key.clone(),
            expected: std::any::type_name::<T>(),
            found: self.tag.name(),
        }
    }

    fn locked_error(&self) -> ParamError {
        ParamError::Locked {
            key: self.key.clone(),
        }
    }

    /// Reads a copy of the value.
    ///
    /// # Errors
    ///
    /// [`ParamError::TypeMismatch`] when `T` is not the cell's type.
    pub fn read<T: ParamValue>(&self) -> Result<T, ParamError> {
        self.check::<T>()?;
        self.value
            .borrow()
            .as_any()
            .downcast_ref::<T>()
            .cloned()
            .ok_or_else(|| self.mismatch::<T>())
    }

    /// Writes `value`, records `writer`, then notifies every listener before
    /// returning.
    ///
    /// # Errors
    ///
    /// [`ParamError::Locked`] when called from inside this cell's own
    /// notification, [`ParamError::TypeMismatch`] for the wrong type. The
    /// value is untouched in both cases.
    pub fn write<T: ParamValue>(&self, value: T, writer: Option<ComponentId>) -> Result<(), ParamError> {
        if self.locked.get() {
            return Err(self.locked_error());
        }
        self.check::<T>()?;
        {
            let mut slot = self.value.borrow_mut();
            let Some(current) = slot.as_any_mut().downcast_mut::<T>() else {
                return Err(self.mismatch::<T>());
            };
            *current = value;
        }
        self.last_writer.set(writer);
        self.notify();
        Ok(())
    }

    /// Parses `raw` into the cell's own type and writes it.
    ///
    /// Returns `Ok(false)` without writing or notifying when `raw` does not
    /// parse.
    ///
    /// # Errors
    ///
    /// [`ParamError::Locked`] while the cell is notifying.
    pub fn write_raw(&self, raw: &str, writer: Option<ComponentId>) -> Result<bool, ParamError> {
        if self.locked.get() {
            return Err(self.locked_error());
        }
        if !self.value.borrow_mut().assign_parsed(raw) {
            return Ok(false);
        }
        self.last_writer.set(writer);
        self.notify();
        Ok(true)
    }

    /// Copies the value of another cell of the same type into this one.
    ///
    /// # Errors
    ///
    /// [`ParamError::Locked`] while notifying, [`ParamError::TypeMismatch`]
    /// when the tags differ.
    pub fn write_from(&self, other: &Param, writer: Option<ComponentId>) -> Result<(), ParamError> {
        if self.locked.get() {
            return Err(self.locked_error());
        }
        if self.tag != other.tag {
            return Err(ParamError::TypeMismatch {
                key: self.key.clone(),
                expected: other.tag.name(),
                found: self.tag.name(),
            });
        }
        if !Rc::ptr_eq(&self.value, &other.value) {
            let source = other.value.borrow();
            self.value.borrow_mut().assign_from(&*source);
        }
        self.last_writer.set(writer);
        self.notify();
        Ok(())
    }

    /// Compares values; cells of different types are never equal.
    #[must_use]
    pub fn same_value(&self, other: &Param) -> bool {
        if Rc::ptr_eq(&self.value, &other.value) {
            return true;
        }
        self.value.borrow().same_as(&*other.value.borrow())
    }

    /// Copies value and listeners into a new cell. The copy is always
    /// store-owned, whatever this cell's ownership.
    #[must_use]
    pub fn clone_cell(&self) -> Param {
        let value = self.value.borrow().duplicate();
        let mut cloned = Self::from_parts(value, self.tag, Ownership::Store);
        cloned.key = self.key.clone();
        cloned.owner.set(self.owner.get());
        cloned.last_writer.set(self.last_writer.get());
        *cloned.hooks.get_mut() = self.hooks.borrow().clone();
        cloned
    }

    /// Adds a listener. A listener already hooked is replaced in place, so
    /// every listener is notified at most once per write.
    pub fn hook(&self, listener: Rc<dyn Listener>) {
        let mut hooks = self.hooks.borrow_mut();
        let id = listener.listener_id();
        match hooks.iter().position(|h| h.listener_id() == id) {
            Some(pos) => hooks[pos] = listener,
            None => hooks.push(listener),
        }
    }

    /// Hooks every listener of `other` onto this cell, in their order.
    pub(crate) fn adopt_hooks(&self, other: &Param) {
        let hooks = other.hooks.borrow().clone();
        for listener in hooks {
            self.hook(listener);
        }
    }

    /// Removes the listener with `id`. Returns `true` if it was hooked.
    pub fn unhook(&self, id: ComponentId) -> bool {
        let mut hooks = self.hooks.borrow_mut();
        let before = hooks.len();
        hooks.retain(|h| h.listener_id() != id);
        hooks.len() != before
    }

    fn notify(&self) {
        // Snapshot: listeners hooked during delivery wait for the next write.
        let hooks: Vec<Rc<dyn Listener>> = {
            let mut hooks = self.hooks.borrow_mut();
            hooks.retain(|h| h.is_alive());
            hooks.clone()
        };
        if hooks.is_empty() {
            return;
        }

        let _lock = NotifyLock::acquire(&self.locked);
        let change = Change {
            key: &self.key,
            writer: self.last_writer.get(),
            owner: self.owner.get(),
        };
        for listener in hooks {
            if !listener.is_alive() {
                continue;
            }
            trace!(key = %self.key, listener = %listener.listener_id(), "notifying");
            listener.on_change(&change);
        }
    }
}

impl fmt::Debug for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Param")
            .field("key", &self.key)
            .field("owner", &self.owner.get())
            .field("value", &self.value.borrow())
            .field("ownership", &self.ownership)
            .field("last_writer", &self.last_writer.get())
            .field("listeners", &self.hooks.borrow().len())
            .finish()
    }
}

/// Holds a cell's lock for the duration of a notification round.
struct NotifyLock<'a>(&'a Cell<bool>);

impl<'a> NotifyLock<'a> {
    fn acquire(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for NotifyLock<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}
