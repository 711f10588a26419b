//! Per-entity parameter store and default-parameter templates.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use tracing::trace;

use crate::entity::Entity;
use crate::error::ParamError;
use crate::param::cell::Param;
use crate::param::value::ParamValue;

/// The blackboard of one entity: exactly one cell per key.
#[derive(Debug)]
pub struct ParameterStore {
    owner: Entity,
    cells: RefCell<BTreeMap<String, Rc<Param>>>,
}

impl ParameterStore {
    /// An empty store for `owner`.
    #[must_use]
    pub fn new(owner: Entity) -> Self {
        Self {
            owner,
            cells: RefCell::new(BTreeMap::new()),
        }
    }

    /// The entity this store belongs to.
    #[must_use]
    pub fn owner(&self) -> Entity {
        self.owner
    }

    /// The cell under `key`, if one exists.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Rc<Param>> {
        self.cells.borrow().get(key).cloned()
    }

    /// Installs `cell` under `key`, taking the key and recording this store's
    /// owner. An existing cell under the same key is replaced and returned.
    pub fn set(&self, key: &str, mut cell: Param) -> (Rc<Param>, Option<Rc<Param>>) {
        cell.set_key(key);
        cell.set_owner(self.owner);
        let cell = Rc::new(cell);
        let previous = self
            .cells
            .borrow_mut()
            .insert(key.to_string(), Rc::clone(&cell));
        (cell, previous)
    }

    /// Installs `cell` only if `key` is free. Returns `true` when installed.
    pub fn insert_if_absent(&self, key: &str, cell: Param) -> bool {
        if self.contains(key) {
            return false;
        }
        self.set(key, cell);
        true
    }

    /// Returns the cell under `key`, creating it with `T::default()` on first
    /// access.
    ///
    /// # Errors
    ///
    /// [`ParamError::TypeMismatch`] when the existing cell holds another type.
    pub fn access<T: ParamValue>(&self, key: &str) -> Result<Rc<Param>, ParamError> {
        if let Some(cell) = self.get(key) {
            if !cell.tag().is::<T>() {
                return Err(ParamError::TypeMismatch {
                    key: key.to_string(),
                    expected: std::any::type_name::<T>(),
                    found: cell.tag().name(),
                });
            }
            return Ok(cell);
        }
        trace!(entity = %self.owner, key, "creating parameter");
        Ok(self.set(key, Param::new(T::default())).0)
    }

    /// Backs `key` with memory the caller owns.
    ///
    /// # Errors
    ///
    /// [`ParamError::AlreadySet`] if `key` already has a cell.
    pub fn bind<T: ParamValue>(&self, key: &str, slot: Rc<RefCell<T>>) -> Result<Rc<Param>, ParamError> {
        if self.contains(key) {
            return Err(ParamError::AlreadySet {
                key: key.to_string(),
            });
        }
        Ok(self.set(key, Param::bound(slot)).0)
    }

    /// Backs `key` with memory the caller owns, taking over any cell of the
    /// same type already there. Listeners of the replaced cell stay hooked.
    ///
    /// # Errors
    ///
    /// [`ParamError::TypeMismatch`] when the existing cell holds another
    /// type, [`ParamError::Locked`] while it is notifying.
    pub fn rebind<T: ParamValue>(&self, key: &str, slot: Rc<RefCell<T>>) -> Result<Rc<Param>, ParamError> {
        let cell = Param::bound(slot);
        if let Some(old) = self.get(key) {
            if !old.tag().is::<T>() {
                return Err(ParamError::TypeMismatch {
                    key: key.to_string(),
                    expected: std::any::type_name::<T>(),
                    found: old.tag().name(),
                });
            }
            if old.is_locked() {
                return Err(ParamError::Locked {
                    key: key.to_string(),
                });
            }
            cell.adopt_hooks(&old);
            trace!(entity = %self.owner, key, "parameter rebound");
        }
        Ok(self.set(key, cell).0)
    }

    /// Seeds every key of `template` that is not present yet with a clone of
    /// the template cell. Returns how many cells were added.
    pub fn seed(&self, template: &ParameterTable) -> usize {
        let mut added = 0;
        for (key, cell) in template.iter() {
            if self.insert_if_absent(key, cell.clone_cell()) {
                added += 1;
            }
        }
        added
    }

    /// Removes the cell under `key`.
    pub fn remove(&self, key: &str) -> Option<Rc<Param>> {
        self.cells.borrow_mut().remove(key)
    }

    /// Returns `true` if `key` has a cell.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.cells.borrow().contains_key(key)
    }

    /// All keys, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.cells.borrow().keys().cloned().collect()
    }

    /// Number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.borrow().len()
    }

    /// Returns `true` if the store has no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.borrow().is_empty()
    }
}

/// A component's default-parameter template.
///
/// Keys keep their declaration order; a later entry with the same key
/// replaces the earlier one.
#[derive(Debug, Default)]
pub struct ParameterTable {
    entries: Vec<(String, Param)>,
}

impl ParameterTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a store-owned default.
    #[must_use]
    pub fn with<T: ParamValue>(mut self, key: &str, value: T) -> Self {
        self.insert(key, Param::new(value));
        self
    }

    /// Adds a template cell of any ownership.
    pub fn insert(&mut self, key: &str, mut cell: Param) {
        cell.set_key(key);
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = cell,
            None => self.entries.push((key.to_string(), cell)),
        }
    }

    /// The template cell for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Param> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, p)| p)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Param)> {
        self.entries.iter().map(|(k, p)| (k.as_str(), p))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
