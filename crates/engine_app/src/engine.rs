//! The engine: one self-contained runtime instance.
//!
//! All state lives behind an [`Engine`]. Components reach it through the
//! [`Runtime`] implementation of the shared core, which only ever borrows
//! its state for the duration of a single request and never while a
//! component is running.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::rc::{Rc, Weak};

use tracing::{debug, info, trace};

use engine_component::{
    Change, Component, ComponentError, ComponentId, Context, Entity, EntityAllocator, Handler, Listener,
    ParameterStore, Runtime, Selector, Signature,
};

use crate::config::{EngineConfig, EventPump, TickConfig};
use crate::error::EngineError;
use crate::factory::ComponentFactory;
use crate::registry::Builder;
use crate::scheduler::Scheduler;
use crate::world::{EntityRecord, Slot, World};

/// Everything a scene switch throws away.
#[derive(Debug, Default)]
pub(crate) struct Core {
    pub(crate) world: World,
    pub(crate) scheduler: Scheduler,
    /// Attached components by id, for hook delivery.
    pub(crate) slots: HashMap<ComponentId, Rc<Slot>>,
    pub(crate) next_scene: Option<String>,
    pub(crate) quit: bool,
}

impl Core {
    /// Removes every entity queued for destruction and queues its components
    /// for removal. The removed records are handed back to be dropped by the
    /// caller.
    pub(crate) fn finalize_destroyed(&mut self) -> Vec<EntityRecord> {
        let mut finalized = Vec::new();
        for entity in self.scheduler.take_destroyed() {
            let Some((record, components)) = self.world.remove(entity) else {
                continue;
            };
            for slot in components {
                self.slots.remove(&slot.id());
                self.scheduler.remove(slot);
            }
            debug!(%entity, kind = record.name(), "entity finalized");
            finalized.push(record);
        }
        finalized
    }
}

/// State shared between the engine and the hooks it hands out.
///
/// Field order is drop order: components and their stores go before the
/// factory that holds the modules their code lives in.
pub(crate) struct Shared {
    me: Weak<Shared>,
    pub(crate) core: RefCell<Core>,
    pub(crate) allocator: RefCell<EntityAllocator>,
    next_component: Cell<u64>,
    pub(crate) factory: RefCell<ComponentFactory>,
}

impl Shared {
    fn new() -> Rc<Self> {
        Rc::new_cyclic(|me| Self {
            me: me.clone(),
            core: RefCell::new(Core::default()),
            allocator: RefCell::new(EntityAllocator::new()),
            next_component: Cell::new(1),
            factory: RefCell::new(ComponentFactory::new()),
        })
    }

    pub(crate) fn next_component_id(&self) -> ComponentId {
        let id = self.next_component.get();
        self.next_component.set(id + 1);
        ComponentId(id)
    }

    /// Marks `entity` destroyed and queues it for finalization.
    pub(crate) fn destroy_entity(&self, entity: Entity) {
        let mut core = self.core.borrow_mut();
        if core.world.mark_destroyed(entity) {
            core.scheduler.queue_destroy(entity);
            debug!(%entity, "entity marked for destruction");
        }
    }

    /// Detaches the component of `family` from `entity`.
    pub(crate) fn detach(&self, entity: Entity, family: &str) -> bool {
        let slot = {
            let mut core = self.core.borrow_mut();
            let core = &mut *core;
            let Some(slot) = core.world.get_mut(entity).and_then(|r| r.detach(family)) else {
                return false;
            };
            core.slots.remove(&slot.id());
            core.scheduler.remove(Rc::clone(&slot));
            slot
        };
        debug!(%entity, selector = %slot.selector(), "component detached");
        true
    }
}

impl Runtime for Shared {
    fn store(&self, entity: Entity) -> Option<Rc<ParameterStore>> {
        let core = self.core.borrow();
        core.world
            .get(entity)
            .filter(|r| !r.is_destroyed())
            .map(|r| Rc::clone(r.store()))
    }

    fn kind_of(&self, entity: Entity) -> Option<String> {
        let core = self.core.borrow();
        core.world
            .get(entity)
            .filter(|r| !r.is_destroyed())
            .map(|r| r.name().to_string())
    }

    fn listener(&self, component: ComponentId, handler: Option<Handler>) -> Option<Rc<dyn Listener>> {
        let slot = self.core.borrow().slots.get(&component).cloned()?;
        if slot.is_released() {
            return None;
        }
        Some(Rc::new(Hook {
            id: component,
            slot: Rc::downgrade(&slot),
            runtime: self.me.clone(),
            handler,
        }))
    }

    fn spawn(&self, kind: &str) -> Result<Option<Entity>, ComponentError> {
        Ok(self.spawn_entity(kind)?)
    }

    fn locate(&self, kind: &str) -> Option<Entity> {
        self.core.borrow().world.locate(kind)
    }

    fn destroy(&self, entity: Entity) {
        self.destroy_entity(entity);
    }

    fn attach(&self, entity: Entity, selector: &Selector) -> Result<bool, ComponentError> {
        Ok(self.attach_to(entity, selector)?)
    }

    fn load_scene(&self, scene: &str) {
        debug!(scene, "scene switch requested");
        self.core.borrow_mut().next_scene = Some(scene.to_string());
    }

    fn quit(&self) {
        debug!("quit requested");
        self.core.borrow_mut().quit = true;
    }
}

/// Delivers cell changes to one attached component.
struct Hook {
    id: ComponentId,
    slot: Weak<Slot>,
    runtime: Weak<Shared>,
    handler: Option<Handler>,
}

impl Listener for Hook {
    fn listener_id(&self) -> ComponentId {
        self.id
    }

    fn is_alive(&self) -> bool {
        self.slot.upgrade().is_some_and(|slot| !slot.is_released())
    }

    fn on_change(&self, change: &Change<'_>) {
        let (Some(slot), Some(shared)) = (self.slot.upgrade(), self.runtime.upgrade()) else {
            return;
        };
        if slot.is_released() {
            return;
        }
        let Some(store) = shared.store(slot.owner()) else {
            trace!(component = %self.id, key = change.key, "owner destroyed, notice dropped");
            return;
        };
        let Ok(mut component) = slot.component().try_borrow_mut() else {
            trace!(component = %self.id, key = change.key, "listener busy, notice dropped");
            return;
        };
        let mut ctx = Context::new(&*shared, slot.owner(), self.id, store);
        match &self.handler {
            Some(handler) => handler(&mut **component, &mut ctx, change),
            None => component.handle(&mut ctx, change),
        }
    }
}

/// A runtime instance: registry, world, scheduler and tick loop.
///
/// # Examples
///
/// ```rust,no_run
/// use engine_app::{Engine, EngineConfig};
///
/// let mut engine = Engine::new(EngineConfig::new().with_builtins(engine_builtin::builtins()));
/// engine.load_scene("scenes/pong").unwrap();
/// engine.run().unwrap();
/// ```
pub struct Engine {
    pub(crate) shared: Rc<Shared>,
    pub(crate) tick_config: TickConfig,
    pub(crate) compath: Option<String>,
    pub(crate) pump: Box<dyn EventPump>,
    pub(crate) tick_id: u64,
}

impl Engine {
    /// Creates an engine and registers its built-in components.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        let shared = Shared::new();
        {
            let mut factory = shared.factory.borrow_mut();
            for (selector, build) in &config.builtins {
                factory.register(selector, Some(Builder::Native(*build)));
            }
            if let Some(compath) = &config.compath {
                factory.set_search_path(compath);
            }
        }
        info!(
            version = Self::version(),
            builtins = config.builtins.len(),
            tick_rate = config.tick.tick_rate,
            "engine created"
        );
        Self {
            shared,
            tick_config: config.tick,
            compath: config.compath,
            pump: config.pump,
            tick_id: 0,
        }
    }

    /// The engine version.
    #[must_use]
    pub fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    /// Registers a host-compiled component.
    pub fn register(&mut self, selector: &Selector, build: fn() -> Box<dyn Component>) -> bool {
        self.shared
            .factory
            .borrow_mut()
            .register(selector, Some(Builder::Native(build)))
    }

    /// Replaces the module search path.
    pub fn set_search_path(&mut self, compath: &str) {
        self.shared.factory.borrow_mut().set_search_path(compath);
    }

    /// Loads the module implementing `selector`, from `path` or the search
    /// path.
    ///
    /// # Errors
    ///
    /// See [`ComponentFactory::load`].
    pub fn load_component(&mut self, selector: &Selector, path: Option<&Path>) -> Result<(), EngineError> {
        self.shared.factory.borrow_mut().load(selector, path)
    }

    /// Returns `true` if `selector` can be built without loading anything.
    #[must_use]
    pub fn is_registered(&self, selector: &Selector) -> bool {
        self.shared.factory.borrow().registry().resolve(selector).is_some()
    }

    /// Registers the signature of entity type `kind`.
    pub fn define(&mut self, kind: &str, signature: Signature) {
        self.shared.core.borrow_mut().world.define(kind, signature);
    }

    /// Builds an entity of type `kind`. `Ok(None)` when the type is unknown.
    ///
    /// # Errors
    ///
    /// Fatal assembly errors; the partial entity is released.
    pub fn spawn(&mut self, kind: &str) -> Result<Option<Entity>, EngineError> {
        self.shared.spawn_entity(kind)
    }

    /// The first live entity of type `kind`.
    #[must_use]
    pub fn locate(&self, kind: &str) -> Option<Entity> {
        self.shared.locate(kind)
    }

    /// The parameter store of a live entity.
    #[must_use]
    pub fn store(&self, entity: Entity) -> Option<Rc<ParameterStore>> {
        self.shared.store(entity)
    }

    /// Selectors of the components attached to `entity`, in attach order.
    #[must_use]
    pub fn components(&self, entity: Entity) -> Vec<Selector> {
        let core = self.shared.core.borrow();
        core.world
            .get(entity)
            .map(|r| r.components().iter().map(|c| c.selector().clone()).collect())
            .unwrap_or_default()
    }

    /// Marks `entity` for destruction at the next tick.
    pub fn destroy(&mut self, entity: Entity) {
        self.shared.destroy_entity(entity);
    }

    /// Builds and attaches a component to a live entity. `Ok(false)` when
    /// no such component is available.
    ///
    /// # Errors
    ///
    /// [`EngineError::NoSuchEntity`], unmet dependencies, or a failed setup.
    pub fn attach(&mut self, entity: Entity, selector: &Selector) -> Result<bool, EngineError> {
        self.shared.attach_to(entity, selector)
    }

    /// Detaches the component of `family`. It is released at once and
    /// erased from the scheduler at the next tick.
    pub fn detach(&mut self, entity: Entity, family: &str) -> bool {
        self.shared.detach(entity, family)
    }

    /// Returns `true` if `entity` exists and is not marked destroyed.
    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        !self.shared.core.borrow().world.is_destroyed(entity)
    }

    /// Returns the number of live entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        let core = self.shared.core.borrow();
        core.world
            .entities()
            .into_iter()
            .filter(|&e| !core.world.is_destroyed(e))
            .count()
    }

    /// Returns the number of components admitted to the scheduler.
    #[must_use]
    pub fn component_count(&self) -> usize {
        self.shared.core.borrow().scheduler.component_count()
    }

    /// Returns the number of ticks run so far.
    #[must_use]
    pub fn tick_id(&self) -> u64 {
        self.tick_id
    }

    /// Requests a switch to `scene` at the end of the next tick.
    pub fn request_scene(&mut self, scene: &str) {
        self.shared.load_scene(scene);
    }

    /// Requests a stop at the end of the next tick.
    pub fn request_quit(&mut self) {
        self.shared.quit();
    }

    /// Runs `f` on the component of `family` attached to `entity`, if it is
    /// a `C` and not currently running.
    pub fn inspect<C: Component, R>(&self, entity: Entity, family: &str, f: impl FnOnce(&C) -> R) -> Option<R> {
        let slot = {
            let core = self.shared.core.borrow();
            Rc::clone(core.world.get(entity)?.component(family)?)
        };
        let component = slot.component().try_borrow().ok()?;
        component.downcast_ref::<C>().map(f)
    }

    /// Number of loaded component modules.
    #[must_use]
    pub fn module_count(&self) -> usize {
        self.shared.factory.borrow().module_count()
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("tick_config", &self.tick_config)
            .field("tick_id", &self.tick_id)
            .field("entities", &self.entity_count())
            .field("components", &self.component_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, Kinematic, Spatial, events};

    fn ball(engine: &mut Engine, x: &str) -> Entity {
        engine.define(
            "ball",
            Signature::new().with("attach", "spatial kinematics").with("x", x),
        );
        engine.spawn("ball").unwrap().unwrap()
    }

    fn x_of(engine: &Engine, entity: Entity) -> f32 {
        engine.store(entity).unwrap().get("x").unwrap().read::<f32>().unwrap()
    }

    #[test]
    fn test_version_is_crate_version() {
        assert_eq!(Engine::version(), env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_inspect_downcasts_attached_component() {
        let mut engine = testing::engine();
        let ball = ball(&mut engine, "1");
        assert_eq!(engine.inspect(ball, "spatial", |_: &Spatial| 7), Some(7));
        assert_eq!(engine.inspect(ball, "spatial", |_: &Kinematic| 7), None);
        assert_eq!(engine.inspect(ball, "render", |_: &Spatial| 7), None);
    }

    #[test]
    fn test_locate_skips_destroyed_entities() {
        let mut engine = testing::engine();
        let first = ball(&mut engine, "1");
        let second = engine.spawn("ball").unwrap().unwrap();
        assert_eq!(engine.locate("ball"), Some(first));
        assert_eq!(engine.entity_count(), 2);

        engine.destroy(first);
        assert_eq!(engine.locate("ball"), Some(second));
        assert_eq!(engine.entity_count(), 1);
        assert!(engine.attach(first, &Selector::family_only("spatial")).is_err());
    }

    #[test]
    fn test_listener_needs_attached_component() {
        let engine = testing::engine();
        assert!(engine.shared.listener(ComponentId(999), None).is_none());
    }

    #[test]
    fn test_detached_component_is_no_longer_notified() {
        let mut engine = testing::engine();
        engine.define("sensor", Signature::new().with("attach", "watcher"));
        let sensor = engine.spawn("sensor").unwrap().unwrap();
        let x = engine.store(sensor).unwrap().get("x").unwrap();

        x.write(2.0f32, None).unwrap();
        assert_eq!(events(), vec!["setup spatial", "changed x = 2"]);

        assert!(engine.detach(sensor, "watcher"));
        x.write(3.0f32, None).unwrap();
        assert!(events().is_empty());
        assert_eq!(x.listener_count(), 0);
    }

    #[test]
    fn test_destroyed_owner_is_not_notified() {
        let mut engine = testing::engine();
        engine.define("sensor", Signature::new().with("attach", "watcher"));
        let sensor = engine.spawn("sensor").unwrap().unwrap();
        let x = engine.store(sensor).unwrap().get("x").unwrap();
        events();

        engine.destroy(sensor);
        x.write(2.0f32, None).unwrap();
        assert!(events().is_empty());
    }

    #[test]
    fn test_clone_owner_copies_shared_cells() {
        let mut engine = testing::engine();
        let original = ball(&mut engine, "5");
        let store = engine.store(original).unwrap();
        store.get("x.speed").unwrap().write(3.0f32, None).unwrap();

        let ctx = Context::new(&*engine.shared, original, ComponentId(0), store);
        let copy = ctx.clone_owner().unwrap().unwrap();

        assert_ne!(copy, original);
        assert_eq!(x_of(&engine, copy), 5.0);
        let speed = engine.store(copy).unwrap().get("x.speed").unwrap();
        assert_eq!(speed.read::<f32>().unwrap(), 3.0);
        assert_eq!(speed.last_writer(), Some(ComponentId(0)));
    }

    #[test]
    fn test_spawn_through_runtime() {
        let mut engine = testing::engine();
        let first = ball(&mut engine, "1");
        let store = engine.store(first).unwrap();
        let ctx = Context::new(&*engine.shared, first, ComponentId(0), store);

        let second = ctx.spawn("ball").unwrap().unwrap();
        assert_eq!(ctx.locate("ball"), Some(first));
        assert!(ctx.spawn("ghost").unwrap().is_none());
        assert!(ctx.attach(&Selector::family_only("render")).is_ok_and(|attached| !attached));
        assert_eq!(x_of(&engine, second), 1.0);
    }
}
