//! A one-entity runtime for exercising components in isolation.

use std::cell::Cell;
use std::rc::Rc;

use engine_component::{
    Change, Component, ComponentError, ComponentId, Context, Entity, Handler, Listener, ParameterStore, Runtime,
    Selector,
};

pub(crate) struct Bench {
    store: Rc<ParameterStore>,
    destroyed: Cell<bool>,
}

impl Bench {
    pub(crate) const OWNER: Entity = Entity(1);

    pub(crate) fn new() -> Self {
        Self {
            store: Rc::new(ParameterStore::new(Self::OWNER)),
            destroyed: Cell::new(false),
        }
    }

    pub(crate) fn context(&self) -> Context<'_> {
        Context::new(self, Self::OWNER, ComponentId(1), Rc::clone(&self.store))
    }

    /// Seeds the component's default template, as attach does.
    pub(crate) fn seed(&self, component: &dyn Component) {
        self.store.seed(&component.parameters());
    }

    pub(crate) fn read(&self, key: &str) -> f32 {
        self.store.access::<f32>(key).and_then(|cell| cell.read()).unwrap_or(f32::NAN)
    }

    pub(crate) fn destroyed(&self) -> bool {
        self.destroyed.get()
    }
}

/// Accepts hooks and ignores the notices.
struct Deaf(ComponentId);

impl Listener for Deaf {
    fn listener_id(&self) -> ComponentId {
        self.0
    }

    fn on_change(&self, _change: &Change<'_>) {}
}

impl Runtime for Bench {
    fn store(&self, entity: Entity) -> Option<Rc<ParameterStore>> {
        (entity == Self::OWNER).then(|| Rc::clone(&self.store))
    }

    fn kind_of(&self, _entity: Entity) -> Option<String> {
        None
    }

    fn listener(&self, component: ComponentId, _handler: Option<Handler>) -> Option<Rc<dyn Listener>> {
        Some(Rc::new(Deaf(component)))
    }

    fn spawn(&self, _kind: &str) -> Result<Option<Entity>, ComponentError> {
        Ok(None)
    }

    fn locate(&self, _kind: &str) -> Option<Entity> {
        None
    }

    fn destroy(&self, entity: Entity) {
        if entity == Self::OWNER {
            self.destroyed.set(true);
        }
    }

    fn attach(&self, _entity: Entity, _selector: &Selector) -> Result<bool, ComponentError> {
        Ok(false)
    }

    fn load_scene(&self, _scene: &str) {}

    fn quit(&self) {}
}
