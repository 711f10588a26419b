//! Entity assembly.
//!
//! Builds an entity from its type's signature: attaches every listed
//! component in order, front-loads the dependencies they declare, runs
//! their setup, then applies the signature values to the cells they made.

use std::rc::Rc;

use tracing::{debug, trace, warn};

use engine_component::{Component, Context, Entity, Selector, Signature};

use crate::engine::Shared;
use crate::error::{EngineError, SceneError};
use crate::sigfile;
use crate::world::{EntityRecord, Slot};

impl Shared {
    /// Builds an entity of type `kind`, reading `<objpath><kind>.json` if the
    /// type is not defined yet.
    pub(crate) fn spawn_entity(&self, kind: &str) -> Result<Option<Entity>, EngineError> {
        self.ensure_signature(kind);
        self.build_entity(kind)
    }

    fn ensure_signature(&self, kind: &str) {
        let path = {
            let core = self.core.borrow();
            if core.world.has_signature(kind) {
                return;
            }
            core.world.signature_path(kind)
        };
        match sigfile::load(&path) {
            Ok(signature) => self.core.borrow_mut().world.define(kind, signature),
            Err(SceneError::Io { source, .. }) => {
                debug!(kind, path = %path.display(), error = %source, "no entity-type file");
            }
            Err(error) => warn!(kind, %error, "entity-type file rejected"),
        }
    }

    /// Builds an entity of a defined type. An unknown type yields `Ok(None)`.
    pub(crate) fn build_entity(&self, kind: &str) -> Result<Option<Entity>, EngineError> {
        let signature = self.core.borrow().world.signature(kind).cloned();
        let Some(signature) = signature else {
            warn!(kind, "unknown entity type");
            return Ok(None);
        };

        let entity = self.allocator.borrow_mut().allocate();
        self.core
            .borrow_mut()
            .world
            .insert(EntityRecord::new(entity, kind, signature.clone()));
        debug!(%entity, kind, "building entity");

        let mut resolving = Vec::new();
        if let Err(error) = self.attach_list(entity, &signature.attach(), &signature, &mut resolving) {
            warn!(%entity, kind, %error, "entity assembly aborted");
            self.destroy_entity(entity);
            return Err(error);
        }
        self.apply_signature(entity, &signature);
        self.core.borrow_mut().world.index(entity);
        debug!(%entity, kind, "entity built");
        Ok(Some(entity))
    }

    /// Builds and attaches one component to a live entity.
    pub(crate) fn attach_to(&self, entity: Entity, selector: &Selector) -> Result<bool, EngineError> {
        let signature = {
            let core = self.core.borrow();
            match core.world.get(entity) {
                Some(record) if !record.is_destroyed() => record.signature().clone(),
                _ => return Err(EngineError::NoSuchEntity(entity)),
            }
        };
        let Some(component) = self.obtain(selector) else {
            warn!(%entity, selector = %selector, "component unavailable");
            return Ok(false);
        };
        self.attach_checked(entity, component, &signature, &mut Vec::new())?;
        Ok(true)
    }

    /// Attaches every selector not already satisfied, in order. Unavailable
    /// components are skipped.
    fn attach_list(
        &self,
        entity: Entity,
        selectors: &[Selector],
        signature: &Signature,
        resolving: &mut Vec<String>,
    ) -> Result<(), EngineError> {
        for selector in selectors {
            if self.core.borrow().world.satisfies(entity, selector) {
                trace!(%entity, selector = %selector, "already satisfied");
                continue;
            }
            let Some(component) = self.obtain(selector) else {
                warn!(%entity, selector = %selector, "component unavailable, skipped");
                continue;
            };
            self.attach_checked(entity, component, signature, resolving)?;
        }
        Ok(())
    }

    /// Builds `selector` from the registry, loading its module on a miss.
    fn obtain(&self, selector: &Selector) -> Option<Box<dyn Component>> {
        let built = self.factory.borrow().build(selector);
        if built.is_some() {
            return built;
        }
        let loaded = self.factory.borrow_mut().load(selector, None);
        if let Err(error) = loaded {
            debug!(selector = %selector, %error, "component load failed");
            return None;
        }
        self.factory.borrow().build(selector)
    }

    /// Attaches `component` once its dependencies hold, building missing
    /// ones first. A family already being resolved up the chain is not
    /// entered again.
    fn attach_checked(
        &self,
        entity: Entity,
        component: Box<dyn Component>,
        signature: &Signature,
        resolving: &mut Vec<String>,
    ) -> Result<(), EngineError> {
        let selector = component.selector();
        let depends = component.depends();

        let unmet = self.core.borrow().world.unmet(entity, &depends);
        if let Some(missing) = unmet {
            if resolving.iter().any(|family| family == selector.family()) {
                return Err(EngineError::UnmetDependency {
                    component: selector,
                    missing,
                });
            }
            debug!(%entity, selector = %selector, missing = %missing, "resolving dependencies");
            resolving.push(selector.family().to_string());
            let resolved = self.attach_list(entity, &depends, signature, resolving);
            resolving.pop();
            resolved?;

            let unmet = self.core.borrow().world.unmet(entity, &depends);
            if let Some(missing) = unmet {
                return Err(EngineError::UnmetDependency {
                    component: selector,
                    missing,
                });
            }
        }
        self.attach_component(entity, component, signature)
    }

    /// Seeds defaults, replaces the same-family component, runs setup and
    /// hands the component to the scheduler.
    fn attach_component(
        &self,
        entity: Entity,
        component: Box<dyn Component>,
        signature: &Signature,
    ) -> Result<(), EngineError> {
        let id = self.next_component_id();
        let template = component.parameters();
        let slot = Rc::new(Slot::new(id, entity, component));

        let (store, replaced) = {
            let mut core = self.core.borrow_mut();
            let core = &mut *core;
            let Some(record) = core.world.get_mut(entity) else {
                return Err(EngineError::NoSuchEntity(entity));
            };
            let store = Rc::clone(record.store());
            let replaced = record.attach(Rc::clone(&slot));
            if let Some(old) = &replaced {
                core.slots.remove(&old.id());
                core.scheduler.remove(Rc::clone(old));
                debug!(%entity, old = %old.selector(), new = %slot.selector(), "component replaced");
            }
            core.slots.insert(id, Rc::clone(&slot));
            (store, replaced)
        };

        let seeded = store.seed(&template);
        trace!(%entity, component = %id, seeded, "defaults seeded");

        let setup = {
            let mut ctx = Context::new(self, entity, id, Rc::clone(&store));
            let mut component = slot.component().borrow_mut();
            component.setup(&mut ctx, signature)
        };
        if let Err(source) = setup {
            let mut core = self.core.borrow_mut();
            if let Some(record) = core.world.get_mut(entity)
                && record
                    .component(slot.family())
                    .is_some_and(|c| Rc::ptr_eq(c, &slot))
            {
                record.detach(slot.family());
            }
            core.slots.remove(&id);
            slot.release();
            return Err(EngineError::Setup {
                selector: slot.selector().clone(),
                source,
            });
        }

        self.core.borrow_mut().scheduler.register(Rc::clone(&slot));
        debug!(%entity, component = %id, selector = %slot.selector(), "component attached");
        drop(replaced);
        Ok(())
    }

    /// Overwrites every existing cell named by a signature key with the
    /// signature's value, parsed into the cell's type.
    fn apply_signature(&self, entity: Entity, signature: &Signature) {
        let store = self
            .core
            .borrow()
            .world
            .get(entity)
            .map(|r| Rc::clone(r.store()));
        let Some(store) = store else {
            return;
        };
        for (key, raw) in signature.iter() {
            let Some(cell) = store.get(key) else {
                continue;
            };
            match cell.write_raw(raw, None) {
                Ok(true) => {}
                Ok(false) => {
                    warn!(%entity, key, raw, expected = cell.tag().name(), "signature value does not parse");
                }
                Err(error) => warn!(%entity, key, %error, "signature value not applied"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, events};
    use crate::tick::TickOutcome;

    fn read(engine: &crate::Engine, entity: Entity, key: &str) -> f32 {
        engine.store(entity).unwrap().get(key).unwrap().read::<f32>().unwrap()
    }

    #[test]
    fn test_dependencies_are_attached_first() {
        let mut engine = testing::engine();
        engine.define("ship", Signature::new().with("attach", "physics"));
        let ship = engine.spawn("ship").unwrap().unwrap();

        assert_eq!(
            engine.components(ship),
            Selector::parse_list("spatial kinematics/kinematic2d physics/rigidbody2d")
        );
        assert_eq!(events(), vec!["setup spatial", "setup kinematics", "setup physics"]);
        assert_eq!(engine.locate("ship"), Some(ship));
    }

    #[test]
    fn test_unknown_entity_type_builds_nothing() {
        let mut engine = testing::engine();
        assert!(engine.spawn("ghost").unwrap().is_none());
        assert_eq!(engine.entity_count(), 0);
    }

    #[test]
    fn test_unavailable_component_is_skipped() {
        let mut engine = testing::engine();
        engine.define("ball", Signature::new().with("attach", "spatial render/sdl"));
        let ball = engine.spawn("ball").unwrap().unwrap();
        assert_eq!(engine.components(ball), vec![Selector::family_only("spatial")]);
    }

    #[test]
    fn test_dependency_cycle_is_cut() {
        let mut engine = testing::engine();
        engine.define("loop", Signature::new().with("attach", "ping"));
        let err = engine.spawn("loop").unwrap_err();
        match err {
            EngineError::UnmetDependency { component, missing } => {
                assert_eq!(component.family(), "ping");
                assert_eq!(missing.family(), "pong");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(events().is_empty());
        assert_eq!(engine.entity_count(), 0);
        assert_eq!(engine.locate("loop"), None);
    }

    #[test]
    fn test_failed_setup_releases_entity() {
        let mut engine = testing::engine();
        engine.define("radio", Signature::new().with("attach", "spatial broken"));
        let err = engine.spawn("radio").unwrap_err();
        assert!(matches!(err, EngineError::Setup { ref selector, .. } if selector.family() == "broken"));
        assert_eq!(engine.entity_count(), 0);

        // The spatial attached before the failure never runs.
        assert_eq!(engine.tick(0.1).unwrap(), TickOutcome::Stop);
        assert_eq!(engine.component_count(), 0);
        assert_eq!(events(), vec!["setup spatial"]);
    }

    #[test]
    fn test_signature_overwrites_component_cells() {
        let mut engine = testing::engine();
        engine.define(
            "ball",
            Signature::new()
                .with("attach", "spatial kinematics")
                .with("x", "5")
                .with("x.speed", "2")
                .with("y", "up")
                .with("hp", "3"),
        );
        let ball = engine.spawn("ball").unwrap().unwrap();

        assert_eq!(read(&engine, ball, "x"), 5.0);
        assert_eq!(read(&engine, ball, "x.speed"), 2.0);
        assert_eq!(read(&engine, ball, "y"), 0.0);
        assert!(!engine.store(ball).unwrap().contains("hp"));
        assert_eq!(engine.store(ball).unwrap().get("x").unwrap().last_writer(), None);
    }

    #[test]
    fn test_attach_same_family_replaces() {
        let mut engine = testing::engine();
        engine.define(
            "ball",
            Signature::new().with("attach", "spatial kinematics").with("x", "5"),
        );
        let ball = engine.spawn("ball").unwrap().unwrap();
        assert!(engine.attach(ball, &Selector::family_only("spatial")).unwrap());

        assert_eq!(
            engine.components(ball),
            Selector::parse_list("kinematics/kinematic2d spatial")
        );
        // Seeding never overwrites an existing cell.
        assert_eq!(read(&engine, ball, "x"), 5.0);

        engine.tick(0.0).unwrap();
        assert_eq!(engine.component_count(), 2);
    }

    #[test]
    fn test_attach_to_missing_entity_fails() {
        let mut engine = testing::engine();
        let err = engine.attach(Entity(42), &Selector::family_only("spatial")).unwrap_err();
        assert!(matches!(err, EngineError::NoSuchEntity(Entity(42))));
        engine.define("ball", Signature::new().with("attach", "spatial"));
        let ball = engine.spawn("ball").unwrap().unwrap();
        assert!(!engine.attach(ball, &Selector::family_only("render")).unwrap());
    }

    #[test]
    fn test_hook_from_setup_sees_signature_values() {
        let mut engine = testing::engine();
        engine.define("sensor", Signature::new().with("attach", "watcher").with("x", "5"));
        engine.spawn("sensor").unwrap().unwrap();
        assert_eq!(events(), vec!["setup spatial", "changed x = 5"]);
    }

    #[test]
    fn test_entity_file_is_read_from_objpath() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("ball.json"),
            r#"{"attach": ["spatial"], "x": 4}"#,
        )
        .unwrap();
        let mut engine = testing::engine();
        engine
            .load_scene_signature(
                Signature::new()
                    .with("compath", "")
                    .with("objpath", dir.path().display().to_string())
                    .with("objects", "ball"),
            )
            .unwrap();
        let ball = engine.locate("ball").unwrap();
        assert_eq!(read(&engine, ball, "x"), 4.0);
    }
}
