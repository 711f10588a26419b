//! Entity state: records, attached components, and entity-type signatures.
//!
//! The [`World`] owns every live entity and the signatures they are built
//! from. It is mutated only between component calls; the scheduler and the
//! assembler never hold it borrowed while a component runs.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::rc::Rc;

use engine_component::signature::NAME_KEY;
use engine_component::{Component, ComponentId, Entity, ParameterStore, Selector, Signature};

/// One attached component instance.
///
/// Shared between the owner's record, the scheduler's family buckets and,
/// weakly, the listeners it hooked.
pub struct Slot {
    id: ComponentId,
    owner: Entity,
    selector: Selector,
    component: RefCell<Box<dyn Component>>,
    released: Cell<bool>,
}

impl Slot {
    #[must_use]
    pub fn new(id: ComponentId, owner: Entity, component: Box<dyn Component>) -> Self {
        Self {
            id,
            owner,
            selector: component.selector(),
            component: RefCell::new(component),
            released: Cell::new(false),
        }
    }

    #[must_use]
    pub fn id(&self) -> ComponentId {
        self.id
    }

    #[must_use]
    pub fn owner(&self) -> Entity {
        self.owner
    }

    /// `family/type` captured at attach.
    #[must_use]
    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    #[must_use]
    pub fn family(&self) -> &str {
        self.selector.family()
    }

    pub(crate) fn component(&self) -> &RefCell<Box<dyn Component>> {
        &self.component
    }

    /// Marks the component detached. It is never updated or notified again.
    pub fn release(&self) {
        self.released.set(true);
    }

    #[must_use]
    pub fn is_released(&self) -> bool {
        self.released.get()
    }
}

impl std::fmt::Debug for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Slot")
            .field("id", &self.id)
            .field("owner", &self.owner)
            .field("selector", &self.selector.to_string())
            .field("released", &self.released.get())
            .finish()
    }
}

/// One assembled entity.
#[derive(Debug)]
pub struct EntityRecord {
    id: Entity,
    name: String,
    signature: Signature,
    store: Rc<ParameterStore>,
    /// Attached components in attach order, at most one per family.
    components: Vec<Rc<Slot>>,
    destroyed: bool,
}

impl EntityRecord {
    #[must_use]
    pub fn new(id: Entity, name: impl Into<String>, signature: Signature) -> Self {
        Self {
            id,
            name: name.into(),
            signature,
            store: Rc::new(ParameterStore::new(id)),
            components: Vec::new(),
            destroyed: false,
        }
    }

    #[must_use]
    pub fn id(&self) -> Entity {
        self.id
    }

    /// The entity type this entity was built from.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    #[must_use]
    pub fn store(&self) -> &Rc<ParameterStore> {
        &self.store
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Attaches `slot`, returning the same-family component it replaces.
    pub fn attach(&mut self, slot: Rc<Slot>) -> Option<Rc<Slot>> {
        let replaced = self.detach(slot.family());
        self.components.push(slot);
        replaced
    }

    /// Detaches the component of `family`.
    pub fn detach(&mut self, family: &str) -> Option<Rc<Slot>> {
        let index = self.components.iter().position(|c| c.family() == family)?;
        Some(self.components.remove(index))
    }

    /// The attached component of `family`.
    #[must_use]
    pub fn component(&self, family: &str) -> Option<&Rc<Slot>> {
        self.components.iter().find(|c| c.family() == family)
    }

    /// Attached components in attach order.
    #[must_use]
    pub fn components(&self) -> &[Rc<Slot>] {
        &self.components
    }

    /// Returns `true` if an attached component satisfies `selector`.
    #[must_use]
    pub fn satisfies(&self, selector: &Selector) -> bool {
        self.component(selector.family())
            .is_some_and(|slot| selector.matches(slot.family(), slot.selector().kind()))
    }

    fn take_components(&mut self) -> Vec<Rc<Slot>> {
        std::mem::take(&mut self.components)
    }
}

/// Live entities plus the signatures they are built from.
#[derive(Debug, Default)]
pub struct World {
    entities: BTreeMap<Entity, EntityRecord>,
    signatures: HashMap<String, Signature>,
    /// Live entities by type, in build order.
    located: HashMap<String, Vec<Entity>>,
    /// Scene-wide defaults merged into every entity-type signature.
    common: Signature,
    /// Directory prefix for entity-type files, with a trailing `/`.
    objpath: String,
}

impl World {
    /// Create a new empty world.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the scene-wide defaults used by later [`World::define`] calls.
    pub fn set_common(&mut self, common: Signature) {
        self.common = common;
    }

    #[must_use]
    pub fn common(&self) -> &Signature {
        &self.common
    }

    /// Sets the entity-type directory. A trailing `/` is added when missing.
    pub fn set_objpath(&mut self, objpath: &str) {
        let mut objpath = objpath.trim().to_string();
        if !objpath.is_empty() && !objpath.ends_with('/') {
            objpath.push('/');
        }
        self.objpath = objpath;
    }

    #[must_use]
    pub fn objpath(&self) -> &str {
        &self.objpath
    }

    /// File an entity type is read from: `<objpath><kind>.json`.
    #[must_use]
    pub fn signature_path(&self, kind: &str) -> PathBuf {
        PathBuf::from(format!("{}{kind}.json", self.objpath))
    }

    /// Registers the signature of an entity type. The type name is stored
    /// under `name` and the scene defaults fill keys the type leaves unset.
    pub fn define(&mut self, kind: &str, mut signature: Signature) {
        signature.insert(NAME_KEY, kind);
        signature.merge_defaults(&self.common);
        self.signatures.insert(kind.to_string(), signature);
    }

    #[must_use]
    pub fn signature(&self, kind: &str) -> Option<&Signature> {
        self.signatures.get(kind)
    }

    #[must_use]
    pub fn has_signature(&self, kind: &str) -> bool {
        self.signatures.contains_key(kind)
    }

    pub fn insert(&mut self, record: EntityRecord) {
        self.entities.insert(record.id, record);
    }

    #[must_use]
    pub fn get(&self, entity: Entity) -> Option<&EntityRecord> {
        self.entities.get(&entity)
    }

    #[must_use]
    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut EntityRecord> {
        self.entities.get_mut(&entity)
    }

    /// Returns `true` unless the entity exists and is not marked destroyed.
    #[must_use]
    pub fn is_destroyed(&self, entity: Entity) -> bool {
        self.entities.get(&entity).is_none_or(|r| r.destroyed)
    }

    /// Marks `entity` destroyed and hides it from [`World::locate`].
    /// Returns `false` if it was already destroyed or does not exist.
    pub fn mark_destroyed(&mut self, entity: Entity) -> bool {
        let Some(record) = self.entities.get_mut(&entity) else {
            return false;
        };
        if record.destroyed {
            return false;
        }
        record.destroyed = true;
        let name = record.name.clone();
        self.unindex(&name, entity);
        true
    }

    /// Removes the entity, returning its record and its detached components.
    pub fn remove(&mut self, entity: Entity) -> Option<(EntityRecord, Vec<Rc<Slot>>)> {
        let mut record = self.entities.remove(&entity)?;
        self.unindex(&record.name.clone(), entity);
        let components = record.take_components();
        Some((record, components))
    }

    /// Makes a built entity findable by its type.
    pub fn index(&mut self, entity: Entity) {
        let Some(record) = self.entities.get(&entity) else {
            return;
        };
        if record.destroyed {
            return;
        }
        let located = self.located.entry(record.name.clone()).or_default();
        if !located.contains(&entity) {
            located.push(entity);
        }
    }

    fn unindex(&mut self, name: &str, entity: Entity) {
        if let Some(located) = self.located.get_mut(name) {
            located.retain(|&e| e != entity);
            if located.is_empty() {
                self.located.remove(name);
            }
        }
    }

    /// The first live entity of type `kind`.
    #[must_use]
    pub fn locate(&self, kind: &str) -> Option<Entity> {
        self.located.get(kind).and_then(|l| l.first().copied())
    }

    /// Returns `true` if a component attached to `entity` satisfies
    /// `selector`.
    #[must_use]
    pub fn satisfies(&self, entity: Entity, selector: &Selector) -> bool {
        self.entities
            .get(&entity)
            .is_some_and(|r| r.satisfies(selector))
    }

    /// The first declared dependency `entity` does not satisfy.
    #[must_use]
    pub fn unmet(&self, entity: Entity, depends: &[Selector]) -> Option<Selector> {
        depends
            .iter()
            .find(|dep| !self.satisfies(entity, dep))
            .cloned()
    }

    /// Returns the number of entities, destroyed-but-unfinalized included.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Ids of every entity, in creation order.
    #[must_use]
    pub fn entities(&self) -> Vec<Entity> {
        self.entities.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use engine_component::{ComponentError, Context};

    use super::*;

    struct Named(&'static str, &'static str);

    impl Component for Named {
        fn kind(&self) -> &str {
            self.1
        }

        fn family(&self) -> &str {
            self.0
        }

        fn setup(&mut self, _ctx: &mut Context<'_>, _signature: &Signature) -> Result<(), ComponentError> {
            Ok(())
        }

        fn update(&mut self, _ctx: &mut Context<'_>, _dt: f32) -> Result<(), ComponentError> {
            Ok(())
        }
    }

    fn slot(id: u64, owner: Entity, family: &'static str, kind: &'static str) -> Rc<Slot> {
        Rc::new(Slot::new(ComponentId(id), owner, Box::new(Named(family, kind))))
    }

    #[test]
    fn test_define_merges_common_and_name() {
        let mut world = World::new();
        world.set_common(Signature::new().with("gravity", "9.8").with("x", "1"));
        world.define("ball", Signature::new().with("x", "5"));

        let sig = world.signature("ball").unwrap();
        assert_eq!(sig.get("name"), Some("ball"));
        assert_eq!(sig.get("x"), Some("5"));
        assert_eq!(sig.get("gravity"), Some("9.8"));
    }

    #[test]
    fn test_objpath_gets_trailing_slash() {
        let mut world = World::new();
        world.set_objpath("objects");
        assert_eq!(world.signature_path("ball"), PathBuf::from("objects/ball.json"));
        world.set_objpath("");
        assert_eq!(world.signature_path("ball"), PathBuf::from("ball.json"));
    }

    #[test]
    fn test_attach_replaces_same_family() {
        let e = Entity(1);
        let mut record = EntityRecord::new(e, "ball", Signature::new());
        assert!(record.attach(slot(1, e, "spatial", "space2d")).is_none());
        assert!(record.attach(slot(2, e, "kinematics", "kinematic2d")).is_none());
        let old = record.attach(slot(3, e, "spatial", "space3d")).unwrap();

        assert_eq!(old.id(), ComponentId(1));
        let families: Vec<&str> = record.components().iter().map(|c| c.family()).collect();
        assert_eq!(families, vec!["kinematics", "spatial"]);
        assert!(record.satisfies(&Selector::family_only("spatial")));
        assert!(record.satisfies(&Selector::new("spatial", "space3d")));
        assert!(!record.satisfies(&Selector::new("spatial", "space2d")));
    }

    #[test]
    fn test_locate_tracks_live_entities() {
        let mut world = World::new();
        for id in [1, 2] {
            world.insert(EntityRecord::new(Entity(id), "ball", Signature::new()));
            world.index(Entity(id));
        }
        assert_eq!(world.locate("ball"), Some(Entity(1)));

        assert!(world.mark_destroyed(Entity(1)));
        assert!(!world.mark_destroyed(Entity(1)));
        assert!(world.is_destroyed(Entity(1)));
        assert_eq!(world.locate("ball"), Some(Entity(2)));

        world.remove(Entity(2)).unwrap();
        assert_eq!(world.locate("ball"), None);
        assert!(world.is_destroyed(Entity(2)));
    }

    #[test]
    fn test_remove_hands_back_components() {
        let e = Entity(4);
        let mut world = World::new();
        let mut record = EntityRecord::new(e, "ship", Signature::new());
        record.attach(slot(1, e, "spatial", "spatial"));
        world.insert(record);

        let (record, components) = world.remove(e).unwrap();
        assert!(record.components().is_empty());
        assert_eq!(components.len(), 1);
        assert_eq!(world.entity_count(), 0);
    }

    #[test]
    fn test_unmet_reports_first_missing() {
        let e = Entity(1);
        let mut world = World::new();
        let mut record = EntityRecord::new(e, "ball", Signature::new());
        record.attach(slot(1, e, "spatial", "spatial"));
        world.insert(record);

        let deps = Selector::parse_list("spatial kinematics physics");
        assert_eq!(world.unmet(e, &deps), Some(Selector::family_only("kinematics")));
        assert_eq!(world.unmet(e, &deps[..1]), None);
    }
}
