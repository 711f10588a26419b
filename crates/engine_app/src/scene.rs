//! Scenes: the top-level signature a run starts from.
//!
//! A scene signature reserves four keys. `compath` is the comma-separated
//! module search path, `compreload` lists selectors loaded eagerly,
//! `objects` lists the entity types built at scene start and `objpath` is
//! the directory entity-type files are read from. Every other key is a
//! global default merged into each entity-type signature.

use std::path::{Path, PathBuf};

use tracing::{error, info};

use engine_component::{Entity, Selector, Signature};

use crate::engine::Engine;
use crate::error::EngineError;
use crate::sigfile;

pub const COMPATH_KEY: &str = "compath";
pub const COMPRELOAD_KEY: &str = "compreload";
pub const OBJECTS_KEY: &str = "objects";
pub const OBJPATH_KEY: &str = "objpath";

/// A scene signature split into its reserved keys and the globals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneConfig {
    pub compath: Option<String>,
    pub compreload: Vec<Selector>,
    /// Entity types to build, in order.
    pub objects: Vec<String>,
    pub objpath: String,
    pub globals: Signature,
}

impl SceneConfig {
    #[must_use]
    pub fn from_signature(mut signature: Signature) -> Self {
        let compath = signature.remove(COMPATH_KEY);
        let compreload = signature
            .remove(COMPRELOAD_KEY)
            .map(|list| Selector::parse_list(&list))
            .unwrap_or_default();
        let objects = signature
            .remove(OBJECTS_KEY)
            .map(|list| list.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        let objpath = signature.remove(OBJPATH_KEY).unwrap_or_default();
        Self {
            compath,
            compreload,
            objects,
            objpath,
            globals: signature,
        }
    }
}

/// The file a scene name refers to: `.json` is appended when the name has
/// no extension.
#[must_use]
pub fn scene_file(scene: &str) -> PathBuf {
    let path = Path::new(scene);
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        PathBuf::from(format!("{scene}.json"))
    }
}

impl Engine {
    /// Tears down the current scene and loads `scene` from its file.
    /// Returns the entities built from the scene's object list.
    ///
    /// # Errors
    ///
    /// An unreadable scene file, or a `compreload` component that fails to
    /// load. Objects that fail to build are logged and skipped.
    pub fn load_scene(&mut self, scene: &str) -> Result<Vec<Entity>, EngineError> {
        let path = scene_file(scene);
        let signature = sigfile::load(&path)?;
        info!(path = %path.display(), "loading scene");
        self.load_scene_signature(signature)
    }

    /// Tears down the current scene and loads one from a signature.
    ///
    /// # Errors
    ///
    /// As [`Engine::load_scene`], minus the file.
    pub fn load_scene_signature(&mut self, signature: Signature) -> Result<Vec<Entity>, EngineError> {
        self.teardown();
        let scene = SceneConfig::from_signature(signature);

        {
            let mut factory = self.shared.factory.borrow_mut();
            match self.compath.as_deref().or(scene.compath.as_deref()) {
                Some(compath) => factory.set_search_path(compath),
                None => {
                    error!("scene sets no compath, only registered components are available");
                    factory.set_search_path("");
                }
            }
            for selector in &scene.compreload {
                factory.load(selector, None)?;
            }
        }
        {
            let mut core = self.shared.core.borrow_mut();
            core.world.set_objpath(&scene.objpath);
            core.world.set_common(scene.globals);
        }

        let mut built = Vec::new();
        for object in &scene.objects {
            match self.shared.spawn_entity(object) {
                Ok(Some(entity)) => built.push(entity),
                Ok(None) => {}
                Err(error) => error!(object = %object, %error, "scene object failed to build"),
            }
        }
        info!(objects = scene.objects.len(), built = built.len(), "scene loaded");
        Ok(built)
    }

    /// Drops every entity and component of the current scene. Registered
    /// components and loaded modules stay.
    fn teardown(&mut self) {
        let old = std::mem::take(&mut *self.shared.core.borrow_mut());
        for slot in old.slots.values() {
            slot.release();
        }
        drop(old);
    }
}
