//! # engine_app
//!
//! The runtime that hosts components: it resolves `family/type` selectors
//! to builders (loading component modules on demand), assembles entities
//! from their signatures, and runs every attached component from a
//! single-threaded tick loop.
//!
//! ## Lifecycle
//!
//! 1. [`Engine::new`] registers the built-in components.
//! 2. [`Engine::load_scene`] reads the scene signature, sets the module
//!    search path, preloads modules and builds the scene's objects.
//! 3. [`Engine::run`] ticks until a component quits, the last component is
//!    gone, or the tick limit is hit. Scene switches requested by
//!    components happen between ticks.

mod assembly;
pub mod config;
pub mod engine;
pub mod error;
pub mod factory;
pub mod loader;
pub mod registry;
pub mod scene;
pub mod scheduler;
pub mod sigfile;
pub mod tick;
pub mod world;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{EngineConfig, EventPump, IdlePump, PumpStatus, TickConfig};
pub use engine::Engine;
pub use error::{EngineError, SceneError};
pub use factory::ComponentFactory;
pub use registry::{Builder, Registry};
pub use scene::SceneConfig;
pub use tick::TickOutcome;
