//! Recording components for the runtime's unit tests.
//!
//! Builders are plain `fn` pointers, so components report what happened to
//! them through a per-thread event log.

use std::cell::RefCell;

use engine_component::{
    Change, Component, ComponentError, Context, ParameterTable, Selector, Signature,
};

use crate::config::EngineConfig;
use crate::engine::Engine;

thread_local! {
    static EVENTS: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

pub(crate) fn record(event: impl Into<String>) {
    EVENTS.with(|events| events.borrow_mut().push(event.into()));
}

/// Drains the events recorded on this thread.
pub(crate) fn events() -> Vec<String> {
    EVENTS.with(|events| std::mem::take(&mut *events.borrow_mut()))
}

/// Position holder.
#[derive(Default)]
pub(crate) struct Spatial;

impl Component for Spatial {
    fn kind(&self) -> &str {
        "spatial"
    }

    fn parameters(&self) -> ParameterTable {
        ParameterTable::new().with("x", 0.0f32).with("y", 0.0f32)
    }

    fn setup(&mut self, _ctx: &mut Context<'_>, _signature: &Signature) -> Result<(), ComponentError> {
        record("setup spatial");
        Ok(())
    }

    fn update(&mut self, ctx: &mut Context<'_>, _dt: f32) -> Result<(), ComponentError> {
        record(format!("update spatial {}", ctx.owner()));
        Ok(())
    }
}

/// Integrates `x.speed` into `x`.
#[derive(Default)]
pub(crate) struct Kinematic;

impl Component for Kinematic {
    fn kind(&self) -> &str {
        "kinematic2d"
    }

    fn family(&self) -> &str {
        "kinematics"
    }

    fn depends(&self) -> Vec<Selector> {
        Selector::parse_list("spatial")
    }

    fn parameters(&self) -> ParameterTable {
        ParameterTable::new().with("x.speed", 0.0f32)
    }

    fn setup(&mut self, _ctx: &mut Context<'_>, _signature: &Signature) -> Result<(), ComponentError> {
        record("setup kinematics");
        Ok(())
    }

    fn update(&mut self, ctx: &mut Context<'_>, dt: f32) -> Result<(), ComponentError> {
        let speed = ctx.read::<f32>("x.speed")?;
        ctx.add("x", speed * dt)?;
        record(format!("update kinematics {}", ctx.owner()));
        Ok(())
    }
}

/// Depends on a typed kinematics, so building it pulls in two levels.
#[derive(Default)]
pub(crate) struct Rigid;

impl Component for Rigid {
    fn kind(&self) -> &str {
        "rigidbody2d"
    }

    fn family(&self) -> &str {
        "physics"
    }

    fn depends(&self) -> Vec<Selector> {
        Selector::parse_list("kinematics/kinematic2d")
    }

    fn setup(&mut self, _ctx: &mut Context<'_>, _signature: &Signature) -> Result<(), ComponentError> {
        record("setup physics");
        Ok(())
    }

    fn update(&mut self, _ctx: &mut Context<'_>, _dt: f32) -> Result<(), ComponentError> {
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct Ping;

impl Component for Ping {
    fn kind(&self) -> &str {
        "ping"
    }

    fn depends(&self) -> Vec<Selector> {
        Selector::parse_list("pong")
    }

    fn setup(&mut self, _ctx: &mut Context<'_>, _signature: &Signature) -> Result<(), ComponentError> {
        record("setup ping");
        Ok(())
    }

    fn update(&mut self, _ctx: &mut Context<'_>, _dt: f32) -> Result<(), ComponentError> {
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct Pong;

impl Component for Pong {
    fn kind(&self) -> &str {
        "pong"
    }

    fn depends(&self) -> Vec<Selector> {
        Selector::parse_list("ping")
    }

    fn setup(&mut self, _ctx: &mut Context<'_>, _signature: &Signature) -> Result<(), ComponentError> {
        record("setup pong");
        Ok(())
    }

    fn update(&mut self, _ctx: &mut Context<'_>, _dt: f32) -> Result<(), ComponentError> {
        Ok(())
    }
}

/// Fails its setup.
#[derive(Default)]
pub(crate) struct Broken;

impl Component for Broken {
    fn kind(&self) -> &str {
        "broken"
    }

    fn setup(&mut self, _ctx: &mut Context<'_>, _signature: &Signature) -> Result<(), ComponentError> {
        Err(ComponentError::Failed("no device".to_string()))
    }

    fn update(&mut self, _ctx: &mut Context<'_>, _dt: f32) -> Result<(), ComponentError> {
        Ok(())
    }
}

/// Destroys its owner on its first update.
#[derive(Default)]
pub(crate) struct Fuse;

impl Component for Fuse {
    fn kind(&self) -> &str {
        "fuse"
    }

    fn setup(&mut self, _ctx: &mut Context<'_>, _signature: &Signature) -> Result<(), ComponentError> {
        Ok(())
    }

    fn update(&mut self, ctx: &mut Context<'_>, _dt: f32) -> Result<(), ComponentError> {
        record(format!("update fuse {}", ctx.owner()));
        ctx.destroy();
        Ok(())
    }
}

/// Fails every update.
#[derive(Default)]
pub(crate) struct Faulty;

impl Component for Faulty {
    fn kind(&self) -> &str {
        "faulty"
    }

    fn setup(&mut self, _ctx: &mut Context<'_>, _signature: &Signature) -> Result<(), ComponentError> {
        Ok(())
    }

    fn update(&mut self, _ctx: &mut Context<'_>, _dt: f32) -> Result<(), ComponentError> {
        record("update faulty");
        Err(ComponentError::Failed("always".to_string()))
    }
}

/// Hooks `x` in setup and records each change.
#[derive(Default)]
pub(crate) struct Watcher;

impl Component for Watcher {
    fn kind(&self) -> &str {
        "watcher"
    }

    fn depends(&self) -> Vec<Selector> {
        Selector::parse_list("spatial")
    }

    fn setup(&mut self, ctx: &mut Context<'_>, _signature: &Signature) -> Result<(), ComponentError> {
        ctx.hook("x");
        Ok(())
    }

    fn update(&mut self, _ctx: &mut Context<'_>, _dt: f32) -> Result<(), ComponentError> {
        Ok(())
    }

    fn handle(&mut self, ctx: &mut Context<'_>, change: &Change<'_>) {
        let value = ctx.read::<f32>(change.key).unwrap_or_default();
        record(format!("changed {} = {value}", change.key));
    }
}

/// Quits on its first update.
#[derive(Default)]
pub(crate) struct Quitter;

impl Component for Quitter {
    fn kind(&self) -> &str {
        "quitter"
    }

    fn setup(&mut self, _ctx: &mut Context<'_>, _signature: &Signature) -> Result<(), ComponentError> {
        Ok(())
    }

    fn update(&mut self, ctx: &mut Context<'_>, _dt: f32) -> Result<(), ComponentError> {
        ctx.quit();
        Ok(())
    }
}

fn boxed<C: Component + Default>() -> Box<dyn Component> {
    Box::new(C::default())
}

/// An engine with every fixture registered.
pub(crate) fn engine() -> Engine {
    let fixtures: [(&str, fn() -> Box<dyn Component>); 10] = [
        ("spatial", boxed::<Spatial>),
        ("kinematics/kinematic2d", boxed::<Kinematic>),
        ("physics/rigidbody2d", boxed::<Rigid>),
        ("ping", boxed::<Ping>),
        ("pong", boxed::<Pong>),
        ("broken", boxed::<Broken>),
        ("fuse", boxed::<Fuse>),
        ("faulty", boxed::<Faulty>),
        ("watcher", boxed::<Watcher>),
        ("quitter", boxed::<Quitter>),
    ];
    let mut config = EngineConfig::new().with_tick_rate(1000.0);
    for (selector, build) in fixtures {
        if let Some(selector) = Selector::parse(selector) {
            config = config.with_builtin(selector, build);
        }
    }
    let engine = Engine::new(config);
    events();
    engine
}
