//! Shared helpers for the runtime's integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use engine_app::{Engine, EngineConfig};
use engine_component::{
    Change, Component, ComponentError, Context, Entity, ParamError, ParameterTable, Selector, Signature, handler,
};

/// An engine with the stock components and the local fixtures registered.
pub fn engine() -> Engine {
    Engine::new(
        EngineConfig::new()
            .with_tick_rate(1000.0)
            .with_builtins(engine_builtin::builtins())
            .with_builtins(fixtures()),
    )
}

fn boxed<C: Component + Default>() -> Box<dyn Component> {
    Box::new(C::default())
}

fn fixtures() -> Vec<(Selector, fn() -> Box<dyn Component>)> {
    vec![
        (Selector::family_only("alarm"), boxed::<Alarm> as fn() -> Box<dyn Component>),
        (Selector::family_only("counter"), boxed::<Counter>),
        (Selector::family_only("echo"), boxed::<Echo>),
        (Selector::family_only("portal"), boxed::<Portal>),
        (Selector::family_only("relay"), boxed::<Relay>),
        (Selector::family_only("rigger"), boxed::<Rigger>),
        (Selector::new("render", "canvas"), boxed::<Canvas>),
    ]
}

/// Writes `value` as `<dir>/<name>.json`.
pub fn write_json(dir: &Path, name: &str, value: &serde_json::Value) {
    fs::write(dir.join(format!("{name}.json")), value.to_string()).unwrap();
}

pub fn read_f32(engine: &Engine, entity: Entity, key: &str) -> f32 {
    engine
        .store(entity)
        .unwrap()
        .get(key)
        .unwrap()
        .read::<f32>()
        .unwrap()
}

/// Destroys its owner on its first update.
#[derive(Debug, Default)]
pub struct Alarm;

impl Component for Alarm {
    fn kind(&self) -> &str {
        "alarm"
    }

    fn setup(&mut self, _ctx: &mut Context<'_>, _signature: &Signature) -> Result<(), ComponentError> {
        Ok(())
    }

    fn update(&mut self, ctx: &mut Context<'_>, _dt: f32) -> Result<(), ComponentError> {
        ctx.destroy();
        Ok(())
    }
}

/// Increments `count` on every update.
#[derive(Debug, Default)]
pub struct Counter;

impl Component for Counter {
    fn kind(&self) -> &str {
        "counter"
    }

    fn parameters(&self) -> ParameterTable {
        ParameterTable::new().with("count", 0i32)
    }

    fn setup(&mut self, _ctx: &mut Context<'_>, _signature: &Signature) -> Result<(), ComponentError> {
        Ok(())
    }

    fn update(&mut self, ctx: &mut Context<'_>, _dt: f32) -> Result<(), ComponentError> {
        ctx.add("count", 1i32)?;
        Ok(())
    }
}

/// Hooks `x`, tries to write it back from the notification and mirrors
/// every change into `echo`.
#[derive(Debug, Default)]
pub struct Echo {
    pub heard: Vec<f32>,
    pub rejected: Vec<ParamError>,
}

impl Component for Echo {
    fn kind(&self) -> &str {
        "echo"
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
        let Ok(value) = ctx.read::<f32>(change.key) else {
            return;
        };
        self.heard.push(value);
        if let Err(error) = ctx.write(change.key, value + 1.0) {
            self.rejected.push(error);
        }
        if let Err(error) = ctx.write("echo", value) {
            self.rejected.push(error);
        }
    }
}

/// Switches to the scene named by `portal.to` on its first update.
#[derive(Debug, Default)]
pub struct Portal {
    target: String,
}

impl Component for Portal {
    fn kind(&self) -> &str {
        "portal"
    }

    fn setup(&mut self, _ctx: &mut Context<'_>, signature: &Signature) -> Result<(), ComponentError> {
        self.target = signature.get("portal.to").unwrap_or_default().to_string();
        Ok(())
    }

    fn update(&mut self, ctx: &mut Context<'_>, _dt: f32) -> Result<(), ComponentError> {
        ctx.load_scene(&self.target);
        Ok(())
    }
}

/// Needs a window that nothing provides.
#[derive(Debug, Default)]
pub struct Canvas;

impl Component for Canvas {
    fn kind(&self) -> &str {
        "canvas"
    }

    fn family(&self) -> &str {
        "render"
    }

    fn depends(&self) -> Vec<Selector> {
        Selector::parse_list("window/sdl")
    }

    fn setup(&mut self, _ctx: &mut Context<'_>, _signature: &Signature) -> Result<(), ComponentError> {
        Ok(())
    }

    fn update(&mut self, _ctx: &mut Context<'_>, _dt: f32) -> Result<(), ComponentError> {
        Ok(())
    }
}

/// Hooks `x` through its own method instead of `handle`.
#[derive(Debug, Default)]
pub struct Relay {
    pub via_handler: Vec<String>,
    pub via_handle: Vec<String>,
}

impl Relay {
    fn on_x(&mut self, ctx: &mut Context<'_>, change: &Change<'_>) {
        let value = ctx.read::<f32>(change.key).unwrap_or_default();
        self.via_handler.push(format!("{} = {value}", change.key));
    }
}

impl Component for Relay {
    fn kind(&self) -> &str {
        "relay"
    }

    fn depends(&self) -> Vec<Selector> {
        Selector::parse_list("spatial")
    }

    fn setup(&mut self, ctx: &mut Context<'_>, _signature: &Signature) -> Result<(), ComponentError> {
        ctx.hook_with("x", handler(Relay::on_x));
        ctx.hook("y");
        Ok(())
    }

    fn update(&mut self, _ctx: &mut Context<'_>, _dt: f32) -> Result<(), ComponentError> {
        Ok(())
    }

    fn handle(&mut self, _ctx: &mut Context<'_>, change: &Change<'_>) {
        self.via_handle.push(change.key.to_string());
    }
}

/// Attaches the selector named by `rig` on its first update and keeps the
/// outcome.
#[derive(Debug, Default)]
pub struct Rigger {
    target: String,
    pub outcome: Option<Result<bool, ComponentError>>,
}

impl Component for Rigger {
    fn kind(&self) -> &str {
        "rigger"
    }

    fn setup(&mut self, _ctx: &mut Context<'_>, signature: &Signature) -> Result<(), ComponentError> {
        self.target = signature.get("rig").unwrap_or_default().to_string();
        Ok(())
    }

    fn update(&mut self, ctx: &mut Context<'_>, _dt: f32) -> Result<(), ComponentError> {
        if self.outcome.is_none()
            && let Some(selector) = Selector::parse(&self.target)
        {
            self.outcome = Some(ctx.attach(&selector));
        }
        Ok(())
    }
}
