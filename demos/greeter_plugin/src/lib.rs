//! Greeter module.
//!
//! Built as `libhelloperson.so` (or the platform equivalent). Put it in a
//! `greeter/` directory under one of the scene's `compath` entries and any
//! entity attaching `greeter/helloperson` loads it on demand:
//!
//! ```json
//! { "attach": "greeter/helloperson", "person": "Ada" }
//! ```

use tracing::info;

use engine_component::{Component, ComponentError, Context, Signature};

/// Greets `person` every tick and counts the greetings in `greetedtimes`.
#[derive(Debug, Default)]
pub struct HelloPerson;

impl Component for HelloPerson {
    fn kind(&self) -> &str {
        "helloperson"
    }

    fn family(&self) -> &str {
        "greeter"
    }

    fn setup(&mut self, ctx: &mut Context<'_>, signature: &Signature) -> Result<(), ComponentError> {
        ctx.init("person", signature.get("person"), "Anonymous".to_string())?;
        ctx.write("greetedtimes", 0i32)?;
        Ok(())
    }

    fn update(&mut self, ctx: &mut Context<'_>, _dt: f32) -> Result<(), ComponentError> {
        ctx.add("greetedtimes", 1i32)?;
        let person = ctx.read::<String>("person")?;
        let times = ctx.read::<i32>("greetedtimes")?;
        info!(entity = %ctx.owner(), "Hello, {person}! I have greeted you {times} times already!");
        Ok(())
    }
}

engine_component::export_component!(build_helloperson = HelloPerson::default);
