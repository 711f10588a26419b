//! Timed destruction.

use tracing::debug;

use engine_component::{Component, ComponentError, Context, ParameterTable, Signature};

/// Counts `lifetime` down by the elapsed time each tick and destroys its
/// owner once it reaches zero. A negative `lifetime` never expires.
#[derive(Debug, Default)]
pub struct Lifetime;

impl Component for Lifetime {
    fn kind(&self) -> &str {
        "lifetime"
    }

    fn parameters(&self) -> ParameterTable {
        ParameterTable::new().with("lifetime", -1.0f32)
    }

    fn setup(&mut self, _ctx: &mut Context<'_>, _signature: &Signature) -> Result<(), ComponentError> {
        Ok(())
    }

    fn update(&mut self, ctx: &mut Context<'_>, dt: f32) -> Result<(), ComponentError> {
        let left = ctx.read::<f32>("lifetime")?;
        if left < 0.0 {
            return Ok(());
        }
        let left = (left - dt).max(0.0);
        ctx.write("lifetime", left)?;
        if left == 0.0 {
            debug!(entity = %ctx.owner(), "lifetime expired");
            ctx.destroy();
        }
        Ok(())
    }
}
