//! Circular motion.

use std::cell::RefCell;
use std::rc::Rc;

use engine_component::{Component, ComponentError, Context, ParameterTable, Selector, Signature};

/// Moves `x`/`y` along a circle of `spin.radius` at `spin.speed` radians
/// per second. The current angle is exposed as `spin.angle`, backed by the
/// component's own memory.
#[derive(Debug, Default)]
pub struct Spin {
    angle: Rc<RefCell<f32>>,
}

impl Spin {
    /// The current angle in radians.
    #[must_use]
    pub fn angle(&self) -> f32 {
        *self.angle.borrow()
    }
}

impl Component for Spin {
    fn kind(&self) -> &str {
        "spin"
    }

    fn depends(&self) -> Vec<Selector> {
        vec![Selector::family_only("spatial")]
    }

    fn parameters(&self) -> ParameterTable {
        ParameterTable::new()
            .with("spin.speed", 0.0f32)
            .with("spin.radius", 0.0f32)
    }

    fn setup(&mut self, ctx: &mut Context<'_>, signature: &Signature) -> Result<(), ComponentError> {
        // A spin replacing another one carries on from its angle.
        let current = ctx
            .param("spin.angle")
            .and_then(|cell| cell.read::<f32>().ok())
            .unwrap_or_default();
        *self.angle.borrow_mut() = signature.eval("spin.angle", current);
        ctx.rebind("spin.angle", Rc::clone(&self.angle))?;
        Ok(())
    }

    fn update(&mut self, ctx: &mut Context<'_>, dt: f32) -> Result<(), ComponentError> {
        let speed = ctx.read::<f32>("spin.speed")?;
        let radius = ctx.read::<f32>("spin.radius")?;
        ctx.add("spin.angle", speed * dt)?;
        let angle = self.angle();
        ctx.add("x", angle.cos() * radius)?;
        ctx.add("y", angle.sin() * radius)?;
        Ok(())
    }
}
