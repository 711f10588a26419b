//! 2D kinematics.
//!
//! Uses `x`, `y` from a spatial and provides `x.speed`, `y.speed`,
//! `x.accel`, `y.accel`. Each tick the acceleration is integrated into the
//! speed, then the speed into the position.

use engine_component::{Component, ComponentError, Context, Selector, Signature};

#[derive(Debug, Default)]
pub struct Kinematic2d;

impl Component for Kinematic2d {
    fn kind(&self) -> &str {
        "kinematic2d"
    }

    fn family(&self) -> &str {
        "kinematics"
    }

    fn depends(&self) -> Vec<Selector> {
        vec![Selector::family_only("spatial")]
    }

    fn setup(&mut self, ctx: &mut Context<'_>, signature: &Signature) -> Result<(), ComponentError> {
        for key in ["x.speed", "y.speed", "x.accel", "y.accel"] {
            ctx.init(key, signature.get(key), 0.0f32)?;
        }
        Ok(())
    }

    fn update(&mut self, ctx: &mut Context<'_>, dt: f32) -> Result<(), ComponentError> {
        for axis in ["x", "y"] {
            let accel = ctx.read::<f32>(&format!("{axis}.accel"))?;
            let speed_key = format!("{axis}.speed");
            ctx.add(&speed_key, accel * dt)?;
            let speed = ctx.read::<f32>(&speed_key)?;
            ctx.add(axis, speed * dt)?;
        }
        Ok(())
    }
}
