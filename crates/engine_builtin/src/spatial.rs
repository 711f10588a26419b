//! Position and size.

use engine_component::{Component, ComponentError, Context, ParameterTable, Signature};

/// Owns `x`, `y`, `z` (position) and `w`, `h`, `d` (size), all `f32`.
///
/// Has no behavior of its own; other components read and write its cells.
#[derive(Debug, Default)]
pub struct Spatial;

impl Component for Spatial {
    fn kind(&self) -> &str {
        "spatial"
    }

    fn parameters(&self) -> ParameterTable {
        ["x", "y", "z", "w", "h", "d"]
            .into_iter()
            .fold(ParameterTable::new(), |table, key| table.with(key, 0.0f32))
    }

    fn setup(&mut self, _ctx: &mut Context<'_>, _signature: &Signature) -> Result<(), ComponentError> {
        Ok(())
    }

    fn update(&mut self, _ctx: &mut Context<'_>, _dt: f32) -> Result<(), ComponentError> {
        Ok(())
    }
}
