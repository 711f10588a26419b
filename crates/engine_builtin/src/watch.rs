//! Logs parameter changes.

use tracing::info;

use engine_component::{Change, Component, ComponentError, Context, Signature};

/// Hooks every key listed in `watch` (whitespace separated) and logs each
/// change with its writer. Keys that do not exist at setup are reported and
/// ignored.
#[derive(Debug, Default)]
pub struct Watch {
    keys: Vec<String>,
    seen: u64,
}

impl Watch {
    /// Keys hooked at setup.
    #[must_use]
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Number of changes observed.
    #[must_use]
    pub fn seen(&self) -> u64 {
        self.seen
    }
}

impl Component for Watch {
    fn kind(&self) -> &str {
        "watch"
    }

    fn setup(&mut self, ctx: &mut Context<'_>, signature: &Signature) -> Result<(), ComponentError> {
        let wanted = signature.get("watch").unwrap_or_default();
        for key in wanted.split_whitespace() {
            if ctx.hook(key) {
                self.keys.push(key.to_string());
            } else {
                info!(entity = %ctx.owner(), key, "nothing to watch");
            }
        }
        Ok(())
    }

    fn update(&mut self, _ctx: &mut Context<'_>, _dt: f32) -> Result<(), ComponentError> {
        Ok(())
    }

    fn handle(&mut self, ctx: &mut Context<'_>, change: &Change<'_>) {
        self.seen += 1;
        let writer = change
            .writer
            .map_or_else(|| "signature".to_string(), |w| w.to_string());
        info!(entity = %change.owner, key = change.key, %writer, watcher = %ctx.id(), "parameter changed");
    }
}
