//! The tick loop.
//!
//! Each tick:
//!
//! 1. Poll the event pump.
//! 2. Finalize entity destructions requested since the last tick.
//! 3. Erase removed components from the scheduler.
//! 4. Admit components registered since the last tick.
//! 5. Update every live component, family by family.
//! 6. Stop on a quit request, switch scenes on a scene request, and stop
//!    once no component is left.

use std::time::{Duration, Instant};

use tracing::{debug, info, trace, warn};

use engine_component::{Context, Runtime};

use crate::config::PumpStatus;
use crate::engine::Engine;
use crate::error::EngineError;

/// What the scheduler does after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    Stop,
}

impl Engine {
    /// Runs one tick with elapsed time `dt` in seconds.
    ///
    /// # Errors
    ///
    /// Only a scene switch requested during the tick can fail; update errors
    /// are logged and never stop the loop.
    pub fn tick(&mut self, dt: f32) -> Result<TickOutcome, EngineError> {
        self.tick_id += 1;
        let tick_id = self.tick_id;

        if self.pump.poll() == PumpStatus::Quit {
            info!(tick_id, "event pump requested quit");
            self.shared.quit();
        }

        let (finalized, removed, admitted) = {
            let mut core = self.shared.core.borrow_mut();
            let finalized = core.finalize_destroyed();
            let removed = core.scheduler.flush_removed();
            let admitted = core.scheduler.admit();
            (finalized, removed, admitted)
        };
        debug!(
            tick_id,
            dt,
            finalized = finalized.len(),
            removed = removed.len(),
            admitted,
            "tick start"
        );
        drop(finalized);
        drop(removed);

        let snapshot = self.shared.core.borrow().scheduler.snapshot();
        for slot in &snapshot {
            if slot.is_released() {
                continue;
            }
            // A destroyed owner has no store.
            let Some(store) = self.shared.store(slot.owner()) else {
                continue;
            };
            let Ok(mut component) = slot.component().try_borrow_mut() else {
                trace!(tick_id, component = %slot.id(), "component busy, update skipped");
                continue;
            };
            let mut ctx = Context::new(&*self.shared, slot.owner(), slot.id(), store);
            if let Err(error) = component.update(&mut ctx, dt) {
                warn!(
                    tick_id,
                    entity = %slot.owner(),
                    selector = %slot.selector(),
                    %error,
                    "component update failed"
                );
            }
        }
        drop(snapshot);

        let (quit, next_scene, idle) = {
            let mut core = self.shared.core.borrow_mut();
            (core.quit, core.next_scene.take(), core.scheduler.is_idle())
        };
        if quit {
            info!(tick_id, "quit");
            return Ok(TickOutcome::Stop);
        }
        if let Some(scene) = next_scene {
            info!(tick_id, scene = %scene, "switching scene");
            self.load_scene(&scene)?;
            return Ok(TickOutcome::Continue);
        }
        if idle {
            info!(tick_id, "no components left");
            return Ok(TickOutcome::Stop);
        }
        Ok(TickOutcome::Continue)
    }

    /// Runs ticks paced at the configured rate until the scheduler stops or
    /// `max_ticks` is reached. Each tick receives the measured duration of
    /// the previous one. Returns the number of ticks run.
    ///
    /// # Errors
    ///
    /// A failed scene switch.
    pub fn run(&mut self) -> Result<u64, EngineError> {
        let budget = Duration::try_from_secs_f64(1.0 / self.tick_config.tick_rate)
            .ok()
            .filter(|d| !d.is_zero());
        let mut dt = budget.map_or(0.0, |d| d.as_secs_f32());
        let mut ticks = 0u64;

        info!(
            tick_rate = self.tick_config.tick_rate,
            max_ticks = self.tick_config.max_ticks,
            "starting tick loop"
        );

        loop {
            let start = Instant::now();
            let outcome = self.tick(dt)?;
            ticks += 1;

            if outcome == TickOutcome::Stop {
                info!(ticks, "tick loop stopped");
                break;
            }
            if self.tick_config.max_ticks > 0 && ticks >= self.tick_config.max_ticks {
                info!(ticks, "tick loop complete");
                break;
            }

            if let Some(budget) = budget {
                let elapsed = start.elapsed();
                if elapsed < budget {
                    std::thread::sleep(budget - elapsed);
                } else {
                    warn!(
                        tick_id = self.tick_id,
                        elapsed_ms = elapsed.as_millis() as u64,
                        budget_ms = budget.as_millis() as u64,
                        "tick exceeded time budget"
                    );
                }
            }
            dt = start.elapsed().as_secs_f32();
        }
        Ok(ticks)
    }
}
