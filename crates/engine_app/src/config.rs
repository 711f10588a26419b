//! Engine configuration.

use std::fmt;

use engine_component::{Component, Selector};

/// Configuration for the tick loop.
#[derive(Debug, Clone, PartialEq)]
pub struct TickConfig {
    /// Target ticks per second.
    pub tick_rate: f64,
    /// Maximum number of ticks to run (0 = unlimited).
    pub max_ticks: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate: 90.0,
            max_ticks: 0,
        }
    }
}

/// What the event pump saw this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpStatus {
    Continue,
    /// A quit request from outside, e.g. a closed window.
    Quit,
}

/// Source of external events, polled once at the head of every tick.
pub trait EventPump {
    fn poll(&mut self) -> PumpStatus;
}

/// A pump with no event source. Never asks to quit.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdlePump;

impl EventPump for IdlePump {
    fn poll(&mut self) -> PumpStatus {
        PumpStatus::Continue
    }
}

/// Configuration for an [`Engine`](crate::Engine).
pub struct EngineConfig {
    pub tick: TickConfig,
    /// Overrides the scene's `compath` when set.
    pub compath: Option<String>,
    /// Components compiled into the host, registered at construction.
    pub builtins: Vec<(Selector, fn() -> Box<dyn Component>)>,
    pub pump: Box<dyn EventPump>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick: TickConfig::default(),
            compath: None,
            builtins: Vec::new(),
            pump: Box::new(IdlePump),
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the target tick rate.
    #[must_use]
    pub fn with_tick_rate(mut self, tick_rate: f64) -> Self {
        self.tick.tick_rate = tick_rate;
        self
    }

    /// Stop [`Engine::run`](crate::Engine::run) after this many ticks.
    #[must_use]
    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.tick.max_ticks = max_ticks;
        self
    }

    /// Override the module search path of every scene.
    #[must_use]
    pub fn with_compath(mut self, compath: impl Into<String>) -> Self {
        self.compath = Some(compath.into());
        self
    }

    /// Register a host-compiled component.
    #[must_use]
    pub fn with_builtin(mut self, selector: Selector, build: fn() -> Box<dyn Component>) -> Self {
        self.builtins.push((selector, build));
        self
    }

    /// Register several host-compiled components.
    #[must_use]
    pub fn with_builtins<I>(mut self, builtins: I) -> Self
    where
        I: IntoIterator<Item = (Selector, fn() -> Box<dyn Component>)>,
    {
        self.builtins.extend(builtins);
        self
    }

    /// Replace the event source.
    #[must_use]
    pub fn with_event_pump(mut self, pump: impl EventPump + 'static) -> Self {
        self.pump = Box::new(pump);
        self
    }
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("tick", &self.tick)
            .field("compath", &self.compath)
            .field(
                "builtins",
                &self.builtins.iter().map(|(s, _)| s.to_string()).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::new();
        assert_eq!(config.tick.tick_rate, 90.0);
        assert_eq!(config.tick.max_ticks, 0);
        assert!(config.compath.is_none());
        assert!(config.builtins.is_empty());
    }

    #[test]
    fn test_builder_overrides() {
        let config = EngineConfig::new()
            .with_tick_rate(30.0)
            .with_max_ticks(12)
            .with_compath("mods,/opt/mods");
        assert_eq!(config.tick, TickConfig { tick_rate: 30.0, max_ticks: 12 });
        assert_eq!(config.compath.as_deref(), Some("mods,/opt/mods"));
        assert!(format!("{config:?}").contains("mods,/opt/mods"));
    }

    #[test]
    fn test_idle_pump_never_quits() {
        let mut pump = IdlePump;
        for _ in 0..3 {
            assert_eq!(pump.poll(), PumpStatus::Continue);
        }
    }
}
