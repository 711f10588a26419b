//! # engine_builtin
//!
//! Components compiled into the runtime. Everything here could equally be
//! shipped as a module; registering them up front just spares the search.
//!
//! | selector                 | role                                      |
//! |--------------------------|-------------------------------------------|
//! | `spatial`                | position `x y z`, size `w h d`            |
//! | `kinematics/kinematic2d` | integrates acceleration and speed         |
//! | `spin`                   | moves `x`/`y` around a circle             |
//! | `lifetime`               | destroys its owner after a delay          |
//! | `watch`                  | logs changes of the listed keys           |

use engine_component::{Component, Selector};

pub mod kinematics;
pub mod lifetime;
pub mod spatial;
pub mod spin;
pub mod watch;

#[cfg(test)]
pub(crate) mod testing;

pub use kinematics::Kinematic2d;
pub use lifetime::Lifetime;
pub use spatial::Spatial;
pub use spin::Spin;
pub use watch::Watch;

fn build<C: Component + Default>() -> Box<dyn Component> {
    Box::new(C::default())
}

/// Every stock component with its builder.
#[must_use]
pub fn builtins() -> Vec<(Selector, fn() -> Box<dyn Component>)> {
    vec![
        (Selector::family_only("spatial"), build::<Spatial> as fn() -> Box<dyn Component>),
        (Selector::new("kinematics", "kinematic2d"), build::<Kinematic2d>),
        (Selector::family_only("spin"), build::<Spin>),
        (Selector::family_only("lifetime"), build::<Lifetime>),
        (Selector::family_only("watch"), build::<Watch>),
    ]
}
