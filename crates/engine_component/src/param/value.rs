//! Type-erased parameter values.
//!
//! Cells store their value behind the object-safe [`Value`] trait, which acts
//! as the small dispatch table the blackboard needs: type tag, duplicate,
//! compare, parse-from-text and assign-from-another-value. Any type that
//! implements [`ParamValue`] gets a [`Value`] implementation for free.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A value type that can live in a parameter cell.
///
/// Signatures carry every value as text, so a parameter type must know how
/// to parse itself. Implement this for your own types to store them on the
/// blackboard.
pub trait ParamValue: Any + Clone + PartialEq + fmt::Debug + Default {
    /// Parses the textual signature form. `None` means the text is not a
    /// valid value of this type.
    fn parse(raw: &str) -> Option<Self>;
}

macro_rules! param_value_from_str {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ParamValue for $ty {
                fn parse(raw: &str) -> Option<Self> {
                    raw.trim().parse().ok()
                }
            }
        )*
    };
}

param_value_from_str!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, char);

impl ParamValue for bool {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ParamValue for String {
    fn parse(raw: &str) -> Option<Self> {
        Some(raw.to_string())
    }
}

/// Runtime type tag fixed at a cell's creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeTag {
    id: TypeId,
    name: &'static str,
}

impl TypeTag {
    /// The tag for `T`.
    #[must_use]
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Human-readable type name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns `true` if this tag describes `T`.
    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Shared, interior-mutable storage for one erased value.
pub type SharedValue = Rc<RefCell<dyn Value>>;

/// Object-safe view over a [`ParamValue`].
pub trait Value: Any + fmt::Debug {
    /// The concrete type's tag.
    fn tag(&self) -> TypeTag;

    /// Copies the value into fresh storage.
    fn duplicate(&self) -> SharedValue;

    /// Compares with another erased value; different types are never equal.
    fn same_as(&self, other: &dyn Value) -> bool;

    /// Parses `raw` into this value in place. Returns `false` (and leaves the
    /// value untouched) when `raw` does not parse.
    fn assign_parsed(&mut self, raw: &str) -> bool;

    /// Copies `other` into this value. Returns `false` on a type mismatch.
    fn assign_from(&mut self, other: &dyn Value) -> bool;

    /// Upcast for downcasting to the concrete type.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for downcasting to the concrete type.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: ParamValue> Value for T {
    fn tag(&self) -> TypeTag {
        TypeTag::of::<T>()
    }

    fn duplicate(&self) -> SharedValue {
        Rc::new(RefCell::new(self.clone()))
    }

    fn same_as(&self, other: &dyn Value) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| other == self)
    }

    fn assign_parsed(&mut self, raw: &str) -> bool {
        match T::parse(raw) {
            Some(value) => {
                *self = value;
                true
            }
            None => false,
        }
    }

    fn assign_from(&mut self, other: &dyn Value) -> bool {
        match other.as_any().downcast_ref::<T>() {
            Some(other) => {
                *self = other.clone();
                true
            }
            None => false,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
