//! Entity handles.
//!
//! A handle names an entity for as long as the engine that built it lives.
//! Handles are never recycled, so a handle that outlives its entity simply
//! stops resolving: stores, lookups and writes through it come back empty.

use std::fmt;

/// A handle to an assembled entity.
///
/// Displays as `#<n>`, the form every log line uses for `entity` fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity(pub u64);

impl Entity {
    /// Owner recorded on cells that no store holds yet: template cells and
    /// fresh clones.
    pub const UNOWNED: Entity = Entity(0);

    /// Returns `true` for [`Entity::UNOWNED`].
    #[must_use]
    pub const fn is_unowned(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out the entity handles of one engine.
///
/// The allocator outlives scene switches, so a handle kept from an old scene
/// can never name an entity of the new one.
#[derive(Debug)]
pub struct EntityAllocator {
    next: u64,
}

impl EntityAllocator {
    #[must_use]
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn allocate(&mut self) -> Entity {
        let entity = Entity(self.next);
        self.next += 1;
        entity
    }

    /// Number of handles handed out so far.
    #[must_use]
    pub fn allocated(&self) -> u64 {
        self.next - 1
    }
}

impl Default for EntityAllocator {
    fn default() -> Self {
        Self::new()
    }
}
