//! Stable entity identity shared between the ECS and the physics stores.

use std::fmt;

/// Opaque 64-bit entity identifier.
///
/// Wraps the bit representation of a `hecs::Entity`, so it stays stable for the
/// lifetime of the entity and can be resolved back with [`EntityId::to_entity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(u64);

impl EntityId {
    /// Wrap a raw identifier.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw 64-bit value.
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Resolve back to a `hecs::Entity` handle. Returns `None` for the zero id.
    pub fn to_entity(self) -> Option<hecs::Entity> {
        hecs::Entity::from_bits(self.0)
    }

    /// Whether the entity is still alive in `world`.
    pub fn is_valid(self, world: &hecs::World) -> bool {
        self.to_entity().is_some_and(|e| world.contains(e))
    }
}

impl From<hecs::Entity> for EntityId {
    fn from(entity: hecs::Entity) -> Self {
        Self(entity.to_bits().get())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:x}", self.0)
    }
}
