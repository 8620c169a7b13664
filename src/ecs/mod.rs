//! Entity Component System integration with hecs.
//!
//! The physics core never owns entity lifetime. It stores [`EntityId`] values and
//! resolves them against a `hecs::World` when it needs component data.

pub mod components;
pub mod entity;

pub use entity::EntityId;

pub mod prelude {
    pub use super::components::*;
    pub use super::entity::EntityId;
}
