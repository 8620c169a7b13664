//! Onager 2D physics
//!
//! A 2D rigid body physics core driven by a `hecs` world: pluggable broadphases,
//! exact narrowphase contacts, impulse-based response and collision events.
//!
//! # Architecture
//!
//! The library is organized into layers:
//!
//! 1. **store** - Packed storage keyed by entity id
//! 2. **event** - Typed event bus for collision events
//! 3. **ecs** - Entity identity and the components physics reads and writes
//! 4. **physics** - Shapes, colliders, broadphases, narrowphase, solver and the
//!    [`PhysicsSystem2D`] orchestrator
//!
//! # Example
//!
//! ```
//! use onager2d::prelude::*;
//!
//! let mut world = hecs::World::new();
//! let mut events = EventBus::new();
//! let mut physics = PhysicsSystem2D::new(PhysicsConfig::default());
//! physics.init(&mut events).unwrap();
//!
//! world.spawn((
//!     Transform2D::from_xy(0.0, 10.0),
//!     RigidBody2D::new_dynamic(1.0),
//!     CircleComponent2D::new(1.0),
//! ));
//! world.spawn((
//!     Transform2D::identity(),
//!     RigidBody2D::new_static(),
//!     BoxComponent2D::new(Vec2::new(5.0, 1.0)),
//! ));
//!
//! for _ in 0..120 {
//!     physics.fixed_update(&mut world, &mut events).unwrap();
//! }
//! assert_eq!(events.drain::<CollisionBeginEvent>().unwrap().len(), 1);
//! ```

pub mod ecs;
pub mod event;
pub mod physics;
pub mod store;

pub use glam;
pub use hecs;

// Re-export commonly used types
pub use ecs::EntityId;
pub use event::{EventBus, EventError};
pub use physics::broadphase::{
    Broadphase, BroadphaseKind, NSquaredBroadphase, SpatialHashBroadphase2D,
    SweepAndPruneBroadphase,
};
pub use physics::events::{CollisionBeginEvent, CollisionEndEvent};
pub use physics::{PhysicsConfig, PhysicsError, PhysicsSystem2D, SpatialHashConfig};
pub use store::{PackedStore, StoreError};

pub mod prelude {
    pub use crate::ecs::prelude::*;
    pub use crate::event::EventBus;
    pub use crate::physics::broadphase::{
        Broadphase, BroadphaseKind, NSquaredBroadphase, SpatialHashBroadphase2D,
        SweepAndPruneBroadphase,
    };
    pub use crate::physics::events::{CollisionBeginEvent, CollisionEndEvent};
    pub use crate::physics::{PhysicsConfig, PhysicsError, PhysicsSystem2D};
    pub use glam::Vec2;
}
