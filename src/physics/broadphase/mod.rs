//! Broadphase collision detection.
//!
//! A broadphase turns the full collider set into candidate pairs whose AABBs
//! overlap. Three strategies are provided and exactly one is active at a time:
//!
//! - [`NSquaredBroadphase`] - every ordered pair, the correctness baseline
//! - [`SweepAndPruneBroadphase`] - sorted sweep along x
//! - [`SpatialHashBroadphase2D`] - uniform grid hashed into buckets
//!
//! Every strategy runs its candidates through [`PairFilter`] before accepting them.

mod nsquared;
mod spatial_hash;
mod sweep_and_prune;

pub use nsquared::NSquaredBroadphase;
pub use spatial_hash::{generate_hash, SpatialHashBroadphase2D, MAX_CELLS_PER_COLLIDER};
pub use sweep_and_prune::SweepAndPruneBroadphase;

use std::any::TypeId;
use std::collections::{HashMap, HashSet};

use tracing::{debug, trace};

use crate::ecs::components::physics::RigidBody2D;
use crate::ecs::EntityId;

use super::collider::Collider2D;
use super::contact::{CollisionPair, PairKey};
use super::PhysicsError;

/// Pluggable pair generation strategy.
pub trait Broadphase {
    /// Human-readable strategy name, used in logs and queries.
    fn name(&self) -> &'static str;

    /// Append candidate pairs for `colliders` to `pairs`.
    ///
    /// `colliders_changed` is set when colliders were added or removed since the
    /// previous call, which invalidates any index a strategy cached.
    fn generate_collision_pairs(
        &mut self,
        colliders: &[Collider2D],
        filter: &PairFilter<'_>,
        pairs: &mut CollisionPairs,
        colliders_changed: bool,
    );
}

/// Candidate pairs for one tick, deduplicated by [`PairKey`].
#[derive(Debug, Default, Clone)]
pub struct CollisionPairs {
    pairs: Vec<CollisionPair>,
    keys: HashSet<PairKey>,
}

impl CollisionPairs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept a pair. Returns `false` if either orientation was already accepted.
    pub fn push(&mut self, pair: CollisionPair) -> bool {
        if !self.keys.insert(pair.key()) {
            return false;
        }
        self.pairs.push(pair);
        true
    }

    pub fn contains(&self, a: EntityId, b: EntityId) -> bool {
        self.keys.contains(&PairKey::new(a, b))
    }

    pub fn as_slice(&self) -> &[CollisionPair] {
        &self.pairs
    }

    pub fn iter(&self) -> impl Iterator<Item = &CollisionPair> {
        self.pairs.iter()
    }

    pub fn keys(&self) -> &HashSet<PairKey> {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn clear(&mut self) {
        self.pairs.clear();
        self.keys.clear();
    }
}

/// Shared acceptance policy for candidate pairs.
///
/// A pair is rejected when it is a self pair, when either entity is gone from the
/// world or lost its rigid body, when neither body can receive an impulse, or when
/// the pair was already accepted this tick in either orientation.
pub struct PairFilter<'w> {
    world: &'w hecs::World,
}

impl<'w> PairFilter<'w> {
    pub fn new(world: &'w hecs::World) -> Self {
        Self { world }
    }

    pub fn accepts(&self, a: EntityId, b: EntityId, pairs: &CollisionPairs) -> bool {
        if a == b {
            return false;
        }

        let (inv_a, inv_b) = match (self.inverse_mass(a), self.inverse_mass(b)) {
            (Some(inv_a), Some(inv_b)) => (inv_a, inv_b),
            _ => {
                trace!(%a, %b, "Dropping pair with stale entity");
                return false;
            }
        };

        if inv_a == 0.0 && inv_b == 0.0 {
            return false;
        }

        !pairs.contains(a, b)
    }

    /// `None` when the entity is dead or has no rigid body.
    fn inverse_mass(&self, id: EntityId) -> Option<f32> {
        let entity = id.to_entity()?;
        let body = self.world.get::<&RigidBody2D>(entity).ok()?;
        Some(body.inverse_mass())
    }
}

/// Broadphase selection used by `PhysicsSystem2D::init`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BroadphaseKind {
    NSquared,
    SweepAndPrune,
    #[default]
    SpatialHash,
}

impl BroadphaseKind {
    pub fn type_id(self) -> TypeId {
        match self {
            BroadphaseKind::NSquared => TypeId::of::<NSquaredBroadphase>(),
            BroadphaseKind::SweepAndPrune => TypeId::of::<SweepAndPruneBroadphase>(),
            BroadphaseKind::SpatialHash => TypeId::of::<SpatialHashBroadphase2D>(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BroadphaseKind::NSquared => nsquared::NAME,
            BroadphaseKind::SweepAndPrune => sweep_and_prune::NAME,
            BroadphaseKind::SpatialHash => spatial_hash::NAME,
        }
    }
}

/// Broadphase strategies keyed by type, with one active entry.
#[derive(Default)]
pub struct BroadphaseRegistry {
    strategies: HashMap<TypeId, Box<dyn Broadphase>>,
    active: Option<TypeId>,
}

impl BroadphaseRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a default-constructed `T`.
    pub fn register<T: Broadphase + Default + 'static>(&mut self) -> Result<(), PhysicsError> {
        self.register_instance(T::default())
    }

    /// Register a configured instance of `T`.
    pub fn register_instance<T: Broadphase + 'static>(
        &mut self,
        broadphase: T,
    ) -> Result<(), PhysicsError> {
        let type_id = TypeId::of::<T>();
        if self.strategies.contains_key(&type_id) {
            return Err(PhysicsError::BroadphaseAlreadyRegistered(broadphase.name()));
        }
        debug!(name = broadphase.name(), "Registered broadphase");
        self.strategies.insert(type_id, Box::new(broadphase));
        Ok(())
    }

    pub fn is_registered<T: 'static>(&self) -> bool {
        self.strategies.contains_key(&TypeId::of::<T>())
    }

    /// Make `T` the active strategy.
    pub fn set<T: 'static>(&mut self) -> Result<(), PhysicsError> {
        self.set_by_id(TypeId::of::<T>(), std::any::type_name::<T>())
    }

    pub fn set_kind(&mut self, kind: BroadphaseKind) -> Result<(), PhysicsError> {
        self.set_by_id(kind.type_id(), kind.name())
    }

    fn set_by_id(&mut self, type_id: TypeId, name: &'static str) -> Result<(), PhysicsError> {
        let strategy = self
            .strategies
            .get(&type_id)
            .ok_or(PhysicsError::BroadphaseNotRegistered(name))?;
        debug!(name = strategy.name(), "Active broadphase set");
        self.active = Some(type_id);
        Ok(())
    }

    pub fn active_mut(&mut self) -> Result<&mut dyn Broadphase, PhysicsError> {
        let type_id = self.active.ok_or(PhysicsError::NoActiveBroadphase)?;
        match self.strategies.get_mut(&type_id) {
            Some(strategy) => Ok(strategy.as_mut()),
            None => Err(PhysicsError::NoActiveBroadphase),
        }
    }

    pub fn active_name(&self) -> Option<&'static str> {
        self.active
            .and_then(|id| self.strategies.get(&id))
            .map(|b| b.name())
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}
