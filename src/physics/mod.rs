//! 2D physics with pluggable broadphases and impulse response.
//!
//! # Architecture
//!
//! [`PhysicsSystem2D`] owns the shape and collider stores and runs once per fixed
//! tick:
//!
//! 1. Sync shapes and colliders with the ECS components
//! 2. Apply gravity and integrate positions
//! 3. Refresh collider caches from transforms
//! 4. Broadphase pair generation (active strategy)
//! 5. Narrowphase contact generation
//! 6. Impulse resolution and positional correction
//! 7. Begin/end collision events
//!
//! Steps 3 to 6 only run while at least one collider exists.

pub mod broadphase;
pub mod collider;
pub mod contact;
pub mod dynamics;
pub mod events;
pub mod narrowphase;
pub mod shape;
pub mod solver;

use glam::Vec2;
use tracing::{debug, trace, warn};

use crate::ecs::components::physics::{BoxComponent2D, CircleComponent2D, RigidBody2D};
use crate::ecs::components::transform::Transform2D;
use crate::ecs::EntityId;
use crate::event::{EventBus, EventError};
use crate::store::{PackedStore, StoreError};

use self::broadphase::{
    Broadphase, BroadphaseKind, BroadphaseRegistry, CollisionPairs, NSquaredBroadphase,
    PairFilter, SpatialHashBroadphase2D, SweepAndPruneBroadphase,
};
use self::collider::Collider2D;
use self::contact::{CollisionPair, Contact};
use self::events::{register_events, ContactTracker};
use self::shape::{BoxShape2D, CircleShape2D, ShapeKind, ShapeStore};

/// Errors raised by [`PhysicsSystem2D`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PhysicsError {
    #[error("broadphase `{0}` is already registered")]
    BroadphaseAlreadyRegistered(&'static str),
    #[error("broadphase `{0}` is not registered")]
    BroadphaseNotRegistered(&'static str),
    #[error("no broadphase is active")]
    NoActiveBroadphase,
    #[error("invalid shape on entity {entity}: {reason}")]
    InvalidShape {
        entity: EntityId,
        reason: &'static str,
    },
    #[error("entity {0} carries both a box and a circle")]
    ShapeConflict(EntityId),
    #[error("entity {entity} has no {component} component")]
    MissingComponent {
        entity: EntityId,
        component: &'static str,
    },
    #[error("physics system is not running")]
    NotRunning,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Event(#[from] EventError),
}

/// Spatial hash tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialHashConfig {
    /// Grid cell edge length in world units. Default: 2.0.
    pub cell_size: f32,
    /// Initial bucket capacity of the hash map. Default: 1024.
    pub bucket_count: usize,
}

impl Default for SpatialHashConfig {
    fn default() -> Self {
        Self {
            cell_size: 2.0,
            bucket_count: 1024,
        }
    }
}

/// Configuration for the physics simulation.
#[derive(Debug, Clone)]
pub struct PhysicsConfig {
    /// Gravity vector. Default: (0, -9.81).
    pub gravity: Vec2,
    /// Fixed timestep for physics updates in seconds. Default: 1/60.
    pub fixed_timestep: f64,
    /// Maximum number of sub-steps per [`PhysicsSystem2D::step`]. Default: 4.
    pub max_substeps: u32,
    /// Integrate rotation from angular velocity. Default: false.
    pub integrate_rotation: bool,
    pub spatial_hash: SpatialHashConfig,
    /// Broadphase selected by [`PhysicsSystem2D::init`]. Default: spatial hash.
    pub default_broadphase: BroadphaseKind,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.0, -9.81),
            fixed_timestep: 1.0 / 60.0,
            max_substeps: 4,
            integrate_rotation: false,
            spatial_hash: SpatialHashConfig::default(),
            default_broadphase: BroadphaseKind::default(),
        }
    }
}

/// Lifecycle state of the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SystemState {
    #[default]
    Stopped,
    Running,
}

/// The physics system: shape and collider stores plus the simulation pipeline.
pub struct PhysicsSystem2D {
    config: PhysicsConfig,
    state: SystemState,
    accumulator: f64,
    shapes: ShapeStore,
    colliders: PackedStore<Collider2D>,
    colliders_changed: bool,
    broadphases: BroadphaseRegistry,
    pairs: CollisionPairs,
    contacts: Vec<Contact>,
    tracker: ContactTracker,
}

impl Default for PhysicsSystem2D {
    fn default() -> Self {
        Self::new(PhysicsConfig::default())
    }
}

impl PhysicsSystem2D {
    /// Create a stopped system with empty stores.
    pub fn new(config: PhysicsConfig) -> Self {
        Self {
            config,
            state: SystemState::Stopped,
            accumulator: 0.0,
            shapes: ShapeStore::new(),
            colliders: PackedStore::new(),
            colliders_changed: true,
            broadphases: BroadphaseRegistry::new(),
            pairs: CollisionPairs::new(),
            contacts: Vec::new(),
            tracker: ContactTracker::new(),
        }
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Gravity and timestep changes apply from the next tick. Broadphase settings
    /// only apply to strategies registered afterwards.
    pub fn config_mut(&mut self) -> &mut PhysicsConfig {
        &mut self.config
    }

    pub fn state(&self) -> SystemState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SystemState::Running
    }

    /// Register event types and the built-in broadphases, select the configured
    /// default and start the system.
    pub fn init(&mut self, events: &mut EventBus) -> Result<(), PhysicsError> {
        register_events(events);

        if !self.broadphases.is_registered::<NSquaredBroadphase>() {
            self.register_broadphase::<NSquaredBroadphase>()?;
        }
        if !self.broadphases.is_registered::<SweepAndPruneBroadphase>() {
            self.register_broadphase::<SweepAndPruneBroadphase>()?;
        }
        if !self.broadphases.is_registered::<SpatialHashBroadphase2D>() {
            let grid = self.config.spatial_hash;
            self.register_broadphase_instance(SpatialHashBroadphase2D::new(
                grid.cell_size,
                grid.bucket_count,
            ))?;
        }
        self.broadphases.set_kind(self.config.default_broadphase)?;

        self.state = SystemState::Running;
        debug!(
            broadphase = ?self.broadphases.active_name(),
            "Physics system initialized"
        );
        Ok(())
    }

    /// Full reset: drop shapes, colliders, pairs, contacts and active contacts.
    ///
    /// Registered broadphases stay registered.
    pub fn stop(&mut self) {
        self.shapes.clear();
        self.colliders.clear();
        self.colliders_changed = true;
        self.pairs.clear();
        self.contacts.clear();
        self.tracker.clear();
        self.accumulator = 0.0;
        self.state = SystemState::Stopped;
        debug!("Physics system stopped");
    }

    pub fn register_broadphase<T: Broadphase + Default + 'static>(
        &mut self,
    ) -> Result<(), PhysicsError> {
        self.broadphases.register::<T>()
    }

    pub fn register_broadphase_instance<T: Broadphase + 'static>(
        &mut self,
        broadphase: T,
    ) -> Result<(), PhysicsError> {
        self.broadphases.register_instance(broadphase)
    }

    /// Switch the active broadphase. `T` must be registered.
    pub fn set_broadphase<T: Broadphase + 'static>(&mut self) -> Result<(), PhysicsError> {
        self.broadphases.set::<T>()?;
        // The new strategy has no cached state for the current colliders
        self.colliders_changed = true;
        Ok(())
    }

    pub fn set_broadphase_kind(&mut self, kind: BroadphaseKind) -> Result<(), PhysicsError> {
        self.broadphases.set_kind(kind)?;
        self.colliders_changed = true;
        Ok(())
    }

    pub fn active_broadphase_name(&self) -> Option<&'static str> {
        self.broadphases.active_name()
    }

    /// Step the simulation forward by `delta_time` seconds.
    ///
    /// Uses a fixed timestep accumulator. Returns the number of ticks run.
    pub fn step(
        &mut self,
        world: &mut hecs::World,
        events: &mut EventBus,
        delta_time: f64,
    ) -> Result<u32, PhysicsError> {
        self.accumulator += delta_time;

        let mut substeps = 0u32;
        while self.accumulator >= self.config.fixed_timestep && substeps < self.config.max_substeps
        {
            self.fixed_update(world, events)?;
            self.accumulator -= self.config.fixed_timestep;
            substeps += 1;
        }

        // Clamp accumulator to avoid spiral of death
        if self.accumulator > self.config.fixed_timestep * self.config.max_substeps as f64 {
            self.accumulator = 0.0;
        }

        Ok(substeps)
    }

    /// Run one fixed tick.
    pub fn fixed_update(
        &mut self,
        world: &mut hecs::World,
        events: &mut EventBus,
    ) -> Result<(), PhysicsError> {
        if !self.is_running() {
            return Err(PhysicsError::NotRunning);
        }
        let dt = self.config.fixed_timestep as f32;

        // 1. Component lifecycle
        self.sync_components(world);

        // 2. Gravity and integration
        dynamics::apply_gravity(world, self.config.gravity, dt);
        dynamics::integrate_positions(world, dt, self.config.integrate_rotation);

        self.pairs.clear();
        self.contacts.clear();

        if !self.colliders.is_empty() {
            // 3. Collider refresh
            self.refresh_colliders(world)?;

            // 4. Broadphase
            let filter = PairFilter::new(world);
            self.broadphases.active_mut()?.generate_collision_pairs(
                self.colliders.values(),
                &filter,
                &mut self.pairs,
                self.colliders_changed,
            );
            self.colliders_changed = false;

            // 5. Detection
            for pair in self.pairs.iter() {
                let a = self.colliders.get(pair.a)?;
                let b = self.colliders.get(pair.b)?;
                if let Some(contact) = narrowphase::test_collision(a, b, &self.shapes)? {
                    self.contacts.push(contact);
                }
            }

            // Canonical order keeps the response independent of the broadphase
            self.contacts.sort_unstable_by_key(Contact::key);

            // 6. Response
            solver::resolve_contacts(world, &self.contacts);
        }

        // 7. Events
        let (begun, ended) = self.tracker.update(&self.contacts, events)?;

        trace!(
            colliders = self.colliders.len(),
            pairs = self.pairs.len(),
            contacts = self.contacts.len(),
            begun,
            ended,
            "Physics tick"
        );
        Ok(())
    }

    fn refresh_colliders(&mut self, world: &hecs::World) -> Result<(), PhysicsError> {
        for collider in self.colliders.values_mut() {
            let Some(entity) = collider.entity.to_entity() else {
                continue;
            };
            match world.get::<&Transform2D>(entity) {
                Ok(transform) => collider.refresh(&transform, &self.shapes)?,
                Err(_) => trace!(entity = %collider.entity, "Collider without transform"),
            }
        }
        Ok(())
    }

    /// Diff the world against the physics stores and fire the lifecycle hooks.
    ///
    /// Removals run first so an entity swapping a box for a circle within one tick
    /// is not reported as a conflict. An entity whose other shape kind is already
    /// stored is left alone, so a box/circle conflict is reported once rather than
    /// every tick. Errors are logged and the entity is skipped.
    ///
    /// Returns the number of entities skipped because a hook failed.
    pub fn sync_components(&mut self, world: &hecs::World) -> usize {
        let mut failed = 0;

        let removed_boxes: Vec<EntityId> = self
            .shapes
            .boxes
            .ids()
            .iter()
            .copied()
            .filter(|id| !has_component::<BoxComponent2D>(world, *id))
            .collect();
        for id in removed_boxes {
            failed += log_sync_error(id, self.on_destroy_box(id));
        }

        let removed_circles: Vec<EntityId> = self
            .shapes
            .circles
            .ids()
            .iter()
            .copied()
            .filter(|id| !has_component::<CircleComponent2D>(world, *id))
            .collect();
        for id in removed_circles {
            failed += log_sync_error(id, self.on_destroy_circle(id));
        }

        let removed_bodies: Vec<EntityId> = self
            .colliders
            .ids()
            .iter()
            .copied()
            .filter(|id| !has_component::<RigidBody2D>(world, *id))
            .collect();
        for id in removed_bodies {
            failed += log_sync_error(id, self.on_destroy_rigidbody(id));
        }

        // Both lists are taken before either kind is constructed
        let boxes: Vec<EntityId> = world
            .query::<&BoxComponent2D>()
            .iter()
            .filter(|(entity, component)| {
                let id = EntityId::from(*entity);
                !self.shapes.circles.contains(id)
                    && self.shapes.boxes.get(id).map_or(true, |shape| {
                        shape.centre_of_mass != component.centre_of_mass
                            || shape.half_extent != component.half_extent
                    })
            })
            .map(|(entity, _)| EntityId::from(entity))
            .collect();

        let circles: Vec<EntityId> = world
            .query::<&CircleComponent2D>()
            .iter()
            .filter(|(entity, component)| {
                let id = EntityId::from(*entity);
                !self.shapes.boxes.contains(id)
                    && self.shapes.circles.get(id).map_or(true, |shape| {
                        shape.centre_of_mass != component.centre_of_mass
                            || shape.radius != component.radius
                    })
            })
            .map(|(entity, _)| EntityId::from(entity))
            .collect();

        for id in boxes {
            failed += log_sync_error(id, self.on_construct_box(world, id));
        }
        for id in circles {
            failed += log_sync_error(id, self.on_construct_circle(world, id));
        }

        let bodies: Vec<EntityId> = world
            .query::<&RigidBody2D>()
            .iter()
            .map(|(entity, _)| EntityId::from(entity))
            .filter(|id| self.shapes.contains(*id) && !self.colliders.contains(*id))
            .collect();
        for id in bodies {
            failed += log_sync_error(id, self.on_construct_rigidbody(world, id));
        }

        failed
    }

    /// Create or refresh the box shape for `entity` from its component.
    pub fn on_construct_box(
        &mut self,
        world: &hecs::World,
        entity: EntityId,
    ) -> Result<(), PhysicsError> {
        let component = read_component::<BoxComponent2D>(world, entity, "BoxComponent2D")?;
        if !(component.half_extent.x > 0.0 && component.half_extent.y > 0.0) {
            return Err(PhysicsError::InvalidShape {
                entity,
                reason: "half extent must be positive",
            });
        }
        if self.shapes.circles.contains(entity) {
            return Err(PhysicsError::ShapeConflict(entity));
        }

        if let Ok(shape) = self.shapes.boxes.get_mut(entity) {
            shape.centre_of_mass = component.centre_of_mass;
            shape.half_extent = component.half_extent;
            shape.update_points();
        } else {
            self.shapes
                .boxes
                .insert(entity, BoxShape2D::from(&component))?;
        }

        self.attach_collider(world, entity, ShapeKind::Box)
    }

    /// Create or refresh the circle shape for `entity` from its component.
    pub fn on_construct_circle(
        &mut self,
        world: &hecs::World,
        entity: EntityId,
    ) -> Result<(), PhysicsError> {
        let component = read_component::<CircleComponent2D>(world, entity, "CircleComponent2D")?;
        if !(component.radius > 0.0) {
            return Err(PhysicsError::InvalidShape {
                entity,
                reason: "radius must be positive",
            });
        }
        if self.shapes.boxes.contains(entity) {
            return Err(PhysicsError::ShapeConflict(entity));
        }

        if let Ok(shape) = self.shapes.circles.get_mut(entity) {
            *shape = CircleShape2D::from(&component);
        } else {
            self.shapes
                .circles
                .insert(entity, CircleShape2D::from(&component))?;
        }

        self.attach_collider(world, entity, ShapeKind::Circle)
    }

    /// Create the collider for `entity` if it already has a shape.
    pub fn on_construct_rigidbody(
        &mut self,
        world: &hecs::World,
        entity: EntityId,
    ) -> Result<(), PhysicsError> {
        read_component::<RigidBody2D>(world, entity, "RigidBody2D")?;
        match self.shapes.kind_of(entity) {
            Some(kind) => self.attach_collider(world, entity, kind),
            None => Ok(()),
        }
    }

    pub fn on_destroy_box(&mut self, entity: EntityId) -> Result<(), PhysicsError> {
        self.shapes.boxes.erase(entity)?;
        self.detach_collider(entity);
        Ok(())
    }

    pub fn on_destroy_circle(&mut self, entity: EntityId) -> Result<(), PhysicsError> {
        self.shapes.circles.erase(entity)?;
        self.detach_collider(entity);
        Ok(())
    }

    /// Drop the collider for `entity`. The shape stays until its component goes.
    pub fn on_destroy_rigidbody(&mut self, entity: EntityId) -> Result<(), PhysicsError> {
        self.detach_collider(entity);
        Ok(())
    }

    fn attach_collider(
        &mut self,
        world: &hecs::World,
        entity: EntityId,
        kind: ShapeKind,
    ) -> Result<(), PhysicsError> {
        if self.colliders.contains(entity) || !has_component::<RigidBody2D>(world, entity) {
            return Ok(());
        }

        let mut collider = Collider2D::new(entity, kind);
        if let Some(transform) = entity
            .to_entity()
            .and_then(|e| world.get::<&Transform2D>(e).ok())
        {
            collider.refresh(&transform, &self.shapes)?;
        }
        self.colliders.insert(entity, collider)?;
        self.colliders_changed = true;
        trace!(%entity, ?kind, "Collider created");
        Ok(())
    }

    fn detach_collider(&mut self, entity: EntityId) {
        if self.colliders.erase(entity).is_ok() {
            self.colliders_changed = true;
            trace!(%entity, "Collider removed");
        }
    }

    /// Pairs currently touching, in the orientation they began with.
    pub fn active_contacts(&self) -> impl Iterator<Item = (EntityId, EntityId)> + '_ {
        self.tracker.iter()
    }

    /// Contacts found during the last tick.
    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    /// Candidate pairs produced by the broadphase during the last tick.
    pub fn collision_pairs(&self) -> &[CollisionPair] {
        self.pairs.as_slice()
    }

    pub fn collider(&self, entity: EntityId) -> Option<&Collider2D> {
        self.colliders.get(entity).ok()
    }

    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }

    pub fn shapes(&self) -> &ShapeStore {
        &self.shapes
    }

    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }
}

fn has_component<T: hecs::Component>(world: &hecs::World, id: EntityId) -> bool {
    id.to_entity()
        .is_some_and(|entity| world.get::<&T>(entity).is_ok())
}

fn read_component<T: hecs::Component + Clone>(
    world: &hecs::World,
    entity: EntityId,
    component: &'static str,
) -> Result<T, PhysicsError> {
    entity
        .to_entity()
        .and_then(|e| world.get::<&T>(e).ok().map(|c| (*c).clone()))
        .ok_or(PhysicsError::MissingComponent { entity, component })
}

fn log_sync_error(entity: EntityId, result: Result<(), PhysicsError>) -> usize {
    match result {
        Ok(()) => 0,
        Err(err) => {
            warn!(%entity, error = %err, "Skipping entity during component sync");
            1
        }
    }
}
