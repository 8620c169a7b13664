//! Scene builders shared by the onager2d benchmarks.

use anyhow::Result;
use glam::Vec2;
use onager2d::ecs::components::physics::{BoxComponent2D, CircleComponent2D, RigidBody2D};
use onager2d::ecs::components::transform::Transform2D;
use onager2d::physics::broadphase::{Broadphase, CollisionPairs, PairFilter};
use onager2d::physics::collider::Collider2D;
use onager2d::physics::contact::Contact;
use onager2d::physics::narrowphase::test_collision;
use onager2d::physics::shape::{BoxShape2D, CircleShape2D, ShapeKind, ShapeStore};
use onager2d::{EntityId, EventBus, PhysicsConfig, PhysicsSystem2D};

/// Colliders placed directly, bypassing the physics system.
pub struct ColliderScene {
    pub world: hecs::World,
    pub shapes: ShapeStore,
    pub colliders: Vec<Collider2D>,
}

impl ColliderScene {
    fn new(capacity: usize) -> Self {
        Self {
            world: hecs::World::new(),
            shapes: ShapeStore::new(),
            colliders: Vec::with_capacity(capacity),
        }
    }

    fn add_circle(&mut self, position: Vec2, radius: f32) -> Result<()> {
        let id = EntityId::from(
            self.world
                .spawn((Transform2D::from_position(position), RigidBody2D::new_dynamic(1.0))),
        );
        self.shapes
            .circles
            .insert(id, CircleShape2D::new(Vec2::ZERO, radius))?;
        let collider = Collider2D::new(id, ShapeKind::Circle).with_position(position, &self.shapes)?;
        self.colliders.push(collider);
        Ok(())
    }

    fn add_box(&mut self, position: Vec2, half_extent: Vec2) -> Result<()> {
        let id = EntityId::from(
            self.world
                .spawn((Transform2D::from_position(position), RigidBody2D::new_dynamic(1.0))),
        );
        self.shapes
            .boxes
            .insert(id, BoxShape2D::new(Vec2::ZERO, half_extent))?;
        let collider = Collider2D::new(id, ShapeKind::Box).with_position(position, &self.shapes)?;
        self.colliders.push(collider);
        Ok(())
    }

    /// Run `broadphase` once into `pairs`, returning the pair count.
    pub fn generate_pairs(
        &self,
        broadphase: &mut dyn Broadphase,
        pairs: &mut CollisionPairs,
        colliders_changed: bool,
    ) -> usize {
        let filter = PairFilter::new(&self.world);
        pairs.clear();
        broadphase.generate_collision_pairs(&self.colliders, &filter, pairs, colliders_changed);
        pairs.len()
    }

    /// Narrowphase contacts for every broadphase candidate.
    pub fn contacts(&self, broadphase: &mut dyn Broadphase) -> Result<Vec<Contact>> {
        let mut pairs = CollisionPairs::new();
        self.generate_pairs(broadphase, &mut pairs, true);

        let mut contacts = Vec::with_capacity(pairs.len());
        for pair in pairs.iter() {
            let a = self.collider(pair.a);
            let b = self.collider(pair.b);
            if let (Some(a), Some(b)) = (a, b) {
                if let Some(contact) = test_collision(a, b, &self.shapes)? {
                    contacts.push(contact);
                }
            }
        }
        Ok(contacts)
    }

    fn collider(&self, entity: EntityId) -> Option<&Collider2D> {
        self.colliders.iter().find(|c| c.entity == entity)
    }
}

fn grid_position(i: usize, n: usize, spacing: f32) -> Vec2 {
    let side = (n as f32).sqrt().ceil().max(1.0) as usize;
    Vec2::new((i % side) as f32 * spacing, (i / side) as f32 * spacing)
}

/// Unit circles on a grid tight enough that each touches its neighbours.
pub fn setup_uniform_circles(n: usize) -> Result<ColliderScene> {
    let mut scene = ColliderScene::new(n);
    for i in 0..n {
        scene.add_circle(grid_position(i, n, 1.8), 1.0)?;
    }
    Ok(scene)
}

/// Alternating boxes and circles of varying size on a loose grid.
pub fn setup_mixed_shapes(n: usize) -> Result<ColliderScene> {
    let mut scene = ColliderScene::new(n);
    for i in 0..n {
        let position = grid_position(i, n, 2.5);
        let size = 0.6 + (i % 5) as f32 * 0.2;
        if i % 2 == 0 {
            scene.add_circle(position, size)?;
        } else {
            scene.add_box(position, Vec2::new(size, size * 0.75))?;
        }
    }
    Ok(scene)
}

/// Small circles spread far apart; almost no pairs overlap.
pub fn setup_sparse_circles(n: usize) -> Result<ColliderScene> {
    let mut scene = ColliderScene::new(n);
    for i in 0..n {
        scene.add_circle(grid_position(i, n, 10.0), 0.5)?;
    }
    Ok(scene)
}

/// A static floor with `n` dynamic bodies stacked above it, ready to step.
pub fn setup_scene(n: usize) -> Result<(hecs::World, EventBus, PhysicsSystem2D)> {
    let mut world = hecs::World::new();
    let mut events = EventBus::new();
    let mut physics = PhysicsSystem2D::new(PhysicsConfig::default());
    physics.init(&mut events)?;

    let width = (n as f32).sqrt().ceil() * 2.2;
    world.spawn((
        Transform2D::from_xy(width * 0.5, -1.0),
        RigidBody2D::new_static(),
        BoxComponent2D::new(Vec2::new(width, 1.0)),
    ));

    for i in 0..n {
        let position = grid_position(i, n, 2.2) + Vec2::new(0.0, 1.5);
        let body = RigidBody2D::new_dynamic(1.0).with_elasticity(0.2);
        let transform = Transform2D::from_position(position);
        if i % 2 == 0 {
            world.spawn((transform, body, CircleComponent2D::new(0.9)));
        } else {
            world.spawn((transform, body, BoxComponent2D::new(Vec2::splat(0.9))));
        }
    }

    // First tick creates the colliders so benches time steady-state updates
    physics.fixed_update(&mut world, &mut events)?;
    Ok((world, events, physics))
}
