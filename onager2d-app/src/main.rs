use std::time::Instant;

use glam::Vec2;
use onager2d::ecs::components::physics::{BoxComponent2D, CircleComponent2D, RigidBody2D};
use onager2d::ecs::components::transform::Transform2D;
use onager2d::{
    BroadphaseKind, CollisionBeginEvent, CollisionEndEvent, EventBus, PhysicsConfig,
    PhysicsSystem2D,
};

/// Simulated seconds.
const DURATION: f64 = 5.0;

/// Frame deltas cycled by the headless loop, to exercise the accumulator.
const FRAME_DELTAS: [f64; 3] = [1.0 / 50.0, 1.0 / 75.0, 1.0 / 60.0];

struct DropScene {
    begins: usize,
    ends: usize,
}

impl DropScene {
    fn init(&mut self, world: &mut hecs::World) {
        // Ground
        world.spawn((
            Transform2D::identity(),
            RigidBody2D::new_static(),
            BoxComponent2D::new(Vec2::new(10.0, 1.0)),
        ));

        // Column of alternating circles and boxes
        for i in 0..8 {
            let position = Vec2::new((i % 3) as f32 - 1.0, 3.0 + i as f32 * 2.5);
            let body = RigidBody2D::new_dynamic(1.0 + i as f32 * 0.25).with_elasticity(0.3);
            if i % 2 == 0 {
                world.spawn((
                    Transform2D::from_position(position),
                    body,
                    CircleComponent2D::new(0.6),
                ));
            } else {
                world.spawn((
                    Transform2D::from_position(position),
                    body,
                    BoxComponent2D::new(Vec2::splat(0.5)),
                ));
            }
        }

        // Kinematic paddle sweeping through the column
        world.spawn((
            Transform2D::from_xy(-8.0, 4.0),
            RigidBody2D::new_kinematic().with_velocity(Vec2::new(3.0, 0.0)),
            BoxComponent2D::new(Vec2::new(0.25, 1.5)),
        ));
    }

    fn update(&mut self, events: &mut EventBus) -> anyhow::Result<()> {
        for event in events.drain::<CollisionBeginEvent>()? {
            log::debug!("begin {} {}", event.a, event.b);
            self.begins += 1;
        }
        for event in events.drain::<CollisionEndEvent>()? {
            log::debug!("end {} {}", event.a, event.b);
            self.ends += 1;
        }
        Ok(())
    }
}

fn parse_broadphase(name: &str) -> anyhow::Result<BroadphaseKind> {
    match name {
        "nsquared" => Ok(BroadphaseKind::NSquared),
        "sap" | "sweep-and-prune" => Ok(BroadphaseKind::SweepAndPrune),
        "hash" | "spatial-hash" => Ok(BroadphaseKind::SpatialHash),
        other => anyhow::bail!("unknown broadphase `{other}` (nsquared, sap, hash)"),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut config = PhysicsConfig::default();
    if let Some(name) = std::env::args().nth(1) {
        config.default_broadphase = parse_broadphase(&name)?;
    }

    let mut world = hecs::World::new();
    let mut events = EventBus::new();
    let mut physics = PhysicsSystem2D::new(config);
    physics.init(&mut events)?;

    let mut scene = DropScene { begins: 0, ends: 0 };
    scene.init(&mut world);

    log::info!(
        "Running {:.1}s with {} broadphase",
        DURATION,
        physics.active_broadphase_name().unwrap_or("no")
    );

    let started = Instant::now();
    let mut elapsed = 0.0;
    let mut ticks = 0u32;
    for delta in FRAME_DELTAS.iter().copied().cycle() {
        if elapsed >= DURATION {
            break;
        }
        ticks += physics.step(&mut world, &mut events, delta)?;
        scene.update(&mut events)?;
        elapsed += delta;
    }

    log::info!(
        "{} ticks in {:?}: {} colliders, {} begin / {} end events, {} touching",
        ticks,
        started.elapsed(),
        physics.collider_count(),
        scene.begins,
        scene.ends,
        physics.active_contacts().count()
    );

    for (entity, (transform, body)) in world.query::<(&Transform2D, &RigidBody2D)>().iter() {
        log::info!(
            "{:?} {:?} at ({:.2}, {:.2}) v = ({:.2}, {:.2})",
            entity,
            body.body_type,
            transform.position.x,
            transform.position.y,
            body.linear_velocity.x,
            body.linear_velocity.y
        );
    }

    physics.stop();
    Ok(())
}
