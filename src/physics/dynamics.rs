//! Rigid body integration functions.

use glam::Vec2;

use crate::ecs::components::physics::{BodyType, RigidBody2D};
use crate::ecs::components::transform::Transform2D;

/// Apply gravity to all dynamic rigid bodies as a linear impulse.
///
/// The impulse is `gravity * mass * dt`, applied through the inverse mass, so every
/// body accelerates by `gravity` regardless of its mass. Bodies with zero mass are
/// treated as infinitely heavy and skipped.
pub fn apply_gravity(world: &mut hecs::World, gravity: Vec2, dt: f32) {
    for (_, rb) in world.query_mut::<&mut RigidBody2D>() {
        if rb.body_type != BodyType::Dynamic || rb.mass <= 0.0 {
            continue;
        }
        let impulse = gravity * rb.mass * dt;
        rb.linear_velocity += impulse * rb.inverse_mass();
    }
}

/// Integrate positions: p += v * dt.
///
/// Dynamic and kinematic bodies move. Rotation is only integrated when
/// `integrate_rotation` is set.
pub fn integrate_positions(world: &mut hecs::World, dt: f32, integrate_rotation: bool) {
    for (_, (rb, transform)) in world.query_mut::<(&RigidBody2D, &mut Transform2D)>() {
        if rb.body_type == BodyType::Static {
            continue;
        }

        transform.position += rb.linear_velocity * dt;

        if integrate_rotation {
            transform.rotation += rb.angular_velocity * dt;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRAVITY: Vec2 = Vec2::new(0.0, -9.81);
    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn test_free_fall() {
        let mut world = hecs::World::new();
        let entity = world.spawn((
            Transform2D::from_xy(0.0, 10.0),
            RigidBody2D::new_dynamic(1.0),
        ));

        // Simulate 1 second (60 steps)
        for _ in 0..60 {
            apply_gravity(&mut world, GRAVITY, DT);
            integrate_positions(&mut world, DT, false);
        }

        let transform = world.get::<&Transform2D>(entity).unwrap();
        let rb = world.get::<&RigidBody2D>(entity).unwrap();

        // Semi-implicit Euler lands slightly below the analytic 10 - 0.5 * g = 5.095
        assert!(
            (transform.position.y - 5.095).abs() < 0.1,
            "y = {}",
            transform.position.y
        );
        assert!((rb.linear_velocity.y + 9.81).abs() < 1e-3);
        assert!(transform.position.x.abs() < 1e-5);
    }

    #[test]
    fn test_gravity_is_mass_independent() {
        let mut world = hecs::World::new();
        let light = world.spawn((Transform2D::identity(), RigidBody2D::new_dynamic(0.5)));
        let heavy = world.spawn((Transform2D::identity(), RigidBody2D::new_dynamic(50.0)));

        apply_gravity(&mut world, GRAVITY, DT);

        let v_light = world.get::<&RigidBody2D>(light).unwrap().linear_velocity;
        let v_heavy = world.get::<&RigidBody2D>(heavy).unwrap().linear_velocity;
        assert!((v_light - v_heavy).length() < 1e-5);
        assert!((v_light.y - GRAVITY.y * DT).abs() < 1e-6);
    }

    #[test]
    fn test_static_body_unaffected() {
        let mut world = hecs::World::new();
        let entity = world.spawn((
            Transform2D::from_xy(1.0, 2.0),
            RigidBody2D::new_static().with_velocity(Vec2::new(5.0, 0.0)),
        ));

        for _ in 0..10 {
            apply_gravity(&mut world, GRAVITY, DT);
            integrate_positions(&mut world, DT, true);
        }

        assert_eq!(
            world.get::<&Transform2D>(entity).unwrap().position,
            Vec2::new(1.0, 2.0)
        );
    }

    #[test]
    fn test_massless_dynamic_body_ignores_gravity() {
        let mut world = hecs::World::new();
        let entity = world.spawn((Transform2D::identity(), RigidBody2D::new_dynamic(0.0)));

        apply_gravity(&mut world, GRAVITY, DT);

        assert_eq!(
            world.get::<&RigidBody2D>(entity).unwrap().linear_velocity,
            Vec2::ZERO
        );
    }

    #[test]
    fn test_kinematic_moves_without_gravity() {
        let mut world = hecs::World::new();
        let entity = world.spawn((
            Transform2D::identity(),
            RigidBody2D::new_kinematic().with_velocity(Vec2::new(6.0, 0.0)),
        ));

        for _ in 0..60 {
            apply_gravity(&mut world, GRAVITY, DT);
            integrate_positions(&mut world, DT, false);
        }

        let transform = world.get::<&Transform2D>(entity).unwrap();
        assert!((transform.position - Vec2::new(6.0, 0.0)).length() < 1e-3);
    }

    #[test]
    fn test_rotation_integration_is_opt_in() {
        let mut world = hecs::World::new();
        let mut body = RigidBody2D::new_dynamic(1.0);
        body.angular_velocity = 3.0;
        let entity = world.spawn((Transform2D::identity(), body));

        integrate_positions(&mut world, 0.5, false);
        assert_eq!(world.get::<&Transform2D>(entity).unwrap().rotation, 0.0);

        integrate_positions(&mut world, 0.5, true);
        assert!((world.get::<&Transform2D>(entity).unwrap().rotation - 1.5).abs() < 1e-6);
    }
}
