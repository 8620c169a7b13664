//! Impulse-based collision response.
//!
//! One sequential pass over the tick's contacts. Each contact gets a single
//! restitution impulse along its normal followed by a full positional correction
//! split by inverse mass. Only linear velocity is affected.

use glam::Vec2;
use tracing::trace;

use crate::ecs::components::physics::RigidBody2D;
use crate::ecs::components::transform::Transform2D;
use crate::ecs::EntityId;

use super::contact::Contact;

/// Resolve all contacts in order.
pub fn resolve_contacts(world: &mut hecs::World, contacts: &[Contact]) {
    for contact in contacts {
        resolve_contact(world, contact);
    }
}

/// Copy of the body state the solver reads.
#[derive(Debug, Clone, Copy)]
struct RbData {
    entity: hecs::Entity,
    inv_mass: f32,
    linear_velocity: Vec2,
    elasticity: f32,
}

impl RbData {
    fn read(world: &hecs::World, id: EntityId) -> Option<Self> {
        let entity = id.to_entity()?;
        let rb = world.get::<&RigidBody2D>(entity).ok()?;
        Some(Self {
            entity,
            inv_mass: rb.inverse_mass(),
            linear_velocity: rb.linear_velocity,
            elasticity: rb.elasticity,
        })
    }
}

/// Impulse magnitude for a contact, or `None` when the bodies are separating.
///
/// `j = -(1 + e) * dot(vA - vB, n) / (invA + invB)`
pub fn normal_impulse(
    velocity_a: Vec2,
    velocity_b: Vec2,
    normal: Vec2,
    elasticity: f32,
    inv_mass_sum: f32,
) -> Option<f32> {
    let n_vab = (velocity_a - velocity_b).dot(normal);
    if n_vab <= 0.0 || inv_mass_sum <= 0.0 {
        return None;
    }
    Some(-(1.0 + elasticity) * n_vab / inv_mass_sum)
}

fn resolve_contact(world: &mut hecs::World, contact: &Contact) {
    let (a, b) = match (RbData::read(world, contact.a), RbData::read(world, contact.b)) {
        (Some(a), Some(b)) => (a, b),
        _ => {
            trace!(a = %contact.a, b = %contact.b, "Skipping contact with missing body");
            return;
        }
    };

    let inv_mass_sum = a.inv_mass + b.inv_mass;
    if inv_mass_sum <= 0.0 {
        return;
    }

    // Combined restitution is the product of both bodies
    let elasticity = a.elasticity * b.elasticity;

    if let Some(j) = normal_impulse(
        a.linear_velocity,
        b.linear_velocity,
        contact.normal,
        elasticity,
        inv_mass_sum,
    ) {
        let impulse = contact.normal * j;
        write_velocity(world, a.entity, a.linear_velocity + impulse * a.inv_mass);
        write_velocity(world, b.entity, b.linear_velocity - impulse * b.inv_mass);
    }

    // Positional correction, pushing each body out by its inverse mass share
    let ds = contact.point_on_b - contact.point_on_a;
    let t_a = a.inv_mass / inv_mass_sum;
    let t_b = b.inv_mass / inv_mass_sum;
    if t_a > 0.0 {
        translate(world, a.entity, ds * t_a);
    }
    if t_b > 0.0 {
        translate(world, b.entity, -ds * t_b);
    }
}

fn write_velocity(world: &mut hecs::World, entity: hecs::Entity, velocity: Vec2) {
    if let Ok(mut rb) = world.get::<&mut RigidBody2D>(entity) {
        if rb.inverse_mass() > 0.0 {
            rb.linear_velocity = velocity;
        }
    }
}

fn translate(world: &mut hecs::World, entity: hecs::Entity, offset: Vec2) {
    if let Ok(mut transform) = world.get::<&mut Transform2D>(entity) {
        transform.position += offset;
    }
}
