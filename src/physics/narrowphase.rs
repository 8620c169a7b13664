//! Narrowphase collision detection: exact tests per shape pair.
//!
//! All tests are axis-aligned. Every contact satisfies
//! `point_on_b - point_on_a == -penetration * normal`, which the solver relies on
//! for positional correction.

use glam::Vec2;

use crate::store::StoreError;

use super::collider::Collider2D;
use super::contact::Contact;
use super::shape::{BoxShape2D, CircleShape2D, ShapeRef, ShapeStore};

/// Normal used when two centres coincide and no direction can be derived.
pub const FALLBACK_NORMAL: Vec2 = Vec2::Y;

const CENTRE_EPSILON: f32 = 1e-6;

/// Geometry of a contact before entity ids are attached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactInfo {
    /// Contact normal (from shape A to shape B).
    pub normal: Vec2,
    pub point_on_a: Vec2,
    pub point_on_b: Vec2,
    pub penetration: f32,
}

impl ContactInfo {
    fn flipped(self) -> Self {
        Self {
            normal: -self.normal,
            point_on_a: self.point_on_b,
            point_on_b: self.point_on_a,
            penetration: self.penetration,
        }
    }
}

/// Circle-circle test. `centre_*` are world-space circle centres.
pub fn circle_circle(
    centre_a: Vec2,
    radius_a: f32,
    centre_b: Vec2,
    radius_b: f32,
) -> Option<ContactInfo> {
    let ab = centre_b - centre_a;
    let radius_ab = radius_a + radius_b;
    let distance_sq = ab.length_squared();

    if distance_sq > radius_ab * radius_ab {
        return None;
    }

    let distance = distance_sq.sqrt();
    let normal = if distance > CENTRE_EPSILON {
        ab / distance
    } else {
        FALLBACK_NORMAL
    };

    Some(ContactInfo {
        normal,
        point_on_a: centre_a + normal * radius_a,
        point_on_b: centre_b - normal * radius_b,
        penetration: radius_ab - distance,
    })
}

/// Axis-aligned box-box test. The normal is the axis of least penetration.
pub fn box_box(centre_a: Vec2, half_a: Vec2, centre_b: Vec2, half_b: Vec2) -> Option<ContactInfo> {
    let d = centre_b - centre_a;
    let overlap = half_a + half_b - d.abs();

    if overlap.x < 0.0 || overlap.y < 0.0 {
        return None;
    }

    // Centre of the overlap region
    let region_min = (centre_a - half_a).max(centre_b - half_b);
    let region_max = (centre_a + half_a).min(centre_b + half_b);
    let region_centre = (region_min + region_max) * 0.5;

    if overlap.x < overlap.y {
        let sign = sign_or_positive(d.x);
        Some(ContactInfo {
            normal: Vec2::new(sign, 0.0),
            point_on_a: Vec2::new(centre_a.x + sign * half_a.x, region_centre.y),
            point_on_b: Vec2::new(centre_b.x - sign * half_b.x, region_centre.y),
            penetration: overlap.x,
        })
    } else {
        let sign = sign_or_positive(d.y);
        Some(ContactInfo {
            normal: Vec2::new(0.0, sign),
            point_on_a: Vec2::new(region_centre.x, centre_a.y + sign * half_a.y),
            point_on_b: Vec2::new(region_centre.x, centre_b.y - sign * half_b.y),
            penetration: overlap.y,
        })
    }
}

/// Box-circle test with the box as shape A.
pub fn box_circle(
    box_centre: Vec2,
    half: Vec2,
    circle_centre: Vec2,
    radius: f32,
) -> Option<ContactInfo> {
    let local = circle_centre - box_centre;
    let closest = box_centre + local.clamp(-half, half);
    let delta = circle_centre - closest;
    let distance_sq = delta.length_squared();

    if distance_sq > radius * radius {
        return None;
    }

    if distance_sq > CENTRE_EPSILON * CENTRE_EPSILON {
        let distance = distance_sq.sqrt();
        let normal = delta / distance;
        return Some(ContactInfo {
            normal,
            point_on_a: closest,
            point_on_b: circle_centre - normal * radius,
            penetration: radius - distance,
        });
    }

    // Circle centre inside the box: push out through the nearest face
    let depth = half - local.abs();
    let (normal, face_point, inside) = if depth.x < depth.y {
        let sign = sign_or_positive(local.x);
        (
            Vec2::new(sign, 0.0),
            Vec2::new(box_centre.x + sign * half.x, circle_centre.y),
            depth.x,
        )
    } else {
        let sign = sign_or_positive(local.y);
        (
            Vec2::new(0.0, sign),
            Vec2::new(circle_centre.x, box_centre.y + sign * half.y),
            depth.y,
        )
    };

    Some(ContactInfo {
        normal,
        point_on_a: face_point,
        point_on_b: circle_centre - normal * radius,
        penetration: inside + radius,
    })
}

/// Dispatch on the shape pair. Circle-box reuses the box-circle test.
pub fn detect_collision(
    shape_a: ShapeRef<'_>,
    position_a: Vec2,
    shape_b: ShapeRef<'_>,
    position_b: Vec2,
) -> Option<ContactInfo> {
    match (shape_a, shape_b) {
        (ShapeRef::Circle(a), ShapeRef::Circle(b)) => circle_circle(
            circle_centre(a, position_a),
            a.radius,
            circle_centre(b, position_b),
            b.radius,
        ),
        (ShapeRef::Box(a), ShapeRef::Box(b)) => box_box(
            box_centre(a, position_a),
            a.half_extent,
            box_centre(b, position_b),
            b.half_extent,
        ),
        (ShapeRef::Box(a), ShapeRef::Circle(b)) => box_circle(
            box_centre(a, position_a),
            a.half_extent,
            circle_centre(b, position_b),
            b.radius,
        ),
        (ShapeRef::Circle(a), ShapeRef::Box(b)) => box_circle(
            box_centre(b, position_b),
            b.half_extent,
            circle_centre(a, position_a),
            a.radius,
        )
        .map(ContactInfo::flipped),
    }
}

/// Test two colliders against each other using their cached positions.
pub fn test_collision(
    a: &Collider2D,
    b: &Collider2D,
    shapes: &ShapeStore,
) -> Result<Option<Contact>, StoreError> {
    let shape_a = a.shape(shapes)?;
    let shape_b = b.shape(shapes)?;

    Ok(
        detect_collision(shape_a, a.position, shape_b, b.position).map(|info| Contact {
            a: a.entity,
            b: b.entity,
            normal: info.normal,
            point_on_a: info.point_on_a,
            point_on_b: info.point_on_b,
            penetration: info.penetration,
        }),
    )
}

#[inline]
fn box_centre(shape: &BoxShape2D, position: Vec2) -> Vec2 {
    position + shape.centre_of_mass
}

#[inline]
fn circle_centre(shape: &CircleShape2D, position: Vec2) -> Vec2 {
    position + shape.centre_of_mass
}

#[inline]
fn sign_or_positive(v: f32) -> f32 {
    if v < 0.0 {
        -1.0
    } else {
        1.0
    }
}
