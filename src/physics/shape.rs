//! Shape storage and geometric helpers.

use glam::Vec2;

use crate::ecs::components::physics::{BoxComponent2D, CircleComponent2D};
use crate::ecs::EntityId;
use crate::store::{PackedStore, StoreError};

use super::collider::Aabb2D;

/// Which concrete shape a collider refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Box,
    Circle,
}

/// Axis-aligned box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxShape2D {
    pub centre_of_mass: Vec2,
    pub half_extent: Vec2,
    /// Corner offsets from the centre, counter-clockwise from bottom-left.
    /// Only valid after [`BoxShape2D::update_points`].
    pub points: [Vec2; 4],
}

impl BoxShape2D {
    pub fn new(centre_of_mass: Vec2, half_extent: Vec2) -> Self {
        let mut shape = Self {
            centre_of_mass,
            half_extent,
            points: [Vec2::ZERO; 4],
        };
        shape.update_points();
        shape
    }

    /// Recompute corner offsets after `half_extent` changed.
    pub fn update_points(&mut self) {
        let h = self.half_extent;
        self.points = [
            Vec2::new(-h.x, -h.y),
            Vec2::new(h.x, -h.y),
            Vec2::new(h.x, h.y),
            Vec2::new(-h.x, h.y),
        ];
    }

    /// World-space bounds when the owning entity sits at `position`.
    pub fn aabb(&self, position: Vec2) -> Aabb2D {
        let centre = position + self.centre_of_mass;
        let mut min = Vec2::splat(f32::MAX);
        let mut max = Vec2::splat(f32::MIN);
        for p in &self.points {
            min = min.min(centre + *p);
            max = max.max(centre + *p);
        }
        Aabb2D { min, max }
    }
}

impl Default for BoxShape2D {
    fn default() -> Self {
        Self::new(Vec2::ZERO, Vec2::splat(0.5))
    }
}

impl From<&BoxComponent2D> for BoxShape2D {
    fn from(component: &BoxComponent2D) -> Self {
        Self::new(component.centre_of_mass, component.half_extent)
    }
}

/// Circle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleShape2D {
    pub centre_of_mass: Vec2,
    pub radius: f32,
}

impl CircleShape2D {
    pub fn new(centre_of_mass: Vec2, radius: f32) -> Self {
        Self {
            centre_of_mass,
            radius,
        }
    }

    pub fn aabb(&self, position: Vec2) -> Aabb2D {
        let centre = position + self.centre_of_mass;
        Aabb2D {
            min: centre - Vec2::splat(self.radius),
            max: centre + Vec2::splat(self.radius),
        }
    }
}

impl Default for CircleShape2D {
    fn default() -> Self {
        Self::new(Vec2::ZERO, 0.5)
    }
}

impl From<&CircleComponent2D> for CircleShape2D {
    fn from(component: &CircleComponent2D) -> Self {
        Self::new(component.centre_of_mass, component.radius)
    }
}

/// Borrowed view of a stored shape, used for pattern-matched dispatch.
#[derive(Debug, Clone, Copy)]
pub enum ShapeRef<'a> {
    Box(&'a BoxShape2D),
    Circle(&'a CircleShape2D),
}

impl ShapeRef<'_> {
    pub fn kind(&self) -> ShapeKind {
        match self {
            ShapeRef::Box(_) => ShapeKind::Box,
            ShapeRef::Circle(_) => ShapeKind::Circle,
        }
    }

    pub fn aabb(&self, position: Vec2) -> Aabb2D {
        match self {
            ShapeRef::Box(b) => b.aabb(position),
            ShapeRef::Circle(c) => c.aabb(position),
        }
    }
}

/// Sole owner of all shape data, one packed store per shape kind.
#[derive(Debug, Default)]
pub struct ShapeStore {
    pub boxes: PackedStore<BoxShape2D>,
    pub circles: PackedStore<CircleShape2D>,
}

impl ShapeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: ShapeKind, id: EntityId) -> Result<ShapeRef<'_>, StoreError> {
        Ok(match kind {
            ShapeKind::Box => ShapeRef::Box(self.boxes.get(id)?),
            ShapeKind::Circle => ShapeRef::Circle(self.circles.get(id)?),
        })
    }

    /// Kind of the shape stored for `id`, if any.
    pub fn kind_of(&self, id: EntityId) -> Option<ShapeKind> {
        if self.boxes.contains(id) {
            Some(ShapeKind::Box)
        } else if self.circles.contains(id) {
            Some(ShapeKind::Circle)
        } else {
            None
        }
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.kind_of(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.boxes.len() + self.circles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.boxes.clear();
        self.circles.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_points_follow_half_extent() {
        let mut shape = BoxShape2D::new(Vec2::ZERO, Vec2::new(1.0, 2.0));
        assert_eq!(shape.points[2], Vec2::new(1.0, 2.0));

        shape.half_extent = Vec2::new(3.0, 1.0);
        // Stale until recomputed
        assert_eq!(shape.points[2], Vec2::new(1.0, 2.0));
        shape.update_points();
        assert_eq!(shape.points[0], Vec2::new(-3.0, -1.0));
        assert_eq!(shape.points[2], Vec2::new(3.0, 1.0));
    }

    #[test]
    fn test_box_aabb() {
        let shape = BoxShape2D::new(Vec2::new(0.5, 0.0), Vec2::new(1.0, 2.0));
        let aabb = shape.aabb(Vec2::new(10.0, 5.0));
        assert_eq!(aabb.min, Vec2::new(9.5, 3.0));
        assert_eq!(aabb.max, Vec2::new(11.5, 7.0));
    }

    #[test]
    fn test_circle_aabb() {
        let shape = CircleShape2D::new(Vec2::ZERO, 1.5);
        let aabb = shape.aabb(Vec2::new(0.0, 5.0));
        assert_eq!(aabb.min, Vec2::new(-1.5, 3.5));
        assert_eq!(aabb.max, Vec2::new(1.5, 6.5));
    }

    #[test]
    fn test_aabb_contains_shape_extremes() {
        let position = Vec2::new(-3.0, 7.25);

        let circle = CircleShape2D::new(Vec2::new(0.25, -0.5), 2.0);
        let aabb = circle.aabb(position);
        let centre = position + circle.centre_of_mass;
        for i in 0..32 {
            let angle = i as f32 / 32.0 * std::f32::consts::TAU;
            let p = centre + Vec2::from_angle(angle) * circle.radius;
            assert!(aabb.contains_point(p, 1e-4), "{p:?} outside {aabb:?}");
        }

        let shape = BoxShape2D::new(Vec2::new(1.0, 0.0), Vec2::new(0.5, 4.0));
        let aabb = shape.aabb(position);
        for p in shape.points {
            assert!(aabb.contains_point(position + shape.centre_of_mass + p, 0.0));
        }
    }

    #[test]
    fn test_store_kind_lookup() {
        let mut store = ShapeStore::new();
        let a = EntityId::from_raw(1);
        let b = EntityId::from_raw(2);
        store.boxes.insert(a, BoxShape2D::default()).unwrap();
        store.circles.insert(b, CircleShape2D::default()).unwrap();

        assert_eq!(store.kind_of(a), Some(ShapeKind::Box));
        assert_eq!(store.kind_of(b), Some(ShapeKind::Circle));
        assert_eq!(store.get(ShapeKind::Circle, b).unwrap().kind(), ShapeKind::Circle);
        assert!(store.get(ShapeKind::Circle, a).is_err());
        assert_eq!(store.len(), 2);

        store.clear();
        assert!(store.is_empty());
    }
}
