//! Colliders and their bounding boxes.

use glam::Vec2;

use crate::ecs::components::transform::Transform2D;
use crate::ecs::EntityId;
use crate::store::StoreError;

use super::shape::{ShapeKind, ShapeRef, ShapeStore};

/// Axis-aligned bounding box for broadphase collision detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb2D {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb2D {
    /// Test whether two AABBs overlap. Touching boxes count as overlapping.
    #[inline]
    pub fn overlaps(&self, other: &Aabb2D) -> bool {
        self.overlaps_x(other) && self.min.y <= other.max.y && self.max.y >= other.min.y
    }

    #[inline]
    pub fn overlaps_x(&self, other: &Aabb2D) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x
    }

    pub fn contains_point(&self, point: Vec2, tolerance: f32) -> bool {
        point.cmpge(self.min - Vec2::splat(tolerance)).all()
            && point.cmple(self.max + Vec2::splat(tolerance)).all()
    }

    pub fn centre(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }
}

impl Default for Aabb2D {
    fn default() -> Self {
        Self {
            min: Vec2::ZERO,
            max: Vec2::ZERO,
        }
    }
}

/// A collider binds an entity to the shape stored for it.
///
/// `position`, `rotation` and `aabb` are a per-tick cache copied from the entity's
/// transform by [`Collider2D::refresh`]; they are not authoritative.
#[derive(Debug, Clone, PartialEq)]
pub struct Collider2D {
    pub entity: EntityId,
    pub kind: ShapeKind,
    pub position: Vec2,
    /// Copied from the transform but not read by any stage. Shapes are tested
    /// axis aligned.
    pub rotation: f32,
    aabb: Aabb2D,
}

impl Collider2D {
    pub fn new(entity: EntityId, kind: ShapeKind) -> Self {
        Self {
            entity,
            kind,
            position: Vec2::ZERO,
            rotation: 0.0,
            aabb: Aabb2D::default(),
        }
    }

    /// Bounds computed by the last refresh.
    #[inline]
    pub fn aabb(&self) -> &Aabb2D {
        &self.aabb
    }

    /// Resolve the shape this collider points at.
    pub fn shape<'s>(&self, shapes: &'s ShapeStore) -> Result<ShapeRef<'s>, StoreError> {
        shapes.get(self.kind, self.entity)
    }

    /// Copy the transform into the cache and recompute bounds.
    pub fn refresh(
        &mut self,
        transform: &Transform2D,
        shapes: &ShapeStore,
    ) -> Result<(), StoreError> {
        self.position = transform.position;
        self.rotation = transform.rotation;
        self.aabb = self.shape(shapes)?.aabb(self.position);
        Ok(())
    }

    /// Place the collider directly, bypassing the ECS. Used by tests and benches.
    pub fn with_position(
        mut self,
        position: Vec2,
        shapes: &ShapeStore,
    ) -> Result<Self, StoreError> {
        self.refresh(&Transform2D::from_position(position), shapes)?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::shape::{BoxShape2D, CircleShape2D};

    #[test]
    fn test_aabb_overlap() {
        let a = Aabb2D {
            min: Vec2::new(-1.0, -1.0),
            max: Vec2::new(1.0, 1.0),
        };
        let b = Aabb2D {
            min: Vec2::new(0.5, 0.5),
            max: Vec2::new(2.0, 2.0),
        };
        let c = Aabb2D {
            min: Vec2::new(2.5, 2.5),
            max: Vec2::new(3.0, 3.0),
        };
        let touching = Aabb2D {
            min: Vec2::new(1.0, -1.0),
            max: Vec2::new(2.0, 1.0),
        };
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c));
        assert!(a.overlaps(&touching));
    }

    #[test]
    fn test_overlap_requires_both_axes() {
        let a = Aabb2D {
            min: Vec2::new(0.0, 0.0),
            max: Vec2::new(1.0, 1.0),
        };
        let b = Aabb2D {
            min: Vec2::new(0.5, 5.0),
            max: Vec2::new(1.5, 6.0),
        };
        assert!(a.overlaps_x(&b));
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn test_refresh_copies_transform() {
        let mut shapes = ShapeStore::new();
        let id = EntityId::from_raw(11);
        shapes
            .circles
            .insert(id, CircleShape2D::new(Vec2::ZERO, 1.0))
            .unwrap();

        let mut collider = Collider2D::new(id, ShapeKind::Circle);
        let transform = Transform2D {
            position: Vec2::new(4.0, -2.0),
            rotation: 0.3,
        };
        collider.refresh(&transform, &shapes).unwrap();

        assert_eq!(collider.position, Vec2::new(4.0, -2.0));
        assert_eq!(collider.rotation, 0.3);
        assert_eq!(collider.aabb().min, Vec2::new(3.0, -3.0));
        assert_eq!(collider.aabb().max, Vec2::new(5.0, -1.0));
    }

    #[test]
    fn test_rotation_leaves_box_bounds_axis_aligned() {
        let mut shapes = ShapeStore::new();
        let id = EntityId::from_raw(14);
        shapes
            .boxes
            .insert(id, BoxShape2D::new(Vec2::ZERO, Vec2::new(2.0, 0.5)))
            .unwrap();

        let mut upright = Collider2D::new(id, ShapeKind::Box);
        upright.refresh(&Transform2D::identity(), &shapes).unwrap();
        let mut turned = Collider2D::new(id, ShapeKind::Box);
        let transform = Transform2D {
            position: Vec2::ZERO,
            rotation: std::f32::consts::FRAC_PI_2,
        };
        turned.refresh(&transform, &shapes).unwrap();

        assert_eq!(turned.aabb(), upright.aabb());
        assert_eq!(turned.aabb().max, Vec2::new(2.0, 0.5));
    }

    #[test]
    fn test_refresh_without_shape_fails() {
        let shapes = ShapeStore::new();
        let id = EntityId::from_raw(12);
        let mut collider = Collider2D::new(id, ShapeKind::Box);
        assert_eq!(
            collider.refresh(&Transform2D::identity(), &shapes),
            Err(StoreError::NotFound(id))
        );
    }

    #[test]
    fn test_with_position_box() {
        let mut shapes = ShapeStore::new();
        let id = EntityId::from_raw(13);
        shapes
            .boxes
            .insert(id, BoxShape2D::new(Vec2::ZERO, Vec2::new(5.0, 1.0)))
            .unwrap();

        let collider = Collider2D::new(id, ShapeKind::Box)
            .with_position(Vec2::new(0.0, 1.0), &shapes)
            .unwrap();
        assert_eq!(collider.aabb().min, Vec2::new(-5.0, 0.0));
        assert_eq!(collider.aabb().max, Vec2::new(5.0, 2.0));
    }
}
