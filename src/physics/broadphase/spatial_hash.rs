//! Uniform grid broadphase hashed into buckets.

use std::collections::HashMap;

use super::{Broadphase, CollisionPairs, PairFilter};
use crate::physics::collider::{Aabb2D, Collider2D};
use crate::physics::contact::CollisionPair;

pub(super) const NAME: &str = "SpatialHash";

/// Colliders covering more cells than this skip the grid and are tested against
/// every other collider instead.
pub const MAX_CELLS_PER_COLLIDER: i64 = 64;

const DEFAULT_CELL_SIZE: f32 = 2.0;
const DEFAULT_BUCKET_COUNT: usize = 1024;

/// Hash of integer cell coordinates.
///
/// Distinct cells may share a hash. That only adds candidates, which the AABB
/// check then discards.
#[inline]
pub fn generate_hash(x: i32, y: i32) -> u64 {
    const PRIME_X: u64 = 73_856_093;
    const PRIME_Y: u64 = 19_349_663;
    (x as i64 as u64).wrapping_mul(PRIME_X) ^ (y as i64 as u64).wrapping_mul(PRIME_Y)
}

/// Spatial hash broadphase. The map is rebuilt from scratch every tick.
#[derive(Debug)]
pub struct SpatialHashBroadphase2D {
    cell_size: f32,
    bucket_count: usize,
    cells: HashMap<u64, Vec<usize>>,
    oversized: Vec<usize>,
}

impl Default for SpatialHashBroadphase2D {
    fn default() -> Self {
        Self::new(DEFAULT_CELL_SIZE, DEFAULT_BUCKET_COUNT)
    }
}

impl SpatialHashBroadphase2D {
    /// `cell_size` is clamped to a small positive value.
    pub fn new(cell_size: f32, bucket_count: usize) -> Self {
        Self {
            cell_size: cell_size.max(f32::EPSILON),
            bucket_count,
            cells: HashMap::with_capacity(bucket_count),
            oversized: Vec::new(),
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn bucket_count(&self) -> usize {
        self.bucket_count
    }

    /// Inclusive cell range covered by `aabb`.
    #[inline]
    fn cell_range(&self, aabb: &Aabb2D) -> ((i32, i32), (i32, i32)) {
        let inv = 1.0 / self.cell_size;
        (
            (
                (aabb.min.x * inv).floor() as i32,
                (aabb.min.y * inv).floor() as i32,
            ),
            (
                (aabb.max.x * inv).floor() as i32,
                (aabb.max.y * inv).floor() as i32,
            ),
        )
    }

    fn insert(&mut self, index: usize, aabb: &Aabb2D) {
        let ((x0, y0), (x1, y1)) = self.cell_range(aabb);
        // Each axis is checked on its own first; saturated ranges overflow the product
        let width = i64::from(x1) - i64::from(x0) + 1;
        let height = i64::from(y1) - i64::from(y0) + 1;
        if width > MAX_CELLS_PER_COLLIDER
            || height > MAX_CELLS_PER_COLLIDER
            || width * height > MAX_CELLS_PER_COLLIDER
        {
            self.oversized.push(index);
            return;
        }

        for x in x0..=x1 {
            for y in y0..=y1 {
                self.cells
                    .entry(generate_hash(x, y))
                    .or_insert_with(Vec::new)
                    .push(index);
            }
        }
    }
}

#[inline]
fn try_pair(
    colliders: &[Collider2D],
    i: usize,
    j: usize,
    filter: &PairFilter<'_>,
    pairs: &mut CollisionPairs,
) {
    let (a, b) = (&colliders[i], &colliders[j]);
    if a.aabb().overlaps(b.aabb()) && filter.accepts(a.entity, b.entity, pairs) {
        pairs.push(CollisionPair::new(a.entity, b.entity));
    }
}

impl Broadphase for SpatialHashBroadphase2D {
    fn name(&self) -> &'static str {
        NAME
    }

    fn generate_collision_pairs(
        &mut self,
        colliders: &[Collider2D],
        filter: &PairFilter<'_>,
        pairs: &mut CollisionPairs,
        _colliders_changed: bool,
    ) {
        self.cells.clear();
        self.oversized.clear();

        for (index, collider) in colliders.iter().enumerate() {
            self.insert(index, collider.aabb());
        }

        for bucket in self.cells.values() {
            for (n, &i) in bucket.iter().enumerate() {
                for &j in &bucket[n + 1..] {
                    try_pair(colliders, i, j, filter, pairs);
                }
            }
        }

        for &i in &self.oversized {
            for j in 0..colliders.len() {
                if i != j {
                    try_pair(colliders, i, j, filter, pairs);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::ecs::components::physics::RigidBody2D;
    use crate::physics::broadphase::fixtures::{keys_of, Scene};

    #[test]
    fn test_hash_distinguishes_neighbours() {
        let centre = generate_hash(0, 0);
        for (x, y) in [(1, 0), (0, 1), (-1, 0), (0, -1), (1, 1), (-1, -1)] {
            assert_ne!(generate_hash(x, y), centre, "({x}, {y})");
        }
        assert_eq!(generate_hash(-3, 7), generate_hash(-3, 7));
    }

    #[test]
    fn test_cell_range_spans_negative_coordinates() {
        let grid = SpatialHashBroadphase2D::new(2.0, 16);
        let aabb = Aabb2D {
            min: Vec2::new(-3.0, -0.5),
            max: Vec2::new(1.0, 0.5),
        };
        assert_eq!(grid.cell_range(&aabb), ((-2, -1), (0, 0)));
    }

    #[test]
    fn test_pairs_across_cell_boundary() {
        let mut scene = Scene::new();
        // Centres fall in different cells, bounds share one
        let a = scene.add_circle(Vec2::new(1.7, 0.5), 0.5, RigidBody2D::new_dynamic(1.0));
        let b = scene.add_circle(Vec2::new(2.3, 0.5), 0.5, RigidBody2D::new_dynamic(1.0));

        let pairs = scene.run(&mut SpatialHashBroadphase2D::default(), true);
        assert_eq!(pairs.len(), 1);
        assert!(pairs.contains(a, b));
    }

    #[test]
    fn test_pair_sharing_many_cells_reported_once() {
        let mut scene = Scene::new();
        scene.add_box(Vec2::ZERO, Vec2::splat(3.0), RigidBody2D::new_dynamic(1.0));
        scene.add_box(Vec2::new(0.5, 0.5), Vec2::splat(3.0), RigidBody2D::new_dynamic(1.0));

        let pairs = scene.run(&mut SpatialHashBroadphase2D::new(1.0, 64), true);
        assert_eq!(pairs.len(), 1);
    }

    #[test]
    fn test_oversized_collider_is_not_dropped() {
        let mut scene = Scene::new();
        let floor = scene.add_box(Vec2::ZERO, Vec2::new(500.0, 1.0), RigidBody2D::new_static());
        let left = scene.add_circle(Vec2::new(-400.0, 1.5), 1.0, RigidBody2D::new_dynamic(1.0));
        let right = scene.add_circle(Vec2::new(400.0, 1.5), 1.0, RigidBody2D::new_dynamic(1.0));

        let mut grid = SpatialHashBroadphase2D::new(1.0, 64);
        let pairs = scene.run(&mut grid, true);

        assert_eq!(grid.oversized.len(), 1);
        assert!(pairs.contains(floor, left));
        assert!(pairs.contains(floor, right));
        assert_eq!(keys_of(&pairs), scene.overlapping_keys());
    }

    #[test]
    fn test_huge_collider_goes_to_oversize_list() {
        let mut scene = Scene::new();
        let ground = scene.add_box(Vec2::ZERO, Vec2::splat(1e10), RigidBody2D::new_static());
        let ball = scene.add_circle(Vec2::new(3.0, 3.0), 0.5, RigidBody2D::new_dynamic(1.0));

        let mut grid = SpatialHashBroadphase2D::default();
        let pairs = scene.run(&mut grid, true);

        assert_eq!(grid.oversized.len(), 1);
        assert_eq!(pairs.len(), 1);
        assert!(pairs.contains(ground, ball));
    }
}
