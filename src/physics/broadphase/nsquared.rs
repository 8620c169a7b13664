//! Exhaustive pair testing.

use super::{Broadphase, CollisionPairs, PairFilter};
use crate::physics::collider::Collider2D;
use crate::physics::contact::CollisionPair;

pub(super) const NAME: &str = "NSquared";

/// Tests every ordered pair. O(n^2), used as the reference for the other strategies.
#[derive(Debug, Default)]
pub struct NSquaredBroadphase;

impl NSquaredBroadphase {
    pub fn new() -> Self {
        Self
    }
}

impl Broadphase for NSquaredBroadphase {
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
        for a in colliders {
            for b in colliders {
                if !filter.accepts(a.entity, b.entity, pairs) {
                    continue;
                }
                if a.aabb().overlaps(b.aabb()) {
                    pairs.push(CollisionPair::new(a.entity, b.entity));
                }
            }
        }
    }
}
