//! Sweep and prune along the x axis.

use super::{Broadphase, CollisionPairs, PairFilter};
use crate::physics::collider::Collider2D;
use crate::physics::contact::CollisionPair;

pub(super) const NAME: &str = "SweepAndPrune";

/// Keeps colliders sorted by AABB min x and sweeps once per tick.
///
/// The sort order survives between ticks. While the collider set is unchanged it
/// is repaired with an insertion sort, which is close to linear because bodies
/// move little per tick. Any add or remove triggers a full rebuild.
#[derive(Debug, Default)]
pub struct SweepAndPruneBroadphase {
    order: Vec<usize>,
    active: Vec<usize>,
}

impl SweepAndPruneBroadphase {
    pub fn new() -> Self {
        Self::default()
    }

    fn rebuild(&mut self, colliders: &[Collider2D]) {
        self.order.clear();
        self.order.extend(0..colliders.len());
        self.order
            .sort_unstable_by(|&a, &b| min_x(colliders, a).total_cmp(&min_x(colliders, b)));
    }

    fn insertion_sort(&mut self, colliders: &[Collider2D]) {
        for i in 1..self.order.len() {
            let mut j = i;
            while j > 0 && min_x(colliders, self.order[j - 1]) > min_x(colliders, self.order[j]) {
                self.order.swap(j - 1, j);
                j -= 1;
            }
        }
    }
}

#[inline]
fn min_x(colliders: &[Collider2D], index: usize) -> f32 {
    colliders[index].aabb().min.x
}

impl Broadphase for SweepAndPruneBroadphase {
    fn name(&self) -> &'static str {
        NAME
    }

    fn generate_collision_pairs(
        &mut self,
        colliders: &[Collider2D],
        filter: &PairFilter<'_>,
        pairs: &mut CollisionPairs,
        colliders_changed: bool,
    ) {
        if colliders_changed || self.order.len() != colliders.len() {
            self.rebuild(colliders);
        } else {
            self.insertion_sort(colliders);
        }

        self.active.clear();
        for &index in &self.order {
            let current = &colliders[index];
            let current_aabb = current.aabb();

            // Anything ending before this collider starts can never overlap again
            self.active
                .retain(|&other| colliders[other].aabb().max.x >= current_aabb.min.x);

            for &other_index in &self.active {
                let other = &colliders[other_index];
                if other.aabb().overlaps(current_aabb)
                    && filter.accepts(other.entity, current.entity, pairs)
                {
                    pairs.push(CollisionPair::new(other.entity, current.entity));
                }
            }

            self.active.push(index);
        }
    }
}
