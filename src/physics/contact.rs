//! Contact data structures for collision response.

use glam::Vec2;

use crate::ecs::EntityId;

/// Unordered entity pair, stored smaller id first.
///
/// Used wherever a pair must compare equal regardless of orientation: pair
/// deduplication in the broadphase and the active-contact set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PairKey(EntityId, EntityId);

impl PairKey {
    pub fn new(a: EntityId, b: EntityId) -> Self {
        if a <= b {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }

    pub fn first(&self) -> EntityId {
        self.0
    }

    pub fn second(&self) -> EntityId {
        self.1
    }
}

/// Candidate pair produced by a broadphase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CollisionPair {
    pub a: EntityId,
    pub b: EntityId,
}

impl CollisionPair {
    pub fn new(a: EntityId, b: EntityId) -> Self {
        Self { a, b }
    }

    pub fn key(&self) -> PairKey {
        PairKey::new(self.a, self.b)
    }
}

/// Narrowphase result for two overlapping colliders.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub a: EntityId,
    pub b: EntityId,
    /// Contact normal (from A to B).
    pub normal: Vec2,
    /// Deepest point of A inside B, on A's surface.
    pub point_on_a: Vec2,
    /// Deepest point of B inside A, on B's surface.
    pub point_on_b: Vec2,
    /// Penetration depth along `normal`.
    pub penetration: f32,
}

impl Contact {
    pub fn key(&self) -> PairKey {
        PairKey::new(self.a, self.b)
    }

    /// Same contact seen from B.
    pub fn flipped(&self) -> Self {
        Self {
            a: self.b,
            b: self.a,
            normal: -self.normal,
            point_on_a: self.point_on_b,
            point_on_b: self.point_on_a,
            penetration: self.penetration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_key_is_orientation_free() {
        let a = EntityId::from_raw(3);
        let b = EntityId::from_raw(9);
        assert_eq!(PairKey::new(a, b), PairKey::new(b, a));
        assert_eq!(PairKey::new(b, a).first(), a);
        assert_eq!(CollisionPair::new(b, a).key(), CollisionPair::new(a, b).key());
    }

    #[test]
    fn test_flipped_contact() {
        let contact = Contact {
            a: EntityId::from_raw(1),
            b: EntityId::from_raw(2),
            normal: Vec2::X,
            point_on_a: Vec2::new(1.0, 0.0),
            point_on_b: Vec2::new(0.8, 0.0),
            penetration: 0.2,
        };
        let flipped = contact.flipped();
        assert_eq!(flipped.a, contact.b);
        assert_eq!(flipped.normal, -Vec2::X);
        assert_eq!(flipped.point_on_a, contact.point_on_b);
        assert_eq!(flipped.key(), contact.key());
    }
}
