//! Collision begin/end events.

use std::collections::BTreeMap;

use crate::ecs::EntityId;
use crate::event::{EventBus, EventError};

use super::contact::{Contact, PairKey};

/// Published on the first tick two colliders touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CollisionBeginEvent {
    pub a: EntityId,
    pub b: EntityId,
}

/// Published on the first tick two previously touching colliders no longer touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CollisionEndEvent {
    pub a: EntityId,
    pub b: EntityId,
}

/// Register both event types on `bus`.
pub fn register_events(bus: &mut EventBus) {
    bus.register::<CollisionBeginEvent>();
    bus.register::<CollisionEndEvent>();
}

/// Active contact set carried across ticks.
///
/// Keyed on the entity pair only, so contact geometry changing from tick to tick
/// does not produce spurious events. The orientation seen when the contact began
/// is kept and reused for the matching end event.
#[derive(Debug, Default, Clone)]
pub struct ContactTracker {
    active: BTreeMap<PairKey, (EntityId, EntityId)>,
}

impl ContactTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Diff `contacts` against the active set and publish the edges.
    ///
    /// Returns the number of begin and end events published.
    pub fn update(
        &mut self,
        contacts: &[Contact],
        bus: &mut EventBus,
    ) -> Result<(usize, usize), EventError> {
        let mut current = BTreeMap::new();
        let mut begun = 0;

        for contact in contacts {
            let key = contact.key();
            if current.contains_key(&key) {
                continue;
            }
            let oriented = match self.active.remove(&key) {
                Some(oriented) => oriented,
                None => {
                    bus.publish(CollisionBeginEvent {
                        a: contact.a,
                        b: contact.b,
                    })?;
                    begun += 1;
                    (contact.a, contact.b)
                }
            };
            current.insert(key, oriented);
        }

        // Whatever is left was not refreshed this tick
        let ended = self.active.len();
        for (a, b) in self.active.values() {
            bus.publish(CollisionEndEvent { a: *a, b: *b })?;
        }

        self.active = current;
        Ok((begun, ended))
    }

    pub fn contains(&self, a: EntityId, b: EntityId) -> bool {
        self.active.contains_key(&PairKey::new(a, b))
    }

    /// Currently touching pairs, in key order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, EntityId)> + '_ {
        self.active.values().copied()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn clear(&mut self) {
        self.active.clear();
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;

    fn contact(a: u64, b: u64, penetration: f32) -> Contact {
        Contact {
            a: EntityId::from_raw(a),
            b: EntityId::from_raw(b),
            normal: Vec2::X,
            point_on_a: Vec2::new(penetration, 0.0),
            point_on_b: Vec2::ZERO,
            penetration,
        }
    }

    fn bus() -> EventBus {
        let mut bus = EventBus::new();
        register_events(&mut bus);
        bus
    }

    #[test]
    fn test_begin_and_end_fire_once() {
        let mut bus = bus();
        let mut tracker = ContactTracker::new();

        // Tick 0: apart
        tracker.update(&[], &mut bus).unwrap();
        assert!(bus.drain::<CollisionBeginEvent>().unwrap().is_empty());

        // Tick 1..=3: touching with jittering geometry
        for (tick, depth) in [0.10, 0.12, 0.08].into_iter().enumerate() {
            tracker.update(&[contact(1, 2, depth)], &mut bus).unwrap();
            let begins = bus.drain::<CollisionBeginEvent>().unwrap();
            if tick == 0 {
                assert_eq!(
                    begins,
                    vec![CollisionBeginEvent {
                        a: EntityId::from_raw(1),
                        b: EntityId::from_raw(2)
                    }]
                );
            } else {
                assert!(begins.is_empty(), "begin repeated on tick {tick}");
            }
            assert!(bus.drain::<CollisionEndEvent>().unwrap().is_empty());
        }

        // Tick 4: separated
        tracker.update(&[], &mut bus).unwrap();
        assert_eq!(
            bus.drain::<CollisionEndEvent>().unwrap(),
            vec![CollisionEndEvent {
                a: EntityId::from_raw(1),
                b: EntityId::from_raw(2)
            }]
        );

        // Tick 5: still separated
        tracker.update(&[], &mut bus).unwrap();
        assert!(bus.drain::<CollisionEndEvent>().unwrap().is_empty());
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_reversed_orientation_is_same_contact() {
        let mut bus = bus();
        let mut tracker = ContactTracker::new();

        assert_eq!(
            tracker.update(&[contact(4, 3, 0.1)], &mut bus).unwrap(),
            (1, 0)
        );
        assert_eq!(
            tracker.update(&[contact(3, 4, 0.1)], &mut bus).unwrap(),
            (0, 0)
        );
        assert!(tracker.contains(EntityId::from_raw(3), EntityId::from_raw(4)));

        tracker.update(&[], &mut bus).unwrap();
        // End keeps the orientation the contact began with
        assert_eq!(
            bus.read::<CollisionEndEvent>().unwrap(),
            &[CollisionEndEvent {
                a: EntityId::from_raw(4),
                b: EntityId::from_raw(3)
            }]
        );
    }

    #[test]
    fn test_independent_pairs() {
        let mut bus = bus();
        let mut tracker = ContactTracker::new();

        tracker
            .update(&[contact(1, 2, 0.1), contact(2, 3, 0.1)], &mut bus)
            .unwrap();
        let counts = tracker
            .update(&[contact(2, 3, 0.1), contact(5, 6, 0.1)], &mut bus)
            .unwrap();

        assert_eq!(counts, (1, 1));
        assert_eq!(tracker.len(), 2);
        assert_eq!(bus.read::<CollisionBeginEvent>().unwrap().len(), 3);
    }

    #[test]
    fn test_unregistered_bus_errors() {
        let mut bus = EventBus::new();
        let mut tracker = ContactTracker::new();
        assert!(tracker.update(&[contact(1, 2, 0.1)], &mut bus).is_err());
    }
}
