//! Typed event bus.
//!
//! Each event type gets its own queue, created by [`EventBus::register`].
//! Publishers push into the queue during a tick and consumers drain it whenever
//! they run.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;

/// Errors raised by [`EventBus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EventError {
    #[error("event type `{0}` was never registered")]
    Unregistered(&'static str),
}

/// A queue for events of a single type.
#[derive(Debug)]
pub struct EventQueue<T> {
    events: Vec<T>,
}

impl<T> EventQueue<T> {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn send(&mut self, event: T) {
        self.events.push(event);
    }

    pub fn as_slice(&self) -> &[T] {
        &self.events
    }

    pub fn drain(&mut self) -> std::vec::Drain<'_, T> {
        self.events.drain(..)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl<T> Default for EventQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Object-safe view of a queue so the bus can clear every channel at once.
trait Channel: Any {
    fn clear(&mut self);
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: 'static> Channel for EventQueue<T> {
    fn clear(&mut self) {
        EventQueue::clear(self);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Registry of event queues keyed by event type.
#[derive(Default)]
pub struct EventBus {
    channels: HashMap<TypeId, Box<dyn Channel>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the queue for `T`. Registering twice keeps the existing queue.
    pub fn register<T: 'static>(&mut self) {
        self.channels
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(EventQueue::<T>::new()));
    }

    pub fn is_registered<T: 'static>(&self) -> bool {
        self.channels.contains_key(&TypeId::of::<T>())
    }

    pub fn publish<T: 'static>(&mut self, event: T) -> Result<(), EventError> {
        self.queue_mut::<T>()?.send(event);
        Ok(())
    }

    /// Events of type `T` published since the last drain.
    pub fn read<T: 'static>(&self) -> Result<&[T], EventError> {
        Ok(self.queue::<T>()?.as_slice())
    }

    /// Take all pending events of type `T`.
    pub fn drain<T: 'static>(&mut self) -> Result<Vec<T>, EventError> {
        Ok(self.queue_mut::<T>()?.drain().collect())
    }

    /// Drop pending events of every type.
    pub fn clear(&mut self) {
        for channel in self.channels.values_mut() {
            channel.clear();
        }
    }

    fn queue<T: 'static>(&self) -> Result<&EventQueue<T>, EventError> {
        self.channels
            .get(&TypeId::of::<T>())
            .and_then(|c| c.as_any().downcast_ref::<EventQueue<T>>())
            .ok_or(EventError::Unregistered(type_name::<T>()))
    }

    fn queue_mut<T: 'static>(&mut self) -> Result<&mut EventQueue<T>, EventError> {
        self.channels
            .get_mut(&TypeId::of::<T>())
            .and_then(|c| c.as_any_mut().downcast_mut::<EventQueue<T>>())
            .ok_or(EventError::Unregistered(type_name::<T>()))
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("channels", &self.channels.len())
            .finish()
    }
}
