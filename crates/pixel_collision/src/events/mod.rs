//! Collision events and contact listeners
//!
//! Key principles (Game Engine Architecture Ch 16.8):
//! - The host dispatcher delivers lifecycle and motion events synchronously
//! - Handler returns bool (true = consumed, stops forwarding)
//! - Queuing support: events can be collected during a tick and delivered
//!   in order afterwards

use crate::ecs::{Entity, ViewId};
use crate::physics::contact::Contact;
use std::collections::HashSet;

/// Entities whose transform changed during the current tick
///
/// Keeps first-seen order and ignores duplicates; that order is the order
/// contacts are computed and resolved in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoveBatch {
    entities: Vec<Entity>,
    seen: HashSet<Entity>,
}

impl MoveBatch {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a moved entity; returns false if it was already in the batch
    pub fn push(&mut self, entity: Entity) -> bool {
        if self.seen.insert(entity) {
            self.entities.push(entity);
            true
        } else {
            false
        }
    }

    /// Moved entities in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.iter().copied()
    }

    /// Number of moved entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// True when nothing moved
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl FromIterator<Entity> for MoveBatch {
    fn from_iter<I: IntoIterator<Item = Entity>>(iter: I) -> Self {
        let mut batch = Self::new();
        for entity in iter {
            batch.push(entity);
        }
        batch
    }
}

/// Notifications the collision engine reacts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollisionEvent {
    /// Entity became active in its view/layer
    EntityActivated(Entity),
    /// Entity was deactivated or destroyed
    EntityDeactivated(Entity),
    /// Entities moved this tick
    Moved(MoveBatch),
    /// A view and all its layers were deleted
    ViewDeleted(ViewId),
}

/// FIFO of collision events collected during a tick
#[derive(Debug, Default)]
pub struct EventQueue {
    pending: Vec<CollisionEvent>,
}

impl EventQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an event for the next dispatch
    pub fn send(&mut self, event: CollisionEvent) {
        self.pending.push(event);
    }

    /// Take every queued event, oldest first
    pub fn drain(&mut self) -> Vec<CollisionEvent> {
        std::mem::take(&mut self.pending)
    }

    /// Number of queued events
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// True when nothing is queued
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Listener for scripted reactions to contacts
/// Returns true if the contact was consumed (stops forwarding)
pub trait CollisionHandler {
    /// Handle a contact, return true if consumed
    fn on_contact(&mut self, contact: &Contact) -> bool;
}

/// Ordered list of contact listeners
/// Follows chain of responsibility pattern
#[derive(Default)]
pub struct ContactDispatcher {
    handlers: Vec<Box<dyn CollisionHandler>>,
}

impl ContactDispatcher {
    /// Create a dispatcher without listeners
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener; listeners are called in registration order
    pub fn register_handler(&mut self, handler: Box<dyn CollisionHandler>) {
        self.handlers.push(handler);
    }

    /// Forward a contact until a listener consumes it
    pub fn dispatch(&mut self, contact: &Contact) {
        for handler in &mut self.handlers {
            if handler.on_contact(contact) {
                break;
            }
        }
    }

    /// Number of registered listeners
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}
