// Copyright 2025 the Quire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Composition change notifications.
//!
//! A composition owns a [`CompositionEvents`] hub. Each data-defined object
//! subscribes once and receives an [`EventSubscription`]: a queue the hub pushes
//! every emitted event into, in emission order. The owner drains the queue when
//! it handles events. Dropping the subscription unsubscribes; the hub forgets
//! dead queues on the next emit.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

/// A change in the composition that affects data-defined values.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CompositionEvent {
    /// Atlas generation was turned on or off.
    AtlasToggled {
        /// Whether the atlas is now enabled.
        enabled: bool,
    },
    /// The atlas coverage layer changed; field names and types may differ.
    CoverageLayerChanged,
    /// The atlas moved to another feature.
    FeatureChanged {
        /// Id of the new current feature, if any.
        feature_id: Option<i64>,
    },
    /// The composition asked every item to refresh.
    RefreshRequested,
}

impl CompositionEvent {
    /// Returns `true` if prepared expressions are stale after this event.
    ///
    /// Toggling the atlas or swapping its coverage layer changes the dataset
    /// expressions were prepared against.
    #[must_use]
    pub fn requires_prepare(self) -> bool {
        matches!(self, Self::AtlasToggled { .. } | Self::CoverageLayerChanged)
    }
}

type Queue = RefCell<VecDeque<CompositionEvent>>;

/// The event source a composition exposes to its items.
///
/// # Example
///
/// ```rust
/// use quire_data_defined::{CompositionEvent, CompositionEvents};
///
/// let events = CompositionEvents::new();
/// let subscription = events.subscribe();
///
/// events.emit(CompositionEvent::CoverageLayerChanged);
/// events.emit(CompositionEvent::RefreshRequested);
/// assert_eq!(
///     subscription.take_pending(),
///     [CompositionEvent::CoverageLayerChanged, CompositionEvent::RefreshRequested]
/// );
///
/// drop(subscription);
/// assert_eq!(events.emit(CompositionEvent::RefreshRequested), 0);
/// ```
#[derive(Debug, Default)]
pub struct CompositionEvents {
    subscribers: RefCell<Vec<Weak<Queue>>>,
}

impl CompositionEvents {
    /// Creates a hub with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes a new queue.
    #[must_use]
    pub fn subscribe(&self) -> EventSubscription {
        let queue = Rc::new(Queue::default());
        self.subscribers.borrow_mut().push(Rc::downgrade(&queue));
        EventSubscription { queue }
    }

    /// Delivers `event` to every live subscriber and returns how many received it.
    pub fn emit(&self, event: CompositionEvent) -> usize {
        let mut subscribers = self.subscribers.borrow_mut();
        subscribers.retain(|subscriber| subscriber.strong_count() > 0);
        for subscriber in subscribers.iter() {
            if let Some(queue) = subscriber.upgrade() {
                queue.borrow_mut().push_back(event);
            }
        }
        subscribers.len()
    }

    /// Returns the number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .borrow()
            .iter()
            .filter(|subscriber| subscriber.strong_count() > 0)
            .count()
    }
}

/// A subscriber's queue of undelivered events.
///
/// Dropping it unsubscribes.
#[derive(Debug)]
pub struct EventSubscription {
    queue: Rc<Queue>,
}

impl EventSubscription {
    /// Removes and returns every pending event, oldest first.
    #[must_use]
    pub fn take_pending(&self) -> Vec<CompositionEvent> {
        self.queue.borrow_mut().drain(..).collect()
    }

    /// Returns the number of pending events.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Returns `true` if no events are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }
}
