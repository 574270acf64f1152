// SPDX-License-Identifier: MIT OR Apache-2.0
//! Value-change subscriptions.
//!
//! Handlers run on the thread that ticks the sequencer, once per tick. A
//! handler may cancel any subscription (its own included) while running;
//! cancelled handlers are not invoked again, even later in the same tick.

use crate::binding::PropertyKey;
use crate::value::ValueSet;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Identifier of a registered handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Handler = Rc<RefCell<dyn FnMut(&ValueSet)>>;

struct Entry {
    id: SubscriptionId,
    /// Properties of interest, all when `None`
    keys: Option<Rc<[PropertyKey]>>,
    handler: Handler,
}

/// Handler registry shared between a sequencer and its handles
#[derive(Default)]
pub(crate) struct Subscribers {
    next_id: u64,
    entries: Vec<Entry>,
}

pub(crate) type SharedSubscribers = Rc<RefCell<Subscribers>>;

impl Subscribers {
    pub(crate) fn add(
        registry: &SharedSubscribers,
        keys: Option<Vec<PropertyKey>>,
        handler: impl FnMut(&ValueSet) + 'static,
    ) -> Subscription {
        let mut subscribers = registry.borrow_mut();
        subscribers.next_id += 1;
        let id = SubscriptionId(subscribers.next_id);
        subscribers.entries.push(Entry {
            id,
            keys: keys.map(Rc::from),
            handler: Rc::new(RefCell::new(handler)),
        });
        Subscription {
            id,
            registry: Rc::downgrade(registry),
        }
    }

    pub(crate) fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    pub(crate) fn contains(&self, id: SubscriptionId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Invoke every handler with the values it asked for
    pub(crate) fn notify(registry: &SharedSubscribers, values: &ValueSet) {
        let snapshot: Vec<(SubscriptionId, Option<Rc<[PropertyKey]>>, Handler)> = registry
            .borrow()
            .entries
            .iter()
            .map(|e| (e.id, e.keys.clone(), Rc::clone(&e.handler)))
            .collect();

        for (id, keys, handler) in snapshot {
            if !registry.borrow().contains(id) {
                continue;
            }
            let filtered;
            let view = match &keys {
                Some(keys) => {
                    filtered = values.subset(keys.iter());
                    if filtered.is_empty() {
                        continue;
                    }
                    &filtered
                }
                None => values,
            };
            match handler.try_borrow_mut() {
                Ok(mut handler) => (&mut *handler)(view),
                Err(_) => tracing::warn!("Skipping re-entrant value handler {:?}", id),
            }
        }
    }
}

/// Cancellation handle returned by `subscribe`
///
/// Dropping the handle keeps the handler registered; call
/// [`Subscription::cancel`] to remove it.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    registry: Weak<RefCell<Subscribers>>,
}

impl Subscription {
    /// Subscription ID
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Whether the handler is still registered
    pub fn is_active(&self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|registry| registry.borrow().contains(self.id))
    }

    /// Remove the handler; returns whether it was still registered
    pub fn cancel(&self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|registry| registry.borrow_mut().remove(self.id))
    }
}
