// events.rs - Queued, type-keyed event delivery
//
// Publishing only enqueues. `EventBus::flush` delivers the batch that was
// queued when it started, so anything published from inside a handler waits
// for the next flush.

use std::any::{type_name, Any, TypeId};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use tracing::{debug, trace};

type Handler = Box<dyn FnMut(&dyn Any, &mut EventQueue) + Send>;

/// Identifies one registered handler; pass it back to
/// [`EventBus::unsubscribe`] to remove it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription {
    event: TypeId,
    id: u64,
}

struct QueuedEvent {
    event: TypeId,
    name: &'static str,
    payload: Box<dyn Any + Send>,
}

/// FIFO of events awaiting delivery.
///
/// Handlers receive the bus's queue so they can publish follow-up events.
#[derive(Default)]
pub struct EventQueue {
    events: VecDeque<QueuedEvent>,
}

impl EventQueue {
    pub fn publish<E: Any + Send>(&mut self, event: E) {
        self.events.push_back(QueuedEvent {
            event: TypeId::of::<E>(),
            name: type_name::<E>(),
            payload: Box::new(event),
        });
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl fmt::Debug for EventQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.events.iter().map(|queued| queued.name))
            .finish()
    }
}

/// Publish/subscribe bus keyed by the event's Rust type.
///
/// Handlers for one type run in subscription order; events are delivered in
/// publish order. Events nobody subscribed to are dropped on flush.
#[derive(Default)]
pub struct EventBus {
    handlers: HashMap<TypeId, Vec<(u64, Handler)>>,
    queue: EventQueue,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<E, F>(&mut self, mut handler: F) -> Subscription
    where
        E: Any + Send,
        F: FnMut(&E, &mut EventQueue) + Send + 'static,
    {
        let event = TypeId::of::<E>();
        let id = self.next_id;
        self.next_id += 1;

        let erased: Handler = Box::new(move |payload, queue| {
            if let Some(event) = payload.downcast_ref::<E>() {
                handler(event, queue);
            }
        });
        self.handlers.entry(event).or_default().push((id, erased));
        trace!(event = type_name::<E>(), id, "subscribed");

        Subscription { event, id }
    }

    /// Returns `false` if the subscription was not registered.
    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        let Some(list) = self.handlers.get_mut(&subscription.event) else {
            return false;
        };
        let Some(position) = list.iter().position(|(id, _)| *id == subscription.id) else {
            return false;
        };
        // `remove`, not `swap_remove`: the rest keep their invocation order.
        list.remove(position);
        if list.is_empty() {
            self.handlers.remove(&subscription.event);
        }
        true
    }

    /// Queue an event for the next flush.
    pub fn publish<E: Any + Send>(&mut self, event: E) {
        self.queue.publish(event);
    }

    /// Events waiting for the next flush.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn handler_count<E: Any>(&self) -> usize {
        self.handlers.get(&TypeId::of::<E>()).map_or(0, Vec::len)
    }

    /// Deliver every event queued before this call. Returns the number of
    /// handler invocations.
    pub fn flush(&mut self) -> usize {
        let batch = std::mem::take(&mut self.queue.events);
        if batch.is_empty() {
            return 0;
        }

        let delivered = batch.len();
        let mut invocations = 0;
        for queued in batch {
            let Some(list) = self.handlers.get_mut(&queued.event) else {
                trace!(event = queued.name, "no subscribers, dropping");
                continue;
            };
            for (_, handler) in list.iter_mut() {
                handler(queued.payload.as_ref(), &mut self.queue);
                invocations += 1;
            }
        }

        debug!(
            delivered,
            invocations,
            deferred = self.queue.len(),
            "flushed event bus"
        );
        invocations
    }

    /// Drop queued events without delivering them.
    pub fn clear_pending(&mut self) {
        self.queue.events.clear();
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("event_types", &self.handlers.len())
            .field("pending", &self.queue)
            .finish()
    }
}
