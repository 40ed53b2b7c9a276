//! Named event bus.
//!
//! Handlers subscribe to an event name with an [`EventPriority`]; higher
//! priorities run first, subscription order breaks ties. Events reach the
//! handlers in one of three ways:
//!
//! - [`EventBus::publish`] runs the handlers right away
//! - [`EventSender::send`] (or [`EventBus::queue`]) puts the event on a
//!   `crossbeam_channel`; systems and scripts hold a sender and the host calls
//!   [`EventBus::dispatch`] once per frame
//! - [`EventBus::publish_delayed`] holds the event until enough frame time has
//!   passed, then queues it
//!
//! The first failing handler stops delivery of that event and the error is
//! returned. Events still waiting in the queue are kept for the next
//! dispatch.
//!
//! # Example
//! ```ignore
//! let mut bus = EventBus::new();
//! bus.subscribe("coin", EventPriority::Normal, |event| {
//!     log::info!("picked up {}", event.data["value"]);
//!     Ok(())
//! });
//! bus.sender().send(Event::new("coin", json!({ "value": 10 })));
//! bus.dispatch(0.016)?;
//! ```

use std::error::Error as StdError;

use crossbeam_channel::{Receiver, Sender, unbounded};
use log::{trace, warn};
use rustc_hash::FxHashMap;
use serde_json::Value;
use thiserror::Error;

/// Ordering key for handlers and for queued events.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventPriority {
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

/// A named event with a JSON payload.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    pub name: String,
    pub priority: EventPriority,
    pub data: Value,
}

impl Event {
    pub fn new(name: impl Into<String>, data: Value) -> Self {
        Self {
            name: name.into(),
            priority: EventPriority::Normal,
            data,
        }
    }

    pub fn with_priority(mut self, priority: EventPriority) -> Self {
        self.priority = priority;
        self
    }
}

pub type HandlerError = Box<dyn StdError + Send + Sync>;
pub type HandlerResult = Result<(), HandlerError>;

#[derive(Error, Debug)]
pub enum EventError {
    #[error("handler for `{event}` failed: {source}")]
    HandlerFailed {
        event: String,
        #[source]
        source: HandlerError,
    },
}

pub type EventResult<T> = Result<T, EventError>;

/// Handle returned by [`EventBus::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscriber {
    id: SubscriptionId,
    priority: EventPriority,
    handler: Box<dyn FnMut(&Event) -> HandlerResult>,
}

struct Delayed {
    remaining: f32,
    event: Event,
}

/// Cloneable, thread-safe handle that queues events for the next dispatch.
#[derive(Clone)]
pub struct EventSender {
    tx: Sender<Event>,
}

impl EventSender {
    /// Queue `event`. Returns `false` if the bus is gone.
    pub fn send(&self, event: Event) -> bool {
        if self.tx.send(event).is_err() {
            warn!("event bus disconnected, dropping event");
            return false;
        }
        true
    }
}

pub struct EventBus {
    handlers: FxHashMap<String, Vec<Subscriber>>,
    next_id: u64,
    tx: Sender<Event>,
    rx: Receiver<Event>,
    delayed: Vec<Delayed>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self {
            handlers: FxHashMap::default(),
            next_id: 0,
            tx,
            rx,
            delayed: Vec::new(),
        }
    }

    pub fn sender(&self) -> EventSender {
        EventSender { tx: self.tx.clone() }
    }

    /// Register `handler` for events called `name`.
    pub fn subscribe<F>(
        &mut self,
        name: impl Into<String>,
        priority: EventPriority,
        handler: F,
    ) -> SubscriptionId
    where
        F: FnMut(&Event) -> HandlerResult + 'static,
    {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        let subscribers = self.handlers.entry(name.into()).or_default();
        let at = subscribers
            .iter()
            .position(|s| s.priority < priority)
            .unwrap_or(subscribers.len());
        subscribers.insert(
            at,
            Subscriber {
                id,
                priority,
                handler: Box::new(handler),
            },
        );
        id
    }

    /// Remove a subscription. Returns `false` if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        for subscribers in self.handlers.values_mut() {
            if let Some(index) = subscribers.iter().position(|s| s.id == id) {
                subscribers.remove(index);
                return true;
            }
        }
        false
    }

    pub fn handler_count(&self, name: &str) -> usize {
        self.handlers.get(name).map_or(0, Vec::len)
    }

    /// Run every handler of `event` now. Returns how many ran.
    pub fn publish(&mut self, event: &Event) -> EventResult<usize> {
        let Some(subscribers) = self.handlers.get_mut(&event.name) else {
            trace!("no handlers for `{}`", event.name);
            return Ok(0);
        };
        for subscriber in subscribers.iter_mut() {
            (subscriber.handler)(event).map_err(|source| EventError::HandlerFailed {
                event: event.name.clone(),
                source,
            })?;
        }
        Ok(subscribers.len())
    }

    /// Queue `event` for the next [`dispatch`](Self::dispatch).
    pub fn queue(&self, event: Event) {
        // The bus owns a receiver, so this cannot disconnect.
        let _ = self.tx.send(event);
    }

    /// Queue `event` once `delay` seconds of dispatch time have passed.
    pub fn publish_delayed(&mut self, event: Event, delay: f32) {
        self.delayed.push(Delayed {
            remaining: delay.max(0.0),
            event,
        });
    }

    /// Seconds left for each delayed event called `name`, in publish order.
    pub fn pending_delays(&self, name: &str) -> Vec<f32> {
        self.delayed
            .iter()
            .filter(|d| d.event.name == name)
            .map(|d| d.remaining)
            .collect()
    }

    pub fn queued_len(&self) -> usize {
        self.rx.len()
    }

    /// Age delayed events by `dt`, then deliver everything queued so far.
    ///
    /// The batch runs in descending event priority, queue order among equals.
    /// Events queued by handlers wait for the next dispatch. Returns the
    /// number of events delivered.
    pub fn dispatch(&mut self, dt: f32) -> EventResult<usize> {
        let mut due = Vec::new();
        self.delayed.retain_mut(|d| {
            d.remaining -= dt;
            if d.remaining <= 0.0 {
                due.push(d.event.clone());
                false
            } else {
                true
            }
        });
        for event in due {
            self.queue(event);
        }

        let mut batch: Vec<Event> = self.rx.try_iter().take(self.rx.len()).collect();
        batch.sort_by(|a, b| b.priority.cmp(&a.priority));

        let mut delivered = 0;
        let mut pending = batch.into_iter();
        while let Some(event) = pending.next() {
            if let Err(err) = self.publish(&event) {
                for rest in pending {
                    self.queue(rest);
                }
                return Err(err);
            }
            delivered += 1;
        }
        Ok(delivered)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use serde_json::json;

    use super::*;

    fn recorder(
        bus: &mut EventBus,
        name: &str,
        label: &'static str,
        priority: EventPriority,
    ) -> Rc<RefCell<Vec<&'static str>>> {
        let seen: Rc<RefCell<Vec<&'static str>>> = Rc::default();
        let sink = Rc::clone(&seen);
        bus.subscribe(name, priority, move |_| {
            sink.borrow_mut().push(label);
            Ok(())
        });
        seen
    }

    #[test]
    fn handlers_run_by_priority_then_subscription_order() {
        let mut bus = EventBus::new();
        let order: Rc<RefCell<Vec<&'static str>>> = Rc::default();
        for (label, priority) in [
            ("normal-1", EventPriority::Normal),
            ("critical", EventPriority::Critical),
            ("low", EventPriority::Low),
            ("normal-2", EventPriority::Normal),
            ("high", EventPriority::High),
        ] {
            let sink = Rc::clone(&order);
            bus.subscribe("hit", priority, move |_| {
                sink.borrow_mut().push(label);
                Ok(())
            });
        }

        assert_eq!(bus.publish(&Event::new("hit", Value::Null)).unwrap(), 5);
        assert_eq!(
            *order.borrow(),
            vec!["critical", "high", "normal-1", "normal-2", "low"]
        );
    }

    #[test]
    fn failing_handler_stops_delivery() {
        let mut bus = EventBus::new();
        bus.subscribe("hit", EventPriority::High, |_| Err("shield down".into()));
        let later = recorder(&mut bus, "hit", "later", EventPriority::Low);

        let err = bus.publish(&Event::new("hit", Value::Null)).unwrap_err();
        assert_eq!(err.to_string(), "handler for `hit` failed: shield down");
        assert!(later.borrow().is_empty());
    }

    #[test]
    fn unsubscribe_removes_only_that_handler() {
        let mut bus = EventBus::new();
        let id = bus.subscribe("hit", EventPriority::Normal, |_| Ok(()));
        let kept = recorder(&mut bus, "hit", "kept", EventPriority::Normal);
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        assert_eq!(bus.handler_count("hit"), 1);
        bus.publish(&Event::new("hit", Value::Null)).unwrap();
        assert_eq!(*kept.borrow(), vec!["kept"]);
    }

    #[test]
    fn queued_events_wait_for_dispatch_in_priority_order() {
        let mut bus = EventBus::new();
        let names: Rc<RefCell<Vec<Value>>> = Rc::default();
        let sink = Rc::clone(&names);
        bus.subscribe("score", EventPriority::Normal, move |event| {
            sink.borrow_mut().push(event.data.clone());
            Ok(())
        });

        let sender = bus.sender();
        assert!(sender.send(Event::new("score", json!(1))));
        assert!(sender.send(Event::new("score", json!(2)).with_priority(EventPriority::High)));
        bus.queue(Event::new("score", json!(3)));
        assert!(names.borrow().is_empty());
        assert_eq!(bus.queued_len(), 3);

        assert_eq!(bus.dispatch(0.016).unwrap(), 3);
        assert_eq!(*names.borrow(), vec![json!(2), json!(1), json!(3)]);
        assert_eq!(bus.queued_len(), 0);
    }

    #[test]
    fn events_queued_by_handlers_wait_for_the_next_dispatch() {
        let mut bus = EventBus::new();
        let sender = bus.sender();
        bus.subscribe("ping", EventPriority::Normal, move |_| {
            sender.send(Event::new("pong", Value::Null));
            Ok(())
        });
        let pongs = recorder(&mut bus, "pong", "pong", EventPriority::Normal);

        bus.queue(Event::new("ping", Value::Null));
        assert_eq!(bus.dispatch(0.0).unwrap(), 1);
        assert!(pongs.borrow().is_empty());
        assert_eq!(bus.dispatch(0.0).unwrap(), 1);
        assert_eq!(*pongs.borrow(), vec!["pong"]);
    }

    #[test]
    fn failed_dispatch_keeps_the_rest_of_the_batch() {
        let mut bus = EventBus::new();
        bus.subscribe("bad", EventPriority::Normal, |_| Err("nope".into()));
        let good = recorder(&mut bus, "good", "good", EventPriority::Normal);

        bus.queue(Event::new("bad", Value::Null).with_priority(EventPriority::High));
        bus.queue(Event::new("good", Value::Null));
        assert!(bus.dispatch(0.0).is_err());
        assert!(good.borrow().is_empty());
        assert_eq!(bus.dispatch(0.0).unwrap(), 1);
        assert_eq!(*good.borrow(), vec!["good"]);
    }

    #[test]
    fn delayed_events_fire_after_their_delay() {
        let mut bus = EventBus::new();
        let fired = recorder(&mut bus, "spawn_wave", "wave", EventPriority::Normal);
        bus.publish_delayed(Event::new("spawn_wave", Value::Null), 1.0);

        bus.dispatch(0.5).unwrap();
        assert!(fired.borrow().is_empty());
        assert_eq!(bus.pending_delays("spawn_wave"), vec![0.5]);

        bus.dispatch(0.5).unwrap();
        assert_eq!(*fired.borrow(), vec!["wave"]);
        assert!(bus.pending_delays("spawn_wave").is_empty());
    }
}
