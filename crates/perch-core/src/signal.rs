//! Observable boolean shared between the host and the indicator.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

type Subscriber = Rc<dyn Fn(bool)>;

struct Inner {
    value: Cell<bool>,
    next_id: Cell<u64>,
    subscribers: RefCell<Vec<(u64, Subscriber)>>,
}

/// Indicator visibility flag. Subscribers run synchronously on every change.
#[derive(Clone)]
pub struct VisibilitySignal {
    inner: Rc<Inner>,
}

impl VisibilitySignal {
    pub fn new(initial: bool) -> Self {
        Self {
            inner: Rc::new(Inner {
                value: Cell::new(initial),
                next_id: Cell::new(0),
                subscribers: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn get(&self) -> bool {
        self.inner.value.get()
    }

    /// Stores `value` and notifies subscribers. Returns `false` when nothing changed.
    pub fn set(&self, value: bool) -> bool {
        if self.inner.value.replace(value) == value {
            return false;
        }
        // Snapshot so subscribers may subscribe or drop subscriptions while notified.
        let subscribers: Vec<Subscriber> = self
            .inner
            .subscribers
            .borrow()
            .iter()
            .map(|(_, subscriber)| Rc::clone(subscriber))
            .collect();
        for subscriber in subscribers {
            subscriber(value);
        }
        true
    }

    pub fn subscribe(&self, subscriber: impl Fn(bool) + 'static) -> Subscription {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        let subscriber: Subscriber = Rc::new(subscriber);
        self.inner.subscribers.borrow_mut().push((id, subscriber));
        Subscription {
            signal: Rc::downgrade(&self.inner),
            id,
        }
    }
}

/// Unsubscribes on drop.
pub struct Subscription {
    signal: Weak<Inner>,
    id: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.signal.upgrade() {
            inner.subscribers.borrow_mut().retain(|(id, _)| *id != self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribers_see_changes_only() {
        let signal = VisibilitySignal::new(true);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let _subscription = signal.subscribe(move |value| sink.borrow_mut().push(value));

        assert!(!signal.set(true));
        assert!(signal.set(false));
        assert!(signal.set(true));
        assert_eq!(*seen.borrow(), vec![false, true]);
    }

    #[test]
    fn dropping_the_subscription_stops_notifications() {
        let signal = VisibilitySignal::new(false);
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let subscription = signal.subscribe(move |_| counter.set(counter.get() + 1));
        signal.set(true);
        drop(subscription);
        signal.set(false);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn clones_share_state() {
        let signal = VisibilitySignal::new(true);
        let host_side = signal.clone();
        host_side.set(false);
        assert!(!signal.get());
    }
}
