//! FILENAME: src/subscription.rs
//! PURPOSE: A generic subscribe/notify primitive with RAII unsubscription.
//! CONTEXT: Used by the filter manager and the conditional-formatting engine
//! to let a host view re-render on cache invalidation without polling. Not
//! thread-safe by design — the engine runs on one thread and callbacks run
//! synchronously on the thread that triggered the invalidation.

use std::cell::RefCell;
use std::rc::Rc;

type ListenerId = u64;

struct Listener {
    id: ListenerId,
    /// Taken out during its own invocation so `notify()` never holds the
    /// `RefCell` borrow while a callback runs — a callback that drops its
    /// own `Unsubscribe` guard (or subscribes a new listener) needs to
    /// reach `inner.borrow_mut()` without hitting a re-entrant panic.
    callback: Option<Box<dyn FnMut()>>,
}

#[derive(Default)]
struct Inner {
    listeners: Vec<Listener>,
    next_id: ListenerId,
}

/// Publishes invalidation events to subscribed listeners.
#[derive(Clone)]
pub struct Publisher {
    inner: Rc<RefCell<Inner>>,
}

impl Publisher {
    pub fn new() -> Self {
        Publisher {
            inner: Rc::new(RefCell::new(Inner::default())),
        }
    }

    /// Registers `listener` to be called on every future `notify()`.
    /// Dropping the returned `Unsubscribe` guard removes it.
    pub fn subscribe(&mut self, listener: impl FnMut() + 'static) -> Unsubscribe {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.listeners.push(Listener {
            id,
            callback: Some(Box::new(listener)),
        });
        Unsubscribe {
            inner: self.inner.clone(),
            id,
        }
    }

    /// Calls every listener subscribed as of this call, in subscription
    /// order. A listener that unsubscribes itself (or subscribes a new
    /// one) from within its own callback does not panic and does not
    /// affect this notification — only the next one.
    pub fn notify(&self) {
        let ids: Vec<ListenerId> = self
            .inner
            .borrow()
            .listeners
            .iter()
            .map(|l| l.id)
            .collect();
        for id in ids {
            let callback = {
                let mut inner = self.inner.borrow_mut();
                match inner.listeners.iter_mut().find(|l| l.id == id) {
                    Some(listener) => listener.callback.take(),
                    None => None,
                }
            };
            let Some(mut callback) = callback else {
                continue;
            };
            callback();
            let mut inner = self.inner.borrow_mut();
            if let Some(listener) = inner.listeners.iter_mut().find(|l| l.id == id) {
                listener.callback = Some(callback);
            }
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }
}

impl Default for Publisher {
    fn default() -> Self {
        Self::new()
    }
}

/// Dropping this guard unsubscribes its listener from the `Publisher` it
/// came from.
pub struct Unsubscribe {
    inner: Rc<RefCell<Inner>>,
    id: ListenerId,
}

impl Drop for Unsubscribe {
    fn drop(&mut self) {
        let mut inner = self.inner.borrow_mut();
        inner.listeners.retain(|l| l.id != self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell as StdCell;

    #[test]
    fn test_notify_calls_subscribed_listeners() {
        let calls = Rc::new(StdCell::new(0));
        let calls_clone = calls.clone();

        let mut publisher = Publisher::new();
        let _guard = publisher.subscribe(move || calls_clone.set(calls_clone.get() + 1));
        publisher.notify();
        publisher.notify();
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_dropping_guard_unsubscribes() {
        let calls = Rc::new(StdCell::new(0));
        let calls_clone = calls.clone();

        let mut publisher = Publisher::new();
        let guard = publisher.subscribe(move || calls_clone.set(calls_clone.get() + 1));
        drop(guard);
        publisher.notify();
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_multiple_listeners_independent() {
        let mut publisher = Publisher::new();
        let a = Rc::new(StdCell::new(0));
        let b = Rc::new(StdCell::new(0));
        let a2 = a.clone();
        let b2 = b.clone();

        let guard_a = publisher.subscribe(move || a2.set(a2.get() + 1));
        let _guard_b = publisher.subscribe(move || b2.set(b2.get() + 1));

        drop(guard_a);
        publisher.notify();
        assert_eq!(a.get(), 0);
        assert_eq!(b.get(), 1);
    }

    #[test]
    fn test_unsubscribe_during_notify_does_not_panic_and_takes_effect_next_time() {
        use std::cell::RefCell as StdRefCell;

        let calls = Rc::new(StdCell::new(0));
        let calls_clone = calls.clone();
        let mut publisher = Publisher::new();
        let guard_slot: Rc<StdRefCell<Option<Unsubscribe>>> = Rc::new(StdRefCell::new(None));
        let guard_slot_clone = guard_slot.clone();

        let guard = publisher.subscribe(move || {
            calls_clone.set(calls_clone.get() + 1);
            // Drop our own guard from inside our own callback.
            guard_slot_clone.borrow_mut().take();
        });
        *guard_slot.borrow_mut() = Some(guard);

        publisher.notify();
        assert_eq!(calls.get(), 1, "listener still runs during the notify() that removes it");
        publisher.notify();
        assert_eq!(calls.get(), 1, "listener must not run again after unsubscribing");
    }
}
