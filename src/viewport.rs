use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use tracing::trace;

#[derive(Debug, Default)]
struct Listeners {
    width: usize,
    next_id: u64,
    mailboxes: HashMap<u64, Rc<Cell<Option<usize>>>>,
}

/// Fan-out of terminal width changes to mounted tables.
///
/// The event loop publishes every resize; each table holds a
/// [`ResizeSubscription`] and picks up the latest width when it next
/// handles a message.
#[derive(Debug, Clone, Default)]
pub struct ResizeEvents {
    inner: Rc<RefCell<Listeners>>,
}

impl ResizeEvents {
    pub fn new(width: usize) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Listeners {
                width,
                ..Default::default()
            })),
        }
    }

    pub fn width(&self) -> usize {
        self.inner.borrow().width
    }

    pub fn listener_count(&self) -> usize {
        self.inner.borrow().mailboxes.len()
    }

    pub fn publish(&self, width: usize) {
        let mut inner = self.inner.borrow_mut();
        inner.width = width;
        for mailbox in inner.mailboxes.values() {
            mailbox.set(Some(width));
        }
        trace!("Published width {width} to {} listeners", inner.mailboxes.len());
    }

    /// Register a listener. It is removed when the subscription is dropped.
    pub fn subscribe(&self) -> ResizeSubscription {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        let mailbox = Rc::new(Cell::new(None));
        inner.mailboxes.insert(id, Rc::clone(&mailbox));
        trace!("Resize listener {id} subscribed");

        ResizeSubscription {
            id,
            initial_width: inner.width,
            mailbox,
            events: Rc::downgrade(&self.inner),
        }
    }
}

/// Registration in a [`ResizeEvents`] hub, released exactly once on drop.
#[derive(Debug)]
pub struct ResizeSubscription {
    id: u64,
    initial_width: usize,
    mailbox: Rc<Cell<Option<usize>>>,
    events: Weak<RefCell<Listeners>>,
}

impl ResizeSubscription {
    /// Width sampled when the subscription was taken.
    pub fn initial_width(&self) -> usize {
        self.initial_width
    }

    /// Latest width published since the previous call, if any.
    pub fn take(&self) -> Option<usize> {
        self.mailbox.take()
    }
}

impl Drop for ResizeSubscription {
    fn drop(&mut self) {
        // The hub may already be gone, then there is nothing to release
        if let Some(events) = self.events.upgrade() {
            events.borrow_mut().mailboxes.remove(&self.id);
            trace!("Resize listener {} released", self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscription_samples_width_and_receives_updates() {
        let events = ResizeEvents::new(120);
        let sub = events.subscribe();
        assert_eq!(sub.initial_width(), 120);
        assert_eq!(sub.take(), None);

        events.publish(80);
        events.publish(90);
        assert_eq!(sub.take(), Some(90));
        assert_eq!(sub.take(), None);
        assert_eq!(events.width(), 90);
    }

    #[test]
    fn dropping_releases_the_listener() {
        let events = ResizeEvents::new(80);
        let first = events.subscribe();
        let second = events.subscribe();
        assert_eq!(events.listener_count(), 2);
        drop(first);
        assert_eq!(events.listener_count(), 1);
        drop(second);
        assert_eq!(events.listener_count(), 0);
    }

    #[test]
    fn subscription_outliving_the_hub() {
        let events = ResizeEvents::new(80);
        let sub = events.subscribe();
        drop(events);
        assert_eq!(sub.take(), None);
        drop(sub);
    }
}
