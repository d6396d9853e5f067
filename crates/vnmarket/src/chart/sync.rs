//! In-process event fan-out used to keep panes in lockstep.
//!
//! A [`Broadcaster`] delivers each published event to every live listener.
//! Listeners are removed when their [`Subscription`] is dropped, so a
//! renderer that owns its subscriptions cannot leak them.
//!
//! A publish made from inside a listener, on the thread that is running the
//! dispatch, is suppressed. A pane that re-emits its range after being
//! updated by a sibling therefore cannot start a feedback loop. Other threads
//! may publish concurrently; their events are delivered.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::thread::{self, ThreadId};

use super::surface::{PaneKind, VisibleRange};

type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Inner<E> {
    listeners: Mutex<Vec<(u64, Listener<E>)>>,
    next_id: AtomicU64,
    /// Threads currently inside `publish`
    dispatching: Mutex<Vec<ThreadId>>,
}

pub struct Broadcaster<E> {
    inner: Arc<Inner<E>>,
}

impl<E> Clone for Broadcaster<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E> Default for Broadcaster<E> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Inner {
                listeners: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(0),
                dispatching: Mutex::new(Vec::new()),
            }),
        }
    }
}

impl<E> fmt::Debug for Broadcaster<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Broadcaster")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl<E> Broadcaster<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.inner.listeners).len()
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&E) + Send + Sync + 'static,
        E: 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        lock(&self.inner.listeners).push((id, Arc::new(listener)));

        let weak: Weak<Inner<E>> = Arc::downgrade(&self.inner);
        Subscription {
            cancel: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    lock(&inner.listeners).retain(|(other, _)| *other != id);
                }
            })),
        }
    }

    /// Deliver `event` to every listener. Returns `false` when the event was
    /// dropped because this thread is already dispatching on this broadcaster.
    pub fn publish(&self, event: &E) -> bool {
        let current = thread::current().id();
        {
            let mut active = lock(&self.inner.dispatching);
            if active.contains(&current) {
                tracing::trace!("suppressed re-entrant publish");
                return false;
            }
            active.push(current);
        }
        let _dispatch = DispatchGuard {
            active: &self.inner.dispatching,
            thread: current,
        };

        // Snapshot so listeners may subscribe or unsubscribe while running
        let listeners: Vec<Listener<E>> = lock(&self.inner.listeners)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in listeners {
            listener(event);
        }
        true
    }
}

struct DispatchGuard<'a> {
    active: &'a Mutex<Vec<ThreadId>>,
    thread: ThreadId,
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        lock(self.active).retain(|t| *t != self.thread);
    }
}

/// Removes its listener when dropped
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// A pane reporting that its visible range moved
#[derive(Debug, Clone, PartialEq)]
pub struct RangeChange {
    pub origin: PaneKind,
    pub range: VisibleRange,
}

/// Handle a surface uses to report range changes on its own pane
#[derive(Debug, Clone)]
pub struct RangeEmitter {
    bus: Broadcaster<RangeChange>,
    pane: PaneKind,
}

impl RangeEmitter {
    pub fn new(bus: Broadcaster<RangeChange>, pane: PaneKind) -> Self {
        Self { bus, pane }
    }

    pub fn pane(&self) -> PaneKind {
        self.pane
    }

    pub fn emit(&self, range: VisibleRange) -> bool {
        self.bus.publish(&RangeChange {
            origin: self.pane,
            range,
        })
    }
}

/// Window resize notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportEvent {
    Resized,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::surface::LogicalRange;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_subscription_drop_unsubscribes() {
        let bus: Broadcaster<u32> = Broadcaster::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&hits);
        let sub = bus.subscribe(move |n| {
            counter.fetch_add(*n as usize, Ordering::SeqCst);
        });
        assert_eq!(bus.listener_count(), 1);
        assert!(bus.publish(&2));

        drop(sub);
        assert_eq!(bus.listener_count(), 0);
        assert!(bus.publish(&5));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_explicit_unsubscribe() {
        let bus: Broadcaster<()> = Broadcaster::new();
        let a = bus.subscribe(|()| {});
        let _b = bus.subscribe(|()| {});
        a.unsubscribe();
        assert_eq!(bus.listener_count(), 1);
    }

    #[test]
    fn test_nested_publish_is_suppressed() {
        let bus: Broadcaster<u32> = Broadcaster::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let echo = bus.clone();
        let counter = Arc::clone(&hits);
        let _sub = bus.subscribe(move |n| {
            counter.fetch_add(1, Ordering::SeqCst);
            // would recurse forever without the guard
            assert!(!echo.publish(&(n + 1)));
        });

        assert!(bus.publish(&0));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        // guard resets after the dispatch
        assert!(bus.publish(&0));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_publish_from_another_thread_during_dispatch() {
        let bus: Broadcaster<u32> = Broadcaster::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let other = bus.clone();
        let sink = Arc::clone(&seen);
        let _sub = bus.subscribe(move |n: &u32| {
            sink.lock().unwrap().push(*n);
            if *n == 0 {
                let publisher = other.clone();
                let delivered = thread::spawn(move || publisher.publish(&1)).join().unwrap();
                assert!(delivered);
            }
        });

        assert!(bus.publish(&0));
        assert_eq!(*seen.lock().unwrap(), vec![0, 1]);
    }

    #[test]
    fn test_subscription_outliving_broadcaster() {
        let bus: Broadcaster<u8> = Broadcaster::new();
        let sub = bus.subscribe(|_| {});
        drop(bus);
        drop(sub);
    }

    #[test]
    fn test_emitter_tags_origin() {
        let bus: Broadcaster<RangeChange> = Broadcaster::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = bus.subscribe(move |change: &RangeChange| {
            sink.lock().unwrap().push(change.origin);
        });

        let emitter = RangeEmitter::new(bus.clone(), PaneKind::Volume);
        emitter.emit(VisibleRange::Logical(LogicalRange::new(0.0, 5.0)));
        assert_eq!(*seen.lock().unwrap(), vec![PaneKind::Volume]);
    }
}
