//! # Reactive State Container
//!
//! [`Store`] holds an immutable snapshot behind an `Arc` and replaces it
//! wholesale on every transition. Readers either hold an old snapshot or the
//! new one, never a half-applied update.
//!
//! Listeners receive `(current, previous)` for every transition, after the
//! new snapshot is visible. Transitions are serialized: listeners observe
//! them in the order they were applied. A listener may itself trigger a
//! transition on the same thread; the nested notification is delivered
//! before the outer one finishes.

use bridge_traits::platform::PlatformSendSync;
use parking_lot::{Mutex, ReentrantMutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Callback invoked with `(current, previous)` after each transition.
#[cfg(not(target_arch = "wasm32"))]
pub type Listener<S> = Arc<dyn Fn(&S, &S) + Send + Sync>;

/// Callback invoked with `(current, previous)` after each transition.
#[cfg(target_arch = "wasm32")]
pub type Listener<S> = Arc<dyn Fn(&S, &S)>;

#[cfg(not(target_arch = "wasm32"))]
type Unsubscribe = Box<dyn FnOnce() + Send>;

#[cfg(target_arch = "wasm32")]
type Unsubscribe = Box<dyn FnOnce()>;

struct StoreInner<S> {
    state: RwLock<Arc<S>>,
    listeners: RwLock<Vec<(u64, Listener<S>)>>,
    next_listener_id: AtomicU64,
    transition: ReentrantMutex<()>,
}

/// Shared handle to a state snapshot and its listeners.
pub struct Store<S> {
    inner: Arc<StoreInner<S>>,
}

impl<S> Clone for Store<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: PlatformSendSync + 'static> Store<S> {
    pub fn new(initial: S) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                state: RwLock::new(Arc::new(initial)),
                listeners: RwLock::new(Vec::new()),
                next_listener_id: AtomicU64::new(1),
                transition: ReentrantMutex::new(()),
            }),
        }
    }

    /// Current snapshot.
    pub fn get_state(&self) -> Arc<S> {
        Arc::clone(&self.inner.state.read())
    }

    /// Replace the whole state.
    pub fn set_state(&self, next: S) {
        self.try_update(|_| Some(next));
    }

    /// Derive the next state from the current one.
    pub fn update<F>(&self, reducer: F)
    where
        F: FnOnce(&S) -> S,
    {
        self.try_update(|state| Some(reducer(state)));
    }

    /// Like [`Store::update`], but the reducer may decline the transition by
    /// returning `None`. Listeners are only notified for applied transitions.
    ///
    /// The reducer runs under the state lock and must not touch this store.
    pub fn try_update<F>(&self, reducer: F) -> bool
    where
        F: FnOnce(&S) -> Option<S>,
    {
        let _transition = self.inner.transition.lock();

        let (current, previous) = {
            let mut state = self.inner.state.write();
            let Some(next) = reducer(&state) else {
                return false;
            };
            let next = Arc::new(next);
            let previous = std::mem::replace(&mut *state, Arc::clone(&next));
            (next, previous)
        };

        let listeners: Vec<Listener<S>> = self
            .inner
            .listeners
            .read()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in listeners {
            listener(&current, &previous);
        }
        true
    }

    /// Register a listener for every subsequent transition.
    pub fn subscribe(&self, listener: Listener<S>) -> Subscription {
        let id = self.inner.next_listener_id.fetch_add(1, Ordering::Relaxed);
        self.inner.listeners.write().push((id, listener));

        let weak: Weak<StoreInner<S>> = Arc::downgrade(&self.inner);
        Subscription::new(Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.listeners.write().retain(|(existing, _)| *existing != id);
            }
        }))
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.read().len()
    }
}

/// Handle returned by [`Store::subscribe`].
///
/// Dropping the handle keeps the listener registered; call
/// [`Subscription::unsubscribe`] to remove it.
pub struct Subscription {
    unsubscribe: Mutex<Option<Unsubscribe>>,
}

impl Subscription {
    fn new(unsubscribe: Unsubscribe) -> Self {
        Self {
            unsubscribe: Mutex::new(Some(unsubscribe)),
        }
    }

    /// Remove the listener. Returns `false` if it was already removed.
    pub fn unsubscribe(&self) -> bool {
        match self.unsubscribe.lock().take() {
            Some(unsubscribe) => {
                unsubscribe();
                true
            }
            None => false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.unsubscribe.lock().is_some()
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}
