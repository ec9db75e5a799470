//! Surface-local state store with synchronous change notification

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use bitflags::Flags;

use crate::slice::{Patch, StateTree};
use crate::Action;

/// Notification delivered to store listeners after every effective update.
///
/// All listeners notified for one update receive the same snapshot.
pub struct StateChange<S: StateTree> {
    /// State after the update.
    pub snapshot: Rc<S>,
    /// Slices touched by the update.
    pub changed: S::Changes,
    /// Name of the action that caused the update, if it came from a dispatch.
    pub cause: Option<&'static str>,
}

impl<S: StateTree> StateChange<S> {
    /// Whether any of the given slices changed.
    pub fn touches(&self, slices: S::Changes) -> bool {
        self.changed.intersects(slices)
    }
}

impl<S: StateTree> fmt::Debug for StateChange<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateChange")
            .field("changed", &self.changed)
            .field("cause", &self.cause)
            .finish()
    }
}

struct ListenerEntry<S: StateTree> {
    id: u64,
    active: Cell<bool>,
    callback: Box<dyn Fn(&StateChange<S>)>,
}

struct Inner<S: StateTree> {
    snapshot: RefCell<Rc<S>>,
    listeners: RefCell<Vec<Rc<ListenerEntry<S>>>>,
    next_id: Cell<u64>,
}

/// Centralized state container for one UI surface.
///
/// `Store` is a cheap, clonable, single-threaded handle: every clone refers to
/// the same tree. It lives on the surface thread; remote calls report back
/// through the runtime's action channel instead of touching the store.
///
/// Listeners run synchronously inside [`set_state`](Self::set_state), in
/// registration order, and may themselves call `set_state`. No borrow is held
/// while listeners run, so nested updates are applied and delivered
/// immediately; [`state`](Self::state) always returns the latest snapshot.
///
/// # Example
/// ```ignore
/// let store = Store::new(PanelTree::default());
///
/// let handle = store.add_listener(|change| {
///     if change.touches(PanelSlices::WALLET) {
///         render_wallet(&change.snapshot.wallet);
///     }
/// });
///
/// store.set_state(merge(WalletStatePatch {
///     is_wallet_locked: Some(false),
///     ..Default::default()
/// }));
///
/// handle.unsubscribe();
/// ```
pub struct Store<S: StateTree> {
    inner: Rc<Inner<S>>,
}

impl<S: StateTree> Clone for Store<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S: StateTree> fmt::Debug for Store<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.inner.snapshot.borrow())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl<S: StateTree> Default for Store<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

impl<S: StateTree> Store<S> {
    /// Create a store holding the given tree.
    pub fn new(state: S) -> Self {
        Self {
            inner: Rc::new(Inner {
                snapshot: RefCell::new(Rc::new(state)),
                listeners: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
            }),
        }
    }

    /// Current immutable snapshot.
    ///
    /// Snapshots are copy-on-write: holding one never observes later updates.
    pub fn state(&self) -> Rc<S> {
        Rc::clone(&self.inner.snapshot.borrow())
    }

    /// Register a listener, returning the handle that removes it.
    pub fn add_listener<F>(&self, callback: F) -> ListenerHandle
    where
        F: Fn(&StateChange<S>) + 'static,
    {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        self.inner.listeners.borrow_mut().push(Rc::new(ListenerEntry {
            id,
            active: Cell::new(true),
            callback: Box::new(callback),
        }));

        let weak: Weak<Inner<S>> = Rc::downgrade(&self.inner);
        ListenerHandle {
            id,
            remove: Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    let mut listeners = inner.listeners.borrow_mut();
                    if let Some(entry) = listeners.iter().find(|entry| entry.id == id) {
                        entry.active.set(false);
                    }
                    listeners.retain(|entry| entry.id != id);
                }
            }),
        }
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    /// Merge a partial update into the tree and notify listeners.
    ///
    /// Returns the slices that changed. Listeners are only notified when at
    /// least one slice changed. The patch itself must not access the store.
    pub fn set_state<P: Patch<S>>(&self, patch: P) -> S::Changes {
        self.apply(patch, None)
    }

    /// Replace the whole tree (used by rehydration), notifying every slice.
    pub fn replace(&self, state: S) {
        let snapshot = Rc::new(state);
        *self.inner.snapshot.borrow_mut() = Rc::clone(&snapshot);
        self.notify(StateChange {
            snapshot,
            changed: S::Changes::all(),
            cause: None,
        });
    }

    pub(crate) fn apply<P: Patch<S>>(&self, patch: P, cause: Option<&'static str>) -> S::Changes {
        let (snapshot, changed) = {
            let mut current = self.inner.snapshot.borrow_mut();
            let changed = patch.apply(Rc::make_mut(&mut current));
            (Rc::clone(&current), changed)
        };

        if !changed.is_empty() {
            self.notify(StateChange {
                snapshot,
                changed,
                cause,
            });
        }
        changed
    }

    fn notify(&self, change: StateChange<S>) {
        // Listeners may add or remove listeners while we iterate.
        let listeners: Vec<_> = self.inner.listeners.borrow().iter().cloned().collect();
        for listener in listeners {
            if listener.active.get() {
                (listener.callback)(&change);
            }
        }
    }
}

/// Removes a store listener.
///
/// Dropping the handle leaves the listener registered for the lifetime of
/// the store.
#[must_use = "call unsubscribe() to remove the listener"]
pub struct ListenerHandle {
    id: u64,
    remove: Box<dyn FnOnce()>,
}

impl ListenerHandle {
    /// Listener id, unique per store.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Remove the listener. It is not called again, even later in a
    /// notification pass that is currently running.
    pub fn unsubscribe(self) {
        (self.remove)()
    }
}

impl fmt::Debug for ListenerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerHandle").field("id", &self.id).finish()
    }
}

/// Middleware trait for intercepting actions
///
/// Implement this trait to add logging, metrics, or other
/// cross-cutting concerns to an [`EffectStore`](crate::EffectStore).
pub trait Middleware<A: Action> {
    /// Called before the action is dispatched to the reducer
    fn before(&mut self, action: &A);

    /// Called after the action is processed by the reducer
    fn after(&mut self, action: &A, state_changed: bool);
}

/// A no-op middleware that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMiddleware;

impl<A: Action> Middleware<A> for NoopMiddleware {
    fn before(&mut self, _action: &A) {}
    fn after(&mut self, _action: &A, _state_changed: bool) {}
}

/// Middleware that traces every action of one surface
#[derive(Debug, Clone, Default)]
pub struct LoggingMiddleware {
    surface: String,
    /// Whether to log before dispatch
    pub log_before: bool,
}

impl LoggingMiddleware {
    /// Log processed actions for the named surface
    pub fn new(surface: impl Into<String>) -> Self {
        Self {
            surface: surface.into(),
            log_before: false,
        }
    }

    /// Also log each action before it reaches the reducer
    pub fn verbose(surface: impl Into<String>) -> Self {
        Self {
            surface: surface.into(),
            log_before: true,
        }
    }
}

impl<A: Action> Middleware<A> for LoggingMiddleware {
    fn before(&mut self, action: &A) {
        if self.log_before {
            tracing::debug!(surface = %self.surface, action = %action.name(), "Dispatching action");
        }
    }

    fn after(&mut self, action: &A, state_changed: bool) {
        tracing::debug!(
            surface = %self.surface,
            action = %action.name(),
            state_changed,
            "Action processed"
        );
    }
}

/// Compose multiple middleware into a single middleware
pub struct ComposedMiddleware<A: Action> {
    middlewares: Vec<Box<dyn Middleware<A>>>,
}

impl<A: Action> fmt::Debug for ComposedMiddleware<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComposedMiddleware")
            .field("middlewares_count", &self.middlewares.len())
            .finish()
    }
}

impl<A: Action> Default for ComposedMiddleware<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Action> ComposedMiddleware<A> {
    pub fn new() -> Self {
        Self {
            middlewares: Vec::new(),
        }
    }

    /// Add a middleware to the composition
    pub fn add<M: Middleware<A> + 'static>(&mut self, middleware: M) {
        self.middlewares.push(Box::new(middleware));
    }
}

impl<A: Action> Middleware<A> for ComposedMiddleware<A> {
    fn before(&mut self, action: &A) {
        for middleware in &mut self.middlewares {
            middleware.before(action);
        }
    }

    fn after(&mut self, action: &A, state_changed: bool) {
        // Reverse order for proper nesting
        for middleware in self.middlewares.iter_mut().rev() {
            middleware.after(action, state_changed);
        }
    }
}
