//! Test utilities for surface-dispatch surfaces
//!
//! - [`TestHarness`]: a store plus an action channel, recording every
//!   change notification
//! - Assertion macros for verifying emitted actions
//! - Paused-clock helpers (feature `testing-time`) for polling tests
//!
//! # Example
//!
//! ```ignore
//! use surface_dispatch::testing::TestHarness;
//! use surface_dispatch::{assert_emitted, merge};
//!
//! let mut harness = TestHarness::<PanelTree, Action>::default();
//!
//! harness.store.set_state(merge(WalletStatePatch {
//!     is_wallet_locked: Some(true),
//!     ..Default::default()
//! }));
//! assert_eq!(harness.notifications(), vec![PanelSlices::WALLET]);
//!
//! // Hand the sender to the code under test, then check what it emitted
//! let actions = harness.drain_emitted();
//! assert_emitted!(actions, Action::BalanceRefresh);
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use tokio::sync::mpsc;

use crate::slice::StateTree;
use crate::store::{ListenerHandle, Store};
use crate::Action;

/// Store plus action channel for unit tests.
pub struct TestHarness<S: StateTree, A: Action> {
    /// The store under test
    pub store: Store<S>,
    tx: mpsc::UnboundedSender<A>,
    rx: mpsc::UnboundedReceiver<A>,
    notifications: Rc<RefCell<Vec<S::Changes>>>,
    recorder: Option<ListenerHandle>,
}

impl<S: StateTree, A: Action> TestHarness<S, A> {
    pub fn new(state: S) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let store = Store::new(state);
        let notifications: Rc<RefCell<Vec<S::Changes>>> = Rc::default();
        let recorded = Rc::clone(&notifications);
        let recorder = store.add_listener(move |change| recorded.borrow_mut().push(change.changed));
        Self {
            store,
            tx,
            rx,
            notifications,
            recorder: Some(recorder),
        }
    }

    /// Current snapshot.
    pub fn state(&self) -> Rc<S> {
        self.store.state()
    }

    /// Get a clone of the action sender for passing to handlers.
    pub fn sender(&self) -> mpsc::UnboundedSender<A> {
        self.tx.clone()
    }

    /// Emit an action (simulates what a handler would do).
    pub fn emit(&self, action: A) {
        let _ = self.tx.send(action);
    }

    /// Drain all emitted actions from the channel.
    pub fn drain_emitted(&mut self) -> Vec<A> {
        let mut actions = Vec::new();
        while let Ok(action) = self.rx.try_recv() {
            actions.push(action);
        }
        actions
    }

    /// Wait for the next emitted action (e.g. the result of a spawned task).
    pub async fn next_emitted(&mut self) -> Option<A> {
        self.rx.recv().await
    }

    /// Check if any actions were emitted.
    pub fn has_emitted(&mut self) -> bool {
        !self.drain_emitted().is_empty()
    }

    /// Changed-slice masks of every notification so far, oldest first.
    pub fn notifications(&self) -> Vec<S::Changes> {
        self.notifications.borrow().clone()
    }

    /// Stop recording notifications.
    pub fn stop_recording(&mut self) {
        if let Some(recorder) = self.recorder.take() {
            recorder.unsubscribe();
        }
    }
}

impl<S: StateTree, A: Action> Default for TestHarness<S, A> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

/// Pause tokio's clock for deterministic interval tests.
///
/// Requires a current-thread runtime.
#[cfg(feature = "testing-time")]
pub fn pause_time() {
    tokio::time::pause();
}

/// Move the paused clock forward, firing due timers.
#[cfg(feature = "testing-time")]
pub async fn advance_time(duration: std::time::Duration) {
    tokio::time::advance(duration).await;
}

#[cfg(feature = "testing-time")]
pub fn resume_time() {
    tokio::time::resume();
}

/// Assert that a specific action was emitted.
///
/// ```ignore
/// let actions = harness.drain_emitted();
/// assert_emitted!(actions, Action::BalanceDidLoad { .. });
/// ```
#[macro_export]
macro_rules! assert_emitted {
    ($actions:expr, $pattern:pat $(if $guard:expr)?) => {
        assert!(
            $actions.iter().any(|a| matches!(a, $pattern $(if $guard)?)),
            "Expected action matching `{}` to be emitted, but got: {:?}",
            stringify!($pattern),
            $actions
        );
    };
}

/// Assert that a specific action was NOT emitted.
#[macro_export]
macro_rules! assert_not_emitted {
    ($actions:expr, $pattern:pat $(if $guard:expr)?) => {
        assert!(
            !$actions.iter().any(|a| matches!(a, $pattern $(if $guard)?)),
            "Expected action matching `{}` NOT to be emitted, but it was: {:?}",
            stringify!($pattern),
            $actions
        );
    };
}

/// Find and return the first action matching a pattern.
#[macro_export]
macro_rules! find_emitted {
    ($actions:expr, $pattern:pat $(if $guard:expr)?) => {
        $actions.iter().find(|a| matches!(a, $pattern $(if $guard)?))
    };
}

/// Count how many actions match a pattern.
#[macro_export]
macro_rules! count_emitted {
    ($actions:expr, $pattern:pat $(if $guard:expr)?) => {
        $actions.iter().filter(|a| matches!(a, $pattern $(if $guard)?)).count()
    };
}
