//! In-process tip panel handler for tests and the demo

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use surface_dispatch::{EventSender, RemoteError, RemoteFactory};

use crate::backend::{TipPanelEvent, TipPanelHandler, TIP_PANEL_SERVICE};

#[derive(Debug, Default)]
struct Inner {
    show_ui_calls: Mutex<usize>,
    failure: Mutex<Option<RemoteError>>,
    events: Mutex<Option<EventSender<TipPanelEvent>>>,
    refuse_bind: Mutex<bool>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Shared handle to an in-memory tip panel host. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockTipPanel {
    inner: Arc<Inner>,
}

impl MockTipPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show_ui_calls(&self) -> usize {
        *lock(&self.inner.show_ui_calls)
    }

    /// Make `show_ui` fail with `error` until [`recover`](Self::recover).
    pub fn fail(&self, error: RemoteError) {
        *lock(&self.inner.failure) = Some(error);
    }

    pub fn recover(&self) {
        *lock(&self.inner.failure) = None;
    }

    pub fn refuse_bind(&self, refuse: bool) {
        *lock(&self.inner.refuse_bind) = refuse;
    }

    /// Push an event to the bound panel. Returns `false` if nothing listens.
    pub fn push(&self, event: TipPanelEvent) -> bool {
        match lock(&self.inner.events).as_ref() {
            Some(events) => events.send(event),
            None => false,
        }
    }
}

#[async_trait]
impl TipPanelHandler for MockTipPanel {
    async fn show_ui(&self) -> Result<(), RemoteError> {
        *lock(&self.inner.show_ui_calls) += 1;
        match lock(&self.inner.failure).clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

/// Binds a [`MockTipPanel`] as the tip panel remote.
#[derive(Debug, Clone)]
pub struct MockTipPanelFactory {
    panel: MockTipPanel,
}

impl MockTipPanelFactory {
    pub fn new(panel: MockTipPanel) -> Self {
        Self { panel }
    }
}

impl RemoteFactory for MockTipPanelFactory {
    type Remote = dyn TipPanelHandler;
    type Event = TipPanelEvent;

    fn service(&self) -> &'static str {
        TIP_PANEL_SERVICE
    }

    fn bind(&self, events: EventSender<TipPanelEvent>) -> Result<Arc<dyn TipPanelHandler>, RemoteError> {
        if *lock(&self.panel.inner.refuse_bind) {
            return Err(RemoteError::unavailable(TIP_PANEL_SERVICE));
        }
        *lock(&self.panel.inner.events) = Some(events);
        Ok(Arc::new(self.panel.clone()))
    }
}
