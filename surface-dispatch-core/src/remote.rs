//! Typed remote handles to native services
//!
//! A [`RemoteProxy`] is created once by a surface's composition root and
//! passed down explicitly. Binding happens exactly once at construction; a
//! failed bind does not fail construction, it makes every later
//! [`remote`](RemoteProxy::remote) call return
//! [`RemoteError::BackendUnavailable`] until the caller decides to
//! [`reconnect`](RemoteProxy::reconnect).
//!
//! Code that outlives a single call (effect handlers) holds a
//! [`RemoteHandle`] instead of an `Arc`: the handle resolves the current
//! binding on every call, so a successful reconnect reaches it.
//!
//! # Example
//!
//! ```ignore
//! let mut proxy = RemoteProxy::connect(MockWalletFactory::new(wallet.clone()));
//! let events = proxy.take_events().expect("fresh proxy");
//! runtime.subscriptions().observe("wallet", events, translate_wallet_event);
//!
//! let remote = proxy.remote()?; // Arc<dyn WalletService>
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use crate::error::RemoteError;
use crate::observer::{event_channel, EventReceiver, EventSender};

/// Binds typed remotes for one native service.
pub trait RemoteFactory {
    /// The typed handle used to issue request/response calls.
    type Remote: ?Sized + Send + Sync + 'static;

    /// Events the service pushes to the callback router.
    type Event: Send + 'static;

    /// Service name for errors and logs.
    fn service(&self) -> &'static str;

    /// Bind a remote, handing the service the sending half of the callback
    /// router.
    fn bind(&self, events: EventSender<Self::Event>) -> Result<Arc<Self::Remote>, RemoteError>;
}

/// Shared view of a proxy's current binding.
///
/// Clones observe the same slot, which [`RemoteProxy::reconnect`] fills.
pub struct RemoteHandle<R: ?Sized> {
    service: &'static str,
    slot: Rc<RefCell<Option<Arc<R>>>>,
}

impl<R: ?Sized> RemoteHandle<R> {
    fn unbound(service: &'static str) -> Self {
        Self {
            service,
            slot: Rc::new(RefCell::new(None)),
        }
    }

    /// A handle that is permanently bound to `remote`.
    pub fn bound(service: &'static str, remote: Arc<R>) -> Self {
        Self {
            service,
            slot: Rc::new(RefCell::new(Some(remote))),
        }
    }

    /// Typed remote handle, or `BackendUnavailable` while unbound.
    pub fn get(&self) -> Result<Arc<R>, RemoteError> {
        self.slot
            .borrow()
            .clone()
            .ok_or_else(|| RemoteError::unavailable(self.service))
    }

    pub fn is_bound(&self) -> bool {
        self.slot.borrow().is_some()
    }

    pub fn service(&self) -> &'static str {
        self.service
    }

    fn set(&self, remote: Arc<R>) {
        *self.slot.borrow_mut() = Some(remote);
    }
}

impl<R: ?Sized> Clone for RemoteHandle<R> {
    fn clone(&self) -> Self {
        Self {
            service: self.service,
            slot: Rc::clone(&self.slot),
        }
    }
}

impl<R: ?Sized> fmt::Debug for RemoteHandle<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteHandle")
            .field("service", &self.service)
            .field("bound", &self.is_bound())
            .finish()
    }
}

/// The single proxy for one surface.
pub struct RemoteProxy<F: RemoteFactory> {
    factory: F,
    remote: RemoteHandle<F::Remote>,
    events: Option<EventReceiver<F::Event>>,
}

impl<F: RemoteFactory> RemoteProxy<F> {
    /// Bind once. Never fails; see [`remote`](Self::remote).
    pub fn connect(factory: F) -> Self {
        let remote = RemoteHandle::unbound(factory.service());
        let mut proxy = Self {
            factory,
            remote,
            events: None,
        };
        proxy.bind();
        proxy
    }

    fn bind(&mut self) -> Option<RemoteError> {
        let (sender, receiver) = event_channel();
        match self.factory.bind(sender) {
            Ok(remote) => {
                tracing::debug!(service = self.factory.service(), "Bound native service");
                self.remote.set(remote);
                self.events = Some(receiver);
                None
            }
            Err(err) => {
                tracing::warn!(service = self.factory.service(), error = %err, "Failed to bind native service");
                Some(err)
            }
        }
    }

    /// Service name of the underlying factory.
    pub fn service(&self) -> &'static str {
        self.factory.service()
    }

    /// Typed remote handle, or `BackendUnavailable` if binding failed.
    pub fn remote(&self) -> Result<Arc<F::Remote>, RemoteError> {
        self.remote.get()
    }

    /// Shared handle that follows later reconnects.
    pub fn handle(&self) -> RemoteHandle<F::Remote> {
        self.remote.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.remote.is_bound()
    }

    /// Receiving half of the callback router.
    ///
    /// Returns `Some` once per successful bind.
    pub fn take_events(&mut self) -> Option<EventReceiver<F::Event>> {
        self.events.take()
    }

    /// Retry binding after a failure. No-op when already connected.
    ///
    /// On success a fresh event receiver is available from
    /// [`take_events`](Self::take_events).
    pub fn reconnect(&mut self) -> Result<(), RemoteError> {
        if self.is_connected() {
            return Ok(());
        }
        match self.bind() {
            None => Ok(()),
            Some(err) => Err(err),
        }
    }
}

impl<F: RemoteFactory> fmt::Debug for RemoteProxy<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteProxy")
            .field("service", &self.factory.service())
            .field("connected", &self.is_connected())
            .field("events_taken", &self.events.is_none())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    trait Echo: Send + Sync {
        fn echo(&self, value: u32) -> u32;
    }

    struct EchoService;

    impl Echo for EchoService {
        fn echo(&self, value: u32) -> u32 {
            value
        }
    }

    struct EchoFactory {
        available: Cell<bool>,
        binds: Cell<usize>,
    }

    impl EchoFactory {
        fn new(available: bool) -> Self {
            Self {
                available: Cell::new(available),
                binds: Cell::new(0),
            }
        }
    }

    impl RemoteFactory for EchoFactory {
        type Remote = dyn Echo;
        type Event = u32;

        fn service(&self) -> &'static str {
            "echo"
        }

        fn bind(&self, events: EventSender<u32>) -> Result<Arc<dyn Echo>, RemoteError> {
            self.binds.set(self.binds.get() + 1);
            if !self.available.get() {
                return Err(RemoteError::unavailable("echo"));
            }
            events.send(7);
            Ok(Arc::new(EchoService))
        }
    }

    #[test]
    fn test_connect_binds_once() {
        let mut proxy = RemoteProxy::connect(EchoFactory::new(true));
        assert!(proxy.is_connected());
        assert_eq!(proxy.remote().unwrap().echo(5), 5);
        assert_eq!(proxy.remote().unwrap().echo(6), 6);
        assert_eq!(proxy.factory.binds.get(), 1);

        let mut events = proxy.take_events().expect("events available");
        assert_eq!(events.try_recv(), Some(7));
        assert!(proxy.take_events().is_none());
    }

    #[test]
    fn test_failed_bind_surfaces_backend_unavailable() {
        let proxy = RemoteProxy::connect(EchoFactory::new(false));
        assert!(!proxy.is_connected());

        for _ in 0..3 {
            assert_eq!(
                proxy.remote().err(),
                Some(RemoteError::BackendUnavailable {
                    service: "echo".into()
                })
            );
        }
        // No automatic retry
        assert_eq!(proxy.factory.binds.get(), 1);
    }

    #[test]
    fn test_reconnect_is_caller_driven() {
        let mut proxy = RemoteProxy::connect(EchoFactory::new(false));
        assert!(proxy.reconnect().is_err());
        assert_eq!(proxy.factory.binds.get(), 2);

        proxy.factory.available.set(true);
        proxy.reconnect().unwrap();
        assert!(proxy.remote().is_ok());
        assert!(proxy.take_events().is_some());

        proxy.reconnect().unwrap();
        assert_eq!(proxy.factory.binds.get(), 3);
    }

    #[test]
    fn test_handle_follows_reconnect() {
        let mut proxy = RemoteProxy::connect(EchoFactory::new(false));
        let handle = proxy.handle();
        assert_eq!(handle.get().err(), Some(RemoteError::unavailable("echo")));
        assert!(!handle.is_bound());

        proxy.factory.available.set(true);
        proxy.reconnect().unwrap();
        assert!(handle.is_bound());
        assert_eq!(handle.get().unwrap().echo(9), 9);
    }
}
