//! Native push events and their translation into actions
//!
//! The native boundary is a message channel: a service holds an
//! [`EventSender`] and pushes tagged events; the surface owns the matching
//! [`EventReceiver`] and hands it to the [`ObserverBridge`], which translates
//! each event into an action in delivery order.
//!
//! # Example
//!
//! ```ignore
//! let (sender, receiver) = event_channel::<KeyringEvent>();
//! keyring.add_observer(sender);
//!
//! runtime.subscriptions().observe("keyring", receiver, |event| match event {
//!     KeyringEvent::Locked => Some(Action::KeyringLocked),
//!     KeyringEvent::Unlocked => Some(Action::KeyringUnlocked),
//!     _ => None,
//! });
//! ```

use std::fmt::Debug;

use tokio::sync::mpsc;

/// An immutable notification pushed by a native service.
pub trait NativeEvent: Debug + Send + 'static {
    /// Event name for logging.
    fn name(&self) -> &'static str;
}

/// Create a FIFO event channel between a native service and a surface.
pub fn event_channel<Ev>() -> (EventSender<Ev>, EventReceiver<Ev>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender { tx }, EventReceiver { rx })
}

/// Sending half, held by the native side.
///
/// Fire-and-forget: pushing never blocks and needs no acknowledgment.
#[derive(Debug)]
pub struct EventSender<Ev> {
    tx: mpsc::UnboundedSender<Ev>,
}

impl<Ev> Clone for EventSender<Ev> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<Ev> EventSender<Ev> {
    /// Push an event. Returns `false` once the surface stopped observing.
    pub fn send(&self, event: Ev) -> bool {
        self.tx.send(event).is_ok()
    }

    /// Whether the receiving surface is gone.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receiving half, owned by the surface.
#[derive(Debug)]
pub struct EventReceiver<Ev> {
    rx: mpsc::UnboundedReceiver<Ev>,
}

impl<Ev> EventReceiver<Ev> {
    /// Wait for the next event.
    pub async fn recv(&mut self) -> Option<Ev> {
        self.rx.recv().await
    }

    /// Take an already delivered event without waiting.
    pub fn try_recv(&mut self) -> Option<Ev> {
        self.rx.try_recv().ok()
    }

    /// Stream of events in delivery order.
    #[cfg(feature = "subscriptions")]
    pub fn into_stream(self) -> tokio_stream::wrappers::UnboundedReceiverStream<Ev> {
        tokio_stream::wrappers::UnboundedReceiverStream::new(self.rx)
    }
}

#[cfg(feature = "subscriptions")]
pub use bridge::ObserverBridge;

#[cfg(feature = "subscriptions")]
mod bridge {
    use tokio_stream::StreamExt;

    use super::{EventReceiver, NativeEvent};
    use crate::subscriptions::{SubKey, Subscriptions};
    use crate::Action;

    fn key(service: &str) -> SubKey {
        SubKey::new(format!("observer:{service}"))
    }

    /// Registers per-service event translations on a surface's subscriptions.
    ///
    /// Each service gets its own keyed stream subscription: events from one
    /// service are forwarded in order, events from different services
    /// interleave in no particular order.
    pub trait ObserverBridge<A: Action> {
        /// Translate every event from `events` into an action.
        ///
        /// Events for which `translate` returns `None` are ignored. Observing
        /// a service again replaces the previous registration.
        fn observe<Ev, F>(&mut self, service: &str, events: EventReceiver<Ev>, translate: F) -> &mut Self
        where
            Ev: NativeEvent,
            F: Fn(Ev) -> Option<A> + Send + 'static;

        /// Stop observing a service, dropping its receiver.
        fn unobserve(&mut self, service: &str);

        fn is_observing(&self, service: &str) -> bool;
    }

    impl<A: Action> ObserverBridge<A> for Subscriptions<A> {
        fn observe<Ev, F>(&mut self, service: &str, events: EventReceiver<Ev>, translate: F) -> &mut Self
        where
            Ev: NativeEvent,
            F: Fn(Ev) -> Option<A> + Send + 'static,
        {
            let service_name = service.to_string();
            let actions = events.into_stream().filter_map(move |event| {
                let name = event.name();
                let action = translate(event);
                if action.is_none() {
                    tracing::trace!(service = %service_name, event = name, "Ignoring untranslated event");
                }
                action
            });
            tracing::debug!(service, "Observing native service");
            self.stream(key(service), actions)
        }

        fn unobserve(&mut self, service: &str) {
            tracing::debug!(service, "No longer observing native service");
            self.cancel(&key(service));
        }

        fn is_observing(&self, service: &str) -> bool {
            self.is_active(&key(service))
        }
    }
}
