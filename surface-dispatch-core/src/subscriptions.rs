//! Long-lived action sources: polling intervals and event streams
//!
//! A subscription keeps emitting actions until it is cancelled, the
//! surface's `mounted` token is cancelled, or the action channel closes.
//!
//! # Example
//!
//! ```ignore
//! use surface_dispatch::subscriptions::Subscriptions;
//! use std::time::Duration;
//!
//! let mut subs = Subscriptions::new(action_tx, mounted.clone());
//!
//! // Refresh balances and gas estimates every 15 seconds
//! subs.interval("poll", Duration::from_secs(15), || Action::BalanceRefresh);
//!
//! // Translated native events
//! subs.stream("keyring", events.map(Action::from));
//!
//! // Teardown
//! mounted.cancel();
//! subs.cancel_all();
//! ```

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::Action;

/// Identifies a subscription for cancellation.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct SubKey(String);

impl SubKey {
    /// Create a new subscription key.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the key name.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for SubKey {
    fn from(s: &'static str) -> Self {
        Self::new(s)
    }
}

impl From<String> for SubKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Manages subscriptions that continuously emit actions for one surface.
pub struct Subscriptions<A> {
    handles: HashMap<SubKey, JoinHandle<()>>,
    action_tx: mpsc::UnboundedSender<A>,
    mounted: CancellationToken,
}

impl<A> Subscriptions<A>
where
    A: Action,
{
    /// Create a new subscription manager.
    ///
    /// Every subscription stops on its own once `mounted` is cancelled.
    pub fn new(action_tx: mpsc::UnboundedSender<A>, mounted: CancellationToken) -> Self {
        Self {
            handles: HashMap::new(),
            action_tx,
            mounted,
        }
    }

    fn insert(&mut self, key: SubKey, handle: JoinHandle<()>) {
        if let Some(previous) = self.handles.insert(key, handle) {
            previous.abort();
        }
    }

    fn ticker<F>(&self, duration: Duration, immediate: bool, action_fn: F) -> JoinHandle<()>
    where
        F: Fn() -> A + Send + 'static,
    {
        let tx = self.action_tx.clone();
        let mounted = self.mounted.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(duration);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            if !immediate {
                // The first tick completes immediately
                interval.tick().await;
            }

            loop {
                tokio::select! {
                    _ = mounted.cancelled() => break,
                    _ = interval.tick() => {
                        if tx.send(action_fn()).is_err() {
                            break;
                        }
                    }
                }
            }
        })
    }

    /// Emit an action at a fixed interval, starting one interval from now.
    ///
    /// If a subscription with the same key exists, it is cancelled first.
    pub fn interval<F>(
        &mut self,
        key: impl Into<SubKey>,
        duration: Duration,
        action_fn: F,
    ) -> &mut Self
    where
        F: Fn() -> A + Send + 'static,
    {
        let handle = self.ticker(duration, false, action_fn);
        self.insert(key.into(), handle);
        self
    }

    /// Emit an action immediately, then at a fixed interval.
    pub fn interval_immediate<F>(
        &mut self,
        key: impl Into<SubKey>,
        duration: Duration,
        action_fn: F,
    ) -> &mut Self
    where
        F: Fn() -> A + Send + 'static,
    {
        let handle = self.ticker(duration, true, action_fn);
        self.insert(key.into(), handle);
        self
    }

    /// Forward every stream item as an action, in stream order.
    ///
    /// If a subscription with the same key exists, it is cancelled first.
    pub fn stream<S>(&mut self, key: impl Into<SubKey>, stream: S) -> &mut Self
    where
        S: Stream<Item = A> + Send + 'static,
    {
        let tx = self.action_tx.clone();
        let mounted = self.mounted.clone();
        let handle = tokio::spawn(async move {
            tokio::pin!(stream);
            loop {
                let action = tokio::select! {
                    _ = mounted.cancelled() => break,
                    next = stream.next() => match next {
                        Some(action) => action,
                        None => break,
                    },
                };
                if tx.send(action).is_err() {
                    break;
                }
            }
        });
        self.insert(key.into(), handle);
        self
    }

    /// Cancel a subscription by key.
    ///
    /// If no subscription exists with the given key, this is a no-op.
    pub fn cancel(&mut self, key: &SubKey) {
        if let Some(handle) = self.handles.remove(key) {
            handle.abort();
        }
    }

    /// Cancel all subscriptions.
    pub fn cancel_all(&mut self) {
        for (_, handle) in self.handles.drain() {
            handle.abort();
        }
    }

    /// Check if a subscription with the given key is active.
    pub fn is_active(&self, key: &SubKey) -> bool {
        self.handles
            .get(key)
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Get the number of registered subscriptions.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Get the keys of all registered subscriptions.
    pub fn active_keys(&self) -> impl Iterator<Item = &SubKey> {
        self.handles.keys()
    }
}

impl<A> Drop for Subscriptions<A> {
    fn drop(&mut self) {
        for (_, handle) in self.handles.drain() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug)]
    enum TestAction {
        Tick,
        Value(usize),
    }

    impl Action for TestAction {
        fn name(&self) -> &'static str {
            match self {
                TestAction::Tick => "Tick",
                TestAction::Value(_) => "Value",
            }
        }
    }

    fn subs() -> (
        Subscriptions<TestAction>,
        mpsc::UnboundedReceiver<TestAction>,
        CancellationToken,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mounted = CancellationToken::new();
        (Subscriptions::new(tx, mounted.clone()), rx, mounted)
    }

    #[test]
    fn test_sub_key() {
        let k1 = SubKey::new("test");
        let k2: SubKey = "test".into();
        assert_eq!(k1, k2);
        assert_eq!(k1.name(), "test");
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_waits_one_period() {
        let (mut subs, mut rx, _mounted) = subs();
        subs.interval("poll", Duration::from_secs(15), || TestAction::Tick);

        tokio::time::sleep(Duration::from_secs(14)).await;
        assert!(rx.try_recv().is_err());

        let action = rx.recv().await.expect("channel closed");
        assert!(matches!(action, TestAction::Tick));
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_immediate() {
        let (mut subs, mut rx, _mounted) = subs();
        subs.interval_immediate("poll", Duration::from_secs(15), || TestAction::Tick);

        let action = tokio::time::timeout(Duration::from_millis(10), rx.recv())
            .await
            .expect("should receive immediately")
            .expect("channel closed");
        assert!(matches!(action, TestAction::Tick));
    }

    #[tokio::test]
    async fn test_stream_forwards_items_in_order() {
        let (mut subs, mut rx, _mounted) = subs();
        subs.stream(
            "events",
            tokio_stream::iter(vec![
                TestAction::Value(1),
                TestAction::Value(2),
                TestAction::Value(3),
            ]),
        );

        let mut values = vec![];
        for _ in 0..3 {
            let action = tokio::time::timeout(Duration::from_millis(100), rx.recv())
                .await
                .expect("timeout")
                .expect("channel closed");
            if let TestAction::Value(v) = action {
                values.push(v);
            }
        }
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmount_stops_interval() {
        let (mut subs, mut rx, mounted) = subs();
        subs.interval("poll", Duration::from_secs(1), || TestAction::Tick);

        rx.recv().await.expect("first tick");
        mounted.cancel();
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert!(rx.try_recv().is_err(), "no tick after unmount");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_subscription() {
        let (mut subs, mut rx, _mounted) = subs();
        subs.interval("tick", Duration::from_millis(10), || TestAction::Tick);
        assert!(subs.is_active(&SubKey::new("tick")));

        rx.recv().await.expect("first tick");
        subs.cancel(&SubKey::new("tick"));
        assert!(!subs.is_active(&SubKey::new("tick")));

        while rx.try_recv().is_ok() {}
        let result = tokio::time::timeout(Duration::from_millis(50), rx.recv()).await;
        assert!(result.is_err(), "should timeout - no more ticks");
    }

    #[tokio::test(start_paused = true)]
    async fn test_replace_existing_subscription() {
        let (mut subs, mut rx, _mounted) = subs();
        subs.interval("poll", Duration::from_millis(10), || TestAction::Value(1));
        subs.interval("poll", Duration::from_millis(10), || TestAction::Value(2));
        assert_eq!(subs.len(), 1);

        tokio::time::sleep(Duration::from_millis(50)).await;
        let mut got_two = false;
        while let Ok(action) = rx.try_recv() {
            if let TestAction::Value(v) = action {
                assert_eq!(v, 2);
                got_two = true;
            }
        }
        assert!(got_two, "should have received Value(2)");
    }

    #[tokio::test]
    async fn test_cancel_all() {
        let (mut subs, _rx, _mounted) = subs();
        subs.interval("a", Duration::from_secs(10), || TestAction::Tick);
        subs.interval("b", Duration::from_secs(10), || TestAction::Tick);
        assert_eq!(subs.len(), 2);

        subs.cancel_all();
        assert!(subs.is_empty());
    }
}
