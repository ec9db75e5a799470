//! Composition root helper for one mounted surface.
//!
//! [`SurfaceRuntime`] owns the store, the action channel, the task manager,
//! subscriptions and the optional persistor, and walks the surface through
//! its [`Lifecycle`]. All state mutation happens on the thread driving the
//! runtime; remote calls report back through the action channel.
//!
//! # Example
//!
//! ```ignore
//! let mut runtime = SurfaceRuntime::new("wallet-panel", PanelTree::default(), reducer)
//!     .with_persistor(Persistor::new(config.storage_key(), storage))
//!     .with_validator(validate_intent)
//!     .with_effect_handler(WalletEffects::new(proxy.handle()));
//!
//! runtime.subscriptions().observe("wallet", events, translate_wallet_event);
//! runtime.mount([Action::AccountsFetch, Action::TransactionsFetch])?;
//!
//! runtime.intent(Action::ApproveTransaction { id })?;
//! runtime.run(shutdown).await?;
//! ```

use std::rc::Rc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::effect::{EffectReducer, EffectStore};
use crate::error::{SurfaceError, ValidationError};
use crate::lifecycle::{Lifecycle, Phase};
use crate::persist::{PersistTree, Persistor};
use crate::slice::StateTree;
use crate::store::{ListenerHandle, Middleware, NoopMiddleware, Store};
use crate::subscriptions::Subscriptions;
use crate::tasks::TaskManager;
use crate::Action;

/// Context passed to effect handlers.
pub struct EffectContext<'a, A: Action> {
    action_tx: &'a mpsc::UnboundedSender<A>,
    tasks: &'a mut TaskManager<A>,
    subscriptions: &'a mut Subscriptions<A>,
}

impl<'a, A: Action> EffectContext<'a, A> {
    /// Queue an action for dispatch after the current one.
    pub fn emit(&self, action: A) {
        let _ = self.action_tx.send(action);
    }

    pub fn action_tx(&self) -> &mpsc::UnboundedSender<A> {
        self.action_tx
    }

    pub fn tasks(&mut self) -> &mut TaskManager<A> {
        self.tasks
    }

    pub fn subscriptions(&mut self) -> &mut Subscriptions<A> {
        self.subscriptions
    }
}

/// Turns effects returned by the reducer into remote calls.
pub trait EffectHandler<E, A: Action> {
    fn handle(&mut self, effect: E, ctx: &mut EffectContext<'_, A>);
}

impl<E, A, F> EffectHandler<E, A> for F
where
    A: Action,
    F: FnMut(E, &mut EffectContext<'_, A>),
{
    fn handle(&mut self, effect: E, ctx: &mut EffectContext<'_, A>) {
        self(effect, ctx)
    }
}

type Validator<S, A> = Box<dyn Fn(&S, &A) -> Result<(), ValidationError>>;

/// Object-safe view of a [`Persistor`] for a tree that is only known to be a
/// `StateTree` here.
trait SurfacePersistence<S: StateTree> {
    fn rehydrate(&self) -> S;
    fn attach(self: Rc<Self>, store: &Store<S>) -> ListenerHandle;
}

impl<S: PersistTree> SurfacePersistence<S> for Persistor<S> {
    fn rehydrate(&self) -> S {
        Persistor::rehydrate(self).value
    }

    fn attach(self: Rc<Self>, store: &Store<S>) -> ListenerHandle {
        Persistor::attach(&self, store)
    }
}

/// Runtime of one surface: store, channel, tasks, subscriptions, lifecycle.
pub struct SurfaceRuntime<S, A, E, M = NoopMiddleware>
where
    S: StateTree,
    A: Action,
    M: Middleware<A>,
{
    name: String,
    store: EffectStore<S, A, E, M>,
    action_tx: mpsc::UnboundedSender<A>,
    action_rx: mpsc::UnboundedReceiver<A>,
    tasks: TaskManager<A>,
    subscriptions: Subscriptions<A>,
    mounted: CancellationToken,
    lifecycle: Lifecycle,
    persistor: Option<Rc<dyn SurfacePersistence<S>>>,
    persist_listener: Option<ListenerHandle>,
    validators: Vec<Validator<S, A>>,
    handler: Option<Box<dyn EffectHandler<E, A>>>,
}

impl<S, A, E> SurfaceRuntime<S, A, E, NoopMiddleware>
where
    S: StateTree,
    A: Action,
{
    /// Create a runtime from initial state and reducer.
    pub fn new(name: impl Into<String>, state: S, reducer: EffectReducer<S, A, E>) -> Self {
        Self::from_store(name, EffectStore::new(state, reducer))
    }
}

impl<S, A, E, M> SurfaceRuntime<S, A, E, M>
where
    S: StateTree,
    A: Action,
    M: Middleware<A>,
{
    /// Create a runtime around an existing effect store (e.g. one with middleware).
    pub fn from_store(name: impl Into<String>, store: EffectStore<S, A, E, M>) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let mounted = CancellationToken::new();
        Self {
            name: name.into(),
            store,
            tasks: TaskManager::new(action_tx.clone(), mounted.clone()),
            subscriptions: Subscriptions::new(action_tx.clone(), mounted.clone()),
            action_tx,
            action_rx,
            mounted,
            lifecycle: Lifecycle::new(),
            persistor: None,
            persist_listener: None,
            validators: Vec::new(),
            handler: None,
        }
    }

    /// Rehydrate from and persist to durable storage.
    pub fn with_persistor(mut self, persistor: Persistor<S>) -> Self
    where
        S: PersistTree,
    {
        self.persistor = Some(Rc::new(persistor));
        self
    }

    /// Add a precondition checked by [`intent`](Self::intent) before dispatch.
    pub fn with_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&S, &A) -> Result<(), ValidationError> + 'static,
    {
        self.validators.push(Box::new(validator));
        self
    }

    pub fn with_effect_handler<H>(mut self, handler: H) -> Self
    where
        H: EffectHandler<E, A> + 'static,
    {
        self.handler = Some(Box::new(handler));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phase(&self) -> Phase {
        self.lifecycle.phase()
    }

    /// Current snapshot.
    pub fn state(&self) -> Rc<S> {
        self.store.state()
    }

    /// Shared store handle, for listeners.
    pub fn store(&self) -> &Store<S> {
        self.store.store()
    }

    pub fn middleware(&self) -> &M {
        self.store.middleware()
    }

    /// Clone the action sender.
    pub fn action_tx(&self) -> mpsc::UnboundedSender<A> {
        self.action_tx.clone()
    }

    /// Token cancelled at teardown.
    pub fn mounted(&self) -> CancellationToken {
        self.mounted.clone()
    }

    pub fn tasks(&mut self) -> &mut TaskManager<A> {
        &mut self.tasks
    }

    /// Subscriptions, including observed native services.
    pub fn subscriptions(&mut self) -> &mut Subscriptions<A> {
        &mut self.subscriptions
    }

    /// Rehydrate, issue the initial actions, then become `Ready`.
    pub fn mount<I>(&mut self, initial_actions: I) -> Result<(), SurfaceError>
    where
        I: IntoIterator<Item = A>,
    {
        self.lifecycle.advance(Phase::Rehydrating)?;

        if let Some(persistor) = self.persistor.clone() {
            self.store.store().replace(persistor.rehydrate());
            self.persist_listener = Some(persistor.attach(self.store.store()));
        }

        for action in initial_actions {
            self.dispatch(action);
        }

        self.lifecycle.advance(Phase::Ready)?;
        tracing::info!(surface = %self.name, "Surface mounted");
        Ok(())
    }

    /// Dispatch a user intent. Accepted only while `Ready`.
    ///
    /// Validators run against the current state first; a failed validation
    /// issues nothing.
    pub fn intent(&mut self, action: A) -> Result<S::Changes, SurfaceError> {
        if !self.lifecycle.is_ready() {
            return Err(SurfaceError::NotReady(self.lifecycle.phase()));
        }

        let state = self.store.state();
        for validator in &self.validators {
            if let Err(err) = validator(&state, &action) {
                tracing::debug!(surface = %self.name, action = %action.name(), error = %err, "Intent rejected");
                return Err(err.into());
            }
        }

        Ok(self.dispatch(action))
    }

    fn dispatch(&mut self, action: A) -> S::Changes {
        let result = self.store.dispatch(action);

        if result.has_effects() {
            let mut ctx = EffectContext {
                action_tx: &self.action_tx,
                tasks: &mut self.tasks,
                subscriptions: &mut self.subscriptions,
            };
            match self.handler.as_mut() {
                Some(handler) => {
                    for effect in result.effects {
                        handler.handle(effect, &mut ctx);
                    }
                }
                None => {
                    tracing::warn!(
                        surface = %self.name,
                        dropped = result.effects.len(),
                        "No effect handler installed"
                    );
                }
            }
            self.tasks.prune();
        }

        result.changed
    }

    /// Wait for the next queued action and dispatch it.
    ///
    /// Returns `None` once the surface is unmounted.
    pub async fn next(&mut self) -> Option<S::Changes> {
        if self.lifecycle.is_unmounted() {
            return None;
        }
        let action = self.action_rx.recv().await?;
        Some(self.dispatch(action))
    }

    /// Dispatch every action already queued, without waiting.
    ///
    /// Returns how many actions were dispatched.
    pub fn run_until_idle(&mut self) -> usize {
        let mut dispatched = 0;
        while !self.lifecycle.is_unmounted() {
            let Ok(action) = self.action_rx.try_recv() else {
                break;
            };
            self.dispatch(action);
            dispatched += 1;
        }
        dispatched
    }

    /// Dispatch queued actions until `shutdown` is cancelled, then tear down.
    pub async fn run(&mut self, shutdown: CancellationToken) -> Result<(), SurfaceError> {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                Some(action) = self.action_rx.recv() => {
                    self.dispatch(action);
                }
                else => break,
            }
        }
        self.teardown()
    }

    /// Release subscriptions and in-flight requests, then terminate.
    ///
    /// Results of requests still in flight are dropped when they arrive.
    pub fn teardown(&mut self) -> Result<(), SurfaceError> {
        self.lifecycle.advance(Phase::Unmounting)?;

        self.mounted.cancel();
        self.subscriptions.cancel_all();
        self.tasks.release();
        if let Some(listener) = self.persist_listener.take() {
            listener.unsubscribe();
        }

        let mut discarded = 0;
        while self.action_rx.try_recv().is_ok() {
            discarded += 1;
        }
        if discarded > 0 {
            tracing::debug!(surface = %self.name, discarded, "Discarded queued actions at teardown");
        }

        self.lifecycle.advance(Phase::Terminated)?;
        tracing::info!(surface = %self.name, "Surface terminated");
        Ok(())
    }
}
