//! Shared composition root of the wallet surfaces

use surface_dispatch::{
    ActionLoggerMiddleware, EffectReducer, EffectStore, HasSlice, ObserverBridge, PersistTree,
    Persistor, RemoteError, RemoteProxy, StateTree, Storage, SubKey, SurfaceConfig,
    SurfaceRuntime,
};

use crate::action::WalletAction;
use crate::backend::{WalletFactory, WALLET_SERVICE};
use crate::effect::WalletEffect;
use crate::events::translate_wallet_event;
use crate::handlers::WalletEffects;
use crate::reducer::validate_intent;
use crate::state::WalletState;

/// Runtime of a wallet surface over tree `S`.
pub type WalletRuntime<S> = SurfaceRuntime<S, WalletAction, WalletEffect, ActionLoggerMiddleware>;

/// Subscription key of the balance and gas estimate poll.
pub const POLL_KEY: &str = "poll";

/// Wire a surface runtime: logging middleware, validation, effect handler,
/// persistence, the wallet observer and the poll interval.
///
/// The runtime is returned unmounted.
pub(crate) fn build<S, F>(
    config: &SurfaceConfig,
    proxy: &mut RemoteProxy<F>,
    storage: impl Storage + 'static,
    reducer: EffectReducer<S, WalletAction, WalletEffect>,
) -> WalletRuntime<S>
where
    S: PersistTree + HasSlice<WalletState>,
    F: WalletFactory,
{
    let middleware = ActionLoggerMiddleware::new(config.name.clone(), config.log.clone());
    let store = EffectStore::with_middleware(S::default(), reducer, middleware);

    let mut runtime = SurfaceRuntime::from_store(config.name.clone(), store)
        .with_validator(validate_intent::<S>)
        .with_effect_handler(WalletEffects::from_proxy(proxy));

    if config.persist {
        runtime = runtime.with_persistor(Persistor::new(config.storage_key(), storage));
    }

    match proxy.take_events() {
        Some(events) => {
            runtime
                .subscriptions()
                .observe(WALLET_SERVICE, events, translate_wallet_event);
        }
        None => {
            tracing::warn!(surface = %config.name, service = WALLET_SERVICE, "No wallet events to observe");
        }
    }

    runtime
        .subscriptions()
        .interval(SubKey::new(POLL_KEY), config.poll_interval(), || WalletAction::PollTick);

    runtime
}

/// Retry binding the wallet backend of a mounted surface.
///
/// On success the surface observes the new event channel, and effects
/// handled from then on reach the new remote. Nothing is refetched; the
/// caller re-issues the intents it wants retried.
pub fn reconnect<S, F>(runtime: &mut WalletRuntime<S>, proxy: &mut RemoteProxy<F>) -> Result<(), RemoteError>
where
    S: StateTree,
    F: WalletFactory,
{
    proxy.reconnect()?;
    if let Some(events) = proxy.take_events() {
        runtime
            .subscriptions()
            .observe(WALLET_SERVICE, events, translate_wallet_event);
        tracing::info!(surface = %runtime.name(), service = WALLET_SERVICE, "Reconnected wallet backend");
    }
    Ok(())
}
