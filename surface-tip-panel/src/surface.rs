//! Tip panel reducer, effect handler and mount

use surface_dispatch::{
    ActionLoggerMiddleware, DispatchResult, EffectContext, EffectHandler, EffectStore,
    ObserverBridge, OperationError, RemoteHandle, RemoteProxy, SurfaceConfig, SurfaceError,
    SurfaceRuntime,
};

use crate::action::TipPanelAction;
use crate::backend::{translate_tip_panel_event, TipPanelFactory, TipPanelHandler, TIP_PANEL_SERVICE};
use crate::model::{TipPanelSlices, TipPanelTree};

#[derive(Clone, Debug, PartialEq)]
pub enum TipPanelEffect {
    ShowUi,
}

pub type TipPanelRuntime = SurfaceRuntime<TipPanelTree, TipPanelAction, TipPanelEffect, ActionLoggerMiddleware>;

fn set<T: PartialEq>(field: &mut T, value: T) -> bool {
    if *field == value {
        false
    } else {
        *field = value;
        true
    }
}

pub fn reduce_tip_panel(
    state: &mut TipPanelTree,
    action: TipPanelAction,
) -> DispatchResult<TipPanelSlices, TipPanelEffect> {
    let panel = &mut state.tip_panel;
    let touched = |changed: bool| {
        if changed {
            DispatchResult::changed(TipPanelSlices::TIP_PANEL)
        } else {
            DispatchResult::unchanged()
        }
    };

    match action {
        // Only the first render shows the panel
        TipPanelAction::InitialRender => {
            if set(&mut panel.ui_requested, true) {
                DispatchResult::changed_with(TipPanelSlices::TIP_PANEL, TipPanelEffect::ShowUi)
            } else {
                DispatchResult::unchanged()
            }
        }

        TipPanelAction::CreatorLoaded { banner, wallets } => {
            let banner_changed = set(&mut panel.creator_banner, banner);
            let wallets_changed = set(&mut panel.creator_wallets, wallets);
            let loaded = set(&mut panel.loading, false);
            touched(banner_changed || wallets_changed || loaded)
        }
        TipPanelAction::RewardsUserChanged(user) => touched(set(&mut panel.rewards_user, user)),
        TipPanelAction::GlobalStateChanged(global) => touched(set(&mut panel.global_state, global)),
        TipPanelAction::MonthlyContributionChanged(is_set) => {
            touched(set(&mut panel.monthly_contribution_set, is_set))
        }

        TipPanelAction::ShowUiDidComplete => touched(set(&mut panel.last_action_error, None)),
        TipPanelAction::ShowUiDidFail(error) => touched(set(&mut panel.last_action_error, Some(error))),
    }
}

/// Issues tip panel calls against the proxy's current binding.
pub struct TipPanelEffects {
    remote: RemoteHandle<dyn TipPanelHandler>,
}

impl TipPanelEffects {
    pub fn new(remote: RemoteHandle<dyn TipPanelHandler>) -> Self {
        Self { remote }
    }
}

impl EffectHandler<TipPanelEffect, TipPanelAction> for TipPanelEffects {
    fn handle(&mut self, effect: TipPanelEffect, ctx: &mut EffectContext<'_, TipPanelAction>) {
        match effect {
            TipPanelEffect::ShowUi => {
                let remote = self.remote.get();
                ctx.tasks().request("show_ui", async move {
                    let result = match remote {
                        Ok(handler) => handler.show_ui().await,
                        Err(e) => Err(e),
                    };
                    match result {
                        Ok(()) => TipPanelAction::ShowUiDidComplete,
                        Err(e) => {
                            tracing::warn!(error = %e, "Failed to show tip panel");
                            TipPanelAction::ShowUiDidFail(OperationError::remote("show_ui", &e))
                        }
                    }
                });
            }
        }
    }
}

/// Build and mount the tip panel.
///
/// Observes the rewards events and asks the browser to show the panel, as
/// the first render would. Requires a tokio runtime.
pub fn mount_tip_panel<F: TipPanelFactory>(
    config: &SurfaceConfig,
    proxy: &mut RemoteProxy<F>,
) -> Result<TipPanelRuntime, SurfaceError> {
    let middleware = ActionLoggerMiddleware::new(config.name.clone(), config.log.clone());
    let store = EffectStore::with_middleware(TipPanelTree::default(), reduce_tip_panel, middleware);
    let mut runtime = SurfaceRuntime::from_store(config.name.clone(), store)
        .with_effect_handler(TipPanelEffects::new(proxy.handle()));

    match proxy.take_events() {
        Some(events) => {
            runtime
                .subscriptions()
                .observe(TIP_PANEL_SERVICE, events, translate_tip_panel_event);
        }
        None => {
            tracing::warn!(surface = %config.name, service = TIP_PANEL_SERVICE, "No tip panel events to observe");
        }
    }

    runtime.mount([TipPanelAction::InitialRender])?;
    Ok(runtime)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CreatorBanner, CreatorWallet, ExternalWalletProvider};
    use surface_dispatch::RemoteError;

    #[test]
    fn test_initial_render_shows_ui_once() {
        let mut state = TipPanelTree::default();
        let first = reduce_tip_panel(&mut state, TipPanelAction::InitialRender);
        assert_eq!(first.effects, vec![TipPanelEffect::ShowUi]);

        let again = reduce_tip_panel(&mut state, TipPanelAction::InitialRender);
        assert!(!again.is_changed());
        assert!(!again.has_effects());
    }

    #[test]
    fn test_creator_loaded_ends_loading_and_is_idempotent() {
        let mut state = TipPanelTree::default();
        let loaded = TipPanelAction::CreatorLoaded {
            banner: CreatorBanner {
                title: "Creator".into(),
                ..Default::default()
            },
            wallets: vec![CreatorWallet {
                provider: ExternalWalletProvider::Uphold,
                address: "abc".into(),
            }],
        };

        assert!(reduce_tip_panel(&mut state, loaded.clone()).is_changed());
        assert!(!state.tip_panel.loading);
        assert!(!reduce_tip_panel(&mut state, loaded).is_changed());
    }

    #[test]
    fn test_show_ui_failure_is_recorded_then_cleared() {
        let mut state = TipPanelTree::default();
        let error = OperationError::remote("show_ui", &RemoteError::unavailable("tip_panel"));
        reduce_tip_panel(&mut state, TipPanelAction::ShowUiDidFail(error.clone()));
        assert_eq!(state.tip_panel.last_action_error, Some(error));

        reduce_tip_panel(&mut state, TipPanelAction::ShowUiDidComplete);
        assert_eq!(state.tip_panel.last_action_error, None);
    }
}
