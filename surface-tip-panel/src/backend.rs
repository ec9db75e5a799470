//! Native tip panel boundary

use async_trait::async_trait;
use surface_dispatch::{NativeEvent, RemoteError, RemoteFactory};

use crate::action::TipPanelAction;
use crate::model::{CreatorBanner, CreatorWallet, GlobalState, RewardsUser};

/// Service name used for the remote proxy and the observer subscription.
pub const TIP_PANEL_SERVICE: &str = "tip_panel";

/// Calls into the browser side of the tip panel.
#[async_trait]
pub trait TipPanelHandler: Send + Sync {
    /// Tell the browser the panel has rendered and can be shown.
    async fn show_ui(&self) -> Result<(), RemoteError>;
}

/// Factory binding a [`TipPanelHandler`] together with its event router.
pub trait TipPanelFactory: RemoteFactory<Remote = dyn TipPanelHandler, Event = TipPanelEvent> {}

impl<F> TipPanelFactory for F where F: RemoteFactory<Remote = dyn TipPanelHandler, Event = TipPanelEvent> {}

/// Pushed by the rewards service while the panel is open.
#[derive(Debug, Clone, PartialEq)]
pub enum TipPanelEvent {
    CreatorLoaded {
        banner: CreatorBanner,
        wallets: Vec<CreatorWallet>,
    },
    RewardsUserChanged(RewardsUser),
    GlobalStateChanged(GlobalState),
    MonthlyContributionChanged(bool),
}

impl NativeEvent for TipPanelEvent {
    fn name(&self) -> &'static str {
        match self {
            TipPanelEvent::CreatorLoaded { .. } => "tip_panel.creator_loaded",
            TipPanelEvent::RewardsUserChanged(_) => "tip_panel.rewards_user_changed",
            TipPanelEvent::GlobalStateChanged(_) => "tip_panel.global_state_changed",
            TipPanelEvent::MonthlyContributionChanged(_) => "tip_panel.monthly_contribution_changed",
        }
    }
}

/// Every tip panel event maps to exactly one action.
pub fn translate_tip_panel_event(event: TipPanelEvent) -> Option<TipPanelAction> {
    Some(match event {
        TipPanelEvent::CreatorLoaded { banner, wallets } => {
            TipPanelAction::CreatorLoaded { banner, wallets }
        }
        TipPanelEvent::RewardsUserChanged(user) => TipPanelAction::RewardsUserChanged(user),
        TipPanelEvent::GlobalStateChanged(global) => TipPanelAction::GlobalStateChanged(global),
        TipPanelEvent::MonthlyContributionChanged(set) => TipPanelAction::MonthlyContributionChanged(set),
    })
}
