use surface_dispatch::{Action, OperationError};

use crate::model::{CreatorBanner, CreatorWallet, GlobalState, RewardsUser};

#[derive(Action, Clone, Debug, PartialEq)]
#[action(summary)]
pub enum TipPanelAction {
    // ===== Intents =====
    /// The panel finished its first render.
    InitialRender,

    // ===== Native events =====
    CreatorLoaded {
        banner: CreatorBanner,
        wallets: Vec<CreatorWallet>,
    },
    RewardsUserChanged(RewardsUser),
    GlobalStateChanged(GlobalState),
    MonthlyContributionChanged(bool),

    // ===== Results =====
    ShowUiDidComplete,
    ShowUiDidFail(OperationError),
}
