//! Tip panel state
//!
//! One `tip_panel` slice holding the creator being tipped, the user's
//! rewards wallet and the global tipping parameters. Nothing is persisted:
//! the backend pushes the full picture every time the panel opens.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use surface_dispatch::bitflags::bitflags;
use surface_dispatch::{OperationError, Slice, StateTree};

/// Custodial wallet providers a user or creator can be connected to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExternalWalletProvider {
    Bitflyer,
    Gemini,
    Uphold,
    Zebpay,
    Solana,
}

impl ExternalWalletProvider {
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Bitflyer => "bitFlyer",
            Self::Gemini => "Gemini",
            Self::Uphold => "Uphold",
            Self::Zebpay => "ZebPay",
            Self::Solana => "Solana",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatorBanner {
    pub title: String,
    pub description: String,
    pub logo: String,
    pub background: String,
    pub links: BTreeMap<String, String>,
    /// Tip amounts suggested by the creator. Empty means use the defaults.
    pub amounts: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatorWallet {
    pub provider: ExternalWalletProvider,
    pub address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardsUser {
    pub balance: f64,
    pub wallet_provider: Option<ExternalWalletProvider>,
    pub wallet_authorized: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalState {
    pub exchange_rate: f64,
    pub exchange_currency: String,
    pub default_amounts: Vec<f64>,
}

impl Default for GlobalState {
    fn default() -> Self {
        Self {
            exchange_rate: 1.0,
            exchange_currency: "USD".to_string(),
            default_amounts: vec![1.0, 5.0, 10.0],
        }
    }
}

/// What the tip form can show for the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TipFormStatus {
    /// The user has no rewards wallet connected.
    ConnectAccount,
    /// The creator has no wallet to receive tips.
    CreatorNotSetUp,
    WalletNotAuthorized,
    /// The creator only accepts tips through another provider.
    ProviderMismatch {
        user: ExternalWalletProvider,
        creator: ExternalWalletProvider,
    },
    Ready,
}

#[derive(Slice, Clone, Debug, PartialEq)]
#[slice(name = "tip_panel")]
pub struct TipPanelState {
    /// Set until the creator's banner and wallets arrive.
    pub loading: bool,
    pub creator_banner: CreatorBanner,
    pub creator_wallets: Vec<CreatorWallet>,
    pub rewards_user: RewardsUser,
    pub global_state: GlobalState,
    pub monthly_contribution_set: bool,
    /// The native side has been asked to show the panel.
    pub ui_requested: bool,
    pub last_action_error: Option<OperationError>,
}

impl Default for TipPanelState {
    fn default() -> Self {
        Self {
            loading: true,
            creator_banner: CreatorBanner::default(),
            creator_wallets: Vec::new(),
            rewards_user: RewardsUser::default(),
            global_state: GlobalState::default(),
            monthly_contribution_set: false,
            ui_requested: false,
            last_action_error: None,
        }
    }
}

impl TipPanelState {
    /// Amount choices: the creator's own when set, else the global defaults.
    pub fn amount_options(&self) -> &[f64] {
        if self.creator_banner.amounts.is_empty() {
            &self.global_state.default_amounts
        } else {
            &self.creator_banner.amounts
        }
    }

    /// Checks run in order; the first that fails decides what the form shows.
    pub fn form_status(&self) -> TipFormStatus {
        let Some(user_provider) = self.rewards_user.wallet_provider else {
            return TipFormStatus::ConnectAccount;
        };
        let Some(first) = self.creator_wallets.first() else {
            return TipFormStatus::CreatorNotSetUp;
        };
        if !self.rewards_user.wallet_authorized {
            return TipFormStatus::WalletNotAuthorized;
        }
        if !self.creator_wallets.iter().any(|w| w.provider == user_provider) {
            return TipFormStatus::ProviderMismatch {
                user: user_provider,
                creator: first.provider,
            };
        }
        TipFormStatus::Ready
    }

    /// Balance converted into the exchange currency.
    pub fn balance_in_currency(&self) -> f64 {
        self.rewards_user.balance * self.global_state.exchange_rate
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TipPanelSlices: u8 {
        const TIP_PANEL = 1 << 0;
    }
}

#[derive(StateTree, Clone, Debug, Default, PartialEq)]
#[tree(changes = "TipPanelSlices")]
pub struct TipPanelTree {
    #[tree(flag = "TIP_PANEL")]
    pub tip_panel: TipPanelState,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wallet(provider: ExternalWalletProvider) -> CreatorWallet {
        CreatorWallet {
            provider,
            address: "creator".into(),
        }
    }

    #[test]
    fn test_defaults() {
        let state = TipPanelState::default();
        assert!(state.loading);
        assert!(!state.monthly_contribution_set);
        assert_eq!(state.global_state.exchange_currency, "USD");
        assert_eq!(state.global_state.exchange_rate, 1.0);
        assert_eq!(state.amount_options(), &[1.0, 5.0, 10.0]);
        assert_eq!(state.rewards_user.wallet_provider, None);
    }

    #[test]
    fn test_creator_amounts_take_precedence() {
        let mut state = TipPanelState::default();
        state.creator_banner.amounts = vec![2.0, 20.0];
        assert_eq!(state.amount_options(), &[2.0, 20.0]);
    }

    #[test]
    fn test_form_status_order() {
        let mut state = TipPanelState::default();
        assert_eq!(state.form_status(), TipFormStatus::ConnectAccount);

        state.rewards_user.wallet_provider = Some(ExternalWalletProvider::Uphold);
        assert_eq!(state.form_status(), TipFormStatus::CreatorNotSetUp);

        state.creator_wallets = vec![wallet(ExternalWalletProvider::Gemini)];
        assert_eq!(state.form_status(), TipFormStatus::WalletNotAuthorized);

        state.rewards_user.wallet_authorized = true;
        assert_eq!(
            state.form_status(),
            TipFormStatus::ProviderMismatch {
                user: ExternalWalletProvider::Uphold,
                creator: ExternalWalletProvider::Gemini,
            }
        );

        state.creator_wallets.push(wallet(ExternalWalletProvider::Uphold));
        assert_eq!(state.form_status(), TipFormStatus::Ready);
    }

    #[test]
    fn test_balance_in_currency() {
        let mut state = TipPanelState::default();
        state.rewards_user.balance = 4.0;
        state.global_state.exchange_rate = 0.25;
        assert_eq!(state.balance_in_currency(), 1.0);
    }

    #[test]
    fn test_nothing_is_persisted() {
        use surface_dispatch::Persist;
        assert!(TipPanelState::ALLOW_LIST.is_empty());
    }

    #[test]
    fn test_wire_names() {
        let user = RewardsUser {
            balance: 1.5,
            wallet_provider: Some(ExternalWalletProvider::Bitflyer),
            wallet_authorized: true,
        };
        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value["walletProvider"], "bitflyer");
        assert_eq!(value["walletAuthorized"], true);
    }
}
