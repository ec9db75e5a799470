//! Slices and state trees of the wallet surfaces
//!
//! The `wallet` slice is shared by both surfaces; each surface adds its own
//! slice and owns an independent tree.

use std::collections::{BTreeMap, BTreeSet};

use surface_dispatch::bitflags::bitflags;
use surface_dispatch::{OperationError, Slice, StateTree};

use crate::types::{
    AccountInfo, GasEstimation, NftMetadata, PanelView, RecoveryPhrase, Timeline, TransactionInfo,
};

/// Accounts, network, balances and transactions.
#[derive(Slice, Clone, Debug, Default, PartialEq)]
#[slice(name = "wallet")]
pub struct WalletState {
    #[slice(persist)]
    pub accounts: Vec<AccountInfo>,
    /// Owned by the backend; re-read on every mount.
    pub selected_account: Option<String>,
    pub selected_chain_id: String,
    pub is_wallet_locked: bool,
    #[slice(persist)]
    pub is_wallet_created: bool,
    #[slice(persist)]
    pub is_wallet_backed_up: bool,
    #[slice(persist)]
    pub selected_currency: String,
    /// Latest known balance per address, in wei.
    pub balances: BTreeMap<String, String>,
    #[slice(persist)]
    pub transactions: Vec<TransactionInfo>,
    pub gas_estimates: Option<GasEstimation>,
    pub has_fee_estimates_error: bool,
    /// Addresses with a balance request in flight.
    pub loading_balances: BTreeSet<String>,
    pub is_fetching_transactions: bool,
    pub last_action_error: Option<OperationError>,
}

impl WalletState {
    pub fn is_loading_balances(&self) -> bool {
        !self.loading_balances.is_empty()
    }

    pub fn transaction(&self, id: &str) -> Option<&TransactionInfo> {
        self.transactions.iter().find(|tx| tx.id == id)
    }

    pub fn addresses(&self) -> Vec<String> {
        self.accounts.iter().map(|a| a.address.clone()).collect()
    }

    /// Insert or replace a transaction by id. Returns whether anything changed.
    pub fn upsert_transaction(&mut self, tx: TransactionInfo) -> bool {
        match self.transactions.iter_mut().find(|t| t.id == tx.id) {
            Some(existing) if *existing == tx => false,
            Some(existing) => {
                *existing = tx;
                true
            }
            None => {
                self.transactions.push(tx);
                true
            }
        }
    }
}

/// Panel navigation. Nothing here is persisted.
#[derive(Slice, Clone, Debug, Default, PartialEq)]
#[slice(name = "panel")]
pub struct PanelState {
    pub selected_panel: PanelView,
    pub selected_pending_transaction_id: Option<String>,
    pub last_action_error: Option<OperationError>,
}

/// Full-page wallet: onboarding, portfolio and NFT details.
#[derive(Slice, Clone, Debug, Default, PartialEq)]
#[slice(name = "page")]
pub struct PageState {
    #[slice(persist)]
    pub wallet_terms_acknowledged: bool,
    #[slice(persist)]
    pub setup_still_in_progress: bool,
    #[slice(persist)]
    pub show_is_restoring: bool,
    #[slice(persist)]
    pub selected_timeline: Timeline,
    #[slice(persist)]
    pub is_auto_pin_enabled: bool,
    #[slice(persist)]
    pub nft_metadata: Option<NftMetadata>,
    #[slice(persist)]
    pub nft_metadata_error: Option<String>,
    pub is_fetching_nft_metadata: bool,
    /// Contract address and token id of the latest metadata request.
    pub requested_nft: Option<(String, String)>,
    pub show_nft_modal: bool,
    pub recovery_phrase: Option<RecoveryPhrase>,
    pub last_action_error: Option<OperationError>,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PanelSlices: u8 {
        const PANEL = 1 << 0;
        const WALLET = 1 << 1;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PageSlices: u8 {
        const PAGE = 1 << 0;
        const WALLET = 1 << 1;
    }
}

/// State of the wallet panel surface.
#[derive(StateTree, Clone, Debug, Default, PartialEq)]
#[tree(changes = "PanelSlices", persist)]
pub struct PanelTree {
    #[tree(flag = "PANEL")]
    pub panel: PanelState,
    #[tree(flag = "WALLET")]
    pub wallet: WalletState,
}

/// State of the wallet page surface.
#[derive(StateTree, Clone, Debug, Default, PartialEq)]
#[tree(changes = "PageSlices", persist)]
pub struct PageTree {
    #[tree(flag = "PAGE")]
    pub page: PageState,
    #[tree(flag = "WALLET")]
    pub wallet: WalletState,
}
