//! Translation of native wallet events into actions

use crate::action::WalletAction;
use crate::backend::{JsonRpcEvent, KeyringEvent, TxEvent, WalletEvent};

/// Map a pushed event to the action that applies it.
///
/// Events the surfaces do not track return `None` and are ignored.
pub fn translate_wallet_event(event: WalletEvent) -> Option<WalletAction> {
    let action = match event {
        WalletEvent::Keyring(event) => match event {
            KeyringEvent::Locked => WalletAction::WalletLocked,
            KeyringEvent::Unlocked => WalletAction::WalletUnlocked,
            // Carries no payload; refetch the full list
            KeyringEvent::AccountsChanged => WalletAction::AccountsFetch,
            KeyringEvent::SelectedAccountChanged { address } => {
                WalletAction::SelectedAccountChanged { address }
            }
            KeyringEvent::BackedUp => WalletAction::WalletBackedUp,
            KeyringEvent::AutoLockMinutesChanged => return None,
        },
        WalletEvent::Tx(event) => match event {
            TxEvent::NewUnapproved(tx) => WalletAction::NewUnapprovedTx(tx),
            TxEvent::UnapprovedUpdated(tx) => WalletAction::UnapprovedTxUpdated(tx),
            TxEvent::StatusChanged(tx) => WalletAction::TransactionStatusChanged(tx),
        },
        WalletEvent::JsonRpc(event) => match event {
            JsonRpcEvent::ChainChanged { chain_id } => WalletAction::ChainChanged { chain_id },
            JsonRpcEvent::BalanceChanged { address, balance } => {
                WalletAction::BalanceChanged { address, balance }
            }
            // Fee suggestions differ between fee models
            JsonRpcEvent::Eip1559Changed { .. } => WalletAction::GasEstimatesFetch,
        },
    };
    Some(action)
}
