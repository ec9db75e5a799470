//! Native wallet backend boundary
//!
//! [`WalletService`] is the typed request/response remote; [`WalletEvent`]
//! is what the backend's keyring, tx and json-rpc observers push.

use async_trait::async_trait;
use surface_dispatch::{NativeEvent, RemoteError, RemoteFactory};

use crate::types::{AccountInfo, GasEstimation, NftMetadata, TransactionInfo};

/// Service name used for the remote proxy and the observer subscription.
pub const WALLET_SERVICE: &str = "wallet";

/// Request/response calls into the native wallet.
#[async_trait]
pub trait WalletService: Send + Sync {
    async fn get_accounts(&self) -> Result<Vec<AccountInfo>, RemoteError>;

    /// Balance of `address` on `chain_id`, in wei.
    async fn get_balance(&self, address: &str, chain_id: &str) -> Result<String, RemoteError>;

    async fn get_transactions(&self) -> Result<Vec<TransactionInfo>, RemoteError>;

    async fn get_gas_estimation(&self) -> Result<GasEstimation, RemoteError>;

    async fn set_selected_account(&self, address: &str) -> Result<(), RemoteError>;

    async fn lock(&self) -> Result<(), RemoteError>;

    /// `Ok(false)` when the password is wrong.
    async fn unlock(&self, password: &str) -> Result<bool, RemoteError>;

    async fn approve_transaction(&self, id: &str) -> Result<(), RemoteError>;

    async fn reject_transaction(&self, id: &str) -> Result<(), RemoteError>;

    async fn speed_up_transaction(&self, id: &str) -> Result<(), RemoteError>;

    async fn notify_backup_complete(&self) -> Result<(), RemoteError>;

    async fn get_recovery_phrase(&self, password: &str) -> Result<String, RemoteError>;

    async fn get_nft_metadata(
        &self,
        contract_address: &str,
        token_id: &str,
    ) -> Result<NftMetadata, RemoteError>;
}

/// Factory binding a [`WalletService`] together with its event router.
pub trait WalletFactory: RemoteFactory<Remote = dyn WalletService, Event = WalletEvent> {}

impl<F> WalletFactory for F where F: RemoteFactory<Remote = dyn WalletService, Event = WalletEvent> {}

#[derive(Debug, Clone, PartialEq)]
pub enum KeyringEvent {
    Locked,
    Unlocked,
    AccountsChanged,
    SelectedAccountChanged { address: String },
    BackedUp,
    AutoLockMinutesChanged,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TxEvent {
    NewUnapproved(TransactionInfo),
    UnapprovedUpdated(TransactionInfo),
    StatusChanged(TransactionInfo),
}

#[derive(Debug, Clone, PartialEq)]
pub enum JsonRpcEvent {
    ChainChanged { chain_id: String },
    BalanceChanged { address: String, balance: String },
    Eip1559Changed { chain_id: String, is_eip1559: bool },
}

/// A push notification from one of the backend's observers.
#[derive(Debug, Clone, PartialEq)]
pub enum WalletEvent {
    Keyring(KeyringEvent),
    Tx(TxEvent),
    JsonRpc(JsonRpcEvent),
}

impl NativeEvent for WalletEvent {
    fn name(&self) -> &'static str {
        match self {
            WalletEvent::Keyring(event) => match event {
                KeyringEvent::Locked => "keyring.locked",
                KeyringEvent::Unlocked => "keyring.unlocked",
                KeyringEvent::AccountsChanged => "keyring.accounts_changed",
                KeyringEvent::SelectedAccountChanged { .. } => "keyring.selected_account_changed",
                KeyringEvent::BackedUp => "keyring.backed_up",
                KeyringEvent::AutoLockMinutesChanged => "keyring.auto_lock_minutes_changed",
            },
            WalletEvent::Tx(event) => match event {
                TxEvent::NewUnapproved(_) => "tx.new_unapproved",
                TxEvent::UnapprovedUpdated(_) => "tx.unapproved_updated",
                TxEvent::StatusChanged(_) => "tx.status_changed",
            },
            WalletEvent::JsonRpc(event) => match event {
                JsonRpcEvent::ChainChanged { .. } => "json_rpc.chain_changed",
                JsonRpcEvent::BalanceChanged { .. } => "json_rpc.balance_changed",
                JsonRpcEvent::Eip1559Changed { .. } => "json_rpc.eip1559_changed",
            },
        }
    }
}
