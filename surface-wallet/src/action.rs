//! Actions of the wallet surfaces
//!
//! Intents come from the UI, events from the native observers, and `Did*`
//! results from completed remote calls. Event and result actions carry
//! absolute values, so applying one twice leaves the state unchanged.

use surface_dispatch::{Action, OperationError};

use crate::types::{AccountInfo, GasEstimation, NftMetadata, PanelView, RecoveryPhrase, Timeline, TransactionInfo};

#[derive(Action, Clone, Debug, PartialEq)]
#[action(summary)]
pub enum WalletAction {
    // ===== Polling =====
    /// Periodic balance and gas estimate refresh.
    PollTick,

    // ===== Intents =====
    AccountsFetch,
    BalanceRefresh,
    TransactionsFetch,
    GasEstimatesFetch,
    SelectAccount { address: String },
    LockWallet,
    #[action(redact)]
    UnlockWallet { password: String },
    ApproveTransaction { id: String },
    RejectTransaction { id: String },
    SpeedUpTransaction { id: String },
    RejectAllTransactions,
    QueueNextTransaction,
    SelectPendingTransaction { id: String },
    NavigateTo(PanelView),
    AgreeToTerms,
    SetRestoring(bool),
    SetSelectedTimeline(Timeline),
    SetAutoPin(bool),
    AcknowledgeBackup,
    #[action(redact)]
    RevealRecoveryPhrase { password: String },
    HideRecoveryPhrase,
    NftMetadataFetch { contract_address: String, token_id: String },
    ToggleNftModal(bool),

    // ===== Native events =====
    WalletLocked,
    WalletUnlocked,
    WalletBackedUp,
    SelectedAccountChanged { address: String },
    NewUnapprovedTx(TransactionInfo),
    UnapprovedTxUpdated(TransactionInfo),
    TransactionStatusChanged(TransactionInfo),
    ChainChanged { chain_id: String },
    BalanceChanged { address: String, balance: String },

    // ===== Results =====
    // Balance and NFT results name the request they answer, so a result
    // for a superseded chain or token is dropped.
    AccountsDidLoad(Vec<AccountInfo>),
    BalanceDidLoad { chain_id: String, address: String, balance: String },
    BalanceDidFail { chain_id: String, address: String, error: OperationError },
    TransactionsDidLoad(Vec<TransactionInfo>),
    TransactionsDidFail(OperationError),
    GasEstimatesDidLoad(GasEstimation),
    GasEstimatesDidFail(OperationError),
    NftMetadataDidLoad { contract_address: String, token_id: String, metadata: NftMetadata },
    NftMetadataDidFail { contract_address: String, token_id: String, error: OperationError },
    #[action(redact)]
    RecoveryPhraseDidLoad(RecoveryPhrase),
    OperationDidComplete { operation: &'static str },
    OperationDidFail(OperationError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use surface_dispatch::ActionSummary;

    #[test]
    fn test_poll_tick_name_matches_default_log_exclude() {
        let config = surface_dispatch::ActionLoggerConfig::default();
        assert!(!config.should_log(WalletAction::PollTick.name()));
        assert!(config.should_log(WalletAction::BalanceRefresh.name()));
    }

    #[test]
    fn test_secrets_never_summarized() {
        let unlock = WalletAction::UnlockWallet {
            password: "hunter2".into(),
        };
        assert!(!unlock.summary().contains("hunter2"));

        let phrase = WalletAction::RecoveryPhraseDidLoad(RecoveryPhrase::new("one two"));
        assert_eq!(phrase.summary(), "RecoveryPhraseDidLoad(..)");
    }
}
