//! Remote work requested by the wallet reducers

/// A remote call to issue. Handled by [`WalletEffects`](crate::handlers::WalletEffects).
#[derive(Clone, PartialEq)]
pub enum WalletEffect {
    FetchAccounts,
    /// One request per address.
    FetchBalances { chain_id: String, addresses: Vec<String> },
    FetchTransactions,
    FetchGasEstimates,
    SetSelectedAccount { address: String },
    Lock,
    Unlock { password: String },
    Approve { id: String },
    Reject { id: String },
    SpeedUp { id: String },
    NotifyBackupComplete,
    FetchRecoveryPhrase { password: String },
    FetchNftMetadata { contract_address: String, token_id: String },
}

impl WalletEffect {
    /// Backend operation name, also used in `OperationError`.
    pub fn operation(&self) -> &'static str {
        match self {
            WalletEffect::FetchAccounts => "get_accounts",
            WalletEffect::FetchBalances { .. } => "get_balance",
            WalletEffect::FetchTransactions => "get_transactions",
            WalletEffect::FetchGasEstimates => "get_gas_estimation",
            WalletEffect::SetSelectedAccount { .. } => "set_selected_account",
            WalletEffect::Lock => "lock",
            WalletEffect::Unlock { .. } => "unlock",
            WalletEffect::Approve { .. } => "approve_transaction",
            WalletEffect::Reject { .. } => "reject_transaction",
            WalletEffect::SpeedUp { .. } => "speed_up_transaction",
            WalletEffect::NotifyBackupComplete => "notify_backup_complete",
            WalletEffect::FetchRecoveryPhrase { .. } => "get_recovery_phrase",
            WalletEffect::FetchNftMetadata { .. } => "get_nft_metadata",
        }
    }
}

impl std::fmt::Debug for WalletEffect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WalletEffect::FetchBalances { chain_id, addresses } => f
                .debug_struct("FetchBalances")
                .field("chain_id", chain_id)
                .field("addresses", &addresses.len())
                .finish(),
            WalletEffect::SetSelectedAccount { address } => {
                write!(f, "SetSelectedAccount({address})")
            }
            WalletEffect::Approve { id } | WalletEffect::Reject { id } | WalletEffect::SpeedUp { id } => {
                write!(f, "{}({id})", self.operation())
            }
            WalletEffect::FetchNftMetadata {
                contract_address,
                token_id,
            } => write!(f, "FetchNftMetadata({contract_address}, {token_id})"),
            // Unit variants and the ones carrying a password
            other => f.write_str(other.operation()),
        }
    }
}
