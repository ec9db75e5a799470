//! Wallet value types shared by state, backend and frame messages

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub address: String,
    pub name: String,
}

impl AccountInfo {
    pub fn new(address: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: name.into(),
        }
    }
}

/// Backend-side status of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxStatus {
    #[default]
    Unapproved,
    Approved,
    Rejected,
    Submitted,
    Confirmed,
    Error,
    Dropped,
}

impl TxStatus {
    /// Waiting for the user to approve or reject.
    pub fn is_pending(self) -> bool {
        self == TxStatus::Unapproved
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransactionInfo {
    pub id: String,
    pub from_address: String,
    pub chain_id: String,
    pub status: TxStatus,
    /// Transactions of one group must be approved in creation order.
    #[serde(default)]
    pub group_id: Option<String>,
    /// Creation time, milliseconds since the epoch.
    pub created_time: u64,
    /// Hex (`0x5208`) or decimal quantity.
    pub gas_limit: String,
    /// Gas price in wei, hex or decimal.
    pub gas_price: String,
}

/// EIP-1559 fee suggestions from the backend. Missing values stay `None`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GasEstimation {
    pub slow_max_priority_fee_per_gas: Option<String>,
    pub avg_max_priority_fee_per_gas: Option<String>,
    pub fast_max_priority_fee_per_gas: Option<String>,
    pub base_fee_per_gas: Option<String>,
}

/// Metadata shown by the NFT display frame.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NftMetadata {
    pub contract_address: String,
    pub token_id: String,
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub chain_name: String,
}

/// Portfolio chart range on the wallet page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeline {
    OneHour,
    #[default]
    OneDay,
    OneWeek,
    OneMonth,
    OneYear,
    All,
}

/// Panel screen currently shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelView {
    #[default]
    Main,
    Accounts,
    Transactions,
    ApproveTransaction,
}

/// Wallet recovery phrase. Never printed, never persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct RecoveryPhrase(String);

impl RecoveryPhrase {
    pub fn new(phrase: impl Into<String>) -> Self {
        Self(phrase.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn word_count(&self) -> usize {
        self.0.split_whitespace().count()
    }
}

impl std::fmt::Debug for RecoveryPhrase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RecoveryPhrase({} words)", self.word_count())
    }
}
