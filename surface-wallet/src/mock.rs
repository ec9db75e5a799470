//! In-process wallet backend for tests and the demo
//!
//! [`MockWallet`] keeps wallet data in memory, counts calls per operation,
//! can hold every call until released, and pushes the events a real backend
//! would push after state-changing calls.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use surface_dispatch::{EventSender, RemoteError, RemoteFactory};
use tokio::sync::watch;

use crate::backend::{JsonRpcEvent, KeyringEvent, TxEvent, WalletEvent, WalletService, WALLET_SERVICE};
use crate::types::{AccountInfo, GasEstimation, NftMetadata, TransactionInfo, TxStatus};

#[derive(Debug, Default)]
struct Data {
    accounts: Vec<AccountInfo>,
    balances: HashMap<String, String>,
    transactions: Vec<TransactionInfo>,
    gas: GasEstimation,
    nfts: Vec<NftMetadata>,
    password: String,
    recovery_phrase: String,
    locked: bool,
}

#[derive(Debug)]
struct Inner {
    data: Mutex<Data>,
    calls: Mutex<HashMap<&'static str, usize>>,
    failures: Mutex<HashMap<&'static str, RemoteError>>,
    events: Mutex<Option<EventSender<WalletEvent>>>,
    refuse_bind: Mutex<bool>,
    open: watch::Sender<bool>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Shared handle to an in-memory wallet. Clones share state.
#[derive(Debug, Clone)]
pub struct MockWallet {
    inner: Arc<Inner>,
}

impl Default for MockWallet {
    fn default() -> Self {
        Self::new()
    }
}

impl MockWallet {
    pub fn new() -> Self {
        let (open, _) = watch::channel(true);
        Self {
            inner: Arc::new(Inner {
                data: Mutex::new(Data {
                    password: "password".to_string(),
                    ..Default::default()
                }),
                calls: Mutex::default(),
                failures: Mutex::default(),
                events: Mutex::default(),
                refuse_bind: Mutex::new(false),
                open,
            }),
        }
    }

    /// A wallet with two funded accounts, one pending transaction and gas
    /// estimates.
    pub fn sample() -> Self {
        let wallet = Self::new();
        wallet.set_accounts(vec![
            AccountInfo::new("0x1111", "Account 1"),
            AccountInfo::new("0x2222", "Account 2"),
        ]);
        wallet.set_balance("0x1111", "1500000000000000000");
        wallet.set_balance("0x2222", "420000000000000");
        wallet.add_transaction(TransactionInfo {
            id: "tx-1".into(),
            from_address: "0x1111".into(),
            chain_id: "0x1".into(),
            status: TxStatus::Unapproved,
            group_id: None,
            created_time: 1_700_000_000_000,
            gas_limit: "0x5208".into(),
            gas_price: "0x4a817c800".into(),
        });
        wallet.set_gas_estimation(GasEstimation {
            slow_max_priority_fee_per_gas: Some("1000000000".into()),
            avg_max_priority_fee_per_gas: Some("1500000000".into()),
            fast_max_priority_fee_per_gas: Some("2000000000".into()),
            base_fee_per_gas: Some("30000000000".into()),
        });
        wallet.set_recovery_phrase("abandon ability able about above absent absorb abstract absurd abuse access accident");
        wallet
    }

    pub fn set_accounts(&self, accounts: Vec<AccountInfo>) {
        lock(&self.inner.data).accounts = accounts;
    }

    pub fn set_balance(&self, address: &str, balance: &str) {
        lock(&self.inner.data)
            .balances
            .insert(address.to_string(), balance.to_string());
    }

    pub fn add_transaction(&self, tx: TransactionInfo) {
        lock(&self.inner.data).transactions.push(tx);
    }

    pub fn set_gas_estimation(&self, gas: GasEstimation) {
        lock(&self.inner.data).gas = gas;
    }

    pub fn add_nft(&self, nft: NftMetadata) {
        lock(&self.inner.data).nfts.push(nft);
    }

    pub fn set_recovery_phrase(&self, phrase: &str) {
        lock(&self.inner.data).recovery_phrase = phrase.to_string();
    }

    pub fn is_locked(&self) -> bool {
        lock(&self.inner.data).locked
    }

    pub fn transaction(&self, id: &str) -> Option<TransactionInfo> {
        lock(&self.inner.data)
            .transactions
            .iter()
            .find(|tx| tx.id == id)
            .cloned()
    }

    /// Number of calls made to `operation` so far.
    pub fn calls(&self, operation: &str) -> usize {
        lock(&self.inner.calls).get(operation).copied().unwrap_or(0)
    }

    /// Make every call to `operation` fail with `error`.
    pub fn fail(&self, operation: &'static str, error: RemoteError) {
        lock(&self.inner.failures).insert(operation, error);
    }

    pub fn recover(&self, operation: &str) {
        lock(&self.inner.failures).remove(operation);
    }

    /// Refuse the next binds (the proxy becomes unavailable).
    pub fn refuse_bind(&self, refuse: bool) {
        *lock(&self.inner.refuse_bind) = refuse;
    }

    /// Hold every call (after it is counted) until [`release`](Self::release).
    pub fn hold(&self) {
        self.inner.open.send_replace(false);
    }

    pub fn release(&self) {
        self.inner.open.send_replace(true);
    }

    /// Push an event to the bound surface. Returns `false` if nothing is
    /// bound or the surface stopped observing.
    pub fn push(&self, event: WalletEvent) -> bool {
        match lock(&self.inner.events).as_ref() {
            Some(events) => events.send(event),
            None => false,
        }
    }

    /// Count the call, wait while held, then apply any injected failure.
    async fn enter(&self, operation: &'static str) -> Result<(), RemoteError> {
        *lock(&self.inner.calls).entry(operation).or_default() += 1;

        let mut open = self.inner.open.subscribe();
        // The sender lives in `inner`, so this only ends once released
        let _ = open.wait_for(|open| *open).await;

        match lock(&self.inner.failures).get(operation) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn set_status(&self, id: &str, status: TxStatus) -> Result<TransactionInfo, RemoteError> {
        let mut data = lock(&self.inner.data);
        let tx = data
            .transactions
            .iter_mut()
            .find(|tx| tx.id == id)
            .ok_or_else(|| RemoteError::failed(-32602, format!("unknown transaction {id}")))?;
        tx.status = status;
        Ok(tx.clone())
    }
}

#[async_trait]
impl WalletService for MockWallet {
    async fn get_accounts(&self) -> Result<Vec<AccountInfo>, RemoteError> {
        self.enter("get_accounts").await?;
        Ok(lock(&self.inner.data).accounts.clone())
    }

    async fn get_balance(&self, address: &str, _chain_id: &str) -> Result<String, RemoteError> {
        self.enter("get_balance").await?;
        let data = lock(&self.inner.data);
        Ok(data.balances.get(address).cloned().unwrap_or_else(|| "0".to_string()))
    }

    async fn get_transactions(&self) -> Result<Vec<TransactionInfo>, RemoteError> {
        self.enter("get_transactions").await?;
        Ok(lock(&self.inner.data).transactions.clone())
    }

    async fn get_gas_estimation(&self) -> Result<GasEstimation, RemoteError> {
        self.enter("get_gas_estimation").await?;
        Ok(lock(&self.inner.data).gas.clone())
    }

    async fn set_selected_account(&self, address: &str) -> Result<(), RemoteError> {
        self.enter("set_selected_account").await?;
        self.push(WalletEvent::Keyring(KeyringEvent::SelectedAccountChanged {
            address: address.to_string(),
        }));
        Ok(())
    }

    async fn lock(&self) -> Result<(), RemoteError> {
        self.enter("lock").await?;
        lock(&self.inner.data).locked = true;
        self.push(WalletEvent::Keyring(KeyringEvent::Locked));
        Ok(())
    }

    async fn unlock(&self, password: &str) -> Result<bool, RemoteError> {
        self.enter("unlock").await?;
        let unlocked = {
            let mut data = lock(&self.inner.data);
            if data.password == password {
                data.locked = false;
                true
            } else {
                false
            }
        };
        if unlocked {
            self.push(WalletEvent::Keyring(KeyringEvent::Unlocked));
        }
        Ok(unlocked)
    }

    async fn approve_transaction(&self, id: &str) -> Result<(), RemoteError> {
        self.enter("approve_transaction").await?;
        let tx = self.set_status(id, TxStatus::Submitted)?;
        self.push(WalletEvent::Tx(TxEvent::StatusChanged(tx)));
        Ok(())
    }

    async fn reject_transaction(&self, id: &str) -> Result<(), RemoteError> {
        self.enter("reject_transaction").await?;
        let tx = self.set_status(id, TxStatus::Rejected)?;
        self.push(WalletEvent::Tx(TxEvent::StatusChanged(tx)));
        Ok(())
    }

    async fn speed_up_transaction(&self, id: &str) -> Result<(), RemoteError> {
        self.enter("speed_up_transaction").await?;
        self.transaction(id)
            .map(|_| ())
            .ok_or_else(|| RemoteError::failed(-32602, format!("unknown transaction {id}")))
    }

    async fn notify_backup_complete(&self) -> Result<(), RemoteError> {
        self.enter("notify_backup_complete").await?;
        self.push(WalletEvent::Keyring(KeyringEvent::BackedUp));
        Ok(())
    }

    async fn get_recovery_phrase(&self, password: &str) -> Result<String, RemoteError> {
        self.enter("get_recovery_phrase").await?;
        let data = lock(&self.inner.data);
        if data.password != password {
            return Err(RemoteError::failed(1, "incorrect password"));
        }
        Ok(data.recovery_phrase.clone())
    }

    async fn get_nft_metadata(
        &self,
        contract_address: &str,
        token_id: &str,
    ) -> Result<NftMetadata, RemoteError> {
        self.enter("get_nft_metadata").await?;
        lock(&self.inner.data)
            .nfts
            .iter()
            .find(|nft| nft.contract_address == contract_address && nft.token_id == token_id)
            .cloned()
            .ok_or_else(|| RemoteError::failed(404, "token not found"))
    }
}

/// Binds a [`MockWallet`] as the wallet remote.
#[derive(Debug, Clone)]
pub struct MockWalletFactory {
    wallet: MockWallet,
}

impl MockWalletFactory {
    pub fn new(wallet: MockWallet) -> Self {
        Self { wallet }
    }
}

impl RemoteFactory for MockWalletFactory {
    type Remote = dyn WalletService;
    type Event = WalletEvent;

    fn service(&self) -> &'static str {
        WALLET_SERVICE
    }

    fn bind(&self, events: EventSender<WalletEvent>) -> Result<Arc<dyn WalletService>, RemoteError> {
        if *lock(&self.wallet.inner.refuse_bind) {
            return Err(RemoteError::unavailable(WALLET_SERVICE));
        }
        *lock(&self.wallet.inner.events) = Some(events);
        Ok(Arc::new(self.wallet.clone()))
    }
}

/// Shorthand for pushing a json-rpc balance change.
pub fn balance_changed(address: &str, balance: &str) -> WalletEvent {
    WalletEvent::JsonRpc(JsonRpcEvent::BalanceChanged {
        address: address.to_string(),
        balance: balance.to_string(),
    })
}
