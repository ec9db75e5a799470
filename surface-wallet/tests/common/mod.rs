//! Shared helpers for surface integration tests

#![allow(dead_code)]

use std::time::Duration;

use surface_dispatch::{RemoteProxy, StateTree, SurfaceConfig};
use surface_wallet::{MockWallet, MockWalletFactory, WalletRuntime};

/// Dispatch queued and arriving actions until nothing arrives for a while.
///
/// Under a paused clock the wait costs no real time.
pub async fn settle<S: StateTree>(runtime: &mut WalletRuntime<S>) -> usize {
    let mut dispatched = 0;
    while let Ok(Some(_)) = tokio::time::timeout(Duration::from_millis(50), runtime.next()).await {
        dispatched += 1;
    }
    dispatched
}

pub fn config(name: &str) -> SurfaceConfig {
    SurfaceConfig::named(name)
}

pub fn connect(wallet: &MockWallet) -> RemoteProxy<MockWalletFactory> {
    RemoteProxy::connect(MockWalletFactory::new(wallet.clone()))
}
