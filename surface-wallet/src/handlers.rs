//! Effect handler issuing wallet remote calls
//!
//! Every call runs on the surface's task manager and reports back with a
//! result action. Reads are de-duplicated by operation and parameters, so
//! overlapping refreshes share one in-flight call. Password calls replace
//! the one in flight instead, so a retry is never joined to a wrong attempt
//! and the password never ends up in a task key.

use std::future::Future;
use std::sync::Arc;

use surface_dispatch::{
    EffectContext, EffectHandler, ErrorKind, OperationError, RemoteError, RemoteHandle,
    RemoteProxy, TaskKey,
};

use crate::action::WalletAction;
use crate::backend::{WalletFactory, WalletService};
use crate::effect::WalletEffect;
use crate::types::RecoveryPhrase;

type Remote = Arc<dyn WalletService>;

/// Handles [`WalletEffect`]s against the proxy's current wallet remote.
///
/// While the proxy is unbound, every effect resolves to a
/// `BackendUnavailable` failure action. The remote is looked up per effect,
/// so calls issued after a reconnect reach the new binding.
pub struct WalletEffects {
    remote: RemoteHandle<dyn WalletService>,
}

impl WalletEffects {
    pub fn new(remote: RemoteHandle<dyn WalletService>) -> Self {
        Self { remote }
    }

    pub fn from_proxy<F: WalletFactory>(proxy: &RemoteProxy<F>) -> Self {
        Self::new(proxy.handle())
    }
}

async fn call<T, F, Fut>(remote: Result<Remote, RemoteError>, f: F) -> Result<T, RemoteError>
where
    F: FnOnce(Remote) -> Fut,
    Fut: Future<Output = Result<T, RemoteError>>,
{
    f(remote?).await
}

fn failed(operation: &'static str, error: RemoteError) -> OperationError {
    tracing::warn!(operation, error = %error, "Remote call failed");
    OperationError::remote(operation, &error)
}

fn completed(operation: &'static str, result: Result<(), RemoteError>) -> WalletAction {
    match result {
        Ok(()) => WalletAction::OperationDidComplete { operation },
        Err(e) => WalletAction::OperationDidFail(failed(operation, e)),
    }
}

impl EffectHandler<WalletEffect, WalletAction> for WalletEffects {
    fn handle(&mut self, effect: WalletEffect, ctx: &mut EffectContext<'_, WalletAction>) {
        let operation = effect.operation();
        let remote = self.remote.get();

        match effect {
            WalletEffect::FetchAccounts => {
                ctx.tasks().request(operation, async move {
                    match call(remote, |w| async move { w.get_accounts().await }).await {
                        Ok(accounts) => WalletAction::AccountsDidLoad(accounts),
                        Err(e) => WalletAction::OperationDidFail(failed(operation, e)),
                    }
                });
            }

            WalletEffect::FetchBalances { chain_id, addresses } => {
                for address in addresses {
                    let key = TaskKey::with_params(operation, (&address, &chain_id));
                    let remote = remote.clone();
                    let chain_id = chain_id.clone();
                    ctx.tasks().request(key, async move {
                        let result = call(remote, |w| {
                            let (address, chain_id) = (address.clone(), chain_id.clone());
                            async move { w.get_balance(&address, &chain_id).await }
                        })
                        .await;
                        match result {
                            Ok(balance) => WalletAction::BalanceDidLoad {
                                chain_id,
                                address,
                                balance,
                            },
                            Err(e) => WalletAction::BalanceDidFail {
                                chain_id,
                                address,
                                error: failed(operation, e),
                            },
                        }
                    });
                }
            }

            WalletEffect::FetchTransactions => {
                ctx.tasks().request(operation, async move {
                    match call(remote, |w| async move { w.get_transactions().await }).await {
                        Ok(transactions) => WalletAction::TransactionsDidLoad(transactions),
                        Err(e) => WalletAction::TransactionsDidFail(failed(operation, e)),
                    }
                });
            }

            WalletEffect::FetchGasEstimates => {
                ctx.tasks().request(operation, async move {
                    match call(remote, |w| async move { w.get_gas_estimation().await }).await {
                        Ok(estimates) => WalletAction::GasEstimatesDidLoad(estimates),
                        Err(e) => WalletAction::GasEstimatesDidFail(failed(operation, e)),
                    }
                });
            }

            // Latest selection wins
            WalletEffect::SetSelectedAccount { address } => {
                ctx.tasks().spawn(operation, async move {
                    let result =
                        call(remote, |w| async move { w.set_selected_account(&address).await }).await;
                    completed(operation, result)
                });
            }

            WalletEffect::Lock => {
                ctx.tasks().request(operation, async move {
                    completed(operation, call(remote, |w| async move { w.lock().await }).await)
                });
            }

            // Latest attempt wins
            WalletEffect::Unlock { password } => {
                ctx.tasks().spawn(operation, async move {
                    match call(remote, |w| async move { w.unlock(&password).await }).await {
                        Ok(true) => WalletAction::OperationDidComplete { operation },
                        Ok(false) => WalletAction::OperationDidFail(OperationError {
                            operation: operation.to_string(),
                            kind: ErrorKind::RequestFailed,
                            message: "incorrect password".to_string(),
                        }),
                        Err(e) => WalletAction::OperationDidFail(failed(operation, e)),
                    }
                });
            }

            WalletEffect::Approve { id } => {
                let key = TaskKey::with_params(operation, &id);
                ctx.tasks().request(key, async move {
                    let result = call(remote, |w| async move { w.approve_transaction(&id).await }).await;
                    completed(operation, result)
                });
            }

            WalletEffect::Reject { id } => {
                let key = TaskKey::with_params(operation, &id);
                ctx.tasks().request(key, async move {
                    let result = call(remote, |w| async move { w.reject_transaction(&id).await }).await;
                    completed(operation, result)
                });
            }

            WalletEffect::SpeedUp { id } => {
                let key = TaskKey::with_params(operation, &id);
                ctx.tasks().request(key, async move {
                    let result =
                        call(remote, |w| async move { w.speed_up_transaction(&id).await }).await;
                    completed(operation, result)
                });
            }

            WalletEffect::NotifyBackupComplete => {
                ctx.tasks().request(operation, async move {
                    let result = call(remote, |w| async move { w.notify_backup_complete().await }).await;
                    completed(operation, result)
                });
            }

            WalletEffect::FetchRecoveryPhrase { password } => {
                ctx.tasks().spawn(operation, async move {
                    match call(remote, |w| async move { w.get_recovery_phrase(&password).await }).await {
                        Ok(phrase) => WalletAction::RecoveryPhraseDidLoad(RecoveryPhrase::new(phrase)),
                        Err(e) => WalletAction::OperationDidFail(failed(operation, e)),
                    }
                });
            }

            WalletEffect::FetchNftMetadata {
                contract_address,
                token_id,
            } => {
                let key = TaskKey::with_params(operation, (&contract_address, &token_id));
                ctx.tasks().request(key, async move {
                    let result = call(remote, |w| {
                        let (contract_address, token_id) = (contract_address.clone(), token_id.clone());
                        async move { w.get_nft_metadata(&contract_address, &token_id).await }
                    })
                    .await;
                    match result {
                        Ok(metadata) => WalletAction::NftMetadataDidLoad {
                            contract_address,
                            token_id,
                            metadata,
                        },
                        Err(e) => WalletAction::NftMetadataDidFail {
                            contract_address,
                            token_id,
                            error: failed(operation, e),
                        },
                    }
                });
            }
        }
    }
}
