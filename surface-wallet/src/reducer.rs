//! Wallet slice reducer and intent validation, shared by both surfaces
//!
//! Generic over any tree holding a [`WalletState`], so the panel and the
//! page reducers delegate everything wallet-related here.

use surface_dispatch::bitflags::Flags;
use surface_dispatch::{DispatchResult, HasSlice, OperationError, ValidationError};

use crate::action::WalletAction;
use crate::effect::WalletEffect;
use crate::state::WalletState;
use crate::transactions::PendingQueue;
use crate::types::TxStatus;

/// Assign `value` to `field`, reporting whether it changed.
pub(crate) fn set<T: PartialEq>(field: &mut T, value: T) -> bool {
    if *field == value {
        false
    } else {
        *field = value;
        true
    }
}

fn touched<C: Flags + Copy, E>(flag: C, changed: bool) -> DispatchResult<C, E> {
    if changed {
        DispatchResult::changed(flag)
    } else {
        DispatchResult::unchanged()
    }
}

/// Clear `last_action_error` if it was left by `operation`.
pub(crate) fn clear_error_of(error: &mut Option<OperationError>, operation: &str) -> bool {
    let matches = error.as_ref().is_some_and(|e| e.operation == operation);
    matches && set(error, None)
}

fn fetch_balances(wallet: &mut WalletState) -> Option<WalletEffect> {
    let addresses = wallet.addresses();
    if addresses.is_empty() {
        return None;
    }
    wallet.loading_balances.extend(addresses.iter().cloned());
    Some(WalletEffect::FetchBalances {
        chain_id: wallet.selected_chain_id.clone(),
        addresses,
    })
}

/// Reduce an action against the tree's wallet slice.
///
/// Actions the wallet slice does not handle return an unchanged result.
pub fn reduce_wallet<S>(state: &mut S, action: WalletAction) -> DispatchResult<S::Changes, WalletEffect>
where
    S: HasSlice<WalletState>,
{
    let flag = <S as HasSlice<WalletState>>::FLAG;
    let wallet = <S as HasSlice<WalletState>>::slice_mut(state);

    match action {
        WalletAction::PollTick => {
            let before = wallet.loading_balances.len();
            let mut effects: Vec<_> = fetch_balances(wallet).into_iter().collect();
            effects.push(WalletEffect::FetchGasEstimates);
            let changed = wallet.loading_balances.len() != before;
            touched(flag, changed).merge(DispatchResult::effects(effects))
        }

        // ===== Intents =====
        WalletAction::AccountsFetch => DispatchResult::effect(WalletEffect::FetchAccounts),

        WalletAction::BalanceRefresh => {
            let before = wallet.loading_balances.len();
            match fetch_balances(wallet) {
                Some(effect) => {
                    let changed = wallet.loading_balances.len() != before;
                    touched(flag, changed).with(effect)
                }
                None => DispatchResult::unchanged(),
            }
        }

        WalletAction::TransactionsFetch => {
            let changed = set(&mut wallet.is_fetching_transactions, true);
            touched(flag, changed).with(WalletEffect::FetchTransactions)
        }

        WalletAction::GasEstimatesFetch => DispatchResult::effect(WalletEffect::FetchGasEstimates),

        WalletAction::SelectAccount { address } => {
            let changed = set(&mut wallet.selected_account, Some(address.clone()));
            touched(flag, changed).with(WalletEffect::SetSelectedAccount { address })
        }

        WalletAction::LockWallet => DispatchResult::effect(WalletEffect::Lock),

        WalletAction::UnlockWallet { password } => {
            DispatchResult::effect(WalletEffect::Unlock { password })
        }

        WalletAction::ApproveTransaction { id } => match wallet.transaction(&id) {
            Some(tx) if tx.status.is_pending() => DispatchResult::effect(WalletEffect::Approve { id }),
            _ => DispatchResult::unchanged(),
        },

        WalletAction::RejectTransaction { id } => match wallet.transaction(&id) {
            Some(tx) if tx.status.is_pending() => DispatchResult::effect(WalletEffect::Reject { id }),
            _ => DispatchResult::unchanged(),
        },

        WalletAction::SpeedUpTransaction { id } => match wallet.transaction(&id) {
            Some(tx) if tx.status == TxStatus::Submitted => {
                DispatchResult::effect(WalletEffect::SpeedUp { id })
            }
            _ => DispatchResult::unchanged(),
        },

        WalletAction::RejectAllTransactions => {
            let effects = PendingQueue::new(&wallet.transactions, None)
                .ids()
                .into_iter()
                .map(|id| WalletEffect::Reject { id })
                .collect();
            DispatchResult::effects(effects)
        }

        // ===== Native events =====
        WalletAction::WalletLocked => touched(flag, set(&mut wallet.is_wallet_locked, true)),

        WalletAction::WalletUnlocked => {
            let changed = set(&mut wallet.is_wallet_locked, false);
            touched(flag, changed).with(WalletEffect::FetchAccounts)
        }

        WalletAction::WalletBackedUp => touched(flag, set(&mut wallet.is_wallet_backed_up, true)),

        WalletAction::SelectedAccountChanged { address } => {
            touched(flag, set(&mut wallet.selected_account, Some(address)))
        }

        WalletAction::NewUnapprovedTx(tx)
        | WalletAction::UnapprovedTxUpdated(tx)
        | WalletAction::TransactionStatusChanged(tx) => touched(flag, wallet.upsert_transaction(tx)),

        WalletAction::ChainChanged { chain_id } => {
            if !set(&mut wallet.selected_chain_id, chain_id) {
                return DispatchResult::unchanged();
            }
            // Balances are per network
            wallet.balances.clear();
            let result = DispatchResult::changed(flag);
            match fetch_balances(wallet) {
                Some(effect) => result.with(effect),
                None => result,
            }
        }

        WalletAction::BalanceChanged { address, balance } => {
            let loading = wallet.loading_balances.remove(&address);
            let updated = wallet.balances.get(&address) != Some(&balance);
            if updated {
                wallet.balances.insert(address, balance);
            }
            touched(flag, loading || updated)
        }

        // ===== Results =====
        WalletAction::AccountsDidLoad(accounts) => {
            let mut changed = clear_error_of(&mut wallet.last_action_error, "get_accounts");
            changed |= set(&mut wallet.is_wallet_created, !accounts.is_empty());
            let selection_valid = wallet
                .selected_account
                .as_ref()
                .is_some_and(|selected| accounts.iter().any(|a| &a.address == selected));
            if !selection_valid {
                let first = accounts.first().map(|a| a.address.clone());
                changed |= set(&mut wallet.selected_account, first);
            }
            changed |= set(&mut wallet.accounts, accounts);

            let before = wallet.loading_balances.len();
            let effect = fetch_balances(wallet);
            changed |= wallet.loading_balances.len() != before;
            let result = touched(flag, changed);
            match effect {
                Some(effect) => result.with(effect),
                None => result,
            }
        }

        // Fetched for a network that is no longer selected
        WalletAction::BalanceDidLoad { chain_id, .. } | WalletAction::BalanceDidFail { chain_id, .. }
            if chain_id != wallet.selected_chain_id =>
        {
            tracing::debug!(chain_id = %chain_id, "Dropping balance result for previous chain");
            DispatchResult::unchanged()
        }

        WalletAction::BalanceDidLoad { address, balance, .. } => {
            let loading = wallet.loading_balances.remove(&address);
            let updated = wallet.balances.get(&address) != Some(&balance);
            if updated {
                wallet.balances.insert(address, balance);
            }
            let cleared = clear_error_of(&mut wallet.last_action_error, "get_balance");
            touched(flag, loading || updated || cleared)
        }

        WalletAction::BalanceDidFail { address, error, .. } => {
            let loading = wallet.loading_balances.remove(&address);
            let recorded = set(&mut wallet.last_action_error, Some(error));
            touched(flag, loading || recorded)
        }

        WalletAction::TransactionsDidLoad(transactions) => {
            let fetching = set(&mut wallet.is_fetching_transactions, false);
            let updated = set(&mut wallet.transactions, transactions);
            let cleared = clear_error_of(&mut wallet.last_action_error, "get_transactions");
            touched(flag, fetching || updated || cleared)
        }

        WalletAction::TransactionsDidFail(error) => {
            let fetching = set(&mut wallet.is_fetching_transactions, false);
            let recorded = set(&mut wallet.last_action_error, Some(error));
            touched(flag, fetching || recorded)
        }

        WalletAction::GasEstimatesDidLoad(estimates) => {
            let flag_cleared = set(&mut wallet.has_fee_estimates_error, false);
            let updated = set(&mut wallet.gas_estimates, Some(estimates));
            let cleared = clear_error_of(&mut wallet.last_action_error, "get_gas_estimation");
            touched(flag, flag_cleared || updated || cleared)
        }

        WalletAction::GasEstimatesDidFail(error) => {
            let flagged = set(&mut wallet.has_fee_estimates_error, true);
            let recorded = set(&mut wallet.last_action_error, Some(error));
            touched(flag, flagged || recorded)
        }

        WalletAction::OperationDidComplete { operation } => {
            touched(flag, clear_error_of(&mut wallet.last_action_error, operation))
        }

        WalletAction::OperationDidFail(error) => {
            touched(flag, set(&mut wallet.last_action_error, Some(error)))
        }

        _ => DispatchResult::unchanged(),
    }
}

/// UI-side preconditions for wallet intents.
///
/// Rejected intents issue no remote call.
pub fn validate_intent<S>(state: &S, action: &WalletAction) -> Result<(), ValidationError>
where
    S: HasSlice<WalletState>,
{
    let wallet = <S as HasSlice<WalletState>>::slice(state);

    fn require_id(operation: &'static str, id: &str) -> Result<(), ValidationError> {
        if id.trim().is_empty() {
            return Err(ValidationError::new(operation, "transaction id is required"));
        }
        Ok(())
    }

    let pending = |operation: &'static str, id: &str| -> Result<(), ValidationError> {
        require_id(operation, id)?;
        match wallet.transaction(id) {
            None => Err(ValidationError::new(operation, format!("unknown transaction {id}"))),
            Some(tx) if !tx.status.is_pending() => Err(ValidationError::new(
                operation,
                format!("transaction {id} is not pending"),
            )),
            Some(_) => Ok(()),
        }
    };

    match action {
        WalletAction::ApproveTransaction { id } => {
            pending("approve_transaction", id)?;
            if !PendingQueue::new(&wallet.transactions, None).can_approve(id) {
                return Err(ValidationError::new(
                    "approve_transaction",
                    "an earlier transaction in its group must be approved first",
                ));
            }
            Ok(())
        }
        WalletAction::RejectTransaction { id } => pending("reject_transaction", id),
        WalletAction::SpeedUpTransaction { id } => {
            require_id("speed_up_transaction", id)?;
            match wallet.transaction(id) {
                Some(tx) if tx.status == TxStatus::Submitted => Ok(()),
                Some(_) => Err(ValidationError::new(
                    "speed_up_transaction",
                    "only submitted transactions can be sped up",
                )),
                None => Err(ValidationError::new(
                    "speed_up_transaction",
                    format!("unknown transaction {id}"),
                )),
            }
        }
        WalletAction::RejectAllTransactions => {
            if PendingQueue::new(&wallet.transactions, None).is_empty() {
                return Err(ValidationError::new(
                    "reject_transaction",
                    "no pending transactions",
                ));
            }
            Ok(())
        }
        WalletAction::SelectAccount { address } => {
            if wallet.accounts.iter().any(|a| &a.address == address) {
                Ok(())
            } else {
                Err(ValidationError::new(
                    "set_selected_account",
                    format!("unknown account {address}"),
                ))
            }
        }
        WalletAction::UnlockWallet { password } if password.is_empty() => {
            Err(ValidationError::new("unlock", "password is required"))
        }
        WalletAction::RevealRecoveryPhrase { password } if password.is_empty() => {
            Err(ValidationError::new("get_recovery_phrase", "password is required"))
        }
        WalletAction::NftMetadataFetch {
            contract_address,
            token_id,
        } if contract_address.is_empty() || token_id.is_empty() => Err(ValidationError::new(
            "get_nft_metadata",
            "contract address and token id are required",
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{PanelSlices, PanelTree};
    use crate::types::{AccountInfo, TransactionInfo};
    use surface_dispatch::{ErrorKind, RemoteError};

    fn tx(id: &str, status: TxStatus, group: Option<&str>, created_time: u64) -> TransactionInfo {
        TransactionInfo {
            id: id.into(),
            status,
            group_id: group.map(Into::into),
            created_time,
            ..Default::default()
        }
    }

    fn with_accounts(addresses: &[&str]) -> PanelTree {
        let mut state = PanelTree::default();
        state.wallet.accounts = addresses
            .iter()
            .map(|a| AccountInfo::new(*a, format!("Account {a}")))
            .collect();
        state
    }

    #[test]
    fn test_balance_refresh_marks_loading_and_requests_each_account() {
        let mut state = with_accounts(&["0x1", "0x2"]);
        state.wallet.selected_chain_id = "0x1".into();

        let result = reduce_wallet(&mut state, WalletAction::BalanceRefresh);
        assert_eq!(result.changed, PanelSlices::WALLET);
        assert_eq!(
            result.effects,
            vec![WalletEffect::FetchBalances {
                chain_id: "0x1".into(),
                addresses: vec!["0x1".into(), "0x2".into()],
            }]
        );
        assert!(state.wallet.is_loading_balances());

        // Overlapping refresh: same effect, no further change
        let again = reduce_wallet(&mut state, WalletAction::BalanceRefresh);
        assert!(!again.is_changed());
        assert_eq!(again.effects.len(), 1);
    }

    #[test]
    fn test_balance_refresh_without_accounts_is_noop() {
        let mut state = PanelTree::default();
        let result = reduce_wallet(&mut state, WalletAction::BalanceRefresh);
        assert!(!result.is_changed());
        assert!(!result.has_effects());
    }

    #[test]
    fn test_balance_result_clears_loading() {
        let mut state = with_accounts(&["0x1"]);
        reduce_wallet(&mut state, WalletAction::BalanceRefresh);

        let result = reduce_wallet(
            &mut state,
            WalletAction::BalanceDidLoad {
                chain_id: String::new(),
                address: "0x1".into(),
                balance: "100".into(),
            },
        );
        assert!(result.is_changed());
        assert!(!state.wallet.is_loading_balances());
        assert_eq!(state.wallet.balances.get("0x1").map(String::as_str), Some("100"));
    }

    #[test]
    fn test_poll_tick_refreshes_balances_and_gas() {
        let mut state = with_accounts(&["0x1"]);
        let result = reduce_wallet(&mut state, WalletAction::PollTick);
        assert_eq!(result.effects.len(), 2);
        assert!(result.effects.contains(&WalletEffect::FetchGasEstimates));
    }

    #[test]
    fn test_events_are_idempotent() {
        let events = vec![
            WalletAction::WalletLocked,
            WalletAction::SelectedAccountChanged {
                address: "0x2".into(),
            },
            WalletAction::NewUnapprovedTx(tx("1", TxStatus::Unapproved, None, 1)),
            WalletAction::TransactionStatusChanged(tx("1", TxStatus::Submitted, None, 1)),
            WalletAction::BalanceChanged {
                address: "0x2".into(),
                balance: "7".into(),
            },
            WalletAction::ChainChanged {
                chain_id: "0x5".into(),
            },
        ];

        for event in events {
            let mut state = with_accounts(&["0x1", "0x2"]);
            reduce_wallet(&mut state, event.clone());
            let once = state.wallet.clone();

            let second = reduce_wallet(&mut state, event.clone());
            assert!(!second.is_changed(), "{event:?} changed state twice");
            assert_eq!(state.wallet, once, "{event:?} is not idempotent");
        }
    }

    #[test]
    fn test_chain_change_clears_balances_and_refetches() {
        let mut state = with_accounts(&["0x1"]);
        state.wallet.balances.insert("0x1".into(), "5".into());

        let result = reduce_wallet(
            &mut state,
            WalletAction::ChainChanged {
                chain_id: "0x89".into(),
            },
        );
        assert!(state.wallet.balances.is_empty());
        assert_eq!(
            result.effects,
            vec![WalletEffect::FetchBalances {
                chain_id: "0x89".into(),
                addresses: vec!["0x1".into()],
            }]
        );
    }

    #[test]
    fn test_accounts_loaded_selects_first_when_selection_invalid() {
        let mut state = PanelTree::default();
        state.wallet.selected_account = Some("0xgone".into());

        let result = reduce_wallet(
            &mut state,
            WalletAction::AccountsDidLoad(vec![AccountInfo::new("0xa", "A"), AccountInfo::new("0xb", "B")]),
        );
        assert!(result.is_changed());
        assert_eq!(state.wallet.selected_account.as_deref(), Some("0xa"));
        assert!(state.wallet.is_wallet_created);
        assert_eq!(result.effects.len(), 1);
    }

    #[test]
    fn test_failures_land_in_last_action_error() {
        let mut state = PanelTree::default();
        let error = OperationError::remote("get_transactions", &RemoteError::failed(-32000, "boom"));

        reduce_wallet(&mut state, WalletAction::TransactionsFetch);
        assert!(state.wallet.is_fetching_transactions);

        reduce_wallet(&mut state, WalletAction::TransactionsDidFail(error.clone()));
        assert!(!state.wallet.is_fetching_transactions);
        assert_eq!(state.wallet.last_action_error, Some(error));

        // Completion of another operation keeps the error
        let result = reduce_wallet(&mut state, WalletAction::OperationDidComplete { operation: "lock" });
        assert!(!result.is_changed());

        reduce_wallet(
            &mut state,
            WalletAction::OperationDidComplete {
                operation: "get_transactions",
            },
        );
        assert_eq!(state.wallet.last_action_error, None);
    }

    #[test]
    fn test_gas_failure_sets_fee_error() {
        let mut state = PanelTree::default();
        let error = OperationError::remote("get_gas_estimation", &RemoteError::unavailable("wallet"));
        reduce_wallet(&mut state, WalletAction::GasEstimatesDidFail(error));
        assert!(state.wallet.has_fee_estimates_error);
        assert_eq!(
            state.wallet.last_action_error.as_ref().map(|e| e.kind),
            Some(ErrorKind::BackendUnavailable)
        );
    }

    #[test]
    fn test_reject_all_issues_one_reject_per_pending() {
        let mut state = PanelTree::default();
        state.wallet.transactions = vec![
            tx("b", TxStatus::Unapproved, None, 2),
            tx("a", TxStatus::Unapproved, None, 1),
            tx("c", TxStatus::Confirmed, None, 0),
        ];
        let result = reduce_wallet(&mut state, WalletAction::RejectAllTransactions);
        assert_eq!(
            result.effects,
            vec![
                WalletEffect::Reject { id: "a".into() },
                WalletEffect::Reject { id: "b".into() },
            ]
        );
    }

    #[test]
    fn test_validate_approve() {
        let mut state = PanelTree::default();
        state.wallet.transactions = vec![
            tx("g1", TxStatus::Unapproved, Some("g"), 1),
            tx("g2", TxStatus::Unapproved, Some("g"), 2),
            tx("done", TxStatus::Confirmed, None, 0),
        ];

        let approve = |id: &str| WalletAction::ApproveTransaction { id: id.into() };
        assert!(validate_intent(&state, &approve("g1")).is_ok());

        let err = validate_intent(&state, &approve("")).unwrap_err();
        assert_eq!(err.operation, "approve_transaction");
        assert_eq!(err.reason, "transaction id is required");

        assert!(validate_intent(&state, &approve("missing")).is_err());
        assert!(validate_intent(&state, &approve("done")).is_err());
        assert!(validate_intent(&state, &approve("g2")).is_err());
    }

    #[test]
    fn test_validate_speed_up_and_passwords() {
        let mut state = PanelTree::default();
        state.wallet.transactions = vec![
            tx("sent", TxStatus::Submitted, None, 1),
            tx("new", TxStatus::Unapproved, None, 2),
        ];
        let speed_up = |id: &str| WalletAction::SpeedUpTransaction { id: id.into() };
        assert!(validate_intent(&state, &speed_up("sent")).is_ok());
        assert!(validate_intent(&state, &speed_up("new")).is_err());

        let unlock = WalletAction::UnlockWallet {
            password: String::new(),
        };
        assert!(validate_intent(&state, &unlock).is_err());
        assert!(validate_intent(&state, &WalletAction::RejectAllTransactions).is_ok());
    }

    #[test]
    fn test_balance_for_previous_chain_is_dropped() {
        let mut state = with_accounts(&["0x1"]);
        state.wallet.selected_chain_id = "0x1".into();
        reduce_wallet(&mut state, WalletAction::BalanceRefresh);

        reduce_wallet(
            &mut state,
            WalletAction::ChainChanged {
                chain_id: "0x5".into(),
            },
        );
        reduce_wallet(
            &mut state,
            WalletAction::BalanceDidLoad {
                chain_id: "0x5".into(),
                address: "0x1".into(),
                balance: "5".into(),
            },
        );

        // The request issued before the switch answers last
        let late = reduce_wallet(
            &mut state,
            WalletAction::BalanceDidLoad {
                chain_id: "0x1".into(),
                address: "0x1".into(),
                balance: "999".into(),
            },
        );
        assert!(!late.is_changed());
        assert_eq!(state.wallet.balances["0x1"], "5");

        let error = OperationError::remote("get_balance", &RemoteError::failed(1, "old"));
        let late = reduce_wallet(
            &mut state,
            WalletAction::BalanceDidFail {
                chain_id: "0x1".into(),
                address: "0x1".into(),
                error,
            },
        );
        assert!(!late.is_changed());
        assert_eq!(state.wallet.last_action_error, None);
    }

    #[test]
    fn test_successful_load_clears_its_own_error() {
        let mut state = PanelTree::default();
        let error = OperationError::remote("get_transactions", &RemoteError::failed(-32000, "boom"));
        reduce_wallet(&mut state, WalletAction::TransactionsDidFail(error.clone()));

        // A different operation succeeding leaves it in place
        let gas = reduce_wallet(&mut state, WalletAction::GasEstimatesDidLoad(Default::default()));
        assert!(gas.is_changed());
        assert_eq!(state.wallet.last_action_error, Some(error));

        let result = reduce_wallet(&mut state, WalletAction::TransactionsDidLoad(vec![]));
        assert!(result.is_changed());
        assert_eq!(state.wallet.last_action_error, None);

        let error = OperationError::remote("get_accounts", &RemoteError::unavailable("wallet"));
        reduce_wallet(&mut state, WalletAction::OperationDidFail(error));
        reduce_wallet(&mut state, WalletAction::AccountsDidLoad(vec![]));
        assert_eq!(state.wallet.last_action_error, None);
    }
}
