//! Wallet panel surface
//!
//! The browser toolbar popup: account switcher, balances and the
//! pending-transaction confirmation queue.

use surface_dispatch::{DispatchResult, RemoteProxy, Storage, SurfaceConfig, SurfaceError};

use crate::action::WalletAction;
use crate::backend::WalletFactory;
use crate::effect::WalletEffect;
use crate::reducer::{reduce_wallet, set};
use crate::state::{PanelSlices, PanelTree};
use crate::surface::{build, WalletRuntime};
use crate::transactions::PendingQueue;
use crate::types::PanelView;

/// Operations whose failures belong to the panel rather than the wallet.
pub const PANEL_OPERATIONS: &[&str] = &[
    "approve_transaction",
    "reject_transaction",
    "speed_up_transaction",
];

pub type PanelRuntime = WalletRuntime<PanelTree>;

fn initial_actions() -> Vec<WalletAction> {
    vec![
        WalletAction::AccountsFetch,
        WalletAction::TransactionsFetch,
        WalletAction::GasEstimatesFetch,
        WalletAction::BalanceRefresh,
    ]
}

/// Leave the confirmation screen once nothing is pending.
fn sync_view(state: &mut PanelTree) -> bool {
    let nothing_pending = PendingQueue::new(&state.wallet.transactions, None).is_empty();
    if state.panel.selected_panel == PanelView::ApproveTransaction && nothing_pending {
        state.panel.selected_panel = PanelView::Main;
        return true;
    }
    false
}

pub fn reduce_panel(state: &mut PanelTree, action: WalletAction) -> DispatchResult<PanelSlices, WalletEffect> {
    let panel = |changed: bool| {
        if changed {
            PanelSlices::PANEL
        } else {
            PanelSlices::empty()
        }
    };

    match action {
        WalletAction::NavigateTo(view) => {
            DispatchResult::changed(panel(set(&mut state.panel.selected_panel, view)))
        }

        WalletAction::SelectPendingTransaction { id } => DispatchResult::changed(panel(set(
            &mut state.panel.selected_pending_transaction_id,
            Some(id),
        ))),

        WalletAction::QueueNextTransaction => {
            let next = PendingQueue::new(
                &state.wallet.transactions,
                state.panel.selected_pending_transaction_id.as_deref(),
            )
            .next_id()
            .map(str::to_string);
            DispatchResult::changed(panel(set(
                &mut state.panel.selected_pending_transaction_id,
                next,
            )))
        }

        WalletAction::NewUnapprovedTx(tx) => {
            let result = reduce_wallet(state, WalletAction::NewUnapprovedTx(tx));
            let opened = set(&mut state.panel.selected_panel, PanelView::ApproveTransaction);
            result.mark_changed(panel(opened))
        }

        action @ (WalletAction::TransactionStatusChanged(_) | WalletAction::TransactionsDidLoad(_)) => {
            let result = reduce_wallet(state, action);
            let closed = sync_view(state);
            result.mark_changed(panel(closed))
        }

        WalletAction::OperationDidFail(error) if PANEL_OPERATIONS.contains(&error.operation.as_str()) => {
            DispatchResult::changed(panel(set(&mut state.panel.last_action_error, Some(error))))
        }

        WalletAction::OperationDidComplete { operation } if PANEL_OPERATIONS.contains(&operation) => {
            let matches = state
                .panel
                .last_action_error
                .as_ref()
                .is_some_and(|error| error.operation == operation);
            DispatchResult::changed(panel(matches && set(&mut state.panel.last_action_error, None)))
        }

        other => reduce_wallet(state, other),
    }
}

/// Build and mount the panel surface.
///
/// Requires a tokio runtime: mounting issues the initial remote calls.
pub fn mount_panel<F: WalletFactory>(
    config: &SurfaceConfig,
    proxy: &mut RemoteProxy<F>,
    storage: impl Storage + 'static,
) -> Result<PanelRuntime, SurfaceError> {
    let mut runtime = build(config, proxy, storage, reduce_panel);
    runtime.mount(initial_actions())?;
    Ok(runtime)
}
