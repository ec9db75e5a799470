//! Wallet panel - surface-dispatch example
//!
//! Mounts the wallet panel against an in-memory wallet backend and drives it
//! without a UI:
//! 1. Mount rehydrates from disk and issues the initial fetches
//! 2. Results and pushed events are dispatched as they arrive
//! 3. A new transaction is pushed, then approved through an intent
//! 4. The poll interval refreshes balances until shutdown
//!
//! # Usage
//!
//! ```sh
//! cargo run -p wallet-panel-demo
//!
//! # Poll every 500ms, stop after 5 polls, log every action
//! cargo run -p wallet-panel-demo -- --poll-ms 500 --ticks 5 --verbose
//! ```

use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use surface_dispatch::{CancellationToken, FileStorage, RemoteProxy, StateTree, SurfaceConfig};
use surface_wallet::gas::{format_units, parse_quantity, transaction_fee, ETH_DECIMALS};
use surface_wallet::{
    mount_panel, GasFeeDisplay, MockWallet, MockWalletFactory, PanelTree, PendingQueue,
    TransactionInfo, TxEvent, WalletAction, WalletEvent, WalletRuntime,
};
use tracing_subscriber::EnvFilter;

/// Headless wallet panel
#[derive(Parser, Debug)]
#[command(name = "wallet-panel")]
#[command(about = "Drive the wallet panel surface against an in-memory wallet")]
struct Args {
    /// Directory for persisted panel state (defaults to the user data dir)
    #[arg(long)]
    state_dir: Option<PathBuf>,

    /// Balance poll interval in milliseconds
    #[arg(long, default_value = "1000")]
    poll_ms: u64,

    /// Number of polls before shutting down
    #[arg(long, default_value = "3")]
    ticks: u32,

    /// Log every action, including poll ticks
    #[arg(long, short)]
    verbose: bool,
}

fn state_dir(args: &Args) -> PathBuf {
    args.state_dir.clone().unwrap_or_else(|| {
        dirs::data_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("surface-wallet")
    })
}

/// Dispatch arriving actions until none arrive for `quiet`.
async fn drain<S: StateTree>(runtime: &mut WalletRuntime<S>, quiet: Duration) {
    while let Ok(Some(_)) = tokio::time::timeout(quiet, runtime.next()).await {}
}

fn print_panel(state: &PanelTree) {
    let wallet = &state.wallet;
    println!("── panel: {:?}", state.panel.selected_panel);
    for account in &wallet.accounts {
        let selected = if wallet.selected_account.as_deref() == Some(account.address.as_str()) {
            "*"
        } else {
            " "
        };
        let balance = wallet
            .balances
            .get(&account.address)
            .and_then(|b| parse_quantity(b))
            .map(|wei| format_units(wei, ETH_DECIMALS))
            .unwrap_or_else(|| "…".to_string());
        println!("{selected} {:<10} {}  {balance} ETH", account.name, account.address);
    }

    let fees = GasFeeDisplay::new(wallet.gas_estimates.as_ref());
    println!(
        "  priority fees (wei): {}  base fee: {}",
        fees.suggested_max_priority_fee_choices.join(" / "),
        fees.base_fee_per_gas
    );

    let queue = PendingQueue::new(
        &wallet.transactions,
        state.panel.selected_pending_transaction_id.as_deref(),
    );
    if let Some(tx) = queue.selected() {
        println!(
            "  pending {}/{}: {} from {} (fee {} ETH)",
            queue.position(),
            queue.len(),
            tx.id,
            tx.from_address,
            transaction_fee(tx, ETH_DECIMALS)
        );
    }
    if let Some(error) = &wallet.last_action_error {
        println!("  last error: {error}");
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let storage = FileStorage::open(state_dir(&args))?;
    tracing::info!(dir = %storage.dir().display(), "Using state directory");

    let mut config =
        SurfaceConfig::named("wallet-panel").with_poll_interval(Duration::from_millis(args.poll_ms));
    if args.verbose {
        config.log.exclude.clear();
    }

    let wallet = MockWallet::sample();
    let mut proxy = RemoteProxy::connect(MockWalletFactory::new(wallet.clone()));
    let mut panel = mount_panel(&config, &mut proxy, storage)?;

    let quiet = Duration::from_millis(100);
    drain(&mut panel, quiet).await;
    print_panel(&panel.state());

    // The dapp asks for a signature
    let tx = TransactionInfo {
        id: "tx-2".into(),
        from_address: "0x2222".into(),
        chain_id: "0x1".into(),
        created_time: 1_700_000_100_000,
        gas_limit: "0x5208".into(),
        gas_price: "0x3b9aca00".into(),
        ..Default::default()
    };
    wallet.add_transaction(tx.clone());
    wallet.push(WalletEvent::Tx(TxEvent::NewUnapproved(tx)));
    drain(&mut panel, quiet).await;
    print_panel(&panel.state());

    let state = panel.state();
    let queue = PendingQueue::new(
        &state.wallet.transactions,
        state.panel.selected_pending_transaction_id.as_deref(),
    );
    if let Some(tx) = queue.selected().filter(|_| queue.can_approve_selected()) {
        let id = tx.id.clone();
        match panel.intent(WalletAction::ApproveTransaction { id: id.clone() }) {
            Ok(_) => tracing::info!(id = %id, "Approved transaction"),
            Err(err) => tracing::warn!(id = %id, error = %err, "Approval rejected"),
        }
    }
    drain(&mut panel, quiet).await;
    print_panel(&panel.state());

    // Let the poll run, then shut down
    let shutdown = CancellationToken::new();
    let stop = shutdown.clone();
    let run_for = Duration::from_millis(args.poll_ms * u64::from(args.ticks)) + quiet;
    tokio::spawn(async move {
        tokio::time::sleep(run_for).await;
        stop.cancel();
    });
    panel.run(shutdown).await?;

    print_panel(&panel.state());
    println!(
        "balance calls: {}  gas estimate calls: {}",
        wallet.calls("get_balance"),
        wallet.calls("get_gas_estimation")
    );
    Ok(())
}
