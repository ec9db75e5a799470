//! surface-wallet: wallet panel and wallet page surfaces
//!
//! Two independent surfaces over one wallet backend:
//!
//! - the **panel** (toolbar popup): account switcher, balances, and the
//!   pending-transaction confirmation queue
//! - the **page** (full tab): onboarding, backup, portfolio settings, and
//!   the sandboxed NFT display frame
//!
//! Each surface owns its own state tree (`PanelTree`, `PageTree`) holding
//! the shared `wallet` slice next to a surface-specific slice. Both are
//! driven by [`surface_dispatch::SurfaceRuntime`].
//!
//! # Example
//! ```ignore
//! use surface_dispatch::{MemoryStorage, RemoteProxy, SurfaceConfig};
//! use surface_wallet::{mount_panel, MockWallet, MockWalletFactory, WalletAction};
//!
//! let wallet = MockWallet::sample();
//! let mut proxy = RemoteProxy::connect(MockWalletFactory::new(wallet));
//! let mut panel = mount_panel(&SurfaceConfig::named("wallet-panel"), &mut proxy, MemoryStorage::new())?;
//!
//! while panel.state().wallet.is_loading_balances() {
//!     panel.next().await;
//! }
//! panel.intent(WalletAction::QueueNextTransaction)?;
//! panel.teardown()?;
//! ```

pub mod action;
pub mod backend;
pub mod effect;
pub mod events;
pub mod gas;
pub mod handlers;
pub mod mock;
pub mod nft;
pub mod page;
pub mod panel;
pub mod reducer;
pub mod state;
pub mod surface;
pub mod transactions;
pub mod types;

pub use action::WalletAction;
pub use backend::{
    JsonRpcEvent, KeyringEvent, TxEvent, WalletEvent, WalletFactory, WalletService, WALLET_SERVICE,
};
pub use effect::WalletEffect;
pub use events::translate_wallet_event;
pub use gas::GasFeeDisplay;
pub use handlers::WalletEffects;
pub use mock::{MockWallet, MockWalletFactory};
pub use nft::{NftDisplayCommand, NftFrame, NftPageCommand, NFT_DISPLAY_ORIGIN};
pub use page::{mount_page, reduce_page, PageRuntime};
pub use panel::{mount_panel, reduce_panel, PanelRuntime};
pub use reducer::{reduce_wallet, validate_intent};
pub use state::{PageSlices, PageState, PageTree, PanelSlices, PanelState, PanelTree, WalletState};
pub use surface::{reconnect, WalletRuntime, POLL_KEY};
pub use transactions::{pending_transactions, PendingQueue};
pub use types::{
    AccountInfo, GasEstimation, NftMetadata, PanelView, RecoveryPhrase, Timeline, TransactionInfo,
    TxStatus,
};
