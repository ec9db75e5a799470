//! surface-tip-panel: creator tipping panel surface
//!
//! A single `tip_panel` slice fed by rewards events: the creator's banner
//! and payout wallets, the user's rewards wallet, and global tipping
//! parameters. Mounting asks the browser to show the panel once.
//!
//! # Example
//! ```ignore
//! use surface_dispatch::{RemoteProxy, SurfaceConfig};
//! use surface_tip_panel::{mount_tip_panel, MockTipPanel, MockTipPanelFactory};
//!
//! let mut proxy = RemoteProxy::connect(MockTipPanelFactory::new(MockTipPanel::new()));
//! let mut panel = mount_tip_panel(&SurfaceConfig::named("tip-panel"), &mut proxy)?;
//! while panel.state().tip_panel.loading {
//!     panel.next().await;
//! }
//! println!("{:?}", panel.state().tip_panel.form_status());
//! ```

pub mod action;
pub mod backend;
pub mod mock;
pub mod model;
pub mod surface;

pub use action::TipPanelAction;
pub use backend::{
    translate_tip_panel_event, TipPanelEvent, TipPanelFactory, TipPanelHandler, TIP_PANEL_SERVICE,
};
pub use mock::{MockTipPanel, MockTipPanelFactory};
pub use model::{
    CreatorBanner, CreatorWallet, ExternalWalletProvider, GlobalState, RewardsUser, TipFormStatus,
    TipPanelSlices, TipPanelState, TipPanelTree,
};
pub use surface::{mount_tip_panel, reduce_tip_panel, TipPanelEffect, TipPanelEffects, TipPanelRuntime};
