//! surface-dispatch: State synchronization for browser-embedded UI surfaces
//!
//! A surface keeps a local store of named slices in sync with a native
//! backend it only reaches through typed remotes and push observers. Intents
//! flow through a reducer; remote work comes back as result actions.
//!
//! # Example
//! ```ignore
//! use surface_dispatch::prelude::*;
//!
//! #[derive(Action, Clone, Debug)]
//! enum Action {
//!     BalanceRefresh,
//!     BalanceDidLoad { address: String, balance: String },
//! }
//!
//! #[derive(Slice, Clone, Debug, Default, PartialEq)]
//! #[slice(name = "wallet")]
//! struct WalletState {
//!     #[slice(persist)]
//!     selected_account: Option<String>,
//!     is_wallet_locked: bool,
//! }
//! ```

// Re-export everything from core
pub use surface_dispatch_core::*;

// Re-export derive macros
pub use surface_dispatch_macros::{Action, Slice, StateTree};

/// Prelude for convenient imports
pub mod prelude {
    pub use surface_dispatch_core::prelude::*;

    // Config and lifecycle
    pub use surface_dispatch_core::{Phase, SurfaceConfig};

    // Logging
    pub use surface_dispatch_core::logging::{ActionLoggerConfig, ActionLoggerMiddleware};

    // Derive macros
    pub use surface_dispatch_macros::{Action, Slice, StateTree};
}
