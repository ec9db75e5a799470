//! Core traits and types for surface-dispatch
//!
//! This crate provides the state-synchronization core of browser-embedded UI
//! surfaces: a surface-local store kept in sync with an opaque native
//! backend reached through typed remotes and push observers.
//!
//! # Core Concepts
//!
//! - **Store**: single-threaded state tree with synchronous, re-entrant
//!   change notification
//! - **Slice**: named record inside the tree, with generated partial patches
//!   and a compile-time persistence allow-list
//! - **Effects**: reducers return declarative remote work; an effect handler
//!   issues de-duplicated requests on the task manager
//! - **Observer bridge**: native push events translated into actions, in
//!   delivery order per service
//! - **Lifecycle**: `Uninitialized -> Rehydrating -> Ready -> Unmounting -> Terminated`
//!
//! # Intent / Result Pattern
//!
//! 1. **Intent actions** trigger remote work (e.g. `BalanceRefresh`)
//! 2. **Result actions** carry the outcome back (e.g. `BalanceDidLoad`,
//!    `BalanceDidFail`)
//!
//! ```ignore
//! fn reducer(state: &mut PanelTree, action: Action) -> DispatchResult<PanelSlices, Effect> {
//!     match action {
//!         Action::BalanceRefresh => {
//!             state.wallet.is_loading_balances = true;
//!             DispatchResult::changed_with(PanelSlices::WALLET, Effect::FetchBalances)
//!         }
//!         Action::BalanceDidLoad { address, balance } => {
//!             state.wallet.balances.insert(address, balance);
//!             DispatchResult::changed(PanelSlices::WALLET)
//!         }
//!         // ...
//!     }
//! }
//!
//! fn handle(effect: Effect, ctx: &mut EffectContext<Action>) {
//!     match effect {
//!         Effect::FetchBalances => {
//!             for address in addresses {
//!                 let key = TaskKey::with_params("get_balance", &address);
//!                 ctx.tasks().request(key, fetch_balance(remote.clone(), address));
//!             }
//!         }
//!     }
//! }
//! ```
//!
//! The `Did*` naming convention identifies result actions, which is also
//! what `ActionLoggerConfig` patterns like `Did*` key on.

pub mod action;
pub mod config;
pub mod effect;
pub mod error;
pub mod frame;
pub mod lifecycle;
pub mod logging;
pub mod observer;
pub mod persist;
pub mod remote;
#[cfg(all(feature = "tasks", feature = "subscriptions"))]
pub mod runtime;
pub mod slice;
pub mod store;
#[cfg(feature = "subscriptions")]
pub mod subscriptions;
#[cfg(feature = "tasks")]
pub mod tasks;
pub mod testing;

// Core trait exports
pub use action::{Action, ActionSummary};
pub use slice::{merge, HasSlice, Merge, Patch, Slice, SlicePatch, StateTree};

// Store exports
pub use store::{
    ComposedMiddleware, ListenerHandle, LoggingMiddleware, Middleware, NoopMiddleware, StateChange,
    Store,
};

// Effect exports
pub use effect::{DispatchResult, EffectReducer, EffectStore};

// Error exports
pub use error::{
    ErrorKind, FrameError, LifecycleError, OperationError, RemoteError, StorageError,
    SurfaceError, ValidationError,
};

// Boundary exports
pub use frame::{FrameChannel, FrameCommand, FrameMessage};
pub use observer::{event_channel, EventReceiver, EventSender, NativeEvent};
#[cfg(feature = "subscriptions")]
pub use observer::ObserverBridge;
pub use remote::{RemoteFactory, RemoteHandle, RemoteProxy};

// Persistence exports
pub use persist::{
    Blob, Fallback, FallbackReason, FileStorage, MemoryStorage, Persist, PersistTree, Persistor,
    Rehydrated, Storage,
};

// Lifecycle, config and logging exports
pub use config::SurfaceConfig;
pub use lifecycle::{Lifecycle, Phase};
pub use logging::{ActionLog, ActionLogEntry, ActionLoggerConfig, ActionLoggerMiddleware};

// Runtime exports
#[cfg(all(feature = "tasks", feature = "subscriptions"))]
pub use runtime::{EffectContext, EffectHandler, SurfaceRuntime};
#[cfg(feature = "subscriptions")]
pub use subscriptions::{SubKey, Subscriptions};
#[cfg(feature = "tasks")]
pub use tasks::{Dedup, TaskKey, TaskManager};

// Re-export the crates generated code and wallet surfaces build on
pub use bitflags;
pub use tokio_util::sync::CancellationToken;

/// Paths used by `#[derive(Slice)]` expansions.
#[doc(hidden)]
pub mod __private {
    pub use serde_json;
}

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::action::{Action, ActionSummary};
    pub use crate::effect::{DispatchResult, EffectReducer, EffectStore};
    pub use crate::error::{OperationError, RemoteError, SurfaceError, ValidationError};
    pub use crate::observer::{event_channel, EventReceiver, EventSender, NativeEvent};
    pub use crate::persist::{MemoryStorage, Persist, PersistTree, Persistor, Storage};
    pub use crate::remote::{RemoteFactory, RemoteHandle, RemoteProxy};
    pub use crate::slice::{merge, HasSlice, Patch, Slice, SlicePatch, StateTree};
    pub use crate::store::{ListenerHandle, Middleware, StateChange, Store};

    #[cfg(feature = "subscriptions")]
    pub use crate::observer::ObserverBridge;
    #[cfg(all(feature = "tasks", feature = "subscriptions"))]
    pub use crate::runtime::{EffectContext, EffectHandler, SurfaceRuntime};
    #[cfg(feature = "subscriptions")]
    pub use crate::subscriptions::{SubKey, Subscriptions};
    #[cfg(feature = "tasks")]
    pub use crate::tasks::{Dedup, TaskKey, TaskManager};
}
