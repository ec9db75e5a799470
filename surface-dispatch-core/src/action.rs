//! Action trait for type-safe state mutations

use std::fmt::Debug;

/// Marker trait for actions that can be dispatched to the store
///
/// Actions represent intents to change state, native events translated by
/// the observer bridge, and results of remote calls. They should be:
/// - Clone: Actions may be logged, replayed, or sent to multiple handlers
/// - Debug: For debugging and logging
/// - Send + 'static: Result actions travel back from spawned tasks
///
/// Use `#[derive(Action)]` from `surface-dispatch-macros` to auto-implement this trait.
pub trait Action: Clone + Debug + Send + 'static {
    /// Get the action name for logging and filtering
    fn name(&self) -> &'static str;
}

/// Concise, human-readable form of an action for logs.
///
/// The default uses `Debug`; override it for actions carrying large payloads
/// (transaction lists, account lists) or sensitive ones (passwords).
pub trait ActionSummary: Action {
    fn summary(&self) -> String {
        format!("{:?}", self)
    }
}
