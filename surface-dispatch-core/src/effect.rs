//! Effect-based state management
//!
//! Reducers stay pure: instead of calling the backend they return effects,
//! declarative descriptions of remote work. The runtime hands each effect to
//! an [`EffectHandler`](crate::runtime::EffectHandler), which issues remote
//! calls on the task manager; each completed call comes back as a result
//! action.
//!
//! # Example
//!
//! ```ignore
//! enum Effect {
//!     FetchBalance { address: String, chain_id: String },
//! }
//!
//! fn reducer(state: &mut PanelTree, action: Action) -> DispatchResult<PanelSlices, Effect> {
//!     match action {
//!         Action::BalanceRefresh => {
//!             state.wallet.is_loading_balances = true;
//!             DispatchResult::changed_with(
//!                 PanelSlices::WALLET,
//!                 Effect::FetchBalance { address, chain_id },
//!             )
//!         }
//!         Action::BalanceDidLoad { address, balance } => {
//!             state.wallet.balances.insert(address, balance);
//!             DispatchResult::changed(PanelSlices::WALLET)
//!         }
//!     }
//! }
//! ```

use std::marker::PhantomData;

use bitflags::Flags;

use crate::action::Action;
use crate::slice::StateTree;
use crate::store::{Middleware, NoopMiddleware, Store};

/// Result of dispatching an action to an effect-aware store.
///
/// Contains the slices the reducer changed and any effects to be processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchResult<C, E> {
    /// Slices modified by this action.
    pub changed: C,
    /// Effects to be processed after dispatch.
    pub effects: Vec<E>,
}

impl<C: Flags + Copy, E> Default for DispatchResult<C, E> {
    fn default() -> Self {
        Self::unchanged()
    }
}

impl<C: Flags + Copy, E> DispatchResult<C, E> {
    /// No state change and no effects.
    #[inline]
    pub fn unchanged() -> Self {
        Self {
            changed: C::empty(),
            effects: vec![],
        }
    }

    /// The given slices changed, no effects.
    #[inline]
    pub fn changed(slices: C) -> Self {
        Self {
            changed: slices,
            effects: vec![],
        }
    }

    /// A single effect, no state change.
    #[inline]
    pub fn effect(effect: E) -> Self {
        Self {
            changed: C::empty(),
            effects: vec![effect],
        }
    }

    /// Multiple effects, no state change.
    #[inline]
    pub fn effects(effects: Vec<E>) -> Self {
        Self {
            changed: C::empty(),
            effects,
        }
    }

    /// The given slices changed, with a single effect.
    #[inline]
    pub fn changed_with(slices: C, effect: E) -> Self {
        Self {
            changed: slices,
            effects: vec![effect],
        }
    }

    /// The given slices changed, with multiple effects.
    #[inline]
    pub fn changed_with_many(slices: C, effects: Vec<E>) -> Self {
        Self {
            changed: slices,
            effects,
        }
    }

    /// Add an effect to this result.
    #[inline]
    pub fn with(mut self, effect: E) -> Self {
        self.effects.push(effect);
        self
    }

    /// Mark more slices as changed.
    #[inline]
    pub fn mark_changed(mut self, slices: C) -> Self {
        self.changed.insert(slices);
        self
    }

    /// Combine with another result (used by reducers that delegate per slice).
    #[inline]
    pub fn merge(mut self, other: Self) -> Self {
        self.changed.insert(other.changed);
        self.effects.extend(other.effects);
        self
    }

    /// Whether any slice changed.
    #[inline]
    pub fn is_changed(&self) -> bool {
        !self.changed.is_empty()
    }

    /// Returns true if there are any effects to process.
    #[inline]
    pub fn has_effects(&self) -> bool {
        !self.effects.is_empty()
    }
}

/// A reducer function that can emit effects.
pub type EffectReducer<S, A, E> = fn(&mut S, A) -> DispatchResult<<S as StateTree>::Changes, E>;

/// A [`Store`] driven by an effect-emitting reducer and a middleware.
///
/// Dispatch goes through [`Store::set_state`] semantics, so listeners see
/// reducer updates exactly like patch updates, tagged with the action name.
pub struct EffectStore<S, A, E, M = NoopMiddleware>
where
    S: StateTree,
    A: Action,
    M: Middleware<A>,
{
    store: Store<S>,
    reducer: EffectReducer<S, A, E>,
    middleware: M,
    _marker: PhantomData<(A, E)>,
}

impl<S, A, E> EffectStore<S, A, E, NoopMiddleware>
where
    S: StateTree,
    A: Action,
{
    /// Create a new effect store with the given initial state and reducer.
    pub fn new(state: S, reducer: EffectReducer<S, A, E>) -> Self {
        Self::with_middleware(state, reducer, NoopMiddleware)
    }
}

impl<S, A, E, M> EffectStore<S, A, E, M>
where
    S: StateTree,
    A: Action,
    M: Middleware<A>,
{
    /// Create a new effect store with middleware.
    pub fn with_middleware(state: S, reducer: EffectReducer<S, A, E>, middleware: M) -> Self {
        Self {
            store: Store::new(state),
            reducer,
            middleware,
            _marker: PhantomData,
        }
    }

    /// Shared store handle (for listeners and direct patches).
    #[inline]
    pub fn store(&self) -> &Store<S> {
        &self.store
    }

    /// Current snapshot.
    #[inline]
    pub fn state(&self) -> std::rc::Rc<S> {
        self.store.state()
    }

    /// Get a reference to the middleware.
    #[inline]
    pub fn middleware(&self) -> &M {
        &self.middleware
    }

    /// Get a mutable reference to the middleware.
    #[inline]
    pub fn middleware_mut(&mut self) -> &mut M {
        &mut self.middleware
    }

    /// Dispatch an action through middleware, reducer and listeners.
    pub fn dispatch(&mut self, action: A) -> DispatchResult<S::Changes, E> {
        self.middleware.before(&action);

        let name = action.name();
        let reducer = self.reducer;
        let mut effects = Vec::new();
        let changed = self.store.apply(
            |state: &mut S| {
                let result = reducer(state, action.clone());
                effects = result.effects;
                result.changed
            },
            Some(name),
        );

        self.middleware.after(&action, !changed.is_empty());
        DispatchResult { changed, effects }
    }
}
