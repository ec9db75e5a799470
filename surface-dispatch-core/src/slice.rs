//! State tree, slices and partial updates
//!
//! A surface's state tree is a plain struct whose fields are slices. Each tree
//! declares a `bitflags` type with one flag per slice, so every mutation can
//! report exactly which slices it touched.
//!
//! ```ignore
//! bitflags::bitflags! {
//!     #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
//!     pub struct PanelSlices: u8 {
//!         const PANEL = 1 << 0;
//!         const WALLET = 1 << 1;
//!     }
//! }
//!
//! #[derive(Clone, Debug, Default)]
//! pub struct PanelTree {
//!     pub panel: PanelState,
//!     pub wallet: WalletState,
//! }
//!
//! impl StateTree for PanelTree {
//!     type Changes = PanelSlices;
//! }
//!
//! impl HasSlice<WalletState> for PanelTree {
//!     const FLAG: PanelSlices = PanelSlices::WALLET;
//!     fn slice(&self) -> &WalletState { &self.wallet }
//!     fn slice_mut(&mut self) -> &mut WalletState { &mut self.wallet }
//! }
//!
//! store.set_state(merge(WalletStatePatch {
//!     is_wallet_locked: Some(true),
//!     ..Default::default()
//! }));
//! ```

use std::fmt::Debug;

use bitflags::Flags;

/// A named, always-populated record inside a state tree.
///
/// Use `#[derive(Slice)]` to implement this trait. The derive also generates
/// a `<Name>Patch` struct with one `Option<T>` per field.
pub trait Slice: Clone + Default + Debug + PartialEq + 'static {
    /// Slice name, also the key of this slice in the durable blob.
    const NAME: &'static str;

    /// Partial update type for this slice.
    type Patch: Default + Debug;

    /// Merge a patch into this slice.
    ///
    /// Sets exactly the fields present in the patch. Returns `true` if any
    /// value actually changed.
    fn merge(&mut self, patch: Self::Patch) -> bool;
}

/// Partial update for a single slice (generated by `#[derive(Slice)]`).
pub trait SlicePatch: Default + Debug + 'static {
    type Slice: Slice<Patch = Self>;

    /// Whether the patch carries no field at all.
    fn is_empty(&self) -> bool;
}

/// The whole state of one surface.
pub trait StateTree: Clone + Default + Debug + 'static {
    /// One flag per slice.
    type Changes: Flags + Copy + Debug + PartialEq;
}

/// Tree-level access to one of its slices.
pub trait HasSlice<T: Slice>: StateTree {
    /// Flag reported when this slice changes.
    const FLAG: Self::Changes;

    fn slice(&self) -> &T;

    fn slice_mut(&mut self) -> &mut T;
}

/// A partial update applied through [`Store::set_state`](crate::Store::set_state).
///
/// Implemented for closures `FnOnce(&mut S) -> S::Changes` and for
/// [`Merge`] wrappers around generated slice patches.
pub trait Patch<S: StateTree> {
    /// Apply the update and report the slices that changed.
    fn apply(self, state: &mut S) -> S::Changes;
}

impl<S, F> Patch<S> for F
where
    S: StateTree,
    F: FnOnce(&mut S) -> S::Changes,
{
    fn apply(self, state: &mut S) -> S::Changes {
        self(state)
    }
}

/// Wraps a slice patch so it can be applied to any tree containing the slice.
#[derive(Debug, Clone, Default)]
pub struct Merge<P>(pub P);

/// Shorthand for `Merge(patch)`.
pub fn merge<P: SlicePatch>(patch: P) -> Merge<P> {
    Merge(patch)
}

impl<S, P> Patch<S> for Merge<P>
where
    P: SlicePatch,
    S: HasSlice<P::Slice>,
{
    fn apply(self, state: &mut S) -> S::Changes {
        if <S as HasSlice<P::Slice>>::slice_mut(state).merge(self.0) {
            <S as HasSlice<P::Slice>>::FLAG
        } else {
            S::Changes::empty()
        }
    }
}
