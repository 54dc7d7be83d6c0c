//! Pick handles and pick results.
//!
//! A [`PickHandle`] is what the picking pass writes into its offscreen
//! buffer for every object a handler tracks. Raw id `0` means "no hit", so
//! valid handles are always non-zero, the same convention the GPU pick map
//! uses for residue ids.

use std::collections::BTreeSet;
use std::fmt;
use std::num::NonZeroU32;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Opaque, non-zero identifier routing pick results to one selection
/// handler.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
    Deserialize,
)]
pub struct PickHandle(NonZeroU32);

impl PickHandle {
    /// Largest handle value. Handles are written into a 24-bit colour
    /// channel by the picking pass.
    pub const MAX: u32 = 0x00FF_FFFF;

    /// Resolve a raw id read back from the pick buffer. Returns `None` for
    /// `0` (background) and for values outside the 24-bit handle range.
    #[must_use]
    pub fn from_raw(raw: u32) -> Option<Self> {
        if raw > Self::MAX {
            return None;
        }
        NonZeroU32::new(raw).map(Self)
    }

    /// Raw id as written to the pick buffer.
    #[must_use]
    pub fn raw(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for PickHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Key of a highlight box: the owning handle plus a sub-index that lets one
/// handle own several independent boxes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
    Deserialize,
)]
pub struct BoxKey {
    /// Handle of the owning selection handler.
    pub handle: PickHandle,
    /// Part index within that handler (`0` for the whole target).
    pub sub_index: u64,
}

impl BoxKey {
    /// Create a key from a handle and sub-index.
    #[must_use]
    pub fn new(handle: PickHandle, sub_index: u64) -> Self {
        Self { handle, sub_index }
    }

    /// The key of the box covering the whole target.
    #[must_use]
    pub fn whole(handle: PickHandle) -> Self {
        Self::new(handle, 0)
    }
}

/// What one pick operation hit for a single handle.
///
/// `extra_handles` holds the sub-indices (points of a cloud, parts of a
/// multi-part marker, ...) that were hit in addition to the handle itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Picked {
    /// The handle that was hit.
    pub handle: PickHandle,
    /// Number of pick-buffer pixels that resolved to this handle.
    pub pixel_count: u32,
    /// Sub-indices hit within the handle.
    pub extra_handles: BTreeSet<u64>,
}

impl Picked {
    /// A pick of the whole target with a single pixel.
    #[must_use]
    pub fn new(handle: PickHandle) -> Self {
        Self {
            handle,
            pixel_count: 1,
            extra_handles: BTreeSet::new(),
        }
    }

    /// The pick describing exactly one box key: the whole target for
    /// sub-index `0`, otherwise that single sub-index.
    #[must_use]
    pub fn for_key(key: BoxKey) -> Self {
        let picked = Self::new(key.handle);
        if key.sub_index == 0 {
            picked
        } else {
            picked.with_extra([key.sub_index])
        }
    }

    /// Builder-style helper adding sub-indices.
    #[must_use]
    pub fn with_extra(mut self, extra: impl IntoIterator<Item = u64>) -> Self {
        self.extra_handles.extend(extra);
        self
    }

    /// Every `(handle, sub_index)` pair this pick describes. A pick without
    /// extra handles describes the whole target, sub-index `0`.
    pub fn keys(&self) -> impl Iterator<Item = BoxKey> + '_ {
        let whole = self
            .extra_handles
            .is_empty()
            .then(|| BoxKey::whole(self.handle));
        whole.into_iter().chain(
            self.extra_handles
                .iter()
                .map(|&sub| BoxKey::new(self.handle, sub)),
        )
    }
}

/// Pick results of one operation, keyed by handle.
pub type PickedMap = FxHashMap<PickHandle, Picked>;

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(raw: u32) -> PickHandle {
        PickHandle::from_raw(raw).unwrap()
    }

    #[test]
    fn zero_is_background() {
        assert!(PickHandle::from_raw(0).is_none());
        assert!(PickHandle::from_raw(PickHandle::MAX + 1).is_none());
        assert_eq!(handle(7).raw(), 7);
    }

    #[test]
    fn whole_pick_has_sub_index_zero() {
        let keys: Vec<_> = Picked::new(handle(3)).keys().collect();
        assert_eq!(keys, vec![BoxKey::new(handle(3), 0)]);
    }

    #[test]
    fn for_key_round_trips_through_keys() {
        let key = BoxKey::new(handle(4), 12);
        let keys: Vec<_> = Picked::for_key(key).keys().collect();
        assert_eq!(keys, vec![key]);
        let whole = BoxKey::whole(handle(4));
        assert!(Picked::for_key(whole).extra_handles.is_empty());
    }

    #[test]
    fn extra_handles_become_keys_in_order() {
        let picked = Picked::new(handle(3)).with_extra([9, 2, 9]);
        let keys: Vec<_> = picked.keys().map(|k| k.sub_index).collect();
        assert_eq!(keys, vec![2, 9]);
    }
}
