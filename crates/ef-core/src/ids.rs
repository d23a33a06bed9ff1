use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;
use core::num::NonZeroU32;

/// Marker for node identifiers.
pub enum NodeTag {}

/// Marker for flow identifiers.
pub enum FlowTag {}

/// Short prefix used when an id is debug-printed.
pub trait IdKind {
    const PREFIX: &'static str;
}

impl IdKind for NodeTag {
    const PREFIX: &'static str = "n";
}

impl IdKind for FlowTag {
    const PREFIX: &'static str = "f";
}

/// Dense graph identifier, tagged with what it identifies so node and flow
/// ids cannot be mixed up.
///
/// Stores `index + 1` in a `NonZeroU32`, so `Option<Id<K>>` costs nothing
/// extra.
pub struct Id<K> {
    raw: NonZeroU32,
    _kind: PhantomData<fn() -> K>,
}

pub type NodeId = Id<NodeTag>;
pub type FlowId = Id<FlowTag>;

impl<K> Id<K> {
    /// Id for the 0-based position `index`. Saturates at `u32::MAX - 1`.
    pub fn from_index(index: u32) -> Self {
        Self {
            raw: NonZeroU32::MIN.saturating_add(index),
            _kind: PhantomData,
        }
    }

    /// The 0-based position.
    pub fn index(self) -> u32 {
        self.raw.get() - 1
    }

    pub fn as_usize(self) -> usize {
        self.index() as usize
    }
}

impl<K> Clone for Id<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for Id<K> {}

impl<K> PartialEq for Id<K> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<K> Eq for Id<K> {}

impl<K> PartialOrd for Id<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K> Ord for Id<K> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.raw.cmp(&other.raw)
    }
}

impl<K> Hash for Id<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<K: IdKind> fmt::Debug for Id<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", K::PREFIX, self.index())
    }
}

impl<K> fmt::Display for Id<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

// Serialized as the plain 0-based index.
#[cfg(feature = "serde")]
impl<K> serde::Serialize for Id<K> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.index())
    }
}
