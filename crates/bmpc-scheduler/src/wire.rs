use std::{
    fmt::{Debug, Display},
    marker::PhantomData,
};

/// Marker for wires carrying boolean values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Boolean;

/// A handle to a wire stored in a [`WireKeeper`](crate::WireKeeper).
///
/// A wire id carries no value; it is only meaningful to the keeper, and therefore the scheduler,
/// that issued it.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct WireId<T> {
    index: u64,
    _pd: PhantomData<T>,
}

impl<T> Debug for WireId<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WireId({})", self.index)
    }
}

impl Display for WireId<Boolean> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Boolean({})", self.index)
    }
}

impl<T> WireId<T> {
    #[inline(always)]
    pub(crate) fn new(index: u64) -> Self {
        Self {
            index,
            _pd: PhantomData,
        }
    }

    /// Returns the index of the wire.
    pub fn index(&self) -> u64 {
        self.index
    }
}

/// Who knows the value held by a wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Secrecy {
    /// All parties know the value in the clear.
    Public,
    /// This party only holds a share of the value.
    Private,
}

impl Secrecy {
    /// Returns the secrecy of a gate output computed from `self` and `other`.
    pub fn join(self, other: Secrecy) -> Secrecy {
        match (self, other) {
            (Secrecy::Public, Secrecy::Public) => Secrecy::Public,
            _ => Secrecy::Private,
        }
    }
}
