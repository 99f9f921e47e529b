use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use slotmap::new_key_type;

new_key_type! {
    /// Index of an asset within the storage of its type.
    pub struct AssetIndex;
}

/// Typed reference to an asset stored in an [`crate::AssetManager`].
/// Cheap to copy. Does not keep the asset alive on its own.
pub struct Handle<A> {
    pub(crate) index: AssetIndex,
    phantom: PhantomData<fn() -> A>,
}

impl<A> Handle<A> {
    pub(crate) fn new(index: AssetIndex) -> Self {
        Self { index, phantom: PhantomData }
    }
}

impl<A> Clone for Handle<A> {
    fn clone(&self) -> Self { *self }
}

impl<A> Copy for Handle<A> {}

impl<A> PartialEq for Handle<A> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<A> Eq for Handle<A> {}

impl<A> Hash for Handle<A> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<A> fmt::Debug for Handle<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handle").field(&self.index).finish()
    }
}
