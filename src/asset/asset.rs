use std::any::Any;
use crate::AssetManager;

/**
 * Shareable resource loaded from a file, like a tileset or a map.
 */
pub trait Asset: Any + 'static {
    /**
     * The merged [`Readiness`] of all dependencies, if any.
     * If at least one failed, readiness is [`Readiness::Failed`].
     */
    fn readiness(&self, _assets: &AssetManager) -> Readiness {
        Readiness::Ready
    }
}

/// Whether an asset, along with everything it depends on, finished loading.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Readiness {
    Ready,
    Failed,
}

impl Readiness {
    pub fn merge(self, other: Self) -> Self {
        match (self, other) {
            (Self::Ready, Self::Ready) => Self::Ready,
            _ => Self::Failed,
        }
    }
}

/// State of an asset stored in an [`crate::AssetManager`].
#[derive(Debug)]
pub enum AssetState<A> {
    Loaded(A),
    Failed,
}

impl<A> AssetState<A> {
    pub fn as_ref(&self) -> AssetState<&A> {
        match self {
            Self::Loaded(asset) => AssetState::Loaded(asset),
            Self::Failed => AssetState::Failed,
        }
    }

    pub fn loaded(&self) -> Option<&A> {
        match self {
            Self::Loaded(asset) => Some(asset),
            Self::Failed => None,
        }
    }
}
