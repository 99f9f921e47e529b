use std::any::{Any, TypeId};
use crate::{Asset, AssetManager, AssetPath};


/// Takes the contents of a file, and converts them into an asset.
pub trait AssetLoader: 'static {
    type AssetType: Asset;
    fn load(&self, bytes: &[u8], path: &AssetPath) -> AssetResult<Self::AssetType>;
    fn extensions(&self) -> &[&str];
}

impl<L: AssetLoader> DynLoader for L {

    fn dyn_load(&self, bytes: &[u8], path: &AssetPath) -> anyhow::Result<Box<dyn DynAssetValue>> {
        let asset_value = self.load(bytes, path)?;
        Ok(Box::new(asset_value))
    }

    fn asset_type(&self) -> TypeId {
        TypeId::of::<L::AssetType>()
    }
}


/// Value returned by an [`AssetLoader`].
/// Either a plain [`Asset`], or a producer of an [`Asset`].
/// Producer has access to the [`AssetManager`] for loading or inserting dependent assets,
/// and fails the whole asset if it returns an error.
pub struct AssetValue<A>(AssetValueInner<A>);

impl<A: Asset> AssetValue<A> {
    pub fn from_fn<F>(function: F) -> Self
    where
        F: FnOnce(&AssetManager) -> anyhow::Result<A> + 'static,
    {
        Self(AssetValueInner::Producer(Box::new(function)))
    }
}

impl<A: Asset> From<A> for AssetValue<A> {
    fn from(asset: A) -> Self {
        Self(AssetValueInner::Asset(asset))
    }
}

enum AssetValueInner<A> {
    Consumed,
    Asset(A),
    Producer(Box<dyn FnOnce(&AssetManager) -> anyhow::Result<A>>)
}

/// Dynamic trait variant of [`AssetLoader`].
pub(crate) trait DynLoader: 'static {
    fn dyn_load(&self, bytes: &[u8], path: &AssetPath) -> anyhow::Result<Box<dyn DynAssetValue>>;
    fn asset_type(&self) -> TypeId;
}

pub(crate) trait DynAssetValue: 'static {
    fn produce(&mut self, manager: &AssetManager) -> anyhow::Result<Box<dyn Any>>;
}

impl<A: Asset> DynAssetValue for AssetValue<A> {
    fn produce(&mut self, manager: &AssetManager) -> anyhow::Result<Box<dyn Any>> {
        let inner = std::mem::replace(&mut self.0, AssetValueInner::Consumed);
        match inner {
            AssetValueInner::Asset(asset) => Ok(Box::new(asset)),
            AssetValueInner::Producer(producer) => Ok(Box::new(producer(manager)?)),
            AssetValueInner::Consumed => panic!("produce cannot be invoked multiple times"),
        }
    }
}

pub type AssetResult<A> = anyhow::Result<AssetValue<A>>;
