use std::any::{Any, TypeId};
use std::cell::{Ref, RefCell};
use derive_more::*;
use slotmap::SlotMap;
use crate::{Asset, AssetIndex, AssetLoader, AssetPath, AssetState, DynLoader, Handle, HashMap, PathHash, Protocol, Readiness};

/// Storage of all assets of a single type.
pub(crate) type InnerAssetStorage<A> = SlotMap<AssetIndex, AssetState<A>>;

/// Responsible for loading assets and storing them in relevant storages.
/// Loading happens synchronously on the calling thread.
pub struct AssetManager {
    path_prefix: Option<String>,
    protocols: HashMap<String, Box<dyn Protocol>>,
    default_protocol: Option<String>,
    loaders: Vec<Box<dyn DynLoader>>,
    extension_to_loader: HashMap<String, usize>,
    asset_storages: HashMap<TypeId, Box<dyn Any>>,
    path_to_asset: RefCell<HashMap<PathHash, (TypeId, AssetIndex)>>,
}

impl AssetManager {

    pub fn new() -> Self {
        Self {
            path_prefix: None,
            protocols: HashMap::default(),
            default_protocol: None,
            loaders: Vec::default(),
            extension_to_loader: HashMap::default(),
            asset_storages: HashMap::default(),
            path_to_asset: RefCell::default(),
        }
    }

    pub fn builder() -> AssetManagerBuilder {
        AssetManagerBuilder(Self::new())
    }

    /// Directory prepended to every path before it reaches a [`Protocol`].
    pub fn set_path_prefix<S: Into<String>>(&mut self, prefix: Option<S>) {
        self.path_prefix = prefix.map(|s| s.into());
    }

    /// Adds an asset storage for the specified asset type.
    pub fn add_storage<A: Asset>(&mut self) {
        let asset_type = TypeId::of::<A>();
        self.asset_storages
            .entry(asset_type)
            .or_insert_with(|| Box::new(RefCell::new(InnerAssetStorage::<A>::default())));
    }

    /// Adds a protocol for use in loading bytes for asset loaders.
    pub fn add_protocol(&mut self, protocol: impl Protocol, is_default: bool) {
        let name = String::from(protocol.name());
        self.protocols.insert(name.clone(), Box::new(protocol));
        if is_default {
            self.default_protocol = Some(name);
        }
    }

    /// Adds a loader for transforming file bytes into assets.
    /// Also adds a storage for the loader's asset type.
    pub fn add_loader<L: AssetLoader>(&mut self, loader: L) -> Result<(), LoadError> {
        for extension in loader.extensions() {
            if self.extension_to_loader.contains_key(*extension) {
                return Err(LoadError::ExtensionOverlaps);
            }
        }
        let loader_index = self.loaders.len();
        for extension in loader.extensions() {
            self.extension_to_loader.insert(String::from(*extension), loader_index);
        }
        self.loaders.push(Box::new(loader));
        self.add_storage::<L::AssetType>();
        Ok(())
    }

    /// Inserts an asset manually, and returns a handle to it.
    pub fn insert<A: Asset>(&self, asset: A) -> Result<Handle<A>, LoadError> {
        let storage = self.storage_cell::<A>()?;
        let index = storage.borrow_mut().insert(AssetState::Loaded(asset));
        Ok(Handle::new(index))
    }

    /// Gets the readiness of a handle, including the readiness of its dependencies.
    pub fn readiness_of<A: Asset>(&self, handle: &Handle<A>) -> Readiness {
        match self.get(handle) {
            Some(asset) => asset.readiness(self),
            None => Readiness::Failed,
        }
    }

    /// Gets the merged readiness of a set of handles.
    pub fn readiness_all<'a, A: Asset>(&self, handles: impl IntoIterator<Item = &'a Handle<A>>) -> Readiness {
        handles
            .into_iter()
            .fold(Readiness::Ready, |readiness, handle| readiness.merge(self.readiness_of(handle)))
    }

    /// Gets a loaded asset using the specified handle.
    /// None if the asset failed to load.
    pub fn get<A: Asset>(&self, handle: &Handle<A>) -> Option<Ref<'_, A>> {
        let storage = self.storage_cell::<A>().ok()?.borrow();
        Ref::filter_map(storage, |storage| {
            storage.get(handle.index).and_then(|state| state.loaded())
        }).ok()
    }

    /// Number of assets of a given type, loaded or failed.
    pub fn count<A: Asset>(&self) -> usize {
        self.storage_cell::<A>()
            .map(|storage| storage.borrow().len())
            .unwrap_or(0)
    }

    /// Loads an asset and returns a handle to it.
    /// Paths already loaded return the cached handle.
    /// Failures while reading or decoding yield a handle in the failed state.
    pub fn load<A, P>(&self, path: P) -> Result<Handle<A>, LoadError>
    where
        A: Asset,
        P: AsRef<str>,
    {
        // Normalized path is the cache key, so "a/../b.tsx" and "b.tsx" share an asset.
        let mut asset_path = AssetPath::parse(path.as_ref(), self.default_protocol.as_deref())?;
        asset_path.prefix = self.path_prefix.clone();
        let path_hash = PathHash::of(&asset_path.to_string());

        // Returns cached handle if already stored.
        let asset_type = TypeId::of::<A>();
        if let Some((cached_type, index)) = self.path_to_asset.borrow().get(&path_hash).copied() {
            if cached_type != asset_type {
                return Err(LoadError::IncorrectAssetType);
            }
            return Ok(Handle::new(index));
        }

        // Fetches protocol and loader.
        let Some(protocol) = self.protocols.get(&asset_path.protocol) else {
            return Err(LoadError::NoSuchProtocol);
        };
        let Some(loader) = self.extension_to_loader.get(&asset_path.extension).map(|idx| &self.loaders[*idx]) else {
            return Err(LoadError::NoSuchLoader);
        };
        if loader.asset_type() != asset_type {
            return Err(LoadError::IncorrectAssetType);
        }
        let storage = self.storage_cell::<A>()?;

        // Reads and decodes. Dependent assets are loaded by the producer.
        let state = match protocol
            .read(&asset_path)
            .and_then(|bytes| loader.dyn_load(&bytes, &asset_path))
            .and_then(|mut dyn_asset_value| dyn_asset_value.produce(self))
        {
            Ok(dyn_asset) => {
                match dyn_asset.downcast::<A>() {
                    Ok(asset) => {
                        log::debug!("Loaded {asset_path}");
                        AssetState::Loaded(*asset)
                    },
                    Err(_) => return Err(LoadError::IncorrectAssetType),
                }
            },
            Err(err) => {
                log::error!("Failed to load {asset_path}: {err:#}");
                AssetState::Failed
            },
        };

        let index = storage.borrow_mut().insert(state);
        self.path_to_asset.borrow_mut().insert(path_hash, (asset_type, index));
        Ok(Handle::new(index))
    }

    fn storage_cell<A: Asset>(&self) -> Result<&RefCell<InnerAssetStorage<A>>, LoadError> {
        self.asset_storages
            .get(&TypeId::of::<A>())
            .and_then(|storage| storage.downcast_ref::<RefCell<InnerAssetStorage<A>>>())
            .ok_or(LoadError::NoSuchStorage)
    }
}

impl Default for AssetManager {
    fn default() -> Self {
        Self::new()
    }
}

pub struct AssetManagerBuilder(AssetManager);
impl AssetManagerBuilder {

    pub fn default_protocol(mut self, protocol: impl Protocol) -> Self {
        self.0.add_protocol(protocol, true);
        self
    }

    pub fn path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.0.set_path_prefix(Some(prefix));
        self
    }

    pub fn build(self) -> AssetManager {
        self.0
    }
}

#[derive(Error, Debug, Display, Copy, Clone, Eq, PartialEq)]
pub enum LoadError {
    #[display(fmt="Incorrect asset type")]
    IncorrectAssetType,
    #[display(fmt="Asset storage not found")]
    NoSuchStorage,
    #[display(fmt="No default protocol")]
    NoDefaultProtocol,
    #[display(fmt="No such protocol")]
    NoSuchProtocol,
    #[display(fmt="No loader matching extension")]
    NoSuchLoader,
    #[display(fmt="Path missing extension")]
    PathMissingExtension,
    #[display(fmt="Supported extension of one loader overlaps with another")]
    ExtensionOverlaps,
}
