//! Tiled maps (.tmx) and tilesets (.tsx).
//! XML is read with `roxmltree`. Elements and attributes this crate has no use for are ignored.
mod map;
mod tile;
mod tileset;
mod layer;
mod properties;

pub use map::*;
pub use tile::*;
pub use tileset::*;
pub use layer::*;
pub use properties::*;

use crate::{AssetManager, LoadError};

/// Registers the .tmx and .tsx loaders, along with storages for their assets.
pub fn install_loaders(assets: &mut AssetManager) -> Result<(), LoadError> {
    assets.add_loader(TmxLoader)?;
    assets.add_loader(TsxLoader)?;
    Ok(())
}


#[cfg(test)]
mod test {
    use crate::{AssetManager, Readiness, RawProtocol};
    use crate::map::{install_loaders, Gid, TileRef, TiledMap, Tileset};

    const TILES: &str = include_str!("../../assets/tilesets/summer_rpg/summer_rpg_tiles.tsx");
    const OBJECTS: &str = include_str!("../../assets/tilesets/summer_rpg/summer_rpg_objects.tsx");
    const MAP: &str = include_str!("../../assets/maps/level_1.tmx");

    fn manager(protocol: RawProtocol) -> AssetManager {
        let mut manager = AssetManager::builder()
            .default_protocol(protocol)
            .build();
        install_loaders(&mut manager).unwrap();
        manager
    }

    #[test]
    fn load_map_with_external_tilesets() {
        let manager = manager(RawProtocol::new()
            .with_file("maps/level_1.tmx", MAP)
            .with_file("tilesets/summer_rpg/summer_rpg_tiles.tsx", TILES)
            .with_file("tilesets/summer_rpg/summer_rpg_objects.tsx", OBJECTS)
        );
        let handle = manager.load::<TiledMap, _>("maps/level_1.tmx").unwrap();
        assert_eq!(Readiness::Ready, manager.readiness_of(&handle));

        let map = manager.get(&handle).unwrap();
        assert_eq!(2, map.tilesets.len());
        assert_eq!(1, map.tilesets[0].first_gid);
        assert_eq!(68, map.tilesets[1].first_gid);
        assert_eq!(Some(TileRef { tileset_index: 1, tile_id: 25 }), map.resolve(Gid::from_raw(93)));
        assert_eq!(Some(TileRef { tileset_index: 0, tile_id: 0 }), map.resolve(Gid::from_raw(1)));
        assert_eq!(None, map.resolve(Gid::EMPTY));

        let objects = manager.get(&map.tilesets[1].tileset).unwrap();
        assert_eq!("summer_rpg_objects", objects.name);
        assert!(map.layer_by_name("trees").is_some());
        assert!(map.layer_by_name("missing").is_none());
    }

    #[test]
    fn tilesets_load_once() {
        let manager = manager(RawProtocol::new()
            .with_file("tilesets/summer_rpg/summer_rpg_tiles.tsx", TILES)
        );
        let first = manager.load::<Tileset, _>("tilesets/summer_rpg/summer_rpg_tiles.tsx").unwrap();
        let second = manager.load::<Tileset, _>("tilesets/summer_rpg/summer_rpg_tiles.tsx").unwrap();
        assert_eq!(first, second);
        assert_eq!(1, manager.count::<Tileset>());
    }

    #[test]
    fn map_reuses_tileset_loaded_directly() {
        let manager = manager(RawProtocol::new()
            .with_file("maps/level_1.tmx", MAP)
            .with_file("tilesets/summer_rpg/summer_rpg_tiles.tsx", TILES)
            .with_file("tilesets/summer_rpg/summer_rpg_objects.tsx", OBJECTS)
        );
        let tiles = manager.load::<Tileset, _>("tilesets/summer_rpg/summer_rpg_tiles.tsx").unwrap();
        let map_handle = manager.load::<TiledMap, _>("maps/level_1.tmx").unwrap();
        let map = manager.get(&map_handle).unwrap();
        assert_eq!(tiles, map.tilesets[0].tileset);
        assert_eq!(2, manager.count::<Tileset>());

        // Equivalent spellings of a path share the cached asset
        let dotted = manager.load::<Tileset, _>("maps/../tilesets/./summer_rpg/summer_rpg_tiles.tsx").unwrap();
        assert_eq!(tiles, dotted);
        assert_eq!(2, manager.count::<Tileset>());
    }

    #[test]
    fn missing_tileset_fails_map() {
        let manager = manager(RawProtocol::new()
            .with_file("maps/level_1.tmx", MAP)
            .with_file("tilesets/summer_rpg/summer_rpg_tiles.tsx", TILES)
        );
        let handle = manager.load::<TiledMap, _>("maps/level_1.tmx").unwrap();
        assert_eq!(Readiness::Failed, manager.readiness_of(&handle));
    }

    #[test]
    fn malformed_tileset_fails() {
        let manager = manager(RawProtocol::new()
            .with_file("broken.tsx", "<tileset name=\"x\"><tile id=\"a\"/></tileset>")
        );
        let handle = manager.load::<Tileset, _>("broken.tsx").unwrap();
        assert_eq!(Readiness::Failed, manager.readiness_of(&handle));
        assert!(manager.get(&handle).is_none());
    }
}
