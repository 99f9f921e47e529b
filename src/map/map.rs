use std::num::{ParseFloatError, ParseIntError};
use derive_more::*;
use roxmltree::{Document, Node};
use crate::{Asset, AssetLoader, AssetManager, AssetPath, AssetResult, AssetValue, Handle, Readiness};
use crate::map::{Gid, Layer, LayerKind, Properties, TileRef, Tileset};


/// Loader for a .tmx file.
/// Outputs a [`TiledMap`], loading external tilesets it references through the [`AssetManager`].
pub struct TmxLoader;
impl AssetLoader for TmxLoader {

    type AssetType = TiledMap;

    fn load(&self, bytes: &[u8], path: &AssetPath) -> AssetResult<TiledMap> {
        let source = std::str::from_utf8(bytes)?;
        let doc = Document::parse(source)?;
        let (map, entries) = TiledMap::parse_doc(&doc, path.parent().as_deref())?;

        // Finalizes map once dependent tilesets are available
        Ok(AssetValue::from_fn(move |manager| {
            let mut map = map;
            for entry in entries {
                let map_tileset = match entry {
                    TilesetEntry::Internal { first_gid, tileset } => MapTileset {
                        first_gid,
                        tileset: manager.insert(tileset)?,
                    },
                    TilesetEntry::External { first_gid, source } => MapTileset {
                        first_gid,
                        tileset: manager.load(source)?,
                    },
                };
                map.tilesets.push(map_tileset);
            }
            map.tilesets.sort_by_key(|map_tileset| map_tileset.first_gid);
            Ok(map)
        }))
    }

    fn extensions(&self) -> &[&str] {
        &["tmx"]
    }
}


/// A Tiled map with its tilesets loaded as handles.
#[derive(Clone, Default, Debug)]
pub struct TiledMap {
    pub version: String,
    pub orientation: Orientation,
    pub render_order: RenderOrder,
    pub width: u32,
    pub height: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    pub infinite: bool,
    pub background_color: Option<Color>,
    pub properties: Properties,
    /// Sorted by first gid.
    pub tilesets: Vec<MapTileset>,
    pub layers: Vec<Layer>,
}

impl Asset for TiledMap {
    fn readiness(&self, assets: &AssetManager) -> Readiness {
        assets.readiness_all(self.tilesets.iter().map(|map_tileset| &map_tileset.tileset))
    }
}

impl TiledMap {

    /// Parses a map document, leaving tilesets unresolved.
    pub fn parse_doc(doc: &Document, parent_path: Option<&str>) -> Result<(Self, Vec<TilesetEntry>), TmxParseError> {
        let root = doc.root_element();
        match root.tag_name().name() {
            "map" => {
                let mut map = Self::default();
                let entries = map.parse(root, parent_path)?;
                Ok((map, entries))
            },
            tag_name => Err(TmxParseError::UnexpectedTagError { tag_name: String::from(tag_name) }),
        }
    }

    fn parse(&mut self, map_node: Node, parent_path: Option<&str>) -> Result<Vec<TilesetEntry>, TmxParseError> {

        // Parses map attributes
        for attribute in map_node.attributes() {
            let name = attribute.name();
            let value = attribute.value();
            match name {
                "version" => self.version = String::from(value),
                "orientation" => self.orientation = Orientation::parse(value)?,
                "renderorder" => self.render_order = RenderOrder::parse(value)?,
                "width" => self.width = value.parse()?,
                "height" => self.height = value.parse()?,
                "tilewidth" => self.tile_width = value.parse()?,
                "tileheight" => self.tile_height = value.parse()?,
                "backgroundcolor" => self.background_color = Some(Color::parse(value)?),
                "infinite" => self.infinite = match value {
                    "0" => false,
                    "1" => true,
                    _ => return Err(TmxParseError::InvalidAttributeValue { value: String::from(value) }),
                },
                _ => {}
            }
        }

        // Traverses children
        let mut entries = Vec::new();
        for node in map_node.children() {
            let tag_name = node.tag_name().name();
            match tag_name {
                "tileset" => entries.push(TilesetEntry::parse(node, parent_path)?),
                "properties" => self.properties = Properties::parse(node)?,
                "layer" | "objectgroup" | "group" | "imagelayer" => {
                    if let Some(layer) = Layer::parse(node, parent_path)? {
                        self.layers.push(layer);
                    }
                },
                _ => {},
            }
        }
        Ok(entries)
    }

    /// Resolves a global tile id to the tileset that owns it.
    /// None for empty gids or gids below every first gid.
    pub fn resolve(&self, gid: Gid) -> Option<TileRef> {
        if gid.is_empty() { return None }
        let tileset_index = self.tilesets
            .iter()
            .rposition(|map_tileset| map_tileset.first_gid <= gid.id)?;
        let first_gid = self.tilesets[tileset_index].first_gid;
        Some(TileRef { tileset_index, tile_id: gid.id - first_gid })
    }

    /// Finds a top-level or nested layer by name.
    pub fn layer_by_name(&self, name: &str) -> Option<&Layer> {
        fn find<'a>(layers: &'a [Layer], name: &str) -> Option<&'a Layer> {
            for layer in layers {
                if layer.name == name {
                    return Some(layer);
                }
                if let LayerKind::Group(group) = &layer.kind {
                    if let Some(found) = find(group, name) {
                        return Some(found);
                    }
                }
            }
            None
        }
        find(&self.layers, name)
    }
}

/// A tileset used by a [`TiledMap`].
#[derive(Copy, Clone, Debug)]
pub struct MapTileset {
    pub first_gid: u32,
    pub tileset: Handle<Tileset>,
}

/// A single tileset stored in a map document.
/// Either stores the tileset, or references it in another file.
#[derive(Clone, Debug)]
pub enum TilesetEntry {
    Internal {
        first_gid: u32,
        tileset: Tileset,
    },
    External {
        first_gid: u32,
        source: String,
    }
}

impl TilesetEntry {
    fn parse(entry_node: Node, parent_path: Option<&str>) -> Result<Self, TmxParseError> {
        let first_gid: u32 = entry_node
            .attribute("firstgid")
            .ok_or(TmxParseError::MissingAttribute { name: String::from("firstgid") })?
            .parse()?;

        match entry_node.attribute("source") {
            Some(source) => {
                let source = match parent_path {
                    Some(parent_path) => format!("{parent_path}/{source}"),
                    None => String::from(source),
                };
                Ok(TilesetEntry::External { first_gid, source })
            },
            None => {
                let tileset = Tileset::parse(entry_node, parent_path)?;
                Ok(TilesetEntry::Internal { first_gid, tileset })
            },
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Default, Debug)]
pub enum Orientation {
    #[default]
    Orthogonal,
    Isometric,
    Staggered,
    Hexagonal,
}

impl Orientation {
    pub fn parse(str: &str) -> Result<Self, TmxParseError> {
        match str {
            "orthogonal" => Ok(Self::Orthogonal),
            "isometric" => Ok(Self::Isometric),
            "staggered" => Ok(Self::Staggered),
            "hexagonal" => Ok(Self::Hexagonal),
            _ => Err(TmxParseError::InvalidAttributeValue { value: String::from(str) })
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Default, Debug)]
pub enum RenderOrder {
    #[default]
    RightDown,
    RightUp,
    LeftDown,
    LeftUp,
}

impl RenderOrder {
    pub fn parse(str: &str) -> Result<Self, TmxParseError> {
        match str {
            "right-down" => Ok(Self::RightDown),
            "right-up" => Ok(Self::RightUp),
            "left-down" => Ok(Self::LeftDown),
            "left-up" => Ok(Self::LeftUp),
            _ => Err(TmxParseError::InvalidAttributeValue { value: String::from(str) })
        }
    }
}

/// RGBA color as written by Tiled: #RRGGBB or #AARRGGBB.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn parse(str: &str) -> Result<Self, TmxParseError> {
        let hex = str.trim_start_matches('#');
        let invalid = || TmxParseError::InvalidAttributeValue { value: String::from(str) };
        let channel = |idx: usize| -> Result<u8, TmxParseError> {
            let digits = hex.get(idx..idx + 2).ok_or_else(invalid)?;
            u8::from_str_radix(digits, 16).map_err(|_| invalid())
        };
        match hex.len() {
            6 => Ok(Self { r: channel(0)?, g: channel(2)?, b: channel(4)?, a: 255 }),
            8 => Ok(Self { a: channel(0)?, r: channel(2)?, g: channel(4)?, b: channel(6)? }),
            _ => Err(invalid()),
        }
    }
}

#[derive(Error, Display, From, Debug)]
pub enum TmxParseError {
    XmlError(roxmltree::Error),
    #[display(fmt="{_0}")]
    ParseIntError(ParseIntError),
    #[display(fmt="{_0}")]
    ParseFloatError(ParseFloatError),
    #[display(fmt="Unexpected tag '{tag_name}'")]
    #[from(ignore)]
    UnexpectedTagError { tag_name: String },
    #[display(fmt="Unexpected value {value}")]
    #[from(ignore)]
    InvalidAttributeValue { value: String },
    #[display(fmt="Missing attribute '{name}'")]
    #[from(ignore)]
    MissingAttribute { name: String },
    #[display(fmt="Tile id {id} is defined more than once")]
    #[from(ignore)]
    DuplicateTileId { id: u32 },
    #[display(fmt="Tile {id} has invalid probability {probability}")]
    #[from(ignore)]
    InvalidProbability { id: u32, probability: f32 },
    #[display(fmt="Unsupported layer encoding '{encoding}'")]
    #[from(ignore)]
    UnsupportedEncoding { encoding: String },
}
