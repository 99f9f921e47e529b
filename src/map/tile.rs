use bitflags::bitflags;
use glam::UVec2;
use roxmltree::Node;
use crate::map::{Properties, TmxParseError};

/// Single tile definition within a [`crate::map::Tileset`].
#[derive(Clone, PartialEq, Debug)]
pub struct Tile {
    /// ID of tile local to its tileset
    pub id: u32,
    pub class: String,
    /// Relative weight used when picking a random tile. Defaults to 1.
    pub probability: f32,
    /// Present on tiles of an image collection tileset.
    pub image: Option<Image>,
    pub properties: Properties,
}

impl Default for Tile {
    fn default() -> Self {
        Self {
            id: 0,
            class: String::new(),
            probability: 1.0,
            image: None,
            properties: Properties::default(),
        }
    }
}

impl Tile {

    pub fn parse(tile_node: Node, parent_path: Option<&str>) -> Result<Self, TmxParseError> {
        let mut tile = Tile::default();
        let mut id = None;
        for attribute in tile_node.attributes() {
            let name = attribute.name();
            let value = attribute.value();
            match name {
                "id" => id = Some(value.parse()?),
                "type" | "class" => tile.class = String::from(value),
                "probability" => tile.probability = value.parse()?,
                _ => {}
            }
        }
        tile.id = id.ok_or(TmxParseError::MissingAttribute { name: String::from("id") })?;
        if !tile.probability.is_finite() || tile.probability < 0.0 {
            return Err(TmxParseError::InvalidProbability { id: tile.id, probability: tile.probability });
        }

        for child in tile_node.children() {
            match child.tag_name().name() {
                "image" => tile.image = Some(Image::parse(child, parent_path)?),
                "properties" => tile.properties = Properties::parse(child)?,
                _ => {}
            }
        }
        Ok(tile)
    }

    /// Authored pixel size of the tile's own image, if it declares one.
    pub fn image_size(&self) -> Option<UVec2> {
        self.image.as_ref()?.size()
    }
}


/// Reference to an image, either as a file or embedded in the document.
#[derive(Clone, Eq, PartialEq, Default, Debug)]
pub struct Image {
    pub format: String,
    /// Path relative to the working directory of the asset manager.
    /// None when the image data is embedded.
    pub source: Option<String>,
    pub trans: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Encoding of embedded data, if any. Embedded pixels are never decoded.
    pub embedded_encoding: Option<String>,
}

impl Image {
    pub fn parse(image_node: Node, parent_path: Option<&str>) -> Result<Image, TmxParseError> {
        let mut image = Image::default();
        for attribute in image_node.attributes() {
            let name = attribute.name();
            let value = attribute.value();
            match name {
                "format" => image.format = String::from(value),
                "source" => {
                    let source = match parent_path {
                        Some(parent) => format!("{parent}/{value}"),
                        None => String::from(value),
                    };
                    image.source = Some(source);
                },
                "trans" => image.trans = Some(String::from(value)),
                "width" => image.width = Some(value.parse()?),
                "height" => image.height = Some(value.parse()?),
                _ => {}
            }
        }
        if let Some(data_node) = image_node.children().find(|node| node.has_tag_name("data")) {
            let encoding = data_node.attribute("encoding").unwrap_or("xml");
            image.embedded_encoding = Some(String::from(encoding));
        }
        Ok(image)
    }

    pub fn size(&self) -> Option<UVec2> {
        Some(UVec2::new(self.width?, self.height?))
    }
}


bitflags! {
    /// Flip flags stored in the upper bits of a global tile id.
    #[derive(Copy, Clone, Eq, PartialEq, Default, Debug, Hash)]
    pub struct TileFlip: u32 {
        const HORIZONTAL    = 0x80000000;
        const VERTICAL      = 0x40000000;
        const DIAGONAL      = 0x20000000;
        const HEXAGONAL_120 = 0x10000000;
    }
}

/// Global tile id, as stored in map layers.
/// Zero means "no tile".
#[derive(Copy, Clone, Eq, PartialEq, Default, Debug, Hash)]
pub struct Gid {
    pub id: u32,
    pub flip: TileFlip,
}

impl Gid {
    pub const EMPTY: Self = Self { id: 0, flip: TileFlip::empty() };

    /// Splits a raw gid into id and flip flags.
    pub fn from_raw(raw: u32) -> Self {
        let flip = TileFlip::from_bits_truncate(raw);
        Self { id: raw & !TileFlip::all().bits(), flip }
    }

    pub fn is_empty(&self) -> bool {
        self.id == 0
    }
}

/// A [`Gid`] resolved against the tilesets of a map.
#[derive(Copy, Clone, Eq, PartialEq, Default, Debug, Hash, Ord, PartialOrd)]
pub struct TileRef {
    pub tileset_index: usize,
    pub tile_id: u32,
}


#[cfg(test)]
mod test {
    use crate::map::{Gid, TileFlip};

    #[test]
    fn gid_flags() {
        let gid = Gid::from_raw(0x80000000 | 0x20000000 | 42);
        assert_eq!(42, gid.id);
        assert_eq!(TileFlip::HORIZONTAL | TileFlip::DIAGONAL, gid.flip);
        assert!(Gid::from_raw(0).is_empty());
        assert!(Gid::from_raw(0x40000000).is_empty());
    }
}
