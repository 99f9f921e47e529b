use std::collections::BTreeMap;
use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};
use roxmltree::{Document, Node};
use crate::{Asset, AssetLoader, AssetPath, AssetResult, AssetValue};
use crate::map::{Image, Orientation, Properties, Tile, TmxParseError};

/// Loader for a .tsx file.
/// Outputs a [`Tileset`].
pub struct TsxLoader;
impl AssetLoader for TsxLoader {
    type AssetType = Tileset;

    fn load(&self, bytes: &[u8], path: &AssetPath) -> AssetResult<Tileset> {
        let xml_source = std::str::from_utf8(bytes)?;
        let xml_doc = Document::parse(xml_source)?;
        let tileset = Tileset::parse_doc(&xml_doc, path.parent().as_deref())?;
        log::info!("Loaded tileset '{}' with {} tiles", tileset.name, tileset.tiles.len());
        Ok(AssetValue::from(tileset))
    }

    fn extensions(&self) -> &[&str] {
        &["tsx"]
    }
}

/// Named catalog of tiles sharing a grid convention.
#[derive(Clone, Default, Debug)]
pub struct Tileset {
    pub name: String,
    pub class: String,
    pub tile_width: u32,
    pub tile_height: u32,
    pub spacing: u32,
    pub margin: u32,
    pub tile_count: u32,
    pub columns: u32,
    pub object_alignment: ObjectAlignment,
    pub tile_render_size: TileRenderSize,
    pub fill_mode: FillMode,
    pub tile_offset: Option<TileOffset>,
    pub grid: Option<Grid>,
    /// Sprite sheet shared by all tiles, if the tileset isn't an image collection.
    pub image: Option<Image>,
    pub properties: Properties,
    tiles: BTreeMap<u32, Tile>,
}

impl Asset for Tileset {}

impl Tileset {

    pub fn parse_str(xml_source: &str, parent_path: Option<&str>) -> Result<Self, TmxParseError> {
        let doc = Document::parse(xml_source)?;
        Self::parse_doc(&doc, parent_path)
    }

    pub fn parse_doc(doc: &Document, parent_path: Option<&str>) -> Result<Self, TmxParseError> {
        let root = doc.root_element();
        match root.tag_name().name() {
            "tileset" => Self::parse(root, parent_path),
            tag_name => Err(TmxParseError::UnexpectedTagError { tag_name: String::from(tag_name) }),
        }
    }

    /// Parses a <tileset> node, either standalone or embedded in a map.
    pub fn parse(tileset_node: Node, parent_path: Option<&str>) -> Result<Self, TmxParseError> {
        let mut tileset = Tileset::default();

        // Parses attributes
        for attribute in tileset_node.attributes() {
            let name = attribute.name();
            let value = attribute.value();
            match name {
                "name" => tileset.name = String::from(value),
                "class" => tileset.class = String::from(value),
                "tilewidth" => tileset.tile_width = value.parse()?,
                "tileheight" => tileset.tile_height = value.parse()?,
                "spacing" => tileset.spacing = value.parse()?,
                "margin" => tileset.margin = value.parse()?,
                "tilecount" => tileset.tile_count = value.parse()?,
                "columns" => tileset.columns = value.parse()?,
                "objectalignment" => tileset.object_alignment = ObjectAlignment::parse(value)?,
                "tilerendersize" => tileset.tile_render_size = TileRenderSize::parse(value)?,
                "fillmode" => tileset.fill_mode = FillMode::parse(value)?,
                _ => {}
            }
        }

        // Parses children
        for child in tileset_node.children() {
            let tag = child.tag_name().name();
            match tag {
                "image" => tileset.image = Some(Image::parse(child, parent_path)?),
                "grid" => tileset.grid = Some(Grid::parse(child)?),
                "tileoffset" => tileset.tile_offset = Some(TileOffset::parse(child)?),
                "properties" => tileset.properties = Properties::parse(child)?,
                "tile" => {
                    let tile = Tile::parse(child, parent_path)?;
                    if tileset.tiles.contains_key(&tile.id) {
                        return Err(TmxParseError::DuplicateTileId { id: tile.id });
                    }
                    tileset.tiles.insert(tile.id, tile);
                },
                _ => {}
            }
        }

        // Tiles of an image collection are all listed, so the count should agree
        if tileset.image.is_none() && tileset.tile_count as usize != tileset.tiles.len() {
            log::warn!(
                "Tileset '{}' declares {} tiles but defines {}",
                tileset.name, tileset.tile_count, tileset.tiles.len()
            );
        }
        Ok(tileset)
    }

    /// Tile definition with the given local id.
    pub fn tile(&self, id: u32) -> Option<&Tile> {
        self.tiles.get(&id)
    }

    /// Explicitly defined tiles, in ascending id order.
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Probability of a tile id, as used for weighted random picks.
    /// Tiles without an explicit definition weigh 1 when they belong to a sprite sheet, and 0 otherwise.
    pub fn probability_of(&self, id: u32) -> f32 {
        match self.tiles.get(&id) {
            Some(tile) => tile.probability,
            None if self.image.is_some() && id < self.tile_count => 1.0,
            None => 0.0,
        }
    }

    /// Sum of the probabilities of the ids given.
    pub fn total_probability(&self, ids: impl IntoIterator<Item = u32>) -> f32 {
        ids.into_iter().map(|id| self.probability_of(id)).sum()
    }

    /// Picks one of the candidate ids, with chance proportional to its probability.
    /// None if no candidate has a positive probability.
    pub fn choose_weighted(&self, ids: &[u32], rng: &mut impl Rng) -> Option<u32> {
        let candidates: Vec<(u32, f32)> = ids
            .iter()
            .map(|id| (*id, self.probability_of(*id)))
            .filter(|(_, weight)| *weight > 0.0)
            .collect();
        let distribution = WeightedIndex::new(candidates.iter().map(|(_, weight)| *weight)).ok()?;
        Some(candidates[distribution.sample(rng)].0)
    }

    /// Pixel size of a tile as authored.
    /// Falls back to the nominal tile size when the tile has no image of its own.
    pub fn tile_image_size(&self, id: u32) -> Option<glam::UVec2> {
        let tile_size = glam::UVec2::new(self.tile_width, self.tile_height);
        match self.tiles.get(&id) {
            Some(tile) => Some(tile.image_size().unwrap_or(tile_size)),
            None if self.image.is_some() && id < self.tile_count => Some(tile_size),
            None => None,
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Default, Debug)]
pub enum ObjectAlignment {
    #[default]
    Unspecified,
    TopLeft,
    Top,
    TopRight,
    Left,
    Center,
    Right,
    BottomLeft,
    Bottom,
    BottomRight,
}

impl ObjectAlignment {
    pub fn parse(str: &str) -> Result<Self, TmxParseError> {
        match str {
            "unspecified" => Ok(Self::Unspecified),
            "topleft" => Ok(Self::TopLeft),
            "top" => Ok(Self::Top),
            "topright" => Ok(Self::TopRight),
            "left" => Ok(Self::Left),
            "center" => Ok(Self::Center),
            "right" => Ok(Self::Right),
            "bottomleft" => Ok(Self::BottomLeft),
            "bottom" => Ok(Self::Bottom),
            "bottomright" => Ok(Self::BottomRight),
            _ => Err(TmxParseError::InvalidAttributeValue { value: String::from(str) })
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Default, Debug)]
pub enum FillMode {
    #[default]
    Stretch,
    PreserveAspectFit,
}

impl FillMode {
    pub fn parse(str: &str) -> Result<Self, TmxParseError> {
        match str {
            "stretch" => Ok(Self::Stretch),
            "preserve-aspect-fit" => Ok(Self::PreserveAspectFit),
            _ => Err(TmxParseError::InvalidAttributeValue { value: String::from(str) })
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Default, Debug)]
pub enum TileRenderSize {
    #[default]
    Tile,
    Grid,
}

impl TileRenderSize {
    pub fn parse(str: &str) -> Result<Self, TmxParseError> {
        match str {
            "tile" => Ok(Self::Tile),
            "grid" => Ok(Self::Grid),
            _ => Err(TmxParseError::InvalidAttributeValue { value: String::from(str) })
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Default, Debug)]
pub struct TileOffset { pub x: i32, pub y: i32 }

impl TileOffset {
    fn parse(node: Node) -> Result<Self, TmxParseError> {
        let mut offset = Self::default();
        for attribute in node.attributes() {
            match attribute.name() {
                "x" => offset.x = attribute.value().parse()?,
                "y" => offset.y = attribute.value().parse()?,
                _ => {}
            }
        }
        Ok(offset)
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Default, Debug)]
pub struct Grid {
    pub orientation: Orientation,
    pub width: u32,
    pub height: u32,
}

impl Grid {
    fn parse(node: Node) -> Result<Self, TmxParseError> {
        let mut grid = Self::default();
        for attribute in node.attributes() {
            let value = attribute.value();
            match attribute.name() {
                "orientation" => grid.orientation = Orientation::parse(value)?,
                "width" => grid.width = value.parse()?,
                "height" => grid.height = value.parse()?,
                _ => {}
            }
        }
        Ok(grid)
    }
}


#[cfg(test)]
mod test {
    use glam::UVec2;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use crate::map::{Grid, Orientation, Tileset, TmxParseError};

    const TILES: &str = include_str!("../../assets/tilesets/summer_rpg/summer_rpg_tiles.tsx");
    const OBJECTS: &str = include_str!("../../assets/tilesets/summer_rpg/summer_rpg_objects.tsx");

    #[test]
    fn parse_ground_tileset() {
        let tileset = Tileset::parse_str(TILES, Some("tilesets/summer_rpg")).unwrap();
        assert_eq!("summer_rpg_tiles", tileset.name);
        assert_eq!(256, tileset.tile_width);
        assert_eq!(256, tileset.tile_height);
        assert_eq!(67, tileset.tile_count);
        assert_eq!(67, tileset.len());
        assert_eq!(Some(Grid { orientation: Orientation::Orthogonal, width: 1, height: 1 }), tileset.grid);

        let greenery = tileset.tile(3).unwrap();
        assert_eq!(0.1, greenery.probability);
        assert_eq!(Some(UVec2::new(256, 173)), greenery.image_size());
        let source = greenery.image.as_ref().unwrap().source.as_deref();
        assert_eq!(Some("tilesets/summer_rpg/summer_rpg_tiles/greenery_1.png"), source);

        let background = tileset.tile(0).unwrap();
        assert_eq!(1.0, background.probability);
    }

    #[test]
    fn tiles_iterate_in_id_order() {
        let tileset = Tileset::parse_str(TILES, None).unwrap();
        let ids: Vec<u32> = tileset.tiles().map(|tile| tile.id).collect();
        let expected: Vec<u32> = (0..67).collect();
        assert_eq!(expected, ids);
    }

    #[test]
    fn embedded_image_has_no_source() {
        let tileset = Tileset::parse_str(TILES, None).unwrap();
        let tile = tileset.tile(1).unwrap();
        assert_eq!(20.0, tile.probability);
        let image = tile.image.as_ref().unwrap();
        assert_eq!(None, image.source);
        assert_eq!(Some(String::from("base64")), image.embedded_encoding);
        assert_eq!(None, tile.image_size());
        assert_eq!(Some(UVec2::new(256, 256)), tileset.tile_image_size(1));
    }

    #[test]
    fn parse_object_tileset() {
        let tileset = Tileset::parse_str(OBJECTS, None).unwrap();
        assert_eq!("summer_rpg_objects", tileset.name);
        assert_eq!(620, tileset.tile_width);
        assert_eq!(628, tileset.tile_height);
        assert_eq!(39, tileset.len());
        assert_eq!(Some(UVec2::new(105, 96)), tileset.tile(0).unwrap().image_size());
        assert_eq!(Some(UVec2::new(152, 248)), tileset.tile_image_size(25));
        assert_eq!(None, tileset.tile_image_size(39));
    }

    #[test]
    fn total_probability() {
        let tileset = Tileset::parse_str(TILES, None).unwrap();
        let total = tileset.total_probability(0..67);
        assert!((total - 73.4).abs() < 1e-3, "Unexpected total {total}");
        assert_eq!(0.0, tileset.total_probability([100, 200]));
    }

    #[test]
    fn duplicate_tile_id() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<tileset name="dupes" tilewidth="16" tileheight="16" tilecount="2" columns="0">
 <tile id="4"><image width="16" height="16" source="a.png"/></tile>
 <tile id="4"><image width="16" height="16" source="b.png"/></tile>
</tileset>"#;
        let err = Tileset::parse_str(xml, None).unwrap_err();
        assert!(matches!(err, TmxParseError::DuplicateTileId { id: 4 }));
    }

    #[test]
    fn negative_probability() {
        let xml = r#"<tileset name="bad" tilewidth="16" tileheight="16" tilecount="1" columns="0">
 <tile id="0" probability="-1"><image width="16" height="16" source="a.png"/></tile>
</tileset>"#;
        let err = Tileset::parse_str(xml, None).unwrap_err();
        assert!(matches!(err, TmxParseError::InvalidProbability { id: 0, .. }));
    }

    #[test]
    fn not_a_tileset() {
        let err = Tileset::parse_str("<map/>", None).unwrap_err();
        assert!(matches!(err, TmxParseError::UnexpectedTagError { .. }));
    }

    #[test]
    fn weighted_choice() {
        let tileset = Tileset::parse_str(TILES, None).unwrap();
        let mut rng = SmallRng::seed_from_u64(7);

        // Tile 1 weighs 20, tile 3 weighs 0.1
        let mut heavy = 0;
        for _ in 0..1000 {
            match tileset.choose_weighted(&[1, 3], &mut rng) {
                Some(1) => heavy += 1,
                Some(3) => {},
                other => panic!("Unexpected pick {other:?}"),
            }
        }
        assert!(heavy > 950, "Heavy tile picked only {heavy} times");

        // Unknown ids never get picked
        assert_eq!(Some(0), tileset.choose_weighted(&[0, 500], &mut rng));
        assert_eq!(None, tileset.choose_weighted(&[500, 501], &mut rng));
        assert_eq!(None, tileset.choose_weighted(&[], &mut rng));
    }
}
