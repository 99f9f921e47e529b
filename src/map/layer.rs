use glam::Vec2;
use roxmltree::Node;
use crate::map::{Gid, Image, Properties, TmxParseError};

/// Layer of a [`crate::map::TiledMap`].
#[derive(Clone, Debug)]
pub struct Layer {
    pub id: u32,
    pub name: String,
    pub class: String,
    pub visible: bool,
    pub opacity: f32,
    pub offset: Vec2,
    pub properties: Properties,
    pub kind: LayerKind,
}

#[derive(Clone, Debug)]
pub enum LayerKind {
    Tiles(TileLayer),
    Objects(ObjectGroup),
    Group(Vec<Layer>),
    Image(Option<Image>),
}

impl Layer {

    /// Parses a <layer>, <objectgroup>, <group> or <imagelayer> node.
    /// Image sources are resolved against `parent_path`, the map's directory.
    /// None for any other node.
    pub fn parse(layer_node: Node, parent_path: Option<&str>) -> Result<Option<Self>, TmxParseError> {
        let mut layer = Layer {
            id: 0,
            name: String::new(),
            class: String::new(),
            visible: true,
            opacity: 1.0,
            offset: Vec2::ZERO,
            properties: Properties::default(),
            kind: LayerKind::Group(Vec::new()),
        };
        let mut width = 0;
        let mut height = 0;
        for attribute in layer_node.attributes() {
            let name = attribute.name();
            let value = attribute.value();
            match name {
                "id" => layer.id = value.parse()?,
                "name" => layer.name = String::from(value),
                "class" => layer.class = String::from(value),
                "visible" => layer.visible = value != "0",
                "opacity" => layer.opacity = value.parse()?,
                "offsetx" => layer.offset.x = value.parse()?,
                "offsety" => layer.offset.y = value.parse()?,
                "width" => width = value.parse()?,
                "height" => height = value.parse()?,
                _ => {}
            }
        }
        if let Some(properties_node) = layer_node.children().find(|node| node.has_tag_name("properties")) {
            layer.properties = Properties::parse(properties_node)?;
        }

        layer.kind = match layer_node.tag_name().name() {
            "layer" => {
                let data = match layer_node.children().find(|node| node.has_tag_name("data")) {
                    Some(data_node) => TileData::parse(data_node)?,
                    None => TileData::Finite(Vec::new()),
                };
                LayerKind::Tiles(TileLayer { width, height, data })
            },
            "objectgroup" => {
                let mut objects = Vec::new();
                for object_node in layer_node.children().filter(|node| node.has_tag_name("object")) {
                    objects.push(MapObject::parse(object_node)?);
                }
                LayerKind::Objects(ObjectGroup(objects))
            },
            "group" => {
                let mut children = Vec::new();
                for child in layer_node.children() {
                    if let Some(child_layer) = Layer::parse(child, parent_path)? {
                        children.push(child_layer);
                    }
                }
                LayerKind::Group(children)
            },
            "imagelayer" => {
                let image = match layer_node.children().find(|node| node.has_tag_name("image")) {
                    Some(image_node) => Some(Image::parse(image_node, parent_path)?),
                    None => None,
                };
                LayerKind::Image(image)
            },
            _ => return Ok(None),
        };
        Ok(Some(layer))
    }
}


/// Grid of global tile ids.
#[derive(Clone, Debug)]
pub struct TileLayer {
    pub width: u32,
    pub height: u32,
    pub data: TileData,
}

#[derive(Clone, Debug)]
pub enum TileData {
    /// Row-major gids of a finite map.
    Finite(Vec<Gid>),
    /// Chunks of an infinite map.
    Infinite(Vec<Chunk>),
}

/// Rectangular block of tiles in an infinite map.
#[derive(Clone, Debug)]
pub struct Chunk {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub tiles: Vec<Gid>,
}

impl Chunk {
    fn get(&self, x: i32, y: i32) -> Option<Gid> {
        let local_x = x - self.x;
        let local_y = y - self.y;
        if local_x < 0 || local_y < 0 || local_x >= self.width as i32 || local_y >= self.height as i32 {
            return None;
        }
        let idx = local_y as usize * self.width as usize + local_x as usize;
        self.tiles.get(idx).copied()
    }
}

impl TileData {
    fn parse(data_node: Node) -> Result<Self, TmxParseError> {
        let encoding = data_node.attribute("encoding");
        if let Some(compression) = data_node.attribute("compression") {
            return Err(TmxParseError::UnsupportedEncoding { encoding: String::from(compression) });
        }
        let chunk_nodes: Vec<Node> = data_node
            .children()
            .filter(|node| node.has_tag_name("chunk"))
            .collect();
        if chunk_nodes.is_empty() {
            return Ok(Self::Finite(parse_gids(data_node, encoding)?));
        }

        let mut chunks = Vec::with_capacity(chunk_nodes.len());
        for chunk_node in chunk_nodes {
            let mut chunk = Chunk { x: 0, y: 0, width: 0, height: 0, tiles: Vec::new() };
            for attribute in chunk_node.attributes() {
                let value = attribute.value();
                match attribute.name() {
                    "x" => chunk.x = value.parse()?,
                    "y" => chunk.y = value.parse()?,
                    "width" => chunk.width = value.parse()?,
                    "height" => chunk.height = value.parse()?,
                    _ => {}
                }
            }
            chunk.tiles = parse_gids(chunk_node, encoding)?;
            chunks.push(chunk);
        }
        Ok(Self::Infinite(chunks))
    }
}

fn parse_gids(node: Node, encoding: Option<&str>) -> Result<Vec<Gid>, TmxParseError> {
    match encoding {
        Some("csv") => {
            let text = node.text().unwrap_or("");
            let mut gids = Vec::new();
            for value in text.split(',').map(str::trim).filter(|value| !value.is_empty()) {
                gids.push(Gid::from_raw(value.parse()?));
            }
            Ok(gids)
        },
        None => {
            let mut gids = Vec::new();
            for tile_node in node.children().filter(|node| node.has_tag_name("tile")) {
                let raw = match tile_node.attribute("gid") {
                    Some(gid) => gid.parse()?,
                    None => 0,
                };
                gids.push(Gid::from_raw(raw));
            }
            Ok(gids)
        },
        Some(encoding) => Err(TmxParseError::UnsupportedEncoding { encoding: String::from(encoding) }),
    }
}

impl TileLayer {

    /// Global tile id at a tile coordinate.
    /// Empty when out of bounds.
    pub fn get_tile_gid(&self, x: i32, y: i32) -> Gid {
        match &self.data {
            TileData::Finite(gids) => {
                if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
                    return Gid::EMPTY;
                }
                let idx = y as usize * self.width as usize + x as usize;
                gids.get(idx).copied().unwrap_or(Gid::EMPTY)
            },
            TileData::Infinite(chunks) => chunks
                .iter()
                .find_map(|chunk| chunk.get(x, y))
                .unwrap_or(Gid::EMPTY),
        }
    }

    /// Computes minx, miny, maxx and maxy of tiles.
    /// Max values are exclusive.
    pub fn bounds(&self) -> (i32, i32, i32, i32) {
        match &self.data {
            TileData::Finite(_) => (0, 0, self.width as i32, self.height as i32),
            TileData::Infinite(chunks) if chunks.is_empty() => (0, 0, 0, 0),
            TileData::Infinite(chunks) => {
                let mut min_x = i32::MAX;
                let mut min_y = i32::MAX;
                let mut max_x = i32::MIN;
                let mut max_y = i32::MIN;
                for chunk in chunks {
                    min_x = min_x.min(chunk.x);
                    min_y = min_y.min(chunk.y);
                    max_x = max_x.max(chunk.x + chunk.width as i32);
                    max_y = max_y.max(chunk.y + chunk.height as i32);
                }
                (min_x, min_y, max_x, max_y)
            },
        }
    }

    /// All non-empty tiles with their coordinates, row by row.
    pub fn tiles(&self) -> impl Iterator<Item = (i32, i32, Gid)> + '_ {
        let (min_x, min_y, max_x, max_y) = self.bounds();
        (min_y..max_y)
            .flat_map(move |y| (min_x..max_x).map(move |x| (x, y)))
            .map(|(x, y)| (x, y, self.get_tile_gid(x, y)))
            .filter(|(_, _, gid)| !gid.is_empty())
    }
}


/// Free-floating objects of an object layer.
#[derive(Clone, Default, Debug)]
pub struct ObjectGroup(pub Vec<MapObject>);

impl ObjectGroup {
    pub fn iter(&self) -> impl Iterator<Item = &MapObject> {
        self.0.iter()
    }
}

#[derive(Clone, PartialEq, Debug)]
pub enum ObjectShape {
    Rectangle,
    Ellipse,
    Point,
    Polygon(Vec<Vec2>),
    Polyline(Vec<Vec2>),
}

/// Object placed in an object layer.
/// Tile objects (those with a gid) are anchored at their bottom-left corner.
#[derive(Clone, Debug)]
pub struct MapObject {
    pub id: u32,
    pub name: String,
    pub class: String,
    pub gid: Option<Gid>,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub rotation: f32,
    pub visible: bool,
    pub shape: ObjectShape,
    pub properties: Properties,
}

impl MapObject {
    fn parse(object_node: Node) -> Result<Self, TmxParseError> {
        let mut object = MapObject {
            id: 0,
            name: String::new(),
            class: String::new(),
            gid: None,
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            rotation: 0.0,
            visible: true,
            shape: ObjectShape::Rectangle,
            properties: Properties::default(),
        };
        for attribute in object_node.attributes() {
            let value = attribute.value();
            match attribute.name() {
                "id" => object.id = value.parse()?,
                "name" => object.name = String::from(value),
                "type" | "class" => object.class = String::from(value),
                "gid" => object.gid = Some(Gid::from_raw(value.parse()?)),
                "x" => object.x = value.parse()?,
                "y" => object.y = value.parse()?,
                "width" => object.width = value.parse()?,
                "height" => object.height = value.parse()?,
                "rotation" => object.rotation = value.parse()?,
                "visible" => object.visible = value != "0",
                _ => {}
            }
        }
        for child in object_node.children() {
            match child.tag_name().name() {
                "properties" => object.properties = Properties::parse(child)?,
                "ellipse" => object.shape = ObjectShape::Ellipse,
                "point" => object.shape = ObjectShape::Point,
                "polygon" => object.shape = ObjectShape::Polygon(parse_points(child)?),
                "polyline" => object.shape = ObjectShape::Polyline(parse_points(child)?),
                _ => {}
            }
        }
        Ok(object)
    }
}

fn parse_points(node: Node) -> Result<Vec<Vec2>, TmxParseError> {
    let points = node.attribute("points").unwrap_or("");
    let mut result = Vec::new();
    for pair in points.split_whitespace() {
        let (x, y) = pair
            .split_once(',')
            .ok_or_else(|| TmxParseError::InvalidAttributeValue { value: String::from(pair) })?;
        result.push(Vec2::new(x.parse()?, y.parse()?));
    }
    Ok(result)
}
