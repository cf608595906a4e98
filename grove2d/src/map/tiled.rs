//! In-memory tile map asset and its Tiled JSON loader.
//!
//! Only what gameplay code reads is kept: map and tile dimensions, tilesets,
//! layers with their tiles or objects, and typed custom properties.
//! Coordinates stay in Tiled's native pixel space (y pointing down).

use std::collections::HashMap;
use std::path::Path;

use log::warn;
use serde::Deserialize;

use crate::error::MapError;
use crate::math::{Rect, Vec2};

pub const FLIPPED_HORIZONTALLY: u32 = 0x8000_0000;
pub const FLIPPED_VERTICALLY: u32 = 0x4000_0000;
pub const FLIPPED_DIAGONALLY: u32 = 0x2000_0000;
const ROTATED_HEXAGONAL_120: u32 = 0x1000_0000;
const GID_MASK: u32 =
    !(FLIPPED_HORIZONTALLY | FLIPPED_VERTICALLY | FLIPPED_DIAGONALLY | ROTATED_HEXAGONAL_120);

/// Reference to a tile graphic: a global tile id plus its flip flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TileRef {
    /// Global tile id with the flag bits stripped (0 = no tile).
    pub gid: u32,
    pub flip_horizontal: bool,
    pub flip_vertical: bool,
    pub flip_diagonal: bool,
}

impl TileRef {
    pub fn new(gid: u32) -> Self {
        Self {
            gid: gid & GID_MASK,
            ..Self::default()
        }
    }

    /// Decode a raw gid as stored in Tiled files, flag bits included.
    pub fn from_raw(raw: u32) -> Self {
        Self {
            gid: raw & GID_MASK,
            flip_horizontal: raw & FLIPPED_HORIZONTALLY != 0,
            flip_vertical: raw & FLIPPED_VERTICALLY != 0,
            flip_diagonal: raw & FLIPPED_DIAGONALLY != 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.gid == 0
    }
}

/// A typed custom property value.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// `#AARRGGBB` as written by Tiled.
    Color(String),
    File(String),
    /// Id of another object on the map.
    Object(u32),
}

impl PropertyValue {
    /// Numeric value as `f32`; integers are widened.
    pub fn as_f32(&self) -> Option<f32> {
        match *self {
            PropertyValue::Float(v) => Some(v as f32),
            PropertyValue::Int(v) => Some(v as f32),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            PropertyValue::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            PropertyValue::Bool(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(v) | PropertyValue::Color(v) | PropertyValue::File(v) => Some(v),
            _ => None,
        }
    }
}

/// Named custom properties attached to a map, layer or object.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Properties(HashMap<String, PropertyValue>);

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.0.get(name)
    }

    /// Numeric property, or `default` when it is absent or not a number.
    pub fn get_f32_or(&self, name: &str, default: f32) -> f32 {
        self.get(name).and_then(PropertyValue::as_f32).unwrap_or(default)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: PropertyValue) {
        self.0.insert(name.into(), value);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }
}

/// Geometry of a map object.
#[derive(Clone, Debug, PartialEq)]
pub enum ObjectShape {
    /// A tile placed as an object.
    Tile { tile: TileRef, bounds: Rect },
    Rectangle(Rect),
    Ellipse(Rect),
    Point(Vec2),
    /// Closed outline; `points` are relative to `origin`.
    Polygon { origin: Vec2, points: Vec<Vec2> },
    /// Open outline; `points` are relative to `origin`.
    Polyline { origin: Vec2, points: Vec<Vec2> },
    Text { bounds: Rect, text: String },
}

impl ObjectShape {
    pub fn name(&self) -> &'static str {
        match self {
            ObjectShape::Tile { .. } => "tile",
            ObjectShape::Rectangle(_) => "rectangle",
            ObjectShape::Ellipse(_) => "ellipse",
            ObjectShape::Point(_) => "point",
            ObjectShape::Polygon { .. } => "polygon",
            ObjectShape::Polyline { .. } => "polyline",
            ObjectShape::Text { .. } => "text",
        }
    }
}

/// An object placed on an object layer.
#[derive(Clone, Debug, PartialEq)]
pub struct MapObject {
    pub id: u32,
    pub name: String,
    pub class: String,
    pub rotation: f32,
    pub visible: bool,
    pub shape: ObjectShape,
    pub properties: Properties,
}

impl MapObject {
    pub fn new(id: u32, shape: ObjectShape) -> Self {
        Self {
            id,
            name: String::new(),
            class: String::new(),
            rotation: 0.0,
            visible: true,
            shape,
            properties: Properties::new(),
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, value: PropertyValue) -> Self {
        self.properties.insert(name, value);
        self
    }
}

impl std::fmt::Display for MapObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} object #{}", self.shape.name(), self.id)?;
        if !self.name.is_empty() {
            write!(f, " '{}'", self.name)?;
        }
        Ok(())
    }
}

/// What a layer holds.
#[derive(Clone, Debug, PartialEq)]
pub enum LayerContent {
    /// Row-major grid of tiles.
    Tiles {
        width: u32,
        height: u32,
        tiles: Vec<TileRef>,
    },
    Objects(Vec<MapObject>),
    Image(String),
    Group(Vec<MapLayer>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct MapLayer {
    pub name: String,
    pub visible: bool,
    pub opacity: f32,
    pub offset: Vec2,
    pub properties: Properties,
    pub content: LayerContent,
}

impl MapLayer {
    /// An object layer holding `objects`.
    pub fn objects(name: impl Into<String>, objects: Vec<MapObject>) -> Self {
        Self::with_content(name, LayerContent::Objects(objects))
    }

    pub fn with_content(name: impl Into<String>, content: LayerContent) -> Self {
        Self {
            name: name.into(),
            visible: true,
            opacity: 1.0,
            offset: Vec2::ZERO,
            properties: Properties::new(),
            content,
        }
    }

    /// The objects of an object layer, `None` for any other layer kind.
    pub fn map_objects(&self) -> Option<&[MapObject]> {
        match &self.content {
            LayerContent::Objects(objects) => Some(objects),
            _ => None,
        }
    }

    /// Tile at a grid position of a tile layer.
    pub fn tile_at(&self, x: u32, y: u32) -> Option<TileRef> {
        match &self.content {
            LayerContent::Tiles {
                width,
                height,
                tiles,
            } if x < *width && y < *height => tiles.get((y * width + x) as usize).copied(),
            _ => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self.content {
            LayerContent::Tiles { .. } => "tile layer",
            LayerContent::Objects(_) => "object layer",
            LayerContent::Image(_) => "image layer",
            LayerContent::Group(_) => "group layer",
        }
    }
}

/// A tileset reference. External tilesets keep their `source` path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tileset {
    pub first_gid: u32,
    pub name: String,
    pub source: Option<String>,
    pub tile_count: Option<u32>,
}

/// A loaded tile map.
#[derive(Clone, Debug, PartialEq)]
pub struct TiledMap {
    /// Map size in tiles.
    pub width: u32,
    pub height: u32,
    /// Tile size in pixels.
    pub tile_width: u32,
    pub tile_height: u32,
    pub tilesets: Vec<Tileset>,
    pub layers: Vec<MapLayer>,
    pub properties: Properties,
}

impl TiledMap {
    pub fn new(width: u32, height: u32, tile_width: u32, tile_height: u32) -> Self {
        Self {
            width,
            height,
            tile_width,
            tile_height,
            tilesets: Vec::new(),
            layers: Vec::new(),
            properties: Properties::new(),
        }
    }

    #[must_use]
    pub fn with_layer(mut self, layer: MapLayer) -> Self {
        self.layers.push(layer);
        self
    }

    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, value: PropertyValue) -> Self {
        self.properties.insert(name, value);
        self
    }

    #[must_use]
    pub fn with_tileset(mut self, tileset: Tileset) -> Self {
        self.tilesets.push(tileset);
        self.tilesets.sort_by_key(|t| t.first_gid);
        self
    }

    /// Top-level layer with the given name. Layers nested in groups are not
    /// searched.
    pub fn layer(&self, name: &str) -> Option<&MapLayer> {
        self.layers.iter().find(|layer| layer.name == name)
    }

    /// The tileset that owns `gid`: the one with the highest `first_gid` not
    /// above it.
    pub fn tileset_for(&self, gid: u32) -> Option<&Tileset> {
        if gid == 0 {
            return None;
        }
        self.tilesets
            .iter()
            .rev()
            .find(|tileset| tileset.first_gid <= gid)
    }

    /// Map size in pixels.
    pub fn pixel_size(&self) -> Vec2 {
        Vec2::new(
            self.width as f32 * self.tile_width as f32,
            self.height as f32 * self.tile_height as f32,
        )
    }

    /// Parse a map saved in Tiled's JSON format (`.tmj`).
    pub fn from_json(json: &str) -> Result<Self, MapError> {
        let raw: RawMap = serde_json::from_str(json)?;
        raw.into_map()
    }

    /// Load a map from a Tiled JSON file.
    pub fn load_from_file(path: &Path) -> Result<Self, MapError> {
        let json = std::fs::read_to_string(path).map_err(|source| MapError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }
}

// Tiled JSON schema, reduced to the fields used above.

#[derive(Deserialize)]
struct RawMap {
    width: u32,
    height: u32,
    tilewidth: u32,
    tileheight: u32,
    #[serde(default = "default_orientation")]
    orientation: String,
    #[serde(default)]
    tilesets: Vec<RawTileset>,
    #[serde(default)]
    layers: Vec<RawLayer>,
    #[serde(default)]
    properties: Vec<RawProperty>,
}

fn default_orientation() -> String {
    "orthogonal".into()
}

#[derive(Deserialize)]
struct RawTileset {
    firstgid: u32,
    #[serde(default)]
    name: String,
    source: Option<String>,
    tilecount: Option<u32>,
}

#[derive(Deserialize)]
struct RawLayer {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    name: String,
    #[serde(default = "default_true")]
    visible: bool,
    #[serde(default = "default_opacity")]
    opacity: f32,
    #[serde(default)]
    offsetx: f32,
    #[serde(default)]
    offsety: f32,
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
    data: Option<serde_json::Value>,
    encoding: Option<String>,
    compression: Option<String>,
    chunks: Option<serde_json::Value>,
    objects: Option<Vec<RawObject>>,
    layers: Option<Vec<RawLayer>>,
    image: Option<String>,
    #[serde(default)]
    properties: Vec<RawProperty>,
}

fn default_true() -> bool {
    true
}

fn default_opacity() -> f32 {
    1.0
}

#[derive(Deserialize)]
struct RawObject {
    id: u32,
    #[serde(default)]
    name: String,
    #[serde(default)]
    class: String,
    #[serde(default, rename = "type")]
    legacy_type: String,
    #[serde(default)]
    x: f32,
    #[serde(default)]
    y: f32,
    #[serde(default)]
    width: f32,
    #[serde(default)]
    height: f32,
    #[serde(default)]
    rotation: f32,
    #[serde(default = "default_true")]
    visible: bool,
    gid: Option<u32>,
    #[serde(default)]
    ellipse: bool,
    #[serde(default)]
    point: bool,
    polygon: Option<Vec<RawPoint>>,
    polyline: Option<Vec<RawPoint>>,
    text: Option<RawText>,
    #[serde(default)]
    properties: Vec<RawProperty>,
}

#[derive(Deserialize)]
struct RawPoint {
    x: f32,
    y: f32,
}

#[derive(Deserialize)]
struct RawText {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct RawProperty {
    name: String,
    #[serde(rename = "type", default = "default_property_type")]
    kind: String,
    value: serde_json::Value,
}

fn default_property_type() -> String {
    "string".into()
}

impl RawMap {
    fn into_map(self) -> Result<TiledMap, MapError> {
        if self.orientation != "orthogonal" {
            return Err(MapError::UnsupportedOrientation(self.orientation));
        }

        let mut tilesets: Vec<Tileset> = self
            .tilesets
            .into_iter()
            .map(|raw| Tileset {
                first_gid: raw.firstgid,
                name: raw.name,
                source: raw.source,
                tile_count: raw.tilecount,
            })
            .collect();
        tilesets.sort_by_key(|t| t.first_gid);

        Ok(TiledMap {
            width: self.width,
            height: self.height,
            tile_width: self.tilewidth,
            tile_height: self.tileheight,
            tilesets,
            layers: convert_layers(self.layers)?,
            properties: convert_properties(self.properties),
        })
    }
}

fn convert_layers(raw: Vec<RawLayer>) -> Result<Vec<MapLayer>, MapError> {
    raw.into_iter().filter_map(|layer| layer.into_layer().transpose()).collect()
}

impl RawLayer {
    fn into_layer(self) -> Result<Option<MapLayer>, MapError> {
        let content = match self.kind.as_str() {
            "tilelayer" => LayerContent::Tiles {
                width: self.width,
                height: self.height,
                tiles: tile_data(&self.name, self.data, self.encoding, self.compression, self.chunks)?,
            },
            "objectgroup" => LayerContent::Objects(
                self.objects
                    .unwrap_or_default()
                    .into_iter()
                    .map(RawObject::into_object)
                    .collect(),
            ),
            "imagelayer" => LayerContent::Image(self.image.unwrap_or_default()),
            "group" => LayerContent::Group(convert_layers(self.layers.unwrap_or_default())?),
            other => {
                warn!("Skipping layer '{}' of unknown type '{other}'", self.name);
                return Ok(None);
            }
        };

        Ok(Some(MapLayer {
            name: self.name,
            visible: self.visible,
            opacity: self.opacity,
            offset: Vec2::new(self.offsetx, self.offsety),
            properties: convert_properties(self.properties),
            content,
        }))
    }
}

fn tile_data(
    layer: &str,
    data: Option<serde_json::Value>,
    encoding: Option<String>,
    compression: Option<String>,
    chunks: Option<serde_json::Value>,
) -> Result<Vec<TileRef>, MapError> {
    let unsupported = |encoding: String| MapError::UnsupportedTileData {
        layer: layer.to_string(),
        encoding,
    };

    if chunks.is_some() {
        return Err(unsupported("chunked (infinite map)".into()));
    }
    if let Some(encoding) = encoding.filter(|e| e != "csv") {
        let encoding = match compression.filter(|c| !c.is_empty()) {
            Some(compression) => format!("{encoding}+{compression}"),
            None => encoding,
        };
        return Err(unsupported(encoding));
    }

    match data {
        None => Ok(Vec::new()),
        Some(serde_json::Value::Array(values)) => values
            .iter()
            .enumerate()
            .map(|(index, value)| {
                value
                    .as_u64()
                    .and_then(|raw| u32::try_from(raw).ok())
                    .map(TileRef::from_raw)
                    .ok_or_else(|| MapError::InvalidTile {
                        layer: layer.to_string(),
                        index,
                        value: value.to_string(),
                    })
            })
            .collect(),
        Some(_) => Err(unsupported("string".into())),
    }
}

impl RawObject {
    fn into_object(self) -> MapObject {
        let origin = Vec2::new(self.x, self.y);
        let bounds = Rect::new(self.x, self.y, self.width, self.height);
        let points = |raw: Vec<RawPoint>| -> Vec<Vec2> {
            raw.into_iter().map(|p| Vec2::new(p.x, p.y)).collect()
        };

        let shape = if let Some(gid) = self.gid {
            ObjectShape::Tile {
                tile: TileRef::from_raw(gid),
                bounds,
            }
        } else if let Some(polyline) = self.polyline {
            ObjectShape::Polyline {
                origin,
                points: points(polyline),
            }
        } else if let Some(polygon) = self.polygon {
            ObjectShape::Polygon {
                origin,
                points: points(polygon),
            }
        } else if let Some(text) = self.text {
            ObjectShape::Text {
                bounds,
                text: text.text,
            }
        } else if self.ellipse {
            ObjectShape::Ellipse(bounds)
        } else if self.point {
            ObjectShape::Point(origin)
        } else {
            ObjectShape::Rectangle(bounds)
        };

        MapObject {
            id: self.id,
            name: self.name,
            class: if self.class.is_empty() {
                self.legacy_type
            } else {
                self.class
            },
            rotation: self.rotation,
            visible: self.visible,
            shape,
            properties: convert_properties(self.properties),
        }
    }
}

fn convert_properties(raw: Vec<RawProperty>) -> Properties {
    let mut properties = Properties::new();
    for property in raw {
        let value = match (property.kind.as_str(), &property.value) {
            ("bool", serde_json::Value::Bool(v)) => Some(PropertyValue::Bool(*v)),
            ("int", v) => v.as_i64().map(PropertyValue::Int),
            ("float", v) => v.as_f64().map(PropertyValue::Float),
            ("object", v) => v.as_u64().map(|id| PropertyValue::Object(id as u32)),
            ("color", serde_json::Value::String(v)) => Some(PropertyValue::Color(v.clone())),
            ("file", serde_json::Value::String(v)) => Some(PropertyValue::File(v.clone())),
            ("string", serde_json::Value::String(v)) => Some(PropertyValue::String(v.clone())),
            _ => None,
        };

        match value {
            Some(value) => properties.insert(property.name, value),
            None => warn!(
                "Skipping property '{}' with unsupported type '{}'",
                property.name, property.kind
            ),
        }
    }
    properties
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r##"{
        "width": 20, "height": 15, "tilewidth": 32, "tileheight": 32,
        "orientation": "orthogonal", "infinite": false,
        "properties": [
            { "name": "playerStartTileX", "type": "float", "value": 4.5 },
            { "name": "playerStartTileY", "type": "int", "value": 7 },
            { "name": "music", "type": "file", "value": "garden.ogg" }
        ],
        "tilesets": [
            { "firstgid": 101, "source": "props.tsj" },
            { "firstgid": 1, "name": "terrain", "tilecount": 100 }
        ],
        "layers": [
            { "type": "tilelayer", "name": "ground", "width": 2, "height": 2,
              "data": [1, 2, 2147483651, 0] },
            { "type": "objectgroup", "name": "objects", "objects": [
                { "id": 1, "name": "chest", "gid": 1073741926, "x": 64, "y": 96,
                  "width": 32, "height": 32,
                  "properties": [{ "name": "loot", "type": "string", "value": "axe" }] },
                { "id": 2, "x": 5, "y": 5, "point": true },
                { "id": 3, "x": 0, "y": 0, "width": 10, "height": 10, "ellipse": true },
                { "id": 4, "x": 1, "y": 1, "width": 50, "height": 10,
                  "text": { "text": "hello" } }
            ]},
            { "type": "objectgroup", "name": "collision", "objects": [
                { "id": 5, "x": 32, "y": 64,
                  "polyline": [{ "x": 0, "y": 0 }, { "x": 64, "y": 0 }] },
                { "id": 6, "x": 0, "y": 0,
                  "polygon": [{ "x": 0, "y": 0 }, { "x": 5, "y": 0 }, { "x": 5, "y": 5 }] }
            ]},
            { "type": "group", "name": "decor", "layers": [
                { "type": "imagelayer", "name": "sky", "image": "sky.png" }
            ]}
        ]
    }"##;

    #[test]
    fn test_parse_sample_map() {
        let map = TiledMap::from_json(SAMPLE).unwrap();

        assert_eq!((map.width, map.height), (20, 15));
        assert_eq!(map.pixel_size(), Vec2::new(640.0, 480.0));
        assert_eq!(map.layers.len(), 4);
        assert_eq!(map.properties.get_f32_or("playerStartTileX", 0.0), 4.5);
        assert_eq!(map.properties.get_f32_or("playerStartTileY", 0.0), 7.0);
        assert_eq!(
            map.properties.get("music").and_then(PropertyValue::as_str),
            Some("garden.ogg")
        );

        let ground = map.layer("ground").unwrap();
        let flipped = ground.tile_at(0, 1).unwrap();
        assert_eq!(flipped.gid, 3);
        assert!(flipped.flip_horizontal);
        assert!(ground.tile_at(1, 1).unwrap().is_empty());
        assert_eq!(ground.tile_at(2, 0), None);
    }

    #[test]
    fn test_object_shapes() {
        let map = TiledMap::from_json(SAMPLE).unwrap();
        let objects = map.layer("objects").unwrap().map_objects().unwrap();

        match &objects[0].shape {
            ObjectShape::Tile { tile, bounds } => {
                assert_eq!(tile.gid, 102);
                assert!(tile.flip_vertical);
                assert_eq!(*bounds, Rect::new(64.0, 96.0, 32.0, 32.0));
            }
            other => panic!("expected tile object, got {other:?}"),
        }
        assert_eq!(
            objects[0].properties.get("loot"),
            Some(&PropertyValue::String("axe".into()))
        );
        assert_eq!(objects[1].shape, ObjectShape::Point(Vec2::new(5.0, 5.0)));
        assert_eq!(objects[2].shape.name(), "ellipse");
        assert_eq!(objects[3].shape.name(), "text");

        let collision = map.layer("collision").unwrap().map_objects().unwrap();
        assert_eq!(collision[0].shape.name(), "polyline");
        assert_eq!(collision[1].shape.name(), "polygon");
        assert_eq!(map.layer("sky"), None);
        assert!(matches!(map.layer("decor").unwrap().content, LayerContent::Group(ref l) if l.len() == 1));
    }

    #[test]
    fn test_tileset_lookup() {
        let map = TiledMap::from_json(SAMPLE).unwrap();
        assert_eq!(map.tileset_for(1).unwrap().name, "terrain");
        assert_eq!(map.tileset_for(100).unwrap().name, "terrain");
        assert_eq!(map.tileset_for(102).unwrap().source.as_deref(), Some("props.tsj"));
        assert!(map.tileset_for(0).is_none());
    }

    #[test]
    fn test_encoded_tile_data_rejected() {
        let json = r#"{ "width": 1, "height": 1, "tilewidth": 16, "tileheight": 16,
            "layers": [{ "type": "tilelayer", "name": "ground", "width": 1, "height": 1,
                         "encoding": "base64", "compression": "zlib", "data": "eJxjYAAAAAQAAQ==" }] }"#;
        match TiledMap::from_json(json) {
            Err(MapError::UnsupportedTileData { layer, encoding }) => {
                assert_eq!(layer, "ground");
                assert_eq!(encoding, "base64+zlib");
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_invalid_gid_rejected() {
        for data in [r#"[1, "grass", 2]"#, "[1, 4294967296, 2]", "[1, -3, 2]"] {
            let json = format!(
                r#"{{ "width": 3, "height": 1, "tilewidth": 16, "tileheight": 16,
                    "layers": [{{ "type": "tilelayer", "name": "ground", "width": 3, "height": 1,
                                  "data": {data} }}] }}"#
            );
            match TiledMap::from_json(&json) {
                Err(MapError::InvalidTile { layer, index, .. }) => {
                    assert_eq!(layer, "ground");
                    assert_eq!(index, 1);
                }
                other => panic!("unexpected result {other:?}"),
            }
        }
    }

    #[test]
    fn test_pixel_size_of_huge_map() {
        let map = TiledMap::new(u32::MAX, 2, 64, 32);
        assert_eq!(map.pixel_size(), Vec2::new(u32::MAX as f32 * 64.0, 64.0));
    }

    #[test]
    fn test_isometric_rejected() {
        let json = r#"{ "width": 1, "height": 1, "tilewidth": 16, "tileheight": 16,
            "orientation": "isometric" }"#;
        assert!(matches!(
            TiledMap::from_json(json),
            Err(MapError::UnsupportedOrientation(_))
        ));
    }

    #[test]
    fn test_tile_ref_flags() {
        let raw = FLIPPED_DIAGONALLY | 42;
        let tile = TileRef::from_raw(raw);
        assert_eq!(tile.gid, 42);
        assert!(tile.flip_diagonal);
        assert!(!tile.flip_horizontal);
        assert_eq!(TileRef::new(raw), TileRef::new(42));
    }
}
