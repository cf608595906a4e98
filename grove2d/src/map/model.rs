use log::info;

use crate::math::{Rect, Vec2};

use super::tiled::{MapObject, ObjectShape, Properties, TileRef, TiledMap};

/// Layer holding spawn points and decorations placed as tile objects.
pub const OBJECTS_LAYER: &str = "objects";
/// Layer holding collision polylines.
pub const COLLISION_LAYER: &str = "collision";
/// Layer holding camera boundary rectangles.
pub const BOUNDARIES_LAYER: &str = "boundaries";

pub const START_TILE_X_PROPERTY: &str = "playerStartTileX";
pub const START_TILE_Y_PROPERTY: &str = "playerStartTileY";

/// World units per map pixel: one world unit per 32 pixel tile.
pub const DEFAULT_UNIT_SCALE: f32 = 1.0 / 32.0;

/// A spawn point or decoration placed on the objects layer.
///
/// Position and size are kept in map units; gameplay code decides how to
/// place the spawned entity.
#[derive(Clone, Debug, PartialEq)]
pub struct GameObject {
    pub id: u32,
    pub name: String,
    pub position: Vec2,
    pub size: Vec2,
    pub rotation: f32,
    pub tile: TileRef,
    pub properties: Properties,
}

impl GameObject {
    fn from_tile_object(object: &MapObject, tile: TileRef, bounds: Rect) -> Self {
        Self {
            id: object.id,
            name: object.name.clone(),
            position: bounds.position(),
            size: bounds.size(),
            rotation: object.rotation,
            tile,
            properties: object.properties.clone(),
        }
    }
}

/// Collision outline in world units.
#[derive(Clone, Debug, PartialEq)]
pub struct CollisionArea {
    origin: Vec2,
    vertices: Vec<Vec2>,
}

impl CollisionArea {
    /// Build an area from map-unit coordinates, scaling origin and vertices by
    /// `unit_scale`. Vertices are relative to the origin.
    pub fn new(origin: Vec2, vertices: &[Vec2], unit_scale: f32) -> Self {
        Self {
            origin: origin * unit_scale,
            vertices: vertices.iter().map(|v| *v * unit_scale).collect(),
        }
    }

    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    /// Vertices relative to [`origin`](Self::origin).
    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    /// Vertices in absolute world coordinates.
    pub fn world_vertices(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.vertices.iter().map(move |v| self.origin + *v)
    }

    /// True when the outline ends where it starts.
    pub fn is_closed(&self) -> bool {
        match (self.vertices.first(), self.vertices.last()) {
            (Some(first), Some(last)) => self.vertices.len() > 2 && first == last,
            _ => false,
        }
    }
}

/// Rectangle in world units the camera must stay within.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CamBoundary(pub Rect);

impl CamBoundary {
    pub fn rect(&self) -> Rect {
        self.0
    }

    pub fn contains(&self, point: Vec2) -> bool {
        self.0.contains(point)
    }

    /// Clamp a camera position into the boundary.
    pub fn clamp_point(&self, point: Vec2) -> Vec2 {
        self.0.clamp_point(point)
    }
}

/// Something skipped while reading a map. None of these stop parsing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MapDiagnostic {
    MissingLayer {
        layer: &'static str,
    },
    NotAnObjectLayer {
        layer: &'static str,
        found: &'static str,
    },
    UnsupportedObject {
        layer: &'static str,
        object: String,
    },
}

impl std::fmt::Display for MapDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MapDiagnostic::MissingLayer { layer } => {
                write!(f, "Map does not have a layer called '{layer}'")
            }
            MapDiagnostic::NotAnObjectLayer { layer, found } => {
                write!(f, "Layer '{layer}' is a {found}, expected an object layer")
            }
            MapDiagnostic::UnsupportedObject { layer, object } => {
                write!(f, "Unsupported {object} on {layer} layer")
            }
        }
    }
}

/// Gameplay data extracted from a tile map.
///
/// Built once per loaded map and never re-parsed; loading another map builds
/// another `MapModel`.
#[derive(Clone, Debug)]
pub struct MapModel {
    tiled_map: TiledMap,
    unit_scale: f32,
    start_location: Vec2,
    game_objects: Vec<GameObject>,
    collision_areas: Vec<CollisionArea>,
    cam_boundaries: Vec<CamBoundary>,
    diagnostics: Vec<MapDiagnostic>,
}

impl MapModel {
    /// Parse a map using [`DEFAULT_UNIT_SCALE`].
    pub fn new(tiled_map: TiledMap) -> Self {
        Self::with_unit_scale(tiled_map, DEFAULT_UNIT_SCALE)
    }

    /// Parse a map, converting collision and boundary geometry to world units
    /// with `unit_scale`.
    pub fn with_unit_scale(tiled_map: TiledMap, unit_scale: f32) -> Self {
        let start_location = Vec2::new(
            tiled_map.properties.get_f32_or(START_TILE_X_PROPERTY, 0.0),
            tiled_map.properties.get_f32_or(START_TILE_Y_PROPERTY, 0.0),
        );

        let mut parser = Parser {
            map: &tiled_map,
            diagnostics: Vec::new(),
        };
        let game_objects = parser.game_objects();
        let collision_areas = parser.collision_areas(unit_scale);
        let cam_boundaries = parser.cam_boundaries(unit_scale);
        let diagnostics = parser.diagnostics;

        Self {
            tiled_map,
            unit_scale,
            start_location,
            game_objects,
            collision_areas,
            cam_boundaries,
            diagnostics,
        }
    }

    pub fn tiled_map(&self) -> &TiledMap {
        &self.tiled_map
    }

    pub fn unit_scale(&self) -> f32 {
        self.unit_scale
    }

    /// Player start position in tiles.
    pub fn start_location(&self) -> Vec2 {
        self.start_location
    }

    pub fn game_objects(&self) -> &[GameObject] {
        &self.game_objects
    }

    pub fn collision_areas(&self) -> &[CollisionArea] {
        &self.collision_areas
    }

    pub fn cam_boundaries(&self) -> &[CamBoundary] {
        &self.cam_boundaries
    }

    /// Everything that was skipped while parsing.
    pub fn diagnostics(&self) -> &[MapDiagnostic] {
        &self.diagnostics
    }

    /// The first camera boundary containing `point` (world units).
    pub fn boundary_at(&self, point: Vec2) -> Option<&CamBoundary> {
        self.cam_boundaries.iter().find(|b| b.contains(point))
    }
}

struct Parser<'a> {
    map: &'a TiledMap,
    diagnostics: Vec<MapDiagnostic>,
}

impl<'a> Parser<'a> {
    fn report(&mut self, diagnostic: MapDiagnostic) {
        info!("{diagnostic}");
        self.diagnostics.push(diagnostic);
    }

    fn objects_of(&mut self, layer: &'static str) -> &'a [MapObject] {
        let map = self.map;
        match map.layer(layer) {
            None => {
                self.report(MapDiagnostic::MissingLayer { layer });
                &[]
            }
            Some(found) => match found.map_objects() {
                Some(objects) => objects,
                None => {
                    self.report(MapDiagnostic::NotAnObjectLayer {
                        layer,
                        found: found.kind_name(),
                    });
                    &[]
                }
            },
        }
    }

    fn unsupported(&mut self, layer: &'static str, object: &MapObject) {
        self.report(MapDiagnostic::UnsupportedObject {
            layer,
            object: object.to_string(),
        });
    }

    fn game_objects(&mut self) -> Vec<GameObject> {
        let mut result = Vec::new();
        for object in self.objects_of(OBJECTS_LAYER) {
            match object.shape {
                ObjectShape::Tile { tile, bounds } => {
                    result.push(GameObject::from_tile_object(object, tile, bounds));
                }
                _ => self.unsupported(OBJECTS_LAYER, object),
            }
        }
        result
    }

    fn collision_areas(&mut self, unit_scale: f32) -> Vec<CollisionArea> {
        let mut result = Vec::new();
        for object in self.objects_of(COLLISION_LAYER) {
            match &object.shape {
                ObjectShape::Polyline { origin, points } => {
                    result.push(CollisionArea::new(*origin, points, unit_scale));
                }
                _ => self.unsupported(COLLISION_LAYER, object),
            }
        }
        result
    }

    fn cam_boundaries(&mut self, unit_scale: f32) -> Vec<CamBoundary> {
        let mut result = Vec::new();
        for object in self.objects_of(BOUNDARIES_LAYER) {
            match object.shape {
                ObjectShape::Rectangle(rect) => result.push(CamBoundary(rect.scaled(unit_scale))),
                _ => self.unsupported(BOUNDARIES_LAYER, object),
            }
        }
        result
    }
}
