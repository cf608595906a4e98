//! Tile maps: the Tiled asset itself and the gameplay model parsed from it.

pub mod model;
pub mod tiled;

pub use model::{
    CamBoundary, CollisionArea, GameObject, MapDiagnostic, MapModel, DEFAULT_UNIT_SCALE,
};
pub use tiled::{
    LayerContent, MapLayer, MapObject, ObjectShape, Properties, PropertyValue, TileRef, TiledMap,
    Tileset,
};
