// src/loader/json_loader.rs
use crate::error::MapError;
use crate::map::*;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Deserialize)]
struct JsonLayer {
    #[serde(default)]
    data: JsonValue,
    #[serde(default)]
    encoding: Option<String>,
    #[serde(default = "default_true")]
    visible: bool,
    #[serde(default = "one")]
    opacity: f32,
    #[serde(default)]
    name: String,
    #[serde(rename = "type")]
    kind: Option<String>, // "tilelayer" expected here
}

fn default_true() -> bool {
    true
}
fn one() -> f32 {
    1.0
}
fn orthogonal() -> String {
    ORTHOGONAL.to_owned()
}
fn right_down() -> String {
    RIGHT_DOWN.to_owned()
}

#[derive(Deserialize)]
struct JsonTilesetRef {
    firstgid: u32,
    #[serde(default)]
    source: Option<String>,
    #[serde(flatten)]
    embedded: JsonTileset,
}

#[derive(Deserialize)]
struct JsonMap {
    #[serde(default = "orthogonal")]
    orientation: String,
    #[serde(default = "right_down")]
    renderorder: String,
    width: usize,
    height: usize,
    tilewidth: u32,
    tileheight: u32,
    #[serde(default)]
    layers: Vec<JsonLayer>,
    #[serde(default)]
    tilesets: Vec<JsonTilesetRef>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct JsonTileset {
    name: String,
    tilewidth: u32,
    tileheight: u32,
    tilecount: u32,
    columns: u32,
    image: Option<String>,
    imagewidth: u32,
    imageheight: u32,
    spacing: u32,
    margin: u32,
    tiles: Vec<JsonTile>,
}

#[derive(Deserialize)]
struct JsonTile {
    id: u32,
    #[serde(default)]
    image: Option<String>,
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, MapError> {
    let txt = std::fs::read_to_string(path).map_err(|source| MapError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&txt).map_err(|source| MapError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn tileset(first_gid: u32, ts: JsonTileset, base_dir: &Path) -> Tileset {
    let tiles: Vec<TileImage> = ts
        .tiles
        .into_iter()
        .filter_map(|t| {
            t.image.map(|source| TileImage {
                id: t.id,
                source: PathBuf::from(source),
            })
        })
        .collect();

    let tile_size = (ts.tilewidth, ts.tileheight);
    let built = match ts.image {
        Some(image) => Tileset::from_image(
            ts.name,
            first_gid,
            tile_size,
            ts.columns,
            ts.tilecount,
            TilesetImage {
                source: PathBuf::from(image),
                width: ts.imagewidth,
                height: ts.imageheight,
            },
        ),
        None => {
            let mut collection = Tileset::from_collection(ts.name, first_gid, tile_size, tiles);
            collection.tile_count = collection.tile_count.max(ts.tilecount);
            collection
        }
    };
    built
        .with_spacing(ts.spacing, ts.margin)
        .with_base_dir(base_dir)
}

fn resolve_tileset(r: JsonTilesetRef, map_dir: &Path) -> Result<Tileset, MapError> {
    match r.source {
        Some(source) => {
            if !source.ends_with(".json") {
                return Err(MapError::InvalidMap(format!(
                    "External tileset must be JSON: {source}"
                )));
            }
            let ts_path = map_dir.join(&source);
            let ext: JsonTileset = read_json(&ts_path)?;
            let ts_dir = ts_path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| map_dir.to_path_buf());
            Ok(tileset(r.firstgid, ext, &ts_dir))
        }
        None => Ok(tileset(r.firstgid, r.embedded, map_dir)),
    }
}

fn layer_gids(l: &JsonLayer) -> Result<Vec<u32>, MapError> {
    if let Some(encoding) = l.encoding.as_deref().filter(|e| *e != "csv") {
        return Err(MapError::InvalidMap(format!(
            "layer '{}' uses unsupported {encoding} encoding",
            l.name
        )));
    }
    match &l.data {
        JsonValue::Array(cells) => cells
            .iter()
            .map(|v| {
                v.as_u64()
                    .and_then(|n| u32::try_from(n).ok())
                    .ok_or_else(|| {
                        let msg = format!("layer '{}' has a non-numeric gid {v}", l.name);
                        MapError::InvalidMap(msg)
                    })
            })
            .collect(),
        JsonValue::Null => Ok(Vec::new()),
        _ => Err(MapError::InvalidMap(format!(
            "layer '{}' data must be an array of gids",
            l.name
        ))),
    }
}

fn build_map(j: JsonMap, map_dir: &Path) -> Result<Map, MapError> {
    let mut map = Map::new(j.width, j.height, j.tilewidth, j.tileheight);
    map.orientation = j.orientation;
    map.render_order = j.renderorder;

    for r in j.tilesets {
        map.add_tileset(resolve_tileset(r, map_dir)?);
    }
    let max_gid = map.max_gid();
    let expected = map.width * map.height;

    for l in j.layers {
        if l.kind.as_deref().unwrap_or("tilelayer") != "tilelayer" {
            continue;
        }
        let gids = layer_gids(&l)?;
        if gids.len() != expected {
            return Err(MapError::InvalidLayerSize {
                layer: l.name,
                expected,
                found: gids.len(),
            });
        }
        for &raw in &gids {
            let gid = TileId(raw).clean();
            if gid != 0 && gid > max_gid {
                return Err(MapError::InvalidTileGid {
                    layer: l.name,
                    gid,
                    max_gid,
                });
            }
        }
        let layer = map
            .layer_from_gids(l.name, &gids)
            .with_opacity(l.opacity)
            .with_visible(l.visible);
        map.push_layer(layer);
    }

    debug!(
        width = map.width,
        height = map.height,
        layers = map.layers.len(),
        tilesets = map.tilesets.len(),
        "decoded map"
    );
    Ok(map)
}

/// Load a Tiled JSON map, resolving external tilesets next to it.
pub fn load_map(path: impl AsRef<Path>) -> Result<Map, MapError> {
    let p = path.as_ref();
    if p.extension().and_then(|e| e.to_str()) != Some("json") {
        return Err(MapError::InvalidMap(format!(
            "Map file must be a JSON file: {}",
            p.display()
        )));
    }

    let j: JsonMap = read_json(p)?;
    let map_dir = p
        .parent()
        .map(|d| d.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./"));
    build_map(j, &map_dir)
}

/// Parse a Tiled JSON map held in memory; relative paths resolve against `base_dir`.
pub fn parse_map_str(json: &str, base_dir: impl AsRef<Path>) -> Result<Map, MapError> {
    let j: JsonMap = serde_json::from_str(json).map_err(|source| MapError::Json {
        path: PathBuf::from("<string>"),
        source,
    })?;
    build_map(j, base_dir.as_ref())
}

impl Map {
    /// See [`load_map`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MapError> {
        load_map(path)
    }
}
