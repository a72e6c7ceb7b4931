use std::io;
use std::path::PathBuf;

/// Errors raised while loading a Tiled JSON map into the in-memory model.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    /// File I/O error
    #[error("I/O error reading {path}: {source}")]
    Io {
        /// File that failed to read
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },
    /// JSON parse error
    #[error("failed to parse JSON in {path}: {source}")]
    Json {
        /// File that failed to parse
        path: PathBuf,
        /// Underlying error
        source: serde_json::Error,
    },
    /// Structurally valid JSON that does not describe a usable map
    #[error("invalid map: {0}")]
    InvalidMap(String),
    /// A layer's data length does not match width * height
    #[error("invalid layer size for layer '{layer}': expected {expected} tiles, found {found}")]
    InvalidLayerSize {
        /// Layer name
        layer: String,
        /// width * height of the map
        expected: usize,
        /// Length of the layer data
        found: usize,
    },
    /// A layer references a gid no tileset covers
    #[error("layer '{layer}' references gid {gid}, but the largest known gid is {max_gid}")]
    InvalidTileGid {
        /// Layer name
        layer: String,
        /// Offending gid (flip bits cleared)
        gid: u32,
        /// Largest gid covered by the map's tilesets
        max_gid: u32,
    },
}

/// Errors raised by [`Renderer`](crate::Renderer).
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The map orientation has no rendering engine
    #[error("tiled/render: unsupported orientation `{orientation}`")]
    UnsupportedOrientation {
        /// Orientation tag declared by the map
        orientation: String,
    },
    /// The map render order is not `right-down`
    #[error("tiled/render: unsupported render order `{render_order}`")]
    UnsupportedRenderOrder {
        /// Render order declared by the map
        render_order: String,
    },
    /// Layer index past the end of the map's layers
    #[error("layer index {index} out of range ({count} layers)")]
    LayerOutOfRange {
        /// Requested index
        index: usize,
        /// Number of layers in the map
        count: usize,
    },
    /// A cell points at a tileset the map does not have
    #[error("cell references tileset #{index}, but the map has {count} tilesets")]
    MissingTileset {
        /// Tileset index stored in the cell
        index: usize,
        /// Number of tilesets in the map
        count: usize,
    },
    /// A collection tileset has no image for the requested tile
    #[error("tileset '{tileset}' has no image for tile {id} (gid {gid})")]
    MissingTileImage {
        /// Tileset name
        tileset: String,
        /// Local tile id
        id: u32,
        /// Global tile id
        gid: u32,
    },
    /// Reading a tile source image failed
    #[error("failed to read tile image {path}: {source}")]
    Io {
        /// Resolved image path
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },
    /// A tile source image could not be decoded
    #[error("failed to decode tile image {path}: {source}")]
    Decode {
        /// Resolved image path
        path: PathBuf,
        /// Underlying error
        source: image::ImageError,
    },
    /// Encoding the result canvas failed
    #[error("failed to encode render result: {0}")]
    Encode(#[from] image::ImageError),
}
