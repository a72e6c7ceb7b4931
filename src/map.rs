//! In-memory map model consumed by the renderer.
//!
//! The model mirrors what a Tiled map carries once loaded: tile layers
//! referencing tilesets through global tile ids (gids). Renderers only ever
//! borrow a [`Map`] read-only.

use std::path::{Path, PathBuf};

/// Horizontal flip flag, bit 31.
pub const FLIP_H: u32 = 0x8000_0000;
/// Vertical flip flag, bit 30.
pub const FLIP_V: u32 = 0x4000_0000;
/// Diagonal flip flag, bit 29.
pub const FLIP_D: u32 = 0x2000_0000;
/// Gid bits left once the flags are cleared (bit 28 is free).
pub const GID_MASK: u32 = 0x1FFF_FFFF;

/// Orientation tag Tiled writes for axis-aligned grids.
pub const ORTHOGONAL: &str = "orthogonal";
/// Render order tag for left-to-right, top-to-bottom traversal.
pub const RIGHT_DOWN: &str = "right-down";

/// Raw gid as stored in Tiled layer data, flip flags included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileId(pub u32);

impl TileId {
    /// Gid with the flip bits cleared.
    #[inline]
    pub fn clean(self) -> u32 {
        self.0 & GID_MASK
    }

    /// Horizontal flip bit.
    #[inline]
    pub fn flip_h(self) -> bool {
        (self.0 & FLIP_H) != 0
    }

    /// Vertical flip bit.
    #[inline]
    pub fn flip_v(self) -> bool {
        (self.0 & FLIP_V) != 0
    }

    /// Diagonal flip bit (x/y swap).
    #[inline]
    pub fn flip_d(self) -> bool {
        (self.0 & FLIP_D) != 0
    }

    /// Transform flags carried in the high bits.
    pub fn flip(self) -> TileFlip {
        TileFlip {
            horizontal: self.flip_h(),
            vertical: self.flip_v(),
            diagonal: self.flip_d(),
        }
    }
}

/// Per-cell transform flags. The three bits combine into the eight
/// orientations of a square tile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TileFlip {
    /// Mirror left-right.
    pub horizontal: bool,
    /// Mirror top-bottom.
    pub vertical: bool,
    /// Swap of the x and y axes, applied before the other two flips.
    pub diagonal: bool,
}

impl TileFlip {
    /// No transform.
    pub const NONE: TileFlip = TileFlip {
        horizontal: false,
        vertical: false,
        diagonal: false,
    };

    /// True when no flag is set.
    pub fn is_identity(self) -> bool {
        self == Self::NONE
    }

    /// Encode back into gid flag bits.
    pub fn bits(self) -> u32 {
        let mut bits = 0;
        if self.horizontal {
            bits |= FLIP_H;
        }
        if self.vertical {
            bits |= FLIP_V;
        }
        if self.diagonal {
            bits |= FLIP_D;
        }
        bits
    }
}

/// One map cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayerTile {
    /// Index into [`Map::tilesets`]; `None` marks an empty cell.
    pub tileset: Option<usize>,
    /// Tile id local to the tileset.
    pub id: u32,
    /// Transform applied when drawing.
    pub flip: TileFlip,
}

impl LayerTile {
    /// The empty cell.
    pub const NIL: LayerTile = LayerTile {
        tileset: None,
        id: 0,
        flip: TileFlip::NONE,
    };

    /// Unflipped tile `id` of tileset `tileset`.
    pub fn new(tileset: usize, id: u32) -> Self {
        LayerTile {
            tileset: Some(tileset),
            id,
            flip: TileFlip::NONE,
        }
    }

    /// Same cell with `flip` applied.
    pub fn with_flip(mut self, flip: TileFlip) -> Self {
        self.flip = flip;
        self
    }

    /// True for an empty cell.
    #[inline]
    pub fn is_nil(&self) -> bool {
        self.tileset.is_none()
    }

    /// Resolve a raw Tiled gid against `tilesets` (sorted by `first_gid`).
    ///
    /// Gid 0 and gids below the first tileset yield [`LayerTile::NIL`].
    pub fn from_gid(raw: u32, tilesets: &[Tileset]) -> Self {
        let id = TileId(raw);
        let gid = id.clean();
        if gid == 0 {
            return Self::NIL;
        }
        match tilesets.iter().rposition(|ts| ts.first_gid <= gid) {
            Some(index) => LayerTile {
                tileset: Some(index),
                id: gid - tilesets[index].first_gid,
                flip: id.flip(),
            },
            None => Self::NIL,
        }
    }

    /// Global tile id of this cell, `None` for empty cells or cells whose
    /// tileset is missing from `map`.
    pub fn gid(&self, map: &Map) -> Option<u32> {
        let ts = map.tilesets.get(self.tileset?)?;
        Some(ts.first_gid + self.id)
    }
}

/// Source-image rectangle of a tile inside its tileset image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRect {
    /// Left edge in the tileset image.
    pub x: u32,
    /// Top edge in the tileset image.
    pub y: u32,
    /// Tile width.
    pub width: u32,
    /// Tile height.
    pub height: u32,
}

/// Single image a tileset is sliced from.
#[derive(Debug, Clone, PartialEq)]
pub struct TilesetImage {
    /// Image path, relative to the tileset's base dir unless absolute.
    pub source: PathBuf,
    /// Declared pixel width.
    pub width: u32,
    /// Declared pixel height.
    pub height: u32,
}

/// Individually sourced image of one tile in a collection tileset.
#[derive(Debug, Clone, PartialEq)]
pub struct TileImage {
    /// Local tile id.
    pub id: u32,
    /// Image path, relative to the tileset's base dir unless absolute.
    pub source: PathBuf,
}

/// A tileset as referenced from one map.
#[derive(Debug, Clone, PartialEq)]
pub struct Tileset {
    /// Name, used in error messages and logs.
    pub name: String,
    /// Gid of local tile 0.
    pub first_gid: u32,
    /// Tile width in pixels.
    pub tile_width: u32,
    /// Tile height in pixels.
    pub tile_height: u32,
    /// Number of local ids.
    pub tile_count: u32,
    /// Tiles per row in the image; 0 derives it from the image width.
    pub columns: u32,
    /// Pixels between neighbouring tiles.
    pub spacing: u32,
    /// Pixels around the edge of the image.
    pub margin: u32,
    /// Directory relative image sources resolve against.
    pub base_dir: PathBuf,
    /// Set for tilesets sliced from one image.
    pub image: Option<TilesetImage>,
    /// Per-tile images of a collection tileset.
    pub tiles: Vec<TileImage>,
}

impl Tileset {
    /// Tileset sliced from a single image in a regular grid.
    pub fn from_image(
        name: impl Into<String>,
        first_gid: u32,
        tile_size: (u32, u32),
        columns: u32,
        tile_count: u32,
        image: TilesetImage,
    ) -> Self {
        Tileset {
            name: name.into(),
            first_gid,
            tile_width: tile_size.0,
            tile_height: tile_size.1,
            tile_count,
            columns,
            spacing: 0,
            margin: 0,
            base_dir: PathBuf::new(),
            image: Some(image),
            tiles: Vec::new(),
        }
    }

    /// Tileset whose tiles each come from their own file.
    pub fn from_collection(
        name: impl Into<String>,
        first_gid: u32,
        tile_size: (u32, u32),
        tiles: Vec<TileImage>,
    ) -> Self {
        let tile_count = tiles.iter().map(|t| t.id + 1).max().unwrap_or(0);
        Tileset {
            name: name.into(),
            first_gid,
            tile_width: tile_size.0,
            tile_height: tile_size.1,
            tile_count,
            columns: 0,
            spacing: 0,
            margin: 0,
            base_dir: PathBuf::new(),
            image: None,
            tiles,
        }
    }

    /// Set spacing and margin in pixels.
    pub fn with_spacing(mut self, spacing: u32, margin: u32) -> Self {
        self.spacing = spacing;
        self.margin = margin;
        self
    }

    /// Set the directory image sources resolve against.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = dir.into();
        self
    }

    /// Highest gid this tileset covers.
    #[inline]
    pub fn last_gid(&self) -> u32 {
        (self.first_gid + self.tile_count).saturating_sub(1)
    }

    /// Source rectangle of local tile `id` in the tileset image.
    pub fn tile_rect(&self, id: u32) -> TileRect {
        let columns = if self.columns > 0 {
            self.columns
        } else {
            let image_w = self.image.as_ref().map_or(0, |img| img.width);
            (image_w / (self.tile_width + self.spacing).max(1)).max(1)
        };
        let col = id % columns;
        let row = id / columns;
        TileRect {
            x: col * self.tile_width + col * self.spacing + self.margin,
            y: row * self.tile_height + row * self.spacing + self.margin,
            width: self.tile_width,
            height: self.tile_height,
        }
    }

    /// Image file of tile `id` in a collection tileset.
    pub fn tile_image(&self, id: u32) -> Option<&TileImage> {
        self.tiles.iter().find(|t| t.id == id)
    }

    /// Resolve an image source against the tileset directory.
    pub fn file_full_path(&self, source: &Path) -> PathBuf {
        if source.is_absolute() {
            source.to_path_buf()
        } else {
            self.base_dir.join(source)
        }
    }
}

/// A tile layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    /// Layer name.
    pub name: String,
    /// Row-major cells, `map.width * map.height` long.
    pub tiles: Vec<LayerTile>,
    /// 0.0 (transparent) to 1.0 (opaque).
    pub opacity: f32,
    /// Hidden layers are skipped when rendering every visible layer.
    pub visible: bool,
}

impl Layer {
    /// Opaque, visible layer.
    pub fn new(name: impl Into<String>, tiles: Vec<LayerTile>) -> Self {
        Layer {
            name: name.into(),
            tiles,
            opacity: 1.0,
            visible: true,
        }
    }

    /// Set the opacity, clamped to 0.0..=1.0.
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    /// Set the visibility flag.
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }
}

/// Loaded tile map.
#[derive(Debug, Clone, PartialEq)]
pub struct Map {
    /// Orientation tag, e.g. `orthogonal`.
    pub orientation: String,
    /// Render order tag; empty means `right-down`.
    pub render_order: String,
    /// Width in tiles.
    pub width: usize,
    /// Height in tiles.
    pub height: usize,
    /// Grid cell width in pixels.
    pub tile_width: u32,
    /// Grid cell height in pixels.
    pub tile_height: u32,
    /// Sorted by `first_gid`.
    pub tilesets: Vec<Tileset>,
    /// Tile layers in draw order.
    pub layers: Vec<Layer>,
}

impl Map {
    /// Empty orthogonal, right-down map.
    pub fn new(width: usize, height: usize, tile_width: u32, tile_height: u32) -> Self {
        Map {
            orientation: ORTHOGONAL.to_owned(),
            render_order: RIGHT_DOWN.to_owned(),
            width,
            height,
            tile_width,
            tile_height,
            tilesets: Vec::new(),
            layers: Vec::new(),
        }
    }

    /// Add a tileset, keeping the list sorted by `first_gid`, and return its index.
    pub fn add_tileset(&mut self, tileset: Tileset) -> usize {
        let at = self
            .tilesets
            .partition_point(|ts| ts.first_gid <= tileset.first_gid);
        self.tilesets.insert(at, tileset);
        at
    }

    /// Append a layer on top and return its index.
    pub fn push_layer(&mut self, layer: Layer) -> usize {
        self.layers.push(layer);
        self.layers.len() - 1
    }

    /// Build a layer from raw gids, resolving them against this map's tilesets.
    pub fn layer_from_gids(&self, name: impl Into<String>, gids: &[u32]) -> Layer {
        let tiles = gids
            .iter()
            .map(|&raw| LayerTile::from_gid(raw, &self.tilesets))
            .collect();
        Layer::new(name, tiles)
    }

    /// Largest gid covered by any tileset.
    pub fn max_gid(&self) -> u32 {
        self.tilesets.iter().map(Tileset::last_gid).max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(first_gid: u32, tile_count: u32) -> Tileset {
        Tileset::from_image(
            "sheet",
            first_gid,
            (16, 16),
            4,
            tile_count,
            TilesetImage {
                source: "sheet.png".into(),
                width: 64,
                height: 64,
            },
        )
    }

    #[test]
    fn gid_decoding_picks_owning_tileset_and_flags() {
        let tilesets = vec![sheet(1, 16), sheet(17, 16)];

        assert!(LayerTile::from_gid(0, &tilesets).is_nil());

        let t = LayerTile::from_gid(5, &tilesets);
        assert_eq!((t.tileset, t.id), (Some(0), 4));
        assert!(t.flip.is_identity());

        let t = LayerTile::from_gid(18 | FLIP_H | FLIP_D, &tilesets);
        assert_eq!((t.tileset, t.id), (Some(1), 1));
        assert!(t.flip.horizontal && t.flip.diagonal && !t.flip.vertical);
        assert_eq!(t.flip.bits(), FLIP_H | FLIP_D);
    }

    #[test]
    fn tile_rect_honours_spacing_and_margin() {
        let ts = sheet(1, 16).with_spacing(2, 1);
        assert_eq!(
            ts.tile_rect(0),
            TileRect { x: 1, y: 1, width: 16, height: 16 }
        );
        assert_eq!(
            ts.tile_rect(5),
            TileRect { x: 1 + 16 + 2, y: 1 + 16 + 2, width: 16, height: 16 }
        );
    }

    #[test]
    fn tile_rect_derives_columns_from_image_width() {
        let mut ts = sheet(1, 8);
        ts.columns = 0;
        // 64 / 16 = 4 columns
        assert_eq!(ts.tile_rect(4).y, 16);
        assert_eq!(ts.tile_rect(4).x, 0);
    }

    #[test]
    fn add_tileset_keeps_first_gid_order() {
        let mut map = Map::new(2, 2, 16, 16);
        map.add_tileset(sheet(17, 16));
        let idx = map.add_tileset(sheet(1, 16));
        assert_eq!(idx, 0);
        assert_eq!(map.tilesets[1].first_gid, 17);
        assert_eq!(map.max_gid(), 32);

        let layer = map.layer_from_gids("ground", &[1, 0, 17, 32]);
        assert_eq!(layer.tiles[2].gid(&map), Some(17));
        assert_eq!(layer.tiles[3].gid(&map), Some(32));
        assert_eq!(layer.tiles[1].gid(&map), None);
    }

    #[test]
    fn relative_sources_resolve_against_base_dir() {
        let ts = sheet(1, 1).with_base_dir("assets/tilesets");
        assert_eq!(
            ts.file_full_path(Path::new("sheet.png")),
            PathBuf::from("assets/tilesets/sheet.png")
        );
    }
}
