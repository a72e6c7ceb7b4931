#![allow(dead_code)]

use std::io::Cursor;

use image::{ImageFormat, Rgba, RgbaImage};
use tiled_raster::{Map, MemoryImageSource, Tileset, TilesetImage};

pub const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
pub const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);
pub const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
pub const YELLOW: Rgba<u8> = Rgba([255, 255, 0, 255]);
pub const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);

pub const TILE: u32 = 4;
pub const MAP_TILES: usize = 8;

// gids of the sheet tiles (first_gid = 1)
pub const SPLIT: u32 = 1; // left half red, right half green
pub const SOLID_BLUE: u32 = 2;
pub const SOLID_WHITE: u32 = 3;
pub const SOLID_YELLOW: u32 = 4;

pub fn png(img: &RgbaImage) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).expect("encode png");
    out.into_inner()
}

/// 2x2 grid of 4x4 tiles.
pub fn sheet() -> RgbaImage {
    RgbaImage::from_fn(8, 8, |x, y| match (x / TILE, y / TILE) {
        (0, 0) if x < 2 => RED,
        (0, 0) => GREEN,
        (1, 0) => BLUE,
        (0, 1) => WHITE,
        _ => YELLOW,
    })
}

pub fn sheet_source() -> MemoryImageSource {
    MemoryImageSource::new().with_file("sheet.png", png(&sheet()))
}

pub fn sheet_tileset() -> Tileset {
    Tileset::from_image(
        "sheet",
        1,
        (TILE, TILE),
        2,
        4,
        TilesetImage {
            source: "sheet.png".into(),
            width: 8,
            height: 8,
        },
    )
}

/// 8x8 orthogonal map over the sheet tileset, one layer per gid list.
pub fn map_with_layers(layers: &[Vec<u32>]) -> Map {
    let mut map = Map::new(MAP_TILES, MAP_TILES, TILE, TILE);
    map.add_tileset(sheet_tileset());
    for (i, gids) in layers.iter().enumerate() {
        let layer = map.layer_from_gids(format!("layer{i}"), gids);
        map.push_layer(layer);
    }
    map
}

pub fn filled(gid: u32) -> Vec<u32> {
    vec![gid; MAP_TILES * MAP_TILES]
}

/// Layer with `gid` at the listed cells and nothing elsewhere.
pub fn sparse(cells: &[(usize, usize)], gid: u32) -> Vec<u32> {
    let mut gids = vec![0; MAP_TILES * MAP_TILES];
    for &(x, y) in cells {
        gids[x + y * MAP_TILES] = gid;
    }
    gids
}

/// Top-left pixel of grid cell `(x, y)`.
pub fn cell_pixel(img: &RgbaImage, x: u32, y: u32) -> Rgba<u8> {
    *img.get_pixel(x * TILE, y * TILE)
}
