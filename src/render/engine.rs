//! Orientation engines: grid-to-pixel mapping and per-tile transforms.

use std::borrow::Cow;

use image::{imageops, RgbaImage};

use crate::error::RenderError;
use crate::map::{LayerTile, Map, ORTHOGONAL};

/// Destination rectangle on the result canvas, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    /// Left edge; may be negative.
    pub x: i64,
    /// Top edge; may be negative.
    pub y: i64,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl PixelRect {
    /// Rectangle at `(x, y)` of the given size.
    pub fn new(x: i64, y: i64, width: u32, height: u32) -> Self {
        PixelRect { x, y, width, height }
    }
}

/// Map orientation as declared by its tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Orientation {
    /// Axis-aligned grid.
    Orthogonal,
    /// Diamond projection.
    Isometric,
    /// Staggered isometric rows or columns.
    Staggered,
    /// Hexagonal cells.
    Hexagonal,
    /// Any tag Tiled does not define, kept verbatim.
    Other(String),
}

impl Orientation {
    /// Classify an orientation tag. Never fails; unknown tags become [`Orientation::Other`].
    pub fn parse(tag: &str) -> Self {
        match tag {
            ORTHOGONAL => Orientation::Orthogonal,
            "isometric" => Orientation::Isometric,
            "staggered" => Orientation::Staggered,
            "hexagonal" => Orientation::Hexagonal,
            other => Orientation::Other(other.to_owned()),
        }
    }

    /// The tag as written in the map.
    pub fn as_str(&self) -> &str {
        match self {
            Orientation::Orthogonal => ORTHOGONAL,
            Orientation::Isometric => "isometric",
            Orientation::Staggered => "staggered",
            Orientation::Hexagonal => "hexagonal",
            Orientation::Other(tag) => tag,
        }
    }
}

/// Orientation-specific half of the renderer.
///
/// `init` runs once before any other call.
pub trait RendererEngine {
    /// Capture whatever geometry the engine needs from `map`.
    fn init(&mut self, map: &Map);

    /// Pixel size of the fully rendered map.
    fn final_image_size(&self) -> (u32, u32);

    /// Apply the cell's flip flags. Must not depend on anything but its inputs:
    /// the same cached bitmap is fed in for every cell sharing a gid.
    fn rotate_tile_image<'a>(&self, tile: &LayerTile, image: &'a RgbaImage) -> Cow<'a, RgbaImage>;

    /// Destination rectangle of grid cell `(x, y)`.
    fn tile_position(&self, x: usize, y: usize) -> PixelRect;
}

/// Select the engine for an orientation.
pub fn engine_for(orientation: &Orientation) -> Result<Box<dyn RendererEngine>, RenderError> {
    match orientation {
        Orientation::Orthogonal => Ok(Box::new(OrthogonalEngine::default())),
        other => Err(RenderError::UnsupportedOrientation {
            orientation: other.as_str().to_owned(),
        }),
    }
}

/// Axis-aligned grid of uniform tiles.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrthogonalEngine {
    width: usize,
    height: usize,
    tile_w: u32,
    tile_h: u32,
}

impl RendererEngine for OrthogonalEngine {
    fn init(&mut self, map: &Map) {
        self.width = map.width;
        self.height = map.height;
        self.tile_w = map.tile_width;
        self.tile_h = map.tile_height;
    }

    /// Saturates at `u32::MAX` on each axis.
    fn final_image_size(&self) -> (u32, u32) {
        (
            canvas_extent(self.width, self.tile_w),
            canvas_extent(self.height, self.tile_h),
        )
    }

    fn rotate_tile_image<'a>(&self, tile: &LayerTile, image: &'a RgbaImage) -> Cow<'a, RgbaImage> {
        let flip = tile.flip;
        if flip.is_identity() {
            return Cow::Borrowed(image);
        }

        let mut out = if flip.diagonal {
            transpose(image)
        } else {
            image.clone()
        };
        if flip.horizontal {
            imageops::flip_horizontal_in_place(&mut out);
        }
        if flip.vertical {
            imageops::flip_vertical_in_place(&mut out);
        }
        Cow::Owned(out)
    }

    fn tile_position(&self, x: usize, y: usize) -> PixelRect {
        PixelRect::new(
            x as i64 * self.tile_w as i64,
            y as i64 * self.tile_h as i64,
            self.tile_w,
            self.tile_h,
        )
    }
}

fn canvas_extent(tiles: usize, tile_size: u32) -> u32 {
    u32::try_from(tiles)
        .ok()
        .and_then(|n| n.checked_mul(tile_size))
        .unwrap_or(u32::MAX)
}

/// Swap the x and y axes.
fn transpose(image: &RgbaImage) -> RgbaImage {
    imageops::flip_horizontal(&imageops::rotate90(image))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::TileFlip;
    use image::Rgba;

    // 2x1 image: red at (0,0), green at (1,0)
    fn strip() -> RgbaImage {
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        img.put_pixel(1, 0, Rgba([0, 255, 0, 255]));
        img
    }

    fn flipped(horizontal: bool, vertical: bool, diagonal: bool) -> LayerTile {
        LayerTile::new(0, 0).with_flip(TileFlip { horizontal, vertical, diagonal })
    }

    fn engine() -> OrthogonalEngine {
        let mut engine = OrthogonalEngine::default();
        engine.init(&Map::new(8, 6, 16, 12));
        engine
    }

    #[test]
    fn orthogonal_sizes_and_positions() {
        let e = engine();
        assert_eq!(e.final_image_size(), (128, 72));
        assert_eq!(e.tile_position(3, 2), PixelRect::new(48, 24, 16, 12));
    }

    #[test]
    fn huge_maps_saturate_instead_of_wrapping() {
        let mut e = OrthogonalEngine::default();
        e.init(&Map::new(usize::MAX, 1 << 20, 16, 4096));
        assert_eq!(e.final_image_size(), (u32::MAX, u32::MAX));

        e.init(&Map::new(3, 2, u32::MAX, 1));
        assert_eq!(e.final_image_size(), (u32::MAX, 2));
    }

    #[test]
    fn identity_flip_borrows_input() {
        let img = strip();
        let out = engine().rotate_tile_image(&LayerTile::new(0, 0), &img);
        assert!(matches!(out, Cow::Borrowed(_)));
    }

    #[test]
    fn horizontal_flip_swaps_columns() {
        let img = strip();
        let out = engine().rotate_tile_image(&flipped(true, false, false), &img);
        assert_eq!(out.get_pixel(0, 0), &Rgba([0, 255, 0, 255]));
        assert_eq!(out.get_pixel(1, 0), &Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn diagonal_flip_transposes() {
        let img = strip();
        let out = engine().rotate_tile_image(&flipped(false, false, true), &img);
        assert_eq!(out.dimensions(), (1, 2));
        assert_eq!(out.get_pixel(0, 0), &Rgba([255, 0, 0, 255]));
        assert_eq!(out.get_pixel(0, 1), &Rgba([0, 255, 0, 255]));
    }

    #[test]
    fn diagonal_then_horizontal_is_clockwise_rotation() {
        let mut img = RgbaImage::new(2, 2);
        img.put_pixel(0, 0, Rgba([1, 0, 0, 255]));
        img.put_pixel(1, 0, Rgba([2, 0, 0, 255]));
        img.put_pixel(0, 1, Rgba([3, 0, 0, 255]));
        img.put_pixel(1, 1, Rgba([4, 0, 0, 255]));

        let out = engine().rotate_tile_image(&flipped(true, false, true), &img);
        assert_eq!(out.as_raw(), imageops::rotate90(&img).as_raw());
    }

    #[test]
    fn all_eight_flip_combinations() {
        // 1 2
        // 3 4
        let img = RgbaImage::from_fn(2, 2, |x, y| Rgba([(1 + x + 2 * y) as u8, 0, 0, 255]));
        let e = engine();

        // (h, v, d) -> expected row-major red values
        let table: [((bool, bool, bool), [u8; 4]); 8] = [
            ((false, false, false), [1, 2, 3, 4]),
            ((true, false, false), [2, 1, 4, 3]),
            ((false, true, false), [3, 4, 1, 2]),
            ((true, true, false), [4, 3, 2, 1]),
            ((false, false, true), [1, 3, 2, 4]),
            ((true, false, true), [3, 1, 4, 2]),
            ((false, true, true), [2, 4, 1, 3]),
            ((true, true, true), [4, 2, 3, 1]),
        ];
        for ((h, v, d), expected) in table {
            let out = e.rotate_tile_image(&flipped(h, v, d), &img);
            let reds: Vec<u8> = out.pixels().map(|p| p[0]).collect();
            assert_eq!(reds, expected, "h={h} v={v} d={d}");
        }
        assert_eq!(img.get_pixel(0, 0)[0], 1);
    }

    #[test]
    fn source_image_is_untouched_by_transforms() {
        let img = strip();
        let before = img.clone();
        let e = engine();
        let _ = e.rotate_tile_image(&flipped(true, true, true), &img);
        let _ = e.rotate_tile_image(&flipped(false, true, false), &img);
        assert_eq!(img, before);
    }

    #[test]
    fn only_orthogonal_has_an_engine() {
        assert!(engine_for(&Orientation::Orthogonal).is_ok());
        for tag in ["isometric", "staggered", "hexagonal", "diagonal"] {
            let err = engine_for(&Orientation::parse(tag)).err().expect("unsupported");
            match err {
                RenderError::UnsupportedOrientation { orientation } => assert_eq!(orientation, tag),
                other => panic!("expected UnsupportedOrientation, got {other:?}"),
            }
        }
    }
}
