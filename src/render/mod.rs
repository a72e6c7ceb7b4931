//! Layer renderer: composes tileset images into one RGBA canvas.

mod cache;
mod composite;
mod encode;
mod engine;
mod region;

use std::collections::HashSet;

use image::RgbaImage;
use tracing::{debug, warn};

use crate::error::RenderError;
use crate::map::{Layer, LayerTile, Map};
use crate::source::{FsImageSource, ImageSource};

pub use cache::{CacheStats, TileCache};
pub use composite::{draw_over, opacity_mask};
pub use encode::{GifOptions, JpegOptions};
pub use engine::{engine_for, Orientation, OrthogonalEngine, PixelRect, RendererEngine};
pub use region::{RenderOrder, TilePoint, TileRegion};

/// Renders the layers of one map.
///
/// The canvas is sized once, at construction, from the engine's final image
/// size; every render call draws onto it until [`Renderer::clear`].
/// Decoded tiles stay cached for the renderer's lifetime.
pub struct Renderer<'m> {
    map: &'m Map,
    engine: Box<dyn RendererEngine>,
    cache: TileCache,
    source: Box<dyn ImageSource + 'm>,
    result: RgbaImage,
}

impl<'m> Renderer<'m> {
    /// Renderer reading tile images from the filesystem.
    pub fn new(map: &'m Map) -> Result<Self, RenderError> {
        Self::with_source(map, FsImageSource)
    }

    /// Renderer reading tile images through `source`.
    pub fn with_source(map: &'m Map, source: impl ImageSource + 'm) -> Result<Self, RenderError> {
        let engine = engine_for(&Orientation::parse(&map.orientation))?;
        Ok(Self::with_engine(map, engine, source))
    }

    /// Renderer driven by a caller-supplied orientation engine.
    pub fn with_engine(
        map: &'m Map,
        mut engine: Box<dyn RendererEngine>,
        source: impl ImageSource + 'm,
    ) -> Self {
        engine.init(map);
        let (width, height) = engine.final_image_size();
        debug!(width, height, layers = map.layers.len(), "renderer ready");
        Renderer {
            map,
            engine,
            cache: TileCache::new(),
            source: Box::new(source),
            result: RgbaImage::new(width, height),
        }
    }

    /// The map being rendered.
    pub fn map(&self) -> &'m Map {
        self.map
    }

    /// The orientation engine placing tiles.
    pub fn engine(&self) -> &dyn RendererEngine {
        self.engine.as_ref()
    }

    /// The render result so far.
    pub fn result(&self) -> &RgbaImage {
        &self.result
    }

    /// Consume the renderer and keep the canvas.
    pub fn into_result(self) -> RgbaImage {
        self.result
    }

    /// Tile cache counters.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    fn render_tile(
        &mut self,
        layer: &Layer,
        tile: &LayerTile,
        x: usize,
        y: usize,
    ) -> Result<(), RenderError> {
        let Some(tileset) = tile.tileset else {
            return Ok(());
        };

        let base = self
            .cache
            .get_or_load(self.map, tileset, tile.id, &*self.source)?;
        let img = self.engine.rotate_tile_image(tile, base);
        let pos = self.engine.tile_position(x, y);

        draw_over(&mut self.result, &img, pos, opacity_mask(layer.opacity));
        Ok(())
    }

    /// Render only the listed cells of one layer.
    ///
    /// Failing cells are skipped and logged; no error reaches the caller.
    /// Points outside the map and an unknown layer index are skipped the
    /// same way.
    pub fn render_layer_tiles(&mut self, index: usize, points: &HashSet<TilePoint>) {
        let map = self.map;
        let Some(layer) = map.layers.get(index) else {
            warn!(index, layers = map.layers.len(), "render_layer_tiles: no such layer");
            return;
        };

        for &point in points {
            let Some(i) = point.index(map.width, map.height) else {
                warn!(x = point.x, y = point.y, "render_layer_tiles: point outside map");
                continue;
            };
            let Some(tile) = layer.tiles.get(i) else {
                continue;
            };
            if let Err(err) = self.render_tile(layer, tile, i % map.width, i / map.width) {
                warn!(
                    layer = %layer.name,
                    x = point.x,
                    y = point.y,
                    error = %err,
                    "tile render failed"
                );
            }
        }
    }

    /// Render a rectangle of cells of one layer, clamped to the map.
    ///
    /// Stops at the first failing cell; cells drawn before it stay drawn.
    pub fn render_layer_rect(
        &mut self,
        index: usize,
        x: i64,
        y: i64,
        width: i64,
        height: i64,
    ) -> Result<(), RenderError> {
        let map = self.map;
        let region = TileRegion::clamped(x, y, width, height, map.width, map.height);
        self.render_region(index, region)
    }

    /// Render a whole layer.
    pub fn render_layer(&mut self, index: usize) -> Result<(), RenderError> {
        let region = TileRegion::full(self.map.width, self.map.height);
        self.render_region(index, region)
    }

    fn render_region(&mut self, index: usize, region: TileRegion) -> Result<(), RenderError> {
        let map = self.map;
        let order = RenderOrder::parse(&map.render_order)?;
        let layer = map.layers.get(index).ok_or(RenderError::LayerOutOfRange {
            index,
            count: map.layers.len(),
        })?;

        for (cx, cy) in region.cells(order) {
            if let Some(tile) = layer.tiles.get(cx + cy * map.width) {
                self.render_tile(layer, tile, cx, cy)?;
            }
        }
        Ok(())
    }

    /// Render every visible layer, bottom to top.
    pub fn render_visible_layers(&mut self) -> Result<(), RenderError> {
        let map = self.map;
        for (index, layer) in map.layers.iter().enumerate() {
            if !layer.visible {
                continue;
            }
            self.render_layer(index)?;
        }
        Ok(())
    }

    /// Reset the canvas to transparent, keeping its size and the tile cache.
    ///
    /// Render a layer, copy or save the result, clear, and repeat to get one
    /// image per layer.
    pub fn clear(&mut self) {
        let (width, height) = self.engine.final_image_size();
        self.result = RgbaImage::new(width, height);
    }
}
