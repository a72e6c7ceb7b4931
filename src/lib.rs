#![warn(missing_docs)]

//! Render Tiled tile-map layers into raster images.
//!
//! ```no_run
//! use tiled_raster::{Map, Renderer};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let map = Map::load("assets/map.json")?;
//! let mut renderer = Renderer::new(&map)?;
//! renderer.render_visible_layers()?;
//! renderer.save_as_png(std::fs::File::create("map.png")?)?;
//! # Ok(())
//! # }
//! ```

mod error;
mod loader {
    pub mod json_loader;
}
pub mod map;
pub mod render;
pub mod source;

pub use error::{MapError, RenderError};
pub use loader::json_loader::{load_map, parse_map_str};
pub use map::{Layer, LayerTile, Map, TileFlip, TileImage, Tileset, TilesetImage};
pub use render::{
    CacheStats, GifOptions, JpegOptions, Orientation, OrthogonalEngine, PixelRect, RenderOrder,
    Renderer, RendererEngine, TilePoint, TileRegion,
};
pub use source::{FsImageSource, ImageSource, MemoryImageSource};
