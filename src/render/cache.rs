use std::collections::HashMap;
use std::path::Path;

use image::{imageops, RgbaImage};
use tracing::{debug, trace};

use crate::error::RenderError;
use crate::map::{Map, Tileset};
use crate::source::ImageSource;

/// Counters describing cache traffic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that had to load.
    pub misses: u64,
    /// Source images decoded (one per primed tileset or tile file).
    pub decodes: u64,
    /// Bitmaps currently held.
    pub entries: usize,
}

/// Decoded tile bitmaps keyed by gid, stored before any flip is applied.
///
/// Entries live as long as the cache; nothing is evicted.
#[derive(Debug, Default)]
pub struct TileCache {
    tiles: HashMap<u32, RgbaImage>,
    hits: u64,
    misses: u64,
    decodes: u64,
}

impl TileCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached tile bitmaps.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// True when nothing has been loaded yet.
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Whether `gid` already has a bitmap.
    pub fn contains(&self, gid: u32) -> bool {
        self.tiles.contains_key(&gid)
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            decodes: self.decodes,
            entries: self.tiles.len(),
        }
    }

    /// Base bitmap of local tile `id` in `map.tilesets[tileset_index]`, loading it
    /// on first use.
    pub fn get_or_load(
        &mut self,
        map: &Map,
        tileset_index: usize,
        id: u32,
        source: &dyn ImageSource,
    ) -> Result<&RgbaImage, RenderError> {
        let index = tileset_index;
        let tileset = map.tilesets.get(index).ok_or(RenderError::MissingTileset {
            index,
            count: map.tilesets.len(),
        })?;
        let gid = tileset.first_gid + id;

        if self.tiles.contains_key(&gid) {
            self.hits += 1;
            trace!(gid, "tile cache hit");
        } else {
            self.misses += 1;
            match &tileset.image {
                Some(_) => self.prime_tileset(tileset, source)?,
                None => self.load_tile_file(tileset, id, source)?,
            }
        }

        // Priming can leave a gid out when the local id is past tile_count.
        self.tiles.get(&gid).ok_or_else(|| RenderError::MissingTileImage {
            tileset: tileset.name.clone(),
            id,
            gid,
        })
    }

    /// Decode the shared tileset image once and slice every tile out of it.
    fn prime_tileset(
        &mut self,
        tileset: &Tileset,
        source: &dyn ImageSource,
    ) -> Result<(), RenderError> {
        let Some(image) = &tileset.image else {
            return Ok(());
        };
        let sheet = self.decode(&tileset.file_full_path(&image.source), source)?;

        for id in 0..tileset.tile_count {
            let rect = tileset.tile_rect(id);
            let tile =
                imageops::crop_imm(&sheet, rect.x, rect.y, rect.width, rect.height).to_image();
            self.tiles.insert(tileset.first_gid + id, tile);
        }
        debug!(
            tileset = %tileset.name,
            first_gid = tileset.first_gid,
            tiles = tileset.tile_count,
            "primed tileset"
        );
        Ok(())
    }

    fn load_tile_file(
        &mut self,
        tileset: &Tileset,
        id: u32,
        source: &dyn ImageSource,
    ) -> Result<(), RenderError> {
        let gid = tileset.first_gid + id;
        let entry = tileset.tile_image(id).ok_or_else(|| RenderError::MissingTileImage {
            tileset: tileset.name.clone(),
            id,
            gid,
        })?;
        let path = tileset.file_full_path(&entry.source);
        let tile = self.decode(&path, source)?;
        debug!(tileset = %tileset.name, gid, path = %path.display(), "loaded tile image");
        self.tiles.insert(gid, tile);
        Ok(())
    }

    fn decode(&mut self, path: &Path, source: &dyn ImageSource) -> Result<RgbaImage, RenderError> {
        let bytes = source.read(path).map_err(|source| RenderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let decoded = image::load_from_memory(&bytes).map_err(|source| RenderError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        self.decodes += 1;
        Ok(decoded.to_rgba8())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{TileImage, TilesetImage};
    use crate::source::MemoryImageSource;
    use image::{ImageFormat, Rgba};
    use std::io::Cursor;

    fn png(img: &RgbaImage) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).expect("encode png");
        out.into_inner()
    }

    // 2x2 grid of 4x4 tiles, each filled with its index as the red channel
    fn sheet_png() -> Vec<u8> {
        let img = RgbaImage::from_fn(8, 8, |x, y| Rgba([(x / 4 + (y / 4) * 2) as u8, 0, 0, 255]));
        png(&img)
    }

    fn sheet_map() -> Map {
        let mut map = Map::new(2, 2, 4, 4);
        map.add_tileset(Tileset::from_image(
            "sheet",
            10,
            (4, 4),
            2,
            4,
            TilesetImage { source: "sheet.png".into(), width: 8, height: 8 },
        ));
        map
    }

    #[test]
    fn first_miss_primes_whole_tileset() {
        let map = sheet_map();
        let src = MemoryImageSource::new().with_file("sheet.png", sheet_png());
        let mut cache = TileCache::new();

        let tile = cache.get_or_load(&map, 0, 3, &src).unwrap();
        assert_eq!(tile.dimensions(), (4, 4));
        assert_eq!(tile.get_pixel(0, 0)[0], 3);
        assert_eq!(cache.len(), 4);
        assert!(cache.contains(10) && cache.contains(13));

        let tile = cache.get_or_load(&map, 0, 1, &src).unwrap();
        assert_eq!(tile.get_pixel(3, 3)[0], 1);
        assert_eq!(src.reads(), 1);
        assert_eq!(
            cache.stats(),
            CacheStats { hits: 1, misses: 1, decodes: 1, entries: 4 }
        );
    }

    #[test]
    fn collection_tileset_loads_single_entry() {
        let mut map = Map::new(1, 1, 4, 4);
        map.add_tileset(Tileset::from_collection(
            "props",
            1,
            (4, 4),
            vec![
                TileImage { id: 0, source: "a.png".into() },
                TileImage { id: 1, source: "b.png".into() },
            ],
        ));
        let src = MemoryImageSource::new()
            .with_file("a.png", png(&RgbaImage::new(4, 4)))
            .with_file("b.png", png(&RgbaImage::new(6, 2)));
        let mut cache = TileCache::new();

        let tile = cache.get_or_load(&map, 0, 1, &src).unwrap();
        assert_eq!(tile.dimensions(), (6, 2));
        assert_eq!(cache.len(), 1);
        assert!(!cache.contains(1));
    }

    #[test]
    fn failed_decode_caches_nothing() {
        let map = sheet_map();
        let src = MemoryImageSource::new().with_file("sheet.png", b"not an image".to_vec());
        let mut cache = TileCache::new();

        let err = cache.get_or_load(&map, 0, 0, &src).unwrap_err();
        assert!(matches!(err, RenderError::Decode { .. }));
        assert!(cache.is_empty());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let map = sheet_map();
        let src = MemoryImageSource::new();
        let mut cache = TileCache::new();

        let err = cache.get_or_load(&map, 0, 0, &src).unwrap_err();
        assert!(matches!(err, RenderError::Io { .. }));
        assert!(cache.is_empty());
    }

    #[test]
    fn unknown_collection_tile_is_reported() {
        let mut map = Map::new(1, 1, 4, 4);
        map.add_tileset(Tileset::from_collection("props", 1, (4, 4), Vec::new()));
        let mut cache = TileCache::new();

        let err = cache
            .get_or_load(&map, 0, 7, &MemoryImageSource::new())
            .unwrap_err();
        assert!(matches!(err, RenderError::MissingTileImage { id: 7, gid: 8, .. }));
    }
}
