use crate::error::RenderError;
use crate::map::RIGHT_DOWN;

/// Grid coordinate of a map cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TilePoint {
    /// Column.
    pub x: i64,
    /// Row.
    pub y: i64,
}

impl TilePoint {
    /// Point at column `x`, row `y`.
    pub fn new(x: i64, y: i64) -> Self {
        TilePoint { x, y }
    }

    /// Row-major cell index, `None` outside a `width` x `height` grid.
    pub fn index(self, width: usize, height: usize) -> Option<usize> {
        let x = usize::try_from(self.x).ok()?;
        let y = usize::try_from(self.y).ok()?;
        (x < width && y < height).then(|| x + y * width)
    }
}

/// Cell traversal order within a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOrder {
    /// Left to right, top to bottom.
    RightDown,
}

impl RenderOrder {
    /// An empty tag means the Tiled default, right-down.
    pub fn parse(tag: &str) -> Result<Self, RenderError> {
        match tag {
            "" | RIGHT_DOWN => Ok(RenderOrder::RightDown),
            other => Err(RenderError::UnsupportedRenderOrder {
                render_order: other.to_owned(),
            }),
        }
    }
}

/// Rectangle of cells, already clamped to the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRegion {
    /// First column.
    pub start_x: usize,
    /// First row.
    pub start_y: usize,
    /// Columns covered.
    pub width: usize,
    /// Rows covered.
    pub height: usize,
}

impl TileRegion {
    /// Clamp a requested rectangle to a `map_w` x `map_h` grid.
    ///
    /// Negative origins move to 0 without shifting the far edge, so
    /// `(-5, -5, 10, 10)` keeps cells 0..5 on both axes.
    pub fn clamped(x: i64, y: i64, width: i64, height: i64, map_w: usize, map_h: usize) -> Self {
        let (start_x, end_x) = clamp_span(x, width, map_w);
        let (start_y, end_y) = clamp_span(y, height, map_h);
        TileRegion {
            start_x,
            start_y,
            width: end_x - start_x,
            height: end_y - start_y,
        }
    }

    /// Every cell of a `map_w` x `map_h` grid.
    pub fn full(map_w: usize, map_h: usize) -> Self {
        TileRegion {
            start_x: 0,
            start_y: 0,
            width: map_w,
            height: map_h,
        }
    }

    /// True when the region covers no cells.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Cells in `order`, as `(x, y)`.
    pub fn cells(&self, order: RenderOrder) -> impl Iterator<Item = (usize, usize)> {
        let RenderOrder::RightDown = order;
        let (xs, xe) = (self.start_x, self.start_x + self.width);
        (self.start_y..self.start_y + self.height).flat_map(move |y| (xs..xe).map(move |x| (x, y)))
    }
}

fn clamp_span(start: i64, len: i64, limit: usize) -> (usize, usize) {
    let limit = limit as i64;
    let end = start.saturating_add(len).clamp(0, limit);
    let start = start.clamp(0, limit);
    (start as usize, end.max(start) as usize)
}
