use std::collections::HashSet;

use crate::error::RenderError;

/// Default chunk side length in pixels.
pub const DEFAULT_CHUNK_SIZE: u32 = 128;

/// Integer grid coordinates of one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    pub x: u32,
    pub y: u32,
}

impl ChunkCoord {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// The grid of fixed-size chunks covering a surface.
///
/// Chunks at the right and bottom edges may extend past the surface; their
/// overhang is clipped when composited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkGrid {
    pub width: u32,
    pub height: u32,
    pub chunk_size: u32,
}

impl ChunkGrid {
    pub fn new(width: u32, height: u32, chunk_size: u32) -> crate::Result<Self> {
        if chunk_size == 0 {
            return Err(RenderError::InvalidChunkSize(chunk_size));
        }
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidDimensions { width, height });
        }
        Ok(Self {
            width,
            height,
            chunk_size,
        })
    }

    pub fn columns(&self) -> u32 {
        self.width.div_ceil(self.chunk_size)
    }

    pub fn rows(&self) -> u32 {
        self.height.div_ceil(self.chunk_size)
    }

    pub fn len(&self) -> usize {
        self.columns() as usize * self.rows() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every chunk in row-major order.
    pub fn coords(&self) -> impl Iterator<Item = ChunkCoord> {
        let (cols, rows) = (self.columns(), self.rows());
        (0..rows).flat_map(move |y| (0..cols).map(move |x| ChunkCoord::new(x, y)))
    }

    pub fn contains(&self, coord: ChunkCoord) -> bool {
        coord.x < self.columns() && coord.y < self.rows()
    }

    /// Pixel position of the chunk's top-left corner.
    pub fn pixel_origin(&self, coord: ChunkCoord) -> (u32, u32) {
        (coord.x * self.chunk_size, coord.y * self.chunk_size)
    }

    /// Which chunks still hold valid pixels after the surface content moved
    /// by `(dx, dy)` pixels.
    ///
    /// A chunk survives only when the whole on-screen part of its cell was
    /// copied from on-screen pixels of chunks in `rendered`. For shifts that
    /// are whole multiples of the chunk size this is `(x + dx/S, y + dy/S)`.
    pub fn remap_after_shift(
        &self,
        rendered: &HashSet<ChunkCoord>,
        dx: i32,
        dy: i32,
    ) -> HashSet<ChunkCoord> {
        if rendered.is_empty() {
            return HashSet::new();
        }
        let s = self.chunk_size as i64;
        let (w, h) = (self.width as i64, self.height as i64);

        self.coords()
            .filter(|coord| {
                let x0 = coord.x as i64 * s;
                let y0 = coord.y as i64 * s;
                let x1 = (x0 + s).min(w);
                let y1 = (y0 + s).min(h);
                let (sx0, sx1) = (x0 - dx as i64, x1 - dx as i64);
                let (sy0, sy1) = (y0 - dy as i64, y1 - dy as i64);
                if sx0 < 0 || sy0 < 0 || sx1 > w || sy1 > h {
                    return false;
                }
                (sy0 / s..=(sy1 - 1) / s).all(|cy| {
                    (sx0 / s..=(sx1 - 1) / s)
                        .all(|cx| rendered.contains(&ChunkCoord::new(cx as u32, cy as u32)))
                })
            })
            .collect()
    }
}
