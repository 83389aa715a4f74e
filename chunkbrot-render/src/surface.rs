/// The RGBA raster that completed chunks are composited onto.
///
/// Pixels start fully transparent; every pixel a chunk writes is opaque, so
/// alpha 0 marks a pixel no chunk has painted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplaySurface {
    pub width: u32,
    pub height: u32,
    /// RGBA pixel data, 4 bytes per pixel, row-major order.
    pub pixels: Vec<u8>,
}

impl DisplaySurface {
    /// A blank (transparent) surface.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0u8; width as usize * height as usize * 4],
        }
    }

    /// RGBA value at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    /// `true` once every pixel has been painted.
    pub fn is_fully_painted(&self) -> bool {
        self.pixels.chunks_exact(4).all(|px| px[3] != 0)
    }

    /// Copy a square `size × size` RGBA block to `(x, y)`, clipping whatever
    /// falls outside the surface.
    pub fn blit(&mut self, x: u32, y: u32, size: u32, block: &[u8]) {
        debug_assert_eq!(block.len(), size as usize * size as usize * 4);
        if x >= self.width || y >= self.height {
            return;
        }
        let stride = self.width as usize * 4;
        let src_stride = size as usize * 4;
        let copy_w = size.min(self.width - x) as usize * 4;
        let rows = size.min(self.height - y) as usize;
        for row in 0..rows {
            let src_start = row * src_stride;
            let dst_start = (y as usize + row) * stride + x as usize * 4;
            self.pixels[dst_start..dst_start + copy_w]
                .copy_from_slice(&block[src_start..src_start + copy_w]);
        }
    }

    /// Move the content by `(dx, dy)` pixels.
    ///
    /// `dx > 0` moves content right (left edge exposed), `dy > 0` moves it
    /// down. Exposed pixels become blank.
    pub fn shift(&mut self, dx: i32, dy: i32) {
        if dx == 0 && dy == 0 {
            return;
        }
        let w = self.width as i32;
        let h = self.height as i32;
        let mut shifted = vec![0u8; self.pixels.len()];

        let x_start = dx.clamp(0, w) as usize;
        let x_end = (w + dx).clamp(0, w) as usize;
        if x_start < x_end {
            let count = (x_end - x_start) * 4;
            let src_x = (x_start as i32 - dx) as usize;
            let stride = self.width as usize * 4;
            for dst_y in 0..h {
                let src_y = dst_y - dy;
                if src_y < 0 || src_y >= h {
                    continue;
                }
                let dst = dst_y as usize * stride + x_start * 4;
                let src = src_y as usize * stride + src_x * 4;
                shifted[dst..dst + count].copy_from_slice(&self.pixels[src..src + count]);
            }
        }

        self.pixels = shifted;
    }

    /// Nearest-neighbour preview of a zoom by `factor` about pixel
    /// `(fx, fy)`. `factor < 1` enlarges the content.
    pub fn scale_about(&mut self, fx: f64, fy: f64, factor: f64) {
        if factor == 1.0 || !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let mut scaled = vec![0u8; self.pixels.len()];
        let stride = self.width as usize * 4;
        for y in 0..self.height {
            let sy = (fy + (y as f64 + 0.5 - fy) * factor).floor();
            if sy < 0.0 || sy >= self.height as f64 {
                continue;
            }
            for x in 0..self.width {
                let sx = (fx + (x as f64 + 0.5 - fx) * factor).floor();
                if sx < 0.0 || sx >= self.width as f64 {
                    continue;
                }
                let src = sy as usize * stride + sx as usize * 4;
                let dst = y as usize * stride + x as usize * 4;
                scaled[dst..dst + 4].copy_from_slice(&self.pixels[src..src + 4]);
            }
        }
        self.pixels = scaled;
    }
}
