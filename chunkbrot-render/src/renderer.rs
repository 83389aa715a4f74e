use std::sync::Arc;

use chunkbrot_core::{evaluate_with, Complex, FractalMode, FractalParams, Viewport};

use crate::chunk::ChunkCoord;
use crate::gradient::ColorGradient;

/// Everything a chunk needs to know about the picture, frozen when the
/// render pass was requested.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSnapshot {
    pub viewport: Viewport,
    pub mode: FractalMode,
    /// Seed point: `z₀` in Mandelbrot mode, `c` in Julia mode.
    pub seed: Complex,
    pub params: FractalParams,
    pub gradient: ColorGradient,
}

/// One unit of work handed to a worker.
#[derive(Debug, Clone)]
pub struct ChunkJob {
    pub coord: ChunkCoord,
    pub generation: u64,
    pub chunk_size: u32,
    pub snapshot: Arc<RenderSnapshot>,
}

/// A finished chunk: `chunk_size² × 4` RGBA bytes in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkResult {
    pub coord: ChunkCoord,
    pub generation: u64,
    pub pixels: Vec<u8>,
}

/// Compute the pixels of one chunk.
///
/// Pure: reads only the job payload, so it can run on any thread.
pub fn render_chunk(job: &ChunkJob) -> ChunkResult {
    let size = job.chunk_size;
    let snap = &*job.snapshot;
    let start_x = job.coord.x * size;
    let start_y = job.coord.y * size;

    let mut pixels = Vec::with_capacity(size as usize * size as usize * 4);
    for y in 0..size {
        for x in 0..size {
            let point = snap
                .viewport
                .pixel_to_complex((start_x + x) as f64, (start_y + y) as f64);
            let n = evaluate_with(point, snap.seed, snap.mode, &snap.params);
            pixels.extend_from_slice(&snap.gradient.rgba(snap.params.normalize(n)));
        }
    }

    ChunkResult {
        coord: job.coord,
        generation: job.generation,
        pixels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gradient::builtin_themes;

    fn job(coord: ChunkCoord, mode: FractalMode) -> ChunkJob {
        let snapshot = RenderSnapshot {
            viewport: Viewport::home(64, 64, 2.0).unwrap(),
            mode,
            seed: Complex::ZERO,
            params: FractalParams::default(),
            gradient: builtin_themes().unwrap().remove(0),
        };
        ChunkJob {
            coord,
            generation: 7,
            chunk_size: 32,
            snapshot: Arc::new(snapshot),
        }
    }

    #[test]
    fn buffer_has_chunk_size_and_opaque_alpha() {
        let result = render_chunk(&job(ChunkCoord::new(1, 0), FractalMode::Mandelbrot));
        assert_eq!(result.pixels.len(), 32 * 32 * 4);
        assert_eq!(result.generation, 7);
        assert_eq!(result.coord, ChunkCoord::new(1, 0));
        assert!(result.pixels.chunks_exact(4).all(|px| px[3] == 255));
    }

    #[test]
    fn interior_pixel_gets_last_stop_color() {
        // Chunk (1,1) starts at pixel (32,32) which maps to the origin.
        let j = job(ChunkCoord::new(1, 1), FractalMode::Mandelbrot);
        let result = render_chunk(&j);
        let last = *j.snapshot.gradient.stops().last().unwrap();
        assert_eq!(&result.pixels[0..3], &last.color);
    }

    #[test]
    fn corner_pixel_escapes_quickly() {
        // Pixel (0,0) is -2 + 2i, which leaves the radius after one step.
        let j = job(ChunkCoord::new(0, 0), FractalMode::Mandelbrot);
        let result = render_chunk(&j);
        let t = j.snapshot.params.normalize(1);
        assert_eq!(&result.pixels[0..4], &j.snapshot.gradient.rgba(t));
    }

    #[test]
    fn mode_changes_output() {
        let m = render_chunk(&job(ChunkCoord::new(0, 1), FractalMode::Mandelbrot));
        let j = render_chunk(&job(ChunkCoord::new(0, 1), FractalMode::Julia));
        assert_ne!(m.pixels, j.pixels);
    }

    #[test]
    fn deterministic() {
        let a = render_chunk(&job(ChunkCoord::new(0, 1), FractalMode::Julia));
        let b = render_chunk(&job(ChunkCoord::new(0, 1), FractalMode::Julia));
        assert_eq!(a, b);
    }
}
