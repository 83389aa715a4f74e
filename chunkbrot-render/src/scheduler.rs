//! Chunk scheduling with generation-based invalidation.
//!
//! The scheduler lives on one controlling thread. It owns the FIFO queue,
//! the in-flight count, the set of valid chunks and the display surface, so
//! none of it needs locking. Workers only ever see immutable [`ChunkJob`]s.
//!
//! A job carries the generation it was issued under. Its result is
//! composited only if that generation is still current when it returns;
//! otherwise it is dropped. In-flight work is never aborted.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::chunk::{ChunkCoord, ChunkGrid};
use crate::error::RenderError;
use crate::pool::{ChunkExecutor, ChunkOutcome};
use crate::renderer::{ChunkJob, ChunkResult, RenderSnapshot};
use crate::surface::DisplaySurface;

/// Running counters, mostly for the HUD and logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub dispatched: u64,
    pub accepted: u64,
    pub stale: u64,
    pub failed: u64,
    pub requeued: u64,
}

/// State at the start of an unsettled pan. Every move is applied to this
/// origin with the accumulated shift, so partial steps never lose chunks.
#[derive(Debug, Clone)]
struct PanOrigin {
    rendered: HashSet<ChunkCoord>,
    surface: DisplaySurface,
    dx: i32,
    dy: i32,
}

#[derive(Debug, Clone, Copy)]
struct QueuedChunk {
    coord: ChunkCoord,
    generation: u64,
}

pub struct RenderScheduler<E: ChunkExecutor> {
    executor: E,
    grid: ChunkGrid,
    max_in_flight: usize,
    generation: u64,
    snapshot: Arc<RenderSnapshot>,
    queue: VecDeque<QueuedChunk>,
    in_flight: usize,
    rendered: HashSet<ChunkCoord>,
    surface: DisplaySurface,
    stats: SchedulerStats,
    generation_started: Instant,
    pan_origin: Option<PanOrigin>,
}

impl<E: ChunkExecutor> RenderScheduler<E> {
    /// A scheduler with an empty surface. Nothing is queued until the first
    /// [`request_full_redraw`](Self::request_full_redraw).
    pub fn new(
        executor: E,
        chunk_size: u32,
        max_in_flight: usize,
        snapshot: RenderSnapshot,
    ) -> crate::Result<Self> {
        if max_in_flight == 0 {
            return Err(RenderError::InvalidConcurrency(max_in_flight));
        }
        let vp = snapshot.viewport;
        let grid = ChunkGrid::new(vp.width, vp.height, chunk_size)?;
        Ok(Self {
            executor,
            grid,
            max_in_flight,
            generation: 0,
            snapshot: Arc::new(snapshot),
            queue: VecDeque::new(),
            in_flight: 0,
            rendered: HashSet::new(),
            surface: DisplaySurface::new(vp.width, vp.height),
            stats: SchedulerStats::default(),
            generation_started: Instant::now(),
            pan_origin: None,
        })
    }

    // -- Accessors ----------------------------------------------------------

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn grid(&self) -> &ChunkGrid {
        &self.grid
    }

    pub fn surface(&self) -> &DisplaySurface {
        &self.surface
    }

    pub fn rendered(&self) -> &HashSet<ChunkCoord> {
        &self.rendered
    }

    /// Chunks waiting for a worker, in dispatch order.
    pub fn queued(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.queue.iter().map(|q| q.coord)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    /// The snapshot the current generation renders with.
    pub fn snapshot(&self) -> &RenderSnapshot {
        &self.snapshot
    }

    /// `(valid chunks, total chunks)` for the visible grid.
    pub fn progress(&self) -> (usize, usize) {
        (self.rendered.len(), self.grid.len())
    }

    /// No queued work and nothing out with a worker.
    pub fn is_idle(&self) -> bool {
        self.queue.is_empty() && self.in_flight == 0
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn executor_mut(&mut self) -> &mut E {
        &mut self.executor
    }

    // -- Generation control ---------------------------------------------------

    /// Start a new generation rendering `snapshot`, queueing every visible
    /// chunk that is not already valid. Returns how many were queued.
    pub fn request_full_redraw(&mut self, snapshot: RenderSnapshot) -> usize {
        debug_assert_eq!(
            (snapshot.viewport.width, snapshot.viewport.height),
            (self.grid.width, self.grid.height),
            "snapshot viewport must match the chunk grid"
        );
        self.advance_generation();
        self.pan_origin = None;
        self.snapshot = Arc::new(snapshot);
        self.generation_started = Instant::now();

        let generation = self.generation;
        let missing: Vec<ChunkCoord> = self
            .grid
            .coords()
            .filter(|c| !self.rendered.contains(c))
            .collect();
        let count = missing.len();
        self.queue.extend(
            missing
                .into_iter()
                .map(|coord| QueuedChunk { coord, generation }),
        );
        debug!(
            generation,
            queued = count,
            reused = self.rendered.len(),
            "Requested full redraw"
        );

        self.drain();
        count
    }

    /// Make all queued and in-flight work stale without queueing anything new.
    pub fn supersede(&mut self) {
        self.advance_generation();
        debug!(generation = self.generation, "Superseded pending work");
    }

    fn advance_generation(&mut self) {
        self.generation += 1;
        let purged = self.queue.len();
        self.queue.clear();
        if purged > 0 {
            debug!(purged, "Purged queued chunks of older generations");
        }
    }

    /// Forget which chunks are valid. The pixels stay until overwritten.
    pub fn invalidate(&mut self) {
        self.pan_origin = None;
        self.rendered.clear();
    }

    // -- Dispatch / completion -----------------------------------------------

    /// Hand queued jobs to the executor until the concurrency cap is reached.
    pub fn drain(&mut self) {
        while self.in_flight < self.max_in_flight {
            let Some(next) = self.queue.pop_front() else {
                break;
            };
            self.in_flight += 1;
            self.stats.dispatched += 1;
            self.executor.dispatch(ChunkJob {
                coord: next.coord,
                generation: next.generation,
                chunk_size: self.grid.chunk_size,
                snapshot: Arc::clone(&self.snapshot),
            });
        }
    }

    /// Account for one returned job and keep the pipeline full.
    pub fn on_job_complete(&mut self, outcome: ChunkOutcome) {
        self.in_flight = self.in_flight.saturating_sub(1);
        match outcome {
            ChunkOutcome::Completed(result) => self.accept(result),
            ChunkOutcome::Failed {
                coord,
                generation,
                reason,
            } => {
                self.stats.failed += 1;
                if generation == self.generation && !self.rendered.contains(&coord) {
                    warn!(x = coord.x, y = coord.y, generation, %reason, "Re-queueing lost chunk");
                    self.stats.requeued += 1;
                    self.queue.push_back(QueuedChunk { coord, generation });
                }
            }
        }
        self.drain();
    }

    fn accept(&mut self, result: ChunkResult) {
        if result.generation != self.generation || !self.grid.contains(result.coord) {
            self.stats.stale += 1;
            debug!(
                x = result.coord.x,
                y = result.coord.y,
                job_generation = result.generation,
                current = self.generation,
                "Discarding stale chunk"
            );
            return;
        }

        let (px, py) = self.grid.pixel_origin(result.coord);
        self.surface
            .blit(px, py, self.grid.chunk_size, &result.pixels);
        self.rendered.insert(result.coord);
        self.stats.accepted += 1;

        if self.is_idle() && self.rendered.len() == self.grid.len() {
            info!(
                generation = self.generation,
                chunks = self.grid.len(),
                elapsed_ms = self.generation_started.elapsed().as_millis(),
                "Render complete"
            );
        }
    }

    /// Feed every outcome the executor has ready. Returns how many there were.
    pub fn poll(&mut self) -> usize {
        let mut handled = 0;
        while let Some(outcome) = self.executor.poll() {
            self.on_job_complete(outcome);
            handled += 1;
        }
        handled
    }

    /// Block until the pipeline is idle or `timeout` passes. Returns whether
    /// it went idle.
    pub fn run_until_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while !self.is_idle() {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            if let Some(outcome) = self.executor.wait(deadline - now) {
                self.on_job_complete(outcome);
            }
        }
        true
    }

    // -- Surface transforms ---------------------------------------------------

    /// The surface content moved by `(dx, dy)` pixels: shift the raster,
    /// keep the chunks that are still whole, and supersede pending work.
    ///
    /// Moves accumulate until the next [`request_full_redraw`](Self::request_full_redraw);
    /// each one is applied to the raster and chunk set as they were when the
    /// pan began.
    pub fn pan(&mut self, dx: i32, dy: i32) {
        if dx == 0 && dy == 0 {
            return;
        }
        let origin = self.pan_origin.get_or_insert_with(|| PanOrigin {
            rendered: self.rendered.clone(),
            surface: self.surface.clone(),
            dx: 0,
            dy: 0,
        });
        origin.dx = origin.dx.saturating_add(dx);
        origin.dy = origin.dy.saturating_add(dy);

        let mut surface = origin.surface.clone();
        surface.shift(origin.dx, origin.dy);
        self.rendered = self
            .grid
            .remap_after_shift(&origin.rendered, origin.dx, origin.dy);
        self.surface = surface;
        self.supersede();
    }

    /// Preview a zoom by rescaling the raster about `(fx, fy)`. No chunk
    /// survives a scale change.
    pub fn prescale(&mut self, fx: f64, fy: f64, factor: f64) {
        self.pan_origin = None;
        self.surface.scale_about(fx, fy, factor);
        self.rendered.clear();
        self.supersede();
    }

    /// Adopt the dimensions of `snapshot`'s viewport and redraw it at once.
    /// The raster starts blank. Returns how many chunks were queued.
    pub fn resize(&mut self, snapshot: RenderSnapshot) -> crate::Result<usize> {
        let (width, height) = (snapshot.viewport.width, snapshot.viewport.height);
        self.grid = ChunkGrid::new(width, height, self.grid.chunk_size)?;
        self.surface = DisplaySurface::new(width, height);
        self.invalidate();
        Ok(self.request_full_redraw(snapshot))
    }
}
