use std::collections::HashSet;
use std::time::Duration;

use chunkbrot_core::{Complex, FractalMode, FractalParams, Viewport};
use chunkbrot_render::{
    builtin_themes, ChunkCoord, InlineExecutor, RenderScheduler, RenderSnapshot, WorkerPool,
};

const TIMEOUT: Duration = Duration::from_secs(30);

fn snapshot(viewport: Viewport, mode: FractalMode, theme: usize) -> RenderSnapshot {
    RenderSnapshot {
        viewport,
        mode,
        seed: Complex::ZERO,
        params: FractalParams::default(),
        gradient: builtin_themes().unwrap().remove(theme),
    }
}

fn all_chunks(cols: u32, rows: u32) -> HashSet<ChunkCoord> {
    (0..rows)
        .flat_map(|y| (0..cols).map(move |x| ChunkCoord::new(x, y)))
        .collect()
}

#[test]
fn end_to_end_two_by_two_grid() {
    let vp = Viewport::home(256, 256, 2.0).unwrap();
    assert_eq!(vp.top_left, Complex::new(-2.0, 2.0));
    assert_eq!(vp.bottom_right, Complex::new(2.0, -2.0));

    let pool = WorkerPool::new(2).unwrap();
    let snap = snapshot(vp, FractalMode::Mandelbrot, 0);
    let mut scheduler = RenderScheduler::new(pool, 128, 2, snap.clone()).unwrap();

    assert_eq!(scheduler.request_full_redraw(snap), 4);
    assert!(scheduler.run_until_idle(TIMEOUT));

    assert_eq!(scheduler.rendered(), &all_chunks(2, 2));
    assert!(scheduler.surface().is_fully_painted());
    assert_eq!(scheduler.stats().accepted, 4);
    assert_eq!(scheduler.stats().stale, 0);
}

#[test]
fn pool_and_inline_produce_identical_surfaces() {
    let vp = Viewport::home(200, 150, 1.5).unwrap();
    let snap = snapshot(vp, FractalMode::Julia, 1);

    let mut threaded = RenderScheduler::new(WorkerPool::new(3).unwrap(), 64, 3, snap.clone()).unwrap();
    threaded.request_full_redraw(snap.clone());
    assert!(threaded.run_until_idle(TIMEOUT));

    let mut inline = RenderScheduler::new(InlineExecutor::new(), 64, 1, snap.clone()).unwrap();
    inline.request_full_redraw(snap);
    assert!(inline.run_until_idle(TIMEOUT));

    assert_eq!(threaded.surface(), inline.surface());
}

#[test]
fn repeated_redraw_is_idempotent() {
    let vp = Viewport::home(256, 128, 2.0).unwrap();
    let snap = snapshot(vp, FractalMode::Mandelbrot, 0);
    let mut s = RenderScheduler::new(WorkerPool::new(2).unwrap(), 128, 2, snap.clone()).unwrap();

    s.request_full_redraw(snap.clone());
    assert!(s.run_until_idle(TIMEOUT));
    let first = s.surface().clone();

    assert_eq!(s.request_full_redraw(snap), 0);
    assert!(s.run_until_idle(TIMEOUT));
    assert_eq!(s.surface(), &first);
}

#[test]
fn pan_then_settle_reuses_chunks() {
    let mut vp = Viewport::home(384, 256, 2.0).unwrap();
    let snap = snapshot(vp, FractalMode::Mandelbrot, 0);
    let mut s = RenderScheduler::new(InlineExecutor::new(), 128, 1, snap.clone()).unwrap();
    s.request_full_redraw(snap);
    assert!(s.run_until_idle(TIMEOUT));

    vp.pan(128.0, 0.0);
    s.pan(128, 0);
    let shifted: HashSet<_> = all_chunks(3, 2)
        .into_iter()
        .filter(|c| c.x > 0)
        .collect();
    assert_eq!(s.rendered(), &shifted);

    let settle = snapshot(vp, FractalMode::Mandelbrot, 0);
    // Cap of 1 keeps the second exposed chunk visible in the queue.
    assert_eq!(s.request_full_redraw(settle.clone()), 2);
    assert_eq!(s.in_flight(), 1);
    assert_eq!(s.queued().collect::<Vec<_>>(), vec![ChunkCoord::new(0, 1)]);
    assert!(s.run_until_idle(TIMEOUT));
    assert_eq!(s.rendered(), &all_chunks(3, 2));

    // The reused columns agree with a from-scratch render of the panned view.
    let mut fresh = RenderScheduler::new(InlineExecutor::new(), 128, 1, settle.clone()).unwrap();
    fresh.request_full_redraw(settle);
    assert!(fresh.run_until_idle(TIMEOUT));
    // Plane coordinates differ by rounding only, so allow a sliver of
    // boundary pixels to land on a different iteration count.
    let differing = s
        .surface()
        .pixels
        .chunks_exact(4)
        .zip(fresh.surface().pixels.chunks_exact(4))
        .filter(|(a, b)| a != b)
        .count();
    assert!(differing < 384 * 256 / 100, "{differing} pixels differ");
}

#[test]
fn theme_change_repaints_everything() {
    let vp = Viewport::home(128, 128, 2.0).unwrap();
    let a = snapshot(vp, FractalMode::Mandelbrot, 0);
    let mut s = RenderScheduler::new(InlineExecutor::new(), 64, 2, a.clone()).unwrap();
    s.request_full_redraw(a);
    assert!(s.run_until_idle(TIMEOUT));
    let before = s.surface().clone();

    s.invalidate();
    assert_eq!(s.request_full_redraw(snapshot(vp, FractalMode::Mandelbrot, 2)), 4);
    assert!(s.run_until_idle(TIMEOUT));
    assert_ne!(s.surface(), &before);
}
