use std::any::Any;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::chunk::ChunkCoord;
use crate::error::RenderError;
use crate::renderer::{render_chunk, ChunkJob, ChunkResult};

/// What came back from a worker for one dispatched job.
#[derive(Debug)]
pub enum ChunkOutcome {
    Completed(ChunkResult),
    /// The worker lost the job (e.g. it panicked mid-render).
    Failed {
        coord: ChunkCoord,
        generation: u64,
        reason: String,
    },
}

/// Where the scheduler sends chunk jobs and collects their outcomes.
///
/// Every dispatched job must eventually yield exactly one outcome.
pub trait ChunkExecutor {
    fn dispatch(&mut self, job: ChunkJob);

    /// Next finished outcome, without blocking.
    fn poll(&mut self) -> Option<ChunkOutcome>;

    /// Next finished outcome, waiting up to `timeout`.
    fn wait(&mut self, timeout: Duration) -> Option<ChunkOutcome> {
        let _ = timeout;
        self.poll()
    }
}

type Notifier = Arc<dyn Fn() + Send + Sync>;

// ---------------------------------------------------------------------------
// Thread pool
// ---------------------------------------------------------------------------

/// Runs chunk jobs on a dedicated Rayon pool and hands results back over a
/// channel. Jobs own their payload, so workers share no mutable state.
pub struct WorkerPool {
    pool: rayon::ThreadPool,
    tx: mpsc::Sender<ChunkOutcome>,
    rx: mpsc::Receiver<ChunkOutcome>,
    notify: Option<Notifier>,
}

impl WorkerPool {
    pub fn new(threads: usize) -> crate::Result<Self> {
        if threads == 0 {
            return Err(RenderError::InvalidConcurrency(threads));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("chunk-worker-{i}"))
            .build()?;
        let (tx, rx) = mpsc::channel();
        debug!(threads, "Worker pool started");
        Ok(Self {
            pool,
            tx,
            rx,
            notify: None,
        })
    }

    /// Call `f` on the worker thread after each outcome is sent, e.g. to wake
    /// a UI event loop.
    pub fn with_notifier(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.notify = Some(Arc::new(f));
        self
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }
}

impl ChunkExecutor for WorkerPool {
    fn dispatch(&mut self, job: ChunkJob) {
        let tx = self.tx.clone();
        let notify = self.notify.clone();
        self.pool.spawn(move || {
            let outcome = run_job(job);
            // A closed channel means the scheduler is gone; nothing to report to.
            if tx.send(outcome).is_ok() {
                if let Some(notify) = notify {
                    notify();
                }
            }
        });
    }

    fn poll(&mut self) -> Option<ChunkOutcome> {
        self.rx.try_recv().ok()
    }

    fn wait(&mut self, timeout: Duration) -> Option<ChunkOutcome> {
        self.rx.recv_timeout(timeout).ok()
    }
}

// ---------------------------------------------------------------------------
// Inline executor
// ---------------------------------------------------------------------------

/// Renders each job synchronously on the calling thread at dispatch time.
///
/// Useful for headless rendering and benchmarks where a pool is overkill.
#[derive(Debug, Default)]
pub struct InlineExecutor {
    done: VecDeque<ChunkOutcome>,
}

impl InlineExecutor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChunkExecutor for InlineExecutor {
    fn dispatch(&mut self, job: ChunkJob) {
        self.done.push_back(run_job(job));
    }

    fn poll(&mut self) -> Option<ChunkOutcome> {
        self.done.pop_front()
    }
}

fn run_job(job: ChunkJob) -> ChunkOutcome {
    run_guarded(job, render_chunk)
}

/// Run `render` on a job, converting a panic into [`ChunkOutcome::Failed`].
pub(crate) fn run_guarded(
    job: ChunkJob,
    render: impl FnOnce(&ChunkJob) -> ChunkResult,
) -> ChunkOutcome {
    let (coord, generation) = (job.coord, job.generation);
    match panic::catch_unwind(AssertUnwindSafe(|| render(&job))) {
        Ok(result) => ChunkOutcome::Completed(result),
        Err(payload) => {
            let reason = panic_message(payload.as_ref());
            warn!(x = coord.x, y = coord.y, generation, %reason, "Chunk worker failed");
            ChunkOutcome::Failed {
                coord,
                generation,
                reason,
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gradient::builtin_themes;
    use crate::renderer::RenderSnapshot;
    use chunkbrot_core::{Complex, FractalMode, FractalParams, Viewport};

    fn job(x: u32, generation: u64) -> ChunkJob {
        ChunkJob {
            coord: ChunkCoord::new(x, 0),
            generation,
            chunk_size: 16,
            snapshot: Arc::new(RenderSnapshot {
                viewport: Viewport::home(64, 16, 2.0).unwrap(),
                mode: FractalMode::Mandelbrot,
                seed: Complex::ZERO,
                params: FractalParams::default(),
                gradient: builtin_themes().unwrap().remove(0),
            }),
        }
    }

    #[test]
    fn zero_threads_rejected() {
        assert!(matches!(
            WorkerPool::new(0),
            Err(RenderError::InvalidConcurrency(0))
        ));
    }

    #[test]
    fn pool_returns_one_outcome_per_job() {
        let mut pool = WorkerPool::new(2).unwrap();
        assert_eq!(pool.threads(), 2);
        for x in 0..4 {
            pool.dispatch(job(x, 3));
        }
        let mut seen = Vec::new();
        for _ in 0..4 {
            match pool.wait(Duration::from_secs(10)) {
                Some(ChunkOutcome::Completed(r)) => {
                    assert_eq!(r.generation, 3);
                    assert_eq!(r.pixels.len(), 16 * 16 * 4);
                    seen.push(r.coord.x);
                }
                other => panic!("unexpected outcome: {other:?}"),
            }
        }
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3]);
        assert!(pool.poll().is_none());
    }

    #[test]
    fn notifier_fires_per_outcome() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let mut pool = WorkerPool::new(1)
            .unwrap()
            .with_notifier(move || {
                c.fetch_add(1, Ordering::SeqCst);
            });
        pool.dispatch(job(0, 1));
        assert!(pool.wait(Duration::from_secs(10)).is_some());
        // The notifier runs right after the send; give it a moment.
        for _ in 0..100 {
            if count.load(Ordering::SeqCst) == 1 {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    /// `coord.x * chunk_size` overflows, which panics in debug builds.
    #[cfg(debug_assertions)]
    fn overflowing_job(generation: u64) -> ChunkJob {
        let mut j = job(0, generation);
        j.coord = ChunkCoord::new(u32::MAX, 0);
        j
    }

    #[test]
    #[cfg(debug_assertions)]
    fn inline_executor_reports_panicking_render() {
        let mut exec = InlineExecutor::new();
        exec.dispatch(overflowing_job(4));
        exec.dispatch(job(1, 4));
        match exec.poll() {
            Some(ChunkOutcome::Failed {
                coord,
                generation,
                reason,
            }) => {
                assert_eq!(coord, ChunkCoord::new(u32::MAX, 0));
                assert_eq!(generation, 4);
                assert!(reason.contains("overflow"), "{reason}");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(matches!(exec.poll(), Some(ChunkOutcome::Completed(_))));
    }

    #[test]
    #[cfg(debug_assertions)]
    fn pool_survives_panicking_render() {
        let mut pool = WorkerPool::new(1).unwrap();
        pool.dispatch(overflowing_job(2));
        assert!(matches!(
            pool.wait(Duration::from_secs(10)),
            Some(ChunkOutcome::Failed { generation: 2, .. })
        ));
        // The same worker thread keeps serving jobs.
        pool.dispatch(job(0, 2));
        assert!(matches!(
            pool.wait(Duration::from_secs(10)),
            Some(ChunkOutcome::Completed(_))
        ));
    }

    #[test]
    fn guarded_run_converts_panic_to_failure() {
        let outcome = run_guarded(job(3, 9), |_| panic!("lost worker"));
        match outcome {
            ChunkOutcome::Failed {
                coord,
                generation,
                reason,
            } => {
                assert_eq!(coord, ChunkCoord::new(3, 0));
                assert_eq!(generation, 9);
                assert_eq!(reason, "lost worker");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn inline_executor_completes_in_order() {
        let mut exec = InlineExecutor::new();
        exec.dispatch(job(0, 1));
        exec.dispatch(job(1, 1));
        let first = exec.poll();
        assert!(matches!(first, Some(ChunkOutcome::Completed(ref r)) if r.coord.x == 0));
        assert!(matches!(exec.poll(), Some(ChunkOutcome::Completed(_))));
        assert!(exec.poll().is_none());
    }

    #[test]
    fn panic_payloads_are_readable() {
        let p: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(p.as_ref()), "boom");
        let p: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(p.as_ref()), "bang");
        let p: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(p.as_ref()), "unknown panic");
    }
}
