use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};
use std::thread::JoinHandle;

use anyhow::Context;
use rayon::prelude::*;

use crate::foundation::error::{RasterError, RasterResult};
use crate::render::replay::ReplayJob;
use crate::render::signal::{Signal, SyncMode};
use crate::render::tile::Tile;

/// Environment variable overriding [`PoolOpts::threads`].
pub const THREADS_ENV: &str = "DEFERRED_RASTER_THREADS";

/// How tiles of one flush are spread over threads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolStrategy {
    /// One rayon task per tile on a dedicated rayon pool.
    #[default]
    DataParallel,
    /// Long-lived worker threads with an explicit state machine; the flushing thread replays
    /// the last tile itself.
    Persistent,
}

/// Render pool configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PoolOpts {
    /// Scheduling strategy.
    pub strategy: PoolStrategy,
    /// Total threads taking part in a flush, including the caller for
    /// [`PoolStrategy::Persistent`]. `None` uses the available parallelism.
    pub threads: Option<usize>,
    /// Wait primitive for [`PoolStrategy::Persistent`] workers.
    pub sync: SyncMode,
}

impl PoolOpts {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Parse options from JSON; missing fields keep their defaults.
    pub fn from_json(json: &str) -> RasterResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| RasterError::validation(format!("invalid pool options: {e}")))
    }

    /// Return a copy with the given strategy.
    pub fn with_strategy(mut self, strategy: PoolStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Return a copy using exactly `threads` threads.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Return a copy with the given wait primitive.
    pub fn with_sync(mut self, sync: SyncMode) -> Self {
        self.sync = sync;
        self
    }

    /// Return a copy whose thread count is taken from `DEFERRED_RASTER_THREADS` when it holds a
    /// positive integer.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(n) = threads_override(std::env::var(THREADS_ENV).ok().as_deref()) {
            self.threads = Some(n);
        }
        self
    }

    fn resolved_threads(&self) -> RasterResult<usize> {
        match self.threads {
            Some(0) => Err(RasterError::validation(
                "render pool 'threads' must be >= 1 when set",
            )),
            Some(n) => Ok(n),
            None => Ok(std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)),
        }
    }
}

fn threads_override(raw: Option<&str>) -> Option<usize> {
    raw.and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|&n| n > 0)
}

fn build_thread_pool(threads: usize) -> RasterResult<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("raster-rayon-{i}"))
        .build()
        .map_err(|e| RasterError::validation(format!("failed to build rayon thread pool: {e}")))
}

fn run_guarded(job: &ReplayJob, tile: &Tile) -> RasterResult<usize> {
    match catch_unwind(AssertUnwindSafe(|| job.run_tile(tile))) {
        Ok(result) => result,
        Err(_) => Err(RasterError::replay(format!(
            "worker panicked while replaying tile {:?}",
            tile.rect
        ))),
    }
}

const IDLE: u8 = 0;
const TODO: u8 = 1;
const KILLED: u8 = 2;

#[derive(Debug)]
struct WorkerShared {
    state: AtomicU8,
    job: Mutex<Option<(ReplayJob, Tile)>>,
    result: Mutex<Option<RasterResult<usize>>>,
    wake: Box<dyn Signal>,
    done: Box<dyn Signal>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

impl WorkerShared {
    fn run_loop(&self) {
        loop {
            self.wake
                .wait_until(&|| self.state.load(Ordering::Acquire) != IDLE);
            if self.state.load(Ordering::Acquire) == KILLED {
                return;
            }

            // The job (and the journal snapshot inside it) is dropped before reporting idle, so
            // an idle worker never keeps a journal alive.
            let job = lock(&self.job).take();
            let result = match job {
                Some((job, tile)) => run_guarded(&job, &tile),
                None => Ok(0),
            };
            *lock(&self.result) = Some(result);

            let _ = self.state.compare_exchange(
                TODO,
                IDLE,
                Ordering::AcqRel,
                Ordering::Acquire,
            );
            self.done.notify();
        }
    }
}

#[derive(Debug)]
struct Worker {
    shared: Arc<WorkerShared>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    fn spawn(index: usize, sync: SyncMode) -> RasterResult<Self> {
        let shared = Arc::new(WorkerShared {
            state: AtomicU8::new(IDLE),
            job: Mutex::new(None),
            result: Mutex::new(None),
            wake: sync.signal(),
            done: sync.signal(),
        });
        let thread_shared = shared.clone();
        let handle = std::thread::Builder::new()
            .name(format!("raster-worker-{index}"))
            .spawn(move || thread_shared.run_loop())
            .context("failed to spawn raster worker thread")?;
        Ok(Self {
            shared,
            handle: Some(handle),
        })
    }

    fn dispatch(&self, job: &ReplayJob, tile: &Tile) {
        *lock(&self.shared.job) = Some((job.clone(), tile.clone()));
        self.shared.state.store(TODO, Ordering::Release);
        self.shared.wake.notify();
    }

    fn wait(&self) -> RasterResult<usize> {
        self.shared
            .done
            .wait_until(&|| self.shared.state.load(Ordering::Acquire) == IDLE);
        lock(&self.shared.result)
            .take()
            .unwrap_or_else(|| Err(RasterError::replay("worker finished without a result")))
    }

    fn kill(&mut self) {
        self.shared.state.store(KILLED, Ordering::Release);
        self.shared.wake.notify();
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            tracing::warn!("raster worker exited with a panic");
        }
    }
}

/// Background threads plus the calling thread.
#[derive(Debug)]
struct WorkerPool {
    workers: Vec<Worker>,
}

impl WorkerPool {
    fn new(threads: usize, sync: SyncMode) -> RasterResult<Self> {
        let background = threads.saturating_sub(1);
        // Built in place so that a failed spawn still joins the threads already started.
        let mut pool = Self {
            workers: Vec::with_capacity(background),
        };
        for i in 0..background {
            pool.workers.push(Worker::spawn(i, sync)?);
        }
        Ok(pool)
    }

    fn threads(&self) -> usize {
        self.workers.len() + 1
    }

    fn run(&self, tiles: &[Tile], job: &ReplayJob) -> RasterResult<usize> {
        let mut total = 0usize;
        let mut first_err = None;
        for round in tiles.chunks(self.threads()) {
            let Some((own, dispatched)) = round.split_last() else {
                continue;
            };
            for (worker, tile) in self.workers.iter().zip(dispatched) {
                worker.dispatch(job, tile);
            }

            let mut results = Vec::with_capacity(round.len());
            results.push(run_guarded(job, own));
            for worker in self.workers.iter().take(dispatched.len()) {
                results.push(worker.wait());
            }

            for r in results {
                match r {
                    Ok(n) => total += n,
                    Err(e) => {
                        first_err.get_or_insert(e);
                    }
                }
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(total),
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        for w in &mut self.workers {
            w.kill();
        }
    }
}

#[derive(Debug)]
enum Executor {
    DataParallel(rayon::ThreadPool),
    Persistent(WorkerPool),
}

impl Executor {
    fn build(opts: &PoolOpts) -> RasterResult<Self> {
        let threads = opts.resolved_threads()?;
        Ok(match opts.strategy {
            PoolStrategy::DataParallel => Self::DataParallel(build_thread_pool(threads)?),
            PoolStrategy::Persistent => Self::Persistent(WorkerPool::new(threads, opts.sync)?),
        })
    }

    fn threads(&self) -> usize {
        match self {
            Self::DataParallel(pool) => pool.current_num_threads(),
            Self::Persistent(pool) => pool.threads(),
        }
    }

    fn run(&self, tiles: &[Tile], job: &ReplayJob) -> RasterResult<usize> {
        match self {
            Self::DataParallel(pool) => {
                let results = catch_unwind(AssertUnwindSafe(|| {
                    pool.install(|| {
                        tiles
                            .par_iter()
                            .map(|tile| job.run_tile(tile))
                            .collect::<Vec<_>>()
                    })
                }))
                .map_err(|_| RasterError::replay("worker panicked while replaying tiles"))?;
                let mut total = 0usize;
                for r in results {
                    total += r?;
                }
                Ok(total)
            }
            Self::Persistent(pool) => pool.run(tiles, job),
        }
    }
}

/// Explicitly owned thread pool that replays the tiles of a flush in parallel.
///
/// The executor mutex doubles as the pool-busy flag: a flush that finds it held (for instance a
/// flush issued from inside a rasterizer callback) is declined with `Unsupported` and the caller
/// replays sequentially instead.
#[derive(Debug)]
pub struct RenderPool {
    opts: PoolOpts,
    executor: Mutex<Option<Executor>>,
    threads: AtomicUsize,
}

impl RenderPool {
    /// Start a pool.
    pub fn new(opts: PoolOpts) -> RasterResult<Self> {
        let executor = Executor::build(&opts)?;
        let threads = executor.threads();
        tracing::debug!(strategy = ?opts.strategy, threads, "render pool started");
        Ok(Self {
            opts,
            executor: Mutex::new(Some(executor)),
            threads: AtomicUsize::new(threads),
        })
    }

    /// Configuration the pool was built from.
    pub fn opts(&self) -> &PoolOpts {
        &self.opts
    }

    /// Scheduling strategy.
    pub fn strategy(&self) -> PoolStrategy {
        self.opts.strategy
    }

    /// Threads taking part in a flush; zero after [`RenderPool::shutdown`].
    pub fn thread_count(&self) -> usize {
        self.threads.load(Ordering::Relaxed)
    }

    /// Number of tiles worth requesting for one flush.
    pub fn max_parallelism(&self) -> usize {
        self.thread_count().max(1)
    }

    /// Replay `job` on every tile, in parallel.
    ///
    /// Blocks until every tile is done; there is no cancellation. Returns the number of entry
    /// dispatches, `Unsupported` when the pool is busy or shut down, or the first tile error once
    /// all tiles have finished.
    pub fn run(&self, tiles: &[Tile], job: &ReplayJob) -> RasterResult<usize> {
        let guard = match self.executor.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => {
                tracing::warn!("render pool busy; declining parallel flush");
                return Err(RasterError::unsupported("render pool busy"));
            }
            Err(TryLockError::Poisoned(e)) => e.into_inner(),
        };
        let Some(executor) = guard.as_ref() else {
            return Err(RasterError::unsupported("render pool shut down"));
        };
        executor.run(tiles, job)
    }

    /// Tear down the threads and start fresh ones with the same options.
    ///
    /// Use after events that invalidate threads (such as a process fork).
    pub fn restart(&self) -> RasterResult<()> {
        let mut guard = lock(&self.executor);
        drop(guard.take());
        self.threads.store(0, Ordering::Relaxed);
        let executor = Executor::build(&self.opts)?;
        self.threads.store(executor.threads(), Ordering::Relaxed);
        *guard = Some(executor);
        tracing::debug!(strategy = ?self.opts.strategy, "render pool restarted");
        Ok(())
    }

    /// Stop and join every thread. Later runs are declined with `Unsupported`.
    pub fn shutdown(&self) {
        let mut guard = lock(&self.executor);
        if guard.take().is_some() {
            self.threads.store(0, Ordering::Relaxed);
            tracing::debug!("render pool shut down");
        }
    }
}

impl Drop for RenderPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/pool.rs"]
mod tests;
