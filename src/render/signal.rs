use std::fmt::Debug;
use std::sync::{Condvar, Mutex};

/// How pool workers and the flushing thread wait for each other.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Sleep on a condition variable.
    #[default]
    Blocking,
    /// Busy-poll, trading CPU for wake latency.
    Spin,
}

impl SyncMode {
    pub(crate) fn signal(self) -> Box<dyn Signal> {
        match self {
            Self::Blocking => Box::new(BlockingSignal::default()),
            Self::Spin => Box::new(SpinSignal),
        }
    }
}

/// Wake-up primitive paired with an externally owned readiness predicate.
///
/// The predicate reads state published by the notifier (typically an atomic); `notify` must
/// be called after that state was updated.
pub trait Signal: Send + Sync + Debug {
    /// Wake every waiter.
    fn notify(&self);

    /// Return once `ready()` holds.
    fn wait_until(&self, ready: &dyn Fn() -> bool);
}

/// Condition-variable signal.
#[derive(Debug, Default)]
pub struct BlockingSignal {
    lock: Mutex<()>,
    cond: Condvar,
}

impl Signal for BlockingSignal {
    fn notify(&self) {
        // Taking the lock orders the notification after a waiter's predicate check.
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        self.cond.notify_all();
    }

    fn wait_until(&self, ready: &dyn Fn() -> bool) {
        let mut guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        while !ready() {
            guard = self.cond.wait(guard).unwrap_or_else(|e| e.into_inner());
        }
    }
}

/// Busy-polling signal.
#[derive(Debug, Default)]
pub struct SpinSignal;

impl Signal for SpinSignal {
    fn notify(&self) {}

    fn wait_until(&self, ready: &dyn Fn() -> bool) {
        let mut spins = 0u32;
        while !ready() {
            spins = spins.wrapping_add(1);
            if spins % 64 == 0 {
                std::thread::yield_now();
            } else {
                std::hint::spin_loop();
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/signal.rs"]
mod tests;
